use std::path::PathBuf;

/// Fixed-size, ordinal-indexed result array. A slot starts empty and is
/// written at most once, with the path of the verified staging file.
#[derive(Debug, Default)]
pub struct ResultSlots {
    slots: Vec<Option<PathBuf>>,
    filled: usize,
}

impl ResultSlots {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
            filled: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_filled(&self, ordinal: usize) -> bool {
        matches!(self.slots.get(ordinal), Some(Some(_)))
    }

    /// Number of filled slots.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Record a success. Returns false (and leaves the slot as is) if the
    /// ordinal is out of range or already filled.
    pub fn fill(&mut self, ordinal: usize, path: PathBuf) -> bool {
        match self.slots.get_mut(ordinal) {
            Some(slot) if slot.is_none() => {
                *slot = Some(path);
                self.filled += 1;
                true
            }
            Some(_) => {
                tracing::warn!(ordinal, "result slot already filled; ignoring duplicate");
                false
            }
            None => false,
        }
    }

    /// Lowest ordinal whose slot is still empty.
    pub fn first_missing(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// All paths in ordinal order, or the lowest missing ordinal.
    pub fn into_files(self) -> Result<Vec<PathBuf>, usize> {
        if let Some(missing) = self.first_missing() {
            return Err(missing);
        }
        Ok(self.slots.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_out_of_order_yields_ordinal_order() {
        let mut slots = ResultSlots::new(3);
        assert!(slots.fill(2, PathBuf::from("c")));
        assert!(slots.fill(0, PathBuf::from("a")));
        assert_eq!(slots.first_missing(), Some(1));
        assert!(slots.fill(1, PathBuf::from("b")));
        assert_eq!(slots.filled(), 3);
        let files = slots.into_files().unwrap();
        assert_eq!(files, vec![PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")]);
    }

    #[test]
    fn slot_is_written_at_most_once() {
        let mut slots = ResultSlots::new(1);
        assert!(slots.fill(0, PathBuf::from("first")));
        assert!(!slots.fill(0, PathBuf::from("second")));
        assert_eq!(slots.filled(), 1);
        assert_eq!(slots.into_files().unwrap(), vec![PathBuf::from("first")]);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut slots = ResultSlots::new(2);
        assert!(!slots.fill(5, PathBuf::from("x")));
        assert!(!slots.is_filled(5));
    }

    #[test]
    fn into_files_reports_lowest_missing() {
        let mut slots = ResultSlots::new(4);
        slots.fill(0, PathBuf::from("a"));
        slots.fill(3, PathBuf::from("d"));
        assert_eq!(slots.into_files().unwrap_err(), 1);
    }

    #[test]
    fn empty_slots() {
        let slots = ResultSlots::new(0);
        assert!(slots.is_empty());
        assert_eq!(slots.len(), 0);
        assert_eq!(slots.into_files().unwrap(), Vec::<PathBuf>::new());
    }
}
