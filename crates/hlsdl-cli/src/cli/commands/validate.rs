//! `hlsdl validate` – transport stream sync check on local files.

use anyhow::{bail, Result};
use hlsdl_core::validate;
use std::path::PathBuf;

pub async fn run_validate(paths: &[PathBuf]) -> Result<()> {
    let mut failed = 0usize;
    for path in paths {
        match validate::validate_ts(path) {
            Ok(()) => println!("ok       {}", path.display()),
            Err(e) => {
                failed += 1;
                println!("INVALID  {}: {}", path.display(), e);
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} file(s) failed validation", failed, paths.len());
    }
    Ok(())
}
