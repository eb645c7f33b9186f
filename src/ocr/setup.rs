use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::process::Command;

use crate::paths::get_tesseract_dir;

#[cfg(windows)]
const TESSERACT_BINARY: &str = "tesseract.exe";
#[cfg(not(windows))]
const TESSERACT_BINARY: &str = "tesseract";

/// Locates the tesseract executable.
///
/// Search order: the configured path, a local install under the data
/// directory, then `tesseract` on `PATH`.
pub fn find_tesseract_executable(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        return Err(anyhow!(
            "Configured tesseract_path does not exist: {}",
            path.display()
        ));
    }

    let local = get_tesseract_dir().join(TESSERACT_BINARY);
    if local.exists() {
        return Ok(local);
    }

    let on_path = Command::new(TESSERACT_BINARY)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if on_path {
        return Ok(PathBuf::from(TESSERACT_BINARY));
    }

    Err(anyhow!(
        "Tesseract not found. Install it and add it to PATH, set tesseract_path in config.json, \
         or copy it to: {}",
        get_tesseract_dir().display()
    ))
}

/// Returns the local tessdata directory if one has been installed.
///
/// When `None`, tesseract falls back to its own default data location.
pub fn find_tessdata_dir() -> Option<PathBuf> {
    let dir = get_tesseract_dir().join("tessdata");
    dir.is_dir().then_some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_path_is_error() {
        let err = find_tesseract_executable(Some("/definitely/not/here/tesseract")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_explicit_existing_path_is_used() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert_eq!(find_tesseract_executable(Some(&path)).unwrap(), file.path());
    }
}
