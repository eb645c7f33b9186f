use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the config file path: `<exe_dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Returns the per-user data directory: `<data_local_dir>/snapdict/`
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| get_exe_dir().clone())
        .join("snapdict")
}

/// Returns the history store directory: `<data_dir>/store/`
pub fn get_store_dir() -> PathBuf {
    get_data_dir().join("store")
}

/// Returns the local tesseract directory: `<data_dir>/tesseract/`
pub fn get_tesseract_dir() -> PathBuf {
    get_data_dir().join("tesseract")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_store_dir())?;
    Ok(())
}
