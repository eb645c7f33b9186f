//! Application configuration.
//!
//! Loads settings from config.json at startup. Provides the scan region
//! geometry, camera request, OCR settings, history limits and the
//! dictionary provider list.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::paths::get_config_path;

/// Global configuration instance, initialized on first access.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// The on-screen region of interest the user aligns text inside.
///
/// Width is a fraction of the viewport width, height is in viewport pixels,
/// and the region is centred horizontally with its centre at
/// `center_y_fraction` of the viewport height.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoiConfig {
    pub width_fraction: f32,
    pub height_px: f32,
    pub center_y_fraction: f32,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            width_fraction: 0.85,
            height_px: 160.0,
            center_y_fraction: 1.0 / 3.0,
        }
    }
}

/// What the scanner asks the camera for.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraRequest {
    /// "environment" (rear) or "user" (front)
    pub facing_mode: String,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraRequest {
    fn default() -> Self {
        Self {
            facing_mode: "environment".to_string(),
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }
}

/// A dictionary site a committed word can be looked up on.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DictionaryConfig {
    pub name: String,
    /// URL with a `{word}` placeholder
    pub url_template: String,
}

fn default_dictionaries() -> Vec<DictionaryConfig> {
    vec![
        DictionaryConfig {
            name: "Cambridge".to_string(),
            url_template: "https://dictionary.cambridge.org/dictionary/english/{word}".to_string(),
        },
        DictionaryConfig {
            name: "Merriam-Webster".to_string(),
            url_template: "https://www.merriam-webster.com/dictionary/{word}".to_string(),
        },
        DictionaryConfig {
            name: "Longman".to_string(),
            url_template: "https://www.ldoceonline.com/dictionary/{word}".to_string(),
        },
    ]
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub roi: RoiConfig,
    pub camera: CameraRequest,
    /// Language hint handed to the recognizer
    pub ocr_language: String,
    /// Tesseract page segmentation mode
    pub tesseract_psm: u8,
    /// Explicit path to the tesseract executable (searched for when unset)
    pub tesseract_path: Option<String>,
    /// Maximum time to wait for a recognition result (milliseconds)
    pub recognition_timeout_ms: u64,
    /// Number of history entries kept, oldest evicted first
    pub history_capacity: usize,
    /// Storage key the history blob is persisted under
    pub history_key: String,
    pub dictionaries: Vec<DictionaryConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            roi: RoiConfig::default(),
            camera: CameraRequest::default(),
            ocr_language: "eng".to_string(),
            tesseract_psm: 6,
            tesseract_path: None,
            recognition_timeout_ms: 30_000,
            history_capacity: 50,
            history_key: "snapdict_history_v1".to_string(),
            dictionaries: default_dictionaries(),
        }
    }
}

/// Loads configuration from `path`, falling back to defaults.
pub fn load_config_from(path: &Path) -> AppConfig {
    log::info!("Looking for config at: {}", path.display());

    if !path.exists() {
        log::info!("config.json not found. Using default config.");
        return AppConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                log::info!("Config loaded from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to parse config.json: {}. Using defaults.", e);
                AppConfig::default()
            }
        },
        Err(e) => {
            log::warn!("Failed to read config.json: {}. Using defaults.", e);
            AppConfig::default()
        }
    }
}

/// Returns the global configuration, loading config.json next to the
/// executable on first call.
pub fn get_config() -> &'static AppConfig {
    CONFIG.get_or_init(|| load_config_from(&get_config_path()))
}
