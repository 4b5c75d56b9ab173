use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_AUDIO_BITRATE, DEFAULT_BLEND, DEFAULT_CRF, DEFAULT_DENOISE, DEFAULT_FPS,
    DEFAULT_SPEED, DEFAULT_TOLERANCE,
};
use crate::error::AppError;
use crate::ffmpeg::hwaccel::HardwareAccel;
use crate::params::RawParams;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Explicit encoder binary, checked before the bundled one and `PATH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<String>,
    #[serde(default = "default_languages_dir")]
    pub languages_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub defaults: ConversionDefaults,
}

/// Initial values for the form.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConversionDefaults {
    pub tolerance: f64,
    pub blend: f64,
    pub denoise: f64,
    pub despill: bool,
    pub hardware_accel: HardwareAccel,
    pub crf: u32,
    pub speed: u32,
    pub keep_source_fps: bool,
    pub fps: u32,
    pub audio_disabled: bool,
    pub audio_bitrate: String,
}

fn default_languages_dir() -> String {
    "languages".to_string()
}

impl Default for ConversionDefaults {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            blend: DEFAULT_BLEND,
            denoise: DEFAULT_DENOISE,
            despill: false,
            hardware_accel: HardwareAccel::None,
            crf: DEFAULT_CRF,
            speed: DEFAULT_SPEED,
            keep_source_fps: true,
            fps: DEFAULT_FPS,
            audio_disabled: false,
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

impl ConversionDefaults {
    /// Seeds the form values; source and color are still up to the user.
    pub fn to_raw_params(&self) -> RawParams {
        RawParams {
            tolerance: self.tolerance.to_string(),
            blend: self.blend.to_string(),
            denoise: self.denoise,
            despill: self.despill,
            hardware_accel: self.hardware_accel,
            crf: self.crf,
            speed: self.speed,
            keep_source_fps: self.keep_source_fps,
            target_fps: self.fps,
            audio_disabled: self.audio_disabled,
            audio_bitrate: self.audio_bitrate.clone(),
            ..RawParams::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            languages_dir: default_languages_dir(),
            language: None,
            defaults: ConversionDefaults::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        match get_config_path() {
            Some(path) => Self::load_from_path(&path),
            None => {
                log::warn!("Could not resolve config directory, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => log::error!("Failed to parse config file: {}", e),
                },
                Err(e) => log::error!("Failed to read config file: {}", e),
            }
            return Self::default();
        }

        // Write the defaults so the user has a file to edit
        let default_config = Self::default();
        if let Err(e) = default_config.save_to_path(path) {
            log::warn!("Failed to write default config: {}", e);
        }
        default_config
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), AppError> {
        let content = toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    pub fn ffmpeg_override(&self) -> Option<PathBuf> {
        self.ffmpeg_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stinger-chroma").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.defaults.crf, 20);
        assert_eq!(config.defaults.speed, 2);
        assert_eq!(config.defaults.audio_bitrate, "128k");
        assert_eq!(config.ffmpeg_override(), None);
    }

    #[test]
    fn test_serialization() {
        let mut config = AppConfig::default();
        config.defaults.hardware_accel = HardwareAccel::Nvidia;
        config.ffmpeg_path = Some("/opt/ffmpeg/bin/ffmpeg".to_string());

        let toml = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = toml::from_str("[defaults]\ncrf = 30\n").unwrap();
        assert_eq!(config.defaults.crf, 30);
        assert_eq!(config.defaults.speed, 2);
        assert_eq!(config.languages_dir, "languages");
    }

    #[test]
    fn test_load_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = AppConfig::load_from_path(&path);
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_load_falls_back_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "defaults = [not toml").unwrap();

        assert_eq!(AppConfig::load_from_path(&path), AppConfig::default());
    }

    #[test]
    fn test_defaults_seed_raw_params() {
        let mut defaults = ConversionDefaults::default();
        defaults.fps = 24;
        defaults.keep_source_fps = false;
        let raw = defaults.to_raw_params();

        assert_eq!(raw.tolerance, "0.15");
        assert_eq!(raw.target_fps, 24);
        assert!(!raw.keep_source_fps);
        assert!(raw.source_path.is_empty());
    }
}
