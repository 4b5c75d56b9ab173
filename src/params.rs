//! Parameter Model
//!
//! A validated snapshot of everything the user chose in the form. Raw widget
//! values arrive as [RawParams] and are checked eagerly by
//! [ChromaParams::from_raw]; nothing downstream re-validates.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUDIO_BITRATE, DEFAULT_BLEND, DEFAULT_CRF, DEFAULT_DENOISE, DEFAULT_FPS,
    DEFAULT_SPEED, DEFAULT_TOLERANCE, MAX_CRF, MAX_DENOISE, MAX_FPS, MAX_SPEED, MIN_FPS,
};
use crate::error::AppError;
use crate::ffmpeg::hwaccel::HardwareAccel;

/// Key color in `#RRGGBB` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromaColor(String);

impl ChromaColor {
    /// Color of a pixel picked from the preview.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        ChromaColor(format!("#{:02x}{:02x}{:02x}", r, g, b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChromaColor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AppError::MissingInput("chroma key color".to_string()));
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::invalid("chroma key color", s));
        }
        Ok(ChromaColor(format!("#{}", hex)))
    }
}

impl fmt::Display for ChromaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Values exactly as read from the form widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawParams {
    pub source_path: String,
    pub chroma_key_color: String,
    pub tolerance: String,
    pub blend: String,
    pub denoise: f64,
    pub despill: bool,
    pub hardware_accel: HardwareAccel,
    pub resolution: String,
    pub crf: u32,
    pub speed: u32,
    pub keep_source_fps: bool,
    pub target_fps: u32,
    pub audio_disabled: bool,
    pub audio_bitrate: String,
}

impl Default for RawParams {
    fn default() -> Self {
        Self {
            source_path: String::new(),
            chroma_key_color: String::new(),
            tolerance: DEFAULT_TOLERANCE.to_string(),
            blend: DEFAULT_BLEND.to_string(),
            denoise: DEFAULT_DENOISE,
            despill: false,
            hardware_accel: HardwareAccel::None,
            resolution: String::new(),
            crf: DEFAULT_CRF,
            speed: DEFAULT_SPEED,
            keep_source_fps: true,
            target_fps: DEFAULT_FPS,
            audio_disabled: false,
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChromaParams {
    pub source_path: PathBuf,
    pub chroma_key_color: ChromaColor,
    pub similarity: f64,
    pub blend: f64,
    pub denoise_strength: f64,
    pub despill: bool,
    pub hardware_accel: HardwareAccel,
    /// `WxH`, or `None` to keep the source size.
    pub resolution: Option<String>,
    pub crf: u32,
    pub encode_speed: u32,
    pub keep_source_fps: bool,
    pub target_fps: u32,
    pub audio_disabled: bool,
    /// `None` when the bitrate field was left empty.
    pub audio_bitrate: Option<String>,
}

impl ChromaParams {
    pub fn from_raw(raw: &RawParams) -> Result<Self, AppError> {
        let source = raw.source_path.trim();
        if source.is_empty() {
            return Err(AppError::MissingInput("source video".to_string()));
        }
        let source_path = PathBuf::from(source);
        if !source_path.is_file() {
            return Err(AppError::MissingInput(format!(
                "source video not found: {}",
                source_path.display()
            )));
        }

        let chroma_key_color = raw.chroma_key_color.parse::<ChromaColor>()?;
        let similarity = parse_number("tolerance", &raw.tolerance)?;
        let blend = parse_number("blend", &raw.blend)?;

        if !(0.0..=MAX_DENOISE).contains(&raw.denoise) {
            return Err(AppError::invalid("denoise", raw.denoise.to_string()));
        }
        check_range("crf", raw.crf, 0, MAX_CRF)?;
        check_range("speed", raw.speed, 0, MAX_SPEED)?;
        if !raw.keep_source_fps {
            check_range("fps", raw.target_fps, MIN_FPS, MAX_FPS)?;
        }

        Ok(Self {
            source_path,
            chroma_key_color,
            similarity,
            blend,
            denoise_strength: raw.denoise,
            despill: raw.despill,
            hardware_accel: raw.hardware_accel,
            resolution: parse_resolution(&raw.resolution)?,
            crf: raw.crf,
            encode_speed: raw.speed,
            keep_source_fps: raw.keep_source_fps,
            target_fps: raw.target_fps,
            audio_disabled: raw.audio_disabled,
            audio_bitrate: non_empty(&raw.audio_bitrate),
        })
    }
}

fn parse_number(field: &str, value: &str) -> Result<f64, AppError> {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(AppError::invalid(field, value)),
    }
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> Result<(), AppError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(AppError::invalid(field, value.to_string()))
    }
}

fn parse_resolution(value: &str) -> Result<Option<String>, AppError> {
    static RESOLUTION: OnceLock<Regex> = OnceLock::new();

    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let re = RESOLUTION.get_or_init(|| Regex::new(r"^[0-9]+x[0-9]+$").expect("valid resolution regex"));
    if re.is_match(value) {
        Ok(Some(value.to_string()))
    } else {
        Err(AppError::invalid("resolution", value))
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
