use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Hardware decode acceleration requested before the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareAccel {
    #[default]
    None,
    Nvidia,
    Intel,
    Amd,
}

impl HardwareAccel {
    pub const ALL: [HardwareAccel; 4] = [
        HardwareAccel::None,
        HardwareAccel::Nvidia,
        HardwareAccel::Intel,
        HardwareAccel::Amd,
    ];

    /// Flags that must precede `-i`.
    pub fn pre_input_args(&self) -> &'static [&'static str] {
        match self {
            HardwareAccel::None => &[],
            HardwareAccel::Nvidia => &["-hwaccel", "cuda"],
            HardwareAccel::Intel => &["-hwaccel", "qsv", "-hwaccel_output_format", "qsv"],
            HardwareAccel::Amd => &["-hwaccel", "d3d11va"],
        }
    }

    /// Name of the method as listed by `ffmpeg -hwaccels`.
    pub fn ffmpeg_method(&self) -> Option<&'static str> {
        match self {
            HardwareAccel::None => None,
            HardwareAccel::Nvidia => Some("cuda"),
            HardwareAccel::Intel => Some("qsv"),
            HardwareAccel::Amd => Some("d3d11va"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HardwareAccel::None => "None (CPU Only)",
            HardwareAccel::Nvidia => "NVIDIA (CUDA)",
            HardwareAccel::Intel => "Intel (QSV)",
            HardwareAccel::Amd => "AMD (d3d11va)",
        }
    }

    /// Maps a dropdown label such as "NVIDIA (CUDA)" back to its variant.
    /// Unknown labels fall back to CPU decoding.
    pub fn from_label(label: &str) -> Self {
        if label.contains("NVIDIA") {
            HardwareAccel::Nvidia
        } else if label.contains("Intel") {
            HardwareAccel::Intel
        } else if label.contains("AMD") {
            HardwareAccel::Amd
        } else {
            HardwareAccel::None
        }
    }
}

impl fmt::Display for HardwareAccel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HardwareAccel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "cpu" => Ok(HardwareAccel::None),
            "nvidia" | "cuda" => Ok(HardwareAccel::Nvidia),
            "intel" | "qsv" => Ok(HardwareAccel::Intel),
            "amd" | "d3d11va" => Ok(HardwareAccel::Amd),
            other => Err(AppError::invalid("hardware acceleration", other)),
        }
    }
}

/// Lists the accelerators the given encoder binary reports. `None` is always present.
pub fn detect_available(ffmpeg: &Path) -> Vec<HardwareAccel> {
    let output = match Command::new(ffmpeg)
        .arg("-hide_banner")
        .arg("-hwaccels")
        .output()
    {
        Ok(o) => o,
        Err(e) => {
            log::warn!("Could not query hardware accelerators: {}", e);
            return vec![HardwareAccel::None];
        }
    };

    parse_hwaccels(&String::from_utf8_lossy(&output.stdout))
}

fn parse_hwaccels(listing: &str) -> Vec<HardwareAccel> {
    let methods: Vec<&str> = listing.lines().map(str::trim).collect();

    HardwareAccel::ALL
        .into_iter()
        .filter(|accel| match accel.ffmpeg_method() {
            Some(method) => methods.contains(&method),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_input_args() {
        assert!(HardwareAccel::None.pre_input_args().is_empty());
        assert_eq!(HardwareAccel::Nvidia.pre_input_args(), &["-hwaccel", "cuda"]);
        assert_eq!(
            HardwareAccel::Intel.pre_input_args(),
            &["-hwaccel", "qsv", "-hwaccel_output_format", "qsv"]
        );
        assert_eq!(HardwareAccel::Amd.pre_input_args(), &["-hwaccel", "d3d11va"]);
    }

    #[test]
    fn test_from_label_roundtrips_dropdown_values() {
        for accel in HardwareAccel::ALL {
            assert_eq!(HardwareAccel::from_label(accel.label()), accel);
        }
        assert_eq!(HardwareAccel::from_label("something else"), HardwareAccel::None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("NVIDIA".parse::<HardwareAccel>().unwrap(), HardwareAccel::Nvidia);
        assert_eq!("qsv".parse::<HardwareAccel>().unwrap(), HardwareAccel::Intel);
        assert!("vulkan".parse::<HardwareAccel>().is_err());
    }

    #[test]
    fn test_parse_hwaccels_listing() {
        let listing = "Hardware acceleration methods:\nvdpau\ncuda\nvaapi\nqsv\n";
        assert_eq!(
            parse_hwaccels(listing),
            vec![HardwareAccel::None, HardwareAccel::Nvidia, HardwareAccel::Intel]
        );
        assert_eq!(parse_hwaccels(""), vec![HardwareAccel::None]);
    }
}
