use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::{AUDIO_CODEC, LOSSLESS_BITRATE, PIXEL_FORMAT_ALPHA, VIDEO_CODEC};
use crate::params::ChromaParams;

/// A fully resolved encoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ConversionCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for ConversionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ChromaCommandBuilder<'a> {
    params: &'a ChromaParams,
    output_path: PathBuf,
}

impl<'a> ChromaCommandBuilder<'a> {
    pub fn new(params: &'a ChromaParams, output_path: impl Into<PathBuf>) -> Self {
        Self {
            params,
            output_path: output_path.into(),
        }
    }

    /// Order matters: denoise cleans the source before keying, despill and
    /// scale work on the keyed result.
    pub fn filter_chain(&self) -> String {
        let p = self.params;
        let mut filters = Vec::new();

        if p.denoise_strength > 0.0 {
            filters.push(format!("nlmeans=strength={}", format_number(p.denoise_strength)));
        }
        filters.push(format!(
            "chromakey=color={}:similarity={}:blend={}",
            p.chroma_key_color,
            format_number(p.similarity),
            format_number(p.blend)
        ));
        if p.despill {
            filters.push("despill".to_string());
        }
        if let Some(res) = &p.resolution {
            filters.push(format!("scale={}", res));
        }

        filters.join(",")
    }

    pub fn build_args(&self) -> Vec<String> {
        let p = self.params;

        // Hardware flags are rejected after the input path
        let mut args: Vec<String> = p
            .hardware_accel
            .pre_input_args()
            .iter()
            .map(|s| s.to_string())
            .collect();

        args.extend([
            "-i".to_string(),
            p.source_path.to_string_lossy().to_string(),
            "-vf".to_string(),
            self.filter_chain(),
            "-c:v".to_string(),
            VIDEO_CODEC.to_string(),
            "-crf".to_string(),
            p.crf.to_string(),
            "-b:v".to_string(),
            LOSSLESS_BITRATE.to_string(),
            "-pix_fmt".to_string(),
            PIXEL_FORMAT_ALPHA.to_string(),
            "-speed".to_string(),
            p.encode_speed.to_string(),
        ]);

        if !p.keep_source_fps {
            args.push("-r".to_string());
            args.push(p.target_fps.to_string());
        }

        if p.audio_disabled {
            args.push("-an".to_string());
        } else if let Some(bitrate) = &p.audio_bitrate {
            args.extend([
                "-c:a".to_string(),
                AUDIO_CODEC.to_string(),
                "-b:a".to_string(),
                bitrate.clone(),
            ]);
        }

        args.push("-y".to_string());
        args.push(self.output_path.to_string_lossy().to_string());
        args
    }

    pub fn build(&self, ffmpeg: &Path) -> ConversionCommand {
        ConversionCommand::new(ffmpeg, self.build_args())
    }
}

/// Whole numbers keep one decimal (`2.0`), everything else uses the shortest
/// exact form (`0.15`).
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
