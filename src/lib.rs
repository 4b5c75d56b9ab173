//! Chroma-key removal for stinger transitions.
//!
//! The form collects a [params::RawParams], validates it into a
//! [params::ChromaParams], [ffmpeg::commands::ChromaCommandBuilder] turns that
//! into an FFmpeg invocation and [controller::ConversionController] runs it.

pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod ffmpeg;
pub mod i18n;
pub mod params;

pub use controller::{ConversionController, ConversionOutcome, ConversionState, ControllerUpdate};
pub use error::AppError;
