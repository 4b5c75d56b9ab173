//! FFmpeg Module
//!
//! Everything that touches the external encoder.
//!
//! # Architecture
//!
//! * `commands`: Builds the ordered argument vector for a chroma-key conversion.
//! * `hwaccel`: Hardware decode flags and detection of what the local binary supports.
//! * `locate`: Finds the encoder executable.
//! * `session`: Owns the child process and its background worker.
//! * `monitor`: Parses FFmpeg status lines into progress snapshots.
//! * `utils`: Output path helpers.

pub mod commands;
pub mod hwaccel;
pub mod locate;
pub mod monitor;
pub mod session;
pub mod utils;
