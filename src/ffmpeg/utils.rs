//! Utility functions for output paths.
use std::path::{Path, PathBuf};

use crate::constants::{OUTPUT_EXTENSION, OUTPUT_SUFFIX};

/// Forces the container extension the encoder settings are built for.
///
/// # Arguments
/// * `path` - The user-chosen destination.
///
/// # Returns
/// * `PathBuf` - `path` with a `.webm` extension.
pub fn with_output_extension(path: &Path) -> PathBuf {
    let has_ext = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case(OUTPUT_EXTENSION))
        .unwrap_or(false);
    if has_ext {
        path.to_path_buf()
    } else {
        path.with_extension(OUTPUT_EXTENSION)
    }
}

/// Suggests a destination next to the source, e.g. `clip.mp4` -> `clip_transparent.webm`.
pub fn default_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    source.with_file_name(format!("{}{}.{}", stem, OUTPUT_SUFFIX, OUTPUT_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_output_extension() {
        assert_eq!(with_output_extension(Path::new("out")), PathBuf::from("out.webm"));
        assert_eq!(with_output_extension(Path::new("out.mp4")), PathBuf::from("out.webm"));
        assert_eq!(with_output_extension(Path::new("out.WEBM")), PathBuf::from("out.WEBM"));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/videos/stinger.mp4")),
            PathBuf::from("/videos/stinger_transparent.webm")
        );
    }
}
