//! Encoder discovery.
//!
//! Search order: an explicit override from the config, a binary next to the
//! application executable, then the system `PATH`.

use std::path::{Path, PathBuf};

use crate::constants::FFMPEG_EXECUTABLE;
use crate::error::AppError;

pub fn find_ffmpeg(override_path: Option<&Path>) -> Result<PathBuf, AppError> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf));

    find_ffmpeg_in(override_path, exe_dir.as_deref(), FFMPEG_EXECUTABLE)
}

pub(crate) fn find_ffmpeg_in(
    override_path: Option<&Path>,
    exe_dir: Option<&Path>,
    name: &str,
) -> Result<PathBuf, AppError> {
    if let Some(path) = override_path {
        if path.is_file() {
            log::info!("Using FFmpeg from config: {:?}", path);
            return Ok(path.to_path_buf());
        }
        log::warn!("Configured FFmpeg path is not a file: {:?}", path);
    }

    if let Some(dir) = exe_dir {
        let bundled = dir.join(name);
        if bundled.is_file() {
            log::info!("Using bundled FFmpeg: {:?}", bundled);
            return Ok(bundled);
        }
    }

    match which::which(name) {
        Ok(path) => {
            log::info!("Using FFmpeg from PATH: {:?}", path);
            Ok(path)
        }
        Err(_) => Err(AppError::ExecutableNotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const UNLIKELY_NAME: &str = "stinger-chroma-test-ffmpeg-does-not-exist";

    #[test]
    fn test_prefers_binary_next_to_app() {
        let dir = tempfile::tempdir().unwrap();
        let bundled = dir.path().join(UNLIKELY_NAME);
        fs::write(&bundled, b"").unwrap();

        let found = find_ffmpeg_in(None, Some(dir.path()), UNLIKELY_NAME).unwrap();
        assert_eq!(found, bundled);
    }

    #[test]
    fn test_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let bundled = dir.path().join(UNLIKELY_NAME);
        let custom = dir.path().join("custom-ffmpeg");
        fs::write(&bundled, b"").unwrap();
        fs::write(&custom, b"").unwrap();

        let found = find_ffmpeg_in(Some(&custom), Some(dir.path()), UNLIKELY_NAME).unwrap();
        assert_eq!(found, custom);
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let result = find_ffmpeg_in(Some(&missing), Some(dir.path()), UNLIKELY_NAME);
        assert!(matches!(result, Err(AppError::ExecutableNotFound)));
    }
}
