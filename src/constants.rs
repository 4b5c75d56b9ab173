// Chroma Key Defaults
pub const DEFAULT_TOLERANCE: f64 = 0.15;
pub const DEFAULT_BLEND: f64 = 0.1;
pub const DEFAULT_DENOISE: f64 = 0.0;
pub const MAX_DENOISE: f64 = 5.0;

// Encoder Defaults
pub const DEFAULT_CRF: u32 = 20;
pub const MAX_CRF: u32 = 63;
pub const DEFAULT_SPEED: u32 = 2;
pub const MAX_SPEED: u32 = 5;
pub const DEFAULT_FPS: u32 = 30;
pub const MIN_FPS: u32 = 15;
pub const MAX_FPS: u32 = 60;
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";

// FFmpeg Output
pub const VIDEO_CODEC: &str = "libvpx-vp9";
pub const PIXEL_FORMAT_ALPHA: &str = "yuva420p";
pub const LOSSLESS_BITRATE: &str = "0"; // -b:v 0 lets CRF drive quality
pub const AUDIO_CODEC: &str = "libvorbis";
pub const OUTPUT_EXTENSION: &str = "webm";
pub const OUTPUT_SUFFIX: &str = "_transparent";

// Executable
#[cfg(windows)]
pub const FFMPEG_EXECUTABLE: &str = "ffmpeg.exe";
#[cfg(not(windows))]
pub const FFMPEG_EXECUTABLE: &str = "ffmpeg";
#[cfg(windows)]
pub const CREATE_NO_WINDOW: u32 = 0x08000000;

// Conversion Lifecycle
pub const LOG_POLL_INTERVAL_MS: u64 = 100;
pub const LOG_QUEUE_CAPACITY: usize = 1024;
pub const CANCEL_GRACE_PERIOD_MS: u64 = 5000;
pub const EXIT_POLL_INTERVAL_MS: u64 = 50;
pub const PROGRESS_LOG_INTERVAL_SECS: u64 = 5;
