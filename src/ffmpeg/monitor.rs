use std::time::{Duration, Instant};

use crate::constants::PROGRESS_LOG_INTERVAL_SECS;

/// Snapshot of an FFmpeg status line such as
/// `frame=  123 fps= 60 ... time=00:00:04.10 bitrate=1200.0kbits/s speed=1.9x`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Progress {
    pub frame: Option<String>,
    pub fps: Option<String>,
    pub time: Option<String>,
    pub bitrate: Option<String>,
    pub speed: Option<String>,
}

impl Progress {
    pub fn parse(line: &str) -> Option<Self> {
        if !(line.contains("time=") && line.contains("bitrate=")) {
            return None;
        }
        Some(Self {
            frame: extract_value(line, "frame="),
            fps: extract_value(line, "fps="),
            time: extract_value(line, "time="),
            bitrate: extract_value(line, "bitrate="),
            speed: extract_value(line, "speed="),
        })
    }

    /// Warmup lines report zero frames before the encoder produces output.
    pub fn is_warmup(&self) -> bool {
        self.frame.as_deref() == Some("0")
    }

    pub fn summary(&self) -> String {
        let mut msg = format!(
            "Time: {} | Bitrate: {} | Speed: {}",
            self.time.as_deref().unwrap_or("??"),
            self.bitrate.as_deref().unwrap_or("N/A"),
            self.speed.as_deref().unwrap_or("??")
        );
        if let Some(frame) = &self.frame {
            msg.push_str(&format!(" | Frame: {}", frame));
        }
        if let Some(fps) = &self.fps {
            msg.push_str(&format!(" | FPS: {}", fps));
        }
        msg
    }
}

/// Tracks the latest progress and rate-limits how often it is logged.
pub struct FfmpegMonitor {
    latest: Option<Progress>,
    last_log_time: Option<Instant>,
    log_interval: Duration,
}

impl FfmpegMonitor {
    pub fn new() -> Self {
        Self {
            latest: None,
            last_log_time: None,
            log_interval: Duration::from_secs(PROGRESS_LOG_INTERVAL_SECS),
        }
    }

    pub fn observe(&mut self, line: &str) {
        match Progress::parse(line) {
            Some(progress) => {
                if progress.is_warmup() {
                    return;
                }
                let due = self
                    .last_log_time
                    .map_or(true, |t| t.elapsed() >= self.log_interval);
                if due {
                    log::info!("Converting | {}", progress.summary());
                    self.last_log_time = Some(Instant::now());
                }
                self.latest = Some(progress);
            }
            None => {
                if !line.trim().is_empty() {
                    log::debug!("FFmpeg: {}", line.trim());
                }
            }
        }
    }

    pub fn latest(&self) -> Option<&Progress> {
        self.latest.as_ref()
    }

    pub fn reset(&mut self) {
        self.latest = None;
        self.last_log_time = None;
    }
}

impl Default for FfmpegMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_value(line: &str, key: &str) -> Option<String> {
    let start = line.find(key)?;
    let after_key = &line[start + key.len()..];
    // Skip leading whitespace to find the start of the value
    let value_part = after_key.trim_start();
    let end = value_part
        .find(|c: char| c.is_whitespace())
        .unwrap_or(value_part.len());
    if end == 0 {
        None
    } else {
        Some(value_part[..end].to_string())
    }
}
