//! Conversion Controller
//!
//! Owns the conversion lifecycle on the foreground side:
//! `Idle -> Running -> {Succeeded, Failed, Cancelled} -> Idle`.
//!
//! The worker never touches this state. It only fills the session's line
//! queue and posts a single exit status; [ConversionController::poll] drains
//! both on whatever cadence the front end polls at.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::CANCEL_GRACE_PERIOD_MS;
use crate::error::AppError;
use crate::ffmpeg::commands::ConversionCommand;
use crate::ffmpeg::monitor::{FfmpegMonitor, Progress};
use crate::ffmpeg::session::ConversionSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionState {
    Idle,
    Running,
    Cancelled,
    Succeeded { output_path: PathBuf },
    Failed { error: String },
}

/// Terminal result worth telling the user about. Cancellation never produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Succeeded(PathBuf),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct ControllerUpdate {
    /// New output lines, in the order FFmpeg wrote them.
    pub lines: Vec<String>,
    pub outcome: Option<ConversionOutcome>,
}

pub struct ConversionController {
    state: ConversionState,
    session: Option<ConversionSession>,
    monitor: FfmpegMonitor,
    cancel_grace: Duration,
}

impl ConversionController {
    pub fn new() -> Self {
        Self {
            state: ConversionState::Idle,
            session: None,
            monitor: FfmpegMonitor::new(),
            cancel_grace: Duration::from_millis(CANCEL_GRACE_PERIOD_MS),
        }
    }

    /// How long a cancelled encoder may take to stop before it is killed.
    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    pub fn state(&self) -> &ConversionState {
        &self.state
    }

    /// A process is still alive, possibly already cancelled.
    pub fn is_busy(&self) -> bool {
        self.session.is_some()
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.monitor.latest()
    }

    pub fn start(&mut self, command: &ConversionCommand, output_path: &Path) -> Result<(), AppError> {
        if self.state != ConversionState::Idle || self.session.is_some() {
            log::warn!("Ignoring start request while {:?}", self.state);
            return Err(AppError::Busy);
        }

        self.monitor.reset();
        match ConversionSession::spawn(command, output_path, self.cancel_grace) {
            Ok(session) => {
                self.session = Some(session);
                self.state = ConversionState::Running;
                log::info!("Conversion started -> {:?}", output_path);
                Ok(())
            }
            Err(e) => {
                log::error!("{}", e);
                self.state = ConversionState::Failed { error: e.to_string() };
                Err(e)
            }
        }
    }

    /// Returns `true` if a running conversion was cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.state != ConversionState::Running {
            return false;
        }
        if let Some(session) = &self.session {
            session.request_cancel();
        }
        self.state = ConversionState::Cancelled;
        log::info!("Conversion cancelled by user");
        true
    }

    /// Non-blocking. Drains queued output and applies the exit status if the
    /// worker has posted one.
    pub fn poll(&mut self) -> ControllerUpdate {
        let mut update = ControllerUpdate::default();
        let Some(session) = &self.session else {
            return update;
        };

        // Exit is posted after the last line, so draining afterwards sees everything
        let exit = session.try_exit();
        update.lines = session.drain_lines();
        for line in &update.lines {
            self.monitor.observe(line);
        }

        let Some(exit) = exit else {
            return update;
        };
        let output_path = session.output_path().to_path_buf();
        self.session = None;

        if self.state != ConversionState::Running {
            log::debug!("Discarding exit status after cancellation: {:?}", exit);
            return update;
        }

        let outcome = match exit {
            Ok(status) if status.success() => {
                log::info!("Conversion succeeded: {:?}", output_path);
                self.state = ConversionState::Succeeded { output_path: output_path.clone() };
                ConversionOutcome::Succeeded(output_path)
            }
            Ok(status) => {
                let error = AppError::ProcessExit(status.to_string()).to_string();
                log::error!("Conversion failed: {}", error);
                self.state = ConversionState::Failed { error: error.clone() };
                ConversionOutcome::Failed(error)
            }
            Err(e) => {
                let error = AppError::Io(e).to_string();
                log::error!("Conversion failed: {}", error);
                self.state = ConversionState::Failed { error: error.clone() };
                ConversionOutcome::Failed(error)
            }
        };
        update.outcome = Some(outcome);
        update
    }

    /// Back to `Idle` after a terminal state.
    pub fn reset(&mut self) -> Result<(), AppError> {
        match self.state {
            ConversionState::Running => Err(AppError::State(
                "cannot reset while a conversion is running".to_string(),
            )),
            _ => {
                self.state = ConversionState::Idle;
                Ok(())
            }
        }
    }
}

impl Default for ConversionController {
    fn default() -> Self {
        Self::new()
    }
}
