//! FFmpeg Conversion Session
//!
//! This module manages the active FFmpeg child process. It handles:
//! 1. Spawning the process from a [crate::ffmpeg::commands::ConversionCommand].
//! 2. Streaming merged stdout/stderr into a bounded line queue.
//! 3. Waiting for exit on a background worker and reporting the status once.
//! 4. Graceful cancellation (`q` on stdin) with a forced kill after a grace period.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::constants::{EXIT_POLL_INTERVAL_MS, LOG_QUEUE_CAPACITY};
use crate::error::AppError;
use crate::ffmpeg::commands::ConversionCommand;

pub struct ConversionSession {
    output_path: PathBuf,
    lines: Receiver<String>,
    exit: Receiver<io::Result<ExitStatus>>,
    cancel: Arc<AtomicBool>,
}

impl ConversionSession {
    pub fn spawn(
        command: &ConversionCommand,
        output_path: &Path,
        cancel_grace: Duration,
    ) -> Result<Self, AppError> {
        info!("Spawning FFmpeg: {}", command);

        let (reader, child) = spawn_merged(command).map_err(AppError::ProcessSpawn)?;
        info!("FFmpeg started (PID {})", child.id());

        let (line_tx, line_rx) = mpsc::sync_channel::<String>(LOG_QUEUE_CAPACITY);
        let (exit_tx, exit_rx) = mpsc::sync_channel::<io::Result<ExitStatus>>(1);
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = cancel.clone();

        thread::spawn(move || {
            let reader_handle = thread::spawn(move || {
                let result = for_each_line(reader, |line| {
                    // The receiver may be gone; keep draining so FFmpeg never blocks on a full pipe
                    let _ = line_tx.send(line);
                });
                if let Err(e) = result {
                    warn!("Failed reading FFmpeg output: {}", e);
                }
            });

            let status = wait_with_cancel(child, &worker_cancel, cancel_grace);

            // Exit is only reported once every line has been queued
            if reader_handle.join().is_err() {
                error!("FFmpeg output reader panicked");
            }
            match &status {
                Ok(s) => info!("FFmpeg exited: {}", s),
                Err(e) => error!("Failed waiting for FFmpeg: {}", e),
            }
            let _ = exit_tx.send(status);
        });

        Ok(Self {
            output_path: output_path.to_path_buf(),
            lines: line_rx,
            exit: exit_rx,
            cancel,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Everything queued so far, without blocking.
    pub fn drain_lines(&self) -> Vec<String> {
        self.lines.try_iter().collect()
    }

    /// The exit status once the worker is done, without blocking.
    pub fn try_exit(&self) -> Option<io::Result<ExitStatus>> {
        match self.exit.try_recv() {
            Ok(status) => Some(status),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(io::Error::new(
                io::ErrorKind::Other,
                "conversion worker stopped without reporting",
            ))),
        }
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

impl Drop for ConversionSession {
    fn drop(&mut self) {
        // Nobody is left to read the outcome; make sure FFmpeg does not outlive us
        self.request_cancel();
    }
}

fn spawn_merged(command: &ConversionCommand) -> io::Result<(io::PipeReader, Child)> {
    let (reader, writer) = io::pipe()?;

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::piped())
        .stdout(writer.try_clone()?)
        .stderr(writer);

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(crate::constants::CREATE_NO_WINDOW);
    }

    // Terminal Ctrl+C must reach only us; stopping FFmpeg goes through `q`
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let child = cmd.spawn()?;
    // Release our copies of the write end so the reader sees EOF when FFmpeg exits
    drop(cmd);
    Ok((reader, child))
}

fn wait_with_cancel(
    mut child: Child,
    cancel: &AtomicBool,
    grace: Duration,
) -> io::Result<ExitStatus> {
    let mut stop_sent_at: Option<Instant> = None;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }

        if cancel.load(Ordering::SeqCst) {
            match stop_sent_at {
                None => {
                    info!("Sending 'q' to FFmpeg...");
                    if let Some(mut stdin) = child.stdin.take() {
                        if let Err(e) = stdin.write_all(b"q") {
                            warn!("Failed to send 'q' to FFmpeg: {}", e);
                        }
                    }
                    stop_sent_at = Some(Instant::now());
                }
                Some(sent) if sent.elapsed() >= grace => {
                    warn!("FFmpeg still running {:?} after stop request, killing", grace);
                    if let Err(e) = child.kill() {
                        warn!("Failed to kill FFmpeg: {}", e);
                    }
                    return child.wait();
                }
                Some(_) => {}
            }
        }

        thread::sleep(Duration::from_millis(EXIT_POLL_INTERVAL_MS));
    }
}

/// Splits output on `\n` and `\r`; FFmpeg rewrites its status line with bare
/// carriage returns. Empty lines are skipped.
pub(crate) fn for_each_line<R: Read>(reader: R, mut f: impl FnMut(String)) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        let chunk = match reader.fill_buf() {
            Ok(chunk) => chunk,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if chunk.is_empty() {
            break;
        }

        let consumed = chunk.len();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if !line.is_empty() {
                    f(String::from_utf8_lossy(&line).into_owned());
                    line.clear();
                }
            } else {
                line.push(byte);
            }
        }
        reader.consume(consumed);
    }

    if !line.is_empty() {
        f(String::from_utf8_lossy(&line).into_owned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(input: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for_each_line(Cursor::new(input.to_vec()), |l| lines.push(l)).unwrap();
        lines
    }

    #[test]
    fn test_splits_on_cr_and_lf() {
        let lines = collect(b"Input #0\nframe=1 time=0\rframe=2 time=1\r\nlast");
        assert_eq!(lines, vec!["Input #0", "frame=1 time=0", "frame=2 time=1", "last"]);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let lines = collect(b"ok\n\xff\xfe\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "ok");
    }

    #[cfg(unix)]
    fn wait_for_exit(session: &ConversionSession) -> (Vec<String>, io::Result<ExitStatus>) {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut lines = Vec::new();
        loop {
            let exit = session.try_exit();
            lines.extend(session.drain_lines());
            if let Some(status) = exit {
                return (lines, status);
            }
            assert!(Instant::now() < deadline, "session did not finish");
            thread::sleep(Duration::from_millis(20));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_merges_stdout_and_stderr() {
        let command = ConversionCommand::new(
            "/bin/sh",
            vec!["-c".to_string(), "echo out; echo err 1>&2; exit 0".to_string()],
        );
        let session = ConversionSession::spawn(&command, Path::new("out.webm"), Duration::from_secs(1)).unwrap();
        let (lines, status) = wait_for_exit(&session);

        assert!(status.unwrap().success());
        assert!(lines.contains(&"out".to_string()));
        assert!(lines.contains(&"err".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_kills_unresponsive_process() {
        let command = ConversionCommand::new(
            "/bin/sh",
            vec!["-c".to_string(), "exec sleep 30".to_string()],
        );
        let session = ConversionSession::spawn(&command, Path::new("out.webm"), Duration::from_millis(200)).unwrap();
        session.request_cancel();
        let started = Instant::now();
        let (_, status) = wait_for_exit(&session);

        assert!(!status.unwrap().success());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_sends_quit_on_stdin() {
        let command = ConversionCommand::new(
            "/bin/sh",
            vec!["-c".to_string(), "read key; echo got $key; exit 0".to_string()],
        );
        let grace = Duration::from_secs(3);
        let session = ConversionSession::spawn(&command, Path::new("out.webm"), grace).unwrap();
        session.request_cancel();
        let started = Instant::now();
        let (lines, status) = wait_for_exit(&session);

        assert!(status.unwrap().success());
        assert_eq!(lines, vec!["got q"]);
        assert!(started.elapsed() < grace);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_child_leads_its_own_process_group() {
        // Fifth field of /proc/<pid>/stat is the process group
        let command = ConversionCommand::new(
            "/bin/sh",
            vec![
                "-c".to_string(),
                "echo $$; cut -d' ' -f5 /proc/$$/stat".to_string(),
            ],
        );
        let session = ConversionSession::spawn(&command, Path::new("out.webm"), Duration::from_secs(1)).unwrap();
        let (lines, status) = wait_for_exit(&session);

        assert!(status.unwrap().success());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
        assert_ne!(lines[0], std::process::id().to_string());
    }

    #[test]
    fn test_spawn_failure() {
        let command = ConversionCommand::new("/nonexistent/path/to/ffmpeg", vec![]);
        let result = ConversionSession::spawn(&command, Path::new("out.webm"), Duration::from_secs(1));
        assert!(matches!(result, Err(AppError::ProcessSpawn(_))));
    }
}
