//! Audio output behind the `AudioSink` seam
//!
//! `MpvSink` plays each track in an `mpv` child process and controls it over
//! the IPC socket. `SilentSink` plays nothing and only keeps time, which is
//! enough to drive the queue without an audio device.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::model::Track;

/// Reported back to the engine. `token` identifies the `play` call, so a
/// late report for a track that was already replaced can be ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioEvent {
    Finished { token: u64 },
    Failed { token: u64 },
}

pub trait AudioSink: Send {
    /// Start `track`, replacing whatever is playing
    fn play(&mut self, track: &Track, token: u64) -> Result<()>;
    fn set_paused(&mut self, paused: bool) -> Result<()>;
    fn set_volume(&mut self, volume: u8) -> Result<()>;
    fn stop(&mut self);
}

pub struct MpvSink {
    binary: String,
    socket: PathBuf,
    volume: u8,
    events: mpsc::UnboundedSender<AudioEvent>,
    watcher: Option<JoinHandle<()>>,
}

impl MpvSink {
    pub fn new(binary: impl Into<String>, volume: u8, events: mpsc::UnboundedSender<AudioEvent>) -> Self {
        let socket = std::env::temp_dir().join(format!("cloudtune-mpv-{}.sock", std::process::id()));
        Self {
            binary: binary.into(),
            socket,
            volume,
            events,
            watcher: None,
        }
    }

    fn send_command(&self, command: serde_json::Value) {
        let socket = self.socket.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc(&socket, &command).await {
                tracing::warn!(error = %e, command = %command, "mpv IPC command failed");
            }
        });
    }
}

#[cfg(unix)]
async fn ipc(socket: &std::path::Path, command: &serde_json::Value) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut stream = tokio::net::UnixStream::connect(socket).await?;
    let mut line = serde_json::to_vec(&serde_json::json!({ "command": command }))?;
    line.push(b'\n');
    stream.write_all(&line).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn ipc(_socket: &std::path::Path, _command: &serde_json::Value) -> Result<()> {
    anyhow::bail!("mpv IPC is only supported on unix")
}

impl AudioSink for MpvSink {
    fn play(&mut self, track: &Track, token: u64) -> Result<()> {
        self.stop();

        let mut child = tokio::process::Command::new(&self.binary)
            .arg("--no-video")
            .arg("--really-quiet")
            .arg(format!("--input-ipc-server={}", self.socket.display()))
            .arg(format!("--volume={}", self.volume))
            .arg(&track.locator)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        tracing::info!(track_id = track.id, title = %track.title, "mpv started");

        let events = self.events.clone();
        self.watcher = Some(tokio::spawn(async move {
            let event = match child.wait().await {
                Ok(status) if status.success() => AudioEvent::Finished { token },
                Ok(status) => {
                    tracing::warn!(status = %status, "mpv exited with failure");
                    AudioEvent::Failed { token }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Waiting on mpv failed");
                    AudioEvent::Failed { token }
                }
            };
            let _ = events.send(event);
        }));
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) -> Result<()> {
        self.send_command(serde_json::json!(["set_property", "pause", paused]));
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.volume = volume;
        self.send_command(serde_json::json!(["set_property", "volume", volume]));
        Ok(())
    }

    fn stop(&mut self) {
        // aborting the watcher drops the child, which kills it
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

impl Drop for MpvSink {
    fn drop(&mut self) {
        self.stop();
        let _ = std::fs::remove_file(&self.socket);
    }
}

/// Stand-in length for tracks the catalogue reports without a duration
const UNKNOWN_DURATION: Duration = Duration::from_secs(1);

/// Keeps time for the current track and reports it finished
pub struct SilentSink {
    events: mpsc::UnboundedSender<AudioEvent>,
    token: u64,
    remaining: Duration,
    started: Option<Instant>,
    timer: Option<JoinHandle<()>>,
}

impl SilentSink {
    pub fn new(events: mpsc::UnboundedSender<AudioEvent>) -> Self {
        Self {
            events,
            token: 0,
            remaining: Duration::ZERO,
            started: None,
            timer: None,
        }
    }

    fn arm(&mut self) {
        if self.remaining.is_zero() {
            return;
        }
        let events = self.events.clone();
        let token = self.token;
        let remaining = self.remaining;
        self.started = Some(Instant::now());
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let _ = events.send(AudioEvent::Finished { token });
        }));
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl AudioSink for SilentSink {
    fn play(&mut self, track: &Track, token: u64) -> Result<()> {
        self.disarm();
        self.token = token;
        self.remaining = match track.duration_ms {
            0 => UNKNOWN_DURATION,
            ms => Duration::from_millis(u64::from(ms)),
        };
        self.arm();
        tracing::debug!(track_id = track.id, "Silent playback started");
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) -> Result<()> {
        if paused {
            if let Some(started) = self.started.take() {
                self.remaining = self.remaining.saturating_sub(started.elapsed());
            }
            self.disarm();
        } else if self.timer.is_none() {
            self.arm();
        }
        Ok(())
    }

    fn set_volume(&mut self, _volume: u8) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) {
        self.disarm();
        self.started = None;
        self.remaining = Duration::ZERO;
    }
}
