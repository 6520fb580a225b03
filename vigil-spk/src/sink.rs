//! Audio sinks: where rendered bytes go
//!
//! Playing is "initiated", not "finished": a sink returns as soon as the
//! audio has been handed off.

use crate::engines::AudioFormat;
use crate::error::SpeechError;
use bytes::Bytes;
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Destination for rendered audio
pub trait AudioSink: Send + Sync {
    fn play(&self, audio: &Bytes, format: AudioFormat) -> Result<(), SpeechError>;

    fn name(&self) -> &str;
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&self, audio: &Bytes, _format: AudioFormat) -> Result<(), SpeechError> {
        debug!("Discarding {} bytes of audio", audio.len());
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Writes each clip to a numbered file in a directory
pub struct DirectorySink {
    dir: PathBuf,
    counter: Mutex<u64>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SpeechError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            counter: Mutex::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AudioSink for DirectorySink {
    fn play(&self, audio: &Bytes, format: AudioFormat) -> Result<(), SpeechError> {
        let index = {
            let mut counter = self.counter.lock();
            *counter += 1;
            *counter
        };
        let path = self.dir.join(format!("alert-{:06}.{}", index, format.extension()));
        std::fs::write(&path, audio)?;
        debug!("Wrote {} bytes to {}", audio.len(), path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "directory"
    }
}

/// Clips waiting for the player before new ones are dropped
const PLAYER_BACKLOG: usize = 8;

/// Pipes audio into an external player (e.g. `aplay -q`, `ffplay -nodisp -autoexit -`).
///
/// One player thread plays the clips in hand-over order, each to completion,
/// so a beep never overlaps a spoken alert. A clip handed over while the
/// backlog is full is dropped. A player that fails to start is reported by
/// the next call to `play`.
pub struct CommandSink {
    program: String,
    clips: mpsc::Sender<Bytes>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl CommandSink {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Result<Self, SpeechError> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(SpeechError::Config("Player program cannot be empty".to_string()));
        }

        let (clips, rx) = mpsc::channel(PLAYER_BACKLOG);
        let last_error = Arc::new(Mutex::new(None));
        let player = Player {
            program: program.clone(),
            args,
            last_error: last_error.clone(),
        };
        std::thread::Builder::new()
            .name("vigil-player".to_string())
            .spawn(move || player.run(rx))
            .map_err(|e| SpeechError::Playback(format!("Failed to start player thread: {}", e)))?;

        Ok(Self {
            program,
            clips,
            last_error,
        })
    }
}

impl AudioSink for CommandSink {
    fn play(&self, audio: &Bytes, _format: AudioFormat) -> Result<(), SpeechError> {
        if let Some(err) = self.last_error.lock().take() {
            return Err(SpeechError::Playback(err));
        }

        match self.clips.try_send(audio.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("{} is busy, dropping {} bytes of audio", self.program, audio.len());
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(SpeechError::Playback(format!("{} player thread stopped", self.program))),
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Owner of the player process, lives on its own thread
struct Player {
    program: String,
    args: Vec<String>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl Player {
    fn run(self, mut clips: mpsc::Receiver<Bytes>) {
        while let Some(audio) = clips.blocking_recv() {
            if let Err(e) = self.play_one(&audio) {
                warn!("{}", e);
                *self.last_error.lock() = Some(e);
            }
        }
        debug!("Player thread for {} stopped", self.program);
    }

    fn play_one(&self, audio: &[u8]) -> Result<(), String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("Failed to start {}: {}", self.program, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(audio) {
                warn!("Failed to stream audio to {}: {}", self.program, e);
            }
        }

        match child.wait() {
            Ok(status) if !status.success() => warn!("{} exited with {}", self.program, status),
            Err(e) => warn!("Failed to wait for {}: {}", self.program, e),
            _ => {}
        }
        Ok(())
    }
}
