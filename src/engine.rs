use cpal::traits::{DeviceTrait, HostTrait};
use crossbeam::channel::{unbounded, Sender};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapProd, HeapRb};
use std::fmt;
use std::sync::Arc;

use crate::audio_io;
use crate::command::Command;
use crate::config::CONFIG;
use crate::controller::{PlaybackController, PlayerState, Source};

static ENGINE_STATE: Lazy<Mutex<Option<Arc<Engine>>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug)]
pub enum EngineError {
    NoOutputDevice,
    DeviceConfig(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NoOutputDevice => write!(f, "no output device available"),
            EngineError::DeviceConfig(e) => write!(f, "output device config: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Handle to the process-wide playback engine.
///
/// Constructed lazily on the first play action; the audio stream and its
/// controller then live for the process lifetime. Control calls enqueue
/// commands that the render callback applies on the audio clock, so every
/// call here returns immediately.
pub struct Engine {
    controller: Arc<Mutex<PlaybackController>>,
    commands: Mutex<HeapProd<Command>>,
    shutdown: Sender<()>,
}

impl Engine {
    /// The singleton engine, built on first call. Safe to call repeatedly;
    /// later calls return the same engine.
    pub fn get() -> Result<Arc<Engine>, EngineError> {
        let mut slot = ENGINE_STATE.lock();
        if let Some(engine) = slot.as_ref() {
            return Ok(engine.clone());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| EngineError::DeviceConfig(e.to_string()))?;
        let stream_rate = config.sample_rate().0;
        log::info!("starting playback engine at {stream_rate} Hz");

        let controller = Arc::new(Mutex::new(PlaybackController::new(
            stream_rate as f32,
            CONFIG.clone(),
        )));
        let rb = HeapRb::<Command>::new(64);
        let (prod, cons) = rb.split();
        let (tx, rx) = unbounded();

        let stream_controller = controller.clone();
        std::thread::spawn(move || {
            audio_io::run_audio_stream(stream_controller, cons, rx);
        });

        let engine = Arc::new(Engine {
            controller,
            commands: Mutex::new(prod),
            shutdown: tx,
        });
        *slot = Some(engine.clone());
        Ok(engine)
    }

    fn send(&self, cmd: Command) {
        if self.commands.lock().try_push(cmd).is_err() {
            log::warn!("command queue full, dropping {cmd:?}");
        }
    }

    pub fn press(&self, source: Source) {
        self.send(Command::Press(source));
    }

    pub fn set_volume(&self, volume: f32) {
        self.send(Command::SetVolume(volume));
    }

    pub fn set_pan(&self, pan: f32) {
        self.send(Command::SetPan(pan));
    }

    pub fn set_continuous(&self, on: bool) {
        self.send(Command::SetContinuous(on));
    }

    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Observable state for display and button highlighting.
    pub fn snapshot(&self) -> PlayerState {
        self.controller.lock().state()
    }

    /// Stop playback and tear the stream down; the fade plays out first.
    pub fn shutdown(&self) {
        self.send(Command::Stop);
        let _ = self.shutdown.send(());
    }
}
