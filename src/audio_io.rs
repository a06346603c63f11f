use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use ringbuf::traits::Consumer;
use ringbuf::HeapCons;
use std::sync::Arc;
use std::time::Duration;

use crate::command::Command;
use crate::controller::PlaybackController;

/// Open the default output device and drive the controller from its render
/// callback until `shutdown` fires. Commands are drained at the top of every
/// block, so all state transitions happen on the audio clock.
pub fn run_audio_stream(
    controller: Arc<Mutex<PlaybackController>>,
    mut commands: HeapCons<Command>,
    shutdown: Receiver<()>,
) {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .expect("no output device available");
    let supported_config = device.default_output_config().expect("no default config");
    let sample_format = supported_config.sample_format();
    let config: StreamConfig = supported_config.into();

    let callback_controller = controller.clone();
    let audio_callback = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        let mut controller = callback_controller.lock();
        while let Some(cmd) = commands.try_pop() {
            controller.apply_command(cmd);
        }
        controller.process_block(data);
    };
    let err_fn = |err| log::error!("stream error: {err}");

    let stream = match sample_format {
        SampleFormat::F32 => device
            .build_output_stream(&config, audio_callback, err_fn, None)
            .unwrap(),
        _ => panic!("Unsupported sample format"),
    };
    stream.play().unwrap();

    // Keep the stream alive until told to shut down.
    loop {
        if shutdown.recv_timeout(Duration::from_millis(100)).is_ok() {
            break;
        }
    }

    // Fade out before the stream drops so teardown is never audible.
    controller.lock().shutdown();
    std::thread::sleep(Duration::from_millis(100));
    drop(stream);
}
