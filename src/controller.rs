use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::config::EngineConfig;
use crate::voice::{RampTimes, ToneVoice};

/// What a press plays. The three fixed sources carry their pan position;
/// `custom` uses whatever pan the user last dialed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Left,
    Center,
    Right,
    Custom,
}

impl Source {
    fn pan(self, last_custom_pan: f32) -> f32 {
        match self {
            Source::Left => -1.0,
            Source::Center => 0.0,
            Source::Right => 1.0,
            Source::Custom => last_custom_pan,
        }
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Source::Left),
            "center" => Ok(Source::Center),
            "right" => Ok(Source::Right),
            "custom" => Ok(Source::Custom),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

/// Observable playback state for a front end: which button to highlight and
/// what the sliders should show. Never read back into engine decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerState {
    pub currently_playing: Option<Source>,
    pub last_played: Option<Source>,
    pub volume: f32,
    pub pan: f32,
    pub continuous: bool,
}

/// The playback state machine.
///
/// Owns the single optional voice, the session identity and the one auto-stop
/// timer slot. All mutation happens synchronously inside discrete calls
/// (press, drag, toggle, block render); there is no hidden reactivity.
pub struct PlaybackController {
    voice: Option<ToneVoice>,
    currently_playing: Option<Source>,
    last_played: Option<Source>,
    continuous: bool,
    volume: f32,
    pan: f32,
    last_custom_pan: f32,
    /// Absolute clock time of the pending auto-stop. At most one exists;
    /// every transition either cancels it, re-arms it, or leaves it empty.
    auto_stop_at: Option<f64>,
    current_sample: u64,
    sample_rate: f32,
    config: EngineConfig,
}

impl PlaybackController {
    pub fn new(sample_rate: f32, config: EngineConfig) -> Self {
        Self {
            voice: None,
            currently_playing: None,
            last_played: None,
            continuous: false,
            volume: config.default_volume,
            pan: 0.0,
            last_custom_pan: 0.0,
            auto_stop_at: None,
            current_sample: 0,
            sample_rate,
            config,
        }
    }

    /// Seconds elapsed on the playback clock.
    pub fn clock(&self) -> f64 {
        self.current_sample as f64 / self.sample_rate as f64
    }

    pub fn state(&self) -> PlayerState {
        PlayerState {
            currently_playing: self.currently_playing,
            last_played: self.last_played,
            volume: self.volume,
            pan: self.pan,
            continuous: self.continuous,
        }
    }

    pub fn apply_command(&mut self, cmd: Command) {
        match cmd {
            Command::Press(source) => self.press(source),
            Command::SetVolume(v) => self.set_volume(v),
            Command::SetPan(p) => self.set_pan(p),
            Command::SetContinuous(on) => self.set_continuous(on),
            Command::Stop => self.stop(),
        }
    }

    /// A press of `source`: stop it, switch to it, or start it.
    pub fn press(&mut self, source: Source) {
        let now = self.clock();

        // Press-again-to-stop, unique to continuous mode.
        if self.continuous && self.currently_playing == Some(source) {
            self.stop();
            return;
        }

        // The custom button restores the remembered pan before playing.
        if source == Source::Custom {
            self.pan = self.last_custom_pan;
        }
        let pan = source.pan(self.last_custom_pan);
        let frequency = self.config.frequency;

        match &mut self.voice {
            // Something is sounding: retarget it, no gap of silence. Gain is
            // deliberately untouched. This branch also absorbs a re-entrant
            // start, so a duplicate oscillator can never leak.
            Some(voice) => voice.retarget(frequency, pan, now),
            None => {
                self.voice = Some(ToneVoice::start(
                    frequency,
                    pan,
                    self.volume,
                    now,
                    self.sample_rate,
                    RampTimes::from(&self.config),
                ));
            }
        }
        self.currently_playing = Some(source);
        self.last_played = Some(source);

        // Single timer slot: cancel whatever was pending, then arm under
        // one-shot so the fade completes exactly at the one-shot mark.
        self.auto_stop_at = None;
        if !self.continuous {
            self.auto_stop_at = Some(now + self.config.one_shot_secs - self.config.fade_out_secs);
        }
    }

    /// Drag of the volume slider. Never changes play state; with no voice
    /// live there is simply no gain stage to ramp.
    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.volume = volume;
        let now = self.clock();
        if let Some(voice) = &mut self.voice {
            voice.set_volume(volume, now);
        }
    }

    /// Drag of the pan slider. The remembered custom pan tracks every drag,
    /// so the custom button later restores the last position used.
    pub fn set_pan(&mut self, pan: f32) {
        let pan = pan.clamp(-1.0, 1.0);
        self.pan = pan;
        self.last_custom_pan = pan;
        let now = self.clock();
        if let Some(voice) = &mut self.voice {
            voice.set_pan(pan, now);
        }
    }

    /// Toggle continuous mode. Turning it on cancels the pending auto-stop;
    /// turning it off while a tone is sounding arms a fresh full-length
    /// timer without interrupting the sound.
    pub fn set_continuous(&mut self, on: bool) {
        self.continuous = on;
        if on {
            self.auto_stop_at = None;
        } else if self.voice.as_ref().map_or(false, |v| !v.is_stopping()) {
            self.auto_stop_at = Some(self.clock() + self.config.one_shot_secs);
        }
    }

    /// Stop playback. With no live voice this still clears the playing
    /// identity and is otherwise a no-op; calling it repeatedly is harmless.
    pub fn stop(&mut self) {
        let now = self.clock();
        self.auto_stop_at = None;
        match &mut self.voice {
            // Identity clears when the voice is reaped after the fade.
            Some(voice) => voice.stop(now),
            None => self.currently_playing = None,
        }
    }

    /// Render one interleaved stereo block and advance the clock.
    ///
    /// The auto-stop fires here: ramps are time-stamped, so a stop issued at
    /// a mid-block instant fades with sample accuracy without splitting the
    /// block. The voice is released only once its fade has fully completed.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = 0.0;
        }
        let frames = (buffer.len() / 2) as u64;
        let start = self.clock();
        let end = start + frames as f64 / self.sample_rate as f64;

        if let Some(fire) = self.auto_stop_at {
            if fire < end {
                self.auto_stop_at = None;
                if let Some(voice) = &mut self.voice {
                    voice.stop(fire.max(start));
                }
            }
        }

        if let Some(voice) = &mut self.voice {
            voice.render(buffer, start);
            if voice.is_finished(end) {
                self.voice = None;
                self.currently_playing = None;
            }
        }

        self.current_sample += frames;
    }

    /// Unconditional teardown: no audio keeps sounding, no timer stays armed.
    pub fn shutdown(&mut self) {
        self.stop();
    }

    pub fn is_sounding(&self) -> bool {
        self.voice.is_some()
    }

    #[cfg(test)]
    pub(crate) fn voice(&self) -> Option<&ToneVoice> {
        self.voice.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn auto_stop_at(&self) -> Option<f64> {
        self.auto_stop_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 1000.0;
    const BLOCK: usize = 100; // frames; 0.1 s at SR

    fn controller() -> PlaybackController {
        PlaybackController::new(SR, EngineConfig::default())
    }

    fn run_blocks(ctl: &mut PlaybackController, n: usize) {
        let mut buffer = vec![0.0f32; BLOCK * 2];
        for _ in 0..n {
            ctl.process_block(&mut buffer);
        }
    }

    #[test]
    fn one_shot_timeline() {
        let mut ctl = controller();
        ctl.press(Source::Left);
        assert_eq!(ctl.state().currently_playing, Some(Source::Left));
        // Timer armed so the fade completes at the one-second mark.
        assert_eq!(ctl.auto_stop_at(), Some(0.95));
        // Gain ramps 0 -> 0.5 over 10 ms.
        let v = ctl.voice().unwrap();
        assert_eq!(v.gain_at(0.0), 0.0);
        assert!((v.gain_at(0.01) - 0.5).abs() < 1e-6);

        run_blocks(&mut ctl, 9); // t = 0.9, still sounding
        assert!(ctl.is_sounding());
        assert_eq!(ctl.state().currently_playing, Some(Source::Left));
        // Mid-fade after the 0.95 fire point.
        let mut buffer = vec![0.0f32; BLOCK * 2];
        ctl.process_block(&mut buffer); // covers [0.9, 1.0): fires and finishes
        assert!(!ctl.is_sounding());
        assert_eq!(ctl.state().currently_playing, None);
        assert_eq!(ctl.state().last_played, Some(Source::Left));
        assert_eq!(ctl.auto_stop_at(), None);
    }

    #[test]
    fn continuous_plays_until_repressed() {
        let mut ctl = controller();
        ctl.set_continuous(true);
        ctl.press(Source::Center);
        assert_eq!(ctl.auto_stop_at(), None);
        run_blocks(&mut ctl, 30); // 3 s, far past the one-shot window
        assert!(ctl.is_sounding());

        // Press-again-to-stop, with a fade.
        ctl.press(Source::Center);
        assert!(ctl.voice().unwrap().is_stopping());
        run_blocks(&mut ctl, 1);
        assert!(!ctl.is_sounding());
        assert_eq!(ctl.state().currently_playing, None);
        assert_eq!(ctl.state().last_played, Some(Source::Center));
    }

    #[test]
    fn switching_sources_retargets_without_gap() {
        let mut ctl = controller();
        ctl.press(Source::Left);
        run_blocks(&mut ctl, 2); // onset automation pruned by now
        let gain_events = ctl.voice().unwrap().gain_param().pending().len();

        ctl.press(Source::Right);
        // Same voice, new identity, timer re-armed from the new press.
        assert!(ctl.is_sounding());
        assert_eq!(ctl.state().currently_playing, Some(Source::Right));
        assert_eq!(ctl.auto_stop_at(), Some(0.2 + 0.95));
        let v = ctl.voice().unwrap();
        // Exactly one pin + ramp pair for pan, nothing new on gain.
        assert_eq!(v.pan_param().pending().len(), 2);
        assert_eq!(v.gain_param().pending().len(), gain_events);
        // No silent gap: gain stays at full volume across the switch.
        assert!((v.gain_at(0.2) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn one_shot_repress_rearms_instead_of_stopping() {
        let mut ctl = controller();
        ctl.press(Source::Left);
        run_blocks(&mut ctl, 5); // t = 0.5
        ctl.press(Source::Left);
        assert!(ctl.is_sounding());
        assert_eq!(ctl.auto_stop_at(), Some(0.5 + 0.95));
        run_blocks(&mut ctl, 9); // t = 1.4, inside the extended window
        assert!(ctl.is_sounding());
        run_blocks(&mut ctl, 1); // t = 1.5, past fade end at 1.5
        assert!(!ctl.is_sounding());
    }

    #[test]
    fn volume_drag_ramps_gain_only() {
        let mut ctl = controller();
        ctl.set_continuous(true);
        ctl.press(Source::Left);
        run_blocks(&mut ctl, 2);

        ctl.set_volume(0.8);
        let v = ctl.voice().unwrap();
        assert_eq!(v.gain_param().pending().len(), 2); // pin + ramp
        assert!(v.pan_param().pending().is_empty());
        assert_eq!(ctl.state().currently_playing, Some(Source::Left));
        assert!((ctl.voice().unwrap().gain_at(0.2 + 0.01) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn volume_drag_while_silent_only_stores() {
        let mut ctl = controller();
        ctl.set_volume(0.8);
        assert_eq!(ctl.state().volume, 0.8);
        assert!(!ctl.is_sounding());
        // The next start uses the stored value.
        ctl.press(Source::Center);
        assert!((ctl.voice().unwrap().gain_at(0.01) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn toggle_off_arms_full_second_timer() {
        let mut ctl = controller();
        ctl.set_continuous(true);
        ctl.press(Source::Right);
        run_blocks(&mut ctl, 3); // t = 0.3
        ctl.set_continuous(false);
        assert_eq!(ctl.auto_stop_at(), Some(0.3 + 1.0));
        assert!(ctl.is_sounding());

        // Toggling back on before it fires cancels it; tone keeps going.
        ctl.set_continuous(true);
        assert_eq!(ctl.auto_stop_at(), None);
        run_blocks(&mut ctl, 30);
        assert!(ctl.is_sounding());
    }

    #[test]
    fn toggle_off_while_silent_is_a_no_op() {
        let mut ctl = controller();
        ctl.set_continuous(true);
        ctl.set_continuous(false);
        assert_eq!(ctl.auto_stop_at(), None);
        assert!(!ctl.is_sounding());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut ctl = controller();
        ctl.stop();
        assert_eq!(ctl.state().currently_playing, None);

        ctl.press(Source::Left);
        ctl.stop();
        run_blocks(&mut ctl, 1);
        let before = ctl.state();
        ctl.stop();
        assert_eq!(ctl.state(), before);
        assert_eq!(ctl.state().last_played, Some(Source::Left));
    }

    #[test]
    fn custom_press_restores_remembered_pan() {
        let mut ctl = controller();
        ctl.set_pan(0.7);
        assert!(!ctl.is_sounding());
        ctl.press(Source::Custom);
        assert_eq!(ctl.state().pan, 0.7);
        let now = ctl.clock();
        assert!((ctl.voice().unwrap().pan_at(now) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn pan_drag_tracks_remembered_custom_pan() {
        let mut ctl = controller();
        ctl.set_continuous(true);
        ctl.press(Source::Custom);
        run_blocks(&mut ctl, 2);
        ctl.set_pan(-0.4);
        run_blocks(&mut ctl, 2);
        // Stop, then press custom again: the drag position comes back.
        ctl.press(Source::Custom);
        run_blocks(&mut ctl, 1);
        ctl.press(Source::Custom);
        assert_eq!(ctl.state().pan, -0.4);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let mut ctl = controller();
        ctl.set_volume(3.0);
        assert_eq!(ctl.state().volume, 1.0);
        ctl.set_pan(-9.0);
        assert_eq!(ctl.state().pan, -1.0);
    }

    #[test]
    fn silent_controller_renders_silence() {
        let mut ctl = controller();
        let mut buffer = vec![1.0f32; BLOCK * 2];
        ctl.process_block(&mut buffer);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn voice_resources_are_all_or_none() {
        // Sample state at arbitrary points through a full one-shot life and
        // a manual stop: whenever nothing is sounding, output is silent, and
        // whenever the identity is live past the fade, a voice backs it.
        let mut ctl = controller();
        ctl.press(Source::Left);
        let mut buffer = vec![0.0f32; BLOCK * 2];
        for _ in 0..15 {
            ctl.process_block(&mut buffer);
            let audible = buffer.iter().any(|s| s.abs() > 0.0);
            if audible {
                assert!(ctl.is_sounding());
            }
            if !ctl.is_sounding() {
                assert_eq!(ctl.state().currently_playing, None);
            }
        }
        assert!(!ctl.is_sounding());
    }

    #[test]
    fn shutdown_stops_and_disarms() {
        let mut ctl = controller();
        ctl.press(Source::Left);
        ctl.shutdown();
        assert_eq!(ctl.auto_stop_at(), None);
        run_blocks(&mut ctl, 1);
        assert!(!ctl.is_sounding());
    }
}
