use crate::config::EngineConfig;
use crate::dsp::{pan2, phase_increment, TWO_PI};
use crate::param::Param;

/// Glide durations a voice schedules its automation with.
#[derive(Debug, Clone, Copy)]
pub struct RampTimes {
    pub volume: f64,
    pub pan: f64,
    pub fade: f64,
}

impl From<&EngineConfig> for RampTimes {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            volume: cfg.volume_ramp_secs,
            pan: cfg.pan_ramp_secs,
            fade: cfg.fade_out_secs,
        }
    }
}

/// One sounding tone: a sine oscillator and its gain and pan stages.
///
/// The three stages live inside one struct so they exist together or not at
/// all; a partially torn-down voice is unrepresentable. Successive presses
/// retarget this voice instead of replacing it, which makes frequency and pan
/// changes feel like live manipulation of a continuous tone.
pub struct ToneVoice {
    phase: f32,
    frequency: f32,
    gain: Param,
    pan: Param,
    /// Time production ceases; set once by `stop` and never moved earlier.
    stop_at: Option<f64>,
    sample_rate: f32,
    ramps: RampTimes,
}

impl ToneVoice {
    /// Begin sounding at `now` with a click-free gain ramp from silence.
    /// Pan and frequency are set directly; nothing was audible before, so
    /// there is no discontinuity to smooth.
    pub fn start(frequency: f32, pan: f32, volume: f32, now: f64, sample_rate: f32, ramps: RampTimes) -> Self {
        let mut gain = Param::new(0.0);
        gain.set_value_at(0.0, now);
        gain.ramp_to(volume, now + ramps.volume);
        Self {
            phase: 0.0,
            frequency,
            gain,
            pan: Param::new(pan),
            stop_at: None,
            sample_rate,
            ramps,
        }
    }

    /// Redirect the voice to a new source without restarting it.
    ///
    /// Frequency changes are heard as a feature, not a glitch, so they apply
    /// immediately. Pan glides, and only when the target actually differs;
    /// an unchanged pan schedules no automation at all. Gain is untouched.
    pub fn retarget(&mut self, frequency: f32, pan: f32, now: f64) {
        self.frequency = frequency;
        let current = self.pan.value_at(now);
        if current != pan {
            self.pan.cancel_scheduled(now);
            self.pan.set_value_at(current, now);
            self.pan.ramp_to(pan, now + self.ramps.pan);
        }
    }

    /// Glide loudness to a new target, superseding any ramp in flight.
    pub fn set_volume(&mut self, volume: f32, now: f64) {
        let current = self.gain.value_at(now);
        self.gain.cancel_scheduled(now);
        self.gain.set_value_at(current, now);
        self.gain.ramp_to(volume, now + self.ramps.volume);
    }

    /// Glide stereo position to a new target, superseding any ramp in flight.
    pub fn set_pan(&mut self, pan: f32, now: f64) {
        let current = self.pan.value_at(now);
        self.pan.cancel_scheduled(now);
        self.pan.set_value_at(current, now);
        self.pan.ramp_to(pan, now + self.ramps.pan);
    }

    /// Fade to silence and mark when production ceases. Idempotent: a voice
    /// already stopping keeps its original fade.
    pub fn stop(&mut self, now: f64) {
        if self.stop_at.is_some() {
            return;
        }
        let current = self.gain.value_at(now);
        self.gain.cancel_scheduled(now);
        self.gain.set_value_at(current, now);
        self.gain.ramp_to(0.0, now + self.ramps.fade);
        self.stop_at = Some(now + self.ramps.fade);
    }

    pub fn is_stopping(&self) -> bool {
        self.stop_at.is_some()
    }

    /// True once the fade has fully completed; only then may the voice be
    /// released, so teardown never cuts the fade audibly short.
    pub fn is_finished(&self, now: f64) -> bool {
        self.stop_at.map_or(false, |t| now >= t)
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn gain_at(&self, time: f64) -> f32 {
        self.gain.value_at(time)
    }

    pub fn pan_at(&self, time: f64) -> f32 {
        self.pan.value_at(time)
    }

    /// Add this voice into an interleaved stereo block starting at
    /// `block_start` seconds on the shared clock.
    pub fn render(&mut self, buffer: &mut [f32], block_start: f64) {
        let frames = buffer.len() / 2;
        let dt = 1.0 / self.sample_rate as f64;
        let inc = phase_increment(self.frequency, self.sample_rate);
        for i in 0..frames {
            let t = block_start + i as f64 * dt;
            if let Some(stop) = self.stop_at {
                if t >= stop {
                    break;
                }
            }
            let sample = self.phase.sin() * self.gain.value_at(t);
            let (l, r) = pan2(sample, self.pan.value_at(t));
            buffer[2 * i] += l;
            buffer[2 * i + 1] += r;
            self.phase += inc;
            if self.phase >= TWO_PI {
                self.phase -= TWO_PI;
            }
        }
        self.gain.prune(block_start);
        self.pan.prune(block_start);
    }

    #[cfg(test)]
    pub(crate) fn gain_param(&self) -> &Param {
        &self.gain
    }

    #[cfg(test)]
    pub(crate) fn pan_param(&self) -> &Param {
        &self.pan
    }
}
