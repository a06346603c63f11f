pub const TWO_PI: f32 = 2.0 * std::f32::consts::PI;

/// Phase advance per sample for a sine at `freq` Hz.
#[inline]
pub fn phase_increment(freq: f32, sample_rate: f32) -> f32 {
    TWO_PI * freq / sample_rate
}

/// Equal-power stereo pan. `pan` of -1 is hard left, 0 center, 1 hard right.
pub fn pan2(signal: f32, pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    let angle = (pan + 1.0) * std::f32::consts::FRAC_PI_4;
    let left = angle.cos() * signal;
    let right = angle.sin() * signal;
    (left, right)
}
