use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Playback timing and tone defaults, loaded from `config.toml` when present.
///
/// The ramp durations are short on purpose: they exist to suppress clicks on
/// parameter jumps, not to be heard as envelopes.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EngineConfig {
    /// Oscillator frequency in Hz, shared by every source (middle C).
    #[serde(default = "default_frequency")]
    pub frequency: f32,
    /// Initial loudness before the user touches the volume control.
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    /// How long a one-shot press sounds, fade-out included.
    #[serde(default = "default_one_shot")]
    pub one_shot_secs: f64,
    /// Glide time for loudness changes.
    #[serde(default = "default_volume_ramp")]
    pub volume_ramp_secs: f64,
    /// Glide time for stereo position changes.
    #[serde(default = "default_pan_ramp")]
    pub pan_ramp_secs: f64,
    /// Gain ramp-down time when a voice stops.
    #[serde(default = "default_fade_out")]
    pub fade_out_secs: f64,
}

fn default_frequency() -> f32 {
    261.63
}

fn default_volume() -> f32 {
    0.5
}

fn default_one_shot() -> f64 {
    1.0
}

fn default_volume_ramp() -> f64 {
    0.01
}

fn default_pan_ramp() -> f64 {
    0.05
}

fn default_fade_out() -> f64 {
    0.05
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            default_volume: default_volume(),
            one_shot_secs: default_one_shot(),
            volume_ramp_secs: default_volume_ramp(),
            pan_ramp_secs: default_pan_ramp(),
            fade_out_secs: default_fade_out(),
        }
    }
}

impl EngineConfig {
    /// Write a default configuration file for users to edit.
    pub fn generate_default(path: impl AsRef<Path>) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, text)
    }
}

pub static CONFIG: Lazy<EngineConfig> = Lazy::new(|| {
    let path = PathBuf::from("config.toml");
    if let Ok(txt) = std::fs::read_to_string(&path) {
        toml::from_str(&txt).unwrap_or_default()
    } else {
        EngineConfig::default()
    }
});
