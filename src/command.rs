use crate::controller::Source;

/// Control messages from the front end to the playback engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Press one of the source buttons.
    Press(Source),
    /// Drag of the volume slider, 0.0..=1.0.
    SetVolume(f32),
    /// Drag of the pan slider, -1.0..=1.0.
    SetPan(f32),
    /// Toggle of the continuous-play checkbox.
    SetContinuous(bool),
    /// Explicit stop regardless of mode.
    Stop,
}
