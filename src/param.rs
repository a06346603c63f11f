/// Scheduled automation for one scalar audio parameter.
///
/// Mirrors the contract of a sample-accurate audio parameter: values can be
/// pinned at a point in time or glided linearly toward a target, and pending
/// automation can be cancelled wholesale. A superseding ramp must always be
/// preceded by `cancel_scheduled` + `set_value_at(current, now)` so the
/// parameter never jumps audibly over an in-flight glide.
#[derive(Debug, Clone)]
pub struct Param {
    anchor_value: f32,
    anchor_time: f64,
    events: Vec<ParamEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    /// Pin the parameter to `value` at `time`.
    Set { value: f32, time: f64 },
    /// Glide linearly from the preceding event's value, finishing at `end`.
    Ramp { target: f32, end: f64 },
}

impl ParamEvent {
    fn time(&self) -> f64 {
        match *self {
            ParamEvent::Set { time, .. } => time,
            ParamEvent::Ramp { end, .. } => end,
        }
    }
}

impl Param {
    pub fn new(value: f32) -> Self {
        Self {
            anchor_value: value,
            anchor_time: 0.0,
            events: Vec::new(),
        }
    }

    /// Schedule a value pin. Events must be scheduled in nondecreasing time
    /// order; callers re-schedule only after `cancel_scheduled`.
    pub fn set_value_at(&mut self, value: f32, time: f64) {
        debug_assert!(
            self.events.last().map_or(true, |e| e.time() <= time),
            "automation scheduled out of order"
        );
        self.events.push(ParamEvent::Set { value, time });
    }

    /// Schedule a linear glide completing at `end`.
    pub fn ramp_to(&mut self, target: f32, end: f64) {
        debug_assert!(
            self.events.last().map_or(true, |e| e.time() <= end),
            "automation scheduled out of order"
        );
        self.events.push(ParamEvent::Ramp { target, end });
    }

    /// Drop every event scheduled at or after `time`. A ramp still in flight
    /// at `time` is removed entirely; the caller pins the current value next.
    pub fn cancel_scheduled(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Effective value at an arbitrary clock time. Inside a ramp this
    /// interpolates linearly; past the last event the final value holds.
    pub fn value_at(&self, time: f64) -> f32 {
        let mut value = self.anchor_value;
        let mut at = self.anchor_time;
        for ev in &self.events {
            match *ev {
                ParamEvent::Set { value: v, time: t } => {
                    if time < t {
                        return value;
                    }
                    value = v;
                    at = t;
                }
                ParamEvent::Ramp { target, end } => {
                    if time >= end {
                        value = target;
                        at = end;
                        continue;
                    }
                    let span = end - at;
                    if span <= 0.0 {
                        return target;
                    }
                    let frac = ((time - at) / span).clamp(0.0, 1.0) as f32;
                    return value + (target - value) * frac;
                }
            }
        }
        value
    }

    /// Fold events that completed at or before `now` into the anchor.
    /// Purely a cleanup; `value_at` is unchanged for any `time >= now`.
    pub fn prune(&mut self, now: f64) {
        while let Some(ev) = self.events.first() {
            if ev.time() > now {
                break;
            }
            match *ev {
                ParamEvent::Set { value, time } => {
                    self.anchor_value = value;
                    self.anchor_time = time;
                }
                ParamEvent::Ramp { target, end } => {
                    self.anchor_value = target;
                    self.anchor_time = end;
                }
            }
            self.events.remove(0);
        }
    }

    /// Automation not yet folded into the anchor.
    pub fn pending(&self) -> &[ParamEvent] {
        &self.events
    }
}
