//! Automatable parameter — a value scheduled against the context clock.
//!
//! Events are kept sorted by time. A ramp event interpolates from the previous
//! event's value and time up to its own; a set event jumps.

#[derive(Debug, Clone, Copy, PartialEq)]
enum Automation {
    Set { time: f64, value: f64 },
    Linear { time: f64, value: f64 },
    Exponential { time: f64, value: f64 },
}

impl Automation {
    fn time(&self) -> f64 {
        match *self {
            Automation::Set { time, .. }
            | Automation::Linear { time, .. }
            | Automation::Exponential { time, .. } => time,
        }
    }

    fn value(&self) -> f64 {
        match *self {
            Automation::Set { value, .. }
            | Automation::Linear { value, .. }
            | Automation::Exponential { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioParam {
    default_value: f64,
    events: Vec<Automation>,
}

impl AudioParam {
    pub fn new(default_value: f64) -> Self {
        AudioParam {
            default_value,
            events: Vec::new(),
        }
    }

    fn insert(&mut self, event: Automation) {
        // Equal times keep insertion order.
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }

    /// Jump to `value` at `time`.
    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(Automation::Set { time, value });
    }

    /// Ramp linearly from the previous event to `value`, arriving at `time`.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(Automation::Linear { time, value });
    }

    /// Ramp exponentially from the previous event to `value`, arriving at `time`.
    /// Both endpoints must be positive, otherwise the previous value is held.
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(Automation::Exponential { time, value });
    }

    /// Drop every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Freeze the parameter at its current value from `time` on.
    pub fn hold_at(&mut self, time: f64) {
        let current = self.value_at(time);
        self.cancel_scheduled_values(time);
        self.set_value_at_time(current, time);
    }

    /// Parameter value at `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        let mut prev_time = 0.0;
        let mut prev_value = self.default_value;

        for event in &self.events {
            let t = event.time();
            if t <= time {
                prev_time = t;
                prev_value = event.value();
                continue;
            }

            return match *event {
                Automation::Set { .. } => prev_value,
                Automation::Linear { value, .. } => {
                    let span = t - prev_time;
                    if span <= 0.0 {
                        value
                    } else {
                        let k = ((time - prev_time) / span).clamp(0.0, 1.0);
                        prev_value + (value - prev_value) * k
                    }
                }
                Automation::Exponential { value, .. } => {
                    let span = t - prev_time;
                    if prev_value <= 0.0 || value <= 0.0 {
                        prev_value
                    } else if span <= 0.0 {
                        value
                    } else {
                        let k = ((time - prev_time) / span).clamp(0.0, 1.0);
                        prev_value * (value / prev_value).powf(k)
                    }
                }
            };
        }

        prev_value
    }

    /// Time of the last scheduled event, if any.
    pub fn last_event_time(&self) -> Option<f64> {
        self.events.last().map(|e| e.time())
    }
}
