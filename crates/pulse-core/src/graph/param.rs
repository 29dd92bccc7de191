//! Automatable node parameters
//!
//! Every animatable value in the graph (filter cutoff, pan, gains) is an
//! [`AudioParam`]. Effects engage and disengage exclusively by ramping
//! these params; connections are never re-routed, so toggles can't click.
//!
//! The one rule that keeps rapid double-toggles artifact-free lives here:
//! [`AudioParam::ramp_to`] always cancels any pending ramp first and starts
//! the new ramp from the current (possibly mid-transition) value.

/// Ramp interpolation curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampCurve {
    Linear,
    /// Exponential ramps are used where perception is logarithmic (filter
    /// frequency, gain). Endpoints are pinned away from zero.
    Exponential,
}

/// Exponential ramps are undefined at zero; endpoints are pinned to this
/// floor instead (inaudible for gain, sub-bass for frequency).
const EXP_RAMP_FLOOR: f32 = 1.0e-4;

#[derive(Debug, Clone, Copy)]
struct RampSegment {
    start_time: f64,
    end_time: f64,
    start_value: f32,
    target: f32,
    curve: RampCurve,
}

impl RampSegment {
    fn value_at(&self, time: f64) -> f32 {
        if time <= self.start_time {
            return self.start_value;
        }
        if time >= self.end_time {
            return self.target;
        }
        let frac = ((time - self.start_time) / (self.end_time - self.start_time)) as f32;
        match self.curve {
            RampCurve::Linear => self.start_value + (self.target - self.start_value) * frac,
            RampCurve::Exponential => {
                self.start_value * (self.target / self.start_value).powf(frac)
            }
        }
    }
}

/// A single automatable parameter with scheduled-ramp semantics
#[derive(Debug)]
pub struct AudioParam {
    name: &'static str,
    value: f32,
    min: f32,
    max: f32,
    segment: Option<RampSegment>,
    linear_ramps: u32,
    exponential_ramps: u32,
    cancels: u32,
}

impl AudioParam {
    /// Create a parameter with an initial value and allowed range
    pub fn new(name: &'static str, initial: f32, min: f32, max: f32) -> Self {
        Self {
            name,
            value: initial.clamp(min, max),
            min,
            max,
            segment: None,
            linear_ramps: 0,
            exponential_ramps: 0,
            cancels: 0,
        }
    }

    /// Parameter name for logging
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The settled value (ignores any in-flight ramp)
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Set the value immediately, dropping any scheduled ramp
    pub fn set_value(&mut self, value: f32) {
        self.segment = None;
        self.value = value.clamp(self.min, self.max);
    }

    /// Cancel any scheduled ramp, freezing the param at its value at `now`
    ///
    /// This is the discontinuity-avoidance primitive: the frozen value is
    /// the mid-transition value, not the cancelled ramp's target.
    pub fn cancel_scheduled_values(&mut self, now: f64) {
        if let Some(segment) = self.segment.take() {
            self.value = segment.value_at(now).clamp(self.min, self.max);
            self.cancels += 1;
        }
    }

    /// Cancel pending ramps and schedule a new one from the current value
    ///
    /// `now` is context time in seconds. A non-positive duration applies the
    /// target immediately.
    pub fn ramp_to(&mut self, now: f64, target: f32, duration: f64, curve: RampCurve) {
        self.cancel_scheduled_values(now);

        let target = target.clamp(self.min, self.max);
        if duration <= 0.0 {
            self.value = target;
            return;
        }

        let (start_value, target) = match curve {
            RampCurve::Linear => (self.value, target),
            // Pin both endpoints away from zero so the geometric
            // interpolation is defined.
            RampCurve::Exponential => (self.value.max(EXP_RAMP_FLOOR), target.max(EXP_RAMP_FLOOR)),
        };

        self.segment = Some(RampSegment {
            start_time: now,
            end_time: now + duration,
            start_value,
            target,
            curve,
        });
        match curve {
            RampCurve::Linear => self.linear_ramps += 1,
            RampCurve::Exponential => self.exponential_ramps += 1,
        }
    }

    /// Evaluate the parameter at the given context time
    #[inline]
    pub fn value_at(&self, time: f64) -> f32 {
        match &self.segment {
            Some(segment) => segment.value_at(time).clamp(self.min, self.max),
            None => self.value,
        }
    }

    /// Whether a ramp is still in flight at `time`
    #[inline]
    pub fn is_ramping(&self, time: f64) -> bool {
        matches!(&self.segment, Some(s) if time < s.end_time)
    }

    /// Settle the parameter at `time`, dropping a finished ramp
    pub fn advance_to(&mut self, time: f64) {
        if let Some(segment) = &self.segment {
            if time >= segment.end_time {
                self.value = segment.target.clamp(self.min, self.max);
                self.segment = None;
            }
        }
    }

    /// Number of linear ramps scheduled over this param's lifetime
    pub fn linear_ramp_count(&self) -> u32 {
        self.linear_ramps
    }

    /// Number of exponential ramps scheduled over this param's lifetime
    pub fn exponential_ramp_count(&self) -> u32 {
        self.exponential_ramps
    }

    /// Total ramps scheduled
    pub fn scheduled_ramp_count(&self) -> u32 {
        self.linear_ramps + self.exponential_ramps
    }

    /// Number of in-flight ramps that were cancelled before completing
    pub fn cancel_count(&self) -> u32 {
        self.cancels
    }
}
