//! Biquad low-pass filter node
//!
//! Pre-filter stage of the chain, used for the retro/AM-radio tone. A
//! two-pole (12dB/octave) state-variable filter with automatable cutoff
//! and Q.

use crate::graph::param::{AudioParam, RampCurve};
use crate::types::StereoBuffer;

/// State-variable low-pass filter with automatable frequency and Q
pub struct BiquadFilterNode {
    /// Cutoff frequency in Hz
    pub frequency: AudioParam,
    /// Resonance
    pub q: AudioParam,
    sample_rate: u32,
    // State per channel
    ic1eq_l: f32,
    ic2eq_l: f32,
    ic1eq_r: f32,
    ic2eq_r: f32,
    // Coefficients
    g: f32,
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,
    // Cutoff/Q the coefficients were last computed for
    coeff_frequency: f32,
    coeff_q: f32,
}

impl BiquadFilterNode {
    /// Create a filter at the given tuning
    pub fn new(sample_rate: u32, frequency: f32, q: f32) -> Self {
        let mut node = Self {
            frequency: AudioParam::new("filter.frequency", frequency, 20.0, 20000.0),
            q: AudioParam::new("filter.q", q, 0.1, 20.0),
            sample_rate: sample_rate.max(1),
            ic1eq_l: 0.0,
            ic2eq_l: 0.0,
            ic1eq_r: 0.0,
            ic2eq_r: 0.0,
            g: 0.0,
            k: 0.0,
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
            coeff_frequency: 0.0,
            coeff_q: 0.0,
        };
        node.update_coefficients(frequency, q);
        node
    }

    fn update_coefficients(&mut self, cutoff: f32, q: f32) {
        // The cutoff must stay below Nyquist: past it the tan() prewarp
        // flips sign and the filter diverges.
        let max_cutoff = (self.sample_rate as f32 * 0.45).min(20000.0);
        let cutoff = cutoff.clamp(20.0, max_cutoff);
        let q = q.clamp(0.1, 20.0);

        self.g = (std::f32::consts::PI * cutoff / self.sample_rate as f32).tan();
        self.k = 1.0 / q;
        self.a1 = 1.0 / (1.0 + self.g * (self.g + self.k));
        self.a2 = self.g * self.a1;
        self.a3 = self.g * self.a2;
        self.coeff_frequency = cutoff;
        self.coeff_q = q;
    }

    #[inline]
    fn tick(&mut self, left: f32, right: f32) -> (f32, f32) {
        let v3_l = left - self.ic2eq_l;
        let v1_l = self.a1 * self.ic1eq_l + self.a2 * v3_l;
        let v2_l = self.ic2eq_l + self.a2 * self.ic1eq_l + self.a3 * v3_l;
        self.ic1eq_l = 2.0 * v1_l - self.ic1eq_l;
        self.ic2eq_l = 2.0 * v2_l - self.ic2eq_l;

        let v3_r = right - self.ic2eq_r;
        let v1_r = self.a1 * self.ic1eq_r + self.a2 * v3_r;
        let v2_r = self.ic2eq_r + self.a2 * self.ic1eq_r + self.a3 * v3_r;
        self.ic1eq_r = 2.0 * v1_r - self.ic1eq_r;
        self.ic2eq_r = 2.0 * v2_r - self.ic2eq_r;

        (v2_l, v2_r)
    }

    /// Process a buffer in place, evaluating parameter ramps against the
    /// context clock starting at `start_time`
    pub fn process(&mut self, buffer: &mut StereoBuffer, start_time: f64, frame_duration: f64) {
        let len = buffer.len();
        let end_time = start_time + len as f64 * frame_duration;
        let ramping =
            self.frequency.is_ramping(end_time) || self.q.is_ramping(end_time)
            || self.frequency.is_ramping(start_time) || self.q.is_ramping(start_time);

        if !ramping {
            self.frequency.advance_to(start_time);
            self.q.advance_to(start_time);
            let (f, q) = (self.frequency.value(), self.q.value());
            if f != self.coeff_frequency || q != self.coeff_q {
                self.update_coefficients(f, q);
            }
            for sample in buffer.iter_mut() {
                let (l, r) = self.tick(sample.left, sample.right);
                sample.left = l;
                sample.right = r;
            }
            return;
        }

        // Ramp in flight: recompute coefficients as the params move
        for (i, sample) in buffer.iter_mut().enumerate() {
            let t = start_time + i as f64 * frame_duration;
            let f = self.frequency.value_at(t);
            let q = self.q.value_at(t);
            if f != self.coeff_frequency || q != self.coeff_q {
                self.update_coefficients(f, q);
            }
            let (l, r) = self.tick(sample.left, sample.right);
            sample.left = l;
            sample.right = r;
        }
        self.frequency.advance_to(end_time);
        self.q.advance_to(end_time);
    }

    /// Clear filter state (track load, rebind)
    pub fn reset(&mut self) {
        self.ic1eq_l = 0.0;
        self.ic2eq_l = 0.0;
        self.ic1eq_r = 0.0;
        self.ic2eq_r = 0.0;
    }

    /// Engage or release the retro tuning with exponential ramps
    ///
    /// Exponential because filter frequency perception is logarithmic;
    /// a linear sweep would seem to change mostly at the end.
    pub fn ramp_tuning(&mut self, now: f64, frequency: f32, q: f32, duration: f64) {
        self.frequency
            .ramp_to(now, frequency, duration, RampCurve::Exponential);
        self.q.ramp_to(now, q, duration, RampCurve::Exponential);
    }
}
