//! Low-frequency oscillator node
//!
//! Drives the 8D rotation: a sine LFO whose output modulates the panner's
//! pan value. Sampling is analytic (phase derived from context time), so
//! frequency changes are made phase-continuous by rebasing the epoch.

use std::f64::consts::TAU;

/// Sine LFO sampled against context time
#[derive(Debug)]
pub struct OscillatorNode {
    frequency_hz: f64,
    /// Context time at which phase is zero
    phase_epoch: f64,
}

impl OscillatorNode {
    /// Create an oscillator at the given frequency, phase zero at time zero
    pub fn new(frequency_hz: f64) -> Self {
        Self {
            frequency_hz: frequency_hz.max(0.0),
            phase_epoch: 0.0,
        }
    }

    /// Current frequency in Hz
    pub fn frequency(&self) -> f64 {
        self.frequency_hz
    }

    /// Change frequency without a phase jump
    ///
    /// The epoch is rebased so the instantaneous phase at `now` is
    /// unchanged; an in-flight rotation continues smoothly at the new rate.
    pub fn set_frequency(&mut self, now: f64, frequency_hz: f64) {
        let frequency_hz = frequency_hz.max(0.0);
        if frequency_hz > 0.0 {
            let phase = self.phase_at(now);
            self.phase_epoch = now - phase / (TAU * frequency_hz);
        }
        self.frequency_hz = frequency_hz;
    }

    /// Reset phase to zero at `now`
    pub fn reset_phase(&mut self, now: f64) {
        self.phase_epoch = now;
    }

    fn phase_at(&self, time: f64) -> f64 {
        (TAU * self.frequency_hz * (time - self.phase_epoch)).rem_euclid(TAU)
    }

    /// Sample the sine output at the given context time
    #[inline]
    pub fn sample_at(&self, time: f64) -> f32 {
        if self.frequency_hz <= 0.0 {
            return 0.0;
        }
        self.phase_at(time).sin() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_and_centering() {
        // 4-second rotation period -> 0.25 Hz
        let lfo = OscillatorNode::new(0.25);

        assert!(lfo.sample_at(0.0).abs() < 1e-6);
        assert!((lfo.sample_at(1.0) - 1.0).abs() < 1e-6); // quarter period: full right
        assert!(lfo.sample_at(2.0).abs() < 1e-6); // half period: center
        assert!((lfo.sample_at(3.0) + 1.0).abs() < 1e-6); // full left
        assert!(lfo.sample_at(4.0).abs() < 1e-5); // back to center
    }

    #[test]
    fn test_frequency_change_is_phase_continuous() {
        let mut lfo = OscillatorNode::new(0.25);
        let before = lfo.sample_at(1.3);
        lfo.set_frequency(1.3, 0.5);
        let after = lfo.sample_at(1.3);
        assert!((before - after).abs() < 1e-6);
    }

    #[test]
    fn test_zero_frequency_is_silent() {
        let lfo = OscillatorNode::new(0.0);
        assert_eq!(lfo.sample_at(10.0), 0.0);
    }

    #[test]
    fn test_reset_phase() {
        let mut lfo = OscillatorNode::new(1.0);
        lfo.reset_phase(5.25);
        assert!(lfo.sample_at(5.25).abs() < 1e-6);
    }
}
