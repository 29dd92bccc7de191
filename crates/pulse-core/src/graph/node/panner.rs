//! Stereo panner node
//!
//! Equal-power panning with an automatable pan value in [-1, 1]. The 8D
//! effect drives this node through an external modulation source (the LFO
//! scaled by a depth param) which is added on top of the scheduled pan
//! value, so disabling can ramp the depth to zero while the base pan stays
//! untouched.

use std::f32::consts::FRAC_PI_4;

use crate::graph::param::AudioParam;
use crate::types::StereoBuffer;

/// Equal-power channel gains for a pan position in [-1, 1]
#[inline]
pub(crate) fn pan_gains(pan: f32) -> (f32, f32) {
    let x = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (x.cos(), x.sin())
}

/// Stereo panner with automatable pan
pub struct StereoPannerNode {
    pub pan: AudioParam,
}

impl StereoPannerNode {
    /// Create a centered panner
    pub fn new() -> Self {
        Self {
            pan: AudioParam::new("panner.pan", 0.0, -1.0, 1.0),
        }
    }

    /// Process a buffer in place
    pub fn process(&mut self, buffer: &mut StereoBuffer, start_time: f64, frame_duration: f64) {
        self.process_modulated(buffer, start_time, frame_duration, |_| 0.0);
    }

    /// Process with an additive pan modulation source
    ///
    /// `modulation` is sampled per frame at context time and added to the
    /// scheduled pan value; the sum is clamped to [-1, 1].
    pub fn process_modulated<F>(
        &mut self,
        buffer: &mut StereoBuffer,
        start_time: f64,
        frame_duration: f64,
        mut modulation: F,
    ) where
        F: FnMut(f64) -> f32,
    {
        let len = buffer.len();
        let end_time = start_time + len as f64 * frame_duration;

        for (i, sample) in buffer.iter_mut().enumerate() {
            let t = start_time + i as f64 * frame_duration;
            let pan = self.pan.value_at(t) + modulation(t);
            let (gain_l, gain_r) = pan_gains(pan);

            // Equal-power law keeps perceived loudness constant through a
            // full sweep; sqrt(2) normalizes center to unity.
            sample.left *= gain_l * std::f32::consts::SQRT_2;
            sample.right *= gain_r * std::f32::consts::SQRT_2;
        }
        self.pan.advance_to(end_time);
    }
}

impl Default for StereoPannerNode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StereoSample;

    const DT: f64 = 1.0 / 48000.0;

    #[test]
    fn test_center_is_near_passthrough() {
        let mut panner = StereoPannerNode::new();
        let mut buffer = StereoBuffer::silence(4);
        buffer[0] = StereoSample::new(0.8, 0.8);

        panner.process(&mut buffer, 0.0, DT);

        // cos(pi/4) * sqrt(2) = 1
        assert!((buffer[0].left - 0.8).abs() < 1e-5);
        assert!((buffer[0].right - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_full_left_kills_right_channel() {
        let mut panner = StereoPannerNode::new();
        panner.pan.set_value(-1.0);

        let mut buffer = StereoBuffer::silence(2);
        buffer[0] = StereoSample::new(1.0, 1.0);

        panner.process(&mut buffer, 0.0, DT);

        assert!(buffer[0].left > 1.0);
        assert!(buffer[0].right.abs() < 1e-6);
    }

    #[test]
    fn test_modulation_is_additive_and_clamped() {
        let mut panner = StereoPannerNode::new();
        let mut buffer = StereoBuffer::silence(2);
        buffer[0] = StereoSample::new(1.0, 1.0);
        buffer[1] = StereoSample::new(1.0, 1.0);

        // Modulation far beyond the legal range must clamp, not blow up
        panner.process_modulated(&mut buffer, 0.0, DT, |_| 5.0);

        assert!(buffer[0].left.abs() < 1e-6); // hard right
        assert!(buffer[0].right > 1.0);
    }
}
