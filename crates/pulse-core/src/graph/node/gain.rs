//! Gain node

use crate::graph::param::AudioParam;
use crate::types::StereoBuffer;

/// A gain stage with an automatable level
pub struct GainNode {
    pub gain: AudioParam,
}

impl GainNode {
    /// Create a gain node at the given level (1.0 = unity)
    pub fn new(name: &'static str, level: f32) -> Self {
        Self {
            gain: AudioParam::new(name, level, 0.0, 2.0),
        }
    }

    /// Process a buffer in place
    pub fn process(&mut self, buffer: &mut StereoBuffer, start_time: f64, frame_duration: f64) {
        let len = buffer.len();
        let end_time = start_time + len as f64 * frame_duration;

        if !self.gain.is_ramping(start_time) && !self.gain.is_ramping(end_time) {
            self.gain.advance_to(start_time);
            let g = self.gain.value();
            if g != 1.0 {
                buffer.scale(g);
            }
            return;
        }

        for (i, sample) in buffer.iter_mut().enumerate() {
            let t = start_time + i as f64 * frame_duration;
            *sample *= self.gain.value_at(t);
        }
        self.gain.advance_to(end_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::param::RampCurve;
    use crate::types::StereoSample;

    #[test]
    fn test_unity_gain_is_passthrough() {
        let mut node = GainNode::new("gain", 1.0);
        let mut buffer = StereoBuffer::silence(4);
        buffer[0] = StereoSample::new(1.0, -0.5);

        node.process(&mut buffer, 0.0, 1.0 / 48000.0);

        assert_eq!(buffer[0].left, 1.0);
        assert_eq!(buffer[0].right, -0.5);
    }

    #[test]
    fn test_half_gain() {
        let mut node = GainNode::new("gain", 0.5);
        let mut buffer = StereoBuffer::silence(2);
        buffer[0] = StereoSample::new(1.0, 1.0);

        node.process(&mut buffer, 0.0, 1.0 / 48000.0);

        assert!((buffer[0].left - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_ramped_gain_moves_over_buffer() {
        let mut node = GainNode::new("gain", 0.0);
        let dt = 1.0 / 48000.0;
        node.gain.ramp_to(0.0, 1.0, 48.0 * dt, RampCurve::Linear);

        let mut buffer = StereoBuffer::silence(48);
        for s in buffer.iter_mut() {
            *s = StereoSample::new(1.0, 1.0);
        }
        node.process(&mut buffer, 0.0, dt);

        assert!(buffer[0].left < 0.1);
        assert!(buffer[47].left > 0.9);
        // Ramp finished: value settled at target
        assert!((node.gain.value() - 1.0).abs() < 1e-6);
    }
}
