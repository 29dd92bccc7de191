//! Impulse response synthesis for the convolution reverb
//!
//! The reverb does not ship a recorded impulse; it convolves against a
//! decaying burst of white noise generated fresh each session. Reverb
//! character does not need to be bit-exact across runs.

use rand::Rng;

use crate::types::Sample;

/// A synthesized stereo impulse response
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    pub left: Vec<Sample>,
    pub right: Vec<Sample>,
}

impl ImpulseResponse {
    /// Length in frames
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Generate a decaying-noise impulse response
///
/// Each sample is `rand(-1, 1) * (1 - t/duration)^decay`, independently per
/// channel so the tail is decorrelated left/right. A non-positive duration
/// yields a minimal one-sample impulse rather than failing.
pub fn generate(sample_rate: u32, duration_seconds: f64, decay: f64) -> ImpulseResponse {
    if duration_seconds <= 0.0 {
        return ImpulseResponse {
            left: vec![1.0],
            right: vec![1.0],
        };
    }

    let frames = ((sample_rate as f64 * duration_seconds).round() as usize).max(1);
    let decay = decay.max(0.0);
    let mut rng = rand::thread_rng();

    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for i in 0..frames {
        let envelope = (1.0 - i as f64 / frames as f64).powf(decay) as Sample;
        left.push(rng.gen_range(-1.0..=1.0) * envelope);
        right.push(rng.gen_range(-1.0..=1.0) * envelope);
    }

    ImpulseResponse { left, right }
}
