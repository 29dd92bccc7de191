//! Wave shaper node
//!
//! Applies a precomputed non-linear transfer curve, used for the lo-fi
//! bitcrush character. With no curve installed the node is an identity
//! path; the wet mix is automatable so the effect fades in and out
//! without clicks.

use crate::graph::param::AudioParam;
use crate::types::{Sample, StereoBuffer};

/// Build a bitcrush-style transfer curve
///
/// Quantizes the [-1, 1] input range into `steps` levels, approximating
/// bit-depth reduction. `resolution` is the curve table length.
pub fn bitcrush_curve(resolution: usize, steps: u32) -> Vec<Sample> {
    let resolution = resolution.max(2);
    let steps = steps.max(2) as f32;
    (0..resolution)
        .map(|i| {
            let x = i as f32 / (resolution - 1) as f32 * 2.0 - 1.0;
            (x * steps * 0.5).round() / (steps * 0.5)
        })
        .collect()
}

/// Wave shaper with an automatable dry/wet mix
pub struct WaveShaperNode {
    curve: Option<Vec<Sample>>,
    pub mix: AudioParam,
}

impl WaveShaperNode {
    /// Create a shaper with no curve (identity)
    pub fn new() -> Self {
        Self {
            curve: None,
            mix: AudioParam::new("shaper.mix", 0.0, 0.0, 1.0),
        }
    }

    /// Install a transfer curve
    pub fn set_curve(&mut self, curve: Vec<Sample>) {
        self.curve = if curve.len() >= 2 { Some(curve) } else { None };
    }

    /// Remove the curve, returning to an identity path
    pub fn clear_curve(&mut self) {
        self.curve = None;
    }

    pub fn has_curve(&self) -> bool {
        self.curve.is_some()
    }

    /// Look up the curve with linear interpolation
    #[inline]
    fn shape(curve: &[Sample], x: Sample) -> Sample {
        let x = x.clamp(-1.0, 1.0);
        let pos = (x + 1.0) * 0.5 * (curve.len() - 1) as f32;
        let idx = pos as usize;
        if idx + 1 >= curve.len() {
            return curve[curve.len() - 1];
        }
        let frac = pos - idx as f32;
        curve[idx] + (curve[idx + 1] - curve[idx]) * frac
    }

    /// Process a buffer in place
    pub fn process(&mut self, buffer: &mut StereoBuffer, start_time: f64, frame_duration: f64) {
        let len = buffer.len();
        let end_time = start_time + len as f64 * frame_duration;

        let curve = match &self.curve {
            Some(curve) => curve,
            None => {
                self.mix.advance_to(end_time);
                return;
            }
        };

        for (i, sample) in buffer.iter_mut().enumerate() {
            let t = start_time + i as f64 * frame_duration;
            let mix = self.mix.value_at(t);
            if mix <= 0.0 {
                continue;
            }
            let dry_l = sample.left;
            let dry_r = sample.right;
            sample.left = dry_l + (Self::shape(curve, dry_l) - dry_l) * mix;
            sample.right = dry_r + (Self::shape(curve, dry_r) - dry_r) * mix;
        }
        self.mix.advance_to(end_time);
    }
}

impl Default for WaveShaperNode {
    fn default() -> Self {
        Self::new()
    }
}
