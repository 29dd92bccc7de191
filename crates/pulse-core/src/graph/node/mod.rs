//! Processing nodes for the effect chain
//!
//! Thin, stateful node types with automatable [`AudioParam`]s. The engine
//! wires these into a fixed chain at initialization time and animates their
//! parameters; nodes are never re-routed while audio is running.
//!
//! [`AudioParam`]: crate::graph::AudioParam

mod convolver;
mod filter;
mod gain;
mod oscillator;
mod panner;
mod shaper;

pub use convolver::ConvolverNode;
pub use filter::BiquadFilterNode;
pub use gain::GainNode;
pub use oscillator::OscillatorNode;
pub use panner::StereoPannerNode;
pub use shaper::{bitcrush_curve, WaveShaperNode};
