//! The processing graph: context clock, automatable parameters, and nodes

mod context;
pub mod impulse;
pub mod node;
mod param;

pub use context::{ContextState, GraphContext};
pub use impulse::ImpulseResponse;
pub use param::{AudioParam, RampCurve};
