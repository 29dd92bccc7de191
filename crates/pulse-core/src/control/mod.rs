//! Effect control and playback coordination
//!
//! The layer between UI state and the engine: effect-toggle snapshots,
//! the hooks that apply them across play and track-change events, and the
//! registry that keeps the two player surfaces from sounding at once.

mod controller;
mod registry;
mod settings;

pub use controller::*;
pub use registry::*;
pub use settings::*;
