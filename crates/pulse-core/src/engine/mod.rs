//! Audio engine - graph ownership, effect toggles, media binding
//!
//! This module contains the engine side of the core:
//! - AudioEngine: owns the context, source binding, and effect chain
//! - MediaElement: the bound playback element's state
//! - EngineError: contained failure taxonomy

mod engine;
mod error;
mod media;

pub use engine::*;
pub use error::*;
pub use media::*;
