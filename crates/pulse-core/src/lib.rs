//! Pulse Core - Audio effect engine for the Pulse music player

pub mod config;
pub mod control;
pub mod engine;
pub mod graph;
pub mod types;

pub use types::*;
