// src/automation/mod.rs
//
// Per-parameter automation timelines.
//
// Key principles:
// - Node lists are always strictly increasing by position
// - Playback position is passed in by the caller, never stored globally
// - Every mutation reports whether the param became automated or static
// - Only edit and setup paths allocate, and they do so fallibly

mod auto_param;
mod node;
mod snapshot;

pub use auto_param::*;
pub use node::*;
pub use snapshot::*;
