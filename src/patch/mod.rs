// src/patch/mod.rs
//
// The modulation matrix: sources, cables, and the patcher that reduces
// them to final param values each block.
//
// Key principles:
// - Cables live in one arena; Destinations are index ranges into it
// - Range adjustment is an index into the patcher's scratch array
// - Range destinations are combined before the params they adjust
// - Patching reads the ParamManager and writes only its own output

mod cable;
mod cable_set;
mod destination;
pub mod laws;
mod patcher;
mod source;

pub use cable::*;
pub use cable_set::*;
pub use destination::*;
pub use patcher::*;
pub use source::*;
