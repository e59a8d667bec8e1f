// src/lib.rs
//
// Automation and patch-modulation core for a hardware synth.
//
// Per audio block the host:
// 1. advances automation (`ParamManager::process_current_pos`, `tick_samples`)
// 2. refreshes its source values
// 3. patches (`Patcher::patch_changed`), then reads final values

pub mod automation;
pub mod config;
pub mod error;
pub mod fixed;
pub mod logging;
pub mod params;
pub mod patch;

// Re-export key types for Rust consumers
pub use automation::{AutoParam, AutoParamState, AutomationDelta, AutomationNode, PlayHead, Snapshot};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use params::{
    ExpressionParamSet, Globality, MidiParamCollection, ParamBits, ParamCollection, ParamCollectionSummary,
    ParamId, ParamKind, ParamManager, ParamSet, ParamTable,
};
pub use patch::{
    CableId, CablePolicy, DestinationDescriptor, PatchCable, PatchCableSet, PatchSource, Patcher, Polarity,
    SourceMask, SourceValues,
};
