// src/params/mod.rs
//
// Param collections and their owner.
//
// Key principles:
// - A collection is one owned value; the manager holds at most one per kind
// - Summary bits change in the same call as the automation they describe
// - Per-block paths never allocate and never fail
// - Ids are scoped by ParamKind and checked at the edit boundary

pub mod ids;

mod collection;
mod expression;
mod kind;
mod manager;
mod midi;
mod param_set;
mod summary;
mod table;

pub use collection::*;
pub use expression::*;
pub use ids::ParamId;
pub use kind::*;
pub use manager::*;
pub use midi::*;
pub use param_set::*;
pub use summary::*;
pub use table::*;
