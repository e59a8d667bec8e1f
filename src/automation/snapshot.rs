// src/automation/snapshot.rs
//
// Swappable AutoParam state for undo/redo and persistence.

use serde::{Deserialize, Serialize};

use super::node::AutomationNode;

/// The complete observable state of one AutoParam: its node list plus the
/// current (or static) value.
///
/// This is also the record the persistence layer reads and writes; it
/// carries nothing that depends on combination laws.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoParamState {
    pub nodes: Vec<AutomationNode>,
    pub value: i32,
}

impl AutoParamState {
    pub fn new(nodes: Vec<AutomationNode>, value: i32) -> Self {
        Self { nodes, value }
    }

    pub fn is_automated(&self) -> bool {
        !self.nodes.is_empty()
    }
}

/// An opaque stored copy of one AutoParam.
///
/// Swapping it into the live param and swapping again is an involution, so
/// the same Snapshot serves both the undo and the redo direction. The swap
/// exchanges container handles and never copies node data.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub(crate) state: AutoParamState,
}

impl Snapshot {
    pub(crate) fn from_state(state: AutoParamState) -> Self {
        Self { state }
    }

    /// Read-only view of what the snapshot currently holds.
    pub fn state(&self) -> &AutoParamState {
        &self.state
    }

    pub fn into_state(self) -> AutoParamState {
        self.state
    }
}
