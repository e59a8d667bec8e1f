// src/automation/node.rs
//
// Automation keyframes and the playback cursor that walks over them.

use serde::{Deserialize, Serialize};

/// One automation keyframe.
///
/// `interpolated` governs the segment that starts at this node: when set,
/// the value ramps linearly to the next node; otherwise it holds as a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationNode {
    /// Tick position, relative to the start of the owning timeline.
    pub pos: u32,
    pub value: i32,
    pub interpolated: bool,
}

impl AutomationNode {
    pub const fn new(pos: u32, value: i32, interpolated: bool) -> Self {
        Self {
            pos,
            value,
            interpolated,
        }
    }

    /// A step node: holds its value until the next node.
    pub const fn step(pos: u32, value: i32) -> Self {
        Self::new(pos, value, false)
    }

    /// A ramp node: interpolates toward the next node.
    pub const fn ramp(pos: u32, value: i32) -> Self {
        Self::new(pos, value, true)
    }
}

/// Where playback is on a timeline.
///
/// Passed explicitly into every position-dependent call; the core holds no
/// global notion of "current song position".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayHead {
    /// Last processed tick position.
    pub pos: u32,
    /// Loop length of the timeline. Must be non-zero.
    pub length: u32,
    /// Playing backwards (reverse or the return leg of a pingpong).
    pub reversed: bool,
}

impl PlayHead {
    pub const fn forward(pos: u32, length: u32) -> Self {
        Self {
            pos,
            length,
            reversed: false,
        }
    }

    pub const fn reversed(pos: u32, length: u32) -> Self {
        Self {
            pos,
            length,
            reversed: true,
        }
    }
}

/// Whether `nodes` is strictly increasing by position.
pub fn is_strictly_increasing(nodes: &[AutomationNode]) -> bool {
    nodes.windows(2).all(|w| w[0].pos < w[1].pos)
}
