// src/params/expression.rs
//
// Per-note expression params (pitch bend, timbre, pressure) plus the bend
// ranges that scale pitch bend.

use log::debug;

use crate::config::EngineConfig;
use crate::error::Result;

use super::kind::ParamKind;
use super::param_set::ParamSet;
use super::table::ParamTable;

pub const BEND_RANGE_MAIN: usize = 0;
pub const BEND_RANGE_FINGER_LEVEL: usize = 1;

/// Expression dimensions for one timeline entity. Never interpolates.
#[derive(Debug, PartialEq, Eq)]
pub struct ExpressionParamSet {
    set: ParamSet,
    /// Semitones for full-scale bend, `[main, finger-level]`.
    pub bend_ranges: [u8; 2],
}

impl ExpressionParamSet {
    /// Drums get a single bend range for both levels.
    pub fn new(config: &EngineConfig, for_drum: bool) -> Result<Self> {
        let main = config.default_bend_range_main;
        let finger = if for_drum { main } else { config.default_bend_range_finger };
        debug!("Creating expression params, bend ranges {}/{}", main, finger);
        Ok(Self {
            set: ParamSet::new(ParamKind::Expression)?,
            bend_ranges: [main, finger],
        })
    }

    pub fn try_clone_with(&self, copy_automation: bool, reverse_with_length: Option<u32>) -> Result<Self> {
        Ok(Self {
            set: self.set.try_clone_with(copy_automation, reverse_with_length)?,
            bend_ranges: self.bend_ranges,
        })
    }

    #[inline]
    pub fn params(&self) -> &ParamSet {
        &self.set
    }

    #[inline]
    pub fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.set
    }

    /// Zero every dimension, e.g. on note-off or when a clip stops.
    pub fn clear_values(&mut self) {
        self.set.clear_values();
    }

    /// Remove all automation and zero every dimension.
    pub fn delete_all_automation(&mut self) {
        self.set.delete_all_automation();
        self.set.clear_values();
    }

    pub fn contains_something(&self) -> bool {
        self.set.contains_something()
    }
}
