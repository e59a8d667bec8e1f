// src/params/midi.rs
//
// Sparse automation for MIDI CCs. Most clips touch only a handful of the
// 122 controllers, so params are created the first time a CC is written.

use log::debug;

use crate::automation::AutoParam;
use crate::error::{Error, Result};

use super::ids::{ParamId, midi};
use super::kind::ParamKind;
use super::table::{ParamTable, TableState};

#[derive(Debug, PartialEq, Eq)]
struct MidiParam {
    cc: ParamId,
    param: AutoParam,
}

/// CC automation, sorted by CC number. Summary indices are CC numbers.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MidiParamCollection {
    params: Vec<MidiParam>,
    state: TableState,
}

impl MidiParamCollection {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn search(&self, cc: ParamId) -> std::result::Result<usize, usize> {
        self.params.binary_search_by_key(&cc, |p| p.cc)
    }

    /// Make sure `cc` has a param, creating it static at 0 if needed.
    pub fn ensure_param(&mut self, cc: ParamId) -> Result<()> {
        if cc >= midi::NUM_CCS {
            return Err(Error::InvalidParamId { kind: ParamKind::Midi, id: cc });
        }
        if let Err(i) = self.search(cc) {
            self.params.try_reserve(1)?;
            self.params.insert(i, MidiParam { cc, param: AutoParam::new(0) });
            debug!("Created automation for CC {}", cc);
        }
        Ok(())
    }

    /// Number of CCs that have a param.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn ccs(&self) -> impl Iterator<Item = ParamId> + '_ {
        self.params.iter().map(|p| p.cc)
    }

    pub fn try_clone_with(&self, copy_automation: bool, reverse_with_length: Option<u32>) -> Result<Self> {
        let mut params = Vec::new();
        params.try_reserve_exact(self.params.len())?;
        for p in &self.params {
            params.push(MidiParam {
                cc: p.cc,
                param: p.param.try_clone_with(copy_automation, reverse_with_length)?,
            });
        }
        let mut collection = Self {
            params,
            state: TableState::default(),
        };
        collection.rebuild_summary();
        Ok(collection)
    }
}

impl ParamTable for MidiParamCollection {
    fn kind(&self) -> ParamKind {
        ParamKind::Midi
    }

    fn index_bound(&self) -> usize {
        midi::NUM_CCS as usize
    }

    fn index_of(&self, id: ParamId) -> Option<usize> {
        self.search(id).ok().map(|_| id as usize)
    }

    fn id_at(&self, index: usize) -> ParamId {
        index as ParamId
    }

    fn param_at(&self, index: usize) -> Option<&AutoParam> {
        let i = self.search(index as ParamId).ok()?;
        Some(&self.params[i].param)
    }

    fn param_at_mut(&mut self, index: usize) -> Option<&mut AutoParam> {
        let i = self.search(index as ParamId).ok()?;
        Some(&mut self.params[i].param)
    }

    fn table_state(&self) -> &TableState {
        &self.state
    }

    fn table_state_mut(&mut self) -> &mut TableState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::AutomationNode;

    #[test]
    fn test_params_created_on_demand_in_order() {
        let mut collection = MidiParamCollection::new();
        assert!(collection.param(74).is_err());
        collection.ensure_param(74).unwrap();
        collection.ensure_param(1).unwrap();
        collection.ensure_param(74).unwrap();
        assert_eq!(collection.ccs().collect::<Vec<_>>(), vec![1, 74]);
    }

    #[test]
    fn test_pseudo_ccs_accepted() {
        let mut collection = MidiParamCollection::new();
        collection.ensure_param(midi::PITCH_BEND).unwrap();
        collection.ensure_param(midi::CHANNEL_PRESSURE).unwrap();
        assert!(collection.ensure_param(midi::NUM_CCS).is_err());
    }

    #[test]
    fn test_summary_indexed_by_cc() {
        let mut collection = MidiParamCollection::new();
        collection.ensure_param(100).unwrap();
        collection.ensure_param(7).unwrap();
        collection.insert_node(100, AutomationNode::step(0, 3)).unwrap();
        assert_eq!(collection.summary().automated.iter().collect::<Vec<_>>(), vec![100]);
        // A CC inserted below must not disturb existing bits.
        collection.ensure_param(2).unwrap();
        assert!(collection.summary().automated.contains(100));
    }
}
