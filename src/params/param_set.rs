// src/params/param_set.rs
//
// Dense parameter tables: one AutoParam per id, allocated up front.

use log::debug;

use crate::automation::AutoParam;
use crate::error::Result;

use super::ids::ParamId;
use super::kind::ParamKind;
use super::summary::ParamBits;
use super::table::{ParamTable, TableState};

/// A fixed-size table of AutoParams for the Unpatched, Patched and
/// Expression kinds.
///
/// Every param starts static at 0, which for patched params is the value
/// that leaves the neutral value unmodified.
#[derive(Debug, PartialEq, Eq)]
pub struct ParamSet {
    kind: ParamKind,
    params: Vec<AutoParam>,
    state: TableState,
}

impl ParamSet {
    pub fn new(kind: ParamKind) -> Result<Self> {
        let count = kind.num_params();
        debug_assert!(count <= ParamBits::CAPACITY);
        let mut params = Vec::new();
        params.try_reserve_exact(count)?;
        params.extend((0..count).map(|_| AutoParam::new(0)));
        debug!("Created {:?} param set with {} params", kind, count);
        Ok(Self {
            kind,
            params,
            state: TableState::default(),
        })
    }

    /// Deep copy for a cloned timeline entity.
    pub fn try_clone_with(&self, copy_automation: bool, reverse_with_length: Option<u32>) -> Result<Self> {
        let mut params = Vec::new();
        params.try_reserve_exact(self.params.len())?;
        for param in &self.params {
            params.push(param.try_clone_with(copy_automation, reverse_with_length)?);
        }
        let mut set = Self {
            kind: self.kind,
            params,
            state: TableState::default(),
        };
        set.rebuild_summary();
        Ok(set)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Current value of `id`, or 0 for an id this set does not have.
    #[inline]
    pub fn value(&self, id: ParamId) -> i32 {
        self.params.get(id as usize).map_or(0, AutoParam::current_value)
    }

    /// Current values of every param, by id.
    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.params.iter().map(AutoParam::current_value)
    }

    /// Reset every current value to 0 without touching automation.
    pub fn clear_values(&mut self) {
        for (index, param) in self.params.iter_mut().enumerate() {
            if param.set_current_value(0) {
                self.state.changed.set(index);
            }
        }
    }

    /// Whether any param is automated or off its default.
    pub fn contains_something(&self) -> bool {
        self.params.iter().any(|p| p.contains_something(0))
    }
}

impl ParamTable for ParamSet {
    fn kind(&self) -> ParamKind {
        self.kind
    }

    fn index_bound(&self) -> usize {
        self.params.len()
    }

    fn index_of(&self, id: ParamId) -> Option<usize> {
        let index = id as usize;
        (index < self.params.len()).then_some(index)
    }

    fn id_at(&self, index: usize) -> ParamId {
        index as ParamId
    }

    fn param_at(&self, index: usize) -> Option<&AutoParam> {
        self.params.get(index)
    }

    fn param_at_mut(&mut self, index: usize) -> Option<&mut AutoParam> {
        self.params.get_mut(index)
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
    use crate::automation::{AutomationNode, PlayHead};
    use crate::error::Error;
    use crate::params::ids::{patched, unpatched};

    #[test]
    fn test_new_sizes_by_kind() {
        assert_eq!(ParamSet::new(ParamKind::Patched).unwrap().len(), patched::NUM_PATCHED as usize);
        assert_eq!(
            ParamSet::new(ParamKind::UnpatchedGlobal).unwrap().len(),
            unpatched::global::NUM_GLOBAL as usize
        );
    }

    #[test]
    fn test_region_edit_updates_summary() {
        let mut set = ParamSet::new(ParamKind::Patched).unwrap();
        set.set_value_for_region(patched::LPF_FREQ, 100, 10, 10, 96, None).unwrap();
        assert!(set.summary().automated.contains(patched::LPF_FREQ as usize));
        set.set_value_for_region(patched::LPF_FREQ, 5, 0, 0, 96, None).unwrap();
        assert!(!set.might_contain_automation());
        assert_eq!(set.value(patched::LPF_FREQ), 5);
    }

    #[test]
    fn test_stutter_rate_only_takes_value() {
        let mut set = ParamSet::new(ParamKind::UnpatchedSound).unwrap();
        set.set_value_for_region(unpatched::STUTTER_RATE, 77, 0, 10, 96, None).unwrap();
        assert!(!set.might_contain_automation());
        assert_eq!(set.value(unpatched::STUTTER_RATE), 77);
    }

    #[test]
    fn test_invalid_id() {
        let mut set = ParamSet::new(ParamKind::Expression).unwrap();
        assert_eq!(
            set.set_current_value(3, 1),
            Err(Error::InvalidParamId { kind: ParamKind::Expression, id: 3 })
        );
    }

    #[test]
    fn test_process_sets_interpolating_bit() {
        let mut set = ParamSet::new(ParamKind::Patched).unwrap();
        set.insert_node(patched::PAN, AutomationNode::ramp(0, 0)).unwrap();
        set.insert_node(patched::PAN, AutomationNode::step(48, 1 << 24)).unwrap();
        set.process_current_pos(PlayHead::forward(0, 96), 0, false, true);
        assert!(set.summary().interpolating.contains(patched::PAN as usize));
        assert_eq!(set.ticks_til_next_event(), 48);

        set.tick_samples(100, 1 << 30);
        assert!(set.take_changed().contains(patched::PAN as usize));
        assert!(set.value(patched::PAN) > 0);
    }

    #[test]
    fn test_expression_never_interpolates() {
        let mut set = ParamSet::new(ParamKind::Expression).unwrap();
        set.insert_node(0, AutomationNode::ramp(0, 0)).unwrap();
        set.insert_node(0, AutomationNode::step(48, 1 << 24)).unwrap();
        set.process_current_pos(PlayHead::forward(0, 96), 0, false, true);
        assert!(!set.summary().any_interpolating());
    }

    #[test]
    fn test_clone_rebuilds_summary() {
        let mut set = ParamSet::new(ParamKind::Patched).unwrap();
        set.insert_node(patched::VOLUME, AutomationNode::step(0, 9)).unwrap();
        let clone = set.try_clone_with(true, None).unwrap();
        assert!(clone.summary().automated.contains(patched::VOLUME as usize));
        let bare = set.try_clone_with(false, None).unwrap();
        assert!(!bare.might_contain_automation());
    }

    #[test]
    fn test_snapshot_swap_round_trip() {
        let mut set = ParamSet::new(ParamKind::Patched).unwrap();
        set.set_value_for_region(patched::PAN, 40, 8, 8, 96, None).unwrap();
        let original = set.param_state(patched::PAN).unwrap();

        let mut snapshot = set.capture_snapshot(patched::PAN, true).unwrap();
        assert!(!set.might_contain_automation());
        set.swap_state(patched::PAN, &mut snapshot).unwrap();
        assert_eq!(set.param_state(patched::PAN).unwrap(), original);
        assert!(set.might_contain_automation());
    }
}
