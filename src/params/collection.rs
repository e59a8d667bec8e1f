// src/params/collection.rs
//
// One owned value per kind of param collection.
//
// Most operations go straight to the shared ParamTable behaviour. The enum
// adds what differs by kind: MIDI and cable params are created on first
// write, cables left static at zero are deleted, and clearing expression
// automation also zeroes its values.

use crate::automation::{AutoParam, AutoParamState, AutomationNode, PlayHead, Snapshot};
use crate::error::Result;
use crate::patch::PatchCableSet;

use super::expression::ExpressionParamSet;
use super::ids::ParamId;
use super::kind::ParamKind;
use super::midi::MidiParamCollection;
use super::param_set::ParamSet;
use super::summary::{ParamBits, ParamCollectionSummary};
use super::table::ParamTable;

#[derive(Debug)]
pub enum ParamCollection {
    Unpatched(ParamSet),
    Patched(ParamSet),
    PatchCables(PatchCableSet),
    Expression(ExpressionParamSet),
    Midi(MidiParamCollection),
}

impl ParamCollection {
    #[inline]
    pub fn table(&self) -> &dyn ParamTable {
        match self {
            ParamCollection::Unpatched(set) | ParamCollection::Patched(set) => set,
            ParamCollection::PatchCables(cables) => cables,
            ParamCollection::Expression(expression) => expression.params(),
            ParamCollection::Midi(midi) => midi,
        }
    }

    #[inline]
    pub fn table_mut(&mut self) -> &mut dyn ParamTable {
        match self {
            ParamCollection::Unpatched(set) | ParamCollection::Patched(set) => set,
            ParamCollection::PatchCables(cables) => cables,
            ParamCollection::Expression(expression) => expression.params_mut(),
            ParamCollection::Midi(midi) => midi,
        }
    }

    #[inline]
    pub fn kind(&self) -> ParamKind {
        self.table().kind()
    }

    #[inline]
    pub fn summary(&self) -> &ParamCollectionSummary {
        self.table().summary()
    }

    #[inline]
    pub fn might_contain_automation(&self) -> bool {
        self.table().might_contain_automation()
    }

    /// Position in a ParamManager. One collection per rank.
    pub(crate) fn rank(&self) -> usize {
        match self {
            ParamCollection::Unpatched(_) => 0,
            ParamCollection::Patched(_) => 1,
            ParamCollection::PatchCables(_) => 2,
            ParamCollection::Expression(_) => 3,
            ParamCollection::Midi(_) => 4,
        }
    }

    pub fn try_clone_with(&self, copy_automation: bool, reverse_with_length: Option<u32>) -> Result<Self> {
        Ok(match self {
            ParamCollection::Unpatched(set) => {
                ParamCollection::Unpatched(set.try_clone_with(copy_automation, reverse_with_length)?)
            }
            ParamCollection::Patched(set) => {
                ParamCollection::Patched(set.try_clone_with(copy_automation, reverse_with_length)?)
            }
            ParamCollection::PatchCables(cables) => {
                ParamCollection::PatchCables(cables.try_clone_with(copy_automation, reverse_with_length)?)
            }
            ParamCollection::Expression(expression) => {
                ParamCollection::Expression(expression.try_clone_with(copy_automation, reverse_with_length)?)
            }
            ParamCollection::Midi(midi) => {
                ParamCollection::Midi(midi.try_clone_with(copy_automation, reverse_with_length)?)
            }
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Knob mapping
    // ═══════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn value_to_knob_pos(&self, id: ParamId, value: i32) -> i32 {
        self.kind().value_to_knob_pos(id, value)
    }

    #[inline]
    pub fn knob_pos_to_value(&self, id: ParamId, knob: i32) -> i32 {
        self.kind().knob_pos_to_value(id, knob)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Single-param edits
    // ═══════════════════════════════════════════════════════════════════════

    /// Make sure a param exists for `id` before it is written.
    fn prepare_write(&mut self, id: ParamId) -> Result<()> {
        match self {
            ParamCollection::Midi(midi) => midi.ensure_param(id),
            ParamCollection::PatchCables(cables) => cables.ensure_cable(id).map(|_| ()),
            _ => self.kind().check(id),
        }
    }

    /// A cable with no strength left anywhere goes away after an edit.
    fn finish_write(&mut self, id: ParamId) {
        if let ParamCollection::PatchCables(cables) = self {
            if let Some(index) = cables.index_of(id) {
                cables.delete_if_inconsequential(index);
            }
        }
    }

    pub fn param(&self, id: ParamId) -> Result<&AutoParam> {
        self.table().param(id)
    }

    pub fn current_value(&self, id: ParamId) -> Result<i32> {
        self.table().current_value(id)
    }

    pub fn value_at(&self, id: ParamId, pos: u32, effective_length: u32) -> Result<i32> {
        self.table().value_at(id, pos, effective_length)
    }

    pub fn set_current_value(&mut self, id: ParamId, value: i32) -> Result<()> {
        self.prepare_write(id)?;
        self.table_mut().set_current_value(id, value)?;
        self.finish_write(id);
        Ok(())
    }

    /// Record `value` over `start..start + length`, or over the whole param
    /// when `length` is 0. `live` is the playback position, `None` when
    /// stopped.
    pub fn set_value_for_region(
        &mut self,
        id: ParamId,
        value: i32,
        start: u32,
        length: u32,
        effective_length: u32,
        live: Option<PlayHead>,
    ) -> Result<()> {
        self.prepare_write(id)?;
        self.table_mut().set_value_for_region(id, value, start, length, effective_length, live)?;
        self.finish_write(id);
        Ok(())
    }

    pub fn grab_value_at(&mut self, id: ParamId, pos: u32, effective_length: u32) -> Result<()> {
        self.table_mut().grab_value_at(id, pos, effective_length)
    }

    pub fn insert_node(&mut self, id: ParamId, node: AutomationNode) -> Result<()> {
        self.prepare_write(id)?;
        self.table_mut().insert_node(id, node)?;
        self.finish_write(id);
        Ok(())
    }

    pub fn delete_node_at(&mut self, id: ParamId, pos: u32) -> Result<()> {
        self.table_mut().delete_node_at(id, pos)?;
        self.finish_write(id);
        Ok(())
    }

    pub fn shift_param_values(&mut self, id: ParamId, offset: i32) -> Result<()> {
        self.table_mut().shift_param_values(id, offset)?;
        self.finish_write(id);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Snapshots and persistence
    // ═══════════════════════════════════════════════════════════════════════

    pub fn capture_snapshot(&mut self, id: ParamId, steal: bool) -> Result<Snapshot> {
        self.table_mut().capture_snapshot(id, steal)
    }

    /// Exchange one param's state with `snapshot`. Cables are not deleted
    /// here even if they end up empty, so a second swap always finds them.
    pub fn swap_state(&mut self, id: ParamId, snapshot: &mut Snapshot) -> Result<()> {
        self.table_mut().swap_state(id, snapshot)
    }

    pub fn param_state(&self, id: ParamId) -> Result<AutoParamState> {
        self.table().param_state(id)
    }

    /// Load one param from persisted state, creating it if the kind allows.
    pub fn restore_param_state(&mut self, id: ParamId, state: AutoParamState) -> Result<()> {
        self.prepare_write(id)?;
        self.table_mut().restore_param_state(id, state)
    }

    /// Visit every param with its id.
    pub fn for_each_param(&self, f: &mut dyn FnMut(ParamId, &AutoParam)) {
        self.table().for_each_param(f);
    }

    /// Drain which ids changed value. For cables this is reported in terms
    /// of the patched params they feed.
    pub fn take_changed_params(&mut self) -> ParamBits {
        match self {
            ParamCollection::PatchCables(cables) => cables.take_affected_params(),
            _ => self.table_mut().take_changed(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Whole-collection timeline edits
    // ═══════════════════════════════════════════════════════════════════════

    fn prune_cables(&mut self) {
        if let ParamCollection::PatchCables(cables) = self {
            cables.prune_inconsequential();
        }
    }

    pub fn process_current_pos(&mut self, head: PlayHead, ticks_skipped: i32, did_pingpong: bool) {
        self.table_mut().process_current_pos(head, ticks_skipped, did_pingpong, true);
    }

    pub fn trim_to_length(&mut self, new_length: u32, effective_length: u32) -> Result<()> {
        self.table_mut().trim_to_length(new_length, effective_length)?;
        self.prune_cables();
        Ok(())
    }

    pub fn delete_all_automation(&mut self) {
        match self {
            ParamCollection::Expression(expression) => expression.delete_all_automation(),
            _ => {
                self.table_mut().delete_all_automation();
                self.prune_cables();
            }
        }
    }

    pub fn nudge_non_interpolating_nodes_at_pos(&mut self, pos: u32, offset: i32, length_before_loop: u32) {
        self.table_mut()
            .nudge_non_interpolating_nodes_at_pos(pos, offset, length_before_loop);
        self.prune_cables();
    }

    pub fn delete_time(&mut self, pos: u32, length: u32) {
        self.table_mut().delete_time(pos, length);
        self.prune_cables();
    }
}
