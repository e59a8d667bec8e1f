// src/params/table.rs
//
// Behaviour shared by every collection of AutoParams.
//
// A collection only has to say how to find its params (by dense index, by
// CC number, by cable slot) and where its bookkeeping lives. Everything
// else, from per-block ticking to timeline edits, is written once here and
// keeps the Summary in step with every mutation.

use crate::automation::{
    AutoParam, AutoParamState, AutomationDelta, AutomationNode, PlayHead, Snapshot,
};
use crate::error::{Error, Result};

use super::ids::ParamId;
use super::kind::ParamKind;
use super::summary::{ParamBits, ParamCollectionSummary};

/// Per-collection bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableState {
    pub summary: ParamCollectionSummary,
    /// Params whose current value changed since the consumer last looked.
    pub changed: ParamBits,
    /// Ticks until any automated param here next reaches a node.
    pub ticks_til_next_event: i32,
}

/// A collection of AutoParams addressed by small indices.
///
/// Indices are positions in the Summary bitsets; ids are what callers use.
/// The two coincide for dense tables.
pub trait ParamTable {
    fn kind(&self) -> ParamKind;

    /// Exclusive upper bound on indices.
    fn index_bound(&self) -> usize;

    fn index_of(&self, id: ParamId) -> Option<usize>;

    fn id_at(&self, index: usize) -> ParamId;

    fn param_at(&self, index: usize) -> Option<&AutoParam>;

    fn param_at_mut(&mut self, index: usize) -> Option<&mut AutoParam>;

    fn table_state(&self) -> &TableState;

    fn table_state_mut(&mut self) -> &mut TableState;

    // ═══════════════════════════════════════════════════════════════════════
    // Bookkeeping
    // ═══════════════════════════════════════════════════════════════════════

    #[inline]
    fn summary(&self) -> &ParamCollectionSummary {
        &self.table_state().summary
    }

    #[inline]
    fn might_contain_automation(&self) -> bool {
        self.summary().any_automated()
    }

    #[inline]
    fn ticks_til_next_event(&self) -> i32 {
        self.table_state().ticks_til_next_event
    }

    /// Force the next `process_current_pos` to visit every automated param.
    fn expect_event(&mut self) {
        self.table_state_mut().ticks_til_next_event = 0;
    }

    /// Drain the set of params whose value changed.
    fn take_changed(&mut self) -> ParamBits {
        self.table_state_mut().changed.take()
    }

    fn apply_delta(&mut self, index: usize, delta: AutomationDelta) {
        self.table_state_mut().summary.apply(index, delta);
        if delta == AutomationDelta::BecameAutomated {
            self.expect_event();
        }
    }

    fn mark_changed(&mut self, index: usize) {
        self.table_state_mut().changed.set(index);
    }

    /// Recompute the Summary from the params themselves.
    fn rebuild_summary(&mut self) {
        let mut summary = ParamCollectionSummary::new();
        for index in 0..self.index_bound() {
            if let Some(param) = self.param_at(index) {
                summary.automated.assign(index, param.is_automated());
                summary.interpolating.assign(index, param.is_automated() && param.is_interpolating());
            }
        }
        self.table_state_mut().summary = summary;
    }

    /// Call `f` for every param, automated or not.
    fn for_each_param(&self, f: &mut dyn FnMut(ParamId, &AutoParam)) {
        for index in 0..self.index_bound() {
            if let Some(param) = self.param_at(index) {
                f(self.id_at(index), param);
            }
        }
    }

    /// Call `f` for every automated param.
    fn for_each_automated(&self, f: &mut dyn FnMut(ParamId, &AutoParam)) {
        for index in self.summary().automated.iter() {
            if let Some(param) = self.param_at(index) {
                f(self.id_at(index), param);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Per-block playback
    // ═══════════════════════════════════════════════════════════════════════

    /// Advance by `ticks_skipped` and service every param that has reached a
    /// node. Params between nodes are not visited.
    fn process_current_pos(&mut self, head: PlayHead, ticks_skipped: i32, did_pingpong: bool, may_interpolate: bool) {
        if did_pingpong {
            self.notify_pingpong_occurred();
        }

        let state = self.table_state_mut();
        state.ticks_til_next_event = state.ticks_til_next_event.saturating_sub(ticks_skipped);
        if state.ticks_til_next_event > 0 {
            return;
        }
        state.ticks_til_next_event = i32::MAX;
        state.summary.interpolating.clear_all();

        let may_interpolate = may_interpolate && self.kind().may_interpolate();
        let automated = self.summary().automated;
        let mut next_event = i32::MAX;
        for index in automated.iter() {
            let Some(param) = self.param_at_mut(index) else {
                continue;
            };
            let before = param.current_value();
            next_event = next_event.min(param.process_current_pos(head, may_interpolate));
            let after = param.current_value();
            let interpolating = param.is_interpolating();

            let state = self.table_state_mut();
            state.summary.set_interpolating(index, interpolating);
            if before != after {
                state.changed.set(index);
            }
        }
        self.table_state_mut().ticks_til_next_event = next_event;
    }

    /// Advance every ramp by audio samples. No-op for kinds that do not
    /// interpolate at sample rate.
    fn tick_samples(&mut self, num_samples: u32, ticks_per_sample: u32) {
        if !self.kind().interpolates_by_samples() || !self.summary().any_interpolating() {
            return;
        }
        let interpolating = self.summary().interpolating;
        for index in interpolating.iter() {
            let Some(param) = self.param_at_mut(index) else {
                continue;
            };
            let changed = param.tick_samples(num_samples, ticks_per_sample);
            let still = param.is_interpolating();

            let state = self.table_state_mut();
            if changed {
                state.changed.set(index);
            }
            if !still {
                state.summary.interpolating.clear(index);
            }
        }
    }

    /// Advance every ramp by whole ticks.
    fn tick_ticks(&mut self, num_ticks: u32) {
        let interpolating = self.summary().interpolating;
        for index in interpolating.iter() {
            let Some(param) = self.param_at_mut(index) else {
                continue;
            };
            let changed = param.tick_ticks(num_ticks);
            let still = param.is_interpolating();

            let state = self.table_state_mut();
            if changed {
                state.changed.set(index);
            }
            if !still {
                state.summary.interpolating.clear(index);
            }
        }
    }

    /// Jump playback to `head`, re-sampling every automated param.
    fn set_play_pos(&mut self, head: PlayHead, may_interpolate: bool) {
        let may_interpolate = may_interpolate && self.kind().may_interpolate();
        let automated = self.summary().automated;
        for index in automated.iter() {
            let Some(param) = self.param_at_mut(index) else {
                continue;
            };
            let changed = param.set_play_pos(head, may_interpolate);
            let interpolating = param.is_interpolating();

            let state = self.table_state_mut();
            state.summary.set_interpolating(index, interpolating);
            if changed {
                state.changed.set(index);
            }
        }
        self.expect_event();
    }

    /// Copy the value at `pos` into every automated param's current value.
    fn grab_values_from_pos(&mut self, pos: u32, effective_length: u32) {
        let automated = self.summary().automated;
        for index in automated.iter() {
            if let Some(param) = self.param_at_mut(index) {
                if param.grab_value_from_pos(pos, effective_length) {
                    self.mark_changed(index);
                }
            }
        }
    }

    fn notify_pingpong_occurred(&mut self) {
        let interpolating = self.summary().interpolating;
        for index in interpolating.iter() {
            if let Some(param) = self.param_at_mut(index) {
                param.notify_pingpong_occurred();
            }
        }
        self.expect_event();
    }

    /// Playback stopped: freeze every ramp.
    fn playback_has_ended(&mut self) {
        let interpolating = self.summary().interpolating;
        for index in interpolating.iter() {
            if let Some(param) = self.param_at_mut(index) {
                param.expect_no_further_ticks();
            }
        }
        self.table_state_mut().summary.interpolating.clear_all();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Whole-collection timeline edits
    // ═══════════════════════════════════════════════════════════════════════

    fn trim_to_length(&mut self, new_length: u32, effective_length: u32) -> Result<()> {
        let automated = self.summary().automated;
        for index in automated.iter() {
            let Some(param) = self.param_at_mut(index) else {
                continue;
            };
            let before = param.current_value();
            let delta = param.trim_to_length(new_length, effective_length)?;
            let changed = param.current_value() != before;
            self.apply_delta(index, delta);
            if changed {
                self.mark_changed(index);
            }
        }
        Ok(())
    }

    fn shift_horizontally(&mut self, amount: i32, effective_length: u32) {
        let automated = self.summary().automated;
        for index in automated.iter() {
            if let Some(param) = self.param_at_mut(index) {
                param.shift_horizontally(amount, effective_length);
            }
        }
        self.expect_event();
    }

    fn generate_repeats(&mut self, old_length: u32, new_length: u32, pingpong: bool) -> Result<()> {
        let automated = self.summary().automated;
        for index in automated.iter() {
            if let Some(param) = self.param_at_mut(index) {
                param.generate_repeats(old_length, new_length, pingpong)?;
            }
        }
        self.expect_event();
        Ok(())
    }

    fn delete_all_automation(&mut self) {
        let automated = self.summary().automated;
        for index in automated.iter() {
            if let Some(param) = self.param_at_mut(index) {
                let _ = param.delete_automation();
            }
        }
        self.table_state_mut().summary.reset();
    }

    fn nudge_non_interpolating_nodes_at_pos(&mut self, pos: u32, offset: i32, length_before_loop: u32) {
        let automated = self.summary().automated;
        for index in automated.iter() {
            if let Some(param) = self.param_at_mut(index) {
                param.nudge_non_interpolating_nodes_at_pos(pos, offset, length_before_loop);
            }
        }
        self.expect_event();
    }

    fn insert_time(&mut self, pos: u32, length: u32) {
        let automated = self.summary().automated;
        for index in automated.iter() {
            if let Some(param) = self.param_at_mut(index) {
                param.insert_time(pos, length);
            }
        }
        self.expect_event();
    }

    fn delete_time(&mut self, pos: u32, length: u32) {
        let automated = self.summary().automated;
        for index in automated.iter() {
            if let Some(param) = self.param_at_mut(index) {
                let delta = param.delete_time(pos, length);
                self.apply_delta(index, delta);
            }
        }
        self.expect_event();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Single-param access by id
    // ═══════════════════════════════════════════════════════════════════════

    fn resolve(&self, id: ParamId) -> Result<usize> {
        self.index_of(id).ok_or(Error::InvalidParamId { kind: self.kind(), id })
    }

    fn param(&self, id: ParamId) -> Result<&AutoParam> {
        let index = self.resolve(id)?;
        self.param_at(index).ok_or(Error::InvalidParamId { kind: self.kind(), id })
    }

    fn resolve_mut(&mut self, id: ParamId) -> Result<(usize, &mut AutoParam)> {
        let index = self.resolve(id)?;
        let kind = self.kind();
        match self.param_at_mut(index) {
            Some(param) => Ok((index, param)),
            None => Err(Error::InvalidParamId { kind, id }),
        }
    }

    fn current_value(&self, id: ParamId) -> Result<i32> {
        Ok(self.param(id)?.current_value())
    }

    fn value_at(&self, id: ParamId, pos: u32, effective_length: u32) -> Result<i32> {
        Ok(self.param(id)?.value_at(pos, effective_length))
    }

    /// Static edit: change the value without touching automation.
    fn set_current_value(&mut self, id: ParamId, value: i32) -> Result<()> {
        let (index, param) = self.resolve_mut(id)?;
        if param.set_current_value(value) {
            self.mark_changed(index);
        }
        Ok(())
    }

    /// Write `value` over a region, or over the whole param when
    /// `length == 0`. Params that may not be automated only take the value.
    /// `live` is the playback position, `None` when stopped.
    fn set_value_for_region(
        &mut self,
        id: ParamId,
        value: i32,
        start: u32,
        length: u32,
        effective_length: u32,
        live: Option<PlayHead>,
    ) -> Result<()> {
        if !self.kind().allows_automation(id) {
            return self.set_current_value(id, value);
        }
        let (index, param) = self.resolve_mut(id)?;
        let before = param.current_value();
        let delta = param.set_value_for_region(value, start, length, effective_length, live)?;
        let changed = param.current_value() != before;
        let interpolating = param.is_interpolating();
        self.apply_delta(index, delta);
        self.table_state_mut().summary.set_interpolating(index, interpolating);
        if changed {
            self.mark_changed(index);
        }
        Ok(())
    }

    /// Copy the value at `pos` into one param's current value.
    fn grab_value_at(&mut self, id: ParamId, pos: u32, effective_length: u32) -> Result<()> {
        let (index, param) = self.resolve_mut(id)?;
        if param.grab_value_from_pos(pos, effective_length) {
            self.mark_changed(index);
        }
        Ok(())
    }

    fn insert_node(&mut self, id: ParamId, node: AutomationNode) -> Result<()> {
        if !self.kind().allows_automation(id) {
            return Err(Error::InvalidParamId { kind: self.kind(), id });
        }
        let (index, param) = self.resolve_mut(id)?;
        let delta = param.insert_node(node)?;
        self.apply_delta(index, delta);
        Ok(())
    }

    fn delete_node_at(&mut self, id: ParamId, pos: u32) -> Result<()> {
        let (index, param) = self.resolve_mut(id)?;
        let delta = param.delete_node_at(pos);
        self.apply_delta(index, delta);
        Ok(())
    }

    fn shift_param_values(&mut self, id: ParamId, offset: i32) -> Result<()> {
        let (index, param) = self.resolve_mut(id)?;
        param.shift_values(offset);
        self.mark_changed(index);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Snapshots and persistence
    // ═══════════════════════════════════════════════════════════════════════

    /// Copy one param's state, or move it out when `steal` is set.
    fn capture_snapshot(&mut self, id: ParamId, steal: bool) -> Result<Snapshot> {
        let (index, param) = self.resolve_mut(id)?;
        if steal {
            let (snapshot, delta) = param.take_snapshot();
            self.apply_delta(index, delta);
            Ok(snapshot)
        } else {
            param.snapshot()
        }
    }

    /// Exchange one param's state with `snapshot`. Doing it twice restores
    /// both sides exactly.
    fn swap_state(&mut self, id: ParamId, snapshot: &mut Snapshot) -> Result<()> {
        let (index, param) = self.resolve_mut(id)?;
        let before = param.current_value();
        let delta = param.swap_state(snapshot);
        let changed = param.current_value() != before;
        self.apply_delta(index, delta);
        self.table_state_mut().summary.interpolating.clear(index);
        if changed {
            self.mark_changed(index);
        }
        Ok(())
    }

    fn param_state(&self, id: ParamId) -> Result<AutoParamState> {
        self.param(id)?.state()
    }

    fn restore_param_state(&mut self, id: ParamId, state: AutoParamState) -> Result<()> {
        let (index, param) = self.resolve_mut(id)?;
        let delta = param.restore_state(state);
        self.apply_delta(index, delta);
        self.table_state_mut().summary.interpolating.clear(index);
        self.mark_changed(index);
        Ok(())
    }
}
