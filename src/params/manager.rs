// src/params/manager.rs
//
// Owner of every param collection belonging to one timeline entity (a
// sound, a kit row, an audio track, a MIDI instrument).
//
// Collections are kept in a fixed order: unpatched, patched, patch cables,
// expression, MIDI. There is at most one of each. The manager caches how
// many ticks remain until any collection reaches a node, so blocks where
// nothing happens cost one subtraction.

use arrayvec::ArrayVec;
use log::{debug, warn};

use crate::automation::{AutoParam, PlayHead};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::patch::PatchCableSet;

use super::collection::ParamCollection;
use super::expression::ExpressionParamSet;
use super::ids::ParamId;
use super::kind::ParamKind;
use super::midi::MidiParamCollection;
use super::param_set::ParamSet;
use super::summary::ParamBits;
use super::table::ParamTable;

/// One slot per collection rank.
pub const MAX_COLLECTIONS: usize = 5;

#[derive(Debug)]
pub struct ParamManager {
    collections: ArrayVec<ParamCollection, MAX_COLLECTIONS>,
    ticks_skipped: i32,
    ticks_til_next_event: i32,
    config: EngineConfig,
}

impl ParamManager {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            collections: ArrayVec::new(),
            ticks_skipped: 0,
            ticks_til_next_event: 0,
            config: config.validated(),
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Setup
    // ═══════════════════════════════════════════════════════════════════════

    /// Put `collection` in its slot, replacing any collection of the same
    /// rank. Returns the one replaced.
    fn place(&mut self, collection: ParamCollection) -> Result<Option<ParamCollection>> {
        let rank = collection.rank();
        let at = self.collections.partition_point(|c| c.rank() < rank);
        if let Some(existing) = self.collections.get_mut(at).filter(|c| c.rank() == rank) {
            return Ok(Some(std::mem::replace(existing, collection)));
        }
        self.collections
            .try_insert(at, collection)
            .map_err(|_| Error::CollectionLimitReached)?;
        Ok(None)
    }

    /// Give this manager unpatched params of `kind`, sound or global.
    pub fn setup_unpatched(&mut self, kind: ParamKind) -> Result<()> {
        debug_assert!(matches!(kind, ParamKind::UnpatchedSound | ParamKind::UnpatchedGlobal));
        let set = ParamSet::new(kind)?;
        self.place(ParamCollection::Unpatched(set))?;
        Ok(())
    }

    /// Unpatched, patched and cable collections for a synth or sample
    /// sound. Nothing is installed unless all three were allocated.
    pub fn setup_with_patching(&mut self) -> Result<()> {
        let unpatched = ParamSet::new(ParamKind::UnpatchedSound)?;
        let patched = ParamSet::new(ParamKind::Patched)?;
        let cables = PatchCableSet::new(&self.config)?;
        self.place(ParamCollection::Unpatched(unpatched))?;
        self.place(ParamCollection::Patched(patched))?;
        self.place(ParamCollection::PatchCables(cables))?;
        debug!("Param manager set up with patching");
        Ok(())
    }

    pub fn setup_midi(&mut self) -> Result<()> {
        if self.midi().is_none() {
            self.place(ParamCollection::Midi(MidiParamCollection::new()))?;
        }
        Ok(())
    }

    /// Add expression params unless they already exist. Existing values and
    /// bend ranges are never reset.
    pub fn ensure_expression_param_set_exists(&mut self, for_drum: bool) -> Result<()> {
        if self.expression().is_some() {
            return Ok(());
        }
        let expression = ExpressionParamSet::new(&self.config, for_drum)?;
        self.place(ParamCollection::Expression(expression))?;
        Ok(())
    }

    /// Replace this manager's collections with clones of `other`'s.
    ///
    /// Expression params already here are kept as they are, as are ours
    /// whenever `clone_expression` is false. Nothing changes on failure.
    pub fn clone_from(
        &mut self,
        other: &ParamManager,
        copy_automation: bool,
        clone_expression: bool,
        reverse_with_length: Option<u32>,
    ) -> Result<()> {
        let keep_expression = !clone_expression || self.expression().is_some();

        let mut cloned: ArrayVec<ParamCollection, MAX_COLLECTIONS> = ArrayVec::new();
        for collection in &other.collections {
            if keep_expression && matches!(collection, ParamCollection::Expression(_)) {
                continue;
            }
            cloned.push(collection.try_clone_with(copy_automation, reverse_with_length)?);
        }

        let ours = self
            .collections
            .iter()
            .position(|c| matches!(c, ParamCollection::Expression(_)))
            .filter(|_| keep_expression);
        if let Some(i) = ours {
            let expression = self.collections.remove(i);
            let at = cloned.partition_point(|c| c.rank() < expression.rank());
            cloned
                .try_insert(at, expression)
                .map_err(|_| Error::CollectionLimitReached)?;
        }
        self.collections = cloned;
        self.ticks_skipped = 0;
        self.expect_event();
        debug!(
            "Cloned {} param collections (automation: {}, reversed: {:?})",
            self.collections.len(),
            copy_automation,
            reverse_with_length
        );
        Ok(())
    }

    /// Move `other`'s collections here without copying.
    ///
    /// When both have expression params, ours win. `other` keeps its
    /// expression params unless `steal_expression` is set, and is otherwise
    /// left empty.
    pub fn steal_from(&mut self, other: &mut ParamManager, steal_expression: bool) -> Result<()> {
        let have_expression = self.expression().is_some();
        let mut remaining: ArrayVec<ParamCollection, MAX_COLLECTIONS> = ArrayVec::new();
        for collection in other.collections.take() {
            match collection {
                ParamCollection::Expression(_) if !steal_expression => remaining.push(collection),
                ParamCollection::Expression(_) if have_expression => {
                    debug!("Dropping stolen expression params, keeping existing");
                }
                _ => {
                    self.place(collection)?;
                }
            }
        }
        other.collections = remaining;
        other.ticks_skipped = 0;
        other.ticks_til_next_event = 0;
        self.expect_event();
        Ok(())
    }

    /// Drop every collection.
    pub fn destruct_and_forget_param_collections(&mut self) {
        self.collections.clear();
        self.ticks_skipped = 0;
        self.ticks_til_next_event = 0;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Access
    // ═══════════════════════════════════════════════════════════════════════

    pub fn collections(&self) -> &[ParamCollection] {
        &self.collections
    }

    #[inline]
    pub fn contains_any_param_collections(&self) -> bool {
        !self.collections.is_empty()
    }

    pub fn get(&self, kind: ParamKind) -> Option<&ParamCollection> {
        self.collections.iter().find(|c| c.kind() == kind)
    }

    pub fn get_mut(&mut self, kind: ParamKind) -> Option<&mut ParamCollection> {
        self.collections.iter_mut().find(|c| c.kind() == kind)
    }

    /// The collection that owns `kind` ids, as an error if there is none.
    pub fn collection_for(&mut self, kind: ParamKind, id: ParamId) -> Result<&mut ParamCollection> {
        self.get_mut(kind).ok_or(Error::InvalidParamId { kind, id })
    }

    pub fn unpatched(&self) -> Option<&ParamSet> {
        self.collections.iter().find_map(|c| match c {
            ParamCollection::Unpatched(set) => Some(set),
            _ => None,
        })
    }

    pub fn unpatched_mut(&mut self) -> Option<&mut ParamSet> {
        self.collections.iter_mut().find_map(|c| match c {
            ParamCollection::Unpatched(set) => Some(set),
            _ => None,
        })
    }

    pub fn patched(&self) -> Option<&ParamSet> {
        self.collections.iter().find_map(|c| match c {
            ParamCollection::Patched(set) => Some(set),
            _ => None,
        })
    }

    pub fn patched_mut(&mut self) -> Option<&mut ParamSet> {
        self.collections.iter_mut().find_map(|c| match c {
            ParamCollection::Patched(set) => Some(set),
            _ => None,
        })
    }

    pub fn cables(&self) -> Option<&PatchCableSet> {
        self.collections.iter().find_map(|c| match c {
            ParamCollection::PatchCables(cables) => Some(cables),
            _ => None,
        })
    }

    pub fn cables_mut(&mut self) -> Option<&mut PatchCableSet> {
        self.collections.iter_mut().find_map(|c| match c {
            ParamCollection::PatchCables(cables) => Some(cables),
            _ => None,
        })
    }

    pub fn expression(&self) -> Option<&ExpressionParamSet> {
        self.collections.iter().find_map(|c| match c {
            ParamCollection::Expression(expression) => Some(expression),
            _ => None,
        })
    }

    pub fn expression_mut(&mut self) -> Option<&mut ExpressionParamSet> {
        self.collections.iter_mut().find_map(|c| match c {
            ParamCollection::Expression(expression) => Some(expression),
            _ => None,
        })
    }

    pub fn midi(&self) -> Option<&MidiParamCollection> {
        self.collections.iter().find_map(|c| match c {
            ParamCollection::Midi(midi) => Some(midi),
            _ => None,
        })
    }

    pub fn midi_mut(&mut self) -> Option<&mut MidiParamCollection> {
        self.collections.iter_mut().find_map(|c| match c {
            ParamCollection::Midi(midi) => Some(midi),
            _ => None,
        })
    }

    /// Drain which ids of `kind` changed value since the last call.
    pub fn take_changed_params(&mut self, kind: ParamKind) -> ParamBits {
        self.get_mut(kind).map_or(ParamBits::new(), ParamCollection::take_changed_params)
    }

    /// Patched params needing recalculation because their preset or a cable
    /// feeding them changed.
    pub fn take_patching_changes(&mut self) -> ParamBits {
        let presets = self.take_changed_params(ParamKind::Patched);
        let cables = self.take_changed_params(ParamKind::PatchCable);
        presets.union(&cables)
    }

    /// Visit every param of every collection, for persistence.
    pub fn for_each_param(&self, f: &mut dyn FnMut(ParamKind, ParamId, &AutoParam)) {
        for collection in &self.collections {
            let kind = collection.kind();
            collection.for_each_param(&mut |id, param| f(kind, id, param));
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Playback
    // ═══════════════════════════════════════════════════════════════════════

    /// Apply `f` to every collection that holds automation.
    pub fn for_each_automated(&mut self, mut f: impl FnMut(&mut ParamCollection)) {
        for collection in self.collections.iter_mut() {
            if collection.might_contain_automation() {
                f(collection);
            }
        }
    }

    pub fn might_contain_automation(&self) -> bool {
        self.collections.iter().any(ParamCollection::might_contain_automation)
    }

    /// Force the next `process_current_pos` to visit every collection.
    #[inline]
    pub fn expect_event(&mut self) {
        self.ticks_til_next_event = 0;
    }

    #[inline]
    pub fn ticks_til_next_event(&self) -> i32 {
        self.ticks_til_next_event
    }

    /// Advance automation by `ticks_since_last` ticks.
    ///
    /// Collections are only visited once a node is due. When ramps cannot
    /// run at sample rate (or a kind never does) they advance by ticks here,
    /// covering the skipped span before any node at `head` restarts them.
    pub fn process_current_pos(
        &mut self,
        head: PlayHead,
        ticks_since_last: i32,
        did_pingpong: bool,
        may_interpolate_by_samples: bool,
    ) {
        self.ticks_skipped = self.ticks_skipped.saturating_add(ticks_since_last);
        self.ticks_til_next_event = self.ticks_til_next_event.saturating_sub(ticks_since_last);
        if did_pingpong {
            self.ticks_til_next_event = 0;
        }
        if self.ticks_til_next_event > 0 {
            return;
        }

        let by_samples = may_interpolate_by_samples && self.config.interpolate_by_samples;
        let ticks_skipped = self.ticks_skipped;
        let mut next_event = i32::MAX;
        self.for_each_automated(|collection| {
            let by_ticks = !by_samples || !collection.kind().interpolates_by_samples();
            if by_ticks && collection.summary().any_interpolating() {
                collection.table_mut().tick_ticks(ticks_skipped.max(0) as u32);
            }
            collection.process_current_pos(head, ticks_skipped, did_pingpong);

            // Ramps advancing by ticks need a visit every call.
            let table = collection.table_mut();
            if by_ticks && table.summary().any_interpolating() {
                next_event = 0;
            }
            next_event = next_event.min(table.ticks_til_next_event());
        });
        self.ticks_til_next_event = next_event;
        self.ticks_skipped = 0;
    }

    /// Advance sample-rate ramps by `num_samples`.
    pub fn tick_samples(&mut self, num_samples: u32) {
        let ticks_per_sample = self.config.ticks_per_sample;
        if !self.config.interpolate_by_samples {
            return;
        }
        self.for_each_automated(|collection| {
            collection.table_mut().tick_samples(num_samples, ticks_per_sample);
        });
    }

    /// Jump to `head`. Call before the first block at a new position.
    pub fn set_play_pos(&mut self, head: PlayHead) {
        self.for_each_automated(|collection| {
            collection.table_mut().set_play_pos(head, true);
        });
        self.ticks_skipped = 0;
        self.expect_event();
    }

    /// Copy each automated param's value at `pos` into its current value.
    pub fn grab_values_from_pos(&mut self, pos: u32, effective_length: u32) {
        self.for_each_automated(|collection| {
            collection.table_mut().grab_values_from_pos(pos, effective_length);
        });
    }

    pub fn notify_pingpong_occurred(&mut self) {
        self.for_each_automated(|collection| collection.table_mut().notify_pingpong_occurred());
        self.expect_event();
    }

    /// Playback stopped. Ramps freeze where they are.
    pub fn expect_no_further_ticks(&mut self) {
        self.for_each_automated(|collection| collection.table_mut().playback_has_ended());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Timeline edits
    // ═══════════════════════════════════════════════════════════════════════

    pub fn trim_to_length(&mut self, new_length: u32, effective_length: u32) -> Result<()> {
        for collection in self.collections.iter_mut() {
            if collection.might_contain_automation() {
                collection.trim_to_length(new_length, effective_length)?;
            }
        }
        self.expect_event();
        Ok(())
    }

    pub fn shift_horizontally(&mut self, amount: i32, effective_length: u32) {
        self.for_each_automated(|collection| {
            collection.table_mut().shift_horizontally(amount, effective_length);
        });
        self.expect_event();
    }

    pub fn generate_repeats(&mut self, old_length: u32, new_length: u32, pingpong: bool) -> Result<()> {
        for collection in self.collections.iter_mut() {
            if collection.might_contain_automation() {
                collection.table_mut().generate_repeats(old_length, new_length, pingpong)?;
            }
        }
        self.expect_event();
        Ok(())
    }

    pub fn delete_all_automation(&mut self) {
        self.for_each_automated(ParamCollection::delete_all_automation);
        if let Some(expression) = self.expression_mut() {
            expression.clear_values();
        }
    }

    pub fn nudge_automation_horizontally_at_pos(&mut self, pos: u32, offset: i32, length_before_loop: u32) {
        if offset == 0 {
            warn!("Ignoring zero-length automation nudge at {}", pos);
            return;
        }
        self.for_each_automated(|collection| {
            collection.nudge_non_interpolating_nodes_at_pos(pos, offset, length_before_loop);
        });
        self.expect_event();
    }

    pub fn insert_time(&mut self, pos: u32, length: u32) {
        self.for_each_automated(|collection| collection.table_mut().insert_time(pos, length));
        self.expect_event();
    }

    pub fn delete_time(&mut self, pos: u32, length: u32) {
        self.for_each_automated(|collection| collection.delete_time(pos, length));
        self.expect_event();
    }
}
