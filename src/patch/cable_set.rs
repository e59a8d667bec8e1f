// src/patch/cable_set.rs
//
// The patch-cable routing graph of one sound.
//
// Responsibilities:
// - Own every cable and its automatable strength
// - Decide which cables are usable and group them into Destinations
// - Link range-adjusting cables to the cables they adjust
// - Expose cable strengths as a param collection
//
// Does NOT:
// - Evaluate sources or combine values (see Patcher)
// - Allocate after construction, except when cloned

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::automation::AutoParam;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::fixed::multiply_32x32_rshift32_rounded;
use crate::params::ids::patched;
use crate::params::{Globality, ParamBits, ParamId, ParamKind, ParamTable, TableState};

use super::cable::{CableId, DestinationDescriptor, PatchCable, Polarity};
use super::destination::Destination;
use super::source::{PatchSource, SourceMask};

/// Decides whether a source may drive a param.
///
/// Consulted by `setup_patching`; cables that fail stay stored but are
/// ignored until the policy changes its mind.
pub trait CablePolicy: fmt::Debug + Send + Sync {
    fn may_patch(&self, source: PatchSource, param: ParamId) -> bool;
}

/// Per-voice sources cannot drive per-sound params.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCablePolicy;

impl CablePolicy for DefaultCablePolicy {
    fn may_patch(&self, source: PatchSource, param: ParamId) -> bool {
        param < patched::NUM_PATCHED
            && !(source.globality() == Globality::Local && Globality::of_patched(param) == Globality::Global)
    }
}

/// Velocity to master pitch: two-thirds, so velocity steps land on semitones.
const VELOCITY_PITCH_SCALE: i32 = 1_431_655_765;
/// Everything else to master pitch: 1/sqrt(2), three octaves of travel.
const OTHER_PITCH_SCALE: i32 = 1_518_500_250;

/// All cables of one sound plus the Destination lists derived from them.
///
/// Cables `..num_usable` are usable and grouped so each Destination is a
/// contiguous run. Destinations are split by globality; within each list
/// range destinations come first, then params in ascending order.
#[derive(Debug)]
pub struct PatchCableSet {
    cables: Vec<PatchCable>,
    num_usable: usize,
    destinations: [Vec<Destination>; Globality::COUNT],
    sources_patched_to_anything: [SourceMask; Globality::COUNT],
    max_cables: usize,
    policy: Arc<dyn CablePolicy>,
    layout_changed: bool,
    state: TableState,
}

impl PatchCableSet {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Self::with_policy(config, Arc::new(DefaultCablePolicy))
    }

    pub fn with_policy(config: &EngineConfig, policy: Arc<dyn CablePolicy>) -> Result<Self> {
        let max_cables = config.max_patch_cables.min(crate::config::MAX_PATCH_CABLES);
        let mut cables = Vec::new();
        cables.try_reserve_exact(max_cables)?;
        let mut local = Vec::new();
        local.try_reserve_exact(max_cables)?;
        let mut global = Vec::new();
        global.try_reserve_exact(max_cables)?;
        Ok(Self {
            cables,
            num_usable: 0,
            destinations: [local, global],
            sources_patched_to_anything: [SourceMask::NONE; Globality::COUNT],
            max_cables,
            policy,
            layout_changed: false,
            state: TableState::default(),
        })
    }

    pub fn try_clone_with(&self, copy_automation: bool, reverse_with_length: Option<u32>) -> Result<Self> {
        let mut cables = Vec::new();
        cables.try_reserve_exact(self.max_cables)?;
        for cable in &self.cables {
            cables.push(cable.try_clone_with(copy_automation, reverse_with_length)?);
        }
        let mut destinations = [Vec::new(), Vec::new()];
        for (to, from) in destinations.iter_mut().zip(self.destinations.iter()) {
            to.try_reserve_exact(self.max_cables)?;
            to.extend_from_slice(from);
        }
        let mut set = Self {
            cables,
            num_usable: self.num_usable,
            destinations,
            sources_patched_to_anything: self.sources_patched_to_anything,
            max_cables: self.max_cables,
            policy: Arc::clone(&self.policy),
            layout_changed: true,
            state: TableState::default(),
        };
        set.rebuild_summary();
        Ok(set)
    }

    pub fn set_policy(&mut self, policy: Arc<dyn CablePolicy>) {
        self.policy = policy;
        self.setup_patching();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn cables(&self) -> &[PatchCable] {
        &self.cables
    }

    #[inline]
    pub fn usable_cables(&self) -> &[PatchCable] {
        &self.cables[..self.num_usable]
    }

    #[inline]
    pub fn cable(&self, index: usize) -> Option<&PatchCable> {
        self.cables.get(index)
    }

    #[inline]
    pub fn num_cables(&self) -> usize {
        self.cables.len()
    }

    #[inline]
    pub fn num_usable(&self) -> usize {
        self.num_usable
    }

    #[inline]
    pub fn destinations(&self, globality: Globality) -> &[Destination] {
        &self.destinations[globality.index()]
    }

    #[inline]
    pub fn sources_patched_to_anything(&self, globality: Globality) -> SourceMask {
        self.sources_patched_to_anything[globality.index()]
    }

    /// Index of the cable from `from` to `destination`, usable or not.
    pub fn cable_index(&self, from: PatchSource, destination: DestinationDescriptor) -> Option<usize> {
        self.cables
            .iter()
            .position(|c| c.from == from && c.destination == destination)
    }

    fn usable_cable_index(&self, from: PatchSource, destination: DestinationDescriptor) -> Option<usize> {
        self.cables[..self.num_usable]
            .iter()
            .position(|c| c.from == from && c.destination == destination)
    }

    pub fn is_source_patched_to_something(&self, source: PatchSource) -> bool {
        (self.sources_patched_to_anything[0] | self.sources_patched_to_anything[1]).contains(source)
    }

    pub fn destination_for_param(&self, p: ParamId) -> Option<&Destination> {
        let globality = Globality::of_patched(p);
        self.destinations[globality.index()]
            .iter()
            .find(|d| d.descriptor == DestinationDescriptor::Param(p))
    }

    pub fn does_param_have_something_patched_to_it(&self, p: ParamId) -> bool {
        self.destination_for_param(p).is_some()
    }

    /// Strength of cable `c` as it applies to param `p`.
    ///
    /// Pitch and delay-rate cables square their strength (keeping the sign)
    /// for finer control near zero. Master pitch rescales on top.
    pub fn modified_cable_amount(&self, c: usize, p: ParamId) -> i32 {
        let Some(cable) = self.cables.get(c) else {
            return 0;
        };
        let amount = cable.strength();
        if !(patched::is_pitch(p) || p == patched::DELAY_RATE) {
            return amount;
        }

        let mut output = (amount >> 15).wrapping_mul(amount >> 16);
        if amount < 0 {
            output = -output;
        }
        if p == patched::PITCH_ADJUST {
            let scale = if cable.from == PatchSource::Velocity {
                VELOCITY_PITCH_SCALE
            } else {
                OTHER_PITCH_SCALE
            };
            output = multiply_32x32_rshift32_rounded(output, scale) << 1;
        }
        output
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Setup
    // ═══════════════════════════════════════════════════════════════════════

    fn is_usable(&self, cable: &PatchCable) -> bool {
        let source = match cable.destination {
            DestinationDescriptor::CableRange { source, .. } => source,
            DestinationDescriptor::Param(_) => cable.from,
        };
        self.policy.may_patch(source, cable.destination.param())
    }

    /// Rebuild usability, grouping, Destinations and range links from the
    /// cable list. Never allocates.
    pub fn setup_patching(&mut self) {
        // Usable cables first.
        let mut usable = 0;
        for c in 0..self.cables.len() {
            if self.is_usable(&self.cables[c]) {
                self.cables.swap(c, usable);
                usable += 1;
            }
        }

        // A range cable is only usable if the cable it adjusts is.
        let mut c = 0;
        while c < usable {
            let orphaned = match self.cables[c].destination.adjusted_cable() {
                Some((source, target)) => !self.cables[..usable]
                    .iter()
                    .any(|other| other.from == source && other.destination == target),
                None => false,
            };
            if orphaned {
                usable -= 1;
                self.cables.swap(c, usable);
            } else {
                c += 1;
            }
        }
        self.num_usable = usable;

        // Group by destination. Each (destination, source) pair is unique, so
        // the unstable sort is still deterministic.
        self.cables[..usable].sort_unstable_by_key(|c| (c.destination, c.from));
        for cable in &mut self.cables {
            cable.range_adjustment = None;
        }

        for list in &mut self.destinations {
            list.clear();
        }
        self.sources_patched_to_anything = [SourceMask::NONE; Globality::COUNT];

        let mut first = 0;
        while first < usable {
            let descriptor = self.cables[first].destination;
            let mut end = first;
            let mut sources = SourceMask::NONE;
            while end < usable && self.cables[end].destination == descriptor {
                sources.insert(self.cables[end].from);
                end += 1;
            }
            let g = descriptor.globality().index();
            self.destinations[g].push(Destination {
                descriptor,
                first_cable: first,
                end_cable: end,
                sources,
            });
            self.sources_patched_to_anything[g] |= sources;
            first = end;
        }

        // Link each range destination to the cable whose depth it adjusts.
        for g in 0..Globality::COUNT {
            let num_ranges = self.destinations[g].iter().take_while(|d| d.descriptor.is_range()).count();
            for i in 0..num_ranges {
                let range = self.destinations[g][i];
                let Some((source, target)) = range.descriptor.adjusted_cable() else {
                    continue;
                };
                if let Some(c) = self.usable_cable_index(source, target) {
                    self.cables[c].range_adjustment = Some(i);
                }
                if let Some(adjusted) = self.destinations[g].iter_mut().find(|d| d.descriptor == target) {
                    adjusted.sources |= range.sources;
                }
                self.destinations[g][i].sources.insert(source);
            }
        }

        self.layout_changed = true;
        self.rebuild_summary();
        self.expect_event();
        debug!(
            "Patching set up: {} of {} cables usable, {} local and {} global destinations",
            self.num_usable,
            self.cables.len(),
            self.destinations[0].len(),
            self.destinations[1].len()
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Authoring
    // ═══════════════════════════════════════════════════════════════════════

    fn check_destination(destination: DestinationDescriptor, from: PatchSource) -> Result<()> {
        let id = CableId::new(from, destination).encode();
        if destination.param() >= patched::NUM_PATCHED {
            return Err(Error::InvalidParamId { kind: ParamKind::PatchCable, id });
        }
        Ok(())
    }

    /// Add a cable, or set the strength of the one already there. Returns
    /// its index after re-setup.
    pub fn add_cable(&mut self, from: PatchSource, destination: DestinationDescriptor, strength: i32) -> Result<usize> {
        Self::check_destination(destination, from)?;
        if let Some(c) = self.cable_index(from, destination) {
            if self.cables[c].param.set_current_value(strength) {
                self.state.changed.set(c);
            }
            return Ok(c);
        }
        if self.cables.len() >= self.max_cables {
            warn!("Cannot add cable {:?} -> {:?}: limit of {} reached", from, destination, self.max_cables);
            return Err(Error::TooManyCables);
        }
        self.cables.try_reserve(1)?;
        self.cables.push(PatchCable::new(from, destination, strength));
        self.setup_patching();
        self.cable_index(from, destination).ok_or(Error::InvalidParamId {
            kind: ParamKind::PatchCable,
            id: CableId::new(from, destination).encode(),
        })
    }

    /// Create a zero-strength cable for `id` if none exists, as automating a
    /// not-yet-patched cable does.
    pub fn ensure_cable(&mut self, id: ParamId) -> Result<usize> {
        let cable = CableId::decode(id).ok_or(Error::InvalidParamId { kind: ParamKind::PatchCable, id })?;
        match self.cable_index(cable.source, cable.destination) {
            Some(c) => Ok(c),
            None => self.add_cable(cable.source, cable.destination, 0),
        }
    }

    pub fn remove_cable(&mut self, from: PatchSource, destination: DestinationDescriptor) -> bool {
        let Some(c) = self.cable_index(from, destination) else {
            return false;
        };
        self.cables.swap_remove(c);
        self.setup_patching();
        true
    }

    /// Point an existing cable somewhere else, keeping its strength and
    /// automation. A cable already at the new destination is replaced.
    pub fn retarget_cable(
        &mut self,
        from: PatchSource,
        old: DestinationDescriptor,
        new: DestinationDescriptor,
    ) -> Result<()> {
        Self::check_destination(new, from)?;
        let missing = Error::InvalidParamId {
            kind: ParamKind::PatchCable,
            id: CableId::new(from, old).encode(),
        };
        if self.cable_index(from, old).is_none() {
            return Err(missing);
        }
        if old == new {
            return Ok(());
        }
        if let Some(existing) = self.cable_index(from, new) {
            self.cables.swap_remove(existing);
        }
        let c = self.cable_index(from, old).ok_or(missing)?;
        self.cables[c].destination = new;
        self.setup_patching();
        Ok(())
    }

    /// User edit of a cable's static strength. A cable left at zero with no
    /// automation is deleted.
    pub fn set_cable_strength(&mut self, from: PatchSource, destination: DestinationDescriptor, strength: i32) -> Result<()> {
        let id = CableId::new(from, destination).encode();
        let c = self.ensure_cable(id)?;
        if self.cables[c].param.set_current_value(strength) {
            self.state.changed.set(c);
        }
        self.delete_if_inconsequential(c);
        Ok(())
    }

    /// Change how an existing cable shapes its source.
    pub fn set_cable_polarity(
        &mut self,
        from: PatchSource,
        destination: DestinationDescriptor,
        polarity: Polarity,
    ) -> Result<()> {
        let c = self.cable_index(from, destination).ok_or(Error::InvalidParamId {
            kind: ParamKind::PatchCable,
            id: CableId::new(from, destination).encode(),
        })?;
        if self.cables[c].polarity != polarity {
            self.cables[c].polarity = polarity;
            self.state.changed.set(c);
        }
        Ok(())
    }

    /// Remove every cable into `p`, including range cables to its cables.
    pub fn remove_all_patching_to_param(&mut self, p: ParamId) {
        let before = self.cables.len();
        self.cables.retain(|c| c.destination.param() != p);
        if self.cables.len() != before {
            self.setup_patching();
        }
    }

    /// Delete cable `c` if it is static at zero.
    pub(crate) fn delete_if_inconsequential(&mut self, c: usize) -> bool {
        match self.cables.get(c) {
            Some(cable) if !cable.param.contains_something(0) => {
                debug!("Deleting zero-strength cable {:?} -> {:?}", cable.from, cable.destination);
                self.cables.swap_remove(c);
                self.setup_patching();
                true
            }
            _ => false,
        }
    }

    /// Delete every cable that is static at zero.
    pub(crate) fn prune_inconsequential(&mut self) {
        let before = self.cables.len();
        self.cables.retain(|c| c.param.contains_something(0));
        if self.cables.len() != before {
            self.setup_patching();
        }
    }

    /// Drain the set of patched params whose cable strengths changed. After
    /// a re-setup every param is reported.
    pub fn take_affected_params(&mut self) -> ParamBits {
        let changed = self.state.changed.take();
        let mut affected = ParamBits::new();
        if std::mem::take(&mut self.layout_changed) {
            for p in 0..patched::NUM_PATCHED as usize {
                affected.set(p);
            }
            return affected;
        }
        for c in changed.iter() {
            if let Some(cable) = self.cables.get(c) {
                affected.set(cable.destination.param() as usize);
            }
        }
        affected
    }
}

impl ParamTable for PatchCableSet {
    fn kind(&self) -> ParamKind {
        ParamKind::PatchCable
    }

    fn index_bound(&self) -> usize {
        self.cables.len()
    }

    fn index_of(&self, id: ParamId) -> Option<usize> {
        let cable = CableId::decode(id)?;
        self.cable_index(cable.source, cable.destination)
    }

    fn id_at(&self, index: usize) -> ParamId {
        self.cables.get(index).map_or(0, |c| c.id().encode())
    }

    fn param_at(&self, index: usize) -> Option<&AutoParam> {
        self.cables.get(index).map(|c| &c.param)
    }

    fn param_at_mut(&mut self, index: usize) -> Option<&mut AutoParam> {
        self.cables.get_mut(index).map(|c| &mut c.param)
    }

    fn table_state(&self) -> &TableState {
        &self.state
    }

    fn table_state_mut(&mut self) -> &mut TableState {
        &mut self.state
    }
}
