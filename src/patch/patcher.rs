// src/patch/patcher.rs
//
// Per-block reduction of sources, cables and presets into final param
// values for one globality.
//
// Each call runs two phases:
// 1. Range destinations, combined linearly into range multipliers
// 2. Param destinations, combined by law and folded with the preset
//
// A Patcher owns only its output arrays. Everything it reads comes from the
// ParamManager passed in, so a sound keeps one global Patcher and each
// voice keeps a local one over the same cable set.

use log::debug;

use crate::config::MAX_PATCH_CABLES;
use crate::error::Result;
use crate::fixed::{UNITY, lshift_and_saturate, multiply_32x32_rshift32};
use crate::params::ids::patched;
use crate::params::{Globality, ParamBits, ParamId, ParamManager, ParamSet};

use super::cable_set::PatchCableSet;
use super::destination::Destination;
use super::laws::{self, Law};
use super::source::{PatchSource, SourceMask, SourceValues};

/// Computes final values for the patched params of one globality.
#[derive(Debug, Clone)]
pub struct Patcher {
    globality: Globality,
    first_param: ParamId,
    end_param: ParamId,
    neutral_values: Vec<i32>,
    final_values: Vec<i32>,
    range_final_values: [i32; MAX_PATCH_CABLES],
}

impl Patcher {
    pub fn new(globality: Globality) -> Result<Self> {
        let (first_param, end_param) = match globality {
            Globality::Local => (0, patched::FIRST_GLOBAL),
            Globality::Global => (patched::FIRST_GLOBAL, patched::NUM_PATCHED),
        };
        let len = (end_param - first_param) as usize;

        let mut neutral_values = Vec::new();
        neutral_values.try_reserve_exact(len)?;
        neutral_values.extend((first_param..end_param).map(laws::default_neutral_value));

        let mut final_values = Vec::new();
        final_values.try_reserve_exact(len)?;
        final_values.extend_from_slice(&neutral_values);

        debug!("Patcher created for {:?} params {}..{}", globality, first_param, end_param);
        Ok(Self {
            globality,
            first_param,
            end_param,
            neutral_values,
            final_values,
            range_final_values: [UNITY; MAX_PATCH_CABLES],
        })
    }

    #[inline]
    pub fn globality(&self) -> Globality {
        self.globality
    }

    #[inline]
    fn slot(&self, p: ParamId) -> Option<usize> {
        (self.first_param..self.end_param)
            .contains(&p)
            .then(|| (p - self.first_param) as usize)
    }

    /// Final value of `p` from the last patch. Params outside this patcher's
    /// globality read as 0.
    #[inline]
    pub fn final_value(&self, p: ParamId) -> i32 {
        self.slot(p).map_or(0, |i| self.final_values[i])
    }

    /// Final values for this patcher's params, first param first.
    #[inline]
    pub fn final_values(&self) -> &[i32] {
        &self.final_values
    }

    pub fn neutral_value(&self, p: ParamId) -> i32 {
        self.slot(p).map_or(0, |i| self.neutral_values[i])
    }

    /// Override the neutral value of one param. Takes effect at the next
    /// patch that visits it.
    pub fn set_neutral_value(&mut self, p: ParamId, value: i32) {
        if let Some(i) = self.slot(p) {
            self.neutral_values[i] = value;
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Entry points
    // ═══════════════════════════════════════════════════════════════════════

    /// Recompute every param, patched or not.
    pub fn patch_all(&mut self, sources: &SourceValues, manager: &ParamManager) {
        let presets = manager.patched();
        let cables = manager.cables();

        let destinations = cables.map_or(&[][..], |c| c.destinations(self.globality));
        let num_ranges = num_range_destinations(destinations);
        if let Some(cables) = cables {
            for (i, destination) in destinations[..num_ranges].iter().enumerate() {
                self.range_final_values[i] = combine_range(cables, destination, sources);
            }
        }

        let mut direct = destinations[num_ranges..].iter().peekable();
        for p in self.first_param..self.end_param {
            let destination = direct.next_if(|d| d.descriptor.param() == p);
            self.compute_param(p, destination, cables, presets, sources);
        }
    }

    /// Recompute only the destinations that depend on a source in `changed`.
    /// Everything else keeps its value from the previous block.
    pub fn patch_changed(&mut self, changed: SourceMask, sources: &SourceValues, manager: &ParamManager) {
        let Some(cables) = manager.cables() else {
            return;
        };
        let changed = changed & cables.sources_patched_to_anything(self.globality);
        if changed.is_empty() {
            return;
        }
        let presets = manager.patched();

        let destinations = cables.destinations(self.globality);
        let num_ranges = num_range_destinations(destinations);
        for (i, destination) in destinations[..num_ranges].iter().enumerate() {
            if destination.sources.intersects(changed) {
                self.range_final_values[i] = combine_range(cables, destination, sources);
            }
        }
        for destination in &destinations[num_ranges..] {
            if destination.sources.intersects(changed) {
                let p = destination.descriptor.param();
                self.compute_param(p, Some(destination), Some(cables), presets, sources);
            }
        }
    }

    /// Recompute one param, including any range destinations that adjust
    /// its cables. Use after its preset or a cable strength changed.
    pub fn recalculate_param(&mut self, p: ParamId, sources: &SourceValues, manager: &ParamManager) {
        if self.slot(p).is_none() {
            return;
        }
        let cables = manager.cables();
        let destinations = cables.map_or(&[][..], |c| c.destinations(self.globality));
        let num_ranges = num_range_destinations(destinations);

        if let Some(cables) = cables {
            for (i, destination) in destinations[..num_ranges].iter().enumerate() {
                if destination.descriptor.param() == p {
                    self.range_final_values[i] = combine_range(cables, destination, sources);
                }
            }
        }
        let destination = destinations[num_ranges..]
            .iter()
            .find(|d| d.descriptor.param() == p);
        self.compute_param(p, destination, cables, manager.patched(), sources);
    }

    /// Recompute every param in `params`, typically drained from
    /// `ParamManager::take_patching_changes`.
    pub fn recalculate_params(&mut self, params: &ParamBits, sources: &SourceValues, manager: &ParamManager) {
        for p in params.iter() {
            self.recalculate_param(p as ParamId, sources, manager);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Combination
    // ═══════════════════════════════════════════════════════════════════════

    fn compute_param(
        &mut self,
        p: ParamId,
        destination: Option<&Destination>,
        cables: Option<&PatchCableSet>,
        presets: Option<&ParamSet>,
        sources: &SourceValues,
    ) {
        let Some(slot) = self.slot(p) else {
            return;
        };
        let preset = presets.map_or(0, |set| set.value(p));
        let law = Law::of(p);

        let combination = match (destination, cables) {
            (Some(destination), Some(cables)) if law.is_multiplicative() => {
                self.combine_multiplicative(p, preset, cables, destination, sources)
            }
            (Some(destination), Some(cables)) => self.combine_additive(p, preset, cables, destination, sources),
            _ => laws::preset_combination(p, preset),
        };
        self.final_values[slot] = laws::final_value(p, self.neutral_values[slot], combination);
    }

    /// Volume and linear params: unity-centred product of every cable, then
    /// the preset.
    fn combine_multiplicative(
        &self,
        p: ParamId,
        preset: i32,
        cables: &PatchCableSet,
        destination: &Destination,
        sources: &SourceValues,
    ) -> i32 {
        let mut running = UNITY;
        for c in destination.cables() {
            let Some(cable) = cables.cable(c) else {
                continue;
            };
            let source = cable.polarity.apply(sources.get(cable.from));
            let scaled = multiply_32x32_rshift32(source, cable.strength());
            let scaled = cable.apply_range_adjustment(scaled, &self.range_final_values);
            running = laws::multiply_in(running, scaled);
        }
        running = laws::multiply_in(running, laws::preset_combination(p, preset));
        running.saturating_sub(UNITY)
    }

    /// Hybrid and exp params: saturating sum of every cable, then the preset.
    fn combine_additive(
        &self,
        p: ParamId,
        preset: i32,
        cables: &PatchCableSet,
        destination: &Destination,
        sources: &SourceValues,
    ) -> i32 {
        let mut running: i32 = 0;
        for c in destination.cables() {
            let Some(cable) = cables.cable(c) else {
                continue;
            };
            let source = cable.polarity.apply(sources.get(cable.from));
            let scaled = multiply_32x32_rshift32(source, cables.modified_cable_amount(c, p));
            running = running.saturating_add(cable.apply_range_adjustment(scaled, &self.range_final_values));
        }
        if patched::is_wave_index(p) {
            running = lshift_and_saturate(running, 1);
        }
        running.saturating_add(laws::preset_combination(p, preset))
    }
}

#[inline]
fn num_range_destinations(destinations: &[Destination]) -> usize {
    destinations.iter().take_while(|d| d.descriptor.is_range()).count()
}

/// Combine the cables of a range destination into a range multiplier with
/// unity at UNITY.
fn combine_range(cables: &PatchCableSet, destination: &Destination, sources: &SourceValues) -> i32 {
    let mut running = UNITY;
    for c in destination.cables() {
        let Some(cable) = cables.cable(c) else {
            continue;
        };
        let value = sources.get(cable.from);
        // Aftertouch rests at zero, so centre it before it scales a depth.
        let source = if cable.from == PatchSource::Aftertouch {
            value.wrapping_sub(1 << 30).wrapping_shl(1)
        } else {
            cable.polarity.apply(value)
        };
        running = laws::multiply_in(running, multiply_32x32_rshift32(source, cable.strength()));
    }
    laws::final_linear(UNITY, running.saturating_sub(UNITY))
}
