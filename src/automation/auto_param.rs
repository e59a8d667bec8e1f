// src/automation/auto_param.rs
//
// One parameter's automation timeline.
//
// An AutoParam is either static (no nodes, `current_value` is the value) or
// automated (one or more nodes, strictly increasing by position). Playback
// walks the nodes with an implicit cursor supplied by the caller as a
// PlayHead; between nodes the current value is advanced by a per-half-tick
// increment so the per-block cost does not depend on the node count.
//
// Every mutation that can change the static/automated state returns an
// AutomationDelta. The owning collection must apply it to its summary.

use crate::error::Result;

use super::node::{AutomationNode, PlayHead, is_strictly_increasing};
use super::snapshot::{AutoParamState, Snapshot};

/// Change in automated/static state caused by one mutation.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomationDelta {
    Unchanged,
    BecameAutomated,
    BecameStatic,
}

impl AutomationDelta {
    pub fn between(was_automated: bool, is_automated: bool) -> Self {
        match (was_automated, is_automated) {
            (false, true) => AutomationDelta::BecameAutomated,
            (true, false) => AutomationDelta::BecameStatic,
            _ => AutomationDelta::Unchanged,
        }
    }
}

/// Allocate an empty Vec with room for `capacity` elements, fallibly.
fn try_vec<T>(capacity: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity)?;
    Ok(v)
}

/// Value at `offset` ticks into a segment of `span` ticks from `a` to `b`.
///
/// Weighted form, so evaluating a mirrored segment at a mirrored offset
/// gives a bit-identical result.
#[inline]
fn interpolate(a: i32, b: i32, offset: u64, span: u64) -> i32 {
    let offset = offset.min(span) as i128;
    let span = span as i128;
    ((a as i128 * (span - offset) + b as i128 * offset) / span) as i32
}

/// Per-half-tick increment that walks from `from` to `to` in `ticks`.
#[inline]
fn half_tick_increment(from: i32, to: i32, ticks: u64) -> i32 {
    if ticks == 0 {
        return 0;
    }
    let half_distance = (to >> 1) as i64 - (from >> 1) as i64;
    (half_distance / ticks as i64) as i32
}

/// Forward distance from `from` to `to` on a loop of `length` ticks.
#[inline]
fn forward_distance(from: u32, to: u32, length: u32) -> u64 {
    if to >= from {
        (to - from) as u64
    } else {
        to as u64 + length as u64 - from as u64
    }
}

/// Mirror `nodes` in time over `length` ticks.
///
/// A node's flag describes the segment to its right, so after reversal each
/// node takes its flag from its old left neighbour; on a step segment it
/// also takes that neighbour's held value.
fn mirrored(nodes: &[AutomationNode], length: u32) -> Result<Vec<AutomationNode>> {
    let n = nodes.len();
    let mut out = try_vec(n)?;
    let mirror = |i: usize| {
        let node = nodes[i];
        let left = nodes[(i + n - 1) % n];
        let pos = ((length as u64 - node.pos as u64) % length as u64) as u32;
        let value = if left.interpolated { node.value } else { left.value };
        AutomationNode::new(pos, value, left.interpolated)
    };

    if nodes[0].pos == 0 {
        out.push(mirror(0));
        out.extend((1..n).rev().map(mirror));
    } else {
        out.extend((0..n).rev().map(mirror));
    }
    Ok(out)
}

/// Automation timeline for one scalar parameter.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AutoParam {
    current_value: i32,
    value_increment_per_half_tick: i32,
    nodes: Vec<AutomationNode>,
}

impl AutoParam {
    pub const fn new(value: i32) -> Self {
        Self {
            current_value: value,
            value_increment_per_half_tick: 0,
            nodes: Vec::new(),
        }
    }

    #[inline]
    pub fn current_value(&self) -> i32 {
        self.current_value
    }

    #[inline]
    pub fn is_automated(&self) -> bool {
        !self.nodes.is_empty()
    }

    #[inline]
    pub fn is_interpolating(&self) -> bool {
        self.value_increment_per_half_tick != 0
    }

    #[inline]
    pub fn nodes(&self) -> &[AutomationNode] {
        &self.nodes
    }

    /// Whether this param differs from a param that was never touched.
    pub fn contains_something(&self, neutral_value: i32) -> bool {
        self.is_automated() || self.current_value != neutral_value
    }

    /// Index of the first node at or after `pos`.
    #[inline]
    fn search(&self, pos: u32) -> usize {
        self.nodes.partition_point(|n| n.pos < pos)
    }

    /// Index of the node whose segment contains `pos`, wrapping to the last.
    ///
    /// Playing reversed, a node exactly at `pos` belongs to the segment on
    /// its left, since that is the one about to be traversed.
    fn segment_start(&self, pos: u32, reversed: bool) -> usize {
        let count = if reversed {
            self.nodes.partition_point(|n| n.pos < pos)
        } else {
            self.nodes.partition_point(|n| n.pos <= pos)
        };
        if count == 0 { self.nodes.len() - 1 } else { count - 1 }
    }

    fn value_at_directional(&self, pos: u32, effective_length: u32, reversed: bool) -> i32 {
        let n = self.nodes.len();
        if n == 0 {
            return self.current_value;
        }

        let li = self.segment_start(pos, reversed);
        let left = self.nodes[li];
        if !left.interpolated || n == 1 {
            return left.value;
        }

        let right = self.nodes[(li + 1) % n];
        let since_left = forward_distance(left.pos, pos, effective_length);
        let span = forward_distance(left.pos, right.pos, effective_length);
        if span == 0 {
            return left.value;
        }
        interpolate(left.value, right.value, since_left, span)
    }

    /// Value at `pos` on a timeline looping every `effective_length` ticks.
    pub fn value_at(&self, pos: u32, effective_length: u32) -> i32 {
        self.value_at_directional(pos, effective_length, false)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Editing
    // ═══════════════════════════════════════════════════════════════════════

    /// Set the value without touching automation (knob turn, static edit).
    ///
    /// Returns whether the value changed.
    pub fn set_current_value(&mut self, value: i32) -> bool {
        let changed = self.current_value != value;
        self.current_value = value;
        changed
    }

    /// Insert a node, overwriting any node already at its position.
    pub fn insert_node(&mut self, node: AutomationNode) -> Result<AutomationDelta> {
        let was = self.is_automated();
        match self.nodes.binary_search_by_key(&node.pos, |n| n.pos) {
            Ok(i) => self.nodes[i] = node,
            Err(i) => {
                self.nodes.try_reserve(1)?;
                self.nodes.insert(i, node);
            }
        }
        Ok(AutomationDelta::between(was, true))
    }

    /// Remove the node at exactly `pos`, if any.
    pub fn delete_node_at(&mut self, pos: u32) -> AutomationDelta {
        let was = self.is_automated();
        if let Ok(i) = self.nodes.binary_search_by_key(&pos, |n| n.pos) {
            self.nodes.remove(i);
        }
        if self.nodes.is_empty() {
            self.value_increment_per_half_tick = 0;
        }
        AutomationDelta::between(was, self.is_automated())
    }

    /// Make the region `[start, start + length)` hold `value`.
    ///
    /// `length == 0`, or a length covering the whole loop, replaces the
    /// entire parameter and leaves it static. Otherwise nodes inside the
    /// region are replaced by a step at `start`, and a node at the region
    /// end resumes the previous curve. Nodes outside the region are kept.
    /// The region wraps at `effective_length`.
    ///
    /// `live` is where playback is, or `None` when stopped. While playing,
    /// the current value only takes `value` if the live position is inside
    /// the region; elsewhere the running value and ramp are left alone.
    pub fn set_value_for_region(
        &mut self,
        value: i32,
        start: u32,
        length: u32,
        effective_length: u32,
        live: Option<PlayHead>,
    ) -> Result<AutomationDelta> {
        let was = self.is_automated();

        if length == 0 || length >= effective_length {
            self.nodes = Vec::new();
            self.value_increment_per_half_tick = 0;
            self.current_value = value;
            return Ok(AutomationDelta::between(was, false));
        }

        if start >= effective_length {
            return Ok(AutomationDelta::Unchanged);
        }

        let raw_end = start as u64 + length as u64;
        let wraps = raw_end >= effective_length as u64;
        let end = if wraps {
            (raw_end - effective_length as u64) as u32
        } else {
            raw_end as u32
        };

        let resume_value = self.value_at(end, effective_length);
        let resume_interpolated =
            self.is_automated() && self.nodes[self.segment_start(end, false)].interpolated;
        let end_node_exists = self.nodes.binary_search_by_key(&end, |n| n.pos).is_ok();

        // Reserve up front so nothing below can fail half-way.
        self.nodes.try_reserve(2)?;

        if wraps {
            self.nodes.retain(|n| n.pos >= end && n.pos < start);
        } else {
            self.nodes.retain(|n| n.pos < start || n.pos >= end);
        }

        self.put_node(AutomationNode::step(start, value));
        if !end_node_exists {
            self.put_node(AutomationNode::new(end, resume_value, resume_interpolated));
        }

        let inside = match live {
            None => true,
            Some(head) => self.nodes[self.segment_start(head.pos, head.reversed)].pos == start,
        };
        if inside {
            self.current_value = value;
            self.value_increment_per_half_tick = 0;
        }
        Ok(AutomationDelta::between(was, true))
    }

    /// Insert or overwrite without allocating. Callers reserve first.
    fn put_node(&mut self, node: AutomationNode) {
        match self.nodes.binary_search_by_key(&node.pos, |n| n.pos) {
            Ok(i) => self.nodes[i] = node,
            Err(i) => self.nodes.insert(i, node),
        }
    }

    /// Drop all automation, keeping the current value.
    pub fn delete_automation(&mut self) -> AutomationDelta {
        let was = self.is_automated();
        self.nodes = Vec::new();
        self.value_increment_per_half_tick = 0;
        AutomationDelta::between(was, false)
    }

    /// Add `offset` to every value, saturating.
    pub fn shift_values(&mut self, offset: i32) {
        for node in &mut self.nodes {
            node.value = node.value.saturating_add(offset);
        }
        self.current_value = self.current_value.saturating_add(offset);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Playback
    // ═══════════════════════════════════════════════════════════════════════

    /// Sample the timeline at `pos` into the current value.
    ///
    /// Returns whether the current value changed. Static params are left
    /// alone.
    pub fn grab_value_from_pos(&mut self, pos: u32, effective_length: u32) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        let old = self.current_value;
        self.current_value = self.value_at(pos, effective_length);
        self.current_value != old
    }

    /// Jump the cursor to `head`, sampling the value there and setting up
    /// interpolation toward the next node in the playing direction.
    pub fn set_play_pos(&mut self, head: PlayHead, may_interpolate: bool) -> bool {
        self.value_increment_per_half_tick = 0;
        let n = self.nodes.len();
        if n == 0 {
            return false;
        }

        let old = self.current_value;
        self.current_value = self.value_at_directional(head.pos, head.length, head.reversed);

        if may_interpolate && n > 1 {
            let li = self.segment_start(head.pos, head.reversed);
            let left = self.nodes[li];
            if left.interpolated {
                let (target, distance) = if head.reversed {
                    (left.value, forward_distance(left.pos, head.pos, head.length))
                } else {
                    let right = self.nodes[(li + 1) % n];
                    (right.value, forward_distance(head.pos, right.pos, head.length))
                };
                self.value_increment_per_half_tick =
                    half_tick_increment(self.current_value, target, distance);
            }
        }

        self.current_value != old
    }

    /// Handle the cursor being at `head.pos`.
    ///
    /// If a node sits exactly there, adopts its value and sets up the ramp to
    /// the next node in the playing direction. Returns the number of ticks
    /// until this param next needs processing.
    pub fn process_current_pos(&mut self, head: PlayHead, may_interpolate: bool) -> i32 {
        let n = self.nodes.len();
        if n == 0 || head.length == 0 {
            return i32::MAX;
        }

        let pos = head.pos;
        let (reached_index, distance) = if head.reversed {
            let count = self.nodes.partition_point(|node| node.pos <= pos);
            let i = if count == 0 { n - 1 } else { count - 1 };
            (i, forward_distance(self.nodes[i].pos, pos, head.length))
        } else {
            let i = self.search(pos);
            let i = if i == n { 0 } else { i };
            (i, forward_distance(pos, self.nodes[i].pos, head.length))
        };

        if distance != 0 {
            return distance.min(i32::MAX as u64) as i32;
        }

        self.value_increment_per_half_tick = 0;
        let reached = self.nodes[reached_index];

        let span = if head.reversed {
            let left = self.nodes[(reached_index + n - 1) % n];
            let span = if n == 1 {
                head.length as u64
            } else {
                forward_distance(left.pos, reached.pos, head.length)
            };
            if left.interpolated && may_interpolate && n > 1 {
                self.current_value = reached.value;
                self.value_increment_per_half_tick =
                    half_tick_increment(reached.value, left.value, span);
            } else {
                self.current_value = left.value;
            }
            span
        } else {
            let right = self.nodes[(reached_index + 1) % n];
            let span = if n == 1 {
                head.length as u64
            } else {
                forward_distance(reached.pos, right.pos, head.length)
            };
            self.current_value = reached.value;
            if reached.interpolated && may_interpolate && n > 1 {
                self.value_increment_per_half_tick =
                    half_tick_increment(reached.value, right.value, span);
            }
            span
        };

        span.clamp(1, i32::MAX as u64) as i32
    }

    /// Add `delta` to the current value. Hitting either end of the range
    /// stops the ramp. Returns whether the current value changed.
    fn apply_ramp_delta(&mut self, delta: i128) -> bool {
        let old = self.current_value;
        let next = old as i128 + delta;
        if next > i32::MAX as i128 || next < i32::MIN as i128 {
            self.value_increment_per_half_tick = 0;
        }
        self.current_value = next.clamp(i32::MIN as i128, i32::MAX as i128) as i32;
        self.current_value != old
    }

    /// Advance an in-progress ramp by whole ticks.
    ///
    /// Returns whether the current value changed.
    pub fn tick_ticks(&mut self, num_ticks: u32) -> bool {
        if self.value_increment_per_half_tick == 0 {
            return false;
        }
        let delta = self.value_increment_per_half_tick as i128 * num_ticks as i128 * 2;
        self.apply_ramp_delta(delta)
    }

    /// Advance an in-progress ramp by audio samples.
    ///
    /// `ticks_per_sample` is the Q32 fraction of a tick elapsed per sample.
    /// Returns whether the current value changed.
    pub fn tick_samples(&mut self, num_samples: u32, ticks_per_sample: u32) -> bool {
        if self.value_increment_per_half_tick == 0 {
            return false;
        }
        let per_tick = self.value_increment_per_half_tick as i128 * 2;
        let delta = (per_tick * ticks_per_sample as i128 * num_samples as i128) >> 32;
        self.apply_ramp_delta(delta)
    }

    /// Playback direction flipped mid-ramp.
    pub fn notify_pingpong_occurred(&mut self) {
        self.value_increment_per_half_tick = -self.value_increment_per_half_tick;
    }

    /// Playback stopped; freeze at the current value.
    pub fn expect_no_further_ticks(&mut self) {
        self.value_increment_per_half_tick = 0;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Timeline restructuring
    // ═══════════════════════════════════════════════════════════════════════

    /// Remove every node at or beyond `new_length`.
    ///
    /// If nodes remain but none sits at 0, a node is added at 0 carrying the
    /// value the timeline had there, so the start of the shortened timeline
    /// sounds as before. `effective_length` is the length before trimming.
    pub fn trim_to_length(&mut self, new_length: u32, effective_length: u32) -> Result<AutomationDelta> {
        if self.nodes.is_empty() {
            return Ok(AutomationDelta::Unchanged);
        }

        let cut = self.search(new_length);
        if cut == self.nodes.len() {
            return Ok(AutomationDelta::Unchanged);
        }

        let value_at_zero = self.value_at(0, effective_length);

        if cut == 0 {
            self.nodes = Vec::new();
            self.value_increment_per_half_tick = 0;
            self.current_value = value_at_zero;
            return Ok(AutomationDelta::BecameStatic);
        }

        let wraps_into_start = self.nodes[self.nodes.len() - 1].interpolated;
        let needs_start_node = self.nodes[0].pos != 0;
        if needs_start_node {
            self.nodes.try_reserve(1)?;
        }

        self.nodes.truncate(cut);
        if needs_start_node {
            self.nodes.insert(0, AutomationNode::new(0, value_at_zero, wraps_into_start));
        }
        Ok(AutomationDelta::Unchanged)
    }

    /// Rotate every node by `amount` ticks around a loop of `effective_length`.
    pub fn shift_horizontally(&mut self, amount: i32, effective_length: u32) {
        if self.nodes.is_empty() || effective_length == 0 {
            return;
        }
        let length = effective_length as i64;
        let amount = (amount as i64).rem_euclid(length) as u32;
        if amount == 0 {
            return;
        }

        debug_assert!(self.nodes.iter().all(|n| n.pos < effective_length));
        let split = self.search(effective_length - amount);
        for node in &mut self.nodes {
            node.pos = ((node.pos as u64 + amount as u64) % effective_length as u64) as u32;
        }
        self.nodes.rotate_left(split);

        if !is_strictly_increasing(&self.nodes) {
            self.normalize();
        }
    }

    /// Fill `new_length` with copies of the first `old_length` ticks.
    ///
    /// With `pingpong`, odd repeats run backwards, which keeps the signal
    /// continuous at every repeat boundary. A trailing partial repeat is cut.
    pub fn generate_repeats(&mut self, old_length: u32, new_length: u32, pingpong: bool) -> Result<()> {
        if self.nodes.is_empty() || old_length == 0 || new_length <= old_length {
            return Ok(());
        }

        let within = self.search(old_length);
        if within == 0 {
            return Ok(());
        }

        let needs_start_node = pingpong && self.nodes[0].pos != 0;
        let mut base = try_vec(within + needs_start_node as usize)?;
        if needs_start_node {
            let last = self.nodes[within - 1];
            let start_value = self.value_at(0, old_length);
            base.push(AutomationNode::new(0, start_value, last.interpolated));
        }
        base.extend_from_slice(&self.nodes[..within]);

        let reversed = if pingpong { mirrored(&base, old_length)? } else { Vec::new() };

        let repeats = new_length.div_ceil(old_length) as usize;
        let mut out = try_vec(base.len() * repeats)?;
        for r in 0..repeats {
            let offset = r as u64 * old_length as u64;
            let source = if pingpong && r % 2 == 1 { &reversed } else { &base };
            for node in source {
                let pos = offset + node.pos as u64;
                if pos >= new_length as u64 {
                    break;
                }
                out.push(AutomationNode::new(pos as u32, node.value, node.interpolated));
            }
        }

        self.nodes = out;
        Ok(())
    }

    /// Move a node entered by a step (not by a ramp) from `pos` by `offset`.
    ///
    /// Wraps at `length_before_loop`; a node already at the destination is
    /// replaced.
    pub fn nudge_non_interpolating_nodes_at_pos(&mut self, pos: u32, offset: i32, length_before_loop: u32) {
        let n = self.nodes.len();
        if n == 0 || length_before_loop == 0 {
            return;
        }
        let Ok(i) = self.nodes.binary_search_by_key(&pos, |node| node.pos) else {
            return;
        };
        if n > 1 && self.nodes[(i + n - 1) % n].interpolated {
            return;
        }

        let new_pos = (pos as i64 + offset as i64).rem_euclid(length_before_loop as i64) as u32;
        let mut node = self.nodes.remove(i);
        node.pos = new_pos;
        // Capacity is unchanged by the remove, so this cannot reallocate.
        self.put_node(node);
    }

    /// Open a gap of `length` ticks at `pos`, pushing later nodes right.
    pub fn insert_time(&mut self, pos: u32, length: u32) {
        for node in self.nodes.iter_mut().filter(|n| n.pos >= pos) {
            node.pos = node.pos.saturating_add(length);
        }
    }

    /// Remove `[pos, pos + length)` and pull later nodes left.
    pub fn delete_time(&mut self, pos: u32, length: u32) -> AutomationDelta {
        let was = self.is_automated();
        let end = pos.saturating_add(length);
        self.nodes.retain(|n| n.pos < pos || n.pos >= end);
        for node in self.nodes.iter_mut().filter(|n| n.pos >= end) {
            node.pos -= length;
        }
        if self.nodes.is_empty() {
            self.value_increment_per_half_tick = 0;
        }
        AutomationDelta::between(was, self.is_automated())
    }

    /// Restore the strictly-increasing invariant after a bulk rewrite.
    /// Later duplicates win.
    fn normalize(&mut self) {
        self.nodes.sort_by_key(|n| n.pos);
        let mut write = 0;
        for read in 0..self.nodes.len() {
            if write > 0 && self.nodes[write - 1].pos == self.nodes[read].pos {
                self.nodes[write - 1] = self.nodes[read];
            } else {
                self.nodes[write] = self.nodes[read];
                write += 1;
            }
        }
        self.nodes.truncate(write);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Cloning, snapshots and persistence
    // ═══════════════════════════════════════════════════════════════════════

    /// Deep copy, optionally dropping automation or reversing it in time.
    pub fn try_clone_with(&self, copy_automation: bool, reverse_with_length: Option<u32>) -> Result<Self> {
        let nodes = if !copy_automation || self.nodes.is_empty() {
            Vec::new()
        } else if let Some(length) = reverse_with_length.filter(|&l| l > 0) {
            mirrored(&self.nodes, length)?
        } else {
            let mut nodes = try_vec(self.nodes.len())?;
            nodes.extend_from_slice(&self.nodes);
            nodes
        };
        Ok(Self {
            current_value: self.current_value,
            value_increment_per_half_tick: 0,
            nodes,
        })
    }

    /// Exchange node list and value with `snapshot` in O(1).
    pub fn swap_state(&mut self, snapshot: &mut Snapshot) -> AutomationDelta {
        let was = self.is_automated();
        std::mem::swap(&mut self.nodes, &mut snapshot.state.nodes);
        std::mem::swap(&mut self.current_value, &mut snapshot.state.value);
        self.value_increment_per_half_tick = 0;
        AutomationDelta::between(was, self.is_automated())
    }

    /// Copy of the current state for later swapping back in.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot::from_state(self.state()?))
    }

    /// Move the state out into a Snapshot, leaving this param static at the
    /// same value.
    pub fn take_snapshot(&mut self) -> (Snapshot, AutomationDelta) {
        let was = self.is_automated();
        let nodes = std::mem::take(&mut self.nodes);
        self.value_increment_per_half_tick = 0;
        let snapshot = Snapshot::from_state(AutoParamState::new(nodes, self.current_value));
        (snapshot, AutomationDelta::between(was, false))
    }

    /// Copy out the raw node list and value.
    pub fn state(&self) -> Result<AutoParamState> {
        let mut nodes = try_vec(self.nodes.len())?;
        nodes.extend_from_slice(&self.nodes);
        Ok(AutoParamState::new(nodes, self.current_value))
    }

    /// Replace everything with `state`. Out-of-order input is sorted and
    /// duplicate positions collapse to the last one given.
    pub fn restore_state(&mut self, state: AutoParamState) -> AutomationDelta {
        let was = self.is_automated();
        self.nodes = state.nodes;
        self.current_value = state.value;
        self.value_increment_per_half_tick = 0;
        if !is_strictly_increasing(&self.nodes) {
            self.normalize();
        }
        AutomationDelta::between(was, self.is_automated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn param_with(nodes: &[AutomationNode]) -> AutoParam {
        let mut param = AutoParam::new(0);
        let _ = param.restore_state(AutoParamState::new(nodes.to_vec(), 0));
        param
    }

    #[test]
    fn test_static_value() {
        let param = AutoParam::new(1234);
        assert!(!param.is_automated());
        assert_eq!(param.value_at(500, 960), 1234);
    }

    #[test]
    fn test_step_holds_left_value() {
        let param = param_with(&[AutomationNode::step(0, 10), AutomationNode::step(100, 20)]);
        assert_eq!(param.value_at(0, 200), 10);
        assert_eq!(param.value_at(99, 200), 10);
        assert_eq!(param.value_at(100, 200), 20);
        assert_eq!(param.value_at(199, 200), 20);
    }

    #[test]
    fn test_left_flag_gates_interpolation() {
        let param = param_with(&[AutomationNode::ramp(0, 0), AutomationNode::step(100, 1000)]);
        assert_eq!(param.value_at(50, 200), 500);
        // Segment from 100 wraps to 0 but the node at 100 is a step.
        assert_eq!(param.value_at(150, 200), 1000);
    }

    #[test]
    fn test_mirrored_half_matches_ascending_half() {
        let param = param_with(&[AutomationNode::ramp(0, 0), AutomationNode::ramp(480, i32::MAX)]);
        assert_eq!(param.value_at(720, 960), param.value_at(240, 960));
        assert_eq!(param.value_at(240, 960), i32::MAX / 2);
    }

    #[test]
    fn test_insert_overwrites_same_position() {
        let mut param = AutoParam::new(0);
        assert_eq!(param.insert_node(AutomationNode::step(10, 1)).unwrap(), AutomationDelta::BecameAutomated);
        assert_eq!(param.insert_node(AutomationNode::step(10, 2)).unwrap(), AutomationDelta::Unchanged);
        assert_eq!(param.nodes(), &[AutomationNode::step(10, 2)]);
    }

    #[test]
    fn test_set_region_whole_length_goes_static() {
        let mut param = param_with(&[AutomationNode::step(0, 1), AutomationNode::step(10, 2)]);
        let delta = param.set_value_for_region(77, 0, 0, 96, None).unwrap();
        assert_eq!(delta, AutomationDelta::BecameStatic);
        assert_eq!(param.current_value(), 77);
        assert!(param.nodes().is_empty());
    }

    #[test]
    fn test_set_region_on_static_param() {
        let mut param = AutoParam::new(5);
        let delta = param.set_value_for_region(50, 24, 24, 96, None).unwrap();
        assert_eq!(delta, AutomationDelta::BecameAutomated);
        assert_eq!(param.nodes(), &[AutomationNode::step(24, 50), AutomationNode::step(48, 5)]);
        assert_eq!(param.value_at(0, 96), 5);
        assert_eq!(param.value_at(30, 96), 50);
        assert_eq!(param.value_at(60, 96), 5);
    }

    #[test]
    fn test_set_region_preserves_outside_nodes() {
        let mut param = param_with(&[
            AutomationNode::step(0, 1),
            AutomationNode::step(30, 2),
            AutomationNode::step(60, 3),
        ]);
        let _ = param.set_value_for_region(9, 20, 20, 96, None).unwrap();
        let positions: Vec<u32> = param.nodes().iter().map(|n| n.pos).collect();
        assert_eq!(positions, vec![0, 20, 40, 60]);
        assert_eq!(param.value_at(45, 96), 2);
        assert_eq!(param.value_at(70, 96), 3);
    }

    #[test]
    fn test_set_region_wraps_loop_end() {
        let mut param = AutoParam::new(0);
        let _ = param.set_value_for_region(9, 90, 12, 96, None).unwrap();
        assert_eq!(param.nodes(), &[AutomationNode::step(6, 0), AutomationNode::step(90, 9)]);
        assert_eq!(param.value_at(2, 96), 9);
        assert_eq!(param.value_at(50, 96), 0);
    }

    #[test]
    fn test_process_forward_ramp() {
        let mut param = param_with(&[AutomationNode::ramp(0, 0), AutomationNode::step(100, 1 << 20)]);
        let ticks = param.process_current_pos(PlayHead::forward(0, 200), true);
        assert_eq!(ticks, 100);
        assert!(param.is_interpolating());
        param.tick_ticks(50);
        let half = 1 << 19;
        assert!((param.current_value() - half).abs() < 200);

        let ticks = param.process_current_pos(PlayHead::forward(100, 200), true);
        assert_eq!(ticks, 100);
        assert_eq!(param.current_value(), 1 << 20);
        assert!(!param.is_interpolating());
    }

    #[test]
    fn test_process_reversed_step_takes_left_value() {
        let mut param = param_with(&[AutomationNode::step(0, 10), AutomationNode::step(100, 20)]);
        let ticks = param.process_current_pos(PlayHead::reversed(100, 200), true);
        assert_eq!(ticks, 100);
        assert_eq!(param.current_value(), 10);
    }

    #[test]
    fn test_process_between_nodes_reports_distance() {
        let mut param = param_with(&[AutomationNode::step(0, 10), AutomationNode::step(100, 20)]);
        assert_eq!(param.process_current_pos(PlayHead::forward(40, 200), true), 60);
        assert_eq!(param.process_current_pos(PlayHead::forward(150, 200), true), 50);
        assert_eq!(param.process_current_pos(PlayHead::reversed(40, 200), true), 40);
    }

    #[test]
    fn test_no_interpolation_when_disallowed() {
        let mut param = param_with(&[AutomationNode::ramp(0, 0), AutomationNode::step(100, 1000)]);
        let _ = param.process_current_pos(PlayHead::forward(0, 200), false);
        assert!(!param.is_interpolating());
    }

    #[test]
    fn test_set_play_pos_mid_ramp() {
        let mut param = param_with(&[AutomationNode::ramp(0, 0), AutomationNode::step(100, 1 << 20)]);
        assert!(param.set_play_pos(PlayHead::forward(50, 200), true));
        assert_eq!(param.current_value(), 1 << 19);
        assert!(param.is_interpolating());
    }

    #[test]
    fn test_tick_ticks_saturates() {
        let mut param = param_with(&[AutomationNode::ramp(0, i32::MAX - 10), AutomationNode::step(1, i32::MIN)]);
        let _ = param.process_current_pos(PlayHead::forward(0, 2), true);
        param.notify_pingpong_occurred();
        param.tick_ticks(1_000);
        assert_eq!(param.current_value(), i32::MAX);
        assert!(!param.is_interpolating());
    }

    #[test]
    fn test_tick_samples_full_range_ramp() {
        let ticks_per_sample = EngineConfig::default().ticks_per_sample;
        let mut param = param_with(&[AutomationNode::ramp(0, i32::MIN), AutomationNode::step(4, i32::MAX)]);
        let _ = param.process_current_pos(PlayHead::forward(0, 8), true);

        assert!(param.tick_samples(512, ticks_per_sample));
        assert!(param.current_value() > i32::MIN);
        assert!(param.current_value() < i32::MAX);
        assert!(param.is_interpolating());

        assert!(param.tick_samples(4096, ticks_per_sample));
        assert_eq!(param.current_value(), i32::MAX);
        assert!(!param.is_interpolating());
        assert!(!param.tick_samples(512, ticks_per_sample));
    }

    #[test]
    fn test_tick_samples_reports_only_real_changes() {
        let mut param = param_with(&[AutomationNode::ramp(0, 0), AutomationNode::step(1000, 2000)]);
        let _ = param.process_current_pos(PlayHead::forward(0, 2000), true);
        assert!(!param.tick_samples(1, 1 << 20));
        assert_eq!(param.current_value(), 0);
        assert!(param.is_interpolating());
    }

    #[test]
    fn test_set_region_away_from_playhead_keeps_ramp() {
        let live = PlayHead::forward(50, 200);
        let mut param = param_with(&[AutomationNode::ramp(0, 0), AutomationNode::step(100, 1 << 20)]);
        assert!(param.set_play_pos(live, true));

        let _ = param.set_value_for_region(-(1 << 30), 150, 10, 200, Some(live)).unwrap();
        assert_eq!(param.current_value(), 1 << 19);
        assert!(param.is_interpolating());

        let _ = param.set_value_for_region(7, 40, 20, 200, Some(live)).unwrap();
        assert_eq!(param.current_value(), 7);
        assert!(!param.is_interpolating());
    }

    #[test]
    fn test_set_region_while_stopped_takes_value() {
        let mut param = param_with(&[AutomationNode::ramp(0, 0), AutomationNode::step(100, 1 << 20)]);
        let _ = param.set_value_for_region(3, 150, 10, 200, None).unwrap();
        assert_eq!(param.current_value(), 3);
    }

    #[test]
    fn test_trim_leaves_nothing_beyond_length() {
        let mut param = param_with(&[
            AutomationNode::step(10, 1),
            AutomationNode::step(50, 2),
            AutomationNode::step(90, 3),
        ]);
        let delta = param.trim_to_length(60, 96).unwrap();
        assert_eq!(delta, AutomationDelta::Unchanged);
        assert!(param.nodes().iter().all(|n| n.pos < 60));
        assert_eq!(param.nodes()[0], AutomationNode::step(0, 3));
    }

    #[test]
    fn test_trim_everything_goes_static() {
        let mut param = param_with(&[AutomationNode::step(50, 2)]);
        let delta = param.trim_to_length(20, 96).unwrap();
        assert_eq!(delta, AutomationDelta::BecameStatic);
        assert_eq!(param.current_value(), 2);
    }

    #[test]
    fn test_shift_horizontally_wraps_and_reorders() {
        let mut param = param_with(&[AutomationNode::step(0, 1), AutomationNode::step(80, 2)]);
        param.shift_horizontally(30, 96);
        assert_eq!(param.nodes(), &[AutomationNode::step(14, 2), AutomationNode::step(30, 1)]);
        param.shift_horizontally(-30, 96);
        assert_eq!(param.nodes(), &[AutomationNode::step(0, 1), AutomationNode::step(80, 2)]);
    }

    #[test]
    fn test_generate_repeats_plain() {
        let mut param = param_with(&[AutomationNode::step(0, 1), AutomationNode::step(10, 2)]);
        param.generate_repeats(20, 50, false).unwrap();
        let positions: Vec<u32> = param.nodes().iter().map(|n| n.pos).collect();
        assert_eq!(positions, vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn test_generate_repeats_pingpong_mirrors() {
        let mut param = param_with(&[AutomationNode::ramp(0, 0), AutomationNode::ramp(240, 1000)]);
        param.generate_repeats(480, 960, true).unwrap();
        for pos in [0u32, 100, 240, 400] {
            assert_eq!(param.value_at(pos, 960), param.value_at(960 - pos, 960));
        }
    }

    #[test]
    fn test_clone_reversed() {
        let param = param_with(&[AutomationNode::step(0, 1), AutomationNode::step(30, 2)]);
        let clone = param.try_clone_with(true, Some(96)).unwrap();
        // Forward: 1 on [0,30), 2 on [30,96). Reversed: 2 on (0,66], 1 after.
        assert_eq!(clone.value_at(10, 96), 2);
        assert_eq!(clone.value_at(80, 96), 1);
    }

    #[test]
    fn test_clone_without_automation() {
        let param = param_with(&[AutomationNode::step(0, 1)]);
        let clone = param.try_clone_with(false, None).unwrap();
        assert!(!clone.is_automated());
        assert_eq!(clone.current_value(), param.current_value());
    }

    #[test]
    fn test_nudge_moves_step_node() {
        let mut param = param_with(&[AutomationNode::step(0, 1), AutomationNode::step(10, 2)]);
        param.nudge_non_interpolating_nodes_at_pos(10, 1, 96);
        assert_eq!(param.nodes()[1].pos, 11);
        // Collides with node at 0 after wrapping backwards.
        param.nudge_non_interpolating_nodes_at_pos(11, -11, 96);
        assert_eq!(param.nodes(), &[AutomationNode::step(0, 2)]);
    }

    #[test]
    fn test_nudge_ignores_ramp_target() {
        let mut param = param_with(&[AutomationNode::ramp(0, 1), AutomationNode::step(10, 2)]);
        param.nudge_non_interpolating_nodes_at_pos(10, 1, 96);
        assert_eq!(param.nodes()[1].pos, 10);
    }

    #[test]
    fn test_insert_and_delete_time() {
        let mut param = param_with(&[AutomationNode::step(0, 1), AutomationNode::step(10, 2)]);
        param.insert_time(5, 10);
        assert_eq!(param.nodes()[1].pos, 20);
        let _ = param.delete_time(5, 10);
        assert_eq!(param.nodes()[1].pos, 10);
        assert_eq!(param.delete_time(0, 20), AutomationDelta::BecameStatic);
    }

    #[test]
    fn test_swap_state_is_involution() {
        let mut param = param_with(&[AutomationNode::step(0, 1), AutomationNode::ramp(10, 2)]);
        let original = param.state().unwrap();
        let mut snapshot = Snapshot::from_state(AutoParamState::new(Vec::new(), 42));

        assert_eq!(param.swap_state(&mut snapshot), AutomationDelta::BecameStatic);
        assert_eq!(param.current_value(), 42);
        assert_eq!(param.swap_state(&mut snapshot), AutomationDelta::BecameAutomated);
        assert_eq!(param.state().unwrap(), original);
    }

    #[test]
    fn test_take_snapshot_leaves_static() {
        let mut param = param_with(&[AutomationNode::step(0, 1)]);
        let (snapshot, delta) = param.take_snapshot();
        assert_eq!(delta, AutomationDelta::BecameStatic);
        assert_eq!(snapshot.state().nodes.len(), 1);
        assert!(!param.is_automated());
    }

    #[test]
    fn test_restore_state_normalizes() {
        let param = param_with(&[
            AutomationNode::step(20, 1),
            AutomationNode::step(5, 2),
            AutomationNode::step(20, 3),
        ]);
        assert_eq!(param.nodes(), &[AutomationNode::step(5, 2), AutomationNode::step(20, 3)]);
    }

    #[test]
    fn test_contains_something() {
        let mut param = AutoParam::new(0);
        assert!(!param.contains_something(0));
        param.set_current_value(3);
        assert!(param.contains_something(0));
    }

    #[test]
    fn test_shift_values_saturates() {
        let mut param = param_with(&[AutomationNode::step(0, i32::MAX - 1)]);
        param.shift_values(10);
        assert_eq!(param.nodes()[0].value, i32::MAX);
    }
}
