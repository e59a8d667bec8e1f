// src/patch/destination.rs
//
// A run of cables that share a destination.

use super::cable::DestinationDescriptor;
use super::source::SourceMask;

/// Cables `first_cable..end_cable` of the cable set, all going to
/// `descriptor`.
///
/// `sources` is the set whose change must trigger recomputation: the
/// cables' own sources, plus for a range destination the source of the
/// cable it adjusts, plus for an adjusted destination the sources of its
/// range destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub descriptor: DestinationDescriptor,
    pub first_cable: usize,
    pub end_cable: usize,
    pub sources: SourceMask,
}

impl Destination {
    #[inline]
    pub fn cables(&self) -> std::ops::Range<usize> {
        self.first_cable..self.end_cable
    }

    #[inline]
    pub fn num_cables(&self) -> usize {
        self.end_cable - self.first_cable
    }
}
