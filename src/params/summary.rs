// src/params/summary.rs
//
// Bitmask records of which params in a collection are automated and which
// are mid-ramp. These let per-block work skip idle params and whole idle
// collections in O(1).

use crate::automation::AutomationDelta;

const WORDS: usize = 5;

/// Fixed-size bitset wide enough for any collection (up to 160 params).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamBits {
    words: [u32; WORDS],
}

impl ParamBits {
    pub const CAPACITY: usize = WORDS * 32;

    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    #[inline]
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < Self::CAPACITY);
        self.words[index >> 5] |= 1 << (index & 31);
    }

    #[inline]
    pub fn clear(&mut self, index: usize) {
        debug_assert!(index < Self::CAPACITY);
        self.words[index >> 5] &= !(1 << (index & 31));
    }

    #[inline]
    pub fn assign(&mut self, index: usize, on: bool) {
        if on {
            self.set(index);
        } else {
            self.clear(index);
        }
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index < Self::CAPACITY && self.words[index >> 5] & (1 << (index & 31)) != 0
    }

    #[inline]
    pub fn any(&self) -> bool {
        self.words.iter().any(|&w| w != 0)
    }

    #[inline]
    pub fn clear_all(&mut self) {
        self.words = [0; WORDS];
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Indices of set bits, ascending.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut remaining = word;
            std::iter::from_fn(move || {
                if remaining == 0 {
                    return None;
                }
                let bit = remaining.trailing_zeros() as usize;
                remaining &= remaining - 1;
                Some((i << 5) + bit)
            })
        })
    }

    /// Return the current bits and reset to empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        for (a, b) in out.words.iter_mut().zip(other.words.iter()) {
            *a |= *b;
        }
        out
    }
}

/// Which params of one collection are automated and which are interpolating.
///
/// Invariant: `interpolating` is a subset of `automated`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamCollectionSummary {
    pub automated: ParamBits,
    pub interpolating: ParamBits,
}

impl ParamCollectionSummary {
    pub const fn new() -> Self {
        Self {
            automated: ParamBits::new(),
            interpolating: ParamBits::new(),
        }
    }

    /// Record the outcome of one AutoParam mutation.
    #[inline]
    pub fn apply(&mut self, index: usize, delta: AutomationDelta) {
        match delta {
            AutomationDelta::Unchanged => {}
            AutomationDelta::BecameAutomated => self.automated.set(index),
            AutomationDelta::BecameStatic => {
                self.automated.clear(index);
                self.interpolating.clear(index);
            }
        }
    }

    #[inline]
    pub fn set_interpolating(&mut self, index: usize, on: bool) {
        self.interpolating.assign(index, on && self.automated.contains(index));
    }

    #[inline]
    pub fn any_automated(&self) -> bool {
        self.automated.any()
    }

    #[inline]
    pub fn any_interpolating(&self) -> bool {
        self.interpolating.any()
    }

    pub fn reset(&mut self) {
        self.automated.clear_all();
        self.interpolating.clear_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter_spans_words() {
        let mut bits = ParamBits::new();
        for i in [0, 31, 32, 77, 159] {
            bits.set(i);
        }
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![0, 31, 32, 77, 159]);
        assert_eq!(bits.count(), 5);
    }

    #[test]
    fn test_take_clears() {
        let mut bits = ParamBits::new();
        bits.set(3);
        let taken = bits.take();
        assert!(taken.contains(3));
        assert!(!bits.any());
    }

    #[test]
    fn test_apply_static_clears_interpolating() {
        let mut summary = ParamCollectionSummary::new();
        summary.apply(4, AutomationDelta::BecameAutomated);
        summary.set_interpolating(4, true);
        assert!(summary.any_interpolating());
        summary.apply(4, AutomationDelta::BecameStatic);
        assert!(!summary.any_automated());
        assert!(!summary.any_interpolating());
    }

    #[test]
    fn test_interpolating_requires_automated() {
        let mut summary = ParamCollectionSummary::new();
        summary.set_interpolating(9, true);
        assert!(!summary.any_interpolating());
    }
}
