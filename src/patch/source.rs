// src/patch/source.rs
//
// Modulation sources and the per-block array of their values.

use serde::{Deserialize, Serialize};

use crate::params::Globality;

/// A modulation source a cable can draw from.
///
/// Sources before `Envelope0` are evaluated once per sound; the rest are
/// evaluated per voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PatchSource {
    LfoGlobal1 = 0,
    LfoGlobal2,
    Sidechain,
    Envelope0,
    Envelope1,
    Envelope2,
    Envelope3,
    LfoLocal1,
    LfoLocal2,
    X,
    Y,
    Aftertouch,
    Velocity,
    Note,
    Random,
}

impl PatchSource {
    pub const COUNT: usize = 15;

    pub const ALL: [PatchSource; Self::COUNT] = [
        PatchSource::LfoGlobal1,
        PatchSource::LfoGlobal2,
        PatchSource::Sidechain,
        PatchSource::Envelope0,
        PatchSource::Envelope1,
        PatchSource::Envelope2,
        PatchSource::Envelope3,
        PatchSource::LfoLocal1,
        PatchSource::LfoLocal2,
        PatchSource::X,
        PatchSource::Y,
        PatchSource::Aftertouch,
        PatchSource::Velocity,
        PatchSource::Note,
        PatchSource::Random,
    ];

    pub const FIRST_LOCAL: PatchSource = PatchSource::Envelope0;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[inline]
    pub fn globality(self) -> Globality {
        if self < Self::FIRST_LOCAL {
            Globality::Global
        } else {
            Globality::Local
        }
    }

    #[inline]
    pub fn mask(self) -> SourceMask {
        SourceMask::of(self)
    }
}

/// A set of PatchSources, one bit each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SourceMask(pub u32);

impl SourceMask {
    pub const NONE: SourceMask = SourceMask(0);
    pub const ALL: SourceMask = SourceMask((1 << PatchSource::COUNT) - 1);

    #[inline]
    pub const fn of(source: PatchSource) -> Self {
        SourceMask(1 << source as u32)
    }

    #[inline]
    pub fn contains(self, source: PatchSource) -> bool {
        self.0 & (1 << source as u32) != 0
    }

    #[inline]
    pub fn intersects(self, other: SourceMask) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn insert(&mut self, source: PatchSource) {
        self.0 |= 1 << source as u32;
    }
}

impl std::ops::BitOr for SourceMask {
    type Output = SourceMask;

    fn bitor(self, rhs: SourceMask) -> SourceMask {
        SourceMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SourceMask {
    fn bitor_assign(&mut self, rhs: SourceMask) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for SourceMask {
    type Output = SourceMask;

    fn bitand(self, rhs: SourceMask) -> SourceMask {
        SourceMask(self.0 & rhs.0)
    }
}

/// Current value of every source, indexed by PatchSource.
///
/// Bipolar sources span the full i32 range. Aftertouch is 0..=i32::MAX.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceValues {
    values: [i32; PatchSource::COUNT],
}

impl SourceValues {
    pub const fn new() -> Self {
        Self {
            values: [0; PatchSource::COUNT],
        }
    }

    #[inline]
    pub fn get(&self, source: PatchSource) -> i32 {
        self.values[source.index()]
    }

    #[inline]
    pub fn set(&mut self, source: PatchSource, value: i32) {
        self.values[source.index()] = value;
    }

    /// Set a value and report which source changed, for `patch_changed`.
    pub fn update(&mut self, source: PatchSource, value: i32) -> SourceMask {
        let slot = &mut self.values[source.index()];
        if *slot == value {
            SourceMask::NONE
        } else {
            *slot = value;
            source.mask()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_index_order() {
        for (i, source) in PatchSource::ALL.iter().enumerate() {
            assert_eq!(source.index(), i);
            assert_eq!(PatchSource::from_index(i), Some(*source));
        }
        assert_eq!(PatchSource::from_index(PatchSource::COUNT), None);
    }

    #[test]
    fn test_globality() {
        assert_eq!(PatchSource::Sidechain.globality(), Globality::Global);
        assert_eq!(PatchSource::Envelope0.globality(), Globality::Local);
        assert_eq!(PatchSource::Random.globality(), Globality::Local);
    }

    #[test]
    fn test_update_reports_only_real_changes() {
        let mut values = SourceValues::new();
        assert_eq!(values.update(PatchSource::Velocity, 5), PatchSource::Velocity.mask());
        assert_eq!(values.update(PatchSource::Velocity, 5), SourceMask::NONE);
    }
}
