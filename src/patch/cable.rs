// src/patch/cable.rs
//
// Patch cables and the descriptors that say where they go.

use serde::{Deserialize, Serialize};

use crate::automation::AutoParam;
use crate::error::Result;
use crate::fixed::multiply_unity_scaled;
use crate::params::{Globality, ParamId, ids::patched};

use super::source::PatchSource;

/// Where a cable delivers its signal.
///
/// `CableRange` targets the depth of another cable (the one from `source`
/// to `param`). Range descriptors order before param descriptors, and param
/// descriptors order by param, which is the order the patcher walks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DestinationDescriptor {
    CableRange { source: PatchSource, param: ParamId },
    Param(ParamId),
}

impl DestinationDescriptor {
    /// The patched param this ultimately affects.
    #[inline]
    pub fn param(self) -> ParamId {
        match self {
            DestinationDescriptor::CableRange { param, .. } | DestinationDescriptor::Param(param) => param,
        }
    }

    #[inline]
    pub fn is_range(self) -> bool {
        matches!(self, DestinationDescriptor::CableRange { .. })
    }

    #[inline]
    pub fn globality(self) -> Globality {
        Globality::of_patched(self.param())
    }

    /// For a range descriptor, the descriptor of the cable it adjusts.
    pub fn adjusted_cable(self) -> Option<(PatchSource, DestinationDescriptor)> {
        match self {
            DestinationDescriptor::CableRange { source, param } => {
                Some((source, DestinationDescriptor::Param(param)))
            }
            DestinationDescriptor::Param(_) => None,
        }
    }
}

/// How a source's value is shaped before a cable scales it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    #[default]
    Bipolar,
    /// Shift the full range into 0..i32::MAX.
    Unipolar,
}

impl Polarity {
    #[inline]
    pub fn apply(self, value: i32) -> i32 {
        match self {
            Polarity::Bipolar => value,
            Polarity::Unipolar => (value >> 1) + (1 << 30),
        }
    }
}

/// A cable's identity packed into a ParamId, as the cable-strength
/// collection exposes it.
///
/// Bits 0..8 hold the param, 8..16 the source, 16..24 the range source plus
/// one (0 for a direct cable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CableId {
    pub source: PatchSource,
    pub destination: DestinationDescriptor,
}

impl CableId {
    pub fn new(source: PatchSource, destination: DestinationDescriptor) -> Self {
        Self { source, destination }
    }

    pub fn encode(self) -> ParamId {
        let range_bits = match self.destination {
            DestinationDescriptor::CableRange { source, .. } => source as u32 + 1,
            DestinationDescriptor::Param(_) => 0,
        };
        self.destination.param() | (self.source as u32) << 8 | range_bits << 16
    }

    pub fn decode(id: ParamId) -> Option<Self> {
        if id >> 24 != 0 {
            return None;
        }
        let param = id & 0xFF;
        if param >= patched::NUM_PATCHED {
            return None;
        }
        let source = PatchSource::from_index(((id >> 8) & 0xFF) as usize)?;
        let destination = match (id >> 16) & 0xFF {
            0 => DestinationDescriptor::Param(param),
            n => DestinationDescriptor::CableRange {
                source: PatchSource::from_index(n as usize - 1)?,
                param,
            },
        };
        Some(Self { source, destination })
    }
}

/// One routing from a source to a destination, with automatable strength.
#[derive(Debug, PartialEq, Eq)]
pub struct PatchCable {
    pub from: PatchSource,
    pub destination: DestinationDescriptor,
    pub polarity: Polarity,
    /// Strength, nominally -2^30..=2^30.
    pub(crate) param: AutoParam,
    /// Slot in the range-final scratch array when another cable adjusts
    /// this one's depth.
    pub(crate) range_adjustment: Option<usize>,
}

impl PatchCable {
    pub fn new(from: PatchSource, destination: DestinationDescriptor, strength: i32) -> Self {
        Self {
            from,
            destination,
            polarity: Polarity::default(),
            param: AutoParam::new(strength),
            range_adjustment: None,
        }
    }

    #[inline]
    pub fn id(&self) -> CableId {
        CableId::new(self.from, self.destination)
    }

    #[inline]
    pub fn strength(&self) -> i32 {
        self.param.current_value()
    }

    /// Scale an already strength-scaled contribution by this cable's range
    /// adjustment. Unadjusted cables pass through unchanged.
    #[inline]
    pub fn apply_range_adjustment(&self, value: i32, range_final_values: &[i32]) -> i32 {
        match self.range_adjustment.and_then(|i| range_final_values.get(i)) {
            Some(&range) => multiply_unity_scaled(value, range),
            None => value,
        }
    }

    pub fn try_clone_with(&self, copy_automation: bool, reverse_with_length: Option<u32>) -> Result<Self> {
        Ok(Self {
            from: self.from,
            destination: self.destination,
            polarity: self.polarity,
            param: self.param.try_clone_with(copy_automation, reverse_with_length)?,
            range_adjustment: self.range_adjustment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_descriptors_sort_first() {
        let mut descriptors = vec![
            DestinationDescriptor::Param(patched::LPF_FREQ),
            DestinationDescriptor::Param(patched::VOLUME),
            DestinationDescriptor::CableRange { source: PatchSource::Velocity, param: patched::PAN },
        ];
        descriptors.sort();
        assert!(descriptors[0].is_range());
        assert_eq!(descriptors[1], DestinationDescriptor::Param(patched::VOLUME));
    }

    #[test]
    fn test_cable_id_encoding() {
        let direct = CableId::new(PatchSource::Envelope1, DestinationDescriptor::Param(patched::LPF_FREQ));
        assert_eq!(direct.encode(), patched::LPF_FREQ | 4 << 8);
        assert_eq!(CableId::decode(direct.encode()), Some(direct));

        let range = CableId::new(
            PatchSource::Aftertouch,
            DestinationDescriptor::CableRange { source: PatchSource::LfoLocal1, param: patched::PAN },
        );
        assert_eq!(CableId::decode(range.encode()), Some(range));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(CableId::decode(patched::NUM_PATCHED), None);
        assert_eq!(CableId::decode(40 << 8), None);
        assert_eq!(CableId::decode(1 << 24), None);
    }

    #[test]
    fn test_unipolar_maps_into_positive_range() {
        assert_eq!(Polarity::Unipolar.apply(i32::MIN), 0);
        assert_eq!(Polarity::Unipolar.apply(0), 1 << 30);
        assert_eq!(Polarity::Unipolar.apply(i32::MAX), i32::MAX);
        assert_eq!(Polarity::Bipolar.apply(-5), -5);
    }

    #[test]
    fn test_range_adjustment() {
        let mut cable = PatchCable::new(PatchSource::X, DestinationDescriptor::Param(patched::PAN), 0);
        assert_eq!(cable.apply_range_adjustment(12345, &[]), 12345);
        cable.range_adjustment = Some(1);
        // Second slot holds half of unity.
        assert_eq!(cable.apply_range_adjustment(1 << 20, &[0, 1 << 28]), 1 << 19);
    }
}
