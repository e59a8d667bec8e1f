// src/params/kind.rs
//
// Per-kind policy: how many params a kind has, how values map to knob
// positions, which params show a centre marker and which may be automated or
// interpolated.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::ids::{ParamId, expression, midi, patched, unpatched};

/// The namespace a ParamId belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    Patched,
    UnpatchedSound,
    UnpatchedGlobal,
    Expression,
    PatchCable,
    Midi,
}

/// Whether a patched param is evaluated per voice or once per sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Globality {
    Local = 0,
    Global = 1,
}

impl Globality {
    pub const COUNT: usize = 2;

    #[inline]
    pub fn of_patched(p: ParamId) -> Self {
        if p < patched::FIRST_GLOBAL {
            Globality::Local
        } else {
            Globality::Global
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// How a param's value range is laid out on a 129-detent knob (-64..=64).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnobScale {
    /// Full i32 range, centred on 0.
    Bipolar,
    /// 0..=i32::MAX, knob -64 at zero.
    Unipolar,
    /// Cable strength, -2^30..=2^30.
    CableStrength,
}

const KNOB_MIN: i32 = -64;
const KNOB_MAX: i32 = 64;

impl KnobScale {
    pub fn value_to_knob_pos(self, value: i32) -> i32 {
        let knob = match self {
            KnobScale::Bipolar => ((value >> 24) + 1) >> 1,
            KnobScale::Unipolar => (((value >> 23) + 1) >> 1) - 64,
            KnobScale::CableStrength => value >> 24,
        };
        knob.clamp(KNOB_MIN, KNOB_MAX)
    }

    pub fn knob_pos_to_value(self, knob: i32) -> i32 {
        let knob = knob.clamp(KNOB_MIN, KNOB_MAX);
        match self {
            KnobScale::Bipolar if knob == KNOB_MAX => i32::MAX,
            KnobScale::Bipolar => knob << 25,
            KnobScale::Unipolar if knob == KNOB_MAX => i32::MAX,
            KnobScale::Unipolar => (knob + 64) << 24,
            KnobScale::CableStrength => knob << 24,
        }
    }
}

impl ParamKind {
    /// Number of ids in this kind's namespace. Cable ids are sparse and
    /// counted by the cable set instead.
    pub fn num_params(self) -> usize {
        match self {
            ParamKind::Patched => patched::NUM_PATCHED as usize,
            ParamKind::UnpatchedSound => unpatched::sound::NUM_SOUND as usize,
            ParamKind::UnpatchedGlobal => unpatched::global::NUM_GLOBAL as usize,
            ParamKind::Expression => expression::NUM_DIMENSIONS as usize,
            ParamKind::PatchCable => crate::config::MAX_PATCH_CABLES,
            ParamKind::Midi => midi::NUM_CCS as usize,
        }
    }

    /// Reject ids outside this kind's namespace.
    pub fn check(self, id: ParamId) -> Result<()> {
        let valid = match self {
            ParamKind::PatchCable => crate::patch::CableId::decode(id).is_some(),
            _ => (id as usize) < self.num_params(),
        };
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidParamId { kind: self, id })
        }
    }

    pub fn knob_scale(self, id: ParamId) -> KnobScale {
        match (self, id) {
            (ParamKind::PatchCable, _) => KnobScale::CableStrength,
            (ParamKind::Patched, patched::OSC_A_PW | patched::OSC_B_PW) => KnobScale::Unipolar,
            (
                ParamKind::UnpatchedSound | ParamKind::UnpatchedGlobal,
                unpatched::COMPRESSOR_THRESHOLD,
            ) => KnobScale::Unipolar,
            (ParamKind::Expression, expression::PITCH_BEND) => KnobScale::Bipolar,
            (ParamKind::Expression, _) => KnobScale::Unipolar,
            _ => KnobScale::Bipolar,
        }
    }

    #[inline]
    pub fn value_to_knob_pos(self, id: ParamId, value: i32) -> i32 {
        self.knob_scale(id).value_to_knob_pos(value)
    }

    #[inline]
    pub fn knob_pos_to_value(self, id: ParamId, knob: i32) -> i32 {
        self.knob_scale(id).knob_pos_to_value(knob)
    }

    /// Whether the UI should mark the centre of this param's range.
    pub fn indicates_middle_value(self, id: ParamId) -> bool {
        match self {
            ParamKind::Patched => {
                id == patched::PAN
                    || patched::is_pitch(id)
                    || id == patched::DELAY_FEEDBACK
                    || id == patched::DELAY_RATE
            }
            ParamKind::UnpatchedSound => {
                matches!(id, unpatched::STUTTER_RATE | unpatched::BASS | unpatched::TREBLE)
            }
            ParamKind::UnpatchedGlobal => matches!(
                id,
                unpatched::STUTTER_RATE
                    | unpatched::BASS
                    | unpatched::TREBLE
                    | unpatched::global::DELAY_RATE
                    | unpatched::global::DELAY_AMOUNT
                    | unpatched::global::PAN
                    | unpatched::global::PITCH_ADJUST
            ),
            ParamKind::Expression => id == expression::PITCH_BEND,
            ParamKind::PatchCable => true,
            ParamKind::Midi => id == midi::PITCH_BEND,
        }
    }

    /// Stutter rate is performance-only and never recorded.
    pub fn allows_automation(self, id: ParamId) -> bool {
        !matches!(
            (self, id),
            (ParamKind::UnpatchedSound | ParamKind::UnpatchedGlobal, unpatched::STUTTER_RATE)
        )
    }

    /// Whether automation of this kind ramps between nodes at all.
    pub fn may_interpolate(self) -> bool {
        !matches!(self, ParamKind::Expression)
    }

    /// Whether ramps advance per audio sample rather than per tick.
    pub fn interpolates_by_samples(self) -> bool {
        !matches!(self, ParamKind::Expression | ParamKind::Midi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knob_scales_are_inverse() {
        for scale in [KnobScale::Bipolar, KnobScale::Unipolar, KnobScale::CableStrength] {
            for knob in KNOB_MIN..=KNOB_MAX {
                let value = scale.knob_pos_to_value(knob);
                assert_eq!(scale.value_to_knob_pos(value), knob, "{scale:?} knob {knob}");
            }
        }
    }

    #[test]
    fn test_knob_scales_are_monotonic() {
        for scale in [KnobScale::Bipolar, KnobScale::Unipolar, KnobScale::CableStrength] {
            let mut last = i32::MIN;
            for knob in KNOB_MIN..=KNOB_MAX {
                let value = scale.knob_pos_to_value(knob);
                assert!(value > last || knob == KNOB_MIN);
                last = value;
            }
        }
    }

    #[test]
    fn test_extremes() {
        assert_eq!(KnobScale::Bipolar.value_to_knob_pos(i32::MAX), 64);
        assert_eq!(KnobScale::Bipolar.value_to_knob_pos(i32::MIN), -64);
        assert_eq!(KnobScale::Unipolar.value_to_knob_pos(0), -64);
        assert_eq!(KnobScale::CableStrength.knob_pos_to_value(64), 1 << 30);
    }

    #[test]
    fn test_knob_scale_selection() {
        assert_eq!(ParamKind::Patched.knob_scale(patched::OSC_A_PW), KnobScale::Unipolar);
        assert_eq!(ParamKind::Patched.knob_scale(patched::LPF_FREQ), KnobScale::Bipolar);
        assert_eq!(ParamKind::Expression.knob_scale(expression::TIMBRE), KnobScale::Unipolar);
        assert_eq!(ParamKind::Expression.knob_scale(expression::PITCH_BEND), KnobScale::Bipolar);
    }

    #[test]
    fn test_stutter_rate_not_automatable() {
        assert!(!ParamKind::UnpatchedSound.allows_automation(unpatched::STUTTER_RATE));
        assert!(!ParamKind::UnpatchedGlobal.allows_automation(unpatched::STUTTER_RATE));
        assert!(ParamKind::UnpatchedSound.allows_automation(unpatched::BASS));
        assert!(ParamKind::Patched.allows_automation(0));
    }

    #[test]
    fn test_middle_value_for_global_only_params() {
        assert!(ParamKind::UnpatchedGlobal.indicates_middle_value(unpatched::global::PAN));
        assert!(!ParamKind::UnpatchedSound.indicates_middle_value(unpatched::sound::ARP_RATCHET_AMOUNT));
    }

    #[test]
    fn test_check_rejects_out_of_range() {
        assert!(ParamKind::Patched.check(patched::NUM_PATCHED).is_err());
        assert!(ParamKind::Expression.check(2).is_ok());
        assert_eq!(
            ParamKind::Midi.check(122),
            Err(Error::InvalidParamId { kind: ParamKind::Midi, id: 122 })
        );
    }
}
