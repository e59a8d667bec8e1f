// src/patch/laws.rs
//
// Per-param tables and the four laws that turn a combined modulation into a
// final value.
//
// A "combination" is the summed or multiplied deviation from neutral built
// by the patcher. Multiplicative laws carry it as (factor - UNITY), so a
// combination of 0 always means "no change".

use crate::fixed::{UNITY, get_exp, multiply_32x32_rshift32, multiply_unity_scaled, signed_saturate};
use crate::params::ParamId;
use crate::params::ids::patched::*;

/// How cables and preset combine for a param.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Law {
    /// Multiplicative, squared before scaling neutral.
    Volume,
    /// Multiplicative.
    Linear,
    /// Additive on neutral.
    Hybrid,
    /// Additive in the log domain, then exponentiated.
    Exp,
}

impl Law {
    pub fn of(p: ParamId) -> Self {
        let (non_volume, hybrid, exp) = if p < FIRST_GLOBAL {
            (FIRST_LOCAL_NON_VOLUME, FIRST_LOCAL_HYBRID, FIRST_LOCAL_EXP)
        } else {
            (FIRST_GLOBAL_NON_VOLUME, FIRST_GLOBAL_HYBRID, FIRST_GLOBAL_EXP)
        };
        if p < non_volume {
            Law::Volume
        } else if p < hybrid {
            Law::Linear
        } else if p < exp {
            Law::Hybrid
        } else {
            Law::Exp
        }
    }

    #[inline]
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Law::Volume | Law::Linear)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tables
// ═══════════════════════════════════════════════════════════════════════════

/// Strength with which the preset joins the combination.
pub fn param_range(p: ParamId) -> i32 {
    match p {
        ENV0_ATTACK | ENV1_ATTACK => 805_306_368,
        DELAY_RATE => 1 << 29,
        p if is_pitch(p) => 1 << 29,
        LPF_FREQ => 751_619_276,
        _ => 1 << 30,
    }
}

/// The value a param takes with preset 0 and nothing patched to it.
pub fn default_neutral_value(p: ParamId) -> i32 {
    match p {
        OSC_A_VOLUME | OSC_B_VOLUME | VOLUME | NOISE_VOLUME | VOLUME_POST_FX | VOLUME_POST_REVERB_SEND
        | REVERB_AMOUNT => 134_217_728,
        MOD0_VOLUME | MOD1_VOLUME => 33_554_432,
        LPF_FREQ => 2_000_000,
        HPF_FREQ => 2_672_947,
        LFO_LOCAL_FREQ | LFO_FREQ | MOD_FX_RATE => 121_739,
        LPF_RES | HPF_RES | LPF_MORPH | HPF_MORPH | FOLD => 268_435_450,
        PAN | OSC_A_PW | OSC_B_PW => 0,
        ENV0_ATTACK | ENV1_ATTACK => 4096,
        ENV0_RELEASE | ENV1_RELEASE => 140 << 9,
        ENV0_DECAY | ENV1_DECAY => 70 << 9,
        ENV0_SUSTAIN | ENV1_SUSTAIN | DELAY_FEEDBACK => 1 << 30,
        MOD0_FEEDBACK | MOD1_FEEDBACK | CARRIER0_FEEDBACK | CARRIER1_FEEDBACK => 5_931_642,
        DELAY_RATE | ARP_RATE => 16_777_216,
        p if is_pitch(p) => 16_777_216,
        MOD_FX_DEPTH => 526_133_494,
        _ => 0,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Combination steps
// ═══════════════════════════════════════════════════════════════════════════

/// The preset's share of a combination.
#[inline]
pub fn preset_combination(p: ParamId, preset: i32) -> i32 {
    multiply_32x32_rshift32(preset, param_range(p))
}

/// Fold one unity-centred contribution into a running product.
#[inline]
pub fn multiply_in(running: i32, contribution: i32) -> i32 {
    multiply_unity_scaled(running, contribution.saturating_add(UNITY))
}

// ═══════════════════════════════════════════════════════════════════════════
// Final laws
// ═══════════════════════════════════════════════════════════════════════════

#[inline]
pub fn final_volume(neutral: i32, combination: i32) -> i32 {
    let factor = combination.saturating_add(UNITY);
    multiply_unity_scaled(multiply_unity_scaled(factor, factor), neutral)
}

#[inline]
pub fn final_linear(neutral: i32, combination: i32) -> i32 {
    multiply_unity_scaled(combination.saturating_add(UNITY), neutral)
}

#[inline]
pub fn final_hybrid(neutral: i32, combination: i32) -> i32 {
    signed_saturate((neutral >> 2) + (combination >> 1), 30) << 2
}

/// Envelope times run backwards: a higher param means a slower rate.
#[inline]
pub fn final_exp(p: ParamId, neutral: i32, combination: i32) -> i32 {
    let adjustment = if is_env_time(p) {
        combination.saturating_neg()
    } else {
        combination
    };
    get_exp(neutral, adjustment)
}

pub fn final_value(p: ParamId, neutral: i32, combination: i32) -> i32 {
    match Law::of(p) {
        Law::Volume => final_volume(neutral, combination),
        Law::Linear => final_linear(neutral, combination),
        Law::Hybrid => final_hybrid(neutral, combination),
        Law::Exp => final_exp(p, neutral, combination),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_law_ordering() {
        assert_eq!(Law::of(VOLUME), Law::Volume);
        assert_eq!(Law::of(LPF_RES), Law::Linear);
        assert_eq!(Law::of(PAN), Law::Hybrid);
        assert_eq!(Law::of(LPF_FREQ), Law::Exp);
        assert_eq!(Law::of(REVERB_AMOUNT), Law::Volume);
        assert_eq!(Law::of(DELAY_FEEDBACK), Law::Linear);
        assert_eq!(Law::of(DELAY_RATE), Law::Exp);
    }

    #[test]
    fn test_zero_combination_is_neutral() {
        for p in 0..NUM_PATCHED {
            let neutral = default_neutral_value(p);
            match Law::of(p) {
                Law::Volume | Law::Linear => assert_eq!(final_value(p, neutral, 0), neutral),
                Law::Hybrid => assert_eq!(final_value(p, neutral, 0), neutral & !3),
                // The exp table holds 2^0 exactly; only sub-quantum bits drop.
                Law::Exp => assert!((final_value(p, neutral, 0) - neutral).abs() <= 4),
            }
        }
    }

    #[test]
    fn test_volume_squares() {
        // A factor of 1.5 gives 2.25 once squared.
        assert_eq!(final_volume(1 << 20, UNITY / 2), 2_359_296);
        assert_eq!(final_linear(1 << 20, UNITY / 2), 1_572_864);
    }

    #[test]
    fn test_env_time_runs_backwards() {
        let neutral = default_neutral_value(ENV0_RELEASE);
        assert!(final_exp(ENV0_RELEASE, neutral, 1 << 26) < neutral);
        let neutral = default_neutral_value(LPF_FREQ);
        assert!(final_exp(LPF_FREQ, neutral, 1 << 26) > neutral);
    }

    #[test]
    fn test_multiply_in_is_order_independent() {
        let a = 123_456_789;
        let b = -98_765_432;
        assert_eq!(multiply_in(multiply_in(UNITY, a), b), multiply_in(multiply_in(UNITY, b), a));
    }
}
