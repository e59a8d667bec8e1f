// src/params/ids.rs
//
// Parameter id namespaces.
//
// Each ParamKind numbers its params from 0. For contexts that need a single
// number (persistence keys, logging) every kind also owns a disjoint flat
// range, checked at compile time below.

/// Parameter identifier, scoped by its ParamKind.
pub type ParamId = u32;

// ═══════════════════════════════════════════════════════════════════════════
// Patched params
// ═══════════════════════════════════════════════════════════════════════════

/// Params that patch cables can modulate.
///
/// Ordered by combination law: volume, then linear, hybrid, exponential.
/// Local (per-voice) params come before global ones and each half keeps the
/// same law ordering.
pub mod patched {
    use super::ParamId;

    // Local, volume law
    pub const OSC_A_VOLUME: ParamId = 0;
    pub const OSC_B_VOLUME: ParamId = 1;
    pub const VOLUME: ParamId = 2;
    pub const NOISE_VOLUME: ParamId = 3;
    pub const MOD0_VOLUME: ParamId = 4;
    pub const MOD1_VOLUME: ParamId = 5;
    pub const FOLD: ParamId = 6;

    // Local, linear law
    pub const FIRST_LOCAL_NON_VOLUME: ParamId = 7;
    pub const MOD0_FEEDBACK: ParamId = 7;
    pub const MOD1_FEEDBACK: ParamId = 8;
    pub const CARRIER0_FEEDBACK: ParamId = 9;
    pub const CARRIER1_FEEDBACK: ParamId = 10;
    pub const LPF_RES: ParamId = 11;
    pub const HPF_RES: ParamId = 12;
    pub const ENV0_SUSTAIN: ParamId = 13;
    pub const ENV1_SUSTAIN: ParamId = 14;
    pub const LPF_MORPH: ParamId = 15;
    pub const HPF_MORPH: ParamId = 16;

    // Local, hybrid law
    pub const FIRST_LOCAL_HYBRID: ParamId = 17;
    pub const OSC_A_PW: ParamId = 17;
    pub const OSC_B_PW: ParamId = 18;
    pub const OSC_A_WAVE_INDEX: ParamId = 19;
    pub const OSC_B_WAVE_INDEX: ParamId = 20;
    pub const PAN: ParamId = 21;

    // Local, exponential law
    pub const FIRST_LOCAL_EXP: ParamId = 22;
    pub const LPF_FREQ: ParamId = 22;
    pub const PITCH_ADJUST: ParamId = 23;
    pub const OSC_A_PITCH_ADJUST: ParamId = 24;
    pub const OSC_B_PITCH_ADJUST: ParamId = 25;
    pub const MOD0_PITCH_ADJUST: ParamId = 26;
    pub const MOD1_PITCH_ADJUST: ParamId = 27;
    pub const HPF_FREQ: ParamId = 28;
    pub const LFO_LOCAL_FREQ: ParamId = 29;
    pub const ENV0_ATTACK: ParamId = 30;
    pub const ENV1_ATTACK: ParamId = 31;
    pub const ENV0_DECAY: ParamId = 32;
    pub const ENV1_DECAY: ParamId = 33;
    pub const ENV0_RELEASE: ParamId = 34;
    pub const ENV1_RELEASE: ParamId = 35;

    // Global, volume law
    pub const FIRST_GLOBAL: ParamId = 36;
    pub const VOLUME_POST_FX: ParamId = 36;
    pub const VOLUME_POST_REVERB_SEND: ParamId = 37;
    pub const REVERB_AMOUNT: ParamId = 38;
    pub const MOD_FX_DEPTH: ParamId = 39;

    // Global, linear law
    pub const FIRST_GLOBAL_NON_VOLUME: ParamId = 40;
    pub const DELAY_FEEDBACK: ParamId = 40;

    // Global, exponential law. There are no global hybrid params.
    pub const FIRST_GLOBAL_HYBRID: ParamId = 41;
    pub const FIRST_GLOBAL_EXP: ParamId = 41;
    pub const DELAY_RATE: ParamId = 41;
    pub const MOD_FX_RATE: ParamId = 42;
    pub const LFO_FREQ: ParamId = 43;
    pub const ARP_RATE: ParamId = 44;

    pub const NUM_PATCHED: ParamId = 45;

    const _: () = assert!(FIRST_LOCAL_NON_VOLUME < FIRST_LOCAL_HYBRID);
    const _: () = assert!(FIRST_LOCAL_HYBRID < FIRST_LOCAL_EXP);
    const _: () = assert!(FIRST_LOCAL_EXP < FIRST_GLOBAL);
    const _: () = assert!(FIRST_GLOBAL < FIRST_GLOBAL_NON_VOLUME);
    const _: () = assert!(FIRST_GLOBAL_NON_VOLUME < FIRST_GLOBAL_HYBRID);
    const _: () = assert!(FIRST_GLOBAL_HYBRID <= FIRST_GLOBAL_EXP);
    const _: () = assert!(FIRST_GLOBAL_EXP < NUM_PATCHED);
    // Cable descriptors store the param in 8 bits.
    const _: () = assert!(NUM_PATCHED < 256);

    #[inline]
    pub fn is_pitch(p: ParamId) -> bool {
        matches!(
            p,
            PITCH_ADJUST | OSC_A_PITCH_ADJUST | OSC_B_PITCH_ADJUST | MOD0_PITCH_ADJUST | MOD1_PITCH_ADJUST
        )
    }

    #[inline]
    pub fn is_wave_index(p: ParamId) -> bool {
        matches!(p, OSC_A_WAVE_INDEX | OSC_B_WAVE_INDEX)
    }

    #[inline]
    pub fn is_env_attack(p: ParamId) -> bool {
        matches!(p, ENV0_ATTACK | ENV1_ATTACK)
    }

    /// Envelope time params whose rate falls as the param rises.
    #[inline]
    pub fn is_env_time(p: ParamId) -> bool {
        matches!(
            p,
            ENV0_ATTACK | ENV1_ATTACK | ENV0_DECAY | ENV1_DECAY | ENV0_RELEASE | ENV1_RELEASE
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unpatched params
// ═══════════════════════════════════════════════════════════════════════════

/// Params no cable can reach. Sound and global-effectable collections share
/// the first NUM_SHARED ids and then diverge.
pub mod unpatched {
    use super::ParamId;

    pub const STUTTER_RATE: ParamId = 0;
    pub const BASS: ParamId = 1;
    pub const TREBLE: ParamId = 2;
    pub const BASS_FREQ: ParamId = 3;
    pub const TREBLE_FREQ: ParamId = 4;
    pub const SAMPLE_RATE_REDUCTION: ParamId = 5;
    pub const BITCRUSHING: ParamId = 6;
    pub const MOD_FX_OFFSET: ParamId = 7;
    pub const MOD_FX_FEEDBACK: ParamId = 8;
    pub const SIDECHAIN_SHAPE: ParamId = 9;
    pub const COMPRESSOR_THRESHOLD: ParamId = 10;

    pub const NUM_SHARED: ParamId = 11;

    /// Extra params owned by a synth or sample sound.
    pub mod sound {
        use super::{NUM_SHARED, ParamId};

        pub const ARP_GATE: ParamId = NUM_SHARED;
        pub const ARP_RATCHET_PROBABILITY: ParamId = NUM_SHARED + 1;
        pub const ARP_RATCHET_AMOUNT: ParamId = NUM_SHARED + 2;
        pub const ARP_SEQUENCE_LENGTH: ParamId = NUM_SHARED + 3;
        pub const ARP_RHYTHM: ParamId = NUM_SHARED + 4;
        pub const PORTAMENTO: ParamId = NUM_SHARED + 5;

        pub const NUM_SOUND: ParamId = NUM_SHARED + 6;
    }

    /// Extra params owned by a global-effectable (kit, audio track, song).
    pub mod global {
        use super::{NUM_SHARED, ParamId};

        pub const MOD_FX_RATE: ParamId = NUM_SHARED;
        pub const MOD_FX_DEPTH: ParamId = NUM_SHARED + 1;
        pub const DELAY_RATE: ParamId = NUM_SHARED + 2;
        pub const DELAY_AMOUNT: ParamId = NUM_SHARED + 3;
        pub const PAN: ParamId = NUM_SHARED + 4;
        pub const LPF_FREQ: ParamId = NUM_SHARED + 5;
        pub const LPF_RES: ParamId = NUM_SHARED + 6;
        pub const LPF_MORPH: ParamId = NUM_SHARED + 7;
        pub const HPF_FREQ: ParamId = NUM_SHARED + 8;
        pub const HPF_RES: ParamId = NUM_SHARED + 9;
        pub const HPF_MORPH: ParamId = NUM_SHARED + 10;
        pub const REVERB_SEND_AMOUNT: ParamId = NUM_SHARED + 11;
        pub const VOLUME: ParamId = NUM_SHARED + 12;
        pub const SIDECHAIN_VOLUME: ParamId = NUM_SHARED + 13;
        pub const PITCH_ADJUST: ParamId = NUM_SHARED + 14;
        pub const TEMPO: ParamId = NUM_SHARED + 15;

        pub const NUM_GLOBAL: ParamId = NUM_SHARED + 16;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Expression and MIDI params
// ═══════════════════════════════════════════════════════════════════════════

/// Per-note (MPE) expression dimensions.
pub mod expression {
    use super::ParamId;

    pub const PITCH_BEND: ParamId = 0;
    pub const TIMBRE: ParamId = 1;
    pub const PRESSURE: ParamId = 2;

    pub const NUM_DIMENSIONS: ParamId = 3;
}

/// MIDI CC numbers, with two pseudo-CCs above the real range.
pub mod midi {
    use super::ParamId;

    pub const NUM_REAL_CCS: ParamId = 120;
    pub const PITCH_BEND: ParamId = 120;
    pub const CHANNEL_PRESSURE: ParamId = 121;

    pub const NUM_CCS: ParamId = 122;
}

// ═══════════════════════════════════════════════════════════════════════════
// Flat ranges
// ═══════════════════════════════════════════════════════════════════════════

pub mod flat {
    use super::{ParamId, expression, midi, patched, unpatched};

    pub const PATCHED_START: u32 = 0;
    /// Placeholder for a cable's range (depth) as a modulation target.
    pub const PLACEHOLDER_RANGE: u32 = 89;
    pub const UNPATCHED_START: u32 = 90;
    pub const EXPRESSION_START: u32 = 162;
    pub const PATCH_CABLE: u32 = 190;
    pub const MIDI_START: u32 = 200;
    pub const END: u32 = MIDI_START + midi::NUM_CCS;

    const fn max(a: ParamId, b: ParamId) -> ParamId {
        if a > b { a } else { b }
    }

    const NUM_UNPATCHED: ParamId = max(unpatched::sound::NUM_SOUND, unpatched::global::NUM_GLOBAL);

    const _: () = assert!(PATCHED_START + patched::NUM_PATCHED <= PLACEHOLDER_RANGE);
    const _: () = assert!(PLACEHOLDER_RANGE < UNPATCHED_START);
    const _: () = assert!(UNPATCHED_START + NUM_UNPATCHED <= EXPRESSION_START);
    const _: () = assert!(EXPRESSION_START + expression::NUM_DIMENSIONS <= PATCH_CABLE);
    const _: () = assert!(PATCH_CABLE < MIDI_START);
}
