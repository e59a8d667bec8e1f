// src/config.rs
//
// Engine-wide configuration.
//
// Loaded once by the host (typically from its settings store) and passed
// explicitly to the constructors that need it. Nothing here is read from
// global state.

use log::warn;
use serde::{Deserialize, Serialize};

/// Hard upper bound on cables: one bit per cable in a u32 summary word.
pub const MAX_PATCH_CABLES: usize = 32;

const DEFAULT_BEND_RANGE_MAIN: u8 = 2;
const DEFAULT_BEND_RANGE_FINGER: u8 = 48;
const MAX_BEND_RANGE: u8 = 96;

/// 192 internal ticks per second (120 BPM, 96 PPQN) at 44.1 kHz, in Q32.
const DEFAULT_TICKS_PER_SAMPLE: u32 = 18_699_177;

/// Configuration for the automation and patching core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of patch cables per cable set (at most 32).
    pub max_patch_cables: usize,
    /// Main pitch-bend range in semitones.
    pub default_bend_range_main: u8,
    /// Per-finger (MPE) pitch-bend range in semitones.
    pub default_bend_range_finger: u8,
    /// Fraction of an internal tick elapsed per audio sample, Q32.
    pub ticks_per_sample: u32,
    /// Interpolate automation at sample rate rather than per tick.
    pub interpolate_by_samples: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_patch_cables: MAX_PATCH_CABLES,
            default_bend_range_main: DEFAULT_BEND_RANGE_MAIN,
            default_bend_range_finger: DEFAULT_BEND_RANGE_FINGER,
            ticks_per_sample: DEFAULT_TICKS_PER_SAMPLE,
            interpolate_by_samples: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_patch_cables(mut self, max: usize) -> Self {
        self.max_patch_cables = max;
        self
    }

    pub fn with_bend_ranges(mut self, main: u8, finger: u8) -> Self {
        self.default_bend_range_main = main;
        self.default_bend_range_finger = finger;
        self
    }

    /// Derive the per-sample tick fraction from tempo terms.
    pub fn with_timing(mut self, ticks_per_second: f64, sample_rate: f64) -> Self {
        let q32 = ticks_per_second / sample_rate * 4_294_967_296.0;
        self.ticks_per_sample = q32.clamp(0.0, u32::MAX as f64) as u32;
        self
    }

    pub fn with_sample_interpolation(mut self, enabled: bool) -> Self {
        self.interpolate_by_samples = enabled;
        self
    }

    /// Clamp every field into its legal range.
    pub fn validated(mut self) -> Self {
        if self.max_patch_cables > MAX_PATCH_CABLES {
            warn!(
                "max_patch_cables {} exceeds {}, clamping",
                self.max_patch_cables, MAX_PATCH_CABLES
            );
            self.max_patch_cables = MAX_PATCH_CABLES;
        }
        if self.default_bend_range_main > MAX_BEND_RANGE {
            warn!("main bend range {} clamped", self.default_bend_range_main);
            self.default_bend_range_main = MAX_BEND_RANGE;
        }
        if self.default_bend_range_finger > MAX_BEND_RANGE {
            warn!("finger bend range {} clamped", self.default_bend_range_finger);
            self.default_bend_range_finger = MAX_BEND_RANGE;
        }
        self
    }
}
