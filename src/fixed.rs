// src/fixed.rs
//
// 32-bit fixed-point primitives shared by automation and patching.
//
// Engine values are i32. "Unity" for multiplicative combination sits at
// 2^29, a quarter of the positive range, which leaves two bits of headroom
// so four unity-centred factors can be multiplied without overflow.

/// The value that counts as "1" in multiplicative combination.
pub const UNITY: i32 = 1 << 29;

/// (a * b) >> 32
#[inline]
pub fn multiply_32x32_rshift32(a: i32, b: i32) -> i32 {
    ((a as i64 * b as i64) >> 32) as i32
}

/// (a * b) >> 32, rounded to nearest.
#[inline]
pub fn multiply_32x32_rshift32_rounded(a: i32, b: i32) -> i32 {
    ((a as i64 * b as i64 + (1i64 << 31)) >> 32) as i32
}

/// Clamp `value` into the signed range representable in `bits` bits.
#[inline]
pub fn signed_saturate(value: i32, bits: u32) -> i32 {
    debug_assert!((1..=32).contains(&bits));
    if bits >= 32 {
        return value;
    }
    let max = (1i32 << (bits - 1)) - 1;
    let min = -(1i32 << (bits - 1));
    value.clamp(min, max)
}

/// Saturate to `32 - shift` bits, then shift left. Never wraps.
#[inline]
pub fn lshift_and_saturate(value: i32, shift: u32) -> i32 {
    signed_saturate(value, 32 - shift) << shift
}

/// Shift left (positive `magnitude`) with saturation, or right otherwise.
#[inline]
pub fn increase_magnitude_and_saturate(value: i32, magnitude: i32) -> i32 {
    if magnitude > 0 {
        if magnitude >= 31 {
            return match value.signum() {
                1 => i32::MAX,
                -1 => i32::MIN,
                _ => 0,
            };
        }
        lshift_and_saturate(value, magnitude as u32)
    } else {
        value >> (-magnitude).min(31)
    }
}

/// Narrow an i64 into i32, clamping at the ends.
#[inline]
pub fn saturate_i64(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// `a * b / UNITY`, saturating. Exact when either side is UNITY, which keeps
/// unity-centred products independent of factor order.
#[inline]
pub fn multiply_unity_scaled(a: i32, b: i32) -> i32 {
    saturate_i64((a as i64 * b as i64) >> 29)
}

// ═══════════════════════════════════════════════════════════════════════════
// Exponential transform
// ═══════════════════════════════════════════════════════════════════════════

/// 2^(i/16) scaled so that 2^0 == 2^30, last entry clipped to i32::MAX.
const EXP2_TABLE: [i32; 17] = [
    1073741824, 1121280436, 1170923762, 1222764986, 1276901417, 1333434672, 1392470869,
    1454120821, 1518500250, 1585730000, 1655936265, 1729250827, 1805811301, 1885761398,
    1969251188, 2056437387, 2147483647,
];

/// Fractional part of an adjustment, 26 bits wide.
const FRACTION_BITS: u32 = 26;

/// Interpolate 2^(fraction / 2^26), returned scaled by 2^30.
#[inline]
fn exp2_fraction(fraction: i32) -> i32 {
    const INDEX_SHIFT: u32 = FRACTION_BITS - 4;
    let index = (fraction >> INDEX_SHIFT) as usize;
    let remainder = (fraction & ((1 << INDEX_SHIFT) - 1)) as i64;
    let low = EXP2_TABLE[index] as i64;
    let high = EXP2_TABLE[index + 1] as i64;
    (low + (((high - low) * remainder) >> INDEX_SHIFT)) as i32
}

/// `preset * 2^(adjustment / 2^26)`, saturating.
///
/// One doubling per 2^26 of adjustment, so the full i32 range of
/// `adjustment` spans +-32 octaves.
pub fn get_exp(preset: i32, adjustment: i32) -> i32 {
    let magnitude_increase = (adjustment >> FRACTION_BITS) + 2;
    let fine = exp2_fraction(adjustment & ((1 << FRACTION_BITS) - 1));
    let adjusted = multiply_32x32_rshift32(preset, fine);
    increase_magnitude_and_saturate(adjusted, magnitude_increase)
}
