//! Numeric conversion helpers centralizing the float/integer casts the planner needs.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the u32 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    cast::<f64, u32>(value.min(max).floor()).unwrap_or(0)
}

/// Round a f64 and clamp it to the u32 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    cast::<f64, u32>(value.min(max).round()).unwrap_or(0)
}

/// Ceil a f64 and clamp it to the usize range, returning 0 for non-finite or negative values.
#[must_use]
pub fn ceil_f64_to_usize(value: f64) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<usize, f64>(usize::MAX).unwrap_or(f64::MAX);
    cast::<f64, usize>(value.min(max).ceil()).unwrap_or(usize::MAX)
}

/// Convert a u32 counter to f64 (lossless).
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Convert a u32 day index to usize, saturating on targets narrower than 32 bits.
#[must_use]
pub fn u32_to_usize(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
