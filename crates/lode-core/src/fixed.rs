//! Fixed-point units
//!
//! The engine accumulates velocity and acceleration in centipixels
//! (1/100 pixel) and blends friction and traction in per-mille (1/1000)
//! fractions. All divisions truncate toward zero, matching two's-complement
//! integer division, and replays depend on that truncation being exact.

/// Centipixels per whole pixel.
pub const CENTIPIXELS: i32 = 100;

/// Denominator for friction/traction blending.
pub const PER_MILLE: i32 = 1000;

/// Convert centipixels to whole pixels, truncating toward zero.
pub const fn to_pixels(centipixels: i32) -> i32 {
    centipixels / CENTIPIXELS
}

/// Convert whole pixels to centipixels.
pub const fn to_centipixels(pixels: i32) -> i32 {
    pixels * CENTIPIXELS
}

/// Scale a value by a per-mille fraction, truncating toward zero.
pub const fn scale_permille(value: i32, fraction: i32) -> i32 {
    (value * fraction) / PER_MILLE
}

/// Damp a velocity by a per-mille friction coefficient.
///
/// `velocity * (1000 - friction) / 1000` with integer truncation. A friction
/// of 0 leaves the velocity untouched; 1000 stops it completely.
pub const fn damp_permille(velocity: i32, friction: i32) -> i32 {
    (velocity * (PER_MILLE - friction)) / PER_MILLE
}
