//! Small float helpers that stay `no_std` via `libm`

/// Round half away from zero to `decimals` places
#[inline]
pub fn round_to(value: f32, decimals: u32) -> f32 {
    let scale = libm::powf(10.0, decimals as f32);
    libm::roundf(value * scale) / scale
}

/// Absolute value without `std`
#[inline]
pub fn abs(value: f32) -> f32 {
    libm::fabsf(value)
}
