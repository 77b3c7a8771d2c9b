//! Vector types used for positions and pointer coordinates.
//!
//! Widget positions are integer pixels ([`IVec2`]); pointer events carry sub-pixel
//! coordinates ([`DVec2`]).

pub use glam::{DVec2, IVec2, UVec2};

/// Rounds half away from zero and converts to `i32`, saturating at the integer bounds.
#[inline]
pub fn round_i32(value: f64) -> i32 {
    value.round() as i32
}

/// Rounds to the nearest non-negative `u32`.
#[inline]
pub fn round_u32(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_helpers() {
        assert_eq!(round_i32(2.5), 3);
        assert_eq!(round_i32(-2.5), -3);
        assert_eq!(round_u32(-4.0), 0);
        assert_eq!(round_u32(199.6), 200);
    }
}
