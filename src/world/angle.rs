//! Degree-based angle helpers.
//!
//! The whole renderer works in degrees, counter-clockwise, 0° = east (+X).

use glam::Vec2;

/// Wrap into `[0, 360)`.
#[inline]
pub fn norm(a: f32) -> f32 {
    let r = a.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if r >= 360.0 { 0.0 } else { r }
}

/// Wrap into `(-180, 180]`.
#[inline]
pub fn signed(a: f32) -> f32 {
    let n = norm(a);
    if n > 180.0 { n - 360.0 } else { n }
}

/// Binary Angle Measurement (full circle = 65536) → degrees.
#[inline]
pub fn bams_to_degrees(bams: u16) -> f32 {
    bams as f32 * (360.0 / 65536.0)
}

/// World angle of the vector `from → to`.
#[inline]
pub fn point_to_angle(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn norm_wraps_both_directions() {
        assert_eq!(norm(370.0), 10.0);
        assert_eq!(norm(-90.0), 270.0);
        assert_eq!(norm(360.0), 0.0);
        assert!(norm(-1e-9) < 360.0);
    }

    #[test]
    fn signed_range() {
        assert_eq!(signed(270.0), -90.0);
        assert_eq!(signed(180.0), 180.0);
        assert_eq!(signed(-45.0), -45.0);
    }

    #[test]
    fn bams_quarter_turns() {
        assert_eq!(bams_to_degrees(0x4000), 90.0);
        assert_eq!(bams_to_degrees(0x8000), 180.0);
        assert_eq!(bams_to_degrees(0xC000), 270.0);
    }

    #[test]
    fn point_to_angle_cardinals() {
        let o = Vec2::ZERO;
        assert!((point_to_angle(o, vec2(1.0, 0.0)) - 0.0).abs() < 1e-5);
        assert!((point_to_angle(o, vec2(0.0, 1.0)) - 90.0).abs() < 1e-5);
        assert!((point_to_angle(o, vec2(-1.0, 0.0)) - 180.0).abs() < 1e-5);
    }
}
