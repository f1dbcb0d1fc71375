use crate::world::angle::signed;

/// Screen geometry derived from resolution + FOV, rebuilt on resize.
#[derive(Clone, Debug)]
pub struct Projection {
    pub width: usize,
    pub height: usize,
    pub half_w: f32,
    pub half_h: f32,
    pub fov: f32,
    pub half_fov: f32,
    /// Distance from the eye to the projection plane, in pixels.
    pub screen_dist: f32,
    min_scale: f32,
    max_scale: f32,
    /// `width + 1` entries: view-relative angle of each column edge,
    /// positive to the left.
    x_to_angle: Vec<f32>,
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(1, 1, 90.0, 1.0 / 256.0, 64.0)
    }
}

impl Projection {
    pub fn new(width: usize, height: usize, fov: f32, min_scale: f32, max_scale: f32) -> Self {
        let half_w = width as f32 * 0.5;
        let half_h = height as f32 * 0.5;
        let half_fov = fov * 0.5;
        let screen_dist = half_w / half_fov.to_radians().tan();
        let x_to_angle = (0..=width)
            .map(|x| ((half_w - x as f32) / screen_dist).atan().to_degrees())
            .collect();
        Self {
            width,
            height,
            half_w,
            half_h,
            fov,
            half_fov,
            screen_dist,
            min_scale,
            max_scale,
            x_to_angle,
        }
    }

    #[inline]
    pub fn x_to_angle(&self, x: i32) -> f32 {
        let i = x.clamp(0, self.width as i32) as usize;
        self.x_to_angle[i]
    }

    /// View-relative angle (degrees, + left) → screen column edge in
    /// `0 ..= width`.
    #[inline]
    pub fn angle_to_x(&self, angle: f32) -> i32 {
        let a = signed(angle).clamp(-self.half_fov, self.half_fov);
        let x = self.half_w - a.to_radians().tan() * self.screen_dist;
        // absorb tan() rounding so ±half_fov land exactly on 0 / width
        ((x + 1e-3).floor() as i32).clamp(0, self.width as i32)
    }

    #[inline]
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        if scale.is_nan() {
            return self.max_scale;
        }
        scale.clamp(self.min_scale, self.max_scale)
    }

    /// Perspective scale of column `x` for a wall with normal `normal_angle`
    /// at perpendicular distance `rw_distance`, seen from heading `view_angle`.
    pub fn scale_from_global_angle(
        &self,
        x: i32,
        normal_angle: f32,
        rw_distance: f32,
        view_angle: f32,
    ) -> f32 {
        let x_angle = self.x_to_angle(x);
        let num = self.screen_dist * (normal_angle - x_angle - view_angle).to_radians().cos();
        let den = rw_distance * x_angle.to_radians().cos();
        if den.abs() < f32::EPSILON {
            return self.max_scale;
        }
        self.clamp_scale(num / den)
    }

    #[inline]
    pub fn depth_of(&self, scale: f32) -> f32 {
        self.screen_dist / scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proj() -> Projection {
        Projection::new(320, 200, 90.0, 1.0 / 256.0, 64.0)
    }

    #[test]
    fn table_edges_match_fov() {
        let p = proj();
        assert!((p.x_to_angle(0) - 45.0).abs() < 1e-4);
        assert!((p.x_to_angle(320) + 45.0).abs() < 1e-4);
        assert!(p.x_to_angle(160).abs() < 1e-4);
        assert!((p.screen_dist - 160.0).abs() < 1e-3);
    }

    #[test]
    fn angle_to_x_edges_and_centre() {
        let p = proj();
        assert_eq!(p.angle_to_x(45.0), 0);
        assert_eq!(p.angle_to_x(-45.0), 320);
        assert_eq!(p.angle_to_x(0.0), 160);
        // wrapped input is accepted
        assert_eq!(p.angle_to_x(315.0), 320);
        // left half of the screen for positive angles
        assert!(p.angle_to_x(10.0) < 160);
    }

    #[test]
    fn parallel_wall_scale_is_constant() {
        let p = proj();
        // wall straight ahead at distance 100, normal pointing away
        let s0 = p.scale_from_global_angle(0, 0.0, 100.0, 0.0);
        let s1 = p.scale_from_global_angle(160, 0.0, 100.0, 0.0);
        let s2 = p.scale_from_global_angle(300, 0.0, 100.0, 0.0);
        assert!((s1 - 1.6).abs() < 1e-3);
        assert!((s0 - s1).abs() < 1e-3 && (s2 - s1).abs() < 1e-3);
    }

    #[test]
    fn receding_wall_scale_strictly_decreases_off_centre() {
        let p = proj();
        // wall normal 30° to the right of the view: it recedes on the left
        let mut prev = p.scale_from_global_angle(160, -30.0, 100.0, 0.0);
        for x in (0..160).rev().step_by(10) {
            let s = p.scale_from_global_angle(x, -30.0, 100.0, 0.0);
            assert!(s < prev, "x={x}: {s} !< {prev}");
            prev = s;
        }
    }

    #[test]
    fn scale_decreases_with_distance() {
        let p = proj();
        let near = p.scale_from_global_angle(160, 0.0, 50.0, 0.0);
        let far = p.scale_from_global_angle(160, 0.0, 500.0, 0.0);
        assert!(near > far);
    }

    #[test]
    fn degenerate_inputs_are_clamped() {
        let p = proj();
        assert_eq!(p.scale_from_global_angle(160, 0.0, 0.0, 0.0), 64.0);
        assert_eq!(p.scale_from_global_angle(160, 0.0, 1e9, 0.0), 1.0 / 256.0);
        // wall seen from behind → negative → clamped low
        assert_eq!(p.scale_from_global_angle(160, 180.0, 100.0, 0.0), 1.0 / 256.0);
        assert_eq!(p.clamp_scale(f32::NAN), 64.0);
    }
}
