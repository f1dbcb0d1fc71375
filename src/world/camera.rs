use glam::{Vec2, Vec3, vec2};

use crate::world::angle::norm;

/// Player view-point in world space.
///
/// * Only **yaw** (heading) is simulated – no pitch, no roll.
/// * `z` holds eye height above the floor under the camera, not absolute
///   altitude; the renderer adds the floor height every frame.
/// * Angles are degrees (0 = east, counter-clockwise).
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pos: Vec3,
    yaw: f32,
    fov: f32,
}

impl Camera {
    /// `yaw` is normalised into `[0, 360)`.
    pub fn new(pos: Vec3, yaw: f32, fov: f32) -> Self {
        Self {
            pos,
            yaw: norm(yaw),
            fov,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// World point → view space: `x` grows to the right, `y` is the
    /// distance along the view direction.
    #[inline]
    pub fn to_cam(&self, p: Vec2) -> Vec2 {
        let d = p - self.pos.truncate();
        vec2(d.dot(self.right()), d.dot(self.forward()))
    }

    /// Horizontal view direction.
    #[inline(always)]
    pub fn forward(&self) -> Vec2 {
        let (s, c) = self.yaw.to_radians().sin_cos();
        Vec2::new(c, s)
    }

    /// Forward rotated a quarter turn clockwise.
    #[inline(always)]
    pub fn right(&self) -> Vec2 {
        let f = self.forward();
        Vec2::new(f.y, -f.x)
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Walk `forward` units and strafe `side` units (+ right); `z` is kept.
    pub fn step(&mut self, forward: f32, side: f32) {
        let f = self.forward();
        let r = self.right();
        self.pos.x += f.x * forward + r.x * side;
        self.pos.y += f.y * forward + r.y * side;
    }

    /// Counter-clockwise for positive `delta_yaw`.
    pub fn turn(&mut self, delta_yaw: f32) {
        self.yaw = norm(self.yaw + delta_yaw);
    }

    /// Near-plane distance for sprites.
    #[inline(always)]
    pub fn near(&self) -> f32 {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn basis_is_a_right_handed_pair() {
        let cam = Camera::new(Vec3::ZERO, 17.0, 90.0);
        assert!((cam.forward().length() - 1.0).abs() < 1e-5);
        assert!(cam.forward().dot(cam.right()).abs() < 1e-5);
        // right × forward points up
        assert!(cam.right().perp_dot(cam.forward()) > 0.0);
    }

    #[test]
    fn view_space_follows_yaw() {
        let east = Camera::new(vec3(5.0, 5.0, 41.0), 0.0, 90.0);
        assert!(close(east.to_cam(vec2(15.0, 5.0)), vec2(0.0, 10.0)));
        assert!(close(east.to_cam(vec2(5.0, 0.0)), vec2(5.0, 0.0)));

        let north = Camera::new(Vec3::ZERO, 90.0, 90.0);
        assert!(close(north.to_cam(vec2(3.0, 10.0)), vec2(3.0, 10.0)));
    }

    #[test]
    fn step_moves_in_the_view_frame() {
        let mut cam = Camera::new(vec3(0.0, 0.0, 41.0), 90.0, 90.0);
        cam.step(10.0, 2.0);
        assert!(close(cam.pos().truncate(), vec2(2.0, 10.0)));
        assert_eq!(cam.pos().z, 41.0);
    }

    #[test]
    fn turn_wraps() {
        let mut cam = Camera::new(Vec3::ZERO, 350.0, 90.0);
        cam.turn(20.0);
        assert!((cam.yaw() - 10.0).abs() < 1e-4);
        cam.turn(-30.0);
        assert!((cam.yaw() - 340.0).abs() < 1e-4);
    }
}
