//! Movable objects handed to the renderer each frame.
//!
//! The game side (AI, weapons, pickups …) owns the real actors; it only
//! produces this flat snapshot for the sprite pass.

use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use crate::world::angle::{norm, point_to_angle};
use crate::world::texture::TextureId;

/// One patch of a sprite frame, optionally mirrored horizontally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rotation {
    pub tex: TextureId,
    pub flip: bool,
}

/// Either one view for all angles, or eight views in 45° steps.
///
/// Rotation 0 is seen when the object faces the viewer; the others follow
/// counter-clockwise around the object.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteFrame {
    rotations: SmallVec<[Rotation; 8]>,
}

impl SpriteFrame {
    pub fn single(tex: TextureId) -> Self {
        let mut rotations = SmallVec::new();
        rotations.push(Rotation { tex, flip: false });
        Self { rotations }
    }

    /// Eight views; anything else degrades to the first one.
    pub fn rotated(views: [Rotation; 8]) -> Self {
        Self {
            rotations: SmallVec::from_buf(views),
        }
    }

    /// Pick the view for an object at `pos` facing `facing` seen from `eye`.
    pub fn pick(&self, pos: Vec2, facing: f32, eye: Vec2) -> Option<Rotation> {
        if self.rotations.len() < 8 {
            return self.rotations.first().copied();
        }
        let rel = norm(point_to_angle(pos, eye) - facing + 22.5);
        let idx = (rel / 45.0) as usize % 8;
        self.rotations.get(idx).copied()
    }
}

/// Snapshot of one movable object for the current frame.
#[derive(Clone, Debug)]
pub struct SpriteObject {
    /// x, y in map units; z = height of the object's base.
    pub pos: Vec3,
    /// Degrees, same convention as the camera.
    pub facing: f32,
    pub frame: SpriteFrame,
    /// Native patch size in texels (world units at scale 1).
    pub width: f32,
    pub height: f32,
    pub full_bright: bool,
    /// Collision radius; widens the off-screen rejection test.
    pub radius: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    fn views() -> [Rotation; 8] {
        core::array::from_fn(|i| Rotation {
            tex: i as TextureId + 10,
            flip: i > 4,
        })
    }

    #[test]
    fn single_frame_ignores_angle() {
        let f = SpriteFrame::single(3);
        let r = f.pick(Vec2::ZERO, 123.0, vec2(-50.0, 7.0)).unwrap();
        assert_eq!(r.tex, 3);
    }

    #[test]
    fn facing_viewer_picks_rotation_zero() {
        let f = SpriteFrame::rotated(views());
        // object at origin faces east, viewer is east of it
        let r = f.pick(Vec2::ZERO, 0.0, vec2(100.0, 0.0)).unwrap();
        assert_eq!(r.tex, 10);
    }

    #[test]
    fn viewer_behind_picks_rotation_four() {
        let f = SpriteFrame::rotated(views());
        let r = f.pick(Vec2::ZERO, 0.0, vec2(-100.0, 0.0)).unwrap();
        assert_eq!(r.tex, 14);
        // a quarter turn counter-clockwise
        let r = f.pick(Vec2::ZERO, 0.0, vec2(0.0, 100.0)).unwrap();
        assert_eq!(r.tex, 12);
    }
}
