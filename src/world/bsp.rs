use crate::world::angle::{norm, point_to_angle};
use crate::world::camera::Camera;
use crate::world::geometry::{Aabb, Child, Level, Node, Sector, SectorId, SubsectorId};
use glam::{Vec2, vec2};

pub const CHILD_MASK: u16 = 0x7FFF;

pub const SUBSECTOR_BIT: u16 = 0x8000;

// ──────────────────────────────────────────────────────────────────────────
//                       Child – on-disk encoding
// ──────────────────────────────────────────────────────────────────────────
impl Child {
    /// Decode the 16-bit on-disk reference (high bit = leaf).
    #[inline]
    pub fn from_raw(raw: u16) -> Self {
        if raw & SUBSECTOR_BIT != 0 {
            Child::Subsector(raw & CHILD_MASK)
        } else {
            Child::Node(raw)
        }
    }

    #[inline]
    pub fn to_raw(self) -> u16 {
        match self {
            Child::Node(n) => n,
            Child::Subsector(s) => s | SUBSECTOR_BIT,
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                       Level – public helpers
// ──────────────────────────────────────────────────────────────────────────
impl Level {
    /// BSP root: the last node, or the only subsector of a node-less map.
    #[inline]
    pub fn bsp_root(&self) -> Child {
        match self.nodes.len() {
            0 => Child::Subsector(0),
            n => Child::Node((n - 1) as u16),
        }
    }

    /// Walk the BSP and return the subsector id containing `p`.
    ///
    /// `None` only when the tree references a node that does not exist.
    pub fn locate_subsector(&self, p: Vec2) -> Option<SubsectorId> {
        let mut child = self.bsp_root();
        // a well-formed tree is never deeper than its node count
        for _ in 0..=self.nodes.len() {
            match child {
                Child::Subsector(ss) => return Some(ss),
                Child::Node(n) => {
                    let node = self.nodes.get(n as usize)?;
                    child = node.child[node.point_side(p)];
                }
            }
        }
        None
    }

    /// Sector under `p`.
    pub fn sector_at(&self, p: Vec2) -> Option<(SectorId, &Sector)> {
        let ss = self.locate_subsector(p)?;
        let sector = self.subsectors.get(ss as usize)?.sector;
        self.sectors.get(sector as usize).map(|s| (sector, s))
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                       Node geometry helpers
// ──────────────────────────────────────────────────────────────────────────
impl Node {
    /// 0 = *front* of splitter, 1 = *back*.
    #[inline(always)]
    pub fn point_side(&self, p: Vec2) -> usize {
        let d = (p.x - self.x) * self.dy - (p.y - self.y) * self.dx;
        if d >= 0.0 { 0 } else { 1 }
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                       Aabb geometry helpers
// ──────────────────────────────────────────────────────────────────────────
impl Aabb {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Could any part of the box fall inside the camera's horizontal FOV?
    ///
    /// Only the box edges facing the viewer are tested; each one goes
    /// through the same left-clip rejection used for segs.
    pub fn in_fov(&self, cam: &Camera) -> bool {
        let eye = cam.pos().truncate();
        if self.contains(eye) {
            return true;
        }

        let a = vec2(self.min.x, self.min.y);
        let b = vec2(self.min.x, self.max.y);
        let c = vec2(self.max.x, self.max.y);
        let d = vec2(self.max.x, self.min.y);

        // edges listed with the viewer on their front (right) side
        let mut sides: [(Vec2, Vec2); 2] = [(b, a); 2];
        let count = if eye.x < self.min.x {
            if eye.y > self.max.y {
                sides = [(b, a), (c, b)];
                2
            } else if eye.y < self.min.y {
                sides = [(b, a), (a, d)];
                2
            } else {
                1
            }
        } else if eye.x > self.max.x {
            if eye.y > self.max.y {
                sides = [(c, b), (d, c)];
                2
            } else if eye.y < self.min.y {
                sides = [(a, d), (d, c)];
                2
            } else {
                sides[0] = (d, c);
                1
            }
        } else if eye.y > self.max.y {
            sides[0] = (c, b);
            1
        } else {
            sides[0] = (a, d);
            1
        };

        let fov = cam.fov();
        let half_fov = fov * 0.5;
        sides[..count].iter().any(|&(v1, v2)| {
            let angle1 = point_to_angle(eye, v1);
            let angle2 = point_to_angle(eye, v2);
            let span = norm(angle1 - angle2);
            let span1 = norm(angle1 - cam.yaw() + half_fov);
            !(span1 > fov && span1 >= span + fov)
        })
    }
}

// ──────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    fn splitter() -> Node {
        // vertical partition through x = 0, pointing north
        Node {
            x: 0.0,
            y: 0.0,
            dx: 0.0,
            dy: 1.0,
            bbox: [
                Aabb::new(vec2(0.0, -10.0), vec2(10.0, 10.0)),
                Aabb::new(vec2(-10.0, -10.0), vec2(0.0, 10.0)),
            ],
            child: [Child::Subsector(0), Child::Subsector(1)],
        }
    }

    #[test]
    fn point_side_matches_bbox() {
        let node = splitter();
        for side in 0..=1 {
            let bb = &node.bbox[side];
            let mid = (bb.min + bb.max) * 0.5;
            assert_eq!(node.point_side(mid), side);
        }
    }

    #[test]
    fn raw_child_round_trip() {
        assert_eq!(Child::from_raw(0x8003), Child::Subsector(3));
        assert_eq!(Child::from_raw(0x0003), Child::Node(3));
        assert_eq!(Child::Subsector(7).to_raw(), 0x8007);
    }

    #[test]
    fn box_behind_camera_is_culled() {
        let cam = Camera::new(vec3(0.0, 0.0, 41.0), 0.0, 90.0);
        let behind = Aabb::new(vec2(-200.0, -20.0), vec2(-100.0, 20.0));
        let ahead = Aabb::new(vec2(100.0, -20.0), vec2(200.0, 20.0));
        assert!(!behind.in_fov(&cam));
        assert!(ahead.in_fov(&cam));
    }

    #[test]
    fn box_beside_fov_is_culled() {
        let cam = Camera::new(vec3(0.0, 0.0, 41.0), 0.0, 90.0);
        // 60..80 degrees to the left, outside a 90° FOV
        let left = Aabb::new(vec2(10.0, 100.0), vec2(30.0, 110.0));
        assert!(!left.in_fov(&cam));
        // straddles the left clip line
        let edge = Aabb::new(vec2(90.0, 60.0), vec2(120.0, 140.0));
        assert!(edge.in_fov(&cam));
    }

    #[test]
    fn box_around_camera_is_visible() {
        let cam = Camera::new(vec3(5.0, 5.0, 41.0), 180.0, 90.0);
        let around = Aabb::new(vec2(0.0, 0.0), vec2(10.0, 10.0));
        assert!(around.in_fov(&cam));
    }
}
