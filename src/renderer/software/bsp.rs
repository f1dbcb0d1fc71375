use glam::Vec2;
use log::debug;

use crate::{
    renderer::FrameBuffer,
    renderer::software::{Software, renderer::FrameCtx},
    world::{
        Child, SegmentId, SubsectorId,
        angle::{norm, point_to_angle, signed},
    },
};

impl Software {
    /// Front-to-back walk from the root; stops once every column is sealed.
    pub(super) fn traverse(&mut self, ctx: &FrameCtx, target: &mut FrameBuffer) {
        self.traversing = true;
        let root = ctx.level.bsp_root();
        self.render_bsp_node(root, ctx, target);
    }

    fn render_bsp_node(&mut self, child: Child, ctx: &FrameCtx, target: &mut FrameBuffer) {
        if !self.traversing {
            return;
        }
        match child {
            Child::Subsector(ss) => self.render_subsector(ss, ctx, target),
            Child::Node(id) => {
                let Some(node) = ctx.level.nodes.get(id as usize) else {
                    debug!("skipping missing node {id}");
                    return;
                };
                // a tree visits each node at most once per frame
                if self.stats.nodes >= ctx.level.nodes.len() {
                    debug!("BSP cycle through node {id}");
                    self.traversing = false;
                    return;
                }
                self.stats.nodes += 1;

                let front = node.point_side(self.view.pos);
                let back = front ^ 1;
                self.render_bsp_node(node.child[front], ctx, target);

                if self.traversing && node.bbox[back].in_fov(&ctx.camera) {
                    self.render_bsp_node(node.child[back], ctx, target);
                }
            }
        }
    }

    fn render_subsector(&mut self, ss_id: SubsectorId, ctx: &FrameCtx, target: &mut FrameBuffer) {
        let Some(ss) = ctx.level.subsectors.get(ss_id as usize) else {
            debug!("skipping missing subsector {ss_id}");
            return;
        };
        self.stats.subsectors += 1;

        let first = ss.first_seg;
        for (i, seg) in ctx.level.segs_of_subsector(ss).iter().enumerate() {
            let (Some(v1), Some(v2)) = (ctx.level.vertex(seg.v1), ctx.level.vertex(seg.v2)) else {
                debug!("seg {} has a dangling vertex", first as usize + i);
                continue;
            };
            if self.too_far(v1, v2) {
                continue;
            }
            if let Some((x1, x2, rw_angle1)) = self.add_segment_to_fov(v1, v2) {
                let seg_id = first + i as SegmentId;
                self.stats.segs += 1;
                self.classify_segment(seg_id, seg, x1, x2, rw_angle1, ctx, target);
                if !self.traversing {
                    return;
                }
            }
        }
    }

    /// Closest point of `v1 → v2` lies beyond the far cull distance.
    fn too_far(&self, v1: Vec2, v2: Vec2) -> bool {
        let d = v2 - v1;
        let len2 = d.length_squared();
        let t = if len2 > 0.0 {
            ((self.view.pos - v1).dot(d) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (v1 + d * t).distance(self.view.pos) > self.config.max_draw_distance
    }

    /// Backface test plus FOV clipping.
    ///
    /// Returns the half-open column span `[x1, x2)` and the world angle from
    /// the eye to `v1`, or `None` if the seg faces away, lies outside the
    /// FOV, or covers no full column.
    pub(super) fn add_segment_to_fov(&self, v1: Vec2, v2: Vec2) -> Option<(i32, i32, f32)> {
        let eye = self.view.pos;
        let fov = self.proj.fov;
        let half_fov = self.proj.half_fov;

        let mut angle1 = point_to_angle(eye, v1);
        let mut angle2 = point_to_angle(eye, v2);

        let span = norm(angle1 - angle2);
        // back side
        if span >= 180.0 {
            return None;
        }

        let rw_angle1 = angle1;

        angle1 -= self.view.yaw;
        angle2 -= self.view.yaw;

        let span1 = norm(angle1 + half_fov);
        if span1 > fov {
            if span1 >= span + fov {
                return None;
            }
            angle1 = half_fov;
        }

        let span2 = norm(half_fov - angle2);
        if span2 > fov {
            if span2 >= span + fov {
                return None;
            }
            angle2 = -half_fov;
        }

        let x1 = self.proj.angle_to_x(signed(angle1));
        let x2 = self.proj.angle_to_x(signed(angle2));
        (x1 < x2).then_some((x1, x2, rw_angle1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::software::renderer::Viewer;
    use crate::renderer::RenderConfig;
    use glam::vec2;

    fn sw(yaw: f32) -> Software {
        let mut sw = Software::new(RenderConfig {
            width: 320,
            height: 200,
            ..RenderConfig::default()
        })
        .unwrap();
        sw.view = Viewer {
            pos: Vec2::ZERO,
            yaw,
            z: 41.0,
        };
        sw
    }

    #[test]
    fn facing_wall_spans_the_screen() {
        let s = sw(0.0);
        // wall at x = 100 running north→south, front side faces the eye
        let (x1, x2, a) = s.add_segment_to_fov(vec2(100.0, 200.0), vec2(100.0, -200.0)).unwrap();
        assert_eq!((x1, x2), (0, 320));
        assert!((a - point_to_angle(Vec2::ZERO, vec2(100.0, 200.0))).abs() < 1e-4);
    }

    #[test]
    fn back_side_is_culled() {
        let s = sw(0.0);
        assert!(s.add_segment_to_fov(vec2(100.0, -200.0), vec2(100.0, 200.0)).is_none());
    }

    #[test]
    fn wall_behind_is_outside_fov() {
        let s = sw(0.0);
        assert!(s.add_segment_to_fov(vec2(-100.0, -50.0), vec2(-100.0, 50.0)).is_none());
    }

    #[test]
    fn partial_wall_is_clipped_to_the_left_edge() {
        let s = sw(0.0);
        // from far left-ahead to dead ahead
        let (x1, x2, _) = s.add_segment_to_fov(vec2(10.0, 300.0), vec2(100.0, 0.0)).unwrap();
        assert_eq!(x1, 0);
        assert_eq!(x2, 160);
    }

    #[test]
    fn sliver_narrower_than_a_column_is_dropped() {
        let s = sw(0.0);
        // both ends project inside column 100 (x ≈ 100.3 and 100.7)
        assert!(
            s.add_segment_to_fov(vec2(1000.0, 373.125), vec2(1000.0, 370.625))
                .is_none()
        );
    }

    #[test]
    fn cyclic_tree_costs_at_most_one_visit_per_node() {
        use crate::renderer::{FrameBuffer, Renderer};
        use crate::world::{
            Aabb, Camera, LevelBuilder, LinedefFlags, Sector, Side, Sidedef, TextureBank,
        };
        use glam::vec3;

        let mut b = LevelBuilder::new("LOOP");
        let sec = b.sector(Sector {
            floor_h: 0.0,
            ceil_h: 128.0,
            floor_tex: 0,
            ceil_tex: 0,
            light: 1.0,
            special: 0,
            tag: 0,
        });
        let sd = b.sidedef(Sidedef {
            x_off: 0.0,
            y_off: 0.0,
            upper: None,
            lower: None,
            middle: Some(0),
            sector: sec,
        });
        let v0 = b.vertex(500.0, 10.0);
        let v1 = b.vertex(500.0, -10.0);
        let ld = b.linedef(v0, v1, sd, None, LinedefFlags::empty());
        b.seg(ld, Side::Right);
        b.subsector(0, 1);
        let bb = Aabb::new(vec2(-1000.0, -1000.0), vec2(1000.0, 1000.0));
        for _ in 0..20 {
            b.node(
                vec2(0.0, 0.0),
                vec2(1.0, 0.0),
                bb.clone(),
                bb.clone(),
                Child::Subsector(0),
                Child::Subsector(0),
            );
        }
        let mut level = b.build().unwrap();
        // corrupt after validation: every node points back at the root
        let root = (level.nodes.len() - 1) as u16;
        for node in &mut level.nodes {
            node.child = [Child::Node(root), Child::Node(root)];
        }

        let mut s = Software::new(RenderConfig {
            width: 320,
            height: 200,
            ..RenderConfig::default()
        })
        .unwrap();
        let mut fb = FrameBuffer::new(320, 200);
        let cam = Camera::new(vec3(0.0, 0.0, 41.0), 0.0, 90.0);
        s.begin_frame(&mut fb);
        s.draw_level(&level, &cam, &TextureBank::default_with_checker(), &mut fb);
        assert!(s.stats().nodes <= level.nodes.len());
    }

    #[test]
    fn far_segs_are_culled() {
        let mut s = sw(0.0);
        s.config.max_draw_distance = 500.0;
        assert!(s.too_far(vec2(600.0, -10.0), vec2(600.0, 10.0)));
        assert!(!s.too_far(vec2(400.0, -10.0), vec2(400.0, 10.0)));
        // long wall whose ends are far but whose middle is close
        assert!(!s.too_far(vec2(100.0, -900.0), vec2(100.0, 900.0)));
    }
}
