use log::debug;

use crate::{
    renderer::FrameBuffer,
    renderer::software::{
        Software,
        planes::lookup,
        renderer::FrameCtx,
        sprites::{DrawSeg, Silhouette},
    },
    world::{
        LinedefFlags, Sector, Seg, SegmentId, Sidedef, Texture, TextureId,
        shade,
    },
};

/// Values shared by every column of one seg.
#[derive(Clone, Copy, Debug)]
struct WallSetup<'l> {
    seg_id: SegmentId,
    front: &'l Sector,
    side: &'l Sidedef,
    flags: LinedefFlags,
    /// World angle of the wall normal (pointing away from the eye).
    normal: f32,
    /// Perpendicular distance eye → wall line.
    distance: f32,
    /// Normal angle relative to the view direction.
    center_angle: f32,
    /// Distance along the wall from the perpendicular foot to `v1`.
    offset: f32,
    /// Seg offset + sidedef x offset.
    u_base: f32,
    /// Eye within the near plane of the wall's line.
    degenerate: bool,
    light: f32,
    /// Front ceiling / floor relative to the eye.
    front_top: f32,
    front_bot: f32,
}

/// Per-column projection of a wall.
#[derive(Clone, Copy, Debug)]
struct Column {
    x: i32,
    inv_scale: f32,
    depth: f32,
    u: i32,
}

impl Software {
    /// Route a FOV-clipped seg covering columns `[x1, x2)` to the solid or
    /// portal path.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn classify_segment(
        &mut self,
        seg_id: SegmentId,
        seg: &Seg,
        x1: i32,
        x2: i32,
        rw_angle1: f32,
        ctx: &FrameCtx,
        target: &mut FrameBuffer,
    ) {
        let level = ctx.level;
        let Some(front) = level.sectors.get(seg.front_sector as usize) else {
            debug!("seg {seg_id}: missing front sector {}", seg.front_sector);
            return;
        };
        let Some(side) = level.front_sidedef(seg) else {
            debug!("seg {seg_id}: missing front sidedef");
            return;
        };
        let Some(v1) = level.vertex(seg.v1) else {
            return;
        };
        let flags = level
            .linedefs
            .get(seg.linedef as usize)
            .map_or(LinedefFlags::empty(), |ld| ld.flags);

        let normal = seg.angle + 90.0;
        let offset_angle = normal - rw_angle1;
        let hyp = v1.distance(self.view.pos);
        let (sin_off, cos_off) = offset_angle.to_radians().sin_cos();
        let distance = hyp * cos_off;
        let ws = WallSetup {
            seg_id,
            front,
            side,
            flags,
            normal,
            distance,
            center_angle: normal - self.view.yaw,
            offset: hyp * sin_off,
            u_base: seg.offset + side.x_off,
            degenerate: distance.abs() < ctx.camera.near(),
            light: front.light,
            front_top: front.ceil_h - self.view.z,
            front_bot: front.floor_h - self.view.z,
        };

        let last = x2 - 1;
        let Some(back_id) = seg.back_sector else {
            self.clip_solid_walls(&ws, x1, last, ctx, target);
            return;
        };
        let Some(back) = level.sectors.get(back_id as usize) else {
            debug!("seg {seg_id}: missing back sector {back_id}");
            return;
        };

        // nothing changes across this line (trigger lines)
        if back.ceil_h == front.ceil_h
            && back.floor_h == front.floor_h
            && back.ceil_tex == front.ceil_tex
            && back.floor_tex == front.floor_tex
            && back.light == front.light
            && side.middle.is_none()
        {
            return;
        }

        for run in self.solid_segs.open_runs(x1, last) {
            self.draw_portal_wall_range(&ws, back, run.first, run.last, ctx, target);
        }
    }

    /// Draw the still-open parts of `x1 ..= last`, then seal the columns.
    fn clip_solid_walls(
        &mut self,
        ws: &WallSetup,
        x1: i32,
        last: i32,
        ctx: &FrameCtx,
        target: &mut FrameBuffer,
    ) {
        for run in self.solid_segs.open_runs(x1, last) {
            self.draw_solid_wall_range(ws, run.first, run.last, ctx, target);
        }
        self.solid_segs.add(x1, last);

        if self.solid_segs.is_full(self.proj.width as i32) {
            self.traversing = false;
            self.stats.early_exit = true;
        }
    }

    /*──────────────────────── per-column helpers ─────────────────────*/

    fn column_scale(&self, ws: &WallSetup, x: i32) -> f32 {
        // edge-on: pin to the top of the band instead of dividing by ~0
        if ws.degenerate {
            return self.proj.clamp_scale(f32::INFINITY);
        }
        self.proj
            .scale_from_global_angle(x, ws.normal, ws.distance, self.view.yaw)
    }

    fn column(&self, ws: &WallSetup, x: i32) -> (Column, f32) {
        let scale = self.column_scale(ws, x);
        let angle = (ws.center_angle - self.proj.x_to_angle(x)).to_radians();
        let u = ws.distance * angle.tan() - ws.offset + ws.u_base;
        let col = Column {
            x,
            inv_scale: 1.0 / scale,
            depth: self.proj.depth_of(scale),
            u: if u.is_finite() { u.floor() as i32 } else { 0 },
        };
        (col, scale)
    }

    /// Screen row edge for a projected height, clamped just past the screen.
    #[inline]
    fn row(&self, y: f32) -> i32 {
        (y.ceil() as i32).clamp(-1, self.proj.height as i32 + 1)
    }

    /// Textured wall slice `y1 ..= y2`; `tex_alt` is the height of the
    /// texture's top edge relative to the eye.
    fn draw_wall_column(
        &self,
        tex: &Texture,
        col: &Column,
        (y1, y2): (i32, i32),
        tex_alt: f32,
        light: f32,
        target: &mut FrameBuffer,
    ) {
        let y1 = y1.max(0);
        let y2 = y2.min(self.proj.height as i32 - 1);
        for y in y1..=y2 {
            let v = tex_alt + (y as f32 - self.proj.half_h) * col.inv_scale;
            let texel = tex.texel(col.u, v.floor() as i32);
            target.put(col.x as usize, y as usize, shade(texel, light), col.depth);
        }
    }

    /*──────────────────────── solid ranges ───────────────────────────*/

    fn draw_solid_wall_range(
        &mut self,
        ws: &WallSetup,
        x1: i32,
        x2: i32,
        ctx: &FrameCtx,
        target: &mut FrameBuffer,
    ) {
        let (front, side, flags) = (ws.front, ws.side, ws.flags);
        let (z1, z2) = (ws.front_top, ws.front_bot);
        let wall_tex = side.middle.and_then(|id| lookup(ctx.bank, id));

        let ceil = (z1 > 0.0 || self.is_sky(front.ceil_tex))
            .then(|| self.plane(ctx.bank, front.ceil_tex, z1, ws.light))
            .flatten();
        let floor = (z2 < 0.0)
            .then(|| self.plane(ctx.bank, front.floor_tex, z2, ws.light))
            .flatten();

        let tex_alt = match wall_tex {
            Some(t) if flags.contains(LinedefFlags::LOWER_UNPEGGED) => {
                front.floor_h + t.h as f32 - self.view.z
            }
            _ => z1,
        } + side.y_off;

        for x in x1..=x2 {
            let c = x as usize;
            let (col, scale) = self.column(ws, x);
            let top = self.row(self.proj.half_h - z1 * scale);
            let bot = self.row(self.proj.half_h - z2 * scale) - 1;
            let upper = self.upper_clip[c] as i32;
            let lower = self.lower_clip[c] as i32;

            if let Some(p) = &ceil {
                self.draw_plane_column(p, x, upper + 1, (top - 1).min(lower - 1), target);
            }
            if let Some(t) = wall_tex {
                let rows = (top.max(upper + 1), bot.min(lower - 1));
                self.draw_wall_column(t, &col, rows, tex_alt, ws.light, target);
            }
            if let Some(p) = &floor {
                let start = (bot + 1).max(top).max(upper + 1);
                self.draw_plane_column(p, x, start, lower - 1, target);
            }

            // column closed
            self.upper_clip[c] = upper.max(lower - 1) as i16;
        }

        self.store_drawseg(ws, x1, x2, Silhouette::SOLID, None);
    }

    /*──────────────────────── portal ranges ──────────────────────────*/

    fn draw_portal_wall_range(
        &mut self,
        ws: &WallSetup,
        back: &Sector,
        x1: i32,
        x2: i32,
        ctx: &FrameCtx,
        target: &mut FrameBuffer,
    ) {
        let (front, side, flags) = (ws.front, ws.side, ws.flags);
        let view_z = self.view.z;
        let mut z1 = ws.front_top;
        let z2 = ws.front_bot;
        let z1b = back.ceil_h - view_z;
        let z2b = back.floor_h - view_z;

        // sky meets sky: no upper wall
        if self.is_sky(front.ceil_tex) && self.is_sky(back.ceil_tex) {
            z1 = z1b;
        }

        let ceil_differs =
            z1 != z1b || front.ceil_tex != back.ceil_tex || front.light != back.light;
        let floor_differs =
            z2 != z2b || front.floor_tex != back.floor_tex || front.light != back.light;

        let upper_tex = side
            .upper
            .filter(|_| ceil_differs && z1b < z1)
            .and_then(|id| lookup(ctx.bank, id));
        let lower_tex = side
            .lower
            .filter(|_| floor_differs && z2b > z2)
            .and_then(|id| lookup(ctx.bank, id));

        let ceil = (ceil_differs && (z1 >= 0.0 || self.is_sky(front.ceil_tex)))
            .then(|| self.plane(ctx.bank, front.ceil_tex, z1, ws.light))
            .flatten();
        let floor = (floor_differs && z2 <= 0.0)
            .then(|| self.plane(ctx.bank, front.floor_tex, z2, ws.light))
            .flatten();

        let upper_alt = match upper_tex {
            Some(t) if !flags.contains(LinedefFlags::UPPER_UNPEGGED) => {
                back.ceil_h + t.h as f32 - view_z
            }
            _ => z1,
        } + side.y_off;
        let lower_alt = if flags.contains(LinedefFlags::LOWER_UNPEGGED) {
            ws.front_top
        } else {
            z2b
        } + side.y_off;

        for x in x1..=x2 {
            let c = x as usize;
            let (col, scale) = self.column(ws, x);
            let half_h = self.proj.half_h;
            let top = self.row(half_h - z1 * scale);
            let bot = self.row(half_h - z2 * scale) - 1;
            let mut upper = self.upper_clip[c] as i32;
            let mut lower = self.lower_clip[c] as i32;

            // ceiling + upper wall, tightening the top of the opening
            if let Some(t) = upper_tex {
                if let Some(p) = &ceil {
                    self.draw_plane_column(p, x, upper + 1, (top - 1).min(lower - 1), target);
                }
                let end = (self.row(half_h - z1b * scale) - 1).min(lower - 1);
                self.draw_wall_column(t, &col, (top.max(upper + 1), end), upper_alt, ws.light, target);
                upper = upper.max(end);
            } else if let Some(p) = &ceil {
                let end = (top - 1).min(lower - 1);
                self.draw_plane_column(p, x, upper + 1, end, target);
                upper = upper.max(end);
            }

            // floor + lower wall, tightening the bottom of the opening
            if let Some(t) = lower_tex {
                let start = self.row(half_h - z2b * scale).max(upper + 1);
                if let Some(p) = &floor {
                    self.draw_plane_column(p, x, (bot + 1).max(upper + 1), lower - 1, target);
                }
                self.draw_wall_column(t, &col, (start, bot.min(lower - 1)), lower_alt, ws.light, target);
                lower = lower.min(start);
            } else if let Some(p) = &floor {
                let start = (bot + 1).max(upper + 1);
                self.draw_plane_column(p, x, start, lower - 1, target);
                lower = lower.min(start);
            }

            self.upper_clip[c] = upper as i16;
            self.lower_clip[c] = lower as i16;
        }

        let mut silhouette = Silhouette::empty();
        if back.ceil_h <= front.floor_h || back.floor_h >= front.ceil_h {
            silhouette = Silhouette::SOLID;
        } else {
            if z2b > z2 {
                silhouette |= Silhouette::BOTTOM;
            }
            if z1b < z1 {
                silhouette |= Silhouette::TOP;
            }
        }
        self.store_drawseg(ws, x1, x2, silhouette, side.middle);
    }

    fn store_drawseg(
        &mut self,
        ws: &WallSetup,
        x1: i32,
        x2: i32,
        silhouette: Silhouette,
        masked_mid: Option<TextureId>,
    ) {
        let scale1 = self.column_scale(ws, x1);
        let scale2 = self.column_scale(ws, x2);
        let scale_avg = (scale1 + scale2) * 0.5;
        self.push_drawseg(DrawSeg {
            cur_line: ws.seg_id,
            x1,
            x2,
            scale1,
            scale2,
            scale_avg,
            depth: self.proj.depth_of(scale_avg),
            silhouette,
            masked_mid,
            top_clip: 0..0,
            bot_clip: 0..0,
        });
    }
}
