use std::ops::Range;

use bitflags::bitflags;
use log::debug;

use crate::{
    renderer::FrameBuffer,
    renderer::software::{Software, renderer::FrameCtx},
    world::{SegmentId, SpriteObject, TextureId, shade},
};

/// Per-frame arena for draw-seg clip snapshots.
#[derive(Default)]
pub struct FrameScratch {
    openings: Vec<i16>,
    cursor: usize,
}
impl FrameScratch {
    /// Copy `rows` into the arena and return the index range it occupies.
    pub fn push(&mut self, rows: &[i16]) -> Range<usize> {
        let start = self.cursor;
        self.cursor += rows.len();

        if self.cursor > self.openings.len() {
            self.openings.resize(self.cursor.next_power_of_two(), 0);
        }
        self.openings[start..self.cursor].copy_from_slice(rows);
        start..self.cursor
    }

    pub fn get(&self, range: Range<usize>) -> &[i16] {
        self.openings.get(range).unwrap_or(&[])
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

bitflags! {
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Silhouette: u8 {
        const BOTTOM = 0x01;
        const TOP    = 0x02;
        const SOLID  = 0x03;
    }
}

/// Occlusion record of one rasterised wall range.
#[derive(Clone, Debug, Default)]
pub struct DrawSeg {
    pub cur_line: SegmentId,
    /// Inclusive column range.
    pub x1: i32,
    pub x2: i32,

    pub scale1: f32,
    pub scale2: f32,
    pub scale_avg: f32,
    /// `screen_dist / scale_avg`
    pub depth: f32,

    pub silhouette: Silhouette,
    pub masked_mid: Option<TextureId>,

    /// Snapshots of `upper_clip` / `lower_clip` over `x1 ..= x2`.
    pub top_clip: Range<usize>,
    pub bot_clip: Range<usize>,
}

#[derive(Clone, Copy, Debug)]
pub struct VisSprite {
    pub x0: i32, // inclusive, unclipped
    pub x1: i32, // inclusive, unclipped
    /// Unrounded left edge / top edge / bottom edge in screen space.
    pub left: f32,
    pub top: f32,
    pub bottom: f32,
    pub scale: f32,
    pub depth: f32,
    pub tex: TextureId,
    pub flip: bool,
    pub light: f32,
}

impl Software {
    pub(super) fn push_drawseg(&mut self, mut ds: DrawSeg) {
        let cols = ds.x1 as usize..ds.x2 as usize + 1;
        ds.top_clip = self.frame_scratch.push(&self.upper_clip[cols.clone()]);
        ds.bot_clip = self.frame_scratch.push(&self.lower_clip[cols]);
        self.drawsegs.push(ds);
    }

    /// Billboard projection; `None` when behind the eye, off-screen or
    /// beyond the far cull distance.
    fn project_sprite(&self, obj: &SpriteObject, ctx: &FrameCtx) -> Option<VisSprite> {
        let rel = ctx.camera.to_cam(obj.pos.truncate());
        if rel.y <= ctx.camera.near() {
            return None;
        }
        if rel.y - obj.radius > self.config.max_draw_distance {
            return None;
        }

        let scale = self.proj.clamp_scale(self.proj.screen_dist / rel.y);
        let depth = self.proj.depth_of(scale);

        let half_w = obj.width * scale * 0.5;
        let xc = self.proj.half_w + rel.x * scale;
        let left = xc - half_w;
        let x0 = left.floor() as i32;
        let x1 = (xc + half_w).ceil() as i32 - 1;
        if x1 < 0 || x0 >= self.proj.width as i32 || x1 < x0 {
            return None;
        }

        let bottom = self.proj.half_h - (obj.pos.z - self.view.z) * scale;
        let top = bottom - obj.height * scale;
        if bottom <= 0.0 || top >= self.proj.height as f32 {
            return None;
        }

        let rot = obj.frame.pick(obj.pos.truncate(), obj.facing, self.view.pos)?;
        let light = if obj.full_bright {
            1.0
        } else {
            ctx.level
                .sector_at(obj.pos.truncate())
                .map_or(1.0, |(_, s)| s.light)
        };

        Some(VisSprite {
            x0,
            x1,
            left,
            top,
            bottom,
            scale,
            depth,
            tex: rot.tex,
            flip: rot.flip,
            light,
        })
    }

    /// Project, sort farthest-first, then draw with a strict depth test.
    pub(super) fn composite_sprites(
        &mut self,
        objects: &[SpriteObject],
        ctx: &FrameCtx,
        target: &mut FrameBuffer,
    ) {
        self.sprites.clear();
        for obj in objects {
            if let Some(vs) = self.project_sprite(obj, ctx) {
                self.sprites.push(vs);
            }
        }

        // far-to-near painter's order; the depth test settles the rest
        self.sprites.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        for i in 0..self.sprites.len() {
            let spr = self.sprites[i];
            if self.draw_vis_sprite(&spr, ctx, target) {
                self.stats.sprites += 1;
            }
        }
    }

    fn draw_vis_sprite(&self, spr: &VisSprite, ctx: &FrameCtx, target: &mut FrameBuffer) -> bool {
        let tex = match ctx.bank.texture(spr.tex) {
            Ok(t) => t,
            Err(e) => {
                debug!("sprite skipped: {e}");
                return false;
            }
        };
        if tex.w == 0 || tex.h == 0 {
            return false;
        }

        let w = self.proj.width as i32;
        let h = self.proj.height as i32;
        // texels per screen pixel
        let inv_scale = 1.0 / spr.scale;

        let x_start = spr.x0.max(0);
        let x_end = spr.x1.min(w - 1);
        let y_start = (spr.top.ceil() as i32).max(0);
        let y_end = (spr.bottom.ceil() as i32 - 1).min(h - 1);

        let mut drawn = false;
        for x in x_start..=x_end {
            let u = (((x as f32 + 0.5 - spr.left) * inv_scale) as i32).clamp(0, tex.w as i32 - 1);
            let u = if spr.flip { tex.w as i32 - 1 - u } else { u };

            for y in y_start..=y_end {
                let v = (((y as f32 + 0.5 - spr.top) * inv_scale) as i32).clamp(0, tex.h as i32 - 1);
                let texel = tex.texel(u, v);
                if texel >> 24 == 0 {
                    continue;
                }
                if let Some(idx) = target.depth.test(x as usize, y as usize, spr.depth) {
                    target.pixels[idx] = shade(texel, spr.light);
                    target.depth.set(idx, spr.depth);
                    drawn = true;
                }
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{FrameBuffer, RenderConfig, Renderer};
    use crate::world::{
        Camera, LevelBuilder, LinedefFlags, Sector, Side, Sidedef, SpriteFrame, Texture,
        TextureBank,
    };
    use glam::{Vec3, vec3};

    const RED: u32 = 0xFF_FF0000;
    const BLUE: u32 = 0xFF_0000FF;

    /// Big open room (one-sided walls far away) for sprite tests.
    fn room() -> crate::world::Level {
        let mut b = LevelBuilder::new("SPRITES");
        let sec = b.sector(Sector {
            floor_h: 0.0,
            ceil_h: 256.0,
            floor_tex: 0,
            ceil_tex: 0,
            light: 1.0,
            special: 0,
            tag: 0,
        });
        let side = b.sidedef(Sidedef {
            x_off: 0.0,
            y_off: 0.0,
            upper: None,
            lower: None,
            middle: Some(0),
            sector: sec,
        });
        let v = [
            b.vertex(-1000.0, 1000.0),
            b.vertex(1000.0, 1000.0),
            b.vertex(1000.0, -1000.0),
            b.vertex(-1000.0, -1000.0),
        ];
        let first = (0..4)
            .map(|i| {
                let ld = b.linedef(v[i], v[(i + 1) % 4], side, None, LinedefFlags::IMPASSABLE);
                b.seg(ld, Side::Right)
            })
            .min()
            .unwrap();
        b.subsector(first, 4);
        b.build().unwrap()
    }

    fn bank() -> (TextureBank, TextureId, TextureId) {
        let mut bank = TextureBank::default_with_checker();
        let red = bank.insert("RED", Texture::solid("RED", 16, 32, RED)).unwrap();
        let blue = bank.insert("BLUE", Texture::solid("BLUE", 16, 32, BLUE)).unwrap();
        (bank, red, blue)
    }

    fn obj(x: f32, tex: TextureId) -> SpriteObject {
        SpriteObject {
            pos: vec3(x, 0.0, 0.0),
            facing: 0.0,
            frame: SpriteFrame::single(tex),
            width: 16.0,
            height: 32.0,
            full_bright: true,
            radius: 8.0,
        }
    }

    fn render(objects: &[SpriteObject]) -> (Software, FrameBuffer) {
        let level = room();
        let (bank, _, _) = bank();
        let cfg = RenderConfig {
            width: 160,
            height: 100,
            ..RenderConfig::default()
        };
        let mut sw = Software::new(cfg).unwrap();
        let mut fb = FrameBuffer::new(160, 100);
        let cam = Camera::new(Vec3::new(0.0, 0.0, 16.0), 0.0, 90.0);
        sw.begin_frame(&mut fb);
        sw.draw_level(&level, &cam, &bank, &mut fb);
        sw.draw_sprites(objects, &level, &cam, &bank, &mut fb);
        (sw, fb)
    }

    #[test]
    fn nearer_sprite_wins_regardless_of_order() {
        let (_, red, blue) = bank();
        let a = [obj(100.0, red), obj(200.0, blue)];
        let b = [obj(200.0, blue), obj(100.0, red)];
        let (_, fa) = render(&a);
        let (_, fb) = render(&b);

        // centre of the screen is covered by both billboards
        assert_eq!(fa.pixel(80, 50), RED);
        assert_eq!(fb.pixel(80, 50), RED);
        assert_eq!(fa.pixels, fb.pixels);
        assert_eq!(fa.depth.as_slice(), fb.depth.as_slice());
    }

    #[test]
    fn sprite_depth_matches_scale() {
        let (_, red, _) = bank();
        let (_, fb) = render(&[obj(100.0, red)]);
        // screen_dist = 80, scale = 0.8, depth = 100
        assert!((fb.depth.get(80, 50) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn wall_hides_sprite_behind_it() {
        let (_, red, _) = bank();
        // past the east wall at x = 1000
        let (sw, fb) = render(&[obj(1200.0, red)]);
        assert_eq!(sw.stats().sprites, 0);
        assert!(fb.pixels.iter().all(|&p| p != RED));
    }

    #[test]
    fn sprite_behind_camera_is_skipped() {
        let (_, red, _) = bank();
        let (sw, _) = render(&[obj(-100.0, red)]);
        assert_eq!(sw.stats().sprites, 0);
        assert!(sw.sprites.is_empty());
    }

    #[test]
    fn transparent_texels_keep_the_wall() {
        let level = room();
        let mut bank = TextureBank::default_with_checker();
        let glass = bank
            .insert("GLASS", Texture::solid("GLASS", 16, 32, 0x00_FF00FF))
            .unwrap();
        let mut sw = Software::new(RenderConfig {
            width: 160,
            height: 100,
            ..RenderConfig::default()
        })
        .unwrap();
        let mut fb = FrameBuffer::new(160, 100);
        let cam = Camera::new(Vec3::new(0.0, 0.0, 16.0), 0.0, 90.0);
        sw.begin_frame(&mut fb);
        sw.draw_level(&level, &cam, &bank, &mut fb);
        let before = fb.clone();
        sw.draw_sprites(&[obj(100.0, glass)], &level, &cam, &bank, &mut fb);
        assert_eq!(before.pixels, fb.pixels);
        assert_eq!(sw.stats().sprites, 0);
    }

    #[test]
    fn arena_snapshots_are_independent() {
        let mut fs = FrameScratch::default();
        let a = fs.push(&[1, 2, 3]);
        let b = fs.push(&[7; 5]);
        assert_eq!(fs.get(a.clone()), &[1, 2, 3]);
        assert_eq!(fs.get(b), &[7; 5]);
        fs.reset();
        let c = fs.push(&[9]);
        assert_eq!(c, 0..1);
        assert_eq!(fs.get(a)[0], 9);
    }
}
