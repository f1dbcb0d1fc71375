use std::ops::RangeInclusive;

use glam::vec2;
use log::debug;

use crate::{
    renderer::FrameBuffer,
    renderer::software::Software,
    world::{
        Texture, TextureBank, TextureId,
        angle::norm,
        shade,
    },
};

/// What to paint above or below a wall in one column.
pub(super) enum Plane<'t> {
    Flat {
        tex: &'t Texture,
        /// Plane height relative to the eye (negative for floors).
        height: f32,
        light: f32,
    },
    Sky {
        tex: &'t Texture,
    },
}

/// Bank lookup that logs and yields `None` for unknown ids.
pub(super) fn lookup(bank: &TextureBank, id: TextureId) -> Option<&Texture> {
    match bank.texture(id) {
        Ok(t) if t.w > 0 && t.h > 0 => Some(t),
        Ok(_) => {
            debug!("texture {id} is empty");
            None
        }
        Err(e) => {
            debug!("{e}");
            None
        }
    }
}

impl Software {
    #[inline]
    pub(super) fn is_sky(&self, flat: TextureId) -> bool {
        self.config.sky.is_some_and(|s| s.flat == flat)
    }

    pub(super) fn plane<'t>(
        &self,
        bank: &'t TextureBank,
        flat: TextureId,
        height: f32,
        light: f32,
    ) -> Option<Plane<'t>> {
        match self.config.sky {
            Some(sky) if sky.flat == flat => lookup(bank, sky.texture).map(|tex| Plane::Sky { tex }),
            _ => lookup(bank, flat).map(|tex| Plane::Flat { tex, height, light }),
        }
    }

    /// Paint rows `y1 ..= y2` of column `x`.
    pub(super) fn draw_plane_column(
        &self,
        plane: &Plane,
        x: i32,
        y1: i32,
        y2: i32,
        target: &mut FrameBuffer,
    ) {
        let y1 = y1.max(0);
        let y2 = y2.min(self.proj.height as i32 - 1);
        if y1 > y2 || x < 0 || x >= self.proj.width as i32 {
            return;
        }
        match *plane {
            Plane::Flat { tex, height, light } => {
                self.draw_flat_column(tex, (height, light), x, y1..=y2, target)
            }
            Plane::Sky { tex } => self.draw_sky_column(tex, x, y1, y2, target),
        }
    }

    /// Perspective-mapped floor/ceiling; depth is the forward distance of
    /// each pixel's hit point.
    fn draw_flat_column(
        &self,
        tex: &Texture,
        (height, light): (f32, f32),
        x: i32,
        rows: RangeInclusive<i32>,
        target: &mut FrameBuffer,
    ) {
        let (s, c) = self.view.yaw.to_radians().sin_cos();
        let forward = vec2(c, s);
        let right = vec2(s, -c);
        let dist_scale = self.proj.screen_dist;
        let lateral = (x as f32 + 0.5 - self.proj.half_w) / dist_scale;
        let far = self.config.max_draw_distance;

        for y in rows {
            let dy = y as f32 + 0.5 - self.proj.half_h;
            let mut dist = -dist_scale * height / dy;
            // plane seen edge-on or from the wrong side
            if !(dist.is_finite() && dist > 0.0) {
                dist = far;
            }
            let p = self.view.pos + forward * dist + right * (lateral * dist);
            let texel = tex.texel(p.x.floor() as i32, p.y.floor() as i32);
            target.put(x as usize, y as usize, shade(texel, light), dist);
        }
    }

    /// Sky wraps four times around the horizon and is always farthest.
    fn draw_sky_column(&self, tex: &Texture, x: i32, y1: i32, y2: i32, target: &mut FrameBuffer) {
        let angle = norm(self.view.yaw + self.proj.x_to_angle(x));
        let u = ((360.0 - angle) / 90.0 * tex.w as f32) as i32;
        let v_step = tex.h as f32 / self.proj.half_h;

        for y in y1..=y2 {
            let v = ((y as f32 + 0.5) * v_step) as i32;
            target.put(x as usize, y as usize, tex.texel(u, v), f32::MAX);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{RenderConfig, SkyConfig};
    use crate::renderer::software::renderer::Viewer;
    use glam::Vec2;

    fn sw() -> Software {
        let mut sw = Software::new(RenderConfig {
            width: 64,
            height: 40,
            sky: Some(SkyConfig { flat: 5, texture: 1 }),
            ..RenderConfig::default()
        })
        .unwrap();
        sw.view = Viewer {
            pos: Vec2::ZERO,
            yaw: 0.0,
            z: 41.0,
        };
        sw
    }

    #[test]
    fn floor_depth_grows_towards_the_horizon() {
        let sw = sw();
        let tex = Texture::solid("F", 64, 64, 0xFF_112233);
        let mut fb = FrameBuffer::new(64, 40);
        let floor = Plane::Flat {
            tex: &tex,
            height: -41.0,
            light: 1.0,
        };
        sw.draw_plane_column(&floor, 10, 20, 39, &mut fb);

        let near = fb.depth.get(10, 39);
        let far = fb.depth.get(10, 20);
        assert!(near < far);
        // screen_dist 32, eye 41 above, row 39 is 19.5 px below centre
        assert!((near - 32.0 * 41.0 / 19.5).abs() < 1e-2);
        assert_eq!(fb.pixel(10, 30), 0xFF_112233);
        // rows outside the span stay untouched
        assert!(fb.depth.get(10, 19).is_infinite());
    }

    #[test]
    fn sky_is_farthest_and_unshaded() {
        let sw = sw();
        let sky = Texture::solid("SKY", 32, 32, 0xFF_3060C0);
        let mut fb = FrameBuffer::new(64, 40);
        sw.draw_plane_column(&Plane::Sky { tex: &sky }, 0, -5, 7, &mut fb);
        for y in 0..=7 {
            assert_eq!(fb.pixel(0, y), 0xFF_3060C0);
            assert_eq!(fb.depth.get(0, y), f32::MAX);
        }
        assert!(fb.depth.get(0, 8).is_infinite());
    }

    #[test]
    fn sky_flat_resolves_to_sky_texture() {
        let sw = sw();
        let mut bank = TextureBank::default_with_checker();
        bank.insert("SKY1", Texture::solid("SKY1", 8, 8, 1)).unwrap();
        assert!(sw.is_sky(5));
        assert!(matches!(sw.plane(&bank, 5, 10.0, 1.0), Some(Plane::Sky { .. })));
        assert!(matches!(sw.plane(&bank, 0, 10.0, 1.0), Some(Plane::Flat { .. })));
        assert!(sw.plane(&bank, 99, 10.0, 1.0).is_none());
    }
}
