//! Rendering abstraction layer.
//!
//! *The rest of the engine never touches a pixel buffer directly.*
//! The caller owns a [`FrameBuffer`] (colour + depth) and hands it to a type
//! implementing [`Renderer`] once per game-loop iteration.
//!
//! * Presentation (blitting to a window, double-buffering) stays with the
//!   caller; the renderer only writes into the buffer it is given.
//! * A helper blanket-impl [`RendererExt`] adds `draw_frame` so call-sites
//!   stay short.

mod config;
mod depth;
pub mod software;

pub use config::{ConfigError, RenderConfig, SkyConfig};
pub use depth::DepthBuffer;
pub use software::{FrameStats, Software};

use crate::world::{Camera, Level, SpriteObject, TextureBank};

/// Pixel format of the software frame-buffer (0xAARRGGBB).
pub type Rgba = u32;

/// Colour and depth target for one frame.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pub pixels: Vec<Rgba>,
    pub depth: DepthBuffer,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            depth: DepthBuffer::new(width, height),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Fill colour with `color` and push every depth back to infinity.
    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
        self.depth.reset();
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.pixels[y * self.width + x]
    }

    /// Unconditional write of colour + depth (wall pass).
    #[inline(always)]
    pub(crate) fn put(&mut self, x: usize, y: usize, color: Rgba, depth: f32) {
        let idx = y * self.width + x;
        self.pixels[idx] = color;
        self.depth.set(idx, depth);
    }
}

/// A renderer that draws one frame into a caller-owned [`FrameBuffer`].
pub trait Renderer {
    /// Reset all per-frame state and clear the target.
    fn begin_frame(&mut self, target: &mut FrameBuffer);

    /// Walls, floors and ceilings, front-to-back.
    fn draw_level(
        &mut self,
        level: &Level,
        camera: &Camera,
        bank: &TextureBank,
        target: &mut FrameBuffer,
    );

    /// Movable objects, depth-tested against whatever is already drawn.
    fn draw_sprites(
        &mut self,
        objects: &[SpriteObject],
        level: &Level,
        camera: &Camera,
        bank: &TextureBank,
        target: &mut FrameBuffer,
    );
}

/// Convenience blanket-impl with a one-liner `draw_frame` adaptor.
pub trait RendererExt: Renderer {
    fn draw_frame(
        &mut self,
        level: &Level,
        camera: &Camera,
        objects: &[SpriteObject],
        bank: &TextureBank,
        target: &mut FrameBuffer,
    ) {
        self.begin_frame(target);
        self.draw_level(level, camera, bank, target);
        self.draw_sprites(objects, level, camera, bank, target);
    }
}
impl<T: Renderer + ?Sized> RendererExt for T {}
