//! ---------------------------------------------------------------------------
//! Classic software (CPU) column renderer
//!
//! * Fills a [`FrameBuffer`](crate::renderer::FrameBuffer) in **0xAARRGGBB**
//!   format together with its per-pixel depth.
//! * Walls, floors and ceilings come out of a front-to-back BSP walk that
//!   seals screen columns as it goes; the walk stops once all are sealed.
//! * Sprites are composited afterwards against the depth buffer.
//! ---------------------------------------------------------------------------

mod bsp;
mod planes;
mod projection;
mod renderer;
mod segs;
mod sprites;

pub use projection::Projection;
pub use renderer::{ClipRange, FrameStats, SolidSegs, Software};
pub use sprites::{DrawSeg, Silhouette, VisSprite};
