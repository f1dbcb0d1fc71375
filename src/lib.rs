//! Software BSP renderer for Doom-style levels.
//!
//! * [`world`] holds the immutable level graph, camera and texture bank.
//! * [`renderer`] walks the BSP front-to-back and rasterises walls, flats and
//!   sprites into a caller-owned [`renderer::FrameBuffer`].

pub mod renderer;
pub mod world;
