pub mod angle;
mod bsp;
mod builder;
mod camera;
mod geometry;
mod object;
mod texture;

pub use geometry::{
    Aabb, Child, Level, Linedef, LinedefFlags, LinedefId, Node, NodeId, Sector, SectorId, Seg,
    SegmentId, Side, Sidedef, SidedefId, Subsector, SubsectorId, Vertex, VertexId,
};

pub use bsp::{CHILD_MASK, SUBSECTOR_BIT};
pub use builder::{LevelBuilder, LevelError};
pub use camera::Camera;
pub use object::{Rotation, SpriteFrame, SpriteObject};

pub use texture::{NO_TEXTURE, Texture, TextureBank, TextureError, TextureId, shade};
