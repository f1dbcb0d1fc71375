use bitflags::bitflags;
use glam::Vec2;

use crate::world::texture::TextureId;

pub type SubsectorId = u16;
pub type LinedefId = u16;
pub type SegmentId = u16;
pub type VertexId = u16;
pub type SidedefId = u16;
pub type SectorId = u16;
pub type NodeId = u16;

/// Runtime snapshot of one map.
///
/// Everything but sector heights is immutable after load; door and lift
/// logic writes `sectors[..].floor_h / ceil_h` directly between frames.
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub linedefs: Vec<Linedef>,
    pub sidedefs: Vec<Sidedef>,
    pub sectors: Vec<Sector>,
    pub segs: Vec<Seg>,
    pub subsectors: Vec<Subsector>,
    pub nodes: Vec<Node>,
}

/*--------------------------- linedefs -------------------------------*/

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LinedefFlags: u16 {
        const IMPASSABLE      = 0x0001;
        const BLOCK_MONSTERS  = 0x0002;
        const TWO_SIDED       = 0x0004;
        const UPPER_UNPEGGED  = 0x0008;
        const LOWER_UNPEGGED  = 0x0010;
        const SECRET          = 0x0020;
        const BLOCK_SOUND     = 0x0040;
        const NOT_ON_MAP      = 0x0080;
        const ALREADY_ON_MAP  = 0x0100;
    }
}

#[derive(Clone, Debug)]
pub struct Linedef {
    pub v1: VertexId,
    pub v2: VertexId,
    pub flags: LinedefFlags,
    pub special: u16,
    pub tag: u16,
    pub right_sidedef: SidedefId,
    pub left_sidedef: Option<SidedefId>,
}

/*--------------------------- sidedefs -------------------------------*/

/// `None` textures are the "-" marker: nothing is drawn for that part.
#[derive(Clone, Debug)]
pub struct Sidedef {
    pub x_off: f32,
    pub y_off: f32,
    pub upper: Option<TextureId>,
    pub lower: Option<TextureId>,
    pub middle: Option<TextureId>,
    pub sector: SectorId,
}

/*----------------------- simple primitives --------------------------*/

#[derive(Clone, Copy, Debug)]
pub struct Vertex {
    pub pos: Vec2,
}

/// Which side of its linedef a seg runs along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Right,
    Left,
}

#[derive(Clone, Debug)]
pub struct Seg {
    pub v1: VertexId,
    pub v2: VertexId,
    /// World angle of `v1 → v2`, degrees.
    pub angle: f32,
    pub linedef: LinedefId,
    pub side: Side,
    /// Distance from the linedef start to `v1`, for texture continuity.
    pub offset: f32,
    pub front_sector: SectorId,
    pub back_sector: Option<SectorId>,
}

#[derive(Clone, Debug)]
pub struct Subsector {
    pub seg_count: u16,
    pub first_seg: SegmentId,
    pub sector: SectorId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

/// Reference to a BSP child: either another node or a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Child {
    Node(NodeId),
    Subsector(SubsectorId),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    /// `[front, back]`
    pub bbox: [Aabb; 2],
    /// `[front, back]`
    pub child: [Child; 2],
}

#[derive(Clone, Debug)]
pub struct Sector {
    pub floor_h: f32,
    pub ceil_h: f32,
    pub floor_tex: TextureId,
    pub ceil_tex: TextureId,
    /// 0.0 (black) ..= 1.0 (full bright)
    pub light: f32,
    pub special: i16,
    pub tag: i16,
}

impl Level {
    #[inline]
    pub fn vertex(&self, id: VertexId) -> Option<Vec2> {
        self.vertices.get(id as usize).map(|v| v.pos)
    }

    /// Segs belonging to `ss`, or an empty slice when the range is bogus.
    pub fn segs_of_subsector(&self, ss: &Subsector) -> &[Seg] {
        let start = ss.first_seg as usize;
        let end = start + ss.seg_count as usize;
        self.segs.get(start..end).unwrap_or(&[])
    }

    /// Front sidedef of the seg (the one on the seg's own side).
    pub fn front_sidedef(&self, seg: &Seg) -> Option<&Sidedef> {
        let ld = self.linedefs.get(seg.linedef as usize)?;
        let id = match seg.side {
            Side::Right => Some(ld.right_sidedef),
            Side::Left => ld.left_sidedef,
        }?;
        self.sidedefs.get(id as usize)
    }
}
