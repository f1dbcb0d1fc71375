//! Programmatic level construction + structural validation.
//!
//! Loaders (WAD, procedural generators, tests) push raw records and call
//! [`LevelBuilder::build`]; the renderer only ever sees levels that passed
//! [`Level::validate`].

use glam::{Vec2, vec2};

use crate::world::angle::{bams_to_degrees, point_to_angle};
use crate::world::geometry::{
    Aabb, Child, Level, Linedef, LinedefFlags, LinedefId, Node, NodeId, Sector, SectorId, Seg,
    SegmentId, Side, Sidedef, SidedefId, Subsector, SubsectorId, Vertex, VertexId,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level has no subsectors")]
    Empty,
    #[error("linedef {linedef} references missing vertex {vertex}")]
    BadVertex { linedef: LinedefId, vertex: VertexId },
    #[error("linedef {linedef} references missing sidedef {sidedef}")]
    BadSidedef { linedef: LinedefId, sidedef: SidedefId },
    #[error("sidedef {sidedef} references missing sector {sector}")]
    BadSector { sidedef: SidedefId, sector: SectorId },
    #[error("seg {seg} references missing linedef {linedef}")]
    BadLinedef { seg: SegmentId, linedef: LinedefId },
    #[error("seg {seg} references missing vertex {vertex}")]
    BadSegVertex { seg: SegmentId, vertex: VertexId },
    #[error("seg {seg} runs along the missing left side of linedef {linedef}")]
    MissingSide { seg: SegmentId, linedef: LinedefId },
    #[error("subsector {subsector} seg range is out of bounds or empty")]
    BadSegRange { subsector: SubsectorId },
    #[error("node {node} references missing child {child:#06x}")]
    BadChild { node: NodeId, child: u16 },
    #[error("node {node} points forward to node {child}")]
    NodeCycle { node: NodeId, child: NodeId },
}

#[derive(Clone, Debug)]
struct PendingSeg {
    v1: VertexId,
    v2: VertexId,
    angle: Option<f32>,
    linedef: LinedefId,
    side: Side,
    offset: f32,
}

#[derive(Default)]
pub struct LevelBuilder {
    name: String,
    vertices: Vec<Vertex>,
    linedefs: Vec<Linedef>,
    sidedefs: Vec<Sidedef>,
    sectors: Vec<Sector>,
    segs: Vec<PendingSeg>,
    subsectors: Vec<(SegmentId, u16)>,
    nodes: Vec<Node>,
}

impl LevelBuilder {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn vertex(&mut self, x: f32, y: f32) -> VertexId {
        self.vertices.push(Vertex { pos: vec2(x, y) });
        (self.vertices.len() - 1) as VertexId
    }

    pub fn sector(&mut self, sector: Sector) -> SectorId {
        self.sectors.push(sector);
        (self.sectors.len() - 1) as SectorId
    }

    pub fn sidedef(&mut self, sidedef: Sidedef) -> SidedefId {
        self.sidedefs.push(sidedef);
        (self.sidedefs.len() - 1) as SidedefId
    }

    pub fn linedef(
        &mut self,
        v1: VertexId,
        v2: VertexId,
        right: SidedefId,
        left: Option<SidedefId>,
        flags: LinedefFlags,
    ) -> LinedefId {
        let mut flags = flags;
        if left.is_some() {
            flags |= LinedefFlags::TWO_SIDED;
        }
        self.linedefs.push(Linedef {
            v1,
            v2,
            flags,
            special: 0,
            tag: 0,
            right_sidedef: right,
            left_sidedef: left,
        });
        (self.linedefs.len() - 1) as LinedefId
    }

    /// Seg covering the whole linedef on `side`.
    pub fn seg(&mut self, linedef: LinedefId, side: Side) -> SegmentId {
        let (a, b) = self
            .linedefs
            .get(linedef as usize)
            .map(|ld| (ld.v1, ld.v2))
            .unwrap_or((VertexId::MAX, VertexId::MAX));
        let (v1, v2) = match side {
            Side::Right => (a, b),
            Side::Left => (b, a),
        };
        self.split_seg(linedef, side, v1, v2)
    }

    /// Seg covering part of a linedef; the texture offset is derived from
    /// the distance to the linedef start on that side.
    pub fn split_seg(
        &mut self,
        linedef: LinedefId,
        side: Side,
        v1: VertexId,
        v2: VertexId,
    ) -> SegmentId {
        let offset = self
            .linedefs
            .get(linedef as usize)
            .and_then(|ld| {
                let start = match side {
                    Side::Right => ld.v1,
                    Side::Left => ld.v2,
                };
                let s = self.vertices.get(start as usize)?.pos;
                let p = self.vertices.get(v1 as usize)?.pos;
                Some(s.distance(p))
            })
            .unwrap_or(0.0);
        self.segs.push(PendingSeg {
            v1,
            v2,
            angle: None,
            linedef,
            side,
            offset,
        });
        (self.segs.len() - 1) as SegmentId
    }

    /// Seg straight from the on-disk record (BAMS angle, integer offset).
    pub fn raw_seg(
        &mut self,
        v1: VertexId,
        v2: VertexId,
        angle_bams: u16,
        linedef: LinedefId,
        side: Side,
        offset: f32,
    ) -> SegmentId {
        self.segs.push(PendingSeg {
            v1,
            v2,
            angle: Some(bams_to_degrees(angle_bams)),
            linedef,
            side,
            offset,
        });
        (self.segs.len() - 1) as SegmentId
    }

    pub fn subsector(&mut self, first_seg: SegmentId, seg_count: u16) -> SubsectorId {
        self.subsectors.push((first_seg, seg_count));
        (self.subsectors.len() - 1) as SubsectorId
    }

    /// Partition through `(x, y)` along `(dx, dy)`; the front child lies on
    /// the right of the direction.
    pub fn node(
        &mut self,
        origin: Vec2,
        dir: Vec2,
        front_box: Aabb,
        back_box: Aabb,
        front: Child,
        back: Child,
    ) -> NodeId {
        self.nodes.push(Node {
            x: origin.x,
            y: origin.y,
            dx: dir.x,
            dy: dir.y,
            bbox: [front_box, back_box],
            child: [front, back],
        });
        (self.nodes.len() - 1) as NodeId
    }

    pub fn build(self) -> Result<Level, LevelError> {
        let mut level = Level {
            name: self.name,
            vertices: self.vertices,
            linedefs: self.linedefs,
            sidedefs: self.sidedefs,
            sectors: self.sectors,
            segs: Vec::with_capacity(self.segs.len()),
            subsectors: Vec::with_capacity(self.subsectors.len()),
            nodes: self.nodes,
        };

        for (i, p) in self.segs.iter().enumerate() {
            let seg = i as SegmentId;
            let ld = level
                .linedefs
                .get(p.linedef as usize)
                .ok_or(LevelError::BadLinedef {
                    seg,
                    linedef: p.linedef,
                })?;
            let (front_sd, back_sd) = match p.side {
                Side::Right => (Some(ld.right_sidedef), ld.left_sidedef),
                Side::Left => (ld.left_sidedef, Some(ld.right_sidedef)),
            };
            let front_sd = front_sd.ok_or(LevelError::MissingSide {
                seg,
                linedef: p.linedef,
            })?;
            let sector_of = |sd: SidedefId| {
                level
                    .sidedefs
                    .get(sd as usize)
                    .map(|s| s.sector)
                    .ok_or(LevelError::BadSidedef {
                        linedef: p.linedef,
                        sidedef: sd,
                    })
            };
            let front_sector = sector_of(front_sd)?;
            let back_sector = back_sd.map(sector_of).transpose()?;

            let pos = |v: VertexId| {
                level
                    .vertex(v)
                    .ok_or(LevelError::BadSegVertex { seg, vertex: v })
            };
            let (a, b) = (pos(p.v1)?, pos(p.v2)?);
            level.segs.push(Seg {
                v1: p.v1,
                v2: p.v2,
                angle: p.angle.unwrap_or_else(|| point_to_angle(a, b)),
                linedef: p.linedef,
                side: p.side,
                offset: p.offset,
                front_sector,
                back_sector,
            });
        }

        for (i, &(first_seg, seg_count)) in self.subsectors.iter().enumerate() {
            let sector = level
                .segs
                .get(first_seg as usize)
                .map(|s| s.front_sector)
                .ok_or(LevelError::BadSegRange {
                    subsector: i as SubsectorId,
                })?;
            level.subsectors.push(Subsector {
                seg_count,
                first_seg,
                sector,
            });
        }

        level.validate()?;
        Ok(level)
    }
}

impl Level {
    /// Structural check of every cross reference.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.subsectors.is_empty() {
            return Err(LevelError::Empty);
        }

        for (i, ld) in self.linedefs.iter().enumerate() {
            let linedef = i as LinedefId;
            for vertex in [ld.v1, ld.v2] {
                if self.vertices.get(vertex as usize).is_none() {
                    return Err(LevelError::BadVertex { linedef, vertex });
                }
            }
            for sidedef in std::iter::once(ld.right_sidedef).chain(ld.left_sidedef) {
                if self.sidedefs.get(sidedef as usize).is_none() {
                    return Err(LevelError::BadSidedef { linedef, sidedef });
                }
            }
        }

        for (i, sd) in self.sidedefs.iter().enumerate() {
            if self.sectors.get(sd.sector as usize).is_none() {
                return Err(LevelError::BadSector {
                    sidedef: i as SidedefId,
                    sector: sd.sector,
                });
            }
        }

        for (i, ss) in self.subsectors.iter().enumerate() {
            let end = ss.first_seg as usize + ss.seg_count as usize;
            if ss.seg_count == 0 || end > self.segs.len() {
                return Err(LevelError::BadSegRange {
                    subsector: i as SubsectorId,
                });
            }
        }

        // children always precede their parent, so the graph is a tree
        for (i, node) in self.nodes.iter().enumerate() {
            let node_id = i as NodeId;
            for child in node.child {
                let ok = match child {
                    Child::Node(n) => (n as usize) < self.nodes.len(),
                    Child::Subsector(s) => (s as usize) < self.subsectors.len(),
                };
                if !ok {
                    return Err(LevelError::BadChild {
                        node: node_id,
                        child: child.to_raw(),
                    });
                }
                if let Child::Node(n) = child
                    && n >= node_id
                {
                    return Err(LevelError::NodeCycle {
                        node: node_id,
                        child: n,
                    });
                }
            }
        }
        Ok(())
    }
}
