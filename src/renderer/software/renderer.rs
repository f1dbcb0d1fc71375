use glam::Vec2;
use log::{debug, trace, warn};
use smallvec::SmallVec;

use crate::{
    renderer::software::{
        projection::Projection,
        sprites::{DrawSeg, FrameScratch, VisSprite},
    },
    renderer::{ConfigError, FrameBuffer, RenderConfig, Renderer},
    world::{Camera, Level, SpriteObject, TextureBank},
};

/// Inclusive span of screen columns.
#[derive(Default, PartialEq, Debug, Clone, Copy)]
pub struct ClipRange {
    pub first: i32,
    pub last: i32,
}

/// Sorted, disjoint column spans already sealed by solid walls.
///
/// Whatever is *not* covered is the set of columns that may still receive
/// wall pixels this frame.
#[derive(Default, Debug, Clone)]
pub struct SolidSegs {
    ranges: Vec<ClipRange>,
}

impl SolidSegs {
    pub fn init(&mut self, width: i32) {
        self.ranges.clear();
        // Two sentinels so our add routine never has to worry
        // about running off the ends of the array.
        self.ranges.push(ClipRange {
            first: -width,
            last: -1,
        });
        self.ranges.push(ClipRange {
            first: width,
            last: width * 2,
        });
    }

    pub fn ranges(&self) -> &[ClipRange] {
        &self.ranges
    }

    pub fn add(&mut self, first: i32, last: i32) {
        let mut i = 0;
        // 1) skip all spans that end *before* ours minus one
        while i < self.ranges.len() && self.ranges[i].last < first - 1 {
            i += 1;
        }

        // swallowed by an existing span
        if i < self.ranges.len() && first >= self.ranges[i].first && last <= self.ranges[i].last {
            return;
        }

        // 2) merge any overlapping or adjacent spans
        let mut new_first = first;
        let mut new_last = last;
        while i < self.ranges.len() && self.ranges[i].first <= new_last + 1 {
            new_first = new_first.min(self.ranges[i].first);
            new_last = new_last.max(self.ranges[i].last);
            self.ranges.remove(i);
        }

        // 3) insert the coalesced span in its sorted place
        self.ranges.insert(
            i,
            ClipRange {
                first: new_first,
                last: new_last,
            },
        );
    }

    /// Maximal runs of `first ..= last` not yet covered.
    pub fn open_runs(&self, first: i32, last: i32) -> SmallVec<[ClipRange; 8]> {
        let mut out = SmallVec::new();
        let mut start = first;
        for r in &self.ranges {
            if r.last < start {
                continue;
            }
            if r.first > last {
                break;
            }
            if r.first > start {
                out.push(ClipRange {
                    first: start,
                    last: r.first - 1,
                });
            }
            start = r.last + 1;
            if start > last {
                break;
            }
        }
        if start <= last {
            out.push(ClipRange { first: start, last });
        }
        out
    }

    /// Every column in `0 .. width` is sealed.
    pub fn is_full(&self, width: i32) -> bool {
        self.ranges
            .iter()
            .any(|r| r.first <= 0 && r.last >= width - 1)
    }
}

/// Counters gathered while drawing one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes: usize,
    pub subsectors: usize,
    pub segs: usize,
    pub drawsegs: usize,
    pub sprites: usize,
    /// Traversal stopped because every column was sealed.
    pub early_exit: bool,
}

/// Eye position for the frame in progress.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct Viewer {
    pub pos: Vec2,
    pub yaw: f32,
    /// Absolute eye height.
    pub z: f32,
}

/// Read-only inputs shared by every stage of one frame.
pub(super) struct FrameCtx<'a> {
    pub level: &'a Level,
    pub camera: Camera,
    pub bank: &'a TextureBank,
}

/// Doom-style column renderer.
pub struct Software {
    pub(super) config: RenderConfig,
    pub(super) proj: Projection,

    /* clip bands survive across segs; inclusive "last sealed" rows */
    pub(super) upper_clip: Vec<i16>,
    pub(super) lower_clip: Vec<i16>,
    pub(super) solid_segs: SolidSegs,

    pub(super) drawsegs: Vec<DrawSeg>,
    pub(super) frame_scratch: FrameScratch,
    pub(super) sprites: Vec<VisSprite>,

    pub(super) view: Viewer,
    pub(super) traversing: bool,
    pub(super) stats: FrameStats,
    /// Cleared when the target's size was rejected; nothing is drawn then.
    frame_ok: bool,
}

impl Software {
    pub fn new(config: RenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut sw = Self {
            proj: Projection::default(),
            config,
            upper_clip: Vec::new(),
            lower_clip: Vec::new(),
            solid_segs: SolidSegs::default(),
            drawsegs: Vec::new(),
            frame_scratch: FrameScratch::default(),
            sprites: Vec::new(),
            view: Viewer::default(),
            traversing: false,
            stats: FrameStats::default(),
            frame_ok: true,
        };
        sw.resize(sw.config.width, sw.config.height);
        Ok(sw)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Counters of the last frame.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn drawsegs(&self) -> &[DrawSeg] {
        &self.drawsegs
    }

    /// Opening snapshot of a draw-seg (top rows, bottom rows).
    pub fn drawseg_clips(&self, ds: &DrawSeg) -> (&[i16], &[i16]) {
        (
            self.frame_scratch.get(ds.top_clip.clone()),
            self.frame_scratch.get(ds.bot_clip.clone()),
        )
    }

    pub fn solid_segs(&self) -> &[ClipRange] {
        self.solid_segs.ranges()
    }

    pub fn upper_clip(&self) -> &[i16] {
        &self.upper_clip
    }

    pub fn lower_clip(&self) -> &[i16] {
        &self.lower_clip
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.config.width = w;
        self.config.height = h;
        self.proj = Projection::new(
            w,
            h,
            self.config.fov,
            self.config.min_scale,
            self.config.max_scale,
        );
        self.upper_clip.resize(w, -1);
        self.lower_clip.resize(w, h as i16);
    }
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn begin_frame(&mut self, target: &mut FrameBuffer) {
        self.stats = FrameStats::default();
        target.clear(self.config.clear_color);

        // follow the target if its resolution changed
        if target.width() != self.proj.width || target.height() != self.proj.height {
            let resized = RenderConfig {
                width: target.width(),
                height: target.height(),
                ..self.config.clone()
            };
            if let Err(e) = resized.validate() {
                warn!("frame skipped: {e}");
                self.frame_ok = false;
                return;
            }
            debug!(
                "software renderer resized {}x{} -> {}x{}",
                self.proj.width,
                self.proj.height,
                target.width(),
                target.height()
            );
            self.resize(target.width(), target.height());
        }
        self.frame_ok = true;

        // fully open clips at start of frame
        self.upper_clip.fill(-1);
        self.lower_clip.fill(self.proj.height as i16);

        self.solid_segs.init(self.proj.width as i32);

        self.sprites.clear();
        self.drawsegs.clear();
        self.frame_scratch.reset();
    }

    fn draw_level(
        &mut self,
        level: &Level,
        camera: &Camera,
        bank: &TextureBank,
        target: &mut FrameBuffer,
    ) {
        if !self.frame_ok {
            return;
        }
        let eye = camera.pos().truncate();
        let floor_h = match level.sector_at(eye) {
            Some((_, sector)) => sector.floor_h,
            None => {
                debug!("camera at {eye} is outside every subsector");
                0.0
            }
        };
        self.view = Viewer {
            pos: eye,
            yaw: camera.yaw(),
            z: floor_h + camera.pos().z,
        };

        // box culling must agree with the projection's FOV
        let ctx = FrameCtx {
            level,
            camera: Camera::new(camera.pos(), camera.yaw(), self.proj.fov),
            bank,
        };
        self.traverse(&ctx, target);
        self.stats.drawsegs = self.drawsegs.len();
    }

    fn draw_sprites(
        &mut self,
        objects: &[SpriteObject],
        level: &Level,
        camera: &Camera,
        bank: &TextureBank,
        target: &mut FrameBuffer,
    ) {
        if !self.frame_ok {
            return;
        }
        let ctx = FrameCtx {
            level,
            camera: Camera::new(camera.pos(), camera.yaw(), self.proj.fov),
            bank,
        };
        self.composite_sprites(objects, &ctx, target);

        let s = &self.stats;
        trace!(
            "frame: nodes={} subsectors={} segs={} drawsegs={} sprites={} early_exit={}",
            s.nodes, s.subsectors, s.segs, s.drawsegs, s.sprites, s.early_exit
        );
    }
}
