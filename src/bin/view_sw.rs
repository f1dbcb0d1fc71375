//! view_sw - walk around a generated demo map with the software renderer.
//!
//! ```bash
//! cargo run --release --bin view_sw -- --width 640 --height 400 --scale 2
//! ```
//!
//! Arrows / WASD move and turn (Alt + ←/→ strafes), Shift runs, Esc quits.

use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use glam::{Vec2, vec2, vec3};
use log::info;
use minifb::{Key, Scale, Window, WindowOptions};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use softdoom_rs::{
    renderer::{FrameBuffer, RenderConfig, RendererExt, SkyConfig, Software},
    world::{
        Aabb, Camera, Child, Level, LevelBuilder, LinedefFlags, Rotation, Sector, SectorId,
        Side, Sidedef, SidedefId, SpriteFrame, SpriteObject, Texture, TextureBank, TextureId,
        VertexId,
    },
};

const PLAYER_HEIGHT: f32 = 41.0;
const WALK_SPEED: f32 = 6.0;
const TURN_SPEED: f32 = 3.5;

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Render width in pixels
    #[arg(long, default_value_t = 640)]
    width: usize,

    /// Render height in pixels
    #[arg(long, default_value_t = 400)]
    height: usize,

    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 90.0)]
    fov: f32,

    /// Window scale factor (1, 2 or 4)
    #[arg(long, default_value_t = 2)]
    scale: u8,

    /// Target frames per second
    #[arg(long, default_value_t = 35)]
    fps: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: log::LevelFilter,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    TermLogger::init(
        opts.log_level,
        ConfigBuilder::default().build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let (bank, tex) = demo_textures().context("building demo textures")?;
    let level = demo_level(&tex).context("building demo level")?;
    let objects = demo_objects(&tex);
    info!(
        "level {}: {} sectors, {} segs, {} subsectors, {} nodes",
        level.name,
        level.sectors.len(),
        level.segs.len(),
        level.subsectors.len(),
        level.nodes.len()
    );

    let config = RenderConfig {
        width: opts.width,
        height: opts.height,
        fov: opts.fov,
        sky: Some(SkyConfig {
            flat: tex.sky_flat,
            texture: tex.sky,
        }),
        ..RenderConfig::default()
    };
    let mut renderer = Software::new(config)?;
    let mut frame = FrameBuffer::new(opts.width, opts.height);
    let mut camera = Camera::new(vec3(-400.0, 0.0, PLAYER_HEIGHT), 0.0, opts.fov);

    let scale = match opts.scale {
        1 => Scale::X1,
        4 => Scale::X4,
        _ => Scale::X2,
    };
    let mut win = Window::new(
        "softdoom - software BSP renderer",
        opts.width,
        opts.height,
        WindowOptions {
            scale,
            ..WindowOptions::default()
        },
    )?;
    win.set_target_fps(opts.fps);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        steer(&win, &mut camera);

        let t0 = Instant::now();
        renderer.draw_frame(&level, &camera, &objects, &bank, &mut frame);
        acc_time += t0.elapsed();
        acc_frames += 1;

        win.update_with_buffer(&frame.pixels, opts.width, opts.height)?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames.max(1) as f64;
            let stats = renderer.stats();
            info!(
                "avg render: {avg_ms:.2} ms, {} subsectors, {} drawsegs, {} sprites",
                stats.subsectors, stats.drawsegs, stats.sprites
            );
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}

/// Noclip movement straight from the keyboard state.
fn steer(win: &Window, camera: &mut Camera) {
    let run = if win.is_key_down(Key::LeftShift) || win.is_key_down(Key::RightShift) {
        2.0
    } else {
        1.0
    };
    let mut forward = 0.0;
    let mut strafe = 0.0;
    let mut turn = 0.0;

    if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
        forward += 1.0;
    }
    if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
        forward -= 1.0;
    }

    let alt = win.is_key_down(Key::LeftAlt) || win.is_key_down(Key::RightAlt);
    if alt {
        /* Alt + ←/→  = strafe */
        if win.is_key_down(Key::Left) {
            strafe -= 1.0;
        }
        if win.is_key_down(Key::Right) {
            strafe += 1.0;
        }
    } else {
        /* plain ←/→   = turn   */
        if win.is_key_down(Key::Left) {
            turn += 1.0;
        }
        if win.is_key_down(Key::Right) {
            turn -= 1.0;
        }
    }
    if win.is_key_down(Key::A) {
        strafe -= 1.0;
    }
    if win.is_key_down(Key::D) {
        strafe += 1.0;
    }

    camera.turn(turn * TURN_SPEED * run);
    camera.step(forward * WALK_SPEED * run, strafe * WALK_SPEED * run);
}

/*──────────────────────────── demo content ────────────────────────────*/

/// Ids of everything generated for the demo.
struct DemoTextures {
    brick: TextureId,
    stone: TextureId,
    metal: TextureId,
    floor: TextureId,
    ceiling: TextureId,
    step: TextureId,
    sky_flat: TextureId,
    sky: TextureId,
    pillar: TextureId,
    lamp: TextureId,
    guard: [TextureId; 5],
}

/// Cheap deterministic per-texel noise.
fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = x
        .wrapping_mul(0x27d4_eb2d)
        .wrapping_add(y.wrapping_mul(0x1656_67b1))
        .wrapping_add(seed.wrapping_mul(0x9e37_79b9));
    h ^= h >> 15;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^ (h >> 13)
}

fn rgb(r: u32, g: u32, b: u32) -> u32 {
    0xFF00_0000 | (r.min(255) << 16) | (g.min(255) << 8) | b.min(255)
}

fn generate(name: &str, w: usize, h: usize, f: impl Fn(u32, u32) -> u32) -> Texture {
    let pixels = (0..h)
        .flat_map(|y| (0..w).map(move |x| (x as u32, y as u32)))
        .map(|(x, y)| f(x, y))
        .collect();
    Texture {
        name: name.into(),
        w,
        h,
        pixels,
    }
}

fn demo_textures() -> anyhow::Result<(TextureBank, DemoTextures)> {
    let mut bank = TextureBank::default_with_checker();

    let brick = bank.insert(
        "BRICK",
        generate("BRICK", 64, 64, |x, y| {
            let row = y / 16;
            let shift = if row % 2 == 0 { 0 } else { 16 };
            if y % 16 == 0 || (x + shift) % 32 == 0 {
                rgb(70, 70, 60)
            } else {
                let n = hash(x, y, 1) % 40;
                rgb(140 + n, 50 + n / 2, 40)
            }
        }),
    )?;
    let stone = bank.insert(
        "STONE",
        generate("STONE", 64, 128, |x, y| {
            let n = hash(x / 2, y / 2, 2) % 48;
            rgb(90 + n, 90 + n, 96 + n)
        }),
    )?;
    let metal = bank.insert(
        "METAL",
        generate("METAL", 32, 32, |x, y| {
            if x % 16 == 0 || y % 16 == 0 {
                rgb(40, 40, 48)
            } else {
                rgb(110, 120, 135)
            }
        }),
    )?;
    let floor = bank.insert(
        "FLOOR",
        generate("FLOOR", 64, 64, |x, y| {
            let n = hash(x, y, 3) % 24;
            if (x / 32 + y / 32) % 2 == 0 {
                rgb(100 + n, 80 + n, 60)
            } else {
                rgb(70 + n, 55 + n, 40)
            }
        }),
    )?;
    let ceiling = bank.insert(
        "CEIL",
        generate("CEIL", 64, 64, |x, y| {
            if x % 32 == 0 || y % 32 == 0 {
                rgb(30, 30, 30)
            } else {
                rgb(150, 150, 140)
            }
        }),
    )?;
    let step = bank.insert(
        "STEP",
        generate("STEP", 64, 64, |x, y| {
            let n = hash(x, y, 4) % 32;
            rgb(60 + n, 110 + n, 60)
        }),
    )?;
    let sky_flat = bank.insert("F_SKY1", Texture::solid("F_SKY1", 1, 1, rgb(0, 0, 0)))?;
    let sky = bank.insert(
        "SKY1",
        generate("SKY1", 256, 128, |x, y| {
            let cloud = hash(x / 8, y / 4, 5) % 100 > 80;
            if cloud {
                rgb(220, 220, 230)
            } else {
                rgb(40 + y / 2, 80 + y / 2, 170 + y / 3)
            }
        }),
    )?;

    // transparent border: alpha 0 outside the shape
    let pillar = bank.insert(
        "PILLAR",
        generate("PILLAR", 16, 56, |x, y| {
            if (3..13).contains(&x) || y > 48 {
                let n = hash(x, y, 6) % 30;
                rgb(150 + n, 150 + n, 120)
            } else {
                0
            }
        }),
    )?;
    let lamp = bank.insert(
        "LAMP",
        generate("LAMP", 16, 24, |x, y| {
            let dx = x as i32 - 8;
            let dy = y as i32 - 8;
            if dx * dx + dy * dy < 36 {
                rgb(255, 240, 160)
            } else if (6..10).contains(&x) && y >= 12 {
                rgb(60, 60, 60)
            } else {
                0
            }
        }),
    )?;

    // five distinct views; 5..7 reuse 3..1 mirrored
    let mut guard = [0; 5];
    for (i, slot) in guard.iter_mut().enumerate() {
        let name = format!("GUARD{i}");
        *slot = bank.insert(
            name.clone(),
            generate(&name, 24, 48, |x, y| {
                let body = (4..20).contains(&x) && y >= 10;
                let head = (8..16).contains(&x) && y < 10;
                // a marker column shows which way the guard faces
                let marker = x as usize == 4 + i * 4;
                match (head, body, marker) {
                    (true, ..) => rgb(220, 180, 150),
                    (_, true, true) => rgb(250, 250, 60),
                    (_, true, false) => rgb(40, 90 + (i as u32) * 30, 40),
                    _ => 0,
                }
            }),
        )?;
    }

    Ok((
        bank,
        DemoTextures {
            brick,
            stone,
            metal,
            floor,
            ceiling,
            step,
            sky_flat,
            sky,
            pillar,
            lamp,
            guard,
        },
    ))
}

fn wall(middle: Option<TextureId>, sector: SectorId) -> Sidedef {
    Sidedef {
        x_off: 0.0,
        y_off: 0.0,
        upper: None,
        lower: None,
        middle,
        sector,
    }
}

/// One-sided linedef + its seg; returns the seg id.
fn solid(b: &mut LevelBuilder, v1: VertexId, v2: VertexId, side: SidedefId) -> u16 {
    let ld = b.linedef(v1, v2, side, None, LinedefFlags::IMPASSABLE);
    b.seg(ld, Side::Right)
}

/// Hall (west), doorway (middle) and sky courtyard (east).
///
/// ```text
///   y=256 +-------------+   +-------------+
///         |             |   |             |
///    y=96 |    HALL     +---+  COURTYARD  |
///         |             | D |    (sky)    |
///   y=-96 |             +---+             |
///         |             |   |             |
///  y=-256 +-------------+   +-------------+
///       x=-512       x=-16 x=16         x=512
/// ```
fn demo_level(tex: &DemoTextures) -> anyhow::Result<Level> {
    let mut b = LevelBuilder::new("DEMO");

    let hall = b.sector(Sector {
        floor_h: 0.0,
        ceil_h: 160.0,
        floor_tex: tex.floor,
        ceil_tex: tex.ceiling,
        light: 1.0,
        special: 0,
        tag: 0,
    });
    let door = b.sector(Sector {
        floor_h: 24.0,
        ceil_h: 120.0,
        floor_tex: tex.step,
        ceil_tex: tex.ceiling,
        light: 0.7,
        special: 0,
        tag: 0,
    });
    let yard = b.sector(Sector {
        floor_h: 24.0,
        ceil_h: 256.0,
        floor_tex: tex.step,
        ceil_tex: tex.sky_flat,
        light: 0.85,
        special: 0,
        tag: 0,
    });

    let hall_wall = b.sidedef(wall(Some(tex.brick), hall));
    let yard_wall = b.sidedef(wall(Some(tex.stone), yard));
    let door_wall = b.sidedef(wall(Some(tex.metal), door));
    let hall_face = b.sidedef(Sidedef {
        upper: Some(tex.brick),
        lower: Some(tex.metal),
        ..wall(None, hall)
    });
    let door_side = b.sidedef(wall(None, door));
    let yard_face = b.sidedef(Sidedef {
        upper: Some(tex.stone),
        ..wall(None, yard)
    });

    let mut v = |x: f32, y: f32| b.vertex(x, y);
    let h_nw = v(-512.0, 256.0);
    let h_ne = v(-16.0, 256.0);
    let h_dn = v(-16.0, 96.0);
    let h_ds = v(-16.0, -96.0);
    let h_se = v(-16.0, -256.0);
    let h_sw = v(-512.0, -256.0);
    let y_nw = v(16.0, 256.0);
    let y_ne = v(512.0, 256.0);
    let y_se = v(512.0, -256.0);
    let y_sw = v(16.0, -256.0);
    let y_ds = v(16.0, -96.0);
    let y_dn = v(16.0, 96.0);

    // portals: right side faces west
    let west_gap = b.linedef(h_dn, h_ds, hall_face, Some(door_side), LinedefFlags::empty());
    let east_gap = b.linedef(y_dn, y_ds, door_side, Some(yard_face), LinedefFlags::empty());

    // hall, clockwise
    let hall_first = solid(&mut b, h_nw, h_ne, hall_wall);
    solid(&mut b, h_ne, h_dn, hall_wall);
    b.seg(west_gap, Side::Right);
    solid(&mut b, h_ds, h_se, hall_wall);
    solid(&mut b, h_se, h_sw, hall_wall);
    solid(&mut b, h_sw, h_nw, hall_wall);
    let hall_ss = b.subsector(hall_first, 6);

    // doorway
    let door_first = solid(&mut b, h_dn, y_dn, door_wall);
    b.seg(east_gap, Side::Right);
    solid(&mut b, y_ds, h_ds, door_wall);
    b.seg(west_gap, Side::Left);
    let door_ss = b.subsector(door_first, 4);

    // courtyard, clockwise
    let yard_first = solid(&mut b, y_nw, y_ne, yard_wall);
    solid(&mut b, y_ne, y_se, yard_wall);
    solid(&mut b, y_se, y_sw, yard_wall);
    solid(&mut b, y_sw, y_ds, yard_wall);
    b.seg(east_gap, Side::Left);
    solid(&mut b, y_dn, y_nw, yard_wall);
    let yard_ss = b.subsector(yard_first, 6);

    let bbox = |x0: f32, y0: f32, x1: f32, y1: f32| Aabb::new(vec2(x0, y0), vec2(x1, y1));
    let east = b.node(
        vec2(16.0, 0.0),
        vec2(0.0, 1.0),
        bbox(16.0, -256.0, 512.0, 256.0),
        bbox(-16.0, -96.0, 16.0, 96.0),
        Child::Subsector(yard_ss),
        Child::Subsector(door_ss),
    );
    b.node(
        vec2(-16.0, 0.0),
        vec2(0.0, 1.0),
        bbox(-16.0, -256.0, 512.0, 256.0),
        bbox(-512.0, -256.0, -16.0, 256.0),
        Child::Node(east),
        Child::Subsector(hall_ss),
    );

    Ok(b.build()?)
}

fn demo_objects(tex: &DemoTextures) -> Vec<SpriteObject> {
    let [g0, g1, g2, g3, g4] = tex.guard;
    let view = |tex, flip| Rotation { tex, flip };
    let guard = SpriteFrame::rotated([
        view(g0, false),
        view(g1, false),
        view(g2, false),
        view(g3, false),
        view(g4, false),
        view(g3, true),
        view(g2, true),
        view(g1, true),
    ]);

    let pillar = |pos: Vec2, z: f32| SpriteObject {
        pos: pos.extend(z),
        facing: 0.0,
        frame: SpriteFrame::single(tex.pillar),
        width: 16.0,
        height: 56.0,
        full_bright: false,
        radius: 10.0,
    };

    vec![
        pillar(vec2(-200.0, 150.0), 0.0),
        pillar(vec2(-200.0, -150.0), 0.0),
        pillar(vec2(300.0, 0.0), 24.0),
        SpriteObject {
            pos: vec3(-100.0, 0.0, 64.0),
            facing: 0.0,
            frame: SpriteFrame::single(tex.lamp),
            width: 16.0,
            height: 24.0,
            full_bright: true,
            radius: 8.0,
        },
        SpriteObject {
            pos: vec3(200.0, 120.0, 24.0),
            facing: 180.0,
            frame: guard,
            width: 24.0,
            height: 48.0,
            full_bright: false,
            radius: 16.0,
        },
    ]
}
