use kurbo::{Circle, Shape};

use crate::{
    foundation::{
        core::{BezPath, Point, Rect},
        error::BlockreelResult,
    },
    model::block::ContentBlock,
    scene::{
        blocks::{self, headline, layer, premul},
        context::RenderCtx,
        frame::{DrawOp, SceneFrame, TextAlign},
        registry::SceneRenderer,
    },
};

/// Media-flavored kinds: video placeholders, QR codes, animated backdrops
/// and countdowns. Everything animated here is a pure function of the local
/// frame; the QR module pattern is a pure function of the payload string.
pub struct MediaRenderer;

impl SceneRenderer for MediaRenderer {
    fn component_id(&self) -> &'static str {
        "media"
    }

    fn render(&self, ctx: &RenderCtx<'_>, frame: &mut SceneFrame) -> BlockreelResult<()> {
        match ctx.block {
            ContentBlock::Video(b) => draw_video(ctx, frame, b.caption.as_deref()),
            ContentBlock::QrCode(b) => draw_qr(ctx, frame, &b.url, b.caption.as_deref()),
            ContentBlock::AnimatedBg(b) => draw_animated_bg(ctx, frame, b.text.as_deref()),
            ContentBlock::Countdown(b) => draw_countdown(ctx, frame, b.from, b.label.as_deref()),
            other => {
                let (primary, secondary) = blocks::summary_lines(other);
                headline::draw_headline(ctx, frame, &primary, secondary.as_deref());
            }
        }
        Ok(())
    }
}

fn draw_video(ctx: &RenderCtx<'_>, frame: &mut SceneFrame, caption: Option<&str>) {
    let u = blocks::unit(ctx);
    let content = ctx.content_rect();
    let center = ctx.center();
    let transform = ctx.phase_transform(center);
    let opacity = ctx.opacity();

    let panel_h = content.width() * 9.0 / 16.0;
    let panel = Rect::new(
        content.x0,
        center.y - panel_h / 2.0,
        content.x1,
        center.y + panel_h / 2.0,
    );
    blocks::push_panel(ctx, frame, panel, 24.0 * u);

    // Play triangle.
    let r = 70.0 * u;
    frame.push(DrawOp::FillPath {
        path: Circle::new((center.x, center.y), r * 1.6).to_path(0.1),
        transform,
        color: premul(ctx.theme.muted),
        opacity,
        z: layer::ACCENT,
    });
    let mut tri = BezPath::new();
    tri.move_to(Point::new(center.x - r * 0.5, center.y - r * 0.8));
    tri.line_to(Point::new(center.x + r * 0.9, center.y));
    tri.line_to(Point::new(center.x - r * 0.5, center.y + r * 0.8));
    tri.close_path();
    frame.push(DrawOp::FillPath {
        path: tri,
        transform,
        color: premul(ctx.theme.text),
        opacity,
        z: layer::ACCENT,
    });

    if let Some(caption) = caption {
        blocks::push_text(
            frame,
            caption,
            (content.x0, panel.y1 + 40.0 * u),
            (32.0 * u) as f32,
            Some(content.width() as f32),
            TextAlign::Center,
            transform,
            premul(ctx.theme.text_secondary),
            opacity,
        );
    }
}

/// Stylized QR motif. The module grid is seeded from the payload so the same
/// url always draws the same pattern. Not scannable; a visual stand-in.
fn draw_qr(ctx: &RenderCtx<'_>, frame: &mut SceneFrame, url: &str, caption: Option<&str>) {
    const GRID: usize = 21;

    let u = blocks::unit(ctx);
    let center = ctx.center();
    let transform = ctx.phase_transform(center);
    let opacity = ctx.opacity();

    let size = 560.0 * u;
    let panel = Rect::new(
        center.x - size / 2.0 - 40.0 * u,
        center.y - size / 2.0 - 40.0 * u,
        center.x + size / 2.0 + 40.0 * u,
        center.y + size / 2.0 + 40.0 * u,
    );
    frame.push(DrawOp::FillPath {
        path: blocks::rounded_rect_path(panel, 24.0 * u),
        transform,
        color: premul([255, 255, 255, 255]),
        opacity,
        z: layer::PANEL,
    });

    let cell = size / GRID as f64;
    let origin = Point::new(center.x - size / 2.0, center.y - size / 2.0);
    let dark = premul([16, 18, 24, 255]);

    let mut seed = fnv1a(url.as_bytes());
    for row in 0..GRID {
        for col in 0..GRID {
            let filled = if in_finder(row, col, GRID) {
                finder_filled(row, col, GRID)
            } else {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (seed >> 33) & 1 == 1
            };
            if !filled {
                continue;
            }
            let x = origin.x + col as f64 * cell;
            let y = origin.y + row as f64 * cell;
            frame.push(DrawOp::FillRect {
                rect: Rect::new(x, y, x + cell, y + cell),
                transform,
                color: dark,
                opacity,
                z: layer::ACCENT,
            });
        }
    }

    let label = caption.unwrap_or(url);
    blocks::push_text(
        frame,
        label,
        (panel.x0 - 100.0 * u, panel.y1 + 44.0 * u),
        (30.0 * u) as f32,
        Some((panel.width() + 200.0 * u) as f32),
        TextAlign::Center,
        transform,
        premul(ctx.theme.text_secondary),
        opacity,
    );
}

fn in_finder(row: usize, col: usize, grid: usize) -> bool {
    let near = |v: usize| v < 7;
    let far = |v: usize| v >= grid - 7;
    (near(row) && near(col)) || (near(row) && far(col)) || (far(row) && near(col))
}

fn finder_filled(row: usize, col: usize, grid: usize) -> bool {
    let local = |v: usize| if v < 7 { v } else { v - (grid - 7) };
    let (r, c) = (local(row), local(col));
    let ring = r == 0 || r == 6 || c == 0 || c == 6;
    let core = (2..=4).contains(&r) && (2..=4).contains(&c);
    ring || core
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

/// Slow drifting circles behind an optional caption. Positions are a closed
/// form over the local frame.
fn draw_animated_bg(ctx: &RenderCtx<'_>, frame: &mut SceneFrame, text: Option<&str>) {
    let u = blocks::unit(ctx);
    let w = ctx.canvas.width as f64;
    let h = ctx.canvas.height as f64;
    let t = ctx.local_frame as f64 / ctx.fps.as_f64();
    let opacity = ctx.opacity();

    for i in 0..5 {
        let phase = i as f64 * 1.257;
        let cx = w * (0.5 + 0.38 * (t * 0.21 + phase).sin());
        let cy = h * (0.5 + 0.34 * (t * 0.17 + phase * 1.7).cos());
        let r = (140.0 + 60.0 * (t * 0.3 + phase).sin().abs()) * u;
        frame.push(DrawOp::FillPath {
            path: Circle::new((cx, cy), r).to_path(0.2),
            transform: crate::foundation::core::Affine::IDENTITY,
            color: premul([
                ctx.theme.accent[0],
                ctx.theme.accent[1],
                ctx.theme.accent[2],
                46,
            ]),
            opacity,
            z: layer::PANEL,
        });
    }

    if let Some(text) = text {
        headline::draw_headline(ctx, frame, text, None);
    }
}

fn draw_countdown(ctx: &RenderCtx<'_>, frame: &mut SceneFrame, from: u32, label: Option<&str>) {
    let u = blocks::unit(ctx);
    let center = ctx.center();
    let transform = ctx.phase_transform(center);
    let opacity = ctx.opacity();

    let elapsed_secs = (ctx.local_frame as f64 / ctx.fps.as_f64()) as u32;
    let current = from.saturating_sub(elapsed_secs).max(1);

    // Shrinking ring marks progress through the current second.
    let within = (ctx.local_frame as f64 / ctx.fps.as_f64()).fract();
    let ring_r = (260.0 - 40.0 * within) * u;
    frame.push(DrawOp::FillPath {
        path: Circle::new((center.x, center.y), ring_r).to_path(0.1),
        transform,
        color: premul(ctx.theme.surface),
        opacity,
        z: layer::PANEL,
    });

    blocks::push_text(
        frame,
        current.to_string(),
        (center.x - 300.0 * u, center.y - 110.0 * u),
        (180.0 * u) as f32,
        Some((600.0 * u) as f32),
        TextAlign::Center,
        transform,
        ctx.theme.accent_premul(),
        opacity,
    );
    if let Some(label) = label {
        blocks::push_text(
            frame,
            label,
            (center.x - 300.0 * u, center.y + 300.0 * u),
            (36.0 * u) as f32,
            Some((600.0 * u) as f32),
            TextAlign::Center,
            transform,
            premul(ctx.theme.text_secondary),
            opacity,
        );
    }
}
