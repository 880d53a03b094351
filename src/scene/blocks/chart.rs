use kurbo::{Circle, CircleSegment, Shape};

use crate::{
    animation::ease::Ease,
    foundation::{
        core::{BezPath, Point, Rect},
        error::BlockreelResult,
    },
    model::block::{ContentBlock, PieSlice},
    scene::{
        blocks::{self, headline, layer, premul},
        context::RenderCtx,
        frame::{DrawOp, SceneFrame, TextAlign},
        registry::SceneRenderer,
    },
};

/// Line and pie charts. Both reveal progressively: the line sweeps left to
/// right, pie slices sweep clockwise, each as a pure function of the local
/// frame.
pub struct ChartRenderer;

const REVEAL_SECS: f64 = 1.2;

impl SceneRenderer for ChartRenderer {
    fn component_id(&self) -> &'static str {
        "chart"
    }

    fn render(&self, ctx: &RenderCtx<'_>, frame: &mut SceneFrame) -> BlockreelResult<()> {
        match ctx.block {
            ContentBlock::LineChart(b) => {
                draw_line_chart(ctx, frame, b.title.as_deref(), &b.points, b.labels.as_deref());
            }
            ContentBlock::PieChart(b) => {
                draw_pie_chart(ctx, frame, b.title.as_deref(), &b.slices);
            }
            other => {
                let (primary, secondary) = blocks::summary_lines(other);
                headline::draw_headline(ctx, frame, &primary, secondary.as_deref());
            }
        }
        Ok(())
    }
}

fn reveal(ctx: &RenderCtx<'_>) -> f64 {
    let frames = (ctx.fps.as_f64() * REVEAL_SECS).max(1.0);
    Ease::OutCubic.apply(ctx.local_frame as f64 / frames)
}

fn draw_title(ctx: &RenderCtx<'_>, frame: &mut SceneFrame, title: Option<&str>, plot: Rect) {
    let u = blocks::unit(ctx);
    if let Some(title) = title {
        blocks::push_text(
            frame,
            title,
            (plot.x0, plot.y0 - 110.0 * u),
            (48.0 * u) as f32,
            Some(plot.width() as f32),
            TextAlign::Start,
            ctx.phase_transform(ctx.center()),
            premul(ctx.theme.text),
            ctx.opacity(),
        );
    }
}

fn draw_line_chart(
    ctx: &RenderCtx<'_>,
    frame: &mut SceneFrame,
    title: Option<&str>,
    points: &[f64],
    labels: Option<&[String]>,
) {
    let u = blocks::unit(ctx);
    let content = ctx.content_rect();
    let center = ctx.center();
    let transform = ctx.phase_transform(center);
    let opacity = ctx.opacity();

    let plot_h = 540.0 * u;
    let plot = Rect::new(
        content.x0,
        center.y - plot_h / 2.0,
        content.x1,
        center.y + plot_h / 2.0,
    );
    draw_title(ctx, frame, title, plot);

    // Baseline.
    frame.push(DrawOp::FillRect {
        rect: Rect::new(plot.x0, plot.y1, plot.x1, plot.y1 + 3.0 * u),
        transform,
        color: premul(ctx.theme.border),
        opacity,
        z: layer::ACCENT,
    });

    let (min, max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
            (lo.min(p), hi.max(p))
        });
    let span = (max - min).max(1e-9);
    let to_xy = |i: usize, v: f64| -> Point {
        let tx = i as f64 / (points.len() - 1).max(1) as f64;
        Point::new(
            plot.x0 + tx * plot.width(),
            plot.y1 - (v - min) / span * plot.height(),
        )
    };

    // Sweep: keep points whose x fraction is inside the reveal, then add one
    // interpolated point at the sweep edge.
    let t = reveal(ctx);
    let stroke_w = 6.0 * u;
    let mut line = BezPath::new();
    let mut last: Option<Point> = None;
    for (i, &v) in points.iter().enumerate() {
        let fx = i as f64 / (points.len() - 1).max(1) as f64;
        let p = to_xy(i, v);
        if fx <= t {
            last = Some(p);
            if line.elements().is_empty() {
                line.move_to(p);
            } else {
                line.line_to(p);
            }
        } else {
            if let Some(prev) = last {
                let prev_fx = (i - 1) as f64 / (points.len() - 1).max(1) as f64;
                let seg = ((t - prev_fx) / (fx - prev_fx)).clamp(0.0, 1.0);
                let edge = Point::new(prev.x + (p.x - prev.x) * seg, prev.y + (p.y - prev.y) * seg);
                line.line_to(edge);
            }
            break;
        }
    }
    if let Some(stroked) = stroke_polyline(&line, stroke_w) {
        frame.push(DrawOp::FillPath {
            path: stroked,
            transform,
            color: ctx.theme.accent_premul(),
            opacity,
            z: layer::ACCENT,
        });
    }

    // Dot on the sweep head once the line has started.
    if t > 0.0
        && let Some(head) = line_end(&line)
    {
        frame.push(DrawOp::FillPath {
            path: Circle::new(head, 10.0 * u).to_path(0.1),
            transform,
            color: ctx.theme.accent_premul(),
            opacity,
            z: layer::ACCENT,
        });
    }

    if let Some(labels) = labels {
        let n = labels.len().min(points.len());
        for (i, label) in labels.iter().take(n).enumerate() {
            let p = to_xy(i, min);
            blocks::push_text(
                frame,
                label.clone(),
                (p.x - 80.0 * u, plot.y1 + 24.0 * u),
                (22.0 * u) as f32,
                Some((160.0 * u) as f32),
                TextAlign::Center,
                transform,
                premul(ctx.theme.text_tertiary),
                opacity,
            );
        }
    }
}

/// Expand a polyline into a fillable quad strip of the given width.
fn stroke_polyline(line: &BezPath, width: f64) -> Option<BezPath> {
    let pts: Vec<Point> = line
        .elements()
        .iter()
        .filter_map(|el| match el {
            kurbo::PathEl::MoveTo(p) | kurbo::PathEl::LineTo(p) => Some(*p),
            _ => None,
        })
        .collect();
    if pts.len() < 2 {
        return None;
    }

    let half = width / 2.0;
    let mut out = BezPath::new();
    for pair in pts.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let d = b - a;
        let len = d.hypot().max(1e-9);
        let n = kurbo::Vec2::new(-d.y / len, d.x / len) * half;
        out.move_to(a + n);
        out.line_to(b + n);
        out.line_to(b - n);
        out.line_to(a - n);
        out.close_path();
    }
    Some(out)
}

fn line_end(line: &BezPath) -> Option<Point> {
    line.elements().iter().rev().find_map(|el| match el {
        kurbo::PathEl::MoveTo(p) | kurbo::PathEl::LineTo(p) => Some(*p),
        _ => None,
    })
}

fn draw_pie_chart(
    ctx: &RenderCtx<'_>,
    frame: &mut SceneFrame,
    title: Option<&str>,
    slices: &[PieSlice],
) {
    let u = blocks::unit(ctx);
    let center = ctx.center();
    let transform = ctx.phase_transform(center);
    let opacity = ctx.opacity();

    let radius = 300.0 * u;
    let plot = Rect::new(
        center.x - radius,
        center.y - radius,
        center.x + radius,
        center.y + radius,
    );
    draw_title(ctx, frame, title, plot);

    let total: f64 = slices.iter().map(|s| s.value).sum();
    let swept = reveal(ctx) * std::f64::consts::TAU;

    let mut start = -std::f64::consts::FRAC_PI_2;
    for (i, slice) in slices.iter().enumerate() {
        let full = slice.value / total * std::f64::consts::TAU;
        let begin = start;
        start += full;
        // Clip this slice's sweep to the revealed angle.
        let sweep_end = (begin + full).min(-std::f64::consts::FRAC_PI_2 + swept);
        let sweep = sweep_end - begin;
        if sweep <= 0.0 {
            continue;
        }
        let wedge = CircleSegment::new(
            (center.x, center.y),
            radius,
            radius * 0.45,
            begin,
            sweep,
        );
        frame.push(DrawOp::FillPath {
            path: wedge.to_path(0.1),
            transform,
            color: slice_color(ctx, i),
            opacity,
            z: layer::ACCENT,
        });
    }

    // Legend under the ring.
    let mut y = plot.y1 + 60.0 * u;
    for (i, slice) in slices.iter().enumerate() {
        let pct = slice.value / total * 100.0;
        frame.push(DrawOp::FillRect {
            rect: Rect::new(plot.x0, y, plot.x0 + 24.0 * u, y + 24.0 * u),
            transform,
            color: slice_color(ctx, i),
            opacity,
            z: layer::ACCENT,
        });
        blocks::push_text(
            frame,
            format!("{} \u{00b7} {pct:.0}%", slice.label),
            (plot.x0 + 44.0 * u, y - 4.0 * u),
            (28.0 * u) as f32,
            Some((plot.width() - 44.0 * u) as f32),
            TextAlign::Start,
            transform,
            premul(ctx.theme.text_secondary),
            opacity,
        );
        y += 48.0 * u;
    }
}

/// Slice palette: accent first, then theme tones. Indexed, never random.
fn slice_color(ctx: &RenderCtx<'_>, i: usize) -> crate::foundation::core::Rgba8Premul {
    let palette = [
        ctx.theme.accent,
        ctx.theme.text_secondary,
        ctx.theme.muted,
        ctx.theme.border,
        ctx.theme.text_tertiary,
    ];
    premul(palette[i % palette.len()])
}
