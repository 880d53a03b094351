use crate::{
    animation::ease::Ease,
    foundation::{core::Rect, error::BlockreelResult},
    model::block::ContentBlock,
    scene::{
        blocks::{self, headline, layer, premul},
        context::RenderCtx,
        frame::{DrawOp, SceneFrame, TextAlign},
        registry::SceneRenderer,
    },
};

/// Metric card: one big value on a surface panel with a supporting label.
/// Counters and progress bars animate their value over the first moments of
/// the segment; the progression is a pure function of the local frame.
pub struct CardRenderer;

/// Seconds a counter or bar takes to reach its target value.
const VALUE_RAMP_SECS: f64 = 1.5;

impl SceneRenderer for CardRenderer {
    fn component_id(&self) -> &'static str {
        "card"
    }

    fn render(&self, ctx: &RenderCtx<'_>, frame: &mut SceneFrame) -> BlockreelResult<()> {
        match ctx.block {
            ContentBlock::Stat(b) => {
                let trend = b.trend_pct.map(|t| {
                    if t >= 0.0 {
                        format!("\u{25b2} {t:.1}%")
                    } else {
                        format!("\u{25bc} {:.1}%", t.abs())
                    }
                });
                draw_card(ctx, frame, &b.value, &b.heading, trend.as_deref(), None);
            }
            ContentBlock::Counter(b) => {
                let t = value_ramp(ctx);
                let value = b.from + (b.to - b.from) * t;
                let shown = blocks::format_number(value, b.suffix.as_deref());
                draw_card(ctx, frame, &shown, &b.label, None, None);
            }
            ContentBlock::ProgressBar(b) => {
                let t = value_ramp(ctx);
                let fill = b.fraction * t;
                let label = format!("{:.0}%", fill * 100.0);
                draw_card(ctx, frame, &label, &b.label, None, Some(fill));
            }
            ContentBlock::SocialStats(b) => {
                let delta = b.delta.map(|d| {
                    if d >= 0 {
                        format!("+{d} this week")
                    } else {
                        format!("{d} this week")
                    }
                });
                draw_card(
                    ctx,
                    frame,
                    &blocks::format_count(b.followers),
                    &b.platform,
                    delta.as_deref(),
                    None,
                );
            }
            other => {
                let (primary, secondary) = blocks::summary_lines(other);
                headline::draw_headline(ctx, frame, &primary, secondary.as_deref());
            }
        }
        Ok(())
    }
}

/// Eased 0..1 ramp over the first [`VALUE_RAMP_SECS`] of the segment.
fn value_ramp(ctx: &RenderCtx<'_>) -> f64 {
    let ramp_frames = (ctx.fps.as_f64() * VALUE_RAMP_SECS).max(1.0);
    Ease::OutCubic.apply(ctx.local_frame as f64 / ramp_frames)
}

fn draw_card(
    ctx: &RenderCtx<'_>,
    frame: &mut SceneFrame,
    value: &str,
    label: &str,
    footnote: Option<&str>,
    bar_fill: Option<f64>,
) {
    let u = blocks::unit(ctx);
    let center = ctx.center();
    let content = ctx.content_rect();
    let opacity = ctx.opacity();

    let panel_w = content.width().min(840.0 * u);
    let panel_h = 460.0 * u;
    let panel = Rect::new(
        center.x - panel_w / 2.0,
        center.y - panel_h / 2.0,
        center.x + panel_w / 2.0,
        center.y + panel_h / 2.0,
    );
    let transform = ctx.phase_transform(center);
    blocks::push_panel(ctx, frame, panel, 28.0 * u);

    blocks::push_text(
        frame,
        value,
        (panel.x0, center.y - 120.0 * u),
        (108.0 * u) as f32,
        Some(panel.width() as f32),
        TextAlign::Center,
        transform,
        premul(ctx.theme.text),
        opacity,
    );
    blocks::push_text(
        frame,
        label,
        (panel.x0, center.y + 24.0 * u),
        (36.0 * u) as f32,
        Some(panel.width() as f32),
        TextAlign::Center,
        transform,
        premul(ctx.theme.text_secondary),
        opacity,
    );

    if let Some(footnote) = footnote {
        blocks::push_text(
            frame,
            footnote,
            (panel.x0, center.y + 110.0 * u),
            (28.0 * u) as f32,
            Some(panel.width() as f32),
            TextAlign::Center,
            transform,
            ctx.theme.accent_premul(),
            opacity,
        );
    }

    if let Some(fill) = bar_fill {
        let track_w = panel.width() - 120.0 * u;
        let track_h = 18.0 * u;
        let x0 = center.x - track_w / 2.0;
        let y0 = center.y + 120.0 * u;
        let track = Rect::new(x0, y0, x0 + track_w, y0 + track_h);
        frame.push(DrawOp::FillPath {
            path: blocks::rounded_rect_path(track, track_h / 2.0),
            transform,
            color: premul(ctx.theme.muted),
            opacity,
            z: layer::ACCENT,
        });
        let fill_w = (track_w * fill.clamp(0.0, 1.0)).max(track_h);
        let filled = Rect::new(x0, y0, x0 + fill_w, y0 + track_h);
        frame.push(DrawOp::FillPath {
            path: blocks::rounded_rect_path(filled, track_h / 2.0),
            transform,
            color: ctx.theme.accent_premul(),
            opacity,
            z: layer::ACCENT,
        });
    }
}
