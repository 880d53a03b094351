use crate::{
    animation::ease::Ease,
    foundation::{
        core::{BezPath, Point},
        error::BlockreelResult,
    },
    model::block::{ContentBlock, TowerEntry},
    scene::{
        blocks::{self, headline, layer, premul},
        context::RenderCtx,
        frame::{DrawOp, SceneFrame, TextAlign},
        registry::SceneRenderer,
    },
};

/// Pseudo-3D ranking tower. Entries stack bottom-up in ascending score
/// order, each slab extruded with a lighter top and a darker side face.
/// Slabs rise in sequence as the segment plays.
pub struct TowerRenderer;

const SLAB_STAGGER_SECS: f64 = 0.3;
const SLAB_RISE_SECS: f64 = 0.45;

impl SceneRenderer for TowerRenderer {
    fn component_id(&self) -> &'static str {
        "tower"
    }

    fn render(&self, ctx: &RenderCtx<'_>, frame: &mut SceneFrame) -> BlockreelResult<()> {
        match ctx.block {
            ContentBlock::Tower3d(b) => draw_tower(ctx, frame, b.title.as_deref(), &b.entries),
            other => {
                let (primary, secondary) = blocks::summary_lines(other);
                headline::draw_headline(ctx, frame, &primary, secondary.as_deref());
            }
        }
        Ok(())
    }
}

fn slab_rise(ctx: &RenderCtx<'_>, index: usize) -> f64 {
    let fps = ctx.fps.as_f64();
    let start = index as f64 * SLAB_STAGGER_SECS * fps;
    let rise = (SLAB_RISE_SECS * fps).max(1.0);
    Ease::OutCubic.apply((ctx.local_frame as f64 - start) / rise)
}

fn draw_tower(
    ctx: &RenderCtx<'_>,
    frame: &mut SceneFrame,
    title: Option<&str>,
    entries: &[TowerEntry],
) {
    let u = blocks::unit(ctx);
    let content = ctx.content_rect();
    let center = ctx.center();
    let transform = ctx.phase_transform(center);
    let base_opacity = ctx.opacity();

    // Ascending score so the widest slab sits at the bottom.
    let mut ranked: Vec<&TowerEntry> = entries.iter().collect();
    ranked.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    let max_score = ranked
        .iter()
        .map(|e| e.score)
        .fold(f64::NEG_INFINITY, f64::max)
        .max(1e-9);

    let slab_h = 96.0 * u;
    let depth = 34.0 * u;
    let gap = 22.0 * u;
    let stack_h = ranked.len() as f64 * (slab_h + gap) - gap;
    let base_y = center.y + stack_h / 2.0;
    let max_w = content.width() * 0.62;

    if let Some(title) = title {
        blocks::push_text(
            frame,
            title,
            (content.x0, center.y - stack_h / 2.0 - 150.0 * u),
            (48.0 * u) as f32,
            Some(content.width() as f32),
            TextAlign::Center,
            transform,
            premul(ctx.theme.text),
            base_opacity,
        );
    }

    for (i, entry) in ranked.iter().enumerate() {
        let rise = slab_rise(ctx, i);
        if rise <= 0.0 {
            continue;
        }
        let opacity = base_opacity * rise as f32;

        let w = max_w * (entry.score / max_score).clamp(0.05, 1.0);
        let y1 = base_y - i as f64 * (slab_h + gap);
        let y0 = y1 - slab_h;
        // Slide up while rising.
        let lift = (1.0 - rise) * 40.0 * u;
        let (y0, y1) = (y0 + lift, y1 + lift);
        let x0 = center.x - w / 2.0;
        let x1 = center.x + w / 2.0;

        // Front face.
        frame.push(DrawOp::FillRect {
            rect: crate::foundation::core::Rect::new(x0, y0, x1, y1),
            transform,
            color: ctx.theme.accent_premul(),
            opacity,
            z: layer::ACCENT,
        });
        // Top face, skewed back and lightened.
        let mut top = BezPath::new();
        top.move_to(Point::new(x0, y0));
        top.line_to(Point::new(x0 + depth, y0 - depth));
        top.line_to(Point::new(x1 + depth, y0 - depth));
        top.line_to(Point::new(x1, y0));
        top.close_path();
        frame.push(DrawOp::FillPath {
            path: top,
            transform,
            color: premul(lighten(ctx.theme.accent, 36)),
            opacity,
            z: layer::ACCENT,
        });
        // Side face, darkened.
        let mut side = BezPath::new();
        side.move_to(Point::new(x1, y0));
        side.line_to(Point::new(x1 + depth, y0 - depth));
        side.line_to(Point::new(x1 + depth, y1 - depth));
        side.line_to(Point::new(x1, y1));
        side.close_path();
        frame.push(DrawOp::FillPath {
            path: side,
            transform,
            color: premul(darken(ctx.theme.accent, 48)),
            opacity,
            z: layer::ACCENT,
        });

        blocks::push_text(
            frame,
            format!("{} \u{00b7} {:.1}", entry.label, entry.score),
            (x1 + depth + 28.0 * u, y0 + slab_h / 2.0 - 18.0 * u),
            (30.0 * u) as f32,
            Some((content.x1 - x1 - depth) as f32),
            TextAlign::Start,
            transform,
            premul(ctx.theme.text_secondary),
            opacity,
        );
    }
}

fn lighten([r, g, b, a]: [u8; 4], amt: u8) -> [u8; 4] {
    [
        r.saturating_add(amt),
        g.saturating_add(amt),
        b.saturating_add(amt),
        a,
    ]
}

fn darken([r, g, b, a]: [u8; 4], amt: u8) -> [u8; 4] {
    [
        r.saturating_sub(amt),
        g.saturating_sub(amt),
        b.saturating_sub(amt),
        a,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        animation::phase::PhaseProgress,
        foundation::core::{Canvas, Fps},
        model::plan::MotionProfile,
    };

    fn tower_block() -> ContentBlock {
        ContentBlock::Tower3d(crate::model::block::Tower3dBlock {
            title: None,
            entries: vec![
                TowerEntry {
                    label: "alpha".to_string(),
                    score: 3.0,
                },
                TowerEntry {
                    label: "beta".to_string(),
                    score: 9.0,
                },
                TowerEntry {
                    label: "gamma".to_string(),
                    score: 6.0,
                },
            ],
            customization: None,
        })
    }

    fn ctx_at(block: &ContentBlock, local_frame: u64) -> RenderCtx<'_> {
        RenderCtx {
            block,
            theme: crate::theme::MIDNIGHT,
            profile: MotionProfile::Dynamic,
            phase: PhaseProgress {
                opacity: 1.0,
                entry_offset: 0.0,
                scale: 1.0,
            },
            canvas: Canvas {
                width: 1080,
                height: 1920,
            },
            local_frame,
            fps: Fps::default(),
        }
    }

    fn labels(frame: &SceneFrame) -> Vec<String> {
        frame
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn slabs_stack_in_ascending_score_order() {
        let block = tower_block();
        let mut frame = SceneFrame::new(Canvas {
            width: 1080,
            height: 1920,
        });
        TowerRenderer.render(&ctx_at(&block, 600), &mut frame).unwrap();
        let labels = labels(&frame);
        assert_eq!(labels.len(), 3);
        assert!(labels[0].starts_with("alpha"));
        assert!(labels[1].starts_with("gamma"));
        assert!(labels[2].starts_with("beta"));
    }

    #[test]
    fn slabs_rise_in_sequence() {
        let block = tower_block();
        let canvas = Canvas {
            width: 1080,
            height: 1920,
        };
        let mut early = SceneFrame::new(canvas);
        TowerRenderer.render(&ctx_at(&block, 2), &mut early).unwrap();
        assert_eq!(labels(&early).len(), 1);
    }
}
