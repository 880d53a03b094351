use kurbo::{Circle, Shape};

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

/// Row-based layouts: lists, icon lists, timelines, avatar grids. Rows reveal
/// with a per-row stagger derived from the local frame, so scrubbing lands on
/// the same partial reveal every time.
pub struct RosterRenderer;

/// Frames between consecutive row reveals at 30 fps, scaled by actual fps.
const STAGGER_SECS: f64 = 0.12;
const ROW_FADE_SECS: f64 = 0.25;

impl SceneRenderer for RosterRenderer {
    fn component_id(&self) -> &'static str {
        "roster"
    }

    fn render(&self, ctx: &RenderCtx<'_>, frame: &mut SceneFrame) -> BlockreelResult<()> {
        match ctx.block {
            ContentBlock::List(b) => {
                draw_rows(ctx, frame, b.title.as_deref(), &text_rows(&b.items), RowMark::Bullet);
            }
            ContentBlock::IconList(b) => {
                let rows: Vec<(String, Option<String>)> = b
                    .items
                    .iter()
                    .map(|i| (i.label.clone(), Some(i.icon.clone())))
                    .collect();
                draw_rows(ctx, frame, None, &rows, RowMark::Icon);
            }
            ContentBlock::Timeline(b) => {
                let rows: Vec<(String, Option<String>)> = b
                    .milestones
                    .iter()
                    .map(|m| (m.label.clone(), m.detail.clone()))
                    .collect();
                draw_rows(ctx, frame, b.title.as_deref(), &rows, RowMark::Node);
            }
            ContentBlock::AvatarGrid(b) => draw_avatar_grid(ctx, frame, &b.names, b.columns),
            other => {
                let (primary, secondary) = blocks::summary_lines(other);
                headline::draw_headline(ctx, frame, &primary, secondary.as_deref());
            }
        }
        Ok(())
    }
}

enum RowMark {
    Bullet,
    Icon,
    Node,
}

fn text_rows(items: &[String]) -> Vec<(String, Option<String>)> {
    items.iter().map(|i| (i.clone(), None)).collect()
}

/// Per-row reveal opacity at this local frame.
fn row_reveal(ctx: &RenderCtx<'_>, row: usize) -> f32 {
    let fps = ctx.fps.as_f64();
    let start = row as f64 * STAGGER_SECS * fps;
    let fade = (ROW_FADE_SECS * fps).max(1.0);
    Ease::OutQuad.apply((ctx.local_frame as f64 - start) / fade) as f32
}

fn draw_rows(
    ctx: &RenderCtx<'_>,
    frame: &mut SceneFrame,
    title: Option<&str>,
    rows: &[(String, Option<String>)],
    mark: RowMark,
) {
    let u = blocks::unit(ctx);
    let content = ctx.content_rect();
    let center = ctx.center();
    let transform = ctx.phase_transform(center);
    let base_opacity = ctx.opacity();

    let row_h = 110.0 * u;
    let total_h = rows.len() as f64 * row_h + if title.is_some() { 140.0 * u } else { 0.0 };
    let mut y = center.y - total_h / 2.0;

    if let Some(title) = title {
        blocks::push_text(
            frame,
            title,
            (content.x0, y),
            (52.0 * u) as f32,
            Some(content.width() as f32),
            TextAlign::Start,
            transform,
            premul(ctx.theme.text),
            base_opacity,
        );
        y += 140.0 * u;
    }

    // Timeline rows hang off a vertical spine on the left.
    if matches!(mark, RowMark::Node) && !rows.is_empty() {
        let spine_x = content.x0 + 14.0 * u;
        let spine = Rect::new(
            spine_x - 2.0 * u,
            y + row_h / 2.0,
            spine_x + 2.0 * u,
            y + (rows.len() as f64 - 0.5) * row_h,
        );
        frame.push(DrawOp::FillRect {
            rect: spine,
            transform,
            color: premul(ctx.theme.border),
            opacity: base_opacity,
            z: layer::ACCENT,
        });
    }

    for (i, (label, detail)) in rows.iter().enumerate() {
        let opacity = base_opacity * row_reveal(ctx, i);
        if opacity <= 0.0 {
            y += row_h;
            continue;
        }
        let mark_x = content.x0 + 14.0 * u;
        let mark_y = y + row_h / 2.0;
        match mark {
            RowMark::Bullet | RowMark::Node => {
                frame.push(DrawOp::FillPath {
                    path: Circle::new((mark_x, mark_y), 9.0 * u).to_path(0.1),
                    transform,
                    color: ctx.theme.accent_premul(),
                    opacity,
                    z: layer::ACCENT,
                });
            }
            RowMark::Icon => {
                if let Some(icon) = detail {
                    blocks::push_text(
                        frame,
                        icon.clone(),
                        (content.x0, mark_y - 22.0 * u),
                        (40.0 * u) as f32,
                        None,
                        TextAlign::Start,
                        transform,
                        ctx.theme.accent_premul(),
                        opacity,
                    );
                }
            }
        }

        let text_x = content.x0 + 60.0 * u;
        blocks::push_text(
            frame,
            label.clone(),
            (text_x, mark_y - 24.0 * u),
            (40.0 * u) as f32,
            Some((content.x1 - text_x) as f32),
            TextAlign::Start,
            transform,
            premul(ctx.theme.text),
            opacity,
        );
        if matches!(mark, RowMark::Node)
            && let Some(detail) = detail
        {
            blocks::push_text(
                frame,
                detail.clone(),
                (text_x, mark_y + 22.0 * u),
                (28.0 * u) as f32,
                Some((content.x1 - text_x) as f32),
                TextAlign::Start,
                transform,
                premul(ctx.theme.text_tertiary),
                opacity,
            );
        }
        y += row_h;
    }
}

fn draw_avatar_grid(ctx: &RenderCtx<'_>, frame: &mut SceneFrame, names: &[String], columns: Option<u32>) {
    let u = blocks::unit(ctx);
    let content = ctx.content_rect();
    let center = ctx.center();
    let transform = ctx.phase_transform(center);
    let base_opacity = ctx.opacity();

    let cols = columns.unwrap_or(3).max(1) as usize;
    let rows = names.len().div_ceil(cols);
    let cell_w = content.width() / cols as f64;
    let cell_h = 220.0 * u;
    let top = center.y - rows as f64 * cell_h / 2.0;

    for (i, name) in names.iter().enumerate() {
        let opacity = base_opacity * row_reveal(ctx, i);
        if opacity <= 0.0 {
            continue;
        }
        let col = i % cols;
        let row = i / cols;
        let cx = content.x0 + (col as f64 + 0.5) * cell_w;
        let cy = top + row as f64 * cell_h + 70.0 * u;

        frame.push(DrawOp::FillPath {
            path: Circle::new((cx, cy), 56.0 * u).to_path(0.1),
            transform,
            color: premul(ctx.theme.muted),
            opacity,
            z: layer::PANEL,
        });
        let initial = name.chars().next().map(|c| c.to_uppercase().to_string());
        if let Some(initial) = initial {
            blocks::push_text(
                frame,
                initial,
                (cx - cell_w / 2.0, cy - 28.0 * u),
                (48.0 * u) as f32,
                Some(cell_w as f32),
                TextAlign::Center,
                transform,
                premul(ctx.theme.text),
                opacity,
            );
        }
        blocks::push_text(
            frame,
            name.clone(),
            (cx - cell_w / 2.0, cy + 80.0 * u),
            (26.0 * u) as f32,
            Some(cell_w as f32),
            TextAlign::Center,
            transform,
            premul(ctx.theme.text_secondary),
            opacity,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        animation::phase::PhaseProgress,
        foundation::core::{Canvas, Fps},
        model::{block::ListBlock, plan::MotionProfile},
    };

    fn list_block(n: usize) -> ContentBlock {
        ContentBlock::List(ListBlock {
            title: None,
            items: (0..n).map(|i| format!("item {i}")).collect(),
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

    fn text_count(frame: &SceneFrame) -> usize {
        frame
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { .. }))
            .count()
    }

    #[test]
    fn rows_reveal_with_stagger() {
        let block = list_block(6);
        let canvas = Canvas {
            width: 1080,
            height: 1920,
        };

        // At frame 0 only the first row has begun revealing.
        let mut early = SceneFrame::new(canvas);
        RosterRenderer.render(&ctx_at(&block, 1), &mut early).unwrap();
        let early_rows = text_count(&early);
        assert!(early_rows >= 1);
        assert!(early_rows < 6);

        // Long after the stagger every row is present.
        let mut late = SceneFrame::new(canvas);
        RosterRenderer.render(&ctx_at(&block, 240), &mut late).unwrap();
        assert_eq!(text_count(&late), 6);
    }
}
