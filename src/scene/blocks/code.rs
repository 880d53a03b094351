use crate::{
    foundation::{core::Rect, error::BlockreelResult},
    model::block::ContentBlock,
    scene::{
        blocks::{self, headline, layer, premul},
        context::RenderCtx,
        frame::{DrawOp, SceneFrame, TextAlign},
        registry::SceneRenderer,
    },
};

/// Source listing on a dark panel. Lines type on one at a time; within the
/// active line, characters appear left to right.
pub struct CodeRenderer;

/// Characters revealed per second while typing.
const CHARS_PER_SEC: f64 = 28.0;
const MAX_LINES: usize = 14;

impl SceneRenderer for CodeRenderer {
    fn component_id(&self) -> &'static str {
        "code"
    }

    fn render(&self, ctx: &RenderCtx<'_>, frame: &mut SceneFrame) -> BlockreelResult<()> {
        match ctx.block {
            ContentBlock::Code(b) => draw_code(ctx, frame, b.language.as_deref(), &b.source),
            other => {
                let (primary, secondary) = blocks::summary_lines(other);
                headline::draw_headline(ctx, frame, &primary, secondary.as_deref());
            }
        }
        Ok(())
    }
}

fn draw_code(ctx: &RenderCtx<'_>, frame: &mut SceneFrame, language: Option<&str>, source: &str) {
    let u = blocks::unit(ctx);
    let content = ctx.content_rect();
    let center = ctx.center();
    let transform = ctx.phase_transform(center);
    let opacity = ctx.opacity();

    let lines: Vec<&str> = source.lines().take(MAX_LINES).collect();
    let line_h = 54.0 * u;
    let pad = 48.0 * u;
    let header_h = 72.0 * u;
    let panel_h = header_h + lines.len() as f64 * line_h + pad * 2.0;
    let panel = Rect::new(
        content.x0,
        center.y - panel_h / 2.0,
        content.x1,
        center.y + panel_h / 2.0,
    );
    blocks::push_panel(ctx, frame, panel, 24.0 * u);

    // Window chrome dots.
    for i in 0..3 {
        let cx = panel.x0 + pad + i as f64 * 44.0 * u;
        let cy = panel.y0 + header_h / 2.0;
        frame.push(DrawOp::FillPath {
            path: kurbo::Shape::to_path(&kurbo::Circle::new((cx, cy), 12.0 * u), 0.1),
            transform,
            color: premul(ctx.theme.muted),
            opacity,
            z: layer::ACCENT,
        });
    }
    if let Some(language) = language {
        blocks::push_text(
            frame,
            language,
            (panel.x1 - pad - 240.0 * u, panel.y0 + 20.0 * u),
            (26.0 * u) as f32,
            Some((240.0 * u) as f32),
            TextAlign::End,
            transform,
            premul(ctx.theme.text_tertiary),
            opacity,
        );
    }

    // Typing cursor position in characters at this local frame.
    let typed = (ctx.local_frame as f64 / ctx.fps.as_f64() * CHARS_PER_SEC) as usize;
    let mut consumed = 0usize;
    for (i, line) in lines.iter().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        let remaining = typed.saturating_sub(consumed);
        consumed += chars.len() + 1;
        if remaining == 0 {
            break;
        }
        let shown: String = chars.iter().take(remaining).collect();
        if shown.trim().is_empty() {
            continue;
        }
        blocks::push_text(
            frame,
            shown,
            (panel.x0 + pad, panel.y0 + header_h + pad + i as f64 * line_h),
            (30.0 * u) as f32,
            Some((panel.width() - pad * 2.0) as f32),
            TextAlign::Start,
            transform,
            premul(ctx.theme.text),
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
        model::{block::CodeBlock, plan::MotionProfile},
    };

    fn code_block() -> ContentBlock {
        ContentBlock::Code(CodeBlock {
            language: Some("rust".to_string()),
            source: "fn main() {\n    println!(\"hi\");\n}".to_string(),
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

    fn code_lines(frame: &SceneFrame) -> Vec<String> {
        frame
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { content, .. } if content != "rust" => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn typing_reveals_source_progressively() {
        let block = code_block();
        let canvas = Canvas {
            width: 1080,
            height: 1920,
        };

        let mut early = SceneFrame::new(canvas);
        CodeRenderer.render(&ctx_at(&block, 6), &mut early).unwrap();
        let early_lines = code_lines(&early);
        assert_eq!(early_lines.len(), 1);
        assert!("fn main() {".starts_with(early_lines[0].as_str()) || early_lines[0].starts_with("fn"));

        let mut done = SceneFrame::new(canvas);
        CodeRenderer.render(&ctx_at(&block, 300), &mut done).unwrap();
        let all = code_lines(&done);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], "fn main() {");
        assert_eq!(all[2], "}");
    }
}
