use crate::{
    animation::ease::Ease,
    foundation::{core::Rect, error::BlockreelResult},
    model::block::{ChatMessage, ContentBlock},
    scene::{
        blocks::{self, headline, layer, premul},
        context::RenderCtx,
        frame::{SceneFrame, TextAlign, DrawOp},
        registry::SceneRenderer,
    },
};

/// Messenger-style conversation. Bubbles appear one after another, outgoing
/// on the right in the accent color, incoming on the left on the surface
/// color.
pub struct ChatRenderer;

/// Seconds between consecutive bubble arrivals.
const BUBBLE_GAP_SECS: f64 = 0.55;
const BUBBLE_FADE_SECS: f64 = 0.2;

impl SceneRenderer for ChatRenderer {
    fn component_id(&self) -> &'static str {
        "chat"
    }

    fn render(&self, ctx: &RenderCtx<'_>, frame: &mut SceneFrame) -> BlockreelResult<()> {
        match ctx.block {
            ContentBlock::WhatsappChat(b) => draw_chat(ctx, frame, &b.messages),
            other => {
                let (primary, secondary) = blocks::summary_lines(other);
                headline::draw_headline(ctx, frame, &primary, secondary.as_deref());
            }
        }
        Ok(())
    }
}

fn bubble_reveal(ctx: &RenderCtx<'_>, index: usize) -> f32 {
    let fps = ctx.fps.as_f64();
    let start = index as f64 * BUBBLE_GAP_SECS * fps;
    let fade = (BUBBLE_FADE_SECS * fps).max(1.0);
    Ease::OutQuad.apply((ctx.local_frame as f64 - start) / fade) as f32
}

fn draw_chat(ctx: &RenderCtx<'_>, frame: &mut SceneFrame, messages: &[ChatMessage]) {
    let u = blocks::unit(ctx);
    let content = ctx.content_rect();
    let center = ctx.center();
    let transform = ctx.phase_transform(center);
    let base_opacity = ctx.opacity();

    let bubble_h = 120.0 * u;
    let gap = 28.0 * u;
    let total_h = messages.len() as f64 * (bubble_h + gap) - gap;
    let mut y = center.y - total_h / 2.0;

    for (i, msg) in messages.iter().enumerate() {
        let opacity = base_opacity * bubble_reveal(ctx, i);
        if opacity <= 0.0 {
            y += bubble_h + gap;
            continue;
        }

        let bubble_w = content.width() * 0.72;
        let (x0, color, text_color) = if msg.outgoing {
            (content.x1 - bubble_w, ctx.theme.accent, ctx.theme.background)
        } else {
            (content.x0, ctx.theme.surface, ctx.theme.text)
        };
        let bubble = Rect::new(x0, y, x0 + bubble_w, y + bubble_h);
        frame.push(DrawOp::FillPath {
            path: blocks::rounded_rect_path(bubble, 32.0 * u),
            transform,
            color: premul(color),
            opacity,
            z: layer::PANEL,
        });
        blocks::push_text(
            frame,
            msg.text.clone(),
            (bubble.x0 + 36.0 * u, y + 34.0 * u),
            (32.0 * u) as f32,
            Some((bubble_w - 72.0 * u) as f32),
            TextAlign::Start,
            transform,
            premul(text_color),
            opacity,
        );

        y += bubble_h + gap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        animation::phase::PhaseProgress,
        foundation::core::{Canvas, Fps},
        model::{block::WhatsappChatBlock, plan::MotionProfile},
    };

    fn chat_block() -> ContentBlock {
        ContentBlock::WhatsappChat(WhatsappChatBlock {
            messages: vec![
                ChatMessage {
                    outgoing: false,
                    text: "did you ship?".to_string(),
                },
                ChatMessage {
                    outgoing: true,
                    text: "just now".to_string(),
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

    #[test]
    fn bubbles_arrive_in_order() {
        let block = chat_block();
        let canvas = Canvas {
            width: 1080,
            height: 1920,
        };

        let mut first = SceneFrame::new(canvas);
        ChatRenderer.render(&ctx_at(&block, 3), &mut first).unwrap();
        let texts_first = first
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { .. }))
            .count();
        assert_eq!(texts_first, 1);

        let mut both = SceneFrame::new(canvas);
        ChatRenderer.render(&ctx_at(&block, 90), &mut both).unwrap();
        let texts_both = both
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { .. }))
            .count();
        assert_eq!(texts_both, 2);
    }
}
