use crate::{
    foundation::error::BlockreelResult,
    model::block::ContentBlock,
    scene::{
        blocks::{self, layer, premul},
        context::RenderCtx,
        frame::{DrawOp, SceneFrame, TextAlign},
        registry::SceneRenderer,
    },
};

/// Large statement text with an accent tick. Covers the text-first kinds and
/// doubles as the fallback look every other family borrows.
pub struct HeadlineRenderer;

impl SceneRenderer for HeadlineRenderer {
    fn component_id(&self) -> &'static str {
        "headline"
    }

    fn render(&self, ctx: &RenderCtx<'_>, frame: &mut SceneFrame) -> BlockreelResult<()> {
        let (primary, secondary) = match ctx.block {
            ContentBlock::Text(b) => (b.body.clone(), None),
            ContentBlock::GradientText(b) => (b.text.clone(), None),
            ContentBlock::Quote(b) => (
                format!("\u{201c}{}\u{201d}", b.quote),
                b.attribution.as_ref().map(|a| format!("\u{2014} {a}")),
            ),
            ContentBlock::Testimonial(b) => {
                let byline = match &b.role {
                    Some(role) => format!("{}, {role}", b.author),
                    None => b.author.clone(),
                };
                (format!("\u{201c}{}\u{201d}", b.quote), Some(byline))
            }
            ContentBlock::Callout(b) => (b.text.clone(), b.emphasis.clone()),
            ContentBlock::Cta(b) => (b.heading.clone(), Some(b.action.clone())),
            ContentBlock::MotivationalImage(b) => (b.text.clone(), None),
            other => blocks::summary_lines(other),
        };
        draw_headline(ctx, frame, &primary, secondary.as_deref());
        Ok(())
    }
}

/// Shared statement layout: accent tick above, primary line, secondary line
/// in the muted text color.
pub(crate) fn draw_headline(
    ctx: &RenderCtx<'_>,
    frame: &mut SceneFrame,
    primary: &str,
    secondary: Option<&str>,
) {
    let u = blocks::unit(ctx);
    let content = ctx.content_rect();
    let align = blocks::text_align(ctx);
    let center = ctx.center();
    let transform = ctx.phase_transform(center);
    let opacity = ctx.opacity();

    let primary_size = (72.0 * u) as f32;
    let tick_w = 96.0 * u;
    let tick_h = 10.0 * u;
    let tick_x = match align {
        TextAlign::Start => content.x0,
        TextAlign::Center => center.x - tick_w / 2.0,
        TextAlign::End => content.x1 - tick_w,
    };
    let tick_y = center.y - 140.0 * u;
    frame.push(DrawOp::FillPath {
        path: blocks::rounded_rect_path(
            crate::foundation::core::Rect::new(tick_x, tick_y, tick_x + tick_w, tick_y + tick_h),
            tick_h / 2.0,
        ),
        transform,
        color: ctx.theme.accent_premul(),
        opacity,
        z: layer::ACCENT,
    });

    blocks::push_text(
        frame,
        primary,
        (content.x0, center.y - 80.0 * u),
        primary_size,
        Some(content.width() as f32),
        align,
        transform,
        premul(ctx.theme.text),
        opacity,
    );

    if let Some(secondary) = secondary {
        blocks::push_text(
            frame,
            secondary,
            (content.x0, center.y + 120.0 * u),
            (34.0 * u) as f32,
            Some(content.width() as f32),
            align,
            transform,
            premul(ctx.theme.text_secondary),
            opacity,
        );
    }
}
