//! Built-in renderer families.
//!
//! Each family is one `SceneRenderer` covering a group of related block
//! kinds. A plan may route any block to any family, so every renderer has a
//! total match: kinds outside its group fall back to a headline-style
//! treatment of the block's summary text.

pub mod card;
pub mod chart;
pub mod chat;
pub mod code;
pub mod headline;
pub mod media;
pub mod roster;
pub mod tower;

use kurbo::{RoundedRect, Shape};

use crate::{
    foundation::core::{Affine, BezPath, Point, Rect, Rgba8Premul},
    model::block::{Alignment, ContentBlock},
    scene::{
        context::RenderCtx,
        frame::{DrawOp, SceneFrame, TextAlign},
        registry::SceneRenderer,
    },
};

pub fn builtin_renderers() -> Vec<Box<dyn SceneRenderer>> {
    vec![
        Box::new(card::CardRenderer),
        Box::new(headline::HeadlineRenderer),
        Box::new(roster::RosterRenderer),
        Box::new(chart::ChartRenderer),
        Box::new(chat::ChatRenderer),
        Box::new(code::CodeRenderer),
        Box::new(media::MediaRenderer),
        Box::new(tower::TowerRenderer),
    ]
}

/// Z layering shared by all families. Within one layer, emit order wins.
pub(crate) mod layer {
    pub const BACKDROP: i32 = 0;
    pub const PANEL: i32 = 10;
    pub const ACCENT: i32 = 20;
    pub const TEXT: i32 = 30;
}

pub(crate) fn premul([r, g, b, a]: [u8; 4]) -> Rgba8Premul {
    Rgba8Premul::from_straight_rgba(r, g, b, a)
}

/// Layout unit: 1.0 at a 1080px shorter edge, scaling with the canvas.
pub(crate) fn unit(ctx: &RenderCtx<'_>) -> f64 {
    (ctx.canvas.width.min(ctx.canvas.height) as f64) / 1080.0
}

pub(crate) fn text_align(ctx: &RenderCtx<'_>) -> TextAlign {
    match ctx.block.customization().and_then(|c| c.align) {
        Some(Alignment::Start) => TextAlign::Start,
        Some(Alignment::End) => TextAlign::End,
        Some(Alignment::Center) | None => TextAlign::Center,
    }
}

/// Full-canvas background fill. Phase-independent: the backdrop never
/// animates, only block content does.
pub(crate) fn push_backdrop(frame: &mut SceneFrame, color: Rgba8Premul) {
    let rect = Rect::new(0.0, 0.0, frame.canvas.width as f64, frame.canvas.height as f64);
    frame.push(DrawOp::FillRect {
        rect,
        transform: Affine::IDENTITY,
        color,
        opacity: 1.0,
        z: layer::BACKDROP,
    });
}

pub(crate) fn rounded_rect_path(rect: Rect, radius: f64) -> BezPath {
    RoundedRect::from_rect(rect, radius).to_path(0.1)
}

/// Surface panel behind a family's content, animated with the block.
pub(crate) fn push_panel(ctx: &RenderCtx<'_>, frame: &mut SceneFrame, rect: Rect, radius: f64) {
    let transform = ctx.phase_transform(Point::new(rect.center().x, rect.center().y));
    frame.push(DrawOp::FillPath {
        path: rounded_rect_path(rect, radius),
        transform,
        color: ctx.theme.surface_premul(),
        opacity: ctx.opacity(),
        z: layer::PANEL,
    });
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn push_text(
    frame: &mut SceneFrame,
    content: impl Into<String>,
    origin: (f64, f64),
    size_px: f32,
    max_width: Option<f32>,
    align: TextAlign,
    transform: Affine,
    color: Rgba8Premul,
    opacity: f32,
) {
    let content = content.into();
    if content.is_empty() {
        return;
    }
    frame.push(DrawOp::Text {
        content,
        origin,
        size_px,
        max_width,
        align,
        transform,
        color,
        opacity,
        z: layer::TEXT,
    });
}

/// Primary and secondary text lines for any block. Families use this as the
/// fallback treatment for kinds outside their own group.
pub(crate) fn summary_lines(block: &ContentBlock) -> (String, Option<String>) {
    match block {
        ContentBlock::Stat(b) => (b.value.clone(), Some(b.heading.clone())),
        ContentBlock::Text(b) => (b.body.clone(), None),
        ContentBlock::Quote(b) => (b.quote.clone(), b.attribution.clone()),
        ContentBlock::List(b) => (
            b.title.clone().unwrap_or_else(|| b.items.join(" / ")),
            b.title.as_ref().map(|_| b.items.join(" / ")),
        ),
        ContentBlock::Timeline(b) => (
            b.title.clone().unwrap_or_else(|| "Timeline".to_string()),
            b.milestones.first().map(|m| m.label.clone()),
        ),
        ContentBlock::Callout(b) => (b.text.clone(), b.emphasis.clone()),
        ContentBlock::IconList(b) => (
            b.items
                .iter()
                .map(|i| i.label.as_str())
                .collect::<Vec<_>>()
                .join(" / "),
            None,
        ),
        ContentBlock::LineChart(b) => (
            b.title.clone().unwrap_or_else(|| "Trend".to_string()),
            None,
        ),
        ContentBlock::PieChart(b) => (
            b.title.clone().unwrap_or_else(|| "Breakdown".to_string()),
            None,
        ),
        ContentBlock::Code(b) => (
            b.language.clone().unwrap_or_else(|| "code".to_string()),
            b.source.lines().next().map(str::to_string),
        ),
        ContentBlock::Testimonial(b) => (b.quote.clone(), Some(b.author.clone())),
        ContentBlock::WhatsappChat(b) => (
            b.messages
                .last()
                .map(|m| m.text.clone())
                .unwrap_or_default(),
            None,
        ),
        ContentBlock::MotivationalImage(b) => (b.text.clone(), None),
        ContentBlock::Counter(b) => (format_number(b.to, b.suffix.as_deref()), Some(b.label.clone())),
        ContentBlock::ProgressBar(b) => (
            format!("{:.0}%", b.fraction * 100.0),
            Some(b.label.clone()),
        ),
        ContentBlock::QrCode(b) => (b.url.clone(), b.caption.clone()),
        ContentBlock::Video(b) => (
            b.caption.clone().unwrap_or_else(|| b.source.clone()),
            None,
        ),
        ContentBlock::AvatarGrid(b) => (b.names.join(" / "), None),
        ContentBlock::SocialStats(b) => {
            (format_count(b.followers), Some(b.platform.clone()))
        }
        ContentBlock::Cta(b) => (b.heading.clone(), Some(b.action.clone())),
        ContentBlock::GradientText(b) => (b.text.clone(), None),
        ContentBlock::AnimatedBg(b) => (b.text.clone().unwrap_or_default(), None),
        ContentBlock::Countdown(b) => (b.from.to_string(), b.label.clone()),
        ContentBlock::Tower3d(b) => (
            b.title.clone().unwrap_or_else(|| "Ranking".to_string()),
            b.entries.first().map(|e| e.label.clone()),
        ),
    }
}

pub(crate) fn format_number(value: f64, suffix: Option<&str>) -> String {
    let body = if value.fract().abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.1}")
    };
    match suffix {
        Some(s) => format!("{body}{s}"),
        None => body,
    }
}

pub(crate) fn format_count(value: u64) -> String {
    if value >= 1_000_000 {
        format!("{:.1}M", value as f64 / 1_000_000.0)
    } else if value >= 1_000 {
        format!("{:.1}K", value as f64 / 1_000.0)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::block::{StatBlock, TextBlock};

    #[test]
    fn builtin_ids_are_distinct() {
        let renderers = builtin_renderers();
        let mut ids: Vec<&str> = renderers.iter().map(|r| r.component_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), renderers.len());
    }

    #[test]
    fn summary_covers_primary_text() {
        let stat = ContentBlock::Stat(StatBlock {
            heading: "MRR".to_string(),
            value: "$40k".to_string(),
            trend_pct: None,
            customization: None,
        });
        assert_eq!(summary_lines(&stat), ("$40k".to_string(), Some("MRR".to_string())));

        let text = ContentBlock::Text(TextBlock {
            body: "ship it".to_string(),
            customization: None,
        });
        assert_eq!(summary_lines(&text).0, "ship it");
    }

    #[test]
    fn count_formatting() {
        assert_eq!(format_count(950), "950");
        assert_eq!(format_count(12_400), "12.4K");
        assert_eq!(format_count(3_200_000), "3.2M");
    }
}
