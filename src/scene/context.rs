use crate::{
    animation::phase::PhaseProgress,
    foundation::core::{Affine, Canvas, Fps, Point, Rect},
    model::{block::ContentBlock, plan::MotionProfile},
    theme::ThemeColors,
};

/// Everything a block renderer is allowed to see for one frame.
///
/// The context is value-only: same inputs produce the same display list, no
/// matter which frame was rendered before. Renderers receive the effective
/// theme (block customization already applied) and the phase progress for
/// the segment-local frame.
#[derive(Clone, Debug)]
pub struct RenderCtx<'a> {
    pub block: &'a ContentBlock,
    pub theme: ThemeColors,
    pub profile: MotionProfile,
    pub phase: PhaseProgress,
    pub canvas: Canvas,
    pub local_frame: u64,
    pub fps: Fps,
}

impl RenderCtx<'_> {
    /// Content-safe rectangle: canvas inset by a margin proportional to the
    /// shorter edge, so layouts hold up across aspect ratios.
    pub fn content_rect(&self) -> Rect {
        let w = self.canvas.width as f64;
        let h = self.canvas.height as f64;
        let margin = (w.min(h) * 0.08).round();
        Rect::new(margin, margin, w - margin, h - margin)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.canvas.width as f64 / 2.0,
            self.canvas.height as f64 / 2.0,
        )
    }

    /// Entry/exit transform for this frame: vertical travel plus scale about
    /// `pivot`. Identity once the block has settled into its hold phase.
    pub fn phase_transform(&self, pivot: Point) -> Affine {
        let scale = self.phase.scale;
        Affine::translate((0.0, self.phase.entry_offset))
            * Affine::translate((pivot.x, pivot.y))
            * Affine::scale(scale)
            * Affine::translate((-pivot.x, -pivot.y))
    }

    pub fn opacity(&self) -> f32 {
        self.phase.opacity as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::block::{ContentBlock, TextBlock};

    fn text_block() -> ContentBlock {
        ContentBlock::Text(TextBlock {
            body: "hi".to_string(),
            customization: None,
        })
    }

    fn ctx_with(phase: PhaseProgress, block: &ContentBlock) -> RenderCtx<'_> {
        RenderCtx {
            block,
            theme: crate::theme::MIDNIGHT,
            profile: MotionProfile::Dynamic,
            phase,
            canvas: Canvas {
                width: 1080,
                height: 1920,
            },
            local_frame: 0,
            fps: Fps::default(),
        }
    }

    #[test]
    fn settled_phase_transform_is_identity() {
        let block = text_block();
        let ctx = ctx_with(
            PhaseProgress {
                opacity: 1.0,
                entry_offset: 0.0,
                scale: 1.0,
            },
            &block,
        );
        let t = ctx.phase_transform(ctx.center());
        let c = t.as_coeffs();
        assert!((c[0] - 1.0).abs() < 1e-12);
        assert!((c[3] - 1.0).abs() < 1e-12);
        assert!(c[4].abs() < 1e-9);
        assert!(c[5].abs() < 1e-9);
    }

    #[test]
    fn content_rect_is_inset_and_symmetric() {
        let block = text_block();
        let ctx = ctx_with(
            PhaseProgress {
                opacity: 1.0,
                entry_offset: 0.0,
                scale: 1.0,
            },
            &block,
        );
        let r = ctx.content_rect();
        assert!(r.x0 > 0.0);
        assert!((r.x0 - (1080.0 - r.x1)).abs() < 1e-9);
        assert!((r.y0 - (1920.0 - r.y1)).abs() < 1e-9);
    }
}
