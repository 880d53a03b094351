use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    foundation::{
        core::{Affine, BezPath},
        error::{BlockreelError, BlockreelResult},
    },
    render::backend::{FrameRGBA, RenderBackend, RenderSettings},
    scene::frame::{DrawOp, SceneFrame, TextAlign},
};

/// CPU rasterizer powered by `vello_cpu`, with `parley` for text shaping.
///
/// Holds a reusable render context and a text layout cache. All cached state
/// is keyed purely by op content, so a backend instance can be handed any
/// frame in any order.
pub struct CpuBackend {
    settings: RenderSettings,
    ctx: Option<vello_cpu::RenderContext>,
    text_engine: TextLayoutEngine,
    layout_cache: HashMap<LayoutKey, CachedLayout>,
    font: Option<vello_cpu::peniko::FontData>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct LayoutKey {
    content: String,
    size_bits: u32,
    width_bits: u32,
    align: u8,
    brush: [u8; 4],
}

#[derive(Clone)]
struct CachedLayout {
    layout: Arc<parley::Layout<TextBrushRgba8>>,
}

impl CpuBackend {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            ctx: None,
            text_engine: TextLayoutEngine::new(),
            layout_cache: HashMap::new(),
            font: None,
        }
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> BlockreelResult<R>,
    ) -> BlockreelResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn font_data(&mut self) -> BlockreelResult<vello_cpu::peniko::FontData> {
        if let Some(font) = &self.font {
            return Ok(font.clone());
        }
        let bytes = self.settings.font_bytes.clone().ok_or_else(|| {
            BlockreelError::render(
                "frame contains text but no font was configured (set meta.font_source)",
            )
        })?;
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            0,
        );
        self.font = Some(font.clone());
        Ok(font)
    }

    #[allow(clippy::too_many_arguments)]
    fn layout_for(
        &mut self,
        content: &str,
        size_px: f32,
        max_width: Option<f32>,
        align: TextAlign,
        brush: [u8; 4],
    ) -> BlockreelResult<CachedLayout> {
        let key = LayoutKey {
            content: content.to_string(),
            size_bits: size_px.to_bits(),
            width_bits: max_width.map(f32::to_bits).unwrap_or(0),
            align: align as u8,
            brush,
        };
        if let Some(cached) = self.layout_cache.get(&key) {
            return Ok(cached.clone());
        }
        let bytes = self.settings.font_bytes.clone().ok_or_else(|| {
            BlockreelError::render(
                "frame contains text but no font was configured (set meta.font_source)",
            )
        })?;
        let layout = self.text_engine.layout_plain(
            &bytes,
            content,
            size_px,
            TextBrushRgba8 {
                r: brush[0],
                g: brush[1],
                b: brush[2],
                a: brush[3],
            },
            max_width,
            align,
        )?;
        let cached = CachedLayout {
            layout: Arc::new(layout),
        };
        self.layout_cache.insert(key, cached.clone());
        Ok(cached)
    }

    fn draw_op(
        &mut self,
        op: &DrawOp,
        ctx: &mut vello_cpu::RenderContext,
    ) -> BlockreelResult<()> {
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match op {
            DrawOp::FillPath {
                path,
                transform,
                color,
                opacity,
                z: _,
            } => {
                ctx.set_transform(affine_to_cpu(*transform));
                // peniko colors are straight-alpha.
                let [r, g, b, a] = color.to_straight_rgba();
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                if *opacity < 1.0 {
                    ctx.push_opacity_layer(*opacity);
                }
                ctx.fill_path(&bezpath_to_cpu(path));
                if *opacity < 1.0 {
                    ctx.pop_layer();
                }
            }
            DrawOp::FillRect {
                rect,
                transform,
                color,
                opacity,
                z: _,
            } => {
                ctx.set_transform(affine_to_cpu(*transform));
                let [r, g, b, a] = color.to_straight_rgba();
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                if *opacity < 1.0 {
                    ctx.push_opacity_layer(*opacity);
                }
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    rect.x0, rect.y0, rect.x1, rect.y1,
                ));
                if *opacity < 1.0 {
                    ctx.pop_layer();
                }
            }
            DrawOp::Text {
                content,
                origin,
                size_px,
                max_width,
                align,
                transform,
                color,
                opacity,
                z: _,
            } => {
                let font = self.font_data()?;
                // Brush bytes are straight RGBA; peniko applies alpha itself.
                let cached = self.layout_for(
                    content,
                    *size_px,
                    *max_width,
                    *align,
                    color.to_straight_rgba(),
                )?;

                ctx.set_transform(affine_to_cpu(
                    *transform * Affine::translate((origin.0, origin.1)),
                ));
                if *opacity < 1.0 {
                    ctx.push_opacity_layer(*opacity);
                }
                for line in cached.layout.lines() {
                    for item in line.items() {
                        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                            continue;
                        };
                        let brush = run.style().brush;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                            brush.r, brush.g, brush.b, brush.a,
                        ));
                        let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        });
                        ctx.glyph_run(&font)
                            .font_size(run.run().font_size())
                            .fill_glyphs(glyphs);
                    }
                }
                if *opacity < 1.0 {
                    ctx.pop_layer();
                }
            }
        }
        Ok(())
    }
}

impl RenderBackend for CpuBackend {
    fn render_frame(&mut self, frame: &SceneFrame) -> BlockreelResult<FrameRGBA> {
        let width: u16 = frame.canvas.width.try_into().map_err(|_| {
            BlockreelError::render(format!("canvas width exceeds u16: {}", frame.canvas.width))
        })?;
        let height: u16 = frame.canvas.height.try_into().map_err(|_| {
            BlockreelError::render(format!(
                "canvas height exceeds u16: {}",
                frame.canvas.height
            ))
        })?;

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        if let Some(clear) = self.settings.clear_rgba {
            let premul = premul_rgba8(clear);
            for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
                px.copy_from_slice(&premul);
            }
        }

        let ops = frame.ops_by_z().into_iter().cloned().collect::<Vec<_>>();
        self.with_ctx_mut(width, height, |this, ctx| {
            for op in &ops {
                this.draw_op(op, ctx)?;
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(())
        })?;

        Ok(FrameRGBA {
            width: frame.canvas.width,
            height: frame.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
        })
    }
}

fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    let premul = |c: u8| -> u8 { (((u16::from(c) * a16) + 127) / 255) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape and lay out plain text using provided font bytes and styling.
    pub(crate) fn layout_plain(
        &mut self,
        font_bytes: &[u8],
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
        max_width_px: Option<f32>,
        align: TextAlign,
    ) -> BlockreelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(BlockreelError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            BlockreelError::validation("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .map(str::to_string)
            .ok_or_else(|| BlockreelError::validation("registered font family has no name"))?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        if let Some(w) = max_width_px {
            layout.break_all_lines(Some(w));
            layout.align(
                Some(w),
                match align {
                    TextAlign::Start => parley::Alignment::Start,
                    TextAlign::Center => parley::Alignment::Center,
                    TextAlign::End => parley::Alignment::End,
                },
                parley::AlignmentOptions::default(),
            );
        } else {
            layout.break_all_lines(None);
        }

        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{Canvas, Rect, Rgba8Premul};

    fn rect_frame(color: Rgba8Premul) -> SceneFrame {
        let mut frame = SceneFrame::new(Canvas {
            width: 16,
            height: 16,
        });
        frame.push(DrawOp::FillRect {
            rect: Rect::new(0.0, 0.0, 16.0, 16.0),
            transform: Affine::IDENTITY,
            color,
            opacity: 1.0,
            z: 0,
        });
        frame
    }

    #[test]
    fn solid_rect_fills_every_pixel() {
        let mut backend = CpuBackend::new(RenderSettings::default());
        let frame = rect_frame(Rgba8Premul::from_straight_rgba(255, 0, 0, 255));
        let out = backend.render_frame(&frame).unwrap();
        assert_eq!(out.data.len(), 16 * 16 * 4);
        // Opaque red everywhere.
        for px in out.data.chunks_exact(4) {
            assert_eq!(px[3], 255);
            assert!(px[0] > 200);
        }
    }

    #[test]
    fn same_frame_rasterizes_identically() {
        let mut backend = CpuBackend::new(RenderSettings::default());
        let frame = rect_frame(Rgba8Premul::from_straight_rgba(10, 200, 40, 255));
        let a = backend.render_frame(&frame).unwrap();
        let b = backend.render_frame(&frame).unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn translucent_paint_is_not_double_attenuated() {
        let mut backend = CpuBackend::new(RenderSettings::default());
        let frame = rect_frame(Rgba8Premul::from_straight_rgba(255, 0, 0, 128));
        let out = backend.render_frame(&frame).unwrap();

        // Straight (255,0,0,128) over transparent lands at premul r ~ a ~ 128.
        // Applying the alpha twice would halve red again (~64).
        let px = &out.data[0..4];
        assert!((120..=136).contains(&px[3]), "alpha {}", px[3]);
        assert!((120..=136).contains(&px[0]), "red {}", px[0]);
    }

    #[test]
    fn text_without_font_is_an_error() {
        let mut backend = CpuBackend::new(RenderSettings::default());
        let mut frame = SceneFrame::new(Canvas {
            width: 16,
            height: 16,
        });
        frame.push(DrawOp::Text {
            content: "hi".to_string(),
            origin: (0.0, 0.0),
            size_px: 12.0,
            max_width: None,
            align: TextAlign::Start,
            transform: Affine::IDENTITY,
            color: Rgba8Premul::from_straight_rgba(255, 255, 255, 255),
            opacity: 1.0,
            z: 1,
        });
        assert!(backend.render_frame(&frame).is_err());
    }
}
