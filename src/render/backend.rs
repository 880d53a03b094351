use std::sync::Arc;

use crate::{foundation::error::BlockreelResult, scene::frame::SceneFrame};

/// One rasterized frame. `data` is row-major premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Turns a display list into pixels. Backends may keep caches (layouts,
/// render contexts) but never frame-ordering state: the same `SceneFrame`
/// must produce the same pixels on any backend instance.
pub trait RenderBackend {
    fn render_frame(&mut self, frame: &SceneFrame) -> BlockreelResult<FrameRGBA>;
}

#[derive(Clone, Copy, Debug)]
pub enum BackendKind {
    Cpu,
}

#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// Straight RGBA clear color for the output surface before any op draws.
    /// `None` clears to transparent.
    pub clear_rgba: Option<[u8; 4]>,
    /// Font bytes for text ops. Text rendering fails without them.
    pub font_bytes: Option<Arc<Vec<u8>>>,
}

impl RenderSettings {
    pub fn with_font_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.font_bytes = Some(Arc::new(bytes));
        self
    }
}

pub fn create_backend(
    kind: BackendKind,
    settings: &RenderSettings,
) -> BlockreelResult<Box<dyn RenderBackend + Send>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(crate::render::cpu::CpuBackend::new(
            settings.clone(),
        ))),
    }
}
