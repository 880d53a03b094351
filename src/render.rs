pub mod backend;
pub mod cpu;

pub use backend::{BackendKind, FrameRGBA, RenderBackend, RenderSettings, create_backend};
