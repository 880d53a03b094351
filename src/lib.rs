//! Blockreel assembles short-form videos from typed content blocks.
//!
//! A [`VideoInput`] (metadata plus an ordered list of content blocks) is
//! paired with a [`VideoPlan`] (one rendering decision per block). The
//! [`Compositor`] validates the pair, lays the blocks out on a gapless
//! frame timeline, and resolves any frame to a backend-agnostic display
//! list ([`SceneFrame`]) that the CPU backend rasterizes to pixels.
//!
//! # Pipeline overview
//!
//! 1. **Schedule**: `VideoInput + VideoPlan -> Schedule` (which block owns which frames)
//! 2. **Resolve**: `Schedule + FrameIndex -> SceneFrame` (what to draw, in what order)
//! 3. **Render**: `SceneFrame -> FrameRGBA` (CPU backend)
//! 4. **Encode** (optional): stream frames to the system `ffmpeg` binary for MP4 output
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Fail before frame zero**: every plan-contract violation is caught at
//!   schedule build time, never mid-render.
//! - **Deterministic-by-default**: a frame resolves to the same display list
//!   no matter which frames were resolved before it, so scrubbing and
//!   parallel export agree bit for bit.
//! - **Premultiplied RGBA8** end-to-end: the backend outputs premultiplied
//!   pixels; alpha is flattened only at encode time.
#![forbid(unsafe_code)]

pub mod animation;
pub mod compositor;
pub mod encode;
pub mod fingerprint;
pub mod foundation;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod schedule;
pub mod theme;

pub use animation::ease::Ease;
pub use animation::phase::{PhaseProgress, PhaseWindows, phase_progress};
pub use compositor::Compositor;
pub use fingerprint::{FrameFingerprint, fingerprint_frame};
pub use foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Rgba8Premul};
pub use foundation::error::{BlockreelError, BlockreelResult};
pub use model::block::{Alignment, ContentBlock, Customization};
pub use model::meta::{AspectRatio, SectionCard, VideoInput, VideoMeta};
pub use model::plan::{AnimationWindow, Decision, MotionProfile, VideoPlan};
pub use pipeline::{
    RenderStats, RenderThreading, RenderToMp4Opts, render_frame_rgba, render_range, render_to_mp4,
};
pub use render::{BackendKind, FrameRGBA, RenderBackend, RenderSettings, create_backend};
pub use scene::frame::{DrawOp, SceneFrame, TextAlign};
pub use scene::registry::{SceneRegistry, SceneRenderer};
pub use schedule::{Schedule, Segment, SegmentKind};
pub use theme::{ThemeColors, resolve_theme};
