use std::collections::HashMap;

use rayon::prelude::*;

use crate::{
    compositor::Compositor,
    encode::ffmpeg::{EncodeConfig, FfmpegEncoder},
    fingerprint::{FrameFingerprint, fingerprint_frame},
    foundation::{
        core::{FrameIndex, FrameRange},
        error::{BlockreelError, BlockreelResult},
    },
    render::{
        backend::{FrameRGBA, RenderBackend, RenderSettings},
        cpu::CpuBackend,
    },
};

/// Resolve + rasterize a single frame.
///
/// The one-shot API for producing pixels: display-list resolution through
/// the compositor, then rasterization on the given backend. Returns
/// premultiplied RGBA8.
pub fn render_frame_rgba(
    comp: &Compositor,
    frame: FrameIndex,
    backend: &mut dyn RenderBackend,
) -> BlockreelResult<FrameRGBA> {
    let scene = comp.render_frame(frame)?;
    backend.render_frame(&scene)
}

/// Render settings derived from the video input: font bytes loaded from
/// `meta.font_source` when set.
pub fn settings_for(comp: &Compositor) -> BlockreelResult<RenderSettings> {
    let mut settings = RenderSettings::default();
    if let Some(source) = &comp.input().meta.font_source {
        use anyhow::Context as _;
        let bytes = std::fs::read(source)
            .with_context(|| format!("failed to read font file '{source}'"))?;
        settings = settings.with_font_bytes(bytes);
    }
    Ok(settings)
}

/// Threading and chunking controls for multi-frame rendering.
#[derive(Clone, Debug)]
pub struct RenderThreading {
    /// Enable parallel rendering when `true`.
    pub parallel: bool,
    /// Chunk size in frames for batched scheduling.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
    /// Enable static-frame fingerprint elision.
    pub static_frame_elision: bool,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
            static_frame_elision: true,
        }
    }
}

/// Aggregated rendering counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Total requested frames.
    pub frames_total: u64,
    /// Frames that were actually rasterized.
    pub frames_rendered: u64,
    /// Frames reused via static-frame elision.
    pub frames_elided: u64,
}

/// Render a frame range (start inclusive, end exclusive) to pixel buffers.
pub fn render_range(
    comp: &Compositor,
    range: FrameRange,
    settings: &RenderSettings,
    threading: &RenderThreading,
) -> BlockreelResult<(Vec<FrameRGBA>, RenderStats)> {
    if range.is_empty() {
        return Err(BlockreelError::validation("render range must be non-empty"));
    }
    if range.end.0 > comp.total_frames() {
        return Err(BlockreelError::validation(
            "render range must be within the timeline",
        ));
    }

    let chunk_size = normalized_chunk_size(threading.chunk_size);
    let mut out = Vec::with_capacity(range.len_frames().min(4096) as usize);
    let mut stats = RenderStats::default();

    let maybe_pool = if threading.parallel {
        Some(build_thread_pool(threading.threads)?)
    } else {
        None
    };
    let mut sequential_backend = CpuBackend::new(settings.clone());

    let mut chunk_start = range.start.0;
    while chunk_start < range.end.0 {
        let chunk_end = (chunk_start + chunk_size).min(range.end.0);
        let chunk = FrameRange::new(FrameIndex(chunk_start), FrameIndex(chunk_end))?;

        let chunk_out = if let Some(pool) = &maybe_pool {
            render_chunk_parallel(comp, chunk, settings, threading, pool)?
        } else {
            render_chunk_sequential(comp, chunk, &mut sequential_backend, threading)?
        };

        let mut expanded = expand_unique(chunk_out.unique_frames, &chunk_out.frame_to_unique)?;
        out.append(&mut expanded);
        stats.frames_total += chunk_out.stats.frames_total;
        stats.frames_rendered += chunk_out.stats.frames_rendered;
        stats.frames_elided += chunk_out.stats.frames_elided;
        chunk_start = chunk_end;
    }

    Ok((out, stats))
}

/// Options for [`render_to_mp4`].
#[derive(Clone, Debug)]
pub struct RenderToMp4Opts {
    /// Frame range to render; `None` renders the full timeline.
    pub range: Option<FrameRange>,
    /// Whether to overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Render threading/chunking configuration.
    pub threading: RenderThreading,
}

impl Default for RenderToMp4Opts {
    fn default() -> Self {
        Self {
            range: None,
            overwrite: true,
            threading: RenderThreading::default(),
        }
    }
}

/// Render the timeline to an MP4 by streaming frames into a system `ffmpeg`
/// process. Alpha is flattened over the theme background color.
pub fn render_to_mp4(
    comp: &Compositor,
    out_path: impl Into<std::path::PathBuf>,
    opts: RenderToMp4Opts,
    settings: &RenderSettings,
) -> BlockreelResult<RenderStats> {
    let range = match opts.range {
        Some(range) => range,
        None => FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(comp.total_frames()),
        },
    };
    if range.is_empty() {
        return Err(BlockreelError::validation(
            "render_to_mp4 range must be non-empty",
        ));
    }
    if range.end.0 > comp.total_frames() {
        return Err(BlockreelError::validation(
            "render_to_mp4 range must be within the timeline",
        ));
    }

    let schedule = comp.schedule();
    let cfg = EncodeConfig {
        width: schedule.canvas.width,
        height: schedule.canvas.height,
        fps: schedule.fps.0,
        out_path: out_path.into(),
        overwrite: opts.overwrite,
    };
    let bg = schedule.theme.background;
    let mut enc = FfmpegEncoder::new(cfg, bg)?;

    let chunk_size = normalized_chunk_size(opts.threading.chunk_size);
    let mut stats = RenderStats::default();
    let maybe_pool = if opts.threading.parallel {
        Some(build_thread_pool(opts.threading.threads)?)
    } else {
        None
    };
    let mut sequential_backend = CpuBackend::new(settings.clone());

    let mut chunk_start = range.start.0;
    while chunk_start < range.end.0 {
        let chunk_end = (chunk_start + chunk_size).min(range.end.0);
        let chunk = FrameRange::new(FrameIndex(chunk_start), FrameIndex(chunk_end))?;

        let chunk_out = if let Some(pool) = &maybe_pool {
            render_chunk_parallel(comp, chunk, settings, &opts.threading, pool)?
        } else {
            render_chunk_sequential(comp, chunk, &mut sequential_backend, &opts.threading)?
        };

        for &u in &chunk_out.frame_to_unique {
            enc.encode_frame(chunk_out.unique_frames.get(u).ok_or_else(|| {
                BlockreelError::render("unique frame index out of range during encode")
            })?)?;
        }

        stats.frames_total += chunk_out.stats.frames_total;
        stats.frames_rendered += chunk_out.stats.frames_rendered;
        stats.frames_elided += chunk_out.stats.frames_elided;
        chunk_start = chunk_end;
    }

    enc.finish()?;
    Ok(stats)
}

struct ChunkOut {
    unique_frames: Vec<FrameRGBA>,
    frame_to_unique: Vec<usize>,
    stats: RenderStats,
}

/// Resolve every frame in the chunk to a display list, then dedupe held
/// frames by fingerprint so each distinct picture rasterizes once.
fn resolve_chunk(
    comp: &Compositor,
    range: FrameRange,
    elide: bool,
) -> BlockreelResult<(Vec<crate::scene::frame::SceneFrame>, Vec<usize>, Vec<usize>)> {
    let mut scenes = Vec::with_capacity(range.len_frames() as usize);
    for f in range.start.0..range.end.0 {
        scenes.push(comp.render_frame(FrameIndex(f))?);
    }

    let mut unique_indices = Vec::<usize>::with_capacity(scenes.len());
    let mut frame_to_unique = Vec::<usize>::with_capacity(scenes.len());
    if elide {
        let mut first = HashMap::<FrameFingerprint, usize>::new();
        for (idx, scene) in scenes.iter().enumerate() {
            let fingerprint = fingerprint_frame(scene);
            if let Some(existing) = first.get(&fingerprint).copied() {
                frame_to_unique.push(existing);
            } else {
                let slot = unique_indices.len();
                unique_indices.push(idx);
                first.insert(fingerprint, slot);
                frame_to_unique.push(slot);
            }
        }
    } else {
        for idx in 0..scenes.len() {
            frame_to_unique.push(idx);
            unique_indices.push(idx);
        }
    }

    Ok((scenes, unique_indices, frame_to_unique))
}

fn render_chunk_sequential(
    comp: &Compositor,
    range: FrameRange,
    backend: &mut CpuBackend,
    threading: &RenderThreading,
) -> BlockreelResult<ChunkOut> {
    let (scenes, unique_indices, frame_to_unique) =
        resolve_chunk(comp, range, threading.static_frame_elision)?;

    let mut unique_frames = Vec::with_capacity(unique_indices.len());
    for &idx in &unique_indices {
        unique_frames.push(backend.render_frame(&scenes[idx])?);
    }

    let total = scenes.len() as u64;
    let rendered = unique_indices.len() as u64;
    Ok(ChunkOut {
        unique_frames,
        frame_to_unique,
        stats: RenderStats {
            frames_total: total,
            frames_rendered: rendered,
            frames_elided: total.saturating_sub(rendered),
        },
    })
}

fn render_chunk_parallel(
    comp: &Compositor,
    range: FrameRange,
    settings: &RenderSettings,
    threading: &RenderThreading,
    pool: &rayon::ThreadPool,
) -> BlockreelResult<ChunkOut> {
    let (scenes, unique_indices, frame_to_unique) =
        resolve_chunk(comp, range, threading.static_frame_elision)?;

    // One backend per worker; no shared mutable state across frames.
    let rendered = pool.install(|| {
        unique_indices
            .par_iter()
            .map_init(
                || CpuBackend::new(settings.clone()),
                |worker_backend, scene_idx| -> BlockreelResult<FrameRGBA> {
                    worker_backend.render_frame(&scenes[*scene_idx])
                },
            )
            .collect::<Vec<_>>()
    });

    let mut unique_frames = Vec::<FrameRGBA>::with_capacity(rendered.len());
    for item in rendered {
        unique_frames.push(item?);
    }

    let total = scenes.len() as u64;
    let rendered_count = unique_indices.len() as u64;
    Ok(ChunkOut {
        unique_frames,
        frame_to_unique,
        stats: RenderStats {
            frames_total: total,
            frames_rendered: rendered_count,
            frames_elided: total.saturating_sub(rendered_count),
        },
    })
}

fn expand_unique(
    unique_frames: Vec<FrameRGBA>,
    frame_to_unique: &[usize],
) -> BlockreelResult<Vec<FrameRGBA>> {
    let mut unique = unique_frames.into_iter().map(Some).collect::<Vec<_>>();
    let mut remaining = vec![0usize; unique.len()];
    for &u in frame_to_unique {
        *remaining
            .get_mut(u)
            .ok_or_else(|| BlockreelError::render("unique frame index out of range"))? += 1;
    }

    let mut out = Vec::with_capacity(frame_to_unique.len());
    for &u in frame_to_unique {
        if remaining[u] == 1 {
            out.push(
                unique[u]
                    .take()
                    .ok_or_else(|| BlockreelError::render("unique frame missing at final take"))?,
            );
        } else {
            out.push(
                unique[u]
                    .as_ref()
                    .ok_or_else(|| BlockreelError::render("unique frame missing"))?
                    .clone(),
            );
        }
        remaining[u] -= 1;
    }
    Ok(out)
}

fn build_thread_pool(threads: Option<usize>) -> BlockreelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(BlockreelError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| BlockreelError::render(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 { 1 } else { chunk_size as u64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_is_never_zero() {
        assert_eq!(normalized_chunk_size(0), 1);
        assert_eq!(normalized_chunk_size(64), 64);
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(build_thread_pool(Some(0)).is_err());
    }

    #[test]
    fn expand_unique_reconstructs_full_sequence() {
        let frame = |tag: u8| FrameRGBA {
            width: 1,
            height: 1,
            data: vec![tag, 0, 0, 255],
        };
        let out = expand_unique(vec![frame(1), frame(2)], &[0, 0, 1, 0]).unwrap();
        let tags: Vec<u8> = out.iter().map(|f| f.data[0]).collect();
        assert_eq!(tags, vec![1, 1, 2, 1]);
    }
}
