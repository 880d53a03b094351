use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use blockreel::{
    Compositor, FrameIndex, RenderThreading, RenderToMp4Opts, SceneRegistry, VideoInput, VideoPlan,
    pipeline, render::cpu::CpuBackend,
};

#[derive(Parser, Debug)]
#[command(name = "blockreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Validate an input/plan pair and print the resolved schedule.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Video input JSON (meta + content blocks).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Plan JSON (per-block decisions).
    #[arg(long)]
    plan: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Video input JSON (meta + content blocks).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Plan JSON (per-block decisions).
    #[arg(long)]
    plan: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Overwrite output if it already exists.
    #[arg(long, default_value_t = true)]
    overwrite: bool,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    /// Skip rasterizing frames whose picture is identical to an earlier
    /// frame in the same chunk.
    #[arg(long, default_value_t = true)]
    static_frame_elision: bool,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Video input JSON (meta + content blocks).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Plan JSON (per-block decisions).
    #[arg(long)]
    plan: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn load_compositor(in_path: &Path, plan_path: &Path) -> anyhow::Result<Compositor> {
    let input_json = std::fs::read_to_string(in_path)
        .with_context(|| format!("read input '{}'", in_path.display()))?;
    let input: VideoInput = serde_json::from_str(&input_json)
        .with_context(|| format!("parse input '{}'", in_path.display()))?;

    let plan_json = std::fs::read_to_string(plan_path)
        .with_context(|| format!("read plan '{}'", plan_path.display()))?;
    let plan: VideoPlan = serde_json::from_str(&plan_json)
        .with_context(|| format!("parse plan '{}'", plan_path.display()))?;

    Ok(Compositor::new(input, plan, SceneRegistry::builtin())?)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let comp = load_compositor(&args.in_path, &args.plan)?;
    let settings = pipeline::settings_for(&comp)?;

    let mut backend = CpuBackend::new(settings);
    let frame = pipeline::render_frame_rgba(&comp, FrameIndex(args.frame), &mut backend)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let comp = load_compositor(&args.in_path, &args.plan)?;
    let settings = pipeline::settings_for(&comp)?;

    let opts = RenderToMp4Opts {
        range: None,
        overwrite: args.overwrite,
        threading: RenderThreading {
            parallel: args.parallel,
            chunk_size: args.chunk_size,
            threads: args.threads,
            static_frame_elision: args.static_frame_elision,
        },
    };
    let stats = pipeline::render_to_mp4(&comp, &args.out, opts, &settings)?;

    eprintln!(
        "wrote {} ({} frames, {} rendered, {} elided)",
        args.out.display(),
        stats.frames_total,
        stats.frames_rendered,
        stats.frames_elided
    );
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let comp = load_compositor(&args.in_path, &args.plan)?;
    let schedule = comp.schedule();

    let segments = schedule
        .segments
        .iter()
        .map(|seg| {
            let (kind, block, decision) = match seg.kind {
                blockreel::SegmentKind::Intro => ("intro", None, None),
                blockreel::SegmentKind::Content { block, decision } => {
                    ("content", Some(block), Some(decision))
                }
                blockreel::SegmentKind::Outro => ("outro", None, None),
            };
            serde_json::json!({
                "kind": kind,
                "block": block,
                "decision": decision,
                "start_frame": seg.range.start.0,
                "end_frame": seg.range.end.0,
                "transition_hint": seg.transition_hint,
            })
        })
        .collect::<Vec<_>>();

    let report = serde_json::json!({
        "total_frames": schedule.total_frames,
        "duration_secs": schedule.duration_secs(),
        "fps": schedule.fps.0,
        "width": schedule.canvas.width,
        "height": schedule.canvas.height,
        "segments": segments,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
