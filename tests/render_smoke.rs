use std::fs;
use std::path::Path;

use blockreel::{
    Compositor, FrameIndex, FrameRange, RenderSettings, RenderThreading, SceneRegistry, VideoInput,
    VideoPlan, fingerprint_frame, pipeline, render::cpu::CpuBackend,
};

fn load_fixture(input: &str, plan: &str) -> Compositor {
    let input: VideoInput = serde_json::from_str(
        &fs::read_to_string(Path::new("tests/data").join(input)).unwrap(),
    )
    .unwrap();
    let plan: VideoPlan =
        serde_json::from_str(&fs::read_to_string(Path::new("tests/data").join(plan)).unwrap())
            .unwrap();
    Compositor::new(input, plan, SceneRegistry::builtin()).unwrap()
}

#[test]
fn render_single_frame_bg_loop() {
    let comp = load_fixture("bg_loop_input.json", "bg_loop_plan.json");
    let mut backend = CpuBackend::new(RenderSettings::default());
    let frame = pipeline::render_frame_rgba(&comp, FrameIndex(0), &mut backend).unwrap();
    assert_eq!(frame.width, 1080);
    assert_eq!(frame.height, 1080);
    assert_eq!(frame.data.len(), 1080 * 1080 * 4);

    // The theme backdrop is opaque, so every pixel must be too.
    assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn sequential_and_parallel_renders_match() {
    let comp = load_fixture("bg_loop_input.json", "bg_loop_plan.json");
    let range = FrameRange::new(FrameIndex(0), FrameIndex(16)).unwrap();
    let settings = RenderSettings::default();

    let (seq, seq_stats) = pipeline::render_range(
        &comp,
        range,
        &settings,
        &RenderThreading::default(),
    )
    .unwrap();

    let par_threading = RenderThreading {
        parallel: true,
        chunk_size: 8,
        ..Default::default()
    };
    let (par, par_stats) =
        pipeline::render_range(&comp, range, &settings, &par_threading).unwrap();

    assert_eq!(seq_stats.frames_total, 16);
    assert_eq!(par_stats.frames_total, 16);
    assert_eq!(seq.len(), par.len());
    for (i, (a, b)) in seq.iter().zip(par.iter()).enumerate() {
        assert_eq!(a.width, b.width);
        assert_eq!(a.height, b.height);
        assert_eq!(a.data, b.data, "frame {i} differs");
    }
}

#[test]
fn text_without_font_fails_at_raster_time() {
    // The display-list stage never needs a font; only rasterization does.
    let comp = load_fixture("factpack_input.json", "factpack_plan.json");
    comp.render_frame(FrameIndex(0)).unwrap();

    let mut backend = CpuBackend::new(RenderSettings::default());
    let err = pipeline::render_frame_rgba(&comp, FrameIndex(0), &mut backend).unwrap_err();
    assert!(err.to_string().contains("font"), "got: {err}");
}

#[test]
fn hold_frames_share_a_fingerprint() {
    // A stat card is motionless through its hold window, so consecutive hold
    // frames produce identical display lists. This is what static-frame
    // elision keys on.
    let comp = load_fixture("factpack_input.json", "factpack_plan.json");

    // Block 0: content segment [60, 150), enter 15 frames, exit 15 frames.
    let a = fingerprint_frame(&comp.render_frame(FrameIndex(100)).unwrap());
    let b = fingerprint_frame(&comp.render_frame(FrameIndex(101)).unwrap());
    assert_eq!(a, b);

    // An enter-phase frame must differ from a hold frame.
    let entering = fingerprint_frame(&comp.render_frame(FrameIndex(62)).unwrap());
    assert_ne!(entering, a);
}

#[test]
fn render_range_rejects_frames_past_the_timeline() {
    let comp = load_fixture("bg_loop_input.json", "bg_loop_plan.json");
    let total = comp.total_frames();
    let range = FrameRange::new(FrameIndex(0), FrameIndex(total + 1)).unwrap();
    let err = pipeline::render_range(
        &comp,
        range,
        &RenderSettings::default(),
        &RenderThreading::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("timeline"), "got: {err}");
}
