use crate::{
    animation::ease::Ease,
    foundation::core::Fps,
    model::plan::{AnimationWindow, MotionProfile},
};

/// Enter/exit windows of a segment, in frames, after reconciliation against
/// the segment's true length.
///
/// The plan's `hold` is never used directly: hold is whatever remains between
/// the enter ramp and the exit window, and the exit window is anchored to the
/// segment's end frame. When `enter + exit` would exceed the segment, both
/// are scaled down proportionally so hold never goes negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseWindows {
    pub segment_frames: u64,
    pub enter_frames: u64,
    pub exit_frames: u64,
}

impl PhaseWindows {
    pub fn from_animation(animation: &AnimationWindow, fps: Fps, segment_frames: u64) -> Self {
        let mut enter_frames = fps.secs_to_frames_round(animation.enter);
        let mut exit_frames = fps.secs_to_frames_round(animation.exit);

        let sum = enter_frames + exit_frames;
        if sum > segment_frames && sum > 0 {
            let scale = segment_frames as f64 / sum as f64;
            enter_frames = ((enter_frames as f64) * scale).floor() as u64;
            exit_frames = ((exit_frames as f64) * scale).floor() as u64;
        }

        Self {
            segment_frames,
            enter_frames,
            exit_frames,
        }
    }

    /// Envelope for intro/outro cards: a fixed short fade on both ends.
    pub fn section_default(fps: Fps, segment_frames: u64) -> Self {
        let edge = AnimationWindow {
            enter: 0.4,
            hold: 0.0,
            exit: 0.4,
        };
        Self::from_animation(&edge, fps, segment_frames)
    }

    pub fn hold_frames(&self) -> u64 {
        self.segment_frames
            .saturating_sub(self.enter_frames)
            .saturating_sub(self.exit_frames)
    }

    fn exit_start(&self) -> u64 {
        self.segment_frames.saturating_sub(self.exit_frames)
    }
}

/// Normalized animation state for one segment-local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseProgress {
    /// 0..1; ramps up over enter, 1 through hold, ramps down over exit.
    pub opacity: f64,
    /// Pixels of remaining entry displacement. Negative values mean the
    /// element has overshot its rest position (energetic profile only).
    pub entry_offset: f64,
    /// Uniform scale factor, approaching 1.0 through enter, shrinking
    /// slightly through exit.
    pub scale: f64,
}

/// Base displacement in pixels at the start of the enter phase, before
/// profile amplitude scaling.
const ENTRY_TRAVEL_PX: f64 = 80.0;
/// Scale deficit at the start of the enter phase (element enters at 1-this).
const ENTRY_SCALE_DELTA: f64 = 0.08;
/// Scale shed over the exit window.
const EXIT_SCALE_DELTA: f64 = 0.04;

impl MotionProfile {
    /// Amplitude multiplier. Profiles scale motion only, never durations.
    pub fn amplitude(self) -> f64 {
        match self {
            Self::Subtle => 0.35,
            Self::Dynamic => 1.0,
            Self::Energetic => 1.15,
        }
    }

    fn overshoots(self) -> bool {
        matches!(self, Self::Energetic)
    }
}

/// Compute the animation state for `local_frame` of a segment.
///
/// Pure function of the frame number: no accumulated physics state, so
/// scrubbing to any frame without evaluating prior frames yields identical
/// results. `local_frame` outside `[0, segment_frames)` is a caller contract
/// violation; debug builds assert, release builds clamp.
pub fn phase_progress(
    local_frame: u64,
    windows: PhaseWindows,
    profile: MotionProfile,
) -> PhaseProgress {
    debug_assert!(
        windows.segment_frames == 0 || local_frame < windows.segment_frames,
        "local_frame {local_frame} outside segment of {} frames",
        windows.segment_frames
    );
    let local = if windows.segment_frames == 0 {
        0
    } else {
        local_frame.min(windows.segment_frames - 1)
    };

    let amp = profile.amplitude();

    // Enter ramp over [0, enter_frames): t=0 at the first frame so every
    // segment fades in from nothing.
    let (opacity_in, settle) = if local < windows.enter_frames {
        let t = local as f64 / windows.enter_frames as f64;
        (Ease::OutCubic.apply(t), spring_response(t, profile))
    } else {
        (1.0, 1.0)
    };

    // Exit window anchored to the true segment end; the last frame always
    // lands at opacity 0 regardless of rounding drift in the plan.
    let opacity_out = if windows.exit_frames > 0 && local >= windows.exit_start() {
        let u = (local - windows.exit_start() + 1) as f64 / windows.exit_frames as f64;
        1.0 - Ease::InCubic.apply(u)
    } else {
        1.0
    };

    let entry_offset = ENTRY_TRAVEL_PX * amp * (1.0 - settle);

    let scale_in = 1.0 - ENTRY_SCALE_DELTA * amp * (1.0 - settle);
    let scale_out = if windows.exit_frames > 0 && local >= windows.exit_start() {
        let u = (local - windows.exit_start() + 1) as f64 / windows.exit_frames as f64;
        1.0 - EXIT_SCALE_DELTA * amp * Ease::InQuad.apply(u)
    } else {
        1.0
    };

    PhaseProgress {
        opacity: (opacity_in * opacity_out).clamp(0.0, 1.0),
        entry_offset,
        scale: scale_in * scale_out,
    }
}

/// Closed-form damped spring response over normalized enter time `x` in
/// [0, 1]: 0 at x=0, settling to 1 by x=1.
///
/// Critically damped for subtle/dynamic (monotonic approach), underdamped
/// for energetic (bounded overshoot, ~9% past rest). Expressed as a function
/// of elapsed time rather than an integrator so results are identical under
/// random access.
fn spring_response(x: f64, profile: MotionProfile) -> f64 {
    let x = x.clamp(0.0, 1.0);
    if x >= 1.0 {
        return 1.0;
    }

    if profile.overshoots() {
        // Underdamped: zeta = 0.6, omega0 = 8 over the normalized window.
        let zeta: f64 = 0.6;
        let omega0: f64 = 8.0;
        let omega_d = omega0 * (1.0 - zeta * zeta).sqrt();
        let decay = (-zeta * omega0 * x).exp();
        1.0 - decay * ((omega_d * x).cos() + (zeta * omega0 / omega_d) * (omega_d * x).sin())
    } else {
        // Critically damped: s(x) = 1 - (1 + w x) e^{-w x}.
        let omega = 6.0;
        1.0 - (1.0 + omega * x) * (-omega * x).exp()
    }
}
