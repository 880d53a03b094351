use tracing::warn;

use crate::{
    animation::phase::PhaseWindows,
    foundation::{
        core::{Canvas, Fps, FrameIndex, FrameRange},
        error::{BlockreelError, BlockreelResult},
    },
    model::{
        meta::VideoInput,
        plan::{MotionProfile, VideoPlan},
    },
    scene::registry::SceneRegistry,
    theme::ThemeColors,
};

/// What occupies a segment's frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Intro,
    /// Content block at `block` paired 1:1 with plan decision `decision`
    /// (always the same index).
    Content { block: usize, decision: usize },
    Outro,
}

/// One contiguous run of frames owned by a single visual. Ranges are
/// end-exclusive and gapless: a boundary frame belongs to the segment that
/// starts there.
#[derive(Clone, Debug)]
pub struct Segment {
    pub kind: SegmentKind,
    pub range: FrameRange,
    pub profile: MotionProfile,
    pub windows: PhaseWindows,
    /// Advisory transition hint for the boundary this segment leads into.
    pub transition_hint: Option<String>,
}

/// Frame-accurate timeline. Built once per (input, plan) pair after full
/// contract validation; immutable afterwards so any frame can be resolved
/// from any thread.
#[derive(Clone, Debug)]
pub struct Schedule {
    pub segments: Vec<Segment>,
    pub total_frames: u64,
    pub fps: Fps,
    pub canvas: Canvas,
    pub theme: ThemeColors,
}

/// Tolerance before an advisory total duration mismatch is worth a warning.
const TOTAL_DRIFT_WARN_SECS: f64 = 0.25;

/// Renderer family that draws intro/outro section cards.
pub(crate) const SECTION_RENDERER: &str = "headline";

impl Schedule {
    /// Validate the full contract, then lay out segments.
    ///
    /// Validation order is fixed: input shape, plan shape, block/decision
    /// cardinality, then component resolution against the registry. The
    /// first failure wins and nothing is scheduled.
    pub fn build(
        input: &VideoInput,
        plan: &VideoPlan,
        registry: &SceneRegistry,
    ) -> BlockreelResult<Self> {
        input.validate()?;
        plan.validate()?;

        if input.blocks.len() != plan.decisions.len() {
            return Err(BlockreelError::Cardinality {
                blocks: input.blocks.len(),
                decisions: plan.decisions.len(),
            });
        }
        for (index, decision) in plan.decisions.iter().enumerate() {
            registry.resolve(&decision.component_id, index)?;
        }
        // Section cards render through a fixed family; a registry without it
        // cannot serve a timeline that schedules one.
        if (input.meta.intro.is_some() || input.meta.outro.is_some())
            && !registry.contains(SECTION_RENDERER)
        {
            return Err(BlockreelError::validation(format!(
                "meta.intro/meta.outro require the '{SECTION_RENDERER}' renderer, \
                 which is not registered"
            )));
        }

        let fps = input.meta.fps;
        let mut segments = Vec::with_capacity(plan.decisions.len() + 2);
        let mut cursor = 0u64;

        let mut push = |kind: SegmentKind,
                        secs: f64,
                        profile: MotionProfile,
                        windows_for: &dyn Fn(u64) -> PhaseWindows| {
            // Every scheduled segment owns at least one frame.
            let frames = fps.secs_to_frames_round(secs).max(1);
            let range = FrameRange {
                start: FrameIndex(cursor),
                end: FrameIndex(cursor + frames),
            };
            cursor += frames;
            segments.push(Segment {
                kind,
                range,
                profile,
                windows: windows_for(frames),
                transition_hint: None,
            });
        };

        if let Some(intro) = &input.meta.intro {
            push(
                SegmentKind::Intro,
                intro.duration_secs,
                MotionProfile::Dynamic,
                &|frames| PhaseWindows::section_default(fps, frames),
            );
        }
        for (index, decision) in plan.decisions.iter().enumerate() {
            push(
                SegmentKind::Content {
                    block: index,
                    decision: index,
                },
                decision.duration_secs,
                decision.motion_profile,
                &|frames| PhaseWindows::from_animation(&decision.animation, fps, frames),
            );
        }
        if let Some(outro) = &input.meta.outro {
            push(
                SegmentKind::Outro,
                outro.duration_secs,
                MotionProfile::Dynamic,
                &|frames| PhaseWindows::section_default(fps, frames),
            );
        }

        // Hints pair with the boundary each segment leads into; spares are
        // advisory noise, not errors.
        for (segment, hint) in segments.iter_mut().zip(&plan.suggested_transitions) {
            segment.transition_hint = Some(hint.clone());
        }
        if plan.suggested_transitions.len() > segments.len() {
            warn!(
                hints = plan.suggested_transitions.len(),
                segments = segments.len(),
                "more transition hints than segment boundaries, extras ignored"
            );
        }

        let total_frames = cursor;
        if let Some(advisory) = plan.total_duration_secs {
            let actual = fps.frames_to_secs(total_frames);
            if (actual - advisory).abs() > TOTAL_DRIFT_WARN_SECS {
                warn!(
                    advisory_secs = advisory,
                    scheduled_secs = actual,
                    "plan total_duration_secs disagrees with scheduled total"
                );
            }
        }

        Ok(Self {
            segments,
            total_frames,
            fps,
            canvas: input.meta.aspect_ratio.canvas(),
            theme: crate::theme::resolve_theme(&input.meta.theme),
        })
    }

    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.total_frames)
    }

    /// Segment owning `frame`, plus the segment-local frame index. `None`
    /// past the end of the timeline.
    pub fn segment_at(&self, frame: FrameIndex) -> Option<(&Segment, u64)> {
        if frame.0 >= self.total_frames {
            return None;
        }
        // Gapless sorted ranges: the owning segment is the last one starting
        // at or before `frame`.
        let idx = self
            .segments
            .partition_point(|s| s.range.start.0 <= frame.0)
            .checked_sub(1)?;
        let segment = &self.segments[idx];
        debug_assert!(segment.range.contains(frame));
        Some((segment, frame.0 - segment.range.start.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        block::{ContentBlock, StatBlock, TextBlock},
        meta::{AspectRatio, SectionCard, VideoMeta},
        plan::{AnimationWindow, Decision},
    };

    fn meta_with_sections() -> VideoMeta {
        VideoMeta {
            aspect_ratio: AspectRatio::Tall9x16,
            fps: Fps(30),
            theme: "midnight".to_string(),
            font_source: None,
            intro: Some(SectionCard {
                title: "intro".to_string(),
                subtitle: None,
                duration_secs: 2.0,
            }),
            outro: Some(SectionCard {
                title: "outro".to_string(),
                subtitle: None,
                duration_secs: 2.0,
            }),
        }
    }

    fn one_block() -> Vec<ContentBlock> {
        vec![ContentBlock::Stat(StatBlock {
            heading: "Users".to_string(),
            value: "10k".to_string(),
            trend_pct: None,
            customization: None,
        })]
    }

    fn decision_secs(component: &str, secs: f64) -> Decision {
        Decision {
            component_id: component.to_string(),
            motion_profile: MotionProfile::Dynamic,
            duration_secs: secs,
            animation: AnimationWindow {
                enter: 0.5,
                hold: secs - 1.0,
                exit: 0.5,
            },
        }
    }

    fn plan_of(decisions: Vec<Decision>) -> VideoPlan {
        VideoPlan {
            decisions,
            total_duration_secs: None,
            suggested_transitions: vec![],
        }
    }

    #[test]
    fn intro_content_outro_layout() {
        let input = VideoInput {
            meta: meta_with_sections(),
            blocks: one_block(),
        };
        let plan = plan_of(vec![decision_secs("card", 3.0)]);
        let schedule = Schedule::build(&input, &plan, &SceneRegistry::builtin()).unwrap();

        assert_eq!(schedule.segments.len(), 3);
        assert_eq!(schedule.segments[0].range, FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(60),
        });
        assert_eq!(schedule.segments[1].range, FrameRange {
            start: FrameIndex(60),
            end: FrameIndex(150),
        });
        assert_eq!(schedule.segments[2].range, FrameRange {
            start: FrameIndex(150),
            end: FrameIndex(210),
        });
        assert_eq!(schedule.total_frames, 210);
        assert_eq!(schedule.duration_secs(), 7.0);
    }

    #[test]
    fn cardinality_mismatch_is_fatal() {
        let input = VideoInput {
            meta: meta_with_sections(),
            blocks: vec![
                ContentBlock::Text(TextBlock {
                    body: "one".to_string(),
                    customization: None,
                }),
                ContentBlock::Text(TextBlock {
                    body: "two".to_string(),
                    customization: None,
                }),
            ],
        };
        let plan = plan_of(vec![decision_secs("headline", 3.0)]);
        let err = Schedule::build(&input, &plan, &SceneRegistry::builtin()).unwrap_err();
        match err {
            BlockreelError::Cardinality { blocks, decisions } => {
                assert_eq!(blocks, 2);
                assert_eq!(decisions, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_component_names_decision_index() {
        let input = VideoInput {
            meta: meta_with_sections(),
            blocks: vec![
                ContentBlock::Text(TextBlock {
                    body: "one".to_string(),
                    customization: None,
                }),
                ContentBlock::Text(TextBlock {
                    body: "two".to_string(),
                    customization: None,
                }),
            ],
        };
        let plan = plan_of(vec![
            decision_secs("headline", 3.0),
            decision_secs("sparkle-burst", 3.0),
        ]);
        let err = Schedule::build(&input, &plan, &SceneRegistry::builtin()).unwrap_err();
        match err {
            BlockreelError::UnknownComponent { decision, component } => {
                assert_eq!(decision, 1);
                assert_eq!(component, "sparkle-burst");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sections_require_their_renderer_at_build_time() {
        let mut registry = SceneRegistry::empty();
        registry
            .register(Box::new(crate::scene::blocks::card::CardRenderer))
            .unwrap();

        let input = VideoInput {
            meta: meta_with_sections(),
            blocks: one_block(),
        };
        let plan = plan_of(vec![decision_secs("card", 3.0)]);
        let err = Schedule::build(&input, &plan, &registry).unwrap_err();
        assert!(err.to_string().contains("headline"), "got: {err}");

        // Without sections the partial registry is sufficient.
        let mut meta = meta_with_sections();
        meta.intro = None;
        meta.outro = None;
        let input = VideoInput {
            meta,
            blocks: one_block(),
        };
        Schedule::build(&input, &plan, &registry).unwrap();
    }

    #[test]
    fn boundary_frame_belongs_to_following_segment() {
        let input = VideoInput {
            meta: meta_with_sections(),
            blocks: one_block(),
        };
        let plan = plan_of(vec![decision_secs("card", 3.0)]);
        let schedule = Schedule::build(&input, &plan, &SceneRegistry::builtin()).unwrap();

        let (segment, local) = schedule.segment_at(FrameIndex(60)).unwrap();
        assert_eq!(segment.kind, SegmentKind::Content { block: 0, decision: 0 });
        assert_eq!(local, 0);

        let (segment, local) = schedule.segment_at(FrameIndex(59)).unwrap();
        assert_eq!(segment.kind, SegmentKind::Intro);
        assert_eq!(local, 59);

        assert!(schedule.segment_at(FrameIndex(210)).is_none());
    }

    #[test]
    fn every_frame_maps_to_exactly_one_segment() {
        let input = VideoInput {
            meta: meta_with_sections(),
            blocks: one_block(),
        };
        let plan = plan_of(vec![decision_secs("card", 3.0)]);
        let schedule = Schedule::build(&input, &plan, &SceneRegistry::builtin()).unwrap();

        let mut prev_end = 0u64;
        for segment in &schedule.segments {
            assert_eq!(segment.range.start.0, prev_end);
            prev_end = segment.range.end.0;
        }
        assert_eq!(prev_end, schedule.total_frames);

        for f in 0..schedule.total_frames {
            let (segment, local) = schedule.segment_at(FrameIndex(f)).unwrap();
            assert!(segment.range.contains(FrameIndex(f)));
            assert_eq!(local, f - segment.range.start.0);
        }
    }

    #[test]
    fn sections_are_optional() {
        let mut meta = meta_with_sections();
        meta.intro = None;
        meta.outro = None;
        let input = VideoInput {
            meta,
            blocks: one_block(),
        };
        let plan = plan_of(vec![decision_secs("card", 3.0)]);
        let schedule = Schedule::build(&input, &plan, &SceneRegistry::builtin()).unwrap();
        assert_eq!(schedule.segments.len(), 1);
        assert_eq!(schedule.total_frames, 90);
        let (segment, _) = schedule.segment_at(FrameIndex(0)).unwrap();
        assert_eq!(segment.kind, SegmentKind::Content { block: 0, decision: 0 });
    }

    #[test]
    fn tiny_durations_still_get_one_frame() {
        let mut meta = meta_with_sections();
        meta.intro = None;
        meta.outro = None;
        let input = VideoInput {
            meta,
            blocks: one_block(),
        };
        let mut d = decision_secs("card", 0.004);
        d.animation = AnimationWindow {
            enter: 0.0,
            hold: 0.004,
            exit: 0.0,
        };
        let plan = plan_of(vec![d]);
        let schedule = Schedule::build(&input, &plan, &SceneRegistry::builtin()).unwrap();
        assert_eq!(schedule.total_frames, 1);
    }

    #[test]
    fn transition_hints_attach_in_order() {
        let input = VideoInput {
            meta: meta_with_sections(),
            blocks: one_block(),
        };
        let mut plan = plan_of(vec![decision_secs("card", 3.0)]);
        plan.suggested_transitions = vec!["fade".to_string(), "wipe".to_string()];
        let schedule = Schedule::build(&input, &plan, &SceneRegistry::builtin()).unwrap();
        assert_eq!(schedule.segments[0].transition_hint.as_deref(), Some("fade"));
        assert_eq!(schedule.segments[1].transition_hint.as_deref(), Some("wipe"));
        assert_eq!(schedule.segments[2].transition_hint, None);
    }
}
