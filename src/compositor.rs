use tracing::instrument;

use crate::{
    animation::phase::phase_progress,
    foundation::{
        core::FrameIndex,
        error::{BlockreelError, BlockreelResult},
    },
    model::{
        block::{ContentBlock, CtaBlock},
        meta::{SectionCard, VideoInput},
        plan::VideoPlan,
    },
    scene::{blocks, context::RenderCtx, frame::SceneFrame, registry::SceneRegistry},
    schedule::{Schedule, SegmentKind},
};

/// Frame-accurate assembly of one video. Construction validates the whole
/// contract and builds the schedule; after that, `render_frame` is a pure
/// read and safe to call from any thread in any order.
pub struct Compositor {
    input: VideoInput,
    plan: VideoPlan,
    registry: SceneRegistry,
    schedule: Schedule,
    intro_card: Option<ContentBlock>,
    outro_card: Option<ContentBlock>,
}

impl Compositor {
    pub fn new(
        input: VideoInput,
        plan: VideoPlan,
        registry: SceneRegistry,
    ) -> BlockreelResult<Self> {
        let schedule = Schedule::build(&input, &plan, &registry)?;
        let intro_card = input.meta.intro.as_ref().map(section_block);
        let outro_card = input.meta.outro.as_ref().map(section_block);
        Ok(Self {
            input,
            plan,
            registry,
            schedule,
            intro_card,
            outro_card,
        })
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn input(&self) -> &VideoInput {
        &self.input
    }

    pub fn total_frames(&self) -> u64 {
        self.schedule.total_frames
    }

    /// Resolve one absolute frame to a display list.
    #[instrument(skip(self), fields(frame = frame.0))]
    pub fn render_frame(&self, frame: FrameIndex) -> BlockreelResult<SceneFrame> {
        let Some((segment, local)) = self.schedule.segment_at(frame) else {
            return Err(BlockreelError::validation(format!(
                "frame {} is outside the timeline (0..{})",
                frame.0, self.schedule.total_frames
            )));
        };

        let phase = phase_progress(local, segment.windows, segment.profile);
        let mut out = SceneFrame::new(self.schedule.canvas);

        let (block, renderer) = match segment.kind {
            SegmentKind::Intro => {
                // Section cards always take the headline treatment; schedule
                // construction already checked the family is registered.
                let block = self.intro_card.as_ref().ok_or_else(missing_section)?;
                (block, self.section_renderer()?)
            }
            SegmentKind::Outro => {
                let block = self.outro_card.as_ref().ok_or_else(missing_section)?;
                (block, self.section_renderer()?)
            }
            SegmentKind::Content { block, decision } => {
                let component = &self.plan.decisions[decision].component_id;
                (
                    &self.input.blocks[block],
                    self.registry.resolve(component, decision)?,
                )
            }
        };

        let theme = self.schedule.theme.customized(block.customization());
        blocks::push_backdrop(&mut out, theme.background_premul());

        let ctx = RenderCtx {
            block,
            theme,
            profile: segment.profile,
            phase,
            canvas: self.schedule.canvas,
            local_frame: local,
            fps: self.schedule.fps,
        };
        renderer.render(&ctx, &mut out)?;
        Ok(out)
    }

    fn section_renderer(&self) -> BlockreelResult<&dyn crate::scene::registry::SceneRenderer> {
        self.registry
            .get(crate::schedule::SECTION_RENDERER)
            .ok_or_else(|| {
                BlockreelError::render(format!(
                    "section renderer '{}' disappeared from the registry",
                    crate::schedule::SECTION_RENDERER
                ))
            })
    }
}

fn missing_section() -> BlockreelError {
    // Unreachable when the schedule and meta come from the same input.
    BlockreelError::render("scheduled section has no card in the input")
}

/// Section cards render through the headline family; the card maps onto a
/// heading/action pair.
fn section_block(card: &SectionCard) -> ContentBlock {
    ContentBlock::Cta(CtaBlock {
        heading: card.title.clone(),
        action: card.subtitle.clone().unwrap_or_default(),
        customization: None,
    })
}
