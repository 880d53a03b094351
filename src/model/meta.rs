use crate::{
    foundation::core::{Canvas, Fps},
    foundation::error::{BlockreelError, BlockreelResult},
    model::block::ContentBlock,
};

/// Fixed aspect-ratio presets; each maps to fixed pixel dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Wide16x9,
    #[serde(rename = "9:16")]
    Tall9x16,
    #[serde(rename = "1:1")]
    Square1x1,
    #[serde(rename = "4:5")]
    Portrait4x5,
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::Tall9x16
    }
}

impl AspectRatio {
    pub fn canvas(self) -> Canvas {
        let (width, height) = match self {
            Self::Wide16x9 => (1920, 1080),
            Self::Tall9x16 => (1080, 1920),
            Self::Square1x1 => (1080, 1080),
            Self::Portrait4x5 => (1080, 1350),
        };
        Canvas { width, height }
    }
}

fn default_section_secs() -> f64 {
    2.0
}

/// Intro/outro title card. Omitting the section from [`VideoMeta`] omits its
/// segment entirely.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SectionCard {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default = "default_section_secs")]
    pub duration_secs: f64,
}

/// Global video settings, immutable for one compositor run.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VideoMeta {
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub fps: Fps,
    pub theme: String,
    /// Path to a font file used for text rasterization. Optional: the
    /// display-list stage never needs it, only pixel backends do.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<SectionCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outro: Option<SectionCard>,
}

/// The declarative input: global settings plus ordered content blocks.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VideoInput {
    pub meta: VideoMeta,
    pub blocks: Vec<ContentBlock>,
}

impl SectionCard {
    fn validate(&self, which: &str) -> BlockreelResult<()> {
        if self.title.trim().is_empty() {
            return Err(BlockreelError::validation(format!(
                "{which}: field 'title' must be non-empty"
            )));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(BlockreelError::validation(format!(
                "{which}: field 'duration_secs' must be finite and > 0"
            )));
        }
        Ok(())
    }
}

impl VideoInput {
    pub fn validate(&self) -> BlockreelResult<()> {
        if self.meta.fps.0 == 0 {
            return Err(BlockreelError::validation("meta: fps must be > 0"));
        }
        if self.meta.theme.trim().is_empty() {
            return Err(BlockreelError::validation("meta: theme must be non-empty"));
        }
        if let Some(intro) = &self.meta.intro {
            intro.validate("meta.intro")?;
        }
        if let Some(outro) = &self.meta.outro {
            outro.validate("meta.outro")?;
        }
        if self.blocks.is_empty() {
            return Err(BlockreelError::validation(
                "input must contain at least one content block",
            ));
        }
        for (index, block) in self.blocks.iter().enumerate() {
            block.validate(index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::block::{StatBlock, TextBlock};

    fn basic_input() -> VideoInput {
        VideoInput {
            meta: VideoMeta {
                aspect_ratio: AspectRatio::Tall9x16,
                fps: Fps(30),
                theme: "midnight".to_string(),
                font_source: None,
                intro: Some(SectionCard {
                    title: "5 facts".to_string(),
                    subtitle: None,
                    duration_secs: 2.0,
                }),
                outro: Some(SectionCard {
                    title: "follow for more".to_string(),
                    subtitle: None,
                    duration_secs: 2.0,
                }),
            },
            blocks: vec![ContentBlock::Stat(StatBlock {
                heading: "Users".to_string(),
                value: "10k".to_string(),
                trend_pct: None,
                customization: None,
            })],
        }
    }

    #[test]
    fn aspect_ratio_pixel_mapping_is_fixed() {
        assert_eq!(AspectRatio::Wide16x9.canvas(), Canvas { width: 1920, height: 1080 });
        assert_eq!(AspectRatio::Tall9x16.canvas(), Canvas { width: 1080, height: 1920 });
        assert_eq!(AspectRatio::Square1x1.canvas(), Canvas { width: 1080, height: 1080 });
        assert_eq!(AspectRatio::Portrait4x5.canvas(), Canvas { width: 1080, height: 1350 });
    }

    #[test]
    fn aspect_ratio_serde_uses_ratio_strings() {
        let meta: VideoMeta =
            serde_json::from_str(r#"{ "aspect_ratio": "9:16", "theme": "midnight" }"#).unwrap();
        assert_eq!(meta.aspect_ratio, AspectRatio::Tall9x16);
        assert_eq!(meta.fps, Fps(30));
    }

    #[test]
    fn section_duration_defaults_to_two_seconds() {
        let card: SectionCard = serde_json::from_str(r#"{ "title": "hi" }"#).unwrap();
        assert_eq!(card.duration_secs, 2.0);
    }

    #[test]
    fn validate_accepts_basic_input() {
        basic_input().validate().unwrap();
    }

    #[test]
    fn validate_rejects_empty_blocks() {
        let mut input = basic_input();
        input.blocks.clear();
        assert!(input.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_block_body() {
        let mut input = basic_input();
        input.blocks.push(ContentBlock::Text(TextBlock {
            body: "   ".to_string(),
            customization: None,
        }));
        let err = input.validate().unwrap_err().to_string();
        assert!(err.contains("block 1"));
    }
}
