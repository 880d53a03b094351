use crate::foundation::error::{BlockreelError, BlockreelResult};

/// A single typed content block. The set of kinds is closed: plans pick a
/// renderer per block, but the block vocabulary itself is fixed.
///
/// Blocks are ordered; their order is video playback order.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentBlock {
    Stat(StatBlock),
    Text(TextBlock),
    Quote(QuoteBlock),
    List(ListBlock),
    Timeline(TimelineBlock),
    Callout(CalloutBlock),
    IconList(IconListBlock),
    LineChart(LineChartBlock),
    PieChart(PieChartBlock),
    Code(CodeBlock),
    Testimonial(TestimonialBlock),
    WhatsappChat(WhatsappChatBlock),
    MotivationalImage(MotivationalImageBlock),
    Counter(CounterBlock),
    ProgressBar(ProgressBarBlock),
    QrCode(QrCodeBlock),
    Video(VideoBlock),
    AvatarGrid(AvatarGridBlock),
    SocialStats(SocialStatsBlock),
    Cta(CtaBlock),
    GradientText(GradientTextBlock),
    AnimatedBg(AnimatedBgBlock),
    Countdown(CountdownBlock),
    #[serde(rename = "tower-3d")]
    Tower3d(Tower3dBlock),
}

/// Shared per-block overrides merged into the render context. Modeled as a
/// separate optional sub-structure rather than inherited state.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Customization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_rgba8: Option<[u8; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_rgba8: Option<[u8; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_rgba8: Option<[u8; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    Start,
    Center,
    End,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StatBlock {
    pub heading: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextBlock {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct QuoteBlock {
    pub quote: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ListBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Milestone {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TimelineBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub milestones: Vec<Milestone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CalloutBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct IconItem {
    pub icon: String,
    pub label: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct IconListBlock {
    pub items: Vec<IconItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LineChartBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub points: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PieChartBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub slices: Vec<PieSlice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CodeBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TestimonialBlock {
    pub quote: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub outgoing: bool,
    pub text: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct WhatsappChatBlock {
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MotivationalImageBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CounterBlock {
    pub label: String,
    pub from: f64,
    pub to: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProgressBarBlock {
    pub label: String,
    /// Target fill fraction in [0, 1].
    pub fraction: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct QrCodeBlock {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VideoBlock {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AvatarGridBlock {
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SocialStatsBlock {
    pub platform: String,
    pub followers: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CtaBlock {
    pub heading: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GradientTextBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AnimatedBgBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CountdownBlock {
    pub from: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TowerEntry {
    pub label: String,
    pub score: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Tower3dBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub entries: Vec<TowerEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

impl ContentBlock {
    /// Stable kind tag, identical to the serde `type` discriminant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stat(_) => "stat",
            Self::Text(_) => "text",
            Self::Quote(_) => "quote",
            Self::List(_) => "list",
            Self::Timeline(_) => "timeline",
            Self::Callout(_) => "callout",
            Self::IconList(_) => "icon-list",
            Self::LineChart(_) => "line-chart",
            Self::PieChart(_) => "pie-chart",
            Self::Code(_) => "code",
            Self::Testimonial(_) => "testimonial",
            Self::WhatsappChat(_) => "whatsapp-chat",
            Self::MotivationalImage(_) => "motivational-image",
            Self::Counter(_) => "counter",
            Self::ProgressBar(_) => "progress-bar",
            Self::QrCode(_) => "qr-code",
            Self::Video(_) => "video",
            Self::AvatarGrid(_) => "avatar-grid",
            Self::SocialStats(_) => "social-stats",
            Self::Cta(_) => "cta",
            Self::GradientText(_) => "gradient-text",
            Self::AnimatedBg(_) => "animated-bg",
            Self::Countdown(_) => "countdown",
            Self::Tower3d(_) => "tower-3d",
        }
    }

    /// Default renderer family for this kind. Plans may override this with
    /// any registered component id; this is the mapping planners start from.
    pub fn component_id(&self) -> &'static str {
        match self {
            Self::Stat(_) | Self::Counter(_) | Self::ProgressBar(_) | Self::SocialStats(_) => {
                "card"
            }
            Self::Text(_)
            | Self::GradientText(_)
            | Self::Quote(_)
            | Self::Testimonial(_)
            | Self::Callout(_)
            | Self::Cta(_)
            | Self::MotivationalImage(_) => "headline",
            Self::List(_) | Self::IconList(_) | Self::Timeline(_) | Self::AvatarGrid(_) => {
                "roster"
            }
            Self::LineChart(_) | Self::PieChart(_) => "chart",
            Self::WhatsappChat(_) => "chat",
            Self::Code(_) => "code",
            Self::Video(_) | Self::QrCode(_) | Self::AnimatedBg(_) | Self::Countdown(_) => "media",
            Self::Tower3d(_) => "tower",
        }
    }

    pub fn customization(&self) -> Option<&Customization> {
        match self {
            Self::Stat(b) => b.customization.as_ref(),
            Self::Text(b) => b.customization.as_ref(),
            Self::Quote(b) => b.customization.as_ref(),
            Self::List(b) => b.customization.as_ref(),
            Self::Timeline(b) => b.customization.as_ref(),
            Self::Callout(b) => b.customization.as_ref(),
            Self::IconList(b) => b.customization.as_ref(),
            Self::LineChart(b) => b.customization.as_ref(),
            Self::PieChart(b) => b.customization.as_ref(),
            Self::Code(b) => b.customization.as_ref(),
            Self::Testimonial(b) => b.customization.as_ref(),
            Self::WhatsappChat(b) => b.customization.as_ref(),
            Self::MotivationalImage(b) => b.customization.as_ref(),
            Self::Counter(b) => b.customization.as_ref(),
            Self::ProgressBar(b) => b.customization.as_ref(),
            Self::QrCode(b) => b.customization.as_ref(),
            Self::Video(b) => b.customization.as_ref(),
            Self::AvatarGrid(b) => b.customization.as_ref(),
            Self::SocialStats(b) => b.customization.as_ref(),
            Self::Cta(b) => b.customization.as_ref(),
            Self::GradientText(b) => b.customization.as_ref(),
            Self::AnimatedBg(b) => b.customization.as_ref(),
            Self::Countdown(b) => b.customization.as_ref(),
            Self::Tower3d(b) => b.customization.as_ref(),
        }
    }

    /// Per-block shape validation. `index` is the block's position in the
    /// input; it is threaded into every message so fatal errors point at one
    /// actionable place.
    pub fn validate(&self, index: usize) -> BlockreelResult<()> {
        let fail = |field: &str, why: &str| {
            Err(BlockreelError::validation(format!(
                "block {index} ({kind}): field '{field}' {why}",
                kind = self.kind()
            )))
        };

        match self {
            Self::Stat(b) => {
                if b.heading.trim().is_empty() {
                    return fail("heading", "must be non-empty");
                }
                if b.value.trim().is_empty() {
                    return fail("value", "must be non-empty");
                }
                if let Some(t) = b.trend_pct
                    && !t.is_finite()
                {
                    return fail("trend_pct", "must be finite");
                }
            }
            Self::Text(b) => {
                if b.body.trim().is_empty() {
                    return fail("body", "must be non-empty");
                }
            }
            Self::Quote(b) => {
                if b.quote.trim().is_empty() {
                    return fail("quote", "must be non-empty");
                }
            }
            Self::List(b) => {
                if b.items.is_empty() {
                    return fail("items", "must contain at least one entry");
                }
            }
            Self::Timeline(b) => {
                if b.milestones.is_empty() {
                    return fail("milestones", "must contain at least one entry");
                }
            }
            Self::Callout(b) => {
                if b.text.trim().is_empty() {
                    return fail("text", "must be non-empty");
                }
            }
            Self::IconList(b) => {
                if b.items.is_empty() {
                    return fail("items", "must contain at least one entry");
                }
            }
            Self::LineChart(b) => {
                if b.points.len() < 2 {
                    return fail("points", "must contain at least two points");
                }
                if b.points.iter().any(|p| !p.is_finite()) {
                    return fail("points", "must all be finite");
                }
            }
            Self::PieChart(b) => {
                if b.slices.is_empty() {
                    return fail("slices", "must contain at least one slice");
                }
                if b.slices.iter().any(|s| !s.value.is_finite() || s.value < 0.0) {
                    return fail("slices", "values must be finite and >= 0");
                }
                if b.slices.iter().map(|s| s.value).sum::<f64>() <= 0.0 {
                    return fail("slices", "values must sum to > 0");
                }
            }
            Self::Code(b) => {
                if b.source.is_empty() {
                    return fail("source", "must be non-empty");
                }
            }
            Self::Testimonial(b) => {
                if b.quote.trim().is_empty() {
                    return fail("quote", "must be non-empty");
                }
                if b.author.trim().is_empty() {
                    return fail("author", "must be non-empty");
                }
            }
            Self::WhatsappChat(b) => {
                if b.messages.is_empty() {
                    return fail("messages", "must contain at least one message");
                }
            }
            Self::MotivationalImage(b) => {
                if b.text.trim().is_empty() {
                    return fail("text", "must be non-empty");
                }
            }
            Self::Counter(b) => {
                if !b.from.is_finite() || !b.to.is_finite() {
                    return fail("from/to", "must be finite");
                }
            }
            Self::ProgressBar(b) => {
                if !b.fraction.is_finite() || !(0.0..=1.0).contains(&b.fraction) {
                    return fail("fraction", "must be within [0, 1]");
                }
            }
            Self::QrCode(b) => {
                if b.url.trim().is_empty() {
                    return fail("url", "must be non-empty");
                }
            }
            Self::Video(b) => {
                if b.source.trim().is_empty() {
                    return fail("source", "must be non-empty");
                }
            }
            Self::AvatarGrid(b) => {
                if b.names.is_empty() {
                    return fail("names", "must contain at least one name");
                }
                if b.columns == Some(0) {
                    return fail("columns", "must be > 0 when set");
                }
            }
            Self::SocialStats(b) => {
                if b.platform.trim().is_empty() {
                    return fail("platform", "must be non-empty");
                }
            }
            Self::Cta(b) => {
                if b.heading.trim().is_empty() {
                    return fail("heading", "must be non-empty");
                }
                if b.action.trim().is_empty() {
                    return fail("action", "must be non-empty");
                }
            }
            Self::GradientText(b) => {
                if b.text.trim().is_empty() {
                    return fail("text", "must be non-empty");
                }
            }
            Self::AnimatedBg(_) => {}
            Self::Countdown(b) => {
                if b.from == 0 {
                    return fail("from", "must be > 0");
                }
            }
            Self::Tower3d(b) => {
                if b.entries.is_empty() {
                    return fail("entries", "must contain at least one entry");
                }
                if b.entries.iter().any(|e| !e.score.is_finite()) {
                    return fail("entries", "scores must be finite");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_tag_matches_kind() {
        let block = ContentBlock::Stat(StatBlock {
            heading: "Revenue".to_string(),
            value: "$1.2M".to_string(),
            trend_pct: Some(12.5),
            customization: None,
        });
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "stat");

        let tower = ContentBlock::Tower3d(Tower3dBlock {
            title: None,
            entries: vec![TowerEntry {
                label: "rust".to_string(),
                score: 9.7,
            }],
            customization: None,
        });
        let json = serde_json::to_value(&tower).unwrap();
        assert_eq!(json["type"], "tower-3d");
        assert_eq!(tower.kind(), "tower-3d");
    }

    #[test]
    fn kebab_case_roundtrip() {
        let s = r#"{ "type": "whatsapp-chat", "messages": [{ "outgoing": true, "text": "hey" }] }"#;
        let block: ContentBlock = serde_json::from_str(s).unwrap();
        assert_eq!(block.kind(), "whatsapp-chat");
        assert_eq!(block.component_id(), "chat");
        block.validate(0).unwrap();
    }

    #[test]
    fn validate_names_block_index_and_field() {
        let block = ContentBlock::ProgressBar(ProgressBarBlock {
            label: "launch".to_string(),
            fraction: 1.5,
            customization: None,
        });
        let err = block.validate(7).unwrap_err().to_string();
        assert!(err.contains("block 7"));
        assert!(err.contains("fraction"));
    }

    #[test]
    fn every_kind_has_a_component_family() {
        let s = r#"{ "type": "pie-chart", "slices": [{ "label": "a", "value": 1.0 }] }"#;
        let block: ContentBlock = serde_json::from_str(s).unwrap();
        assert_eq!(block.component_id(), "chart");
    }
}
