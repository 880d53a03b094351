use crate::foundation::error::{BlockreelError, BlockreelResult};

/// Named amplitude/overshoot preset applied uniformly by the phase engine.
/// Profiles scale motion amplitude only; they never change phase durations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionProfile {
    Subtle,
    Dynamic,
    Energetic,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self::Dynamic
    }
}

/// Three-part temporal envelope in seconds. `enter + hold + exit` should
/// approximate the decision's duration but is not trusted: frame math derives
/// hold and anchors exit to the segment's true end.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationWindow {
    pub enter: f64,
    pub hold: f64,
    pub exit: f64,
}

/// One renderer decision per content block (same order, 1:1 by index).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Decision {
    pub component_id: String,
    #[serde(default)]
    pub motion_profile: MotionProfile,
    pub duration_secs: f64,
    pub animation: AnimationWindow,
}

/// The plan produced by the external decision router. Treated as untrusted
/// input: everything here is re-validated before a schedule is built.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VideoPlan {
    pub decisions: Vec<Decision>,
    /// Advisory; the schedule recomputes total duration from segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_secs: Option<f64>,
    /// Advisory per-boundary transition hints (e.g. "fade"). Never fatal.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_transitions: Vec<String>,
}

impl Decision {
    /// Shape validation for a single decision. `index` is carried into every
    /// error so a bad plan points at one decision and one field.
    pub fn validate(&self, index: usize) -> BlockreelResult<()> {
        if self.component_id.trim().is_empty() {
            return Err(BlockreelError::plan(index, "component_id must be non-empty"));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(BlockreelError::plan(
                index,
                format!(
                    "duration_secs must be finite and > 0 (got {})",
                    self.duration_secs
                ),
            ));
        }
        for (field, value) in [
            ("animation.enter", self.animation.enter),
            ("animation.hold", self.animation.hold),
            ("animation.exit", self.animation.exit),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(BlockreelError::plan(
                    index,
                    format!("{field} must be finite and >= 0 (got {value})"),
                ));
            }
        }
        Ok(())
    }
}

impl VideoPlan {
    pub fn validate(&self) -> BlockreelResult<()> {
        if self.decisions.is_empty() {
            return Err(BlockreelError::validation(
                "plan must contain at least one decision",
            ));
        }
        for (index, decision) in self.decisions.iter().enumerate() {
            decision.validate(index)?;
        }
        if let Some(total) = self.total_duration_secs
            && (!total.is_finite() || total < 0.0)
        {
            return Err(BlockreelError::validation(
                "total_duration_secs must be finite and >= 0 when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(duration_secs: f64) -> Decision {
        Decision {
            component_id: "card".to_string(),
            motion_profile: MotionProfile::Dynamic,
            duration_secs,
            animation: AnimationWindow {
                enter: 0.5,
                hold: 2.0,
                exit: 0.5,
            },
        }
    }

    #[test]
    fn valid_plan_passes() {
        let plan = VideoPlan {
            decisions: vec![decision(3.0)],
            total_duration_secs: Some(7.0),
            suggested_transitions: vec!["fade".to_string()],
        };
        plan.validate().unwrap();
    }

    #[test]
    fn non_positive_duration_is_rejected_with_index() {
        let plan = VideoPlan {
            decisions: vec![decision(3.0), decision(0.0)],
            total_duration_secs: None,
            suggested_transitions: vec![],
        };
        let err = plan.validate().unwrap_err().to_string();
        assert!(err.contains("decision 1"));
        assert!(err.contains("duration_secs"));
    }

    #[test]
    fn negative_animation_field_is_rejected() {
        let mut d = decision(3.0);
        d.animation.exit = -0.1;
        let err = d.validate(0).unwrap_err().to_string();
        assert!(err.contains("animation.exit"));
    }

    #[test]
    fn motion_profile_serde_is_lowercase() {
        let d: Decision = serde_json::from_str(
            r#"{
                "component_id": "card",
                "motion_profile": "energetic",
                "duration_secs": 3.0,
                "animation": { "enter": 0.5, "hold": 2.0, "exit": 0.5 }
            }"#,
        )
        .unwrap();
        assert_eq!(d.motion_profile, MotionProfile::Energetic);
    }

    #[test]
    fn motion_profile_defaults_to_dynamic() {
        let d: Decision = serde_json::from_str(
            r#"{
                "component_id": "card",
                "duration_secs": 3.0,
                "animation": { "enter": 0.5, "hold": 2.0, "exit": 0.5 }
            }"#,
        )
        .unwrap();
        assert_eq!(d.motion_profile, MotionProfile::Dynamic);
    }
}
