pub type BlockreelResult<T> = Result<T, BlockreelError>;

#[derive(thiserror::Error, Debug)]
pub enum BlockreelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("cardinality mismatch: {blocks} content block(s) but {decisions} plan decision(s)")]
    Cardinality { blocks: usize, decisions: usize },

    #[error("plan error at decision {decision}: {message}")]
    Plan { decision: usize, message: String },

    #[error("unknown component '{component}' at decision {decision}")]
    UnknownComponent { decision: usize, component: String },

    #[error("render error: {0}")]
    Render(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlockreelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn plan(decision: usize, msg: impl Into<String>) -> Self {
        Self::Plan {
            decision,
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            BlockreelError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            BlockreelError::plan(3, "bad duration")
                .to_string()
                .contains("decision 3")
        );
        assert!(
            BlockreelError::render("x")
                .to_string()
                .contains("render error:")
        );
    }

    #[test]
    fn cardinality_names_both_counts() {
        let err = BlockreelError::Cardinality {
            blocks: 1,
            decisions: 2,
        };
        let s = err.to_string();
        assert!(s.contains("1 content block"));
        assert!(s.contains("2 plan decision"));
    }

    #[test]
    fn unknown_component_names_decision_index() {
        let err = BlockreelError::UnknownComponent {
            decision: 4,
            component: "nonexistent-scene".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("nonexistent-scene"));
        assert!(s.contains("decision 4"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = BlockreelError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
