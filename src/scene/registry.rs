use std::collections::BTreeMap;

use crate::{
    foundation::error::{BlockreelError, BlockreelResult},
    scene::{context::RenderCtx, frame::SceneFrame},
};

/// A renderer family. One implementation covers every block kind mapped to
/// its component id; the renderer dispatches on the concrete block inside.
pub trait SceneRenderer: Send + Sync {
    /// Component id this renderer is registered under.
    fn component_id(&self) -> &'static str;

    /// Emit draw ops for one frame. Must be pure in `ctx`: no renderer state,
    /// no frame-order dependence.
    fn render(&self, ctx: &RenderCtx<'_>, frame: &mut SceneFrame) -> BlockreelResult<()>;
}

/// Component id to renderer lookup. A `BTreeMap` keeps iteration order
/// stable, which keeps diagnostics listing registered ids deterministic.
pub struct SceneRegistry {
    renderers: BTreeMap<String, Box<dyn SceneRenderer>>,
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SceneRegistry {
    pub fn empty() -> Self {
        Self {
            renderers: BTreeMap::new(),
        }
    }

    /// Registry with every built-in renderer family installed.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();
        for renderer in crate::scene::blocks::builtin_renderers() {
            let registered = reg.register(renderer);
            debug_assert!(registered.is_ok(), "builtin component ids must be distinct");
        }
        reg
    }

    /// Install a renderer. Ids are unique; a second registration under the
    /// same id is rejected rather than silently shadowed.
    pub fn register(&mut self, renderer: Box<dyn SceneRenderer>) -> BlockreelResult<()> {
        let id = renderer.component_id().to_string();
        if self.renderers.contains_key(&id) {
            return Err(BlockreelError::validation(format!(
                "component id '{id}' is already registered"
            )));
        }
        self.renderers.insert(id, renderer);
        Ok(())
    }

    pub fn contains(&self, component_id: &str) -> bool {
        self.renderers.contains_key(component_id)
    }

    pub fn get(&self, component_id: &str) -> Option<&dyn SceneRenderer> {
        self.renderers.get(component_id).map(|r| r.as_ref())
    }

    /// Resolve for a plan decision, failing with the decision index so the
    /// error points at the offending plan entry.
    pub fn resolve(&self, component_id: &str, decision: usize) -> BlockreelResult<&dyn SceneRenderer> {
        self.get(component_id)
            .ok_or_else(|| BlockreelError::UnknownComponent {
                decision,
                component: component_id.to_string(),
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_families_are_registered() {
        let reg = SceneRegistry::builtin();
        for id in ["card", "headline", "roster", "chart", "chat", "code", "media", "tower"] {
            assert!(reg.contains(id), "missing builtin renderer '{id}'");
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = SceneRegistry::builtin();
        let dup = crate::scene::blocks::builtin_renderers()
            .into_iter()
            .next()
            .unwrap();
        assert!(reg.register(dup).is_err());
    }

    #[test]
    fn resolve_unknown_reports_decision_index() {
        let reg = SceneRegistry::builtin();
        let err = reg.resolve("hologram", 3).err().unwrap();
        match err {
            BlockreelError::UnknownComponent { decision, component } => {
                assert_eq!(decision, 3);
                assert_eq!(component, "hologram");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
