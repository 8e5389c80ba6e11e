//! Stage registry for managing stage implementations.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::stage::{names, Stage};

/// A registry of stage implementations keyed by name.
#[derive(Default)]
pub struct StageRegistry {
    stages: HashMap<String, Arc<dyn Stage>>,
}

impl StageRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            stages: HashMap::new(),
        }
    }

    /// Register a stage under its `name()`, replacing any previous one.
    pub fn register(&mut self, stage: Arc<dyn Stage>) {
        let name = stage.name().to_string();
        debug!("Registering stage: {}", name);
        self.stages.insert(name, stage);
    }

    /// Builder-style registration.
    pub fn with_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.register(stage);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Stage>> {
        self.stages.get(name).cloned()
    }

    /// Get a stage by name, returning an error if not found.
    pub fn get_required(&self, name: &str) -> CoreResult<Arc<dyn Stage>> {
        self.get(name)
            .ok_or_else(|| CoreError::StageNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stages.contains_key(name)
    }

    /// Check that every stage a full run needs is registered.
    pub fn validate(&self) -> CoreResult<()> {
        for name in names::REQUIRED {
            if !self.contains(name) {
                return Err(CoreError::StageNotFound(name.to_string()));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.stages.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PipelineState, StateDelta, Status};
    use async_trait::async_trait;

    struct TestStage {
        name: String,
    }

    #[async_trait]
    impl Stage for TestStage {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "Test stage"
        }

        async fn execute(&self, _state: &PipelineState) -> CoreResult<StateDelta> {
            Ok(StateDelta::status(Status::Working))
        }
    }

    fn stage(name: &str) -> Arc<dyn Stage> {
        Arc::new(TestStage {
            name: name.to_string(),
        })
    }

    #[test]
    fn test_registry_register() {
        let mut registry = StageRegistry::new();
        assert!(registry.is_empty());

        registry.register(stage("intake"));

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("intake"));
    }

    #[test]
    fn test_registry_get_required() {
        let registry = StageRegistry::new().with_stage(stage("gate"));

        assert_eq!(registry.get_required("gate").unwrap().name(), "gate");
        assert!(matches!(
            registry.get_required("publish"),
            Err(CoreError::StageNotFound(name)) if name == "publish"
        ));
    }

    #[test]
    fn test_registry_validate() {
        let mut registry = StageRegistry::new()
            .with_stage(stage(names::INTAKE))
            .with_stage(stage(names::CONTRACT))
            .with_stage(stage(names::IMPLEMENT));

        assert!(matches!(
            registry.validate(),
            Err(CoreError::StageNotFound(name)) if name == names::GATE
        ));

        registry.register(stage(names::GATE));
        assert!(registry.validate().is_ok());
    }
}
