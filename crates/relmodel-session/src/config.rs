//! Context options and the frozen services built from them.

use std::sync::Arc;

use relmodel_core::{AccessorRegistry, ConfigErrorKind, Error, Model, Result, ValueGenerator, ValueType};

use crate::state_manager::StateManager;
use crate::value_generation::ValueGeneratorCache;

/// Options for building a [`ContextConfiguration`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use relmodel_core::Model;
/// use relmodel_session::{ContextConfiguration, ContextOptions};
///
/// let configuration = ContextConfiguration::new(
///     ContextOptions::new()
///         .use_model(Arc::new(Model::new()))
///         .sensitive_data_logging(true),
/// )
/// .unwrap();
/// assert!(configuration.sensitive_data_logging());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    model: Option<Arc<Model>>,
    accessors: Option<Arc<AccessorRegistry>>,
    value_generators: Vec<(ValueType, Arc<dyn ValueGenerator>)>,
    sensitive_data_logging: bool,
}

impl ContextOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The entity model. Required.
    #[must_use]
    pub fn use_model(mut self, model: Arc<Model>) -> Self {
        self.model = Some(model);
        self
    }

    /// Accessors for native entity types. Defaults to an empty registry.
    #[must_use]
    pub fn accessors(mut self, accessors: Arc<AccessorRegistry>) -> Self {
        self.accessors = Some(accessors);
        self
    }

    /// Use `generator` for every generated property of `value_type`.
    #[must_use]
    pub fn use_value_generator(
        mut self,
        value_type: ValueType,
        generator: Arc<dyn ValueGenerator>,
    ) -> Self {
        self.value_generators.push((value_type, generator));
        self
    }

    /// Include property and parameter values in log events.
    #[must_use]
    pub fn sensitive_data_logging(mut self, enabled: bool) -> Self {
        self.sensitive_data_logging = enabled;
        self
    }
}

/// Services shared by every state entry of one context.
#[derive(Debug)]
pub struct ContextConfiguration {
    model: Arc<Model>,
    accessors: Arc<AccessorRegistry>,
    value_generators: ValueGeneratorCache,
    state_manager: StateManager,
    sensitive_data_logging: bool,
}

impl ContextConfiguration {
    /// Validate `options` and build the shared services.
    pub fn new(options: ContextOptions) -> Result<Arc<Self>> {
        let model = options.model.ok_or_else(|| {
            Error::config(
                ConfigErrorKind::MissingService,
                "context options do not name a model",
            )
        })?;
        tracing::debug!(
            entity_types = model.entity_types().len(),
            value_generator_overrides = options.value_generators.len(),
            sensitive_data_logging = options.sensitive_data_logging,
            "Built context configuration"
        );
        Ok(Arc::new(Self {
            model,
            accessors: options.accessors.unwrap_or_default(),
            value_generators: ValueGeneratorCache::new(options.value_generators),
            state_manager: StateManager::new(),
            sensitive_data_logging: options.sensitive_data_logging,
        }))
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn accessors(&self) -> &AccessorRegistry {
        &self.accessors
    }

    pub fn value_generators(&self) -> &ValueGeneratorCache {
        &self.value_generators
    }

    pub fn state_manager(&self) -> &StateManager {
        &self.state_manager
    }

    pub fn sensitive_data_logging(&self) -> bool {
        self.sensitive_data_logging
    }
}
