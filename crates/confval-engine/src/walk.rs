//! # Schema Walker
//!
//! [`ConfigValidator`] is the entry point: it owns a config source, a
//! registry handle, and the context data, and turns a [`Schema`] into a
//! [`ResultTree`] by handing every section to its section feature.
//!
//! ## Runs
//!
//! Each [`parse`](ConfigValidator::parse) call is an independent run with a
//! fresh [`Resolver`] and a snapshot of the context data. A section feature
//! that cannot be found, built, or run is recorded as
//! `Error parsing section S: <error>` and the walk continues with the next
//! section. Only a malformed dependency declaration aborts the run.

use std::sync::Arc;

use confval_core::{ConfigSource, ContextData, InterfaceError, ResultTree, SourceOperation};

use crate::error::{FeatureError, ParseError};
use crate::registry::{self, Registry};
use crate::resolve::Resolver;
use crate::schema::{Schema, DEFAULT_FEATURE_KEY};

/// Validates configurations read by one source against schemas.
#[derive(Debug)]
pub struct ConfigValidator {
    source: Box<dyn ConfigSource>,
    registry: Arc<Registry>,
    data: ContextData,
    feature_key: String,
}

impl ConfigValidator {
    /// Wrap `source`, resolving names through the [global](registry::global)
    /// registry.
    pub fn new<S: ConfigSource + 'static>(source: S) -> Result<Self, InterfaceError> {
        Self::with_registry(source, registry::global())
    }

    /// Wrap `source`, resolving names through `registry`.
    pub fn with_registry<S: ConfigSource + 'static>(
        source: S,
        registry: Arc<Registry>,
    ) -> Result<Self, InterfaceError> {
        if let Some(operation) = SourceOperation::REQUIRED
            .into_iter()
            .find(|operation| !source.supports(*operation))
        {
            return Err(InterfaceError { operation });
        }
        Ok(Self {
            source: Box::new(source),
            registry,
            data: ContextData::new(),
            feature_key: DEFAULT_FEATURE_KEY.to_string(),
        })
    }

    /// Section key naming the section feature in JSON/YAML schemas.
    pub fn with_feature_key(mut self, feature_key: impl Into<String>) -> Self {
        self.feature_key = feature_key.into();
        self
    }

    /// Replace the context data.
    pub fn with_data(mut self, data: ContextData) -> Self {
        self.data = data;
        self
    }

    /// Set one context entry for validators built by later runs.
    pub fn add_data(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.data.insert(key, value);
    }

    pub fn remove_data(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    pub fn data(&self) -> &ContextData {
        &self.data
    }

    pub fn feature_key(&self) -> &str {
        &self.feature_key
    }

    pub fn source(&self) -> &dyn ConfigSource {
        self.source.as_ref()
    }

    /// Mutable access to the source, e.g. to load more files between runs.
    pub fn source_mut(&mut self) -> &mut dyn ConfigSource {
        self.source.as_mut()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Run one resolution over `schema`.
    pub fn parse(&self, schema: &Schema) -> Result<ResultTree, ParseError> {
        tracing::debug!(sections = schema.len(), "resolving configuration");
        let mut resolver = Resolver::new(
            self.source.as_ref(),
            Arc::clone(&self.registry),
            self.data.clone(),
        );

        for (name, section) in schema.sections() {
            let feature = {
                let ctx = resolver.init_context();
                resolver
                    .registry()
                    .section_feature(section.feature())
                    .map_err(FeatureError::from)
                    .and_then(|def| {
                        def.build(section.params().clone(), &ctx)
                            .map_err(FeatureError::from)
                    })
            };
            let outcome =
                feature.and_then(|feature| feature.parse_section(&mut resolver, name, section));
            match outcome {
                Ok(()) => {}
                Err(FeatureError::Contract(err)) => return Err(err.into()),
                Err(err) => resolver.record_error(format!("Error parsing section {name}: {err}")),
            }
        }

        resolver.result().map_err(ParseError::from)
    }

    /// Normalize a JSON schema with this validator's feature key, then run.
    pub fn parse_json(&self, schema: &serde_json::Value) -> Result<ResultTree, ParseError> {
        let schema = Schema::from_json_with_key(schema, &self.feature_key)?;
        self.parse(&schema)
    }

    /// Normalize a YAML schema with this validator's feature key, then run.
    pub fn parse_yaml(&self, schema: &str) -> Result<ResultTree, ParseError> {
        let schema = Schema::from_yaml_with_key(schema, &self.feature_key)?;
        self.parse(&schema)
    }
}
