//! # Capability Registry
//!
//! Name → implementation tables for validators, section features, and
//! option features.
//!
//! ## Registration
//!
//! Implementations are registered explicitly: each builtin module exposes a
//! `register(&Registry)` function, and [`Registry::builtin`] calls them for
//! the enumerated builtin set. Plugins do the same against the registry
//! they are handed.
//!
//! A definition is identified by its Rust type. Registering the *same* type
//! under its name again is accepted and logged; registering a *different*
//! type under a taken name is a [`RegistryError::DuplicateDefinition`].
//!
//! ## Sharing
//!
//! [`global()`] returns the process-wide registry, built once on first use.
//! Tables sit behind `parking_lot::RwLock`, so lookups from concurrent runs
//! only take read locks. Tests and embedders that want isolation create
//! their own with [`Registry::new`] or [`Registry::builtin`].

use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, LazyLock};

use confval_core::{BoxError, InitializationError};
use parking_lot::RwLock;
use serde::Serialize;

use crate::error::RegistryError;
use crate::feature::{OptionFeature, SectionFeature};
use crate::validator::{InitContext, Params, Plugin, Validator};

// ─── Kinds ───────────────────────────────────────────────────────────

/// The three capability tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Validator,
    SectionFeature,
    OptionFeature,
}

impl CapabilityKind {
    /// All kinds, in table order.
    pub const ALL: [CapabilityKind; 3] = [
        CapabilityKind::Validator,
        CapabilityKind::SectionFeature,
        CapabilityKind::OptionFeature,
    ];

    /// Human-readable label used in messages.
    pub fn label(self) -> &'static str {
        match self {
            CapabilityKind::Validator => "validator",
            CapabilityKind::SectionFeature => "section feature",
            CapabilityKind::OptionFeature => "option feature",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The name was free.
    Added,
    /// The same implementation was already registered; nothing changed.
    Duplicate,
}

// ─── Definitions ─────────────────────────────────────────────────────

type BuildFn<T> = fn(Params, &InitContext<'_>) -> Result<Box<T>, BoxError>;

/// A registered implementation: its name, identity, and constructor.
pub struct CapabilityDef<T: ?Sized> {
    name: &'static str,
    type_id: TypeId,
    build: BuildFn<T>,
}

impl<T: ?Sized> Clone for CapabilityDef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for CapabilityDef<T> {}

impl<T: ?Sized> fmt::Debug for CapabilityDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDef")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized> CapabilityDef<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build an instance. Constructor failures carry the registered name.
    pub fn build(
        &self,
        params: Params,
        ctx: &InitContext<'_>,
    ) -> Result<Box<T>, InitializationError> {
        (self.build)(params, ctx).map_err(|cause| InitializationError::new(self.name, cause))
    }
}

pub type ValidatorDef = CapabilityDef<dyn Validator>;
pub type SectionFeatureDef = CapabilityDef<dyn SectionFeature>;
pub type OptionFeatureDef = CapabilityDef<dyn OptionFeature>;

fn build_validator<V: Validator + Plugin>(
    params: Params,
    ctx: &InitContext<'_>,
) -> Result<Box<dyn Validator>, BoxError> {
    Ok(Box::new(V::build(params, ctx)?))
}

fn build_section_feature<F: SectionFeature + Plugin>(
    params: Params,
    ctx: &InitContext<'_>,
) -> Result<Box<dyn SectionFeature>, BoxError> {
    Ok(Box::new(F::build(params, ctx)?))
}

fn build_option_feature<F: OptionFeature + Plugin>(
    params: Params,
    ctx: &InitContext<'_>,
) -> Result<Box<dyn OptionFeature>, BoxError> {
    Ok(Box::new(F::build(params, ctx)?))
}

impl CapabilityDef<dyn Validator> {
    pub fn of<V: Validator + Plugin>() -> Self {
        Self {
            name: V::NAME,
            type_id: TypeId::of::<V>(),
            build: build_validator::<V>,
        }
    }
}

impl CapabilityDef<dyn SectionFeature> {
    pub fn of<F: SectionFeature + Plugin>() -> Self {
        Self {
            name: F::NAME,
            type_id: TypeId::of::<F>(),
            build: build_section_feature::<F>,
        }
    }
}

impl CapabilityDef<dyn OptionFeature> {
    pub fn of<F: OptionFeature + Plugin>() -> Self {
        Self {
            name: F::NAME,
            type_id: TypeId::of::<F>(),
            build: build_option_feature::<F>,
        }
    }
}

/// A definition of any kind, as accepted by [`Registry::register`].
#[derive(Debug, Clone, Copy)]
pub enum Definition {
    Validator(ValidatorDef),
    SectionFeature(SectionFeatureDef),
    OptionFeature(OptionFeatureDef),
}

impl Definition {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Definition::Validator(_) => CapabilityKind::Validator,
            Definition::SectionFeature(_) => CapabilityKind::SectionFeature,
            Definition::OptionFeature(_) => CapabilityKind::OptionFeature,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Definition::Validator(def) => def.name,
            Definition::SectionFeature(def) => def.name,
            Definition::OptionFeature(def) => def.name,
        }
    }
}

impl From<ValidatorDef> for Definition {
    fn from(def: ValidatorDef) -> Self {
        Definition::Validator(def)
    }
}

impl From<SectionFeatureDef> for Definition {
    fn from(def: SectionFeatureDef) -> Self {
        Definition::SectionFeature(def)
    }
}

impl From<OptionFeatureDef> for Definition {
    fn from(def: OptionFeatureDef) -> Self {
        Definition::OptionFeature(def)
    }
}

// ─── Registry ────────────────────────────────────────────────────────

type Table<T> = RwLock<BTreeMap<&'static str, CapabilityDef<T>>>;

/// Thread-safe capability tables.
#[derive(Debug, Default)]
pub struct Registry {
    validators: Table<dyn Validator>,
    section_features: Table<dyn SectionFeature>,
    option_features: Table<dyn OptionFeature>,
}

static GLOBAL: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::builtin()));

/// The process-wide registry, holding the builtin capabilities plus
/// whatever has been registered on it since.
pub fn global() -> Arc<Registry> {
    Arc::clone(&GLOBAL)
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh registry holding the builtin validators and features.
    pub fn builtin() -> Self {
        let registry = Self::new();
        let outcome = crate::validators::register(&registry)
            .and_then(|()| crate::feature::register(&registry));
        if let Err(err) = outcome {
            tracing::error!(%err, "builtin capability set is inconsistent");
        }
        registry
    }

    /// Add a definition under its name.
    pub fn register(
        &self,
        definition: impl Into<Definition>,
    ) -> Result<Registration, RegistryError> {
        match definition.into() {
            Definition::Validator(def) => insert(&self.validators, CapabilityKind::Validator, def),
            Definition::SectionFeature(def) => {
                insert(&self.section_features, CapabilityKind::SectionFeature, def)
            }
            Definition::OptionFeature(def) => {
                insert(&self.option_features, CapabilityKind::OptionFeature, def)
            }
        }
    }

    /// Look up a definition of any kind.
    pub fn lookup(&self, kind: CapabilityKind, name: &str) -> Result<Definition, RegistryError> {
        match kind {
            CapabilityKind::Validator => self.validator(name).map(Definition::from),
            CapabilityKind::SectionFeature => self.section_feature(name).map(Definition::from),
            CapabilityKind::OptionFeature => self.option_feature(name).map(Definition::from),
        }
    }

    pub fn validator(&self, name: &str) -> Result<ValidatorDef, RegistryError> {
        get(&self.validators, CapabilityKind::Validator, name)
    }

    pub fn section_feature(&self, name: &str) -> Result<SectionFeatureDef, RegistryError> {
        get(&self.section_features, CapabilityKind::SectionFeature, name)
    }

    pub fn option_feature(&self, name: &str) -> Result<OptionFeatureDef, RegistryError> {
        get(&self.option_features, CapabilityKind::OptionFeature, name)
    }

    pub fn contains(&self, kind: CapabilityKind, name: &str) -> bool {
        self.lookup(kind, name).is_ok()
    }

    /// Registered names of one kind, sorted.
    pub fn list(&self, kind: CapabilityKind) -> BTreeSet<String> {
        fn names<T: ?Sized>(table: &Table<T>) -> BTreeSet<String> {
            table.read().keys().map(|name| name.to_string()).collect()
        }
        match kind {
            CapabilityKind::Validator => names(&self.validators),
            CapabilityKind::SectionFeature => names(&self.section_features),
            CapabilityKind::OptionFeature => names(&self.option_features),
        }
    }

    /// Registered names of every kind.
    pub fn list_all(&self) -> BTreeMap<CapabilityKind, BTreeSet<String>> {
        CapabilityKind::ALL
            .into_iter()
            .map(|kind| (kind, self.list(kind)))
            .collect()
    }
}

fn insert<T: ?Sized>(
    table: &Table<T>,
    kind: CapabilityKind,
    def: CapabilityDef<T>,
) -> Result<Registration, RegistryError> {
    let mut guard = table.write();
    match guard.get(def.name) {
        Some(existing) if existing.type_id == def.type_id => {
            tracing::warn!(
                %kind,
                name = def.name,
                "capability registered twice with the same implementation"
            );
            Ok(Registration::Duplicate)
        }
        Some(_) => Err(RegistryError::DuplicateDefinition {
            kind,
            name: def.name.to_string(),
        }),
        None => {
            guard.insert(def.name, def);
            Ok(Registration::Added)
        }
    }
}

fn get<T: ?Sized>(
    table: &Table<T>,
    kind: CapabilityKind,
    name: &str,
) -> Result<CapabilityDef<T>, RegistryError> {
    table
        .read()
        .get(name)
        .copied()
        .ok_or_else(|| RegistryError::UnknownName {
            kind,
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use confval_core::{ContextData, ValidationError, Value};

    #[derive(Debug)]
    struct Upper;

    impl Validator for Upper {
        fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
            Ok(Value::from(raw.to_uppercase()))
        }
    }

    impl Plugin for Upper {
        const NAME: &'static str = "upper";
        fn build(_params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
            Ok(Upper)
        }
    }

    #[derive(Debug)]
    struct OtherUpper;

    impl Validator for OtherUpper {
        fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
            Ok(Value::from(raw))
        }
    }

    impl Plugin for OtherUpper {
        const NAME: &'static str = "upper";
        fn build(_params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
            Ok(OtherUpper)
        }
    }

    #[test]
    fn test_register_and_build() {
        let registry = Registry::new();
        assert_eq!(
            registry.register(ValidatorDef::of::<Upper>()).unwrap(),
            Registration::Added
        );
        let data = ContextData::new();
        let ctx = InitContext::new(&registry, &data);
        let v = registry
            .validator("upper")
            .unwrap()
            .build(Params::new(), &ctx)
            .unwrap();
        assert_eq!(v.validate("abc").unwrap(), "ABC");
    }

    #[test]
    fn test_identical_reregistration_is_tolerated() {
        let registry = Registry::new();
        registry.register(ValidatorDef::of::<Upper>()).unwrap();
        assert_eq!(
            registry.register(ValidatorDef::of::<Upper>()).unwrap(),
            Registration::Duplicate
        );
        assert_eq!(registry.list(CapabilityKind::Validator).len(), 1);
    }

    #[test]
    fn test_conflicting_registration_is_rejected() {
        let registry = Registry::new();
        registry.register(ValidatorDef::of::<Upper>()).unwrap();
        let err = registry.register(ValidatorDef::of::<OtherUpper>()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateDefinition {
                kind: CapabilityKind::Validator,
                name: "upper".into()
            }
        );
        // the original stays in place
        let data = ContextData::new();
        let ctx = InitContext::new(&registry, &data);
        let v = registry
            .validator("upper")
            .unwrap()
            .build(Params::new(), &ctx)
            .unwrap();
        assert_eq!(v.validate("a").unwrap(), "A");
    }

    #[test]
    fn test_unknown_name() {
        let registry = Registry::new();
        let err = registry.validator("nope").unwrap_err();
        assert_eq!(err.to_string(), "no validator with the name nope");
        assert!(!registry.contains(CapabilityKind::SectionFeature, "default"));
    }

    #[test]
    fn test_builtin_set() {
        let registry = Registry::builtin();
        let validators = registry.list(CapabilityKind::Validator);
        for name in ["default", "int", "str", "or", "url", "generalizedTime", "dict", "strip_dir"] {
            assert!(validators.contains(name), "missing builtin validator {name}");
        }
        let all = registry.list_all();
        assert!(all[&CapabilityKind::SectionFeature].contains("raw_section_input"));
        assert!(all[&CapabilityKind::OptionFeature].contains("sub_ini"));
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&global(), &global()));
        assert!(global().contains(CapabilityKind::Validator, "int"));
    }

    #[test]
    fn test_separate_registries_are_isolated() {
        let a = Registry::builtin();
        let b = Registry::builtin();
        a.register(ValidatorDef::of::<Upper>()).unwrap();
        assert!(a.contains(CapabilityKind::Validator, "upper"));
        assert!(!b.contains(CapabilityKind::Validator, "upper"));
    }
}
