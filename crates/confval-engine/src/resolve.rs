//! # Resolution Engine
//!
//! Produces one validated value per `(section, option)` key, honoring
//! dependencies between options, and collects every failure instead of
//! stopping at the first.
//!
//! ## Key Lifecycle
//!
//! ```text
//! Unstarted ──add_value──▶ Pending ──last link resolved──▶ Validating
//!     │                       │                              │      │
//!     └──no links─────────────┼─────────────────────────────▶│      │
//!                             │                              ▼      ▼
//!                       cycle detected ──▶ poisoned      Resolved  Failed
//! ```
//!
//! A key is *pending* while some of its dependency parameters reference
//! options that have no value yet. The engine keeps two mirrored indexes:
//! each pending entry's `links` (parameter → target key) and the `waiting`
//! index (target key → keys waiting on it). Every link appears in both.
//!
//! When a value is stored, the keys waiting on it get the value injected
//! into the matching parameters (as JSON). Entries whose last link drains
//! are validated in turn, breadth first, and their successes cascade
//! further.
//!
//! ## Cycles
//!
//! Before an entry is parked, the engine searches the pending graph for a
//! path from its link targets back to the entry itself. Every key on such a
//! path gets a `circle reference` message naming the key it depends on and
//! is marked poisoned: it stays indexed, so finalization also reports it as
//! unresolved, but it is never validated.
//!
//! ## Messages
//!
//! | situation | recorded message |
//! |---|---|
//! | no raw value, no default | `error validating [S]o: no value for section/option` |
//! | validator unknown / cannot be built / rejects the value | `error validating [S]o: <message>` (one per message) |
//! | dependency cycle | `error validating [X]x: circle reference with [Y]y` |
//! | still pending at finalization | `error validating [S]o: dependencies not resolved: [A]a, [B]b` |

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use confval_core::{
    ConfigSource, ContextData, IniKey, ResolutionError, ResultTree, ValidationError, Value,
};
use indexmap::IndexMap;

use crate::error::{ContractError, ResolveFailure};
use crate::invoke;
use crate::registry::Registry;
use crate::validator::{InitContext, Params, Target, Validator, ValidatorRef};

// ─── Completion Hooks ────────────────────────────────────────────────

/// What happens once a key's validator has been built.
///
/// The default hooks validate the raw value, store the result under the
/// key, and record failures as `error validating [S]o: <message>`.
/// Features substitute their own hooks to post-process values or to keep
/// per-section bookkeeping.
pub trait Completion {
    /// Run `validator` on `raw` and store whatever should be stored.
    ///
    /// Returning `Ok` without storing a value is allowed; keys waiting on
    /// `key` are only released once a value exists.
    fn on_validated(
        &self,
        resolver: &mut Resolver<'_>,
        key: &IniKey,
        validator: &dyn Validator,
        raw: &str,
    ) -> Result<(), ValidationError> {
        let value = validator.validate(raw)?;
        resolver.store(key.clone(), value);
        Ok(())
    }

    /// The validator could not be built, or `on_validated` failed.
    fn on_failed(&self, resolver: &mut Resolver<'_>, key: &IniKey, failure: ResolveFailure) {
        resolver.record_failure(key, &failure);
    }
}

/// The default completion hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoreValue;

impl Completion for StoreValue {}

// ─── Requests ────────────────────────────────────────────────────────

/// Everything `add_value` needs besides the key.
#[derive(Clone)]
pub struct ValueRequest {
    validator: ValidatorRef,
    depends: Vec<String>,
    default: Option<String>,
    hooks: Rc<dyn Completion>,
}

impl ValueRequest {
    pub fn new(validator: ValidatorRef) -> Self {
        Self {
            validator,
            depends: Vec::new(),
            default: None,
            hooks: Rc::new(StoreValue),
        }
    }

    /// Validator parameters holding `[section, option]` references.
    pub fn with_depends(mut self, depends: Vec<String>) -> Self {
        self.depends = depends;
        self
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }

    pub fn with_hooks(mut self, hooks: Rc<dyn Completion>) -> Self {
        self.hooks = hooks;
        self
    }
}

impl fmt::Debug for ValueRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRequest")
            .field("validator", &self.validator)
            .field("depends", &self.depends)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

struct PendingEntry {
    target: Target,
    params: Params,
    raw: String,
    hooks: Rc<dyn Completion>,
    /// Unresolved dependency parameters and the keys they wait on.
    links: BTreeMap<String, IniKey>,
    poisoned: bool,
}

// ─── Resolver ────────────────────────────────────────────────────────

/// State of one resolution run.
pub struct Resolver<'a> {
    source: &'a dyn ConfigSource,
    registry: Arc<Registry>,
    data: ContextData,
    resolved: BTreeMap<String, BTreeMap<String, Value>>,
    pending: IndexMap<IniKey, PendingEntry>,
    waiting: HashMap<IniKey, Vec<IniKey>>,
    errors: Vec<String>,
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("resolved", &self.resolved)
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl<'a> Resolver<'a> {
    /// Start a run over `source`. `data` is this run's context snapshot.
    pub fn new(source: &'a dyn ConfigSource, registry: Arc<Registry>, data: ContextData) -> Self {
        Self {
            source,
            registry,
            data,
            resolved: BTreeMap::new(),
            pending: IndexMap::new(),
            waiting: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn source(&self) -> &'a dyn ConfigSource {
        self.source
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn context(&self) -> &ContextData {
        &self.data
    }

    /// Construction context for validators and features built in this run.
    pub fn init_context(&self) -> InitContext<'_> {
        InitContext::new(&self.registry, &self.data)
    }

    /// Resolve `key` from the source (or `request`'s default), deferring
    /// it while any dependency is unresolved.
    ///
    /// Only a malformed dependency declaration is returned as an error;
    /// every other failure is recorded.
    pub fn add_value(&mut self, key: IniKey, request: ValueRequest) -> Result<(), ContractError> {
        let ValueRequest {
            validator,
            depends,
            default,
            hooks,
        } = request;

        if self.pending.contains_key(&key) {
            self.unlink(&key);
        }

        let from_source = if self.source.has_option(key.section(), key.option()) {
            self.source.get(key.section(), key.option())
        } else {
            None
        };
        let Some(raw) = from_source.or(default) else {
            self.record_error(format!("error validating {key}: no value for section/option"));
            return Ok(());
        };

        let (target, mut params) = validator.into_parts();
        let mut links = BTreeMap::new();
        for param in depends {
            let reference = params
                .get(&param)
                .ok_or_else(|| ContractError::MissingParameter {
                    key: key.clone(),
                    param: param.clone(),
                })?;
            let dependency =
                IniKey::from_reference(reference).ok_or_else(|| ContractError::InvalidReference {
                    key: key.clone(),
                    param: param.clone(),
                    found: reference.to_string(),
                })?;
            match self.value(&dependency) {
                Some(value) => {
                    params.insert(param, value.to_json());
                }
                None => {
                    links.insert(param, dependency);
                }
            }
        }

        let entry = PendingEntry {
            target,
            params,
            raw,
            hooks,
            links,
            poisoned: false,
        };
        if entry.links.is_empty() {
            if self.settle(&key, entry) {
                self.cascade(key);
            }
        } else {
            self.defer(key, entry);
        }
        Ok(())
    }

    /// Store `value` under `key`. A second write to the same key replaces
    /// the first and logs a warning.
    ///
    /// Keys waiting on `key` are released by the surrounding
    /// [`add_value`](Self::add_value) call; use [`provide`](Self::provide)
    /// to store a value from outside one.
    pub fn store(&mut self, key: IniKey, value: Value) {
        let options = self.resolved.entry(key.section().to_string()).or_default();
        if options.insert(key.option().to_string(), value).is_some() {
            tracing::warn!(
                section = key.section(),
                option = key.option(),
                "overriding an already resolved value"
            );
        }
    }

    /// Store `value` under `key` and release every key waiting on it.
    pub fn provide(&mut self, key: IniKey, value: Value) {
        self.store(key.clone(), value);
        self.cascade(key);
    }

    /// The resolved value of `key`, if any.
    pub fn value(&self, key: &IniKey) -> Option<&Value> {
        self.resolved.get(key.section())?.get(key.option())
    }

    pub fn has_value(&self, key: &IniKey) -> bool {
        self.value(key).is_some()
    }

    /// Whether `key` is parked waiting on dependencies.
    pub fn is_pending(&self, key: &IniKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Append a message to the error list.
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "recorded resolution error");
        self.errors.push(message);
    }

    /// Record each message of `failure` under the key's location.
    pub fn record_failure(&mut self, key: &IniKey, failure: &ResolveFailure) {
        for message in failure.messages() {
            self.record_error(format!("error validating {key}: {message}"));
        }
    }

    /// Messages recorded so far, in order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Finalize: the result tree, or every recorded message plus one
    /// message per still-pending key.
    ///
    /// Borrows the run, so it may be called again after more values are
    /// added.
    pub fn result(&self) -> Result<ResultTree, ResolutionError> {
        let mut errors = self.errors.clone();
        for (key, entry) in &self.pending {
            // its dependencies resolved after the cycle was reported
            if entry.poisoned && entry.links.is_empty() {
                errors.push(format!("error validating {key}: unresolved circle reference"));
                continue;
            }
            let missing: BTreeSet<String> = entry.links.values().map(ToString::to_string).collect();
            let missing: Vec<String> = missing.into_iter().collect();
            errors.push(format!(
                "error validating {key}: dependencies not resolved: {}",
                missing.join(", ")
            ));
        }
        if !errors.is_empty() {
            return Err(ResolutionError::new(errors));
        }
        Ok(self
            .resolved
            .iter()
            .map(|(section, options)| {
                let options: ResultTree = options
                    .iter()
                    .map(|(option, value)| (option.clone(), value.clone()))
                    .collect();
                (section.clone(), Value::Tree(options))
            })
            .collect())
    }

    // ─── internals ───────────────────────────────────────────────────

    /// Build the validator and run the hooks. Returns whether a value was
    /// stored under `key`.
    fn settle(&mut self, key: &IniKey, entry: PendingEntry) -> bool {
        let PendingEntry {
            target,
            params,
            raw,
            hooks,
            ..
        } = entry;
        let built = {
            let ctx = self.init_context();
            invoke::instantiate(&target, params, &ctx)
        };
        let validator = match built {
            Ok(validator) => validator,
            Err(failure) => {
                hooks.on_failed(self, key, failure);
                return false;
            }
        };
        match hooks.on_validated(self, key, validator.as_ref(), &raw) {
            Ok(()) => self.has_value(key),
            Err(err) => {
                hooks.on_failed(self, key, ResolveFailure::Validation(err));
                false
            }
        }
    }

    /// Release everything transitively waiting on `start`, breadth first.
    fn cascade(&mut self, start: IniKey) {
        let mut queue = VecDeque::from([start]);
        while let Some(resolved) = queue.pop_front() {
            let Some(waiters) = self.waiting.remove(&resolved) else {
                continue;
            };
            let Some(json) = self.value(&resolved).map(Value::to_json) else {
                continue;
            };
            for waiter in waiters {
                let Some(entry) = self.pending.get_mut(&waiter) else {
                    continue;
                };
                let filled: Vec<String> = entry
                    .links
                    .iter()
                    .filter(|(_, target)| **target == resolved)
                    .map(|(param, _)| param.clone())
                    .collect();
                for param in filled {
                    entry.links.remove(&param);
                    entry.params.insert(param, json.clone());
                }
                if !entry.links.is_empty() || entry.poisoned {
                    continue;
                }
                if let Some(entry) = self.pending.shift_remove(&waiter) {
                    if self.settle(&waiter, entry) {
                        queue.push_back(waiter);
                    }
                }
            }
        }
    }

    /// Park an entry with unresolved links, reporting any cycle it closes.
    fn defer(&mut self, key: IniKey, mut entry: PendingEntry) {
        if let Some(cycle) = self.find_cycle(&key, &entry.links) {
            for (index, participant) in cycle.iter().enumerate() {
                let next = &cycle[(index + 1) % cycle.len()];
                self.record_error(format!(
                    "error validating {participant}: circle reference with {next}"
                ));
            }
            for participant in &cycle {
                if let Some(other) = self.pending.get_mut(participant) {
                    other.poisoned = true;
                }
            }
            entry.poisoned = true;
        }

        let targets: BTreeSet<IniKey> = entry.links.values().cloned().collect();
        for target in targets {
            self.waiting.entry(target).or_default().push(key.clone());
        }
        self.pending.insert(key, entry);
    }

    /// Remove a pending entry and its index entries.
    fn unlink(&mut self, key: &IniKey) {
        let Some(entry) = self.pending.shift_remove(key) else {
            return;
        };
        for target in entry.links.values() {
            if let Some(waiters) = self.waiting.get_mut(target) {
                waiters.retain(|waiter| waiter != key);
                if waiters.is_empty() {
                    self.waiting.remove(target);
                }
            }
        }
    }

    /// A path `key → … → key` through pending links, starting with `key`.
    fn find_cycle(&self, key: &IniKey, links: &BTreeMap<String, IniKey>) -> Option<Vec<IniKey>> {
        let mut visited = HashSet::new();
        for target in links.values() {
            let mut path = vec![key.clone()];
            if self.path_back(target, key, &mut path, &mut visited) {
                return Some(path);
            }
        }
        None
    }

    fn path_back(
        &self,
        node: &IniKey,
        goal: &IniKey,
        path: &mut Vec<IniKey>,
        visited: &mut HashSet<IniKey>,
    ) -> bool {
        if node == goal {
            return true;
        }
        if !visited.insert(node.clone()) {
            return false;
        }
        let Some(entry) = self.pending.get(node) else {
            return false;
        };
        path.push(node.clone());
        for next in entry.links.values() {
            if self.path_back(next, goal, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confval_core::IniSource;

    fn resolver(source: &IniSource) -> Resolver<'_> {
        Resolver::new(source, Arc::new(Registry::builtin()), ContextData::new())
    }

    fn copy_of(param: &str) -> ValidatorRef {
        let param = param.to_string();
        ValidatorRef::transform(move |_, params| {
            params
                .get(&param)
                .cloned()
                .map(Value::from_json)
                .ok_or_else(|| ValidationError::new("no dependency value"))
        })
    }

    fn key(option: &str) -> IniKey {
        IniKey::new("S", option)
    }

    #[test]
    fn test_immediate_value() {
        let mut source = IniSource::new();
        source.set("S", "o", "5");
        let mut r = resolver(&source);
        r.add_value(key("o"), ValueRequest::new(ValidatorRef::named("int")))
            .unwrap();
        assert_eq!(r.value(&key("o")), Some(&Value::Int(5)));
        assert_eq!(r.result().unwrap()["S"]["o"], 5);
    }

    #[test]
    fn test_default_used_when_absent() {
        let source = IniSource::new();
        let mut r = resolver(&source);
        let request = ValueRequest::new(ValidatorRef::named("int")).with_default(Some("7".into()));
        r.add_value(key("o"), request).unwrap();
        assert_eq!(r.result().unwrap()["S"]["o"], 7);
    }

    #[test]
    fn test_missing_value_is_recorded() {
        let source = IniSource::new();
        let mut r = resolver(&source);
        r.add_value(key("o"), ValueRequest::new(ValidatorRef::default()))
            .unwrap();
        let err = r.result().unwrap_err();
        assert_eq!(
            err.messages(),
            ["error validating [S]o: no value for section/option"]
        );
    }

    #[test]
    fn test_deferred_until_dependency_resolves() {
        let mut source = IniSource::new();
        source.set("S", "a", "x").set("S", "b", "y");
        let mut r = resolver(&source);
        let request = ValueRequest::new(copy_of("v").reference("v", "S", "b"))
            .with_depends(vec!["v".into()]);
        r.add_value(key("a"), request).unwrap();
        assert!(r.is_pending(&key("a")));
        assert!(!r.has_value(&key("a")));

        r.add_value(key("b"), ValueRequest::new(ValidatorRef::default()))
            .unwrap();
        assert!(!r.is_pending(&key("a")));
        assert_eq!(r.value(&key("a")), Some(&Value::from("y")));
    }

    #[test]
    fn test_cycle_reports_every_participant() {
        let mut source = IniSource::new();
        source.set("S", "a", "1").set("S", "b", "2");
        let mut r = resolver(&source);
        r.add_value(
            key("a"),
            ValueRequest::new(copy_of("v").reference("v", "S", "b")).with_depends(vec!["v".into()]),
        )
        .unwrap();
        r.add_value(
            key("b"),
            ValueRequest::new(copy_of("v").reference("v", "S", "a")).with_depends(vec!["v".into()]),
        )
        .unwrap();
        let err = r.result().unwrap_err();
        assert_eq!(
            err.messages(),
            [
                "error validating [S]b: circle reference with [S]a",
                "error validating [S]a: circle reference with [S]b",
                "error validating [S]a: dependencies not resolved: [S]b",
                "error validating [S]b: dependencies not resolved: [S]a",
            ]
        );
    }

    #[test]
    fn test_cycle_member_stays_unresolved_after_provide() {
        let mut source = IniSource::new();
        source.set("S", "a", "1").set("S", "b", "2");
        let mut r = resolver(&source);
        let copy = |option: &str| {
            ValueRequest::new(copy_of("v").reference("v", "S", option))
                .with_depends(vec!["v".into()])
        };
        r.add_value(key("a"), copy("b")).unwrap();
        r.add_value(key("b"), copy("a")).unwrap();
        r.provide(key("b"), Value::Int(9));

        assert!(r.is_pending(&key("a")));
        assert!(!r.has_value(&key("a")));
        let err = r.result().unwrap_err();
        assert_eq!(
            err.messages(),
            [
                "error validating [S]b: circle reference with [S]a",
                "error validating [S]a: circle reference with [S]b",
                "error validating [S]a: unresolved circle reference",
                "error validating [S]b: dependencies not resolved: [S]a",
            ]
        );
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut source = IniSource::new();
        source.set("S", "a", "1");
        let mut r = resolver(&source);
        r.add_value(
            key("a"),
            ValueRequest::new(copy_of("v").reference("v", "S", "a")).with_depends(vec!["v".into()]),
        )
        .unwrap();
        assert!(r
            .result()
            .unwrap_err()
            .mentions("error validating [S]a: circle reference with [S]a"));
    }

    #[test]
    fn test_malformed_dependency_is_a_contract_error() {
        let mut source = IniSource::new();
        source.set("S", "a", "1");
        let mut r = resolver(&source);
        let err = r
            .add_value(
                key("a"),
                ValueRequest::new(ValidatorRef::named("int")).with_depends(vec!["min".into()]),
            )
            .unwrap_err();
        assert!(matches!(err, ContractError::MissingParameter { .. }));

        let err = r
            .add_value(
                key("a"),
                ValueRequest::new(ValidatorRef::named("int").param("min", "S"))
                    .with_depends(vec!["min".into()]),
            )
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidReference { .. }));
    }

    #[test]
    fn test_failed_dependency_leaves_dependents_unresolved() {
        let mut source = IniSource::new();
        source.set("S", "a", "1").set("S", "b", "not a number");
        let mut r = resolver(&source);
        r.add_value(
            key("a"),
            ValueRequest::new(ValidatorRef::named("int").reference("min", "S", "b"))
                .with_depends(vec!["min".into()]),
        )
        .unwrap();
        r.add_value(key("b"), ValueRequest::new(ValidatorRef::named("int")))
            .unwrap();
        let err = r.result().unwrap_err();
        assert_eq!(
            err.messages(),
            [
                "error validating [S]b: Input is no int",
                "error validating [S]a: dependencies not resolved: [S]b",
            ]
        );
    }

    #[test]
    fn test_readding_pending_key_replaces_entry() {
        let mut source = IniSource::new();
        source.set("S", "a", "x");
        let mut r = resolver(&source);
        r.add_value(
            key("a"),
            ValueRequest::new(copy_of("v").reference("v", "S", "missing"))
                .with_depends(vec!["v".into()]),
        )
        .unwrap();
        assert!(r.is_pending(&key("a")));
        r.add_value(key("a"), ValueRequest::new(ValidatorRef::default()))
            .unwrap();
        assert!(!r.is_pending(&key("a")));
        assert_eq!(r.result().unwrap()["S"]["a"], "x");
    }

    #[test]
    fn test_provide_releases_waiters() {
        let mut source = IniSource::new();
        source.set("S", "a", "x");
        let mut r = resolver(&source);
        r.add_value(
            key("a"),
            ValueRequest::new(copy_of("v").reference("v", "T", "t"))
                .with_depends(vec!["v".into()]),
        )
        .unwrap();
        r.provide(IniKey::new("T", "t"), Value::Int(9));
        assert_eq!(r.value(&key("a")), Some(&Value::Int(9)));
    }

    #[test]
    fn test_result_can_be_called_again() {
        let mut source = IniSource::new();
        source.set("S", "b", "2");
        let mut r = resolver(&source);
        r.add_value(
            key("a"),
            ValueRequest::new(copy_of("v").reference("v", "S", "b"))
                .with_depends(vec!["v".into()])
                .with_default(Some("0".into())),
        )
        .unwrap();
        assert!(r.result().is_err());
        r.add_value(key("b"), ValueRequest::new(ValidatorRef::named("int")))
            .unwrap();
        let tree = r.result().unwrap();
        assert_eq!(tree["S"]["a"], 2);
        assert_eq!(tree["S"]["b"], 2);
    }

    #[test]
    fn test_override_keeps_latest_value() {
        let source = IniSource::new();
        let mut r = resolver(&source);
        r.store(key("a"), Value::Int(1));
        r.store(key("a"), Value::Int(2));
        assert_eq!(r.value(&key("a")), Some(&Value::Int(2)));
    }
}
