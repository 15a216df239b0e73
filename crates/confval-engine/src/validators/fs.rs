//! Filesystem validators: `path`, `file`, `dir`, and their quote tolerant
//! `strip_path`, `strip_file`, `strip_dir` variants.
//!
//! All of them require the path to exist at validation time and share the
//! `absolute`, `allowed_prefix` and `disallowed_prefix` rules. Prefixes are
//! compared textually against the raw input.

use std::path::Path;

use confval_core::{BoxError, ValidationError, Value};
use serde::Deserialize;

use crate::validator::{from_params, InitContext, Params, Plugin, Validator};
use crate::validators::text::unquote;
use crate::validators::OneOrMany;

/// Rules shared by the three validators.
#[derive(Debug, Default)]
struct PathRules {
    absolute: Option<bool>,
    allowed_prefix: Option<Vec<String>>,
    disallowed_prefix: Vec<String>,
}

impl PathRules {
    fn new(
        absolute: Option<bool>,
        allowed_prefix: Option<OneOrMany>,
        disallowed_prefix: Option<OneOrMany>,
    ) -> Self {
        Self {
            absolute,
            allowed_prefix: allowed_prefix.map(OneOrMany::into_vec),
            disallowed_prefix: disallowed_prefix
                .map(OneOrMany::into_vec)
                .unwrap_or_default(),
        }
    }

    fn check(&self, raw: &str) -> Result<(), ValidationError> {
        let path = Path::new(raw);
        if !path.exists() {
            return Err(ValidationError::new(format!("path \"{raw}\" doesn't exist")));
        }

        let mut messages = Vec::new();
        match (self.absolute, path.is_absolute()) {
            (Some(false), true) => {
                messages.push(format!("path \"{raw}\" is absolute but must be relative"))
            }
            (Some(true), false) => {
                messages.push(format!("path \"{raw}\" is relative but must be absolute"))
            }
            _ => {}
        }
        if let Some(allowed) = &self.allowed_prefix {
            if !allowed.iter().any(|prefix| raw.starts_with(prefix.as_str())) {
                messages.push(format!("path \"{raw}\" is not in allowed prefixes"));
            }
        }
        for prefix in &self.disallowed_prefix {
            if raw.starts_with(prefix.as_str()) {
                messages.push(format!("prefix: ({prefix}) not allowed"));
            }
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::from_messages(messages))
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PathConfig {
    #[serde(default)]
    absolute: Option<bool>,
    #[serde(default)]
    allowed_prefix: Option<OneOrMany>,
    #[serde(default)]
    disallowed_prefix: Option<OneOrMany>,
}

impl PathConfig {
    fn into_rules(self) -> PathRules {
        PathRules::new(self.absolute, self.allowed_prefix, self.disallowed_prefix)
    }
}

/// `path`: an existing file or directory.
#[derive(Debug)]
pub struct AnyPath {
    rules: PathRules,
}

impl Plugin for AnyPath {
    const NAME: &'static str = "path";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        Ok(AnyPath {
            rules: from_params::<PathConfig>(params)?.into_rules(),
        })
    }
}

impl Validator for AnyPath {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        self.rules.check(raw)?;
        Ok(Value::from(raw))
    }
}

/// `file`: an existing regular file.
#[derive(Debug)]
pub struct File {
    rules: PathRules,
}

impl Plugin for File {
    const NAME: &'static str = "file";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        Ok(File {
            rules: from_params::<PathConfig>(params)?.into_rules(),
        })
    }
}

impl Validator for File {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        self.rules.check(raw)?;
        if !Path::new(raw).is_file() {
            return Err(ValidationError::new(format!("path \"{raw}\" is not a file")));
        }
        Ok(Value::from(raw))
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DirConfig {
    #[serde(default)]
    absolute: Option<bool>,
    #[serde(default)]
    allowed_prefix: Option<OneOrMany>,
    #[serde(default)]
    disallowed_prefix: Option<OneOrMany>,
    #[serde(default)]
    include_dirs: Vec<String>,
    #[serde(default)]
    include_files: Vec<String>,
    #[serde(default)]
    exclude_dirs: Vec<String>,
    #[serde(default)]
    exclude_files: Vec<String>,
}

/// `dir`: an existing directory.
///
/// `include_*` entries must exist and `exclude_*` entries must not; relative
/// entries are resolved against the directory itself.
#[derive(Debug)]
pub struct Dir {
    rules: PathRules,
    required: Vec<String>,
    forbidden: Vec<String>,
}

impl Plugin for Dir {
    const NAME: &'static str = "dir";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: DirConfig = from_params(params)?;
        Ok(Dir {
            rules: PathRules::new(
                config.absolute,
                config.allowed_prefix,
                config.disallowed_prefix,
            ),
            required: config
                .include_dirs
                .into_iter()
                .chain(config.include_files)
                .collect(),
            forbidden: config
                .exclude_dirs
                .into_iter()
                .chain(config.exclude_files)
                .collect(),
        })
    }
}

impl Validator for Dir {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        self.rules.check(raw)?;
        let root = Path::new(raw);
        if !root.is_dir() {
            return Err(ValidationError::new(format!(
                "path \"{raw}\" is not a directory"
            )));
        }

        let mut messages = Vec::new();
        for entry in &self.required {
            let path = root.join(entry);
            if !path.exists() {
                messages.push(format!("path \"{}\" doesn't exist", path.display()));
            }
        }
        for entry in &self.forbidden {
            let path = root.join(entry);
            if path.exists() {
                messages.push(format!("path \"{}\" exists", path.display()));
            }
        }
        if messages.is_empty() {
            Ok(Value::from(raw))
        } else {
            Err(ValidationError::from_messages(messages))
        }
    }
}

/// Runs the wrapped validator on the input, and on failure once more on the
/// text inside one pair of matching `"` or `'` quotes. The first failure is
/// the one reported. Parameters are those of the wrapped validator.
#[derive(Debug)]
pub struct Unquoted<V>(V);

impl<V: Validator> Validator for Unquoted<V> {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let failure = match self.0.validate(raw) {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };
        match unquote(raw.trim()) {
            Some(inner) => self.0.validate(inner).map_err(|_| failure),
            None => Err(failure),
        }
    }
}

impl Plugin for Unquoted<AnyPath> {
    const NAME: &'static str = "strip_path";

    fn build(params: Params, ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        AnyPath::build(params, ctx).map(Unquoted)
    }
}

impl Plugin for Unquoted<File> {
    const NAME: &'static str = "strip_file";

    fn build(params: Params, ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        File::build(params, ctx).map(Unquoted)
    }
}

impl Plugin for Unquoted<Dir> {
    const NAME: &'static str = "strip_dir";

    fn build(params: Params, ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        Dir::build(params, ctx).map(Unquoted)
    }
}
