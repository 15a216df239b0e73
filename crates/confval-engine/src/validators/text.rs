//! String-shaped validators: length and charset checks, patterns, e-mail
//! addresses, separated item lists, and bracketed lists and mappings.

use confval_core::{BoxError, ResultTree, ValidationError, Value};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::validator::{from_params, no_params, InitContext, Params, Plugin, Validator};
use crate::validators::{parse_bound, Bounds};

// ─── str / netbios ───────────────────────────────────────────────────

/// Characters given as one string or as a list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CharSet {
    Text(String),
    List(Vec<String>),
}

impl CharSet {
    fn into_chars(self) -> Vec<char> {
        match self {
            CharSet::Text(text) => text.chars().collect(),
            CharSet::List(items) => items.iter().flat_map(|item| item.chars()).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StrConfig {
    #[serde(default)]
    min_length: Option<serde_json::Value>,
    #[serde(default)]
    max_length: Option<serde_json::Value>,
    #[serde(default)]
    characters: Option<CharSet>,
    #[serde(default)]
    first: Option<CharSet>,
}

/// `str`: text with optional length bounds (in characters), an allowed
/// character set, and an allowed set for the first character.
#[derive(Debug)]
pub struct Str {
    length: Bounds<usize>,
    length_label: &'static str,
    characters: Option<Vec<char>>,
    first: Option<Vec<char>>,
}

fn render(chars: &[char]) -> String {
    chars
        .iter()
        .map(char::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Plugin for Str {
    const NAME: &'static str = "str";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: StrConfig = from_params(params)?;
        Ok(Str {
            length: Bounds::new(
                parse_bound(config.min_length, "min_length")?,
                parse_bound(config.max_length, "max_length")?,
            ),
            length_label: " string length",
            characters: config.characters.map(CharSet::into_chars),
            first: config.first.map(CharSet::into_chars),
        })
    }
}

impl Validator for Str {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let mut messages = Vec::new();
        if let Err(err) = self.length.check(&raw.chars().count(), self.length_label) {
            messages.extend(err.into_messages());
        }
        if let (Some(first), Some(c)) = (&self.first, raw.chars().next()) {
            if !first.contains(&c) {
                messages.push(format!(
                    "the first character must be one of: {}",
                    render(first)
                ));
            }
        }
        if let Some(allowed) = &self.characters {
            if raw.chars().any(|c| !allowed.contains(&c)) {
                messages.push(format!("allowed characters: {}", render(allowed)));
            }
        }
        if messages.is_empty() {
            Ok(Value::from(raw))
        } else {
            Err(ValidationError::from_messages(messages))
        }
    }
}

const NETBIOS_SYMBOLS: &str = "!@#$%^&()-_'{}.~";

/// `netbios`: a NetBIOS computer name (1 to 15 characters, no leading dot).
#[derive(Debug)]
pub struct NetBios(Str);

impl Plugin for NetBios {
    const NAME: &'static str = "netbios";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        no_params(params)?;
        let characters: Vec<char> = ('A'..='Z')
            .chain('0'..='9')
            .chain('a'..='z')
            .chain(NETBIOS_SYMBOLS.chars())
            .collect();
        let first = characters.iter().copied().filter(|c| *c != '.').collect();
        Ok(NetBios(Str {
            length: Bounds::new(Some(1), Some(15)),
            length_label: " NetBIOS Name length",
            characters: Some(characters),
            first: Some(first),
        }))
    }
}

impl Validator for NetBios {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        self.0.validate(raw)
    }
}

// ─── regex / email ───────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PatternConfig {
    pattern: String,
    #[serde(default)]
    flags: String,
}

/// Compile `pattern` anchored at the start of the input.
///
/// `flags` letters: `i` case-insensitive, `m` multi-line, `s` dot matches
/// newline, `x` verbose.
fn compile_anchored(pattern: &str, flags: &str) -> Result<Regex, BoxError> {
    let mut builder = RegexBuilder::new(&format!(r"\A(?:{pattern})"));
    for flag in flags.chars() {
        match flag.to_ascii_lowercase() {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => return Err(format!("unknown regex flag '{other}'").into()),
        };
    }
    builder
        .build()
        .map_err(|err| format!("error init regex: {err}").into())
}

/// `regex`: the input must match `pattern` from its first character.
#[derive(Debug)]
pub struct Pattern {
    regex: Regex,
}

impl Plugin for Pattern {
    const NAME: &'static str = "regex";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: PatternConfig = from_params(params)?;
        Ok(Pattern {
            regex: compile_anchored(&config.pattern, &config.flags)?,
        })
    }
}

impl Validator for Pattern {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        if !self.regex.is_match(raw) {
            return Err(ValidationError::new("No Matching"));
        }
        Ok(Value::from(raw))
    }
}

const EMAIL_PATTERN: &str = r"[^@]+@[^@]+\.[^@]+";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EmailConfig {
    #[serde(default)]
    hostname: Option<Vec<String>>,
}

/// `email`: `local@host.tld`, optionally restricted to some hosts.
#[derive(Debug)]
pub struct Email {
    regex: Regex,
    hostnames: Option<Vec<String>>,
}

impl Plugin for Email {
    const NAME: &'static str = "email";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: EmailConfig = from_params(params)?;
        Ok(Email {
            regex: compile_anchored(EMAIL_PATTERN, "i")?,
            hostnames: config
                .hostname
                .map(|hosts| hosts.iter().map(|h| h.to_lowercase()).collect()),
        })
    }
}

impl Validator for Email {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        if !self.regex.is_match(raw) {
            return Err(ValidationError::new("invalid email format"));
        }
        if let Some(hostnames) = &self.hostnames {
            let host = raw.rsplit_once('@').map(|(_, host)| host).unwrap_or_default();
            if !hostnames.contains(&host.to_lowercase()) {
                return Err(ValidationError::new("invalid host"));
            }
        }
        Ok(Value::from(raw))
    }
}

// ─── items / item / list ─────────────────────────────────────────────

fn comma() -> Option<String> {
    Some(",".to_string())
}

fn enabled() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ItemsConfig {
    #[serde(default)]
    values: Option<Vec<String>>,
    #[serde(default = "comma")]
    split_char: Option<String>,
    #[serde(default = "enabled")]
    strip: bool,
    #[serde(default)]
    min: Option<serde_json::Value>,
    #[serde(default)]
    max: Option<serde_json::Value>,
    #[serde(default)]
    skip_empty: bool,
}

/// `items`: a separated list of distinct elements.
///
/// The input is split on `split_char` (`null` keeps it whole), elements
/// are trimmed when `strip` is set, and duplicates are dropped keeping the
/// first occurrence. With `values`, every element must be one of them;
/// `min`/`max` bound the number of distinct elements.
#[derive(Debug)]
pub struct Items {
    values: Option<Vec<String>>,
    split_char: Option<String>,
    strip: bool,
    count: Bounds<usize>,
    skip_empty: bool,
}

impl Plugin for Items {
    const NAME: &'static str = "items";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: ItemsConfig = from_params(params)?;
        if config.split_char.as_deref() == Some("") {
            return Err("split_char must not be empty".into());
        }
        Ok(Items {
            values: config.values,
            split_char: config.split_char,
            strip: config.strip,
            count: Bounds::new(
                parse_bound(config.min, "min")?,
                parse_bound(config.max, "max")?,
            ),
            skip_empty: config.skip_empty,
        })
    }
}

impl Items {
    fn elements(&self, raw: &str) -> Result<Vec<String>, ValidationError> {
        let pieces: Vec<&str> = match &self.split_char {
            Some(split) => raw.split(split.as_str()).collect(),
            None => vec![raw],
        };
        let mut elements: Vec<String> = Vec::new();
        for piece in pieces {
            let element = if self.strip { piece.trim() } else { piece };
            if let Some(values) = &self.values {
                if !values.iter().any(|v| v == element) {
                    return Err(ValidationError::new(format!(
                        "Element '{element}' is not allowed: {}",
                        values.join(", ")
                    )));
                }
            }
            if element.is_empty() && self.skip_empty {
                continue;
            }
            if !elements.iter().any(|e| e == element) {
                elements.push(element.to_string());
            }
        }

        let found = elements.len();
        if let Some(min) = self.count.min.filter(|min| found < *min) {
            return Err(ValidationError::new(format!(
                "the allowed number ({min}) was not reached ({found})."
            )));
        }
        if let Some(max) = self.count.max.filter(|max| found > *max) {
            return Err(ValidationError::new(format!(
                "the allowed number ({max}) has been exceeded ({found})."
            )));
        }
        Ok(elements)
    }
}

impl Validator for Items {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let elements = self.elements(raw)?;
        Ok(Value::List(elements.into_iter().map(Value::from).collect()))
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ItemConfig {
    #[serde(default)]
    values: Option<Vec<String>>,
    #[serde(default = "enabled")]
    strip: bool,
}

/// `item`: exactly one element, optionally from a fixed set of `values`.
#[derive(Debug)]
pub struct Item(Items);

impl Plugin for Item {
    const NAME: &'static str = "item";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: ItemConfig = from_params(params)?;
        Ok(Item(Items {
            values: config.values,
            split_char: None,
            strip: config.strip,
            count: Bounds::new(Some(1), Some(1)),
            skip_empty: false,
        }))
    }
}

impl Validator for Item {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let mut elements = self.0.elements(raw)?;
        Ok(Value::from(elements.swap_remove(0)))
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ListConfig {
    #[serde(default)]
    strict: bool,
}

/// `list`: a bracketed, comma separated list such as `["a", 'b']`.
///
/// In strict mode the brackets and the quotes around every element are
/// required. Otherwise quoted elements are unquoted and bare elements are
/// kept, trimmed.
#[derive(Debug)]
pub struct List {
    strict: bool,
}

impl Plugin for List {
    const NAME: &'static str = "list";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: ListConfig = from_params(params)?;
        Ok(List {
            strict: config.strict,
        })
    }
}

/// The text between one pair of matching `"` or `'` quotes.
pub(crate) fn unquote(item: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        item.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}

impl Validator for List {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let trimmed = raw.trim();
        let body = match trimmed.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            Some(body) => body,
            None if self.strict => {
                return Err(ValidationError::new("input list elements with [...]"))
            }
            None => trimmed,
        };

        let mut items = Vec::new();
        for piece in body.split(',') {
            let item = piece.trim();
            match unquote(item) {
                Some(inner) => items.push(Value::from(inner)),
                None if self.strict => {
                    return Err(ValidationError::new("items must be surrounded by \" or '"))
                }
                // `[]` and `[  ]` are empty lists, not a list of one blank
                None if item.is_empty() && !body.contains(',') => {}
                None => items.push(Value::from(item)),
            }
        }
        Ok(Value::List(items))
    }
}

// ─── dict ────────────────────────────────────────────────────────────

const NOT_QUOTED: &str = "items must be surrounded by \" or '";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DictConfig {
    #[serde(default)]
    strict: bool,
    #[serde(default)]
    duplicate_keys: bool,
}

/// `dict`: a braced, comma separated mapping such as `{"a": "1", b: [x, y]}`.
///
/// Values may be nested `{...}` mappings or `[...]` lists, the latter
/// parsed like [`List`]. Strict mode requires the braces and quotes around
/// every key and scalar value. A repeated key is rejected unless
/// `duplicate_keys` is set, in which case the last value wins.
#[derive(Debug)]
pub struct Dict {
    strict: bool,
    duplicate_keys: bool,
}

impl Plugin for Dict {
    const NAME: &'static str = "dict";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: DictConfig = from_params(params)?;
        Ok(Dict {
            strict: config.strict,
            duplicate_keys: config.duplicate_keys,
        })
    }
}

/// Split a leading quoted token off `text`: `(inner, rest)`.
fn leading_quoted(text: &str) -> Option<(&str, &str)> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &text[1..];
    let end = body.find(quote)?;
    Some((&body[..end], &body[end + 1..]))
}

/// Split `text` just after the bracket that closes an already consumed
/// `open`.
fn split_closing(open: char, text: &str) -> Result<(&str, &str), ValidationError> {
    let close = if open == '{' { '}' } else { ']' };
    let mut depth = 1;
    for (index, c) in text.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Ok(text.split_at(index + 1));
            }
        }
    }
    Err(ValidationError::new("opening brace but no closing"))
}

impl Dict {
    fn entries(&self, body: &str) -> Result<ResultTree, ValidationError> {
        let mut entries: IndexMap<String, Value> = IndexMap::new();
        let mut rest = body;
        while !rest.trim().is_empty() {
            let (key, after_key) = match leading_quoted(rest.trim_start()) {
                Some((key, after)) => (key, after.trim_start()),
                None if self.strict => return Err(ValidationError::new(NOT_QUOTED)),
                None => {
                    let end = rest.find(':').unwrap_or(rest.len());
                    (rest[..end].trim(), &rest[end..])
                }
            };
            let after_colon = after_key
                .strip_prefix(':')
                .ok_or_else(|| ValidationError::new("key and values must be split by :"))?;
            let (value, remainder) = self.value(after_colon.trim_start())?;
            self.insert(&mut entries, key, value)?;

            let remainder = remainder.trim_start();
            rest = if remainder.is_empty() {
                remainder
            } else {
                remainder.strip_prefix(',').ok_or_else(|| {
                    ValidationError::new("Key-value pairs must be split by comma.")
                })?
            };
        }
        Ok(entries.into_iter().collect())
    }

    fn value<'a>(&self, text: &'a str) -> Result<(Value, &'a str), ValidationError> {
        if let Some((value, rest)) = leading_quoted(text) {
            return Ok((Value::from(value), rest));
        }
        match text.chars().next() {
            Some(open @ ('{' | '[')) => {
                let (nested, rest) = split_closing(open, &text[1..])?;
                let value = if open == '{' {
                    Value::Tree(self.entries(&nested[..nested.len() - 1])?)
                } else {
                    List {
                        strict: self.strict,
                    }
                    .validate(&format!("[{nested}"))?
                };
                Ok((value, rest))
            }
            _ if self.strict => Err(ValidationError::new(NOT_QUOTED)),
            _ => {
                let end = text.find(',').unwrap_or(text.len());
                Ok((Value::from(text[..end].trim()), &text[end..]))
            }
        }
    }

    fn insert(
        &self,
        entries: &mut IndexMap<String, Value>,
        key: &str,
        value: Value,
    ) -> Result<(), ValidationError> {
        if entries.contains_key(key) {
            if !self.duplicate_keys {
                return Err(ValidationError::new(format!("duplicate key input: {key}")));
            }
            tracing::warn!(key, "duplicate key input");
        }
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

impl Validator for Dict {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let trimmed = raw.trim();
        let body = match trimmed.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
            Some(body) => body,
            None if self.strict => {
                return Err(ValidationError::new("input dict elements with {...}"))
            }
            None => trimmed,
        };
        self.entries(body).map(Value::Tree)
    }
}

#[cfg(test)]
mod tests {
    use crate::validators::testing::{plain, rejected, run};
    use confval_core::{ResultTree, Value};
    use serde_json::json;

    fn strings(items: &[&str]) -> Value {
        Value::List(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[test]
    fn test_str_length() {
        assert_eq!(run("str", json!({"min_length": 2}), "ab").unwrap(), "ab");
        assert_eq!(
            rejected("str", json!({"min_length": 2}), "a"),
            ["minimum string length: 2"]
        );
        assert_eq!(
            rejected("str", json!({"max_length": "3"}), "äöüß"),
            ["maximum string length: 3"]
        );
        assert!(run("str", json!({"min_length": "x"}), "a").is_err());
    }

    #[test]
    fn test_str_characters() {
        let params = json!({"characters": "abc", "first": ["a"]});
        assert_eq!(run("str", params.clone(), "abca").unwrap(), "abca");
        assert_eq!(
            rejected("str", params, "bad"),
            [
                "the first character must be one of: a",
                "allowed characters: a, b, c"
            ]
        );
    }

    #[test]
    fn test_netbios() {
        assert_eq!(plain("netbios", "FILESERVER-01").unwrap(), "FILESERVER-01");
        assert_eq!(
            rejected("netbios", json!({}), ""),
            ["minimum NetBIOS Name length: 1"]
        );
        assert_eq!(
            rejected("netbios", json!({}), "A-NAME-THAT-IS-TOO-LONG"),
            ["maximum NetBIOS Name length: 15"]
        );
        let messages = rejected("netbios", json!({}), ".hidden");
        assert!(messages[0].starts_with("the first character must be one of:"));
        let messages = rejected("netbios", json!({}), "white space");
        assert!(messages[0].starts_with("allowed characters:"));
    }

    #[test]
    fn test_regex_is_anchored_at_start() {
        let params = json!({"pattern": "[a-z]+"});
        assert_eq!(run("regex", params.clone(), "abc123").unwrap(), "abc123");
        assert_eq!(rejected("regex", params, "1abc"), ["No Matching"]);
        assert!(run("regex", json!({"pattern": "A", "flags": "i"}), "a").is_ok());
        assert!(run("regex", json!({"pattern": "("}), "a").is_err());
        assert!(run("regex", json!({"pattern": "a", "flags": "q"}), "a").is_err());
    }

    #[test]
    fn test_email() {
        assert_eq!(plain("email", "user@example.org").unwrap(), "user@example.org");
        assert_eq!(rejected("email", json!({}), "user.example.org"), ["invalid email format"]);
        let params = json!({"hostname": ["Example.org"]});
        assert!(run("email", params.clone(), "a@EXAMPLE.org").is_ok());
        assert_eq!(rejected("email", params, "a@other.org"), ["invalid host"]);
    }

    #[test]
    fn test_items() {
        assert_eq!(plain("items", "a, b,a").unwrap(), strings(&["a", "b"]));
        assert_eq!(
            run("items", json!({"split_char": ";", "strip": false}), "a ;b").unwrap(),
            strings(&["a ", "b"])
        );
        assert_eq!(
            run("items", json!({"split_char": null}), "a,b").unwrap(),
            strings(&["a,b"])
        );
        assert_eq!(
            run("items", json!({"skip_empty": true}), "a,,b").unwrap(),
            strings(&["a", "b"])
        );
        assert_eq!(
            rejected("items", json!({"values": ["a", "b"]}), "a,c"),
            ["Element 'c' is not allowed: a, b"]
        );
        assert_eq!(
            rejected("items", json!({"min": 3}), "a,b"),
            ["the allowed number (3) was not reached (2)."]
        );
        assert_eq!(
            rejected("items", json!({"max": "1"}), "a,b"),
            ["the allowed number (1) has been exceeded (2)."]
        );
        assert!(run("items", json!({"split_char": ""}), "a").is_err());
    }

    #[test]
    fn test_item() {
        assert_eq!(plain("item", " x ").unwrap(), "x");
        assert_eq!(
            run("item", json!({"values": ["on", "off"]}), "on").unwrap(),
            "on"
        );
        assert_eq!(
            rejected("item", json!({"values": ["on", "off"]}), "maybe"),
            ["Element 'maybe' is not allowed: on, off"]
        );
    }

    #[test]
    fn test_list() {
        assert_eq!(plain("list", r#"["a", 'b']"#).unwrap(), strings(&["a", "b"]));
        assert_eq!(plain("list", "[]").unwrap(), strings(&[]));
        assert_eq!(plain("list", "a, b").unwrap(), strings(&["a", "b"]));
        let strict = json!({"strict": true});
        assert_eq!(
            rejected("list", strict.clone(), "a,b"),
            ["input list elements with [...]"]
        );
        assert_eq!(
            rejected("list", strict.clone(), "[a]"),
            ["items must be surrounded by \" or '"]
        );
        assert_eq!(run("list", strict, r#"["x"]"#).unwrap(), strings(&["x"]));
    }

    #[test]
    fn test_dict() {
        let value = plain("dict", r#"{"name": 'web', port: 8080}"#).unwrap();
        assert_eq!(value["name"], "web");
        assert_eq!(value["port"], "8080");
        assert_eq!(value.as_tree().unwrap().len(), 2);

        assert_eq!(plain("dict", "{}").unwrap(), Value::Tree(ResultTree::new()));
        assert_eq!(plain("dict", "a: 1, b: 2").unwrap()["b"], "2");
        assert_eq!(plain("dict", "{a: 1,}").unwrap()["a"], "1");
    }

    #[test]
    fn test_dict_nesting() {
        let value = plain(
            "dict",
            r#"{"hosts": ["a", "b"], "db": {"port": "5432", "opts": {x: y}}, last: z}"#,
        )
        .unwrap();
        assert_eq!(value["hosts"], strings(&["a", "b"]));
        assert_eq!(value["db"]["port"], "5432");
        assert_eq!(value["db"]["opts"]["x"], "y");
        assert_eq!(value["last"], "z");

        assert_eq!(
            rejected("dict", json!({}), "{a: [1, 2}"),
            ["opening brace but no closing"]
        );
    }

    #[test]
    fn test_dict_strict() {
        let strict = json!({"strict": true});
        assert_eq!(
            run("dict", strict.clone(), r#"{"a": "1", "l": ["x"]}"#).unwrap()["l"],
            strings(&["x"])
        );
        assert_eq!(
            rejected("dict", strict.clone(), r#""a": "1""#),
            ["input dict elements with {...}"]
        );
        assert_eq!(
            rejected("dict", strict.clone(), r#"{a: "1"}"#),
            ["items must be surrounded by \" or '"]
        );
        assert_eq!(
            rejected("dict", strict.clone(), r#"{"a": 1}"#),
            ["items must be surrounded by \" or '"]
        );
        // nested lists follow the same rule
        assert_eq!(
            rejected("dict", strict, r#"{"l": [x]}"#),
            ["items must be surrounded by \" or '"]
        );
    }

    #[test]
    fn test_dict_malformed_pairs() {
        assert_eq!(
            rejected("dict", json!({}), "{a 1}"),
            ["key and values must be split by :"]
        );
        assert_eq!(
            rejected("dict", json!({}), r#"{"a": "1" "b": "2"}"#),
            ["Key-value pairs must be split by comma."]
        );
    }

    #[test]
    fn test_dict_duplicate_keys() {
        assert_eq!(
            rejected("dict", json!({}), "{a: 1, a: 2}"),
            ["duplicate key input: a"]
        );
        let value = run("dict", json!({"duplicate_keys": true}), "{a: 1, b: 3, a: 2}").unwrap();
        assert_eq!(value["a"], "2");
        assert_eq!(value.as_tree().unwrap().len(), 2);
    }
}
