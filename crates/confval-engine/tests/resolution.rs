//! # Resolution Tests
//!
//! End-to-end runs through [`ConfigValidator`]: dependency ordering, cycles,
//! defaults, error aggregation, and registry bookkeeping.

use std::io;
use std::sync::Arc;

use confval_engine::validators::numeric::Int;
use confval_engine::{
    ConfigValidator, IniSource, OptionSchema, Params, ParseError, Registration, Registry,
    ResolutionError, ResultTree, Schema, SectionSchema, ValidationError, ValidatorDef,
    ValidatorRef, Value,
};
use parking_lot::Mutex;
use serde_json::json;

fn source(text: &str) -> IniSource {
    text.parse().unwrap()
}

fn run(text: &str, schema: &Schema) -> Result<ResultTree, ParseError> {
    ConfigValidator::with_registry(source(text), Arc::new(Registry::builtin()))
        .unwrap()
        .parse(schema)
}

fn resolution_error(result: Result<ResultTree, ParseError>) -> ResolutionError {
    match result {
        Err(ParseError::Resolution(err)) => err,
        other => panic!("expected a resolution error, got {other:?}"),
    }
}

/// Returns the JSON of parameter `src`, ignoring the raw value.
fn copy_of(section: &str, option: &str) -> OptionSchema {
    let validator = ValidatorRef::transform(|_raw: &str, params: &Params| {
        params
            .get("src")
            .cloned()
            .map(Value::from_json)
            .ok_or_else(|| ValidationError::new("src missing"))
    })
    .reference("src", section, option);
    OptionSchema::new().with_validator(validator).with_depends(["src"])
}

// ─── Dependencies ────────────────────────────────────────────────────

#[test]
fn chain_resolves_in_every_declaration_order() {
    let orders = [
        ["a", "b", "c"],
        ["a", "c", "b"],
        ["b", "a", "c"],
        ["b", "c", "a"],
        ["c", "a", "b"],
        ["c", "b", "a"],
    ];
    for order in orders {
        let mut section = SectionSchema::new();
        for name in order {
            let option = match name {
                "a" => copy_of("S", "b"),
                "b" => copy_of("S", "c"),
                _ => OptionSchema::new().with_validator("int"),
            };
            section = section.option(name, option);
        }
        let schema = Schema::new().section("S", section);
        let tree = run("[S]\na = x\nb = y\nc = 3\n", &schema).unwrap();
        assert_eq!(tree["S"]["c"], Value::Int(3), "order {order:?}");
        assert_eq!(tree["S"]["b"], Value::Int(3), "order {order:?}");
        assert_eq!(tree["S"]["a"], Value::Int(3), "order {order:?}");
    }
}

#[test]
fn dependencies_cross_sections() {
    let schema = Schema::new()
        .section("Late", SectionSchema::new().option("copy", copy_of("Early", "n")))
        .section(
            "Early",
            SectionSchema::new().option("n", OptionSchema::new().with_validator("int")),
        );
    let tree = run("[Late]\ncopy = -\n[Early]\nn = 42\n", &schema).unwrap();
    assert_eq!(tree.path("Late.copy").unwrap(), &Value::Int(42));
}

#[test]
fn two_option_cycle_is_reported_per_participant() {
    let schema = Schema::new().section(
        "S",
        SectionSchema::new()
            .option("a", copy_of("S", "b"))
            .option("b", copy_of("S", "a")),
    );
    let err = resolution_error(run("[S]\na = 1\nb = 2\n", &schema));
    assert_eq!(err.messages().len(), 4, "{err}");
    assert!(err.mentions("error validating [S]a: circle reference with [S]b"));
    assert!(err.mentions("error validating [S]b: circle reference with [S]a"));
    assert!(err.mentions("error validating [S]a: dependencies not resolved: [S]b"));
    assert!(err.mentions("error validating [S]b: dependencies not resolved: [S]a"));
}

#[test]
fn cycle_does_not_block_unrelated_options() {
    let schema = Schema::new().section(
        "S",
        SectionSchema::new()
            .option("a", copy_of("S", "b"))
            .option("b", copy_of("S", "a"))
            .option("free", OptionSchema::new().with_validator("int"))
            .option("bad", OptionSchema::new().with_validator("int")),
    );
    let err = resolution_error(run("[S]\na = 1\nb = 2\nfree = 1\nbad = x\n", &schema));
    assert_eq!(err.messages().len(), 5, "{err}");
    assert!(err.mentions("error validating [S]bad: Input is no int"));
    assert!(!err.mentions("[S]free"));
}

// ─── Defaults and missing values ─────────────────────────────────────

#[test]
fn default_behaves_like_supplied_input() {
    let with_default = Schema::new().section(
        "S",
        SectionSchema::new().option(
            "n",
            OptionSchema::new().with_validator("int").with_default("7"),
        ),
    );
    let from_default = run("[S]\n", &with_default).unwrap();
    let from_input = run("[S]\nn = 7\n", &with_default).unwrap();
    assert_eq!(from_default, from_input);
    assert_eq!(from_default["S"]["n"], Value::Int(7));

    // a rejected default is reported like rejected input
    let bad_default = Schema::new().section(
        "S",
        SectionSchema::new().option(
            "n",
            OptionSchema::new().with_validator("int").with_default("seven"),
        ),
    );
    let err = resolution_error(run("[S]\n", &bad_default));
    assert_eq!(err.messages(), ["error validating [S]n: Input is no int"]);
}

#[test]
fn supplied_input_wins_over_default() {
    let schema = Schema::new().section(
        "S",
        SectionSchema::new().option("o", OptionSchema::new().with_default("fallback")),
    );
    let tree = run("[S]\no = given\n", &schema).unwrap();
    assert_eq!(tree["S"]["o"], "given");
}

#[test]
fn missing_values_are_aggregated() {
    let schema = Schema::new()
        .section(
            "S",
            SectionSchema::new()
                .option("present", OptionSchema::new().with_validator("int"))
                .option("missing", OptionSchema::new().with_validator("int")),
        )
        .section(
            "T",
            SectionSchema::new().option("gone", OptionSchema::new().with_validator("str")),
        );
    let err = resolution_error(run("[S]\npresent = 1\n", &schema));
    assert_eq!(
        err.messages(),
        [
            "error validating [S]missing: no value for section/option",
            "error validating [T]gone: no value for section/option",
        ]
    );
    assert_eq!(
        err.to_string(),
        "error validating [S]missing: no value for section/option\n\
         error validating [T]gone: no value for section/option"
    );
}

#[test]
fn dependency_on_missing_value_is_unresolved() {
    let schema = Schema::new().section(
        "S",
        SectionSchema::new()
            .option("copy", copy_of("S", "absent"))
            .option("absent", OptionSchema::new()),
    );
    let err = resolution_error(run("[S]\ncopy = x\n", &schema));
    assert_eq!(
        err.messages(),
        [
            "error validating [S]absent: no value for section/option",
            "error validating [S]copy: dependencies not resolved: [S]absent",
        ]
    );
}

// ─── Schemas from JSON and YAML ──────────────────────────────────────

#[test]
fn json_schema_with_dependent_bound() {
    let schema = json!({
        "S": {
            "o1": {"default": "5", "validator": "int"},
            "o2": {"validator": {"type": "int", "min": ["S", "o1"]}, "depends": ["min"]}
        }
    });
    let validator = ConfigValidator::new(source("[S]\no2 = 10\n")).unwrap();
    let tree = validator.parse_json(&schema).unwrap();
    assert_eq!(tree["S"]["o1"], Value::Int(5));
    assert_eq!(tree["S"]["o2"], Value::Int(10));

    let validator = ConfigValidator::new(source("[S]\no2 = 3\n")).unwrap();
    let err = resolution_error(validator.parse_json(&schema));
    assert!(err.mentions("error validating [S]o2: minimum: 5"));
}

#[test]
fn int_bound_from_float_option() {
    let schema = json!({
        "S": {
            "f": "float",
            "i": {"validator": {"type": "int", "min": ["S", "f"]}, "depends": ["min"]}
        }
    });
    let validator = ConfigValidator::new(source("[S]\nf = 5\ni = 7\n")).unwrap();
    let tree = validator.parse_json(&schema).unwrap();
    assert_eq!(tree["S"]["f"], Value::Float(5.0));
    assert_eq!(tree["S"]["i"], Value::Int(7));

    let validator = ConfigValidator::new(source("[S]\nf = 5\ni = 3\n")).unwrap();
    let err = resolution_error(validator.parse_json(&schema));
    assert_eq!(err.messages(), ["error validating [S]i: minimum: 5"]);

    // a fractional float cannot bound an int
    let validator = ConfigValidator::new(source("[S]\nf = 5.5\ni = 7\n")).unwrap();
    let err = resolution_error(validator.parse_json(&schema));
    assert_eq!(
        err.messages(),
        ["error validating [S]i: error init validator 'int' | min must be a number"]
    );
}

#[test]
fn yaml_schema() {
    let yaml = "
server:
  port: port
  host:
    validator: str
    default: localhost
  workers:
    validator:
      type: int
      min: 1
      max: 64
";
    let validator = ConfigValidator::new(source("[server]\nport = 8080\nworkers = 4\n")).unwrap();
    let tree = validator.parse_yaml(yaml).unwrap();
    assert_eq!(tree["server"]["port"], Value::Int(8080));
    assert_eq!(tree["server"]["host"], "localhost");
    assert_eq!(tree["server"]["workers"], Value::Int(4));
}

#[test]
fn path_and_index_access_agree() {
    let schema = json!({
        "A": {"x": "int", "y": "bool"},
        "B": {"z": {"default": "text"}}
    });
    let validator = ConfigValidator::new(source("[A]\nx = 1\ny = yes\n")).unwrap();
    let tree = validator.parse_json(&schema).unwrap();
    for (section, options) in tree.iter() {
        let Value::Tree(options) = options else {
            panic!("section {section} is not a tree");
        };
        for (option, value) in options.iter() {
            assert_eq!(&tree[section.as_str()][option.as_str()], value);
            assert_eq!(tree.path(&format!("{section}.{option}")).unwrap(), value);
            assert_eq!(tree.section(section).unwrap().entry(option).unwrap(), value);
        }
    }
    assert_eq!(tree.len(), 2);
}

// ─── Registry ────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn identical_reregistration_warns() {
    let registry = Registry::builtin();
    let logs = Captured::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let outcome = tracing::subscriber::with_default(subscriber, || {
        registry.register(ValidatorDef::of::<Int>())
    });
    assert_eq!(outcome.unwrap(), Registration::Duplicate);

    let output = String::from_utf8(logs.0.lock().clone()).unwrap();
    assert!(output.contains("WARN"), "{output}");
    assert!(output.contains("capability registered twice"), "{output}");
    assert!(output.contains("name=\"int\""), "{output}");
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    const VALIDATORS: [&str; 3] = ["int", "str", "default"];

    proptest! {
        /// Without dependencies, visitation order does not change the tree.
        #[test]
        fn order_does_not_matter(
            values in prop::collection::vec(any::<i32>(), 6),
            order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle(),
        ) {
            let mut text = String::from("[S]\n");
            for (index, value) in values.iter().enumerate() {
                text.push_str(&format!("o{index} = {value}\n"));
            }

            let build = |indices: &[usize]| {
                let mut section = SectionSchema::new();
                for &index in indices {
                    let option = OptionSchema::new().with_validator(VALIDATORS[index % 3]);
                    section = section.option(format!("o{index}"), option);
                }
                Schema::new().section("S", section)
            };
            let declared: Vec<usize> = (0..6).collect();
            let expected = run(&text, &build(&declared)).unwrap();
            let shuffled = run(&text, &build(&order)).unwrap();
            prop_assert_eq!(&shuffled, &expected);
            prop_assert_eq!(&expected["S"]["o0"], &Value::Int(i64::from(values[0])));
        }
    }
}
