//! Reference JSON codec for the Lattice config framework.
//!
//! One JSON object per node level: scalar leaves as native JSON scalars,
//! node-valued leaves as nested objects, collections as arrays. Encode
//! output follows declaration order (`serde_json` with `preserve_order`),
//! so files are deterministic and diff-friendly.
//!
//! # Decode policy
//!
//! Failures are isolated per field: an ill-typed value is logged and
//! skipped, and sibling keys still apply. The one deliberate exception is
//! scalar collections, where a single ill-typed element rejects the whole
//! collection value: element homogeneity is an invariant of the sequence,
//! not of individual document entries.
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_codec_json::JsonCodec;
//! use lattice_core::{ConfigCodec, NodeBuilder};
//!
//! let mut builder = NodeBuilder::root();
//! let name = builder.option::<String>("name", "test");
//! let node = builder.build()?;
//!
//! let codec = JsonCodec;
//! assert_eq!(codec.encode(&node)?, r#"{"name":"test"}"#);
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use lattice_core::error::{CodecError, CodecResult};
use lattice_core::node::ConfigNode;
use lattice_core::option::OptionCell;
use lattice_core::value::{ConfigValue, ElementKind, ScalarKind, ValueKind};
use lattice_core::ConfigCodec;

/// The reference JSON codec, registered under the `json` extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl ConfigCodec for JsonCodec {
    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn decode(&self, data: &str, node: &ConfigNode) -> CodecResult<()> {
        let parsed: Value =
            serde_json::from_str(data).map_err(|e| CodecError::Parse(e.to_string()))?;
        let Value::Object(source) = parsed else {
            return Err(CodecError::Parse(
                "expected a JSON object at the document root".to_string(),
            ));
        };
        decode_node(&source, node);
        Ok(())
    }

    fn encode(&self, node: &ConfigNode) -> CodecResult<String> {
        serde_json::to_string(&Value::Object(encode_node(node)))
            .map_err(|e| CodecError::Encode(e.to_string()))
    }
}

// ─── Decoding ─────────────────────────────────────────────────────────────────

fn decode_node(source: &Map<String, Value>, node: &ConfigNode) {
    for child in node.children() {
        match source.get(child.key()) {
            Some(Value::Object(nested)) => decode_node(nested, child),
            Some(_) => warn!(key = child.key(), "expected a JSON object for nested node"),
            // A missing nested object leaves the child's leaves untouched,
            // presence flags included.
            None => {}
        }
    }

    for cell in node.options() {
        match source.get(cell.key()) {
            Some(value) => decode_option(value, cell),
            None => cell.set_present_on_load(false),
        }
    }
}

fn decode_option(value: &Value, cell: &Arc<OptionCell>) {
    match cell.descriptor().kind() {
        ValueKind::Scalar(kind) => match scalar_from_json(value, kind) {
            Some(converted) => {
                cell.set_value(converted);
            }
            None => warn!(
                key = cell.key(),
                expected = kind.name(),
                "ill-typed value ignored"
            ),
        },
        ValueKind::Node => match (value, cell.value()) {
            (Value::Object(nested), ConfigValue::Node(subtree)) => decode_node(nested, &subtree),
            _ => warn!(key = cell.key(), "expected a JSON object"),
        },
        ValueKind::List(ElementKind::Scalar(kind)) => decode_scalar_list(value, cell, kind),
        ValueKind::List(ElementKind::Node) => decode_node_list(value, cell),
    }
}

fn decode_scalar_list(value: &Value, cell: &Arc<OptionCell>, kind: ScalarKind) {
    let Value::Array(items) = value else {
        warn!(key = cell.key(), "expected a JSON array");
        return;
    };
    let mut converted = Vec::with_capacity(items.len());
    for item in items {
        match scalar_from_json(item, kind) {
            Some(element) => converted.push(element),
            None => {
                warn!(
                    key = cell.key(),
                    expected = kind.name(),
                    "ill-typed element rejects the whole collection"
                );
                return;
            }
        }
    }
    cell.set_value(ConfigValue::List(converted));
}

fn decode_node_list(value: &Value, cell: &Arc<OptionCell>) {
    let Value::Array(items) = value else {
        warn!(key = cell.key(), "expected a JSON array");
        return;
    };
    let mut elements = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(nested) = item else {
            warn!(key = cell.key(), "expected an array of JSON objects");
            return;
        };
        let Some(element) = cell.new_element() else {
            return;
        };
        decode_node(nested, &element);
        elements.push(ConfigValue::Node(element));
    }
    cell.set_value(ConfigValue::List(elements));
}

fn scalar_from_json(value: &Value, kind: ScalarKind) -> Option<ConfigValue> {
    match kind {
        ScalarKind::Bool => value.as_bool().map(ConfigValue::Bool),
        ScalarKind::Int => value.as_i64().map(ConfigValue::Int),
        ScalarKind::Float => value.as_f64().map(ConfigValue::Float),
        ScalarKind::Str => value.as_str().map(|s| ConfigValue::Str(s.to_string())),
    }
}

// ─── Encoding ─────────────────────────────────────────────────────────────────

fn encode_node(node: &ConfigNode) -> Map<String, Value> {
    let mut object = Map::new();
    for cell in node.options() {
        if !cell.present_on_load() {
            continue;
        }
        object.insert(cell.key().to_string(), encode_value(&cell.value()));
    }
    for child in node.children() {
        object.insert(child.key().to_string(), Value::Object(encode_node(child)));
    }
    object
}

fn encode_value(value: &ConfigValue) -> Value {
    match value {
        ConfigValue::Bool(b) => Value::Bool(*b),
        ConfigValue::Int(i) => Value::Number((*i).into()),
        ConfigValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ConfigValue::Str(s) => Value::String(s.clone()),
        ConfigValue::List(items) => Value::Array(items.iter().map(encode_value).collect()),
        ConfigValue::Node(node) => Value::Object(encode_node(node)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::handle::{ListHandle, OptionHandle};
    use lattice_core::NodeBuilder;

    struct Sample {
        name: OptionHandle<String>,
        retries: OptionHandle<i64>,
        verbose: OptionHandle<bool>,
        tags: ListHandle<String>,
    }

    fn sample_tree() -> (Sample, ConfigNode) {
        let mut builder = NodeBuilder::root();
        let sample = Sample {
            name: builder.option("name", "test"),
            retries: builder.option("retries", 3),
            verbose: builder.option("verbose", false),
            tags: builder.list("tags", ["default".to_string()]),
        };
        (sample, builder.build().unwrap())
    }

    #[test]
    fn test_encode_follows_declaration_order() {
        let (_, node) = sample_tree();
        assert_eq!(
            JsonCodec.encode(&node).unwrap(),
            r#"{"name":"test","retries":3,"verbose":false,"tags":["default"]}"#
        );
    }

    #[test]
    fn test_round_trip_restores_values_and_presence() {
        let (_, source) = sample_tree();
        let encoded = JsonCodec.encode(&source).unwrap();

        let (fresh, target) = sample_tree();
        JsonCodec.decode(&encoded, &target).unwrap();

        assert_eq!(fresh.name.get(), "test");
        assert_eq!(fresh.retries.get(), 3);
        assert!(!fresh.verbose.get());
        assert_eq!(fresh.tags.values(), vec!["default".to_string()]);
        for cell in target.options() {
            assert!(cell.present_on_load(), "{} lost presence", cell.key());
        }
    }

    #[test]
    fn test_absent_key_is_tracked_and_omitted_on_encode() {
        let (sample, node) = sample_tree();
        JsonCodec
            .decode(r#"{"name":"loaded","verbose":true,"tags":[]}"#, &node)
            .unwrap();

        assert_eq!(sample.name.get(), "loaded");
        assert_eq!(sample.retries.get(), 3);
        assert!(!node.option("retries").unwrap().present_on_load());

        assert_eq!(
            JsonCodec.encode(&node).unwrap(),
            r#"{"name":"loaded","verbose":true,"tags":[]}"#
        );
    }

    #[test]
    fn test_conversion_failure_is_isolated_per_field() {
        let (sample, node) = sample_tree();
        JsonCodec
            .decode(r#"{"name":"ok","retries":"three","verbose":true}"#, &node)
            .unwrap();

        assert_eq!(sample.name.get(), "ok");
        assert_eq!(sample.retries.get(), 3);
        assert!(sample.verbose.get());
        // The key was present, only its value was unusable.
        assert!(node.option("retries").unwrap().present_on_load());
    }

    #[test]
    fn test_ill_typed_element_rejects_the_whole_collection() {
        let (sample, node) = sample_tree();
        JsonCodec
            .decode(r#"{"tags":["a",2,"c"]}"#, &node)
            .unwrap();
        assert_eq!(sample.tags.values(), vec!["default".to_string()]);
    }

    #[test]
    fn test_nested_nodes_decode_in_place() {
        let mut builder = NodeBuilder::root();
        let timeout = builder.child("network", |network| {
            network.option::<i64>("timeout_ms", 1000)
        });
        let node = builder.build().unwrap();

        JsonCodec
            .decode(r#"{"network":{"timeout_ms":250}}"#, &node)
            .unwrap();
        assert_eq!(timeout.get(), 250);
        assert_eq!(
            JsonCodec.encode(&node).unwrap(),
            r#"{"network":{"timeout_ms":250}}"#
        );
    }

    #[test]
    fn test_missing_nested_object_leaves_leaf_presence_alone() {
        let mut builder = NodeBuilder::root();
        builder.child("network", |network| {
            network.option::<i64>("timeout_ms", 1000);
        });
        let node = builder.build().unwrap();

        JsonCodec.decode("{}", &node).unwrap();
        // Nested nodes are always emitted; their untouched leaves keep
        // their defaults and presence.
        assert_eq!(
            JsonCodec.encode(&node).unwrap(),
            r#"{"network":{"timeout_ms":1000}}"#
        );
    }

    #[test]
    fn test_node_option_is_omitted_when_absent_on_load() {
        let mut builder = NodeBuilder::root();
        builder.option::<String>("name", "test");
        builder.node_option("advanced", |advanced| {
            advanced.option::<bool>("fast_path", false);
        });
        let node = builder.build().unwrap();

        assert_eq!(
            JsonCodec.encode(&node).unwrap(),
            r#"{"name":"test","advanced":{"fast_path":false}}"#
        );

        JsonCodec.decode(r#"{"name":"x"}"#, &node).unwrap();
        assert_eq!(JsonCodec.encode(&node).unwrap(), r#"{"name":"x"}"#);
    }

    #[test]
    fn test_structured_elements_round_trip() {
        fn tree() -> (lattice_core::NodeListHandle, ConfigNode) {
            let mut builder = NodeBuilder::root();
            let items = builder.node_list("items", |element| {
                element.option::<i64>("id", 0);
            });
            (items, builder.build().unwrap())
        }

        let (items, node) = tree();
        let element = items.push();
        element.apply("id", ConfigValue::Int(1));
        assert_eq!(
            JsonCodec.encode(&node).unwrap(),
            r#"{"items":[{"id":1}]}"#
        );

        let (fresh_items, fresh) = tree();
        JsonCodec.decode(r#"{"items":[{"id":1}]}"#, &fresh).unwrap();
        assert_eq!(fresh_items.len(), 1);
        assert_eq!(
            fresh_items.get(0).unwrap().resolve("id"),
            Some(ConfigValue::Int(1))
        );
    }

    #[test]
    fn test_malformed_source_is_a_parse_error() {
        let (_, node) = sample_tree();
        assert!(matches!(
            JsonCodec.decode("{not json", &node),
            Err(CodecError::Parse(_))
        ));
        assert!(matches!(
            JsonCodec.decode("[1,2,3]", &node),
            Err(CodecError::Parse(_))
        ));
    }
}
