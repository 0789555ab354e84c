//! Shaping of backend values into JSON records

use base64::Engine;
use neo4j_mcp_core::{
    GraphValue, NodeValue, PointValue, QueryResult, RawResult, RelationshipValue,
};
use serde_json::{Map, Value};

/// Largest integer an IEEE-754 double represents exactly
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Turn a raw result into serialisable records keyed by column name
pub fn shape(raw: RawResult) -> QueryResult {
    let RawResult {
        columns,
        rows,
        counters,
    } = raw;

    let records = rows
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .cloned()
                .zip(row.iter().map(to_json))
                .collect::<Map<String, Value>>()
        })
        .collect();

    QueryResult {
        records,
        columns,
        counters,
    }
}

/// Convert one value to JSON
///
/// Integers outside the exactly representable range become decimal strings,
/// non-finite floats their names, and bytes base64 text.
pub fn to_json(value: &GraphValue) -> Value {
    match value {
        GraphValue::Null => Value::Null,
        GraphValue::Boolean(b) => Value::Bool(*b),
        GraphValue::Integer(i) => {
            if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(i) {
                Value::from(*i)
            } else {
                Value::String(i.to_string())
            }
        }
        GraphValue::Float(f) => float_to_json(*f),
        GraphValue::String(s) => Value::String(s.clone()),
        GraphValue::Bytes(bytes) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        GraphValue::List(items) => Value::Array(items.iter().map(to_json).collect()),
        GraphValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
        GraphValue::Node(node) => node_to_json(node),
        GraphValue::Relationship(rel) => relationship_to_json(rel),
        GraphValue::Path(path) => {
            let mut object = Map::new();
            object.insert(
                "nodes".to_string(),
                Value::Array(path.nodes.iter().map(node_to_json).collect()),
            );
            object.insert(
                "relationships".to_string(),
                Value::Array(path.relationships.iter().map(relationship_to_json).collect()),
            );
            Value::Object(object)
        }
        GraphValue::Point(point) => point_to_json(point),
        GraphValue::Temporal(text) => Value::String(text.clone()),
    }
}

/// `{srid, x, y}` plus `z` for 3D points
fn point_to_json(point: &PointValue) -> Value {
    let mut object = Map::new();
    object.insert("srid".to_string(), integer_to_json(point.srid));
    object.insert("x".to_string(), float_to_json(point.x));
    object.insert("y".to_string(), float_to_json(point.y));
    if let Some(z) = point.z {
        object.insert("z".to_string(), float_to_json(z));
    }
    Value::Object(object)
}

fn float_to_json(f: f64) -> Value {
    if f.is_nan() {
        Value::String("NaN".to_string())
    } else if f.is_infinite() {
        let name = if f > 0.0 { "Infinity" } else { "-Infinity" };
        Value::String(name.to_string())
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn integer_to_json(i: i64) -> Value {
    to_json(&GraphValue::Integer(i))
}

/// Properties plus `_id` and `_labels`; metadata wins over same-named
/// properties
fn node_to_json(node: &NodeValue) -> Value {
    let mut object: Map<String, Value> = node
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), to_json(v)))
        .collect();
    object.insert("_id".to_string(), integer_to_json(node.id));
    object.insert(
        "_labels".to_string(),
        Value::Array(node.labels.iter().cloned().map(Value::String).collect()),
    );
    Value::Object(object)
}

fn relationship_to_json(rel: &RelationshipValue) -> Value {
    let mut object: Map<String, Value> = rel
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), to_json(v)))
        .collect();
    object.insert("_id".to_string(), integer_to_json(rel.id));
    object.insert("_type".to_string(), Value::String(rel.rel_type.clone()));
    object.insert("_start".to_string(), integer_to_json(rel.start));
    object.insert("_end".to_string(), integer_to_json(rel.end));
    Value::Object(object)
}
