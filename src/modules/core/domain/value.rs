//! Values returned by the graph database

use std::collections::BTreeMap;

/// A single value as decoded by a backend, before shaping into JSON
#[derive(Debug, Clone, PartialEq)]
pub enum GraphValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<GraphValue>),
    Map(BTreeMap<String, GraphValue>),
    Node(NodeValue),
    Relationship(RelationshipValue),
    Path(PathValue),
    Point(PointValue),
    /// Dates, times and durations in their ISO-8601 text form
    Temporal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeValue {
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: BTreeMap<String, GraphValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipValue {
    pub id: i64,
    pub start: i64,
    pub end: i64,
    pub rel_type: String,
    pub properties: BTreeMap<String, GraphValue>,
}

/// Spatial point in a coordinate reference system
#[derive(Debug, Clone, PartialEq)]
pub struct PointValue {
    pub srid: i64,
    pub x: f64,
    pub y: f64,
    /// Present for 3D points only
    pub z: Option<f64>,
}

/// Alternating walk of nodes and relationships
#[derive(Debug, Clone, PartialEq)]
pub struct PathValue {
    pub nodes: Vec<NodeValue>,
    pub relationships: Vec<RelationshipValue>,
}

impl GraphValue {
    /// Convert a JSON parameter value into a graph value
    ///
    /// Integral JSON numbers become integers, everything else numeric a float.
    pub fn from_json(value: &serde_json::Value) -> GraphValue {
        match value {
            serde_json::Value::Null => GraphValue::Null,
            serde_json::Value::Bool(b) => GraphValue::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => GraphValue::Integer(i),
                None => GraphValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => GraphValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                GraphValue::List(items.iter().map(GraphValue::from_json).collect())
            }
            serde_json::Value::Object(map) => GraphValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), GraphValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GraphValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GraphValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[GraphValue]> {
        match self {
            GraphValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, GraphValue::Null)
    }
}

impl From<bool> for GraphValue {
    fn from(value: bool) -> Self {
        GraphValue::Boolean(value)
    }
}

impl From<i64> for GraphValue {
    fn from(value: i64) -> Self {
        GraphValue::Integer(value)
    }
}

impl From<f64> for GraphValue {
    fn from(value: f64) -> Self {
        GraphValue::Float(value)
    }
}

impl From<&str> for GraphValue {
    fn from(value: &str) -> Self {
        GraphValue::String(value.to_string())
    }
}

impl From<String> for GraphValue {
    fn from(value: String) -> Self {
        GraphValue::String(value)
    }
}

impl<T: Into<GraphValue>> From<Vec<T>> for GraphValue {
    fn from(values: Vec<T>) -> Self {
        GraphValue::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = GraphValue::from_json(&json!({
            "name": "Alice",
            "age": 42,
            "score": 1.5,
            "tags": ["a", null],
            "active": true
        }));
        let GraphValue::Map(map) = value else {
            panic!("expected a map");
        };
        assert_eq!(map["name"], GraphValue::from("Alice"));
        assert_eq!(map["age"], GraphValue::Integer(42));
        assert_eq!(map["score"], GraphValue::Float(1.5));
        assert_eq!(
            map["tags"],
            GraphValue::List(vec![GraphValue::from("a"), GraphValue::Null])
        );
        assert_eq!(map["active"], GraphValue::Boolean(true));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(GraphValue::from("x").as_str(), Some("x"));
        assert_eq!(GraphValue::from(7i64).as_i64(), Some(7));
        assert_eq!(GraphValue::from(vec!["a", "b"]).as_list().map(|l| l.len()), Some(2));
        assert!(GraphValue::Null.is_null());
        assert!(GraphValue::from(true).as_str().is_none());
    }
}
