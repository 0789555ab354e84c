//! MCP prompts

use neo4j_mcp_types::runtime::{error_codes, McpError};
use serde_json::{json, Value};

pub const CYPHER_QUERY_HELP: &str = "cypher_query_help";

const CYPHER_QUERY_HELP_TEXT: &str = r#"# Cypher Query Help

## Reading data
```cypher
// Nodes with a label
MATCH (n:Person) RETURN n LIMIT 25

// Match on properties, passing values as parameters
MATCH (p:Person {name: $name}) RETURN p

// Follow relationships
MATCH (p:Person)-[r:KNOWS]->(friend) RETURN p.name, type(r), friend.name

// Variable-length paths
MATCH (start:Person {name: $name})-[:KNOWS*1..3]-(other)
RETURN DISTINCT other.name
```

## Writing data
```cypher
CREATE (p:Person {name: $name, age: $age}) RETURN p

MATCH (a:Person {name: $a}), (b:Person {name: $b})
MERGE (a)-[:KNOWS]->(b)

MATCH (p:Person {name: $name}) SET p.age = $age

MATCH (p:Person {name: $name}) DETACH DELETE p
```

## Schema
```cypher
CALL db.labels()
CALL db.relationshipTypes()
CALL db.propertyKeys()
SHOW CONSTRAINTS
SHOW INDEXES
```

## Aggregation
```cypher
MATCH (p:Person)-[:KNOWS]->(friend)
RETURN p.name, count(friend) AS friends
ORDER BY friends DESC
```

## Practices
1. Pass values through `parameters` and reference them as `$name`; never splice them into the query text.
2. Use `run_read_query` for anything that only reads; write clauses are rejected there.
3. Add `LIMIT` to exploratory queries.
4. Call `get_schema` first to learn the labels, relationship types and property keys.
5. Prefix a query with `EXPLAIN` to check its plan without running it.
"#;

/// Prompt descriptors returned by `prompts/list`
pub fn definitions() -> Vec<Value> {
    vec![json!({
        "name": CYPHER_QUERY_HELP,
        "description": "Cypher syntax reference with examples for reading, writing and schema inspection",
        "arguments": []
    })]
}

/// Render one prompt
pub fn get(name: &str) -> Result<Value, McpError> {
    match name {
        CYPHER_QUERY_HELP => Ok(json!({
            "description": "Cypher syntax reference",
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": CYPHER_QUERY_HELP_TEXT }
            }]
        })),
        _ => Err(McpError {
            code: error_codes::INVALID_PARAMS,
            message: format!("Unknown prompt: {}", name),
            data: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cypher_query_help() {
        let prompt = get(CYPHER_QUERY_HELP).unwrap();
        let text = prompt["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("$name"));
        assert!(text.contains("CALL db.labels()"));
    }

    #[test]
    fn test_unknown_prompt() {
        assert_eq!(get("sql_help").unwrap_err().code, error_codes::INVALID_PARAMS);
    }
}
