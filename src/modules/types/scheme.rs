//! Bolt URI scheme definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported Bolt URI schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UriScheme {
    /// Direct connection, plain text
    #[serde(rename = "bolt")]
    Bolt,
    /// Direct connection, TLS with full certificate checks
    #[serde(rename = "bolt+s")]
    BoltSecure,
    /// Routed connection, plain text
    #[serde(rename = "neo4j")]
    Neo4j,
    /// Routed connection, TLS with full certificate checks
    #[serde(rename = "neo4j+s")]
    Neo4jSecure,
}

impl fmt::Display for UriScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriScheme::Bolt => write!(f, "bolt"),
            UriScheme::BoltSecure => write!(f, "bolt+s"),
            UriScheme::Neo4j => write!(f, "neo4j"),
            UriScheme::Neo4jSecure => write!(f, "neo4j+s"),
        }
    }
}

impl FromStr for UriScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bolt" => Ok(UriScheme::Bolt),
            "bolt+s" => Ok(UriScheme::BoltSecure),
            "neo4j" => Ok(UriScheme::Neo4j),
            "neo4j+s" => Ok(UriScheme::Neo4jSecure),
            _ => Err(format!(
                "Unknown URI scheme '{}': must be one of bolt, bolt+s, neo4j, neo4j+s",
                s
            )),
        }
    }
}

impl UriScheme {
    /// Returns all supported schemes
    pub fn all() -> &'static [UriScheme] {
        &[
            UriScheme::Bolt,
            UriScheme::BoltSecure,
            UriScheme::Neo4j,
            UriScheme::Neo4jSecure,
        ]
    }

    /// Returns true if the scheme itself mandates TLS
    pub fn is_secure(&self) -> bool {
        matches!(self, UriScheme::BoltSecure | UriScheme::Neo4jSecure)
    }

    /// Returns true if the scheme uses cluster routing
    pub fn is_routing(&self) -> bool {
        matches!(self, UriScheme::Neo4j | UriScheme::Neo4jSecure)
    }

    /// The TLS variant of this scheme
    pub fn secured(&self) -> UriScheme {
        match self {
            UriScheme::Bolt | UriScheme::BoltSecure => UriScheme::BoltSecure,
            UriScheme::Neo4j | UriScheme::Neo4jSecure => UriScheme::Neo4jSecure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_from_str() {
        assert_eq!(UriScheme::from_str("bolt").unwrap(), UriScheme::Bolt);
        assert_eq!(UriScheme::from_str("bolt+s").unwrap(), UriScheme::BoltSecure);
        assert_eq!(UriScheme::from_str("NEO4J").unwrap(), UriScheme::Neo4j);
        assert_eq!(UriScheme::from_str("neo4j+s").unwrap(), UriScheme::Neo4jSecure);
        assert!(UriScheme::from_str("http").is_err());
        assert!(UriScheme::from_str("bolt+ssc").is_err());
    }

    #[test]
    fn test_scheme_display_round_trips_through_from_str() {
        for scheme in UriScheme::all() {
            assert_eq!(UriScheme::from_str(&scheme.to_string()).unwrap(), *scheme);
        }
    }

    #[test]
    fn test_secured() {
        assert_eq!(UriScheme::Bolt.secured(), UriScheme::BoltSecure);
        assert_eq!(UriScheme::Neo4j.secured(), UriScheme::Neo4jSecure);
        assert_eq!(UriScheme::Neo4jSecure.secured(), UriScheme::Neo4jSecure);
        assert!(!UriScheme::Bolt.is_secure());
        assert!(UriScheme::Neo4j.is_routing());
    }

    #[test]
    fn test_scheme_serde() {
        let json = serde_json::to_string(&UriScheme::BoltSecure).unwrap();
        assert_eq!(json, "\"bolt+s\"");

        let scheme: UriScheme = serde_json::from_str("\"neo4j\"").unwrap();
        assert_eq!(scheme, UriScheme::Neo4j);
    }
}
