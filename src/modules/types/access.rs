//! Session access modes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access mode of a borrowed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Statements must not mutate the graph
    Read,
    /// Unrestricted
    Write,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Read => write!(f, "read"),
            AccessMode::Write => write!(f, "write"),
        }
    }
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" | "r" => Ok(AccessMode::Read),
            "write" | "w" => Ok(AccessMode::Write),
            _ => Err(format!("Unknown access mode: {}", s)),
        }
    }
}

impl AccessMode {
    /// Returns true if this mode forbids graph mutation
    pub fn is_read(&self) -> bool {
        matches!(self, AccessMode::Read)
    }
}

/// Mode declared by the caller of a query tool
///
/// `Explicit` carries the caller's `read_only` flag from the generic
/// `run_query` tool and resolves exactly like the named variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    Read,
    Write,
    Explicit { read_only: bool },
}

impl QueryMode {
    /// The session access mode this declaration selects
    pub fn access_mode(&self) -> AccessMode {
        match self {
            QueryMode::Read | QueryMode::Explicit { read_only: true } => AccessMode::Read,
            QueryMode::Write | QueryMode::Explicit { read_only: false } => AccessMode::Write,
        }
    }
}

impl From<AccessMode> for QueryMode {
    fn from(mode: AccessMode) -> Self {
        match mode {
            AccessMode::Read => QueryMode::Read,
            AccessMode::Write => QueryMode::Write,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_mode_from_str() {
        assert_eq!(AccessMode::from_str("read").unwrap(), AccessMode::Read);
        assert_eq!(AccessMode::from_str("WRITE").unwrap(), AccessMode::Write);
        assert_eq!(AccessMode::from_str("r").unwrap(), AccessMode::Read);
        assert!(AccessMode::from_str("admin").is_err());
    }

    #[test]
    fn test_explicit_mode_resolves_like_named_modes() {
        assert_eq!(
            QueryMode::Explicit { read_only: true }.access_mode(),
            QueryMode::Read.access_mode()
        );
        assert_eq!(
            QueryMode::Explicit { read_only: false }.access_mode(),
            QueryMode::Write.access_mode()
        );
    }

    #[test]
    fn test_access_mode_serde() {
        let json = serde_json::to_string(&AccessMode::Read).unwrap();
        assert_eq!(json, "\"read\"");

        let mode: AccessMode = serde_json::from_str("\"write\"").unwrap();
        assert_eq!(mode, AccessMode::Write);
    }
}
