//! Database models for the Suguard grant store.

use serde::{Deserialize, Serialize};

/// Elevated-privilege grant record from the database.
///
/// `decision`, `notify`, and `logging` are stored as raw integers; use
/// [`Decision::from_raw`] and flag comparisons when lifting into domain types.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GrantRecord {
    pub uid: i64,
    pub decision: i64,
    pub notify: i64,
    pub logging: i64,
    pub updated_at: i64,
}

impl GrantRecord {
    /// Lift the raw decision column into the domain enum.
    pub const fn decision(&self) -> Decision {
        Decision::from_raw(self.decision)
    }
}

/// Tri-state authorization decision.
///
/// Ordered so that `Allow` is the greatest value: a mutation persists a
/// record only when the new decision is at least `Allow`, anything below
/// deletes the record instead (deny is encoded as absence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Decision {
    /// No decision yet; treated as "ask".
    Query,
    /// Explicit refusal. Never persisted by the engine.
    Deny,
    /// Elevated access granted.
    Allow,
}

impl Decision {
    pub const fn as_raw(self) -> i64 {
        match self {
            Self::Query => 0,
            Self::Deny => 1,
            Self::Allow => 2,
        }
    }

    /// Unknown raw values collapse to `Query` so a corrupted row degrades to
    /// "ask" rather than a silent grant.
    pub const fn from_raw(raw: i64) -> Self {
        match raw {
            2 => Self::Allow,
            1 => Self::Deny,
            _ => Self::Query,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Query => "query",
            Self::Deny => "deny",
            Self::Allow => "allow",
        };
        write!(f, "{s}")
    }
}
