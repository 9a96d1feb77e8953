//! Typed identifiers.
//!
//! Workflows, nodes and connections are identified by ULIDs wrapped in
//! distinct types, so a node ID can never be passed where a connection ID
//! is expected. IDs display with a short kind prefix (`node_01J...`) and
//! serialize as the bare ULID string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when a string is not a valid ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    /// The string carries another ID kind's prefix.
    WrongPrefix {
        expected: &'static str,
        found: String,
    },
    /// The ULID part is malformed.
    InvalidUlid { kind: &'static str, reason: String },
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPrefix { expected, found } => {
                write!(f, "expected a '{expected}_' id, found '{found}_'")
            }
            Self::InvalidUlid { kind, reason } => write!(f, "invalid {kind}: {reason}"),
        }
    }
}

impl std::error::Error for ParseIdError {}

fn parse_prefixed(kind: &'static str, prefix: &'static str, s: &str) -> Result<Ulid, ParseIdError> {
    let raw = match s.split_once('_') {
        Some((found, rest)) if found == prefix => rest,
        Some((found, _)) => {
            return Err(ParseIdError::WrongPrefix {
                expected: prefix,
                found: found.to_string(),
            });
        }
        None => s,
    };
    Ulid::from_string(raw).map_err(|e| ParseIdError::InvalidUlid {
        kind,
        reason: e.to_string(),
    })
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Display prefix of this ID kind.
            pub const PREFIX: &'static str = $prefix;

            /// Allocates a fresh ID.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0)
            }
        }

        /// Accepts both the prefixed display form and a bare ULID.
        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_prefixed(stringify!($name), Self::PREFIX, s).map(Self)
            }
        }
    };
}

typed_id!(
    /// Identifies a workflow.
    WorkflowId => "wf"
);

typed_id!(
    /// Identifies a node within a workflow graph.
    ///
    /// Allocated when the node is created, never reused.
    NodeId => "node"
);

typed_id!(
    /// Identifies a connection between two node ports.
    ConnectionId => "conn"
);
