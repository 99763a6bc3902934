//! Newtype domain identifiers.
//!
//! Route parameters and runner-assigned identities are all strings on the
//! wire. Wrapping each in its own newtype prevents accidentally passing, for
//! example, a [`JobName`] where a [`Namespace`] is expected.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// An identifier was given as an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0} must not be empty")]
pub struct EmptyIdentifier(&'static str);

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and
// serde impls that go through new() so an empty string never deserializes.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = EmptyIdentifier;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(EmptyIdentifier(stringify!($name)))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: route parameters
// ---------------------------------------------------------------------------

string_id! {
    /// Logical grouping of jobs, taken verbatim from the `{namespace}` route
    /// segment.
    Namespace
}

string_id! {
    /// Name of the job to launch, taken verbatim from the `{name}` route
    /// segment.
    JobName
}

// ---------------------------------------------------------------------------
// Identifiers: runner-assigned
// ---------------------------------------------------------------------------

string_id! {
    /// Identity the Job Runner assigned to one execution of a job.
    ExecutionId
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one inbound trigger request.
///
/// Generated fresh for every webhook delivery and recorded on the request span
/// so every log line from one delivery can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId(Uuid);

impl TriggerId {
    /// Generates a new random trigger identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
