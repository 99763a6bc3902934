//! Shared value types for the trigger domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. an object reference never has an
//! empty bucket, resource quantities are positive and finite) and participate
//! in building job requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Object references
// ---------------------------------------------------------------------------

/// A storage object identified by its bucket and object path.
///
/// The path never carries the bucket prefix or a generation suffix; both are
/// stripped during extraction. Canonical string form is `gs://{bucket}/{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectReference {
    bucket: String,
    path: String,
}

impl ObjectReference {
    /// Creates an [`ObjectReference`], returning `None` if either part is empty.
    #[must_use]
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Option<Self> {
        let bucket = bucket.into();
        let path = path.into();
        if bucket.is_empty() || path.is_empty() {
            None
        } else {
            Some(Self { bucket, path })
        }
    }

    /// Returns the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the object path inside the bucket.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the canonical `gs://bucket/path` form.
    pub fn to_uri(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.path)
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Compute resources requested for one job execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Number of vCPUs (fractional values allowed).
    pub cpu: f64,
    /// Memory in gigabytes.
    pub memory_gb: f64,
    /// Explicit machine type; `None` lets the runner pick one from `cpu` and
    /// `memory_gb`.
    pub machine_type: Option<String>,
}

impl ResourceSpec {
    /// Default vCPU count.
    pub const DEFAULT_CPU: f64 = 1.0;
    /// Default memory in gigabytes.
    pub const DEFAULT_MEMORY_GB: f64 = 0.5;
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            cpu: Self::DEFAULT_CPU,
            memory_gb: Self::DEFAULT_MEMORY_GB,
            machine_type: None,
        }
    }
}

/// Where jobs are launched: cloud project, region, and staging location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub project: String,
    pub region: String,
    /// Staging location the runner may use for job artefacts (e.g. `gs://bucket/staging`).
    pub staging: String,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
