//! Error types for the trigger domain.
//!
//! [`ValidationError`] covers malformed or unsupported inbound events and is
//! always the caller's fault. [`ConfigurationError`] is only produced while the
//! process starts. [`DispatchError`] covers everything that can go wrong after
//! a valid job request has been handed to the Job Runner.
//!
//! Runner transport failures are defined next to the port in
//! [`crate::runner`].

use thiserror::Error;

use crate::runner::RunnerError;

// ---------------------------------------------------------------------------
// Event validation
// ---------------------------------------------------------------------------

/// An inbound event violated a precondition of extraction.
///
/// Every variant names the exact field or condition that failed so the
/// producer of a malformed event can diagnose it from the response alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The request body parsed as JSON but is not an object.
    #[error("event body must be a JSON object")]
    NotAnObject,

    /// Neither the `kind` nor the `@type` discriminator matched a known shape.
    #[error("unrecognized event shape: neither 'kind' nor '@type' names a supported event")]
    UnrecognizedShape,

    /// A required field is absent (or `null`).
    #[error("missing required field '{field}'")]
    MissingField {
        /// Dotted path of the missing field (e.g. `protoPayload.resourceName`).
        field: &'static str,
    },

    /// A required field is present but has the wrong JSON type.
    #[error("field '{field}' must be a {expected}")]
    WrongType {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Expected JSON type, e.g. `"string"`.
        expected: &'static str,
    },

    /// `kind` is present but is not `storage#object`.
    #[error("kind must be 'storage#object', got '{found}'")]
    UnexpectedKind {
        /// The `kind` value that was received.
        found: String,
    },

    /// The object `id` does not begin with the bucket name.
    #[error("id must start with bucket")]
    IdMustStartWithBucket,

    /// The object `id` does not end with `/<generation>`.
    #[error("id must end with generation")]
    IdMustEndWithGeneration,

    /// Bucket and generation match but nothing usable sits between them.
    #[error("id must contain an object path between bucket and generation")]
    IdMissingObjectPath,

    /// `protoPayload.resourceName` lacks the `projects/_/buckets/` prefix.
    #[error("resourceName must start with 'projects/_/buckets/'")]
    ResourceNamePrefix,

    /// `protoPayload.resourceName` has the prefix but not the
    /// `projects/_/buckets/<bucket>/objects/<path>` layout.
    #[error("bad resourceName format")]
    ResourceNameFormat,
}

// ---------------------------------------------------------------------------
// Startup configuration
// ---------------------------------------------------------------------------

/// Process configuration is missing or unusable.
///
/// Produced at startup only; the gateway never starts serving with an invalid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A mandatory environment variable is absent or empty.
    #[error("missing mandatory environment variable {variable}")]
    Missing {
        /// Name of the variable.
        variable: String,
    },

    /// An environment variable is present but cannot be parsed.
    #[error("invalid value '{value}' for {variable}: {reason}")]
    Invalid {
        /// Name of the variable.
        variable: String,
        /// The raw value that was rejected.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// A job request could not be dispatched, or the job it launched failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The Job Runner reported a non-success terminal outcome (run mode only).
    #[error("Job launch failed, job_log_url={log_url}")]
    JobFailed {
        /// Where the job's logs can be inspected.
        log_url: String,
    },

    /// The Job Runner could not accept or track the request.
    #[error(transparent)]
    Runner(#[from] RunnerError),
}
