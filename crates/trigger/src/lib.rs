//! Core domain for smartjob-trigger.
//!
//! This crate turns a cloud-storage change notification into a normalized
//! job-launch request and hands it to a Job Runner. Infrastructure crates
//! implement the [`JobRunner`] port defined here and expose the HTTP surface;
//! they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`Namespace`, `JobName`, `ExecutionId`, `TriggerId`) |
//! | [`types`] | Value types (`ObjectReference`, `ResourceSpec`, `Placement`, `Timestamp`) |
//! | [`errors`] | Validation, configuration and dispatch errors |
//! | [`event`] | Event classification and object reference extraction |
//! | [`config`] | Process-wide configuration read from the environment |
//! | [`request`] | `JobRequest` and its builder |
//! | [`runner`] | The `JobRunner` port |
//! | [`dispatch`] | Schedule / run dispatch on top of a `JobRunner` |

#[macro_use]
extern crate tracing;

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod event;
pub mod identifiers;
pub mod request;
pub mod runner;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{process_vars, GatewayConfig, JobDefaults};
pub use dispatch::Dispatcher;
pub use errors::{ConfigurationError, DispatchError, ValidationError};
pub use event::{classify, extract, AuditCreateEvent, FinalizedEvent, StorageEvent};
pub use identifiers::{EmptyIdentifier, ExecutionId, JobName, Namespace, TriggerId};
pub use request::{build_job_request, DispatchMode, JobRequest, TriggerContext, INPUT_PATH_VAR};
pub use runner::{DispatchOutcome, ExecutionHandle, JobRunner, RunnerError};
pub use types::{ObjectReference, Placement, ResourceSpec, Timestamp};
