//! smartjob-trigger Job Runner adapter.
//!
//! Implements the [`trigger::JobRunner`] trait over the job-runner HTTP API:
//!
//! - `POST v1/executions` with `{"mode", "job"}` submits a job and answers
//!   `{"execution_id", "log_url"}`.
//! - `GET v1/executions/{id}` reports `{"execution_id", "log_url", "state",
//!   "json_output"}`.
//!
//! Schedule mode is a single `POST`. Run mode submits, then polls at a fixed
//! interval until the execution reaches a terminal state. A failed status poll
//! is retried; only [`MAX_CONSECUTIVE_POLL_FAILURES`] failures in a row end the
//! run with an error.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport, URL layout and status polling live here. The
//! [`trigger`] crate sees only [`trigger::JobRunner`].

#[macro_use]
extern crate tracing;

mod client;
mod config;
mod wire;

pub use client::{HttpJobRunner, MAX_CONSECUTIVE_POLL_FAILURES};
pub use config::{
    RunnerConfig, DEFAULT_POLL_SECONDS, DEFAULT_RUNNER_URL, POLL_SECONDS_VAR, RUNNER_URL_VAR,
};
pub use wire::{ExecutionState, ExecutionStatus, SubmitResponse};
