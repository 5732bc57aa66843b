//! HTTP surface for the Scriptorium script generation pipeline.
//!
//! # Routes
//!
//! | Method | Path | Result |
//! |---|---|---|
//! | `POST` | `/generate` | new run |
//! | `POST` | `/select` | updated run |
//! | `POST` | `/evaluate` | updated run with evaluation |
//! | `GET` | `/runs/{run_id}` | run |
//! | `GET` | `/projects/{project_id}/runs` | project's runs, oldest first |
//! | `GET` | `/health` | status and active generator |
//!
//! Failures are returned as an [`ErrorEnvelope`] with a status derived from its
//! `kind`. Every response carries an `x-request-id` header.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod app;
mod config;
mod observability;

pub use api::{
    ApiError, ApiState, ErrorEnvelope, EvaluateBody, GenerateBody, ProjectRuns,
    REQUEST_ID_HEADER, RequestId, SelectBody, create_router, status_for,
};
pub use app::{build_pipeline, serve};
pub use config::{ProjectsConfig, ScriptoriumConfig, ServerConfig};
pub use observability::{LoggingConfig, init_logging};
