//! Eligibility, application and allocation workflow engine for build-to-order housing projects.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
