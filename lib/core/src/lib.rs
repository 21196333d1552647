//! Core domain types for the weft automation platform.
//!
//! This crate provides the foundation shared by every other weft crate:
//!
//! - **Typed IDs**: ULID-backed identifiers for workflows, executions,
//!   credentials, forms, and users
//! - **Error handling**: the `Result` alias used across the platform

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{CredentialId, ExecutionId, FormId, ParseIdError, UserId, WorkflowId};
