//! Node executors for the weft engine.
//!
//! One executor per node type, each following the same shape: resolve
//! credentials, resolve templated config through the execution context,
//! perform exactly one outbound call, and return the result object exposed
//! to downstream templates as `$node.<id>`. [`PlatformNodeRunner`] is the
//! dispatching [`weft_workflow::NodeRunner`] the worker plugs into the
//! coordinator.

pub mod chat;
pub mod email;
pub mod form;
pub mod llm;
pub mod runner;

pub use runner::PlatformNodeRunner;
