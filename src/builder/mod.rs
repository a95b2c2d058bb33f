//! Builder API for ergonomic configuration construction.
//!
//! This module provides a fluent builder and the `state_graph!` macro for
//! declaring machines with minimal boilerplate.

pub mod config;
pub mod error;
pub mod macros;

pub use config::ConfigBuilder;
pub use error::BuildError;
