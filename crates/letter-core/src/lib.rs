//! Core abstractions for market-newsletter
//!
//! This crate defines the role [`Agent`] trait shared by the newsletter crew,
//! the [`Context`] blackboard the roles pass results through, and the core
//! error type.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::Context;
pub use error::{Error, Result};
