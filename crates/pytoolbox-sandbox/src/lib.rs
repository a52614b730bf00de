//! Sandboxed Python execution for pytoolbox.
//!
//! - `env`: locate (and create) the workspace's sandbox environment
//! - `runner`: the [`Executor`] that stages, runs and cleans up scripts
//! - `common`: child process output capture shared with the collaborator crates

pub mod common;
pub mod env;
pub mod runner;

pub use env::locator::EnvironmentLocator;
pub use runner::{ExecutionRequest, ExecutionResult, Executor};
