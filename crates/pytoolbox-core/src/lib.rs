pub mod config;
pub mod error;
pub mod observability;
pub mod path_validation;
pub mod workspace;

pub use error::{Result, ToolboxError};
pub use path_validation::PathGuard;
pub use workspace::WorkspaceRoot;
