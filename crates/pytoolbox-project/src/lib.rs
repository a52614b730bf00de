//! Python project management for pytoolbox.
//!
//! - `manager`: [`ProjectManager`], environment creation and pip operations
//! - `manifest`: dependency source resolution (requirements.txt / pyproject.toml)
//! - `inventory`: installed distributions
//! - `conflicts`: installed requirement checks, evaluated by `packaging`

pub mod conflicts;
pub mod inventory;
pub mod manager;
pub mod manifest;

pub use conflicts::Conflict;
pub use inventory::PackageInfo;
pub use manager::ProjectManager;
pub use manifest::DependencySource;
pub use pytoolbox_sandbox::env::builder::EnvStatus;
