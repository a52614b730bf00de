//! pytoolbox configuration layer.
//!
//! All environment variable reads live here; business code goes through the
//! structured configs instead of calling `std::env::var`.
//!
//! - `loader`: `env_or`, `env_optional`, `env_bool` helpers and `.env` loading
//! - `schema`: `PathsConfig`, `ExecutionConfig`, `ToolsConfig`, `ObservabilityConfig`
//! - `env_keys`: key constants

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or, load_dotenv};
pub use schema::{ExecutionConfig, ObservabilityConfig, PathsConfig, ToolSelection, ToolsConfig};
