//! TOML configuration schema and loader.
//!
//! Hosts embedding the core describe the dashboard working set in a TOML
//! file: the canonical areas, the render cache TTL, and whether to seed the
//! starter layout. Loading is optional — every field has a default and an
//! absent file yields [`DashboardConfig::default`].

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AreaConfig, CacheConfig, DashboardConfig};
