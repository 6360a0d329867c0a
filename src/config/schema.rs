//! TOML configuration schema types for the dashboard core.
//!
//! All structs derive `Deserialize`/`Serialize` with defaults via
//! `#[serde(default)]`. Duration fields use human-readable strings
//! (e.g. `"5m"`, `"30s"`, `"250ms"`) parsed by the `humantime` crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::providers::default_area_definitions;
use crate::WidgetAreaDefinition;

/// Root configuration for the orchestration core.
///
/// Corresponds to the TOML structure:
/// ```toml
/// seed_defaults = true
///
/// [cache]
/// ttl = "5m"
///
/// [[areas]]
/// code = "admin.dashboard.main"
/// name = "Admin Dashboard (Main)"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Whether bootstrap should create the starter widget assignments.
    pub seed_defaults: bool,
    /// Render cache settings.
    pub cache: CacheConfig,
    /// Canonical area working set; empty means the built-in three areas.
    pub areas: Vec<AreaConfig>,
}

impl DashboardConfig {
    /// Parses the configured render cache TTL.
    pub fn cache_ttl(&self) -> Result<Duration, ConfigError> {
        self.cache.ttl()
    }

    /// Returns the configured area working set, falling back to the
    /// built-in areas when none are declared.
    pub fn area_definitions(&self) -> Vec<WidgetAreaDefinition> {
        if self.areas.is_empty() {
            return default_area_definitions();
        }
        self.areas
            .iter()
            .map(|area| WidgetAreaDefinition {
                code: area.code.clone(),
                name: area.name.clone(),
                description: area.description.clone(),
            })
            .collect()
    }
}

/// Render cache settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime as a human-readable duration string. `"0s"` disables
    /// caching (pass-through).
    pub ttl: String,
}

impl CacheConfig {
    fn ttl(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.ttl).map_err(|err| ConfigError::InvalidDuration {
            field: "cache.ttl",
            value: self.ttl.clone(),
            message: err.to_string(),
        })
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: "5m".to_string(),
        }
    }
}

/// One configured dashboard area.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AreaConfig {
    /// Unique area code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}
