//! Configuration file loader with position-aware error reporting.

use std::fs;
use std::path::Path;

use crate::config::error::ConfigError;
use crate::config::schema::DashboardConfig;

/// Stateless configuration loader.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from an explicit path.
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist, or
    /// [`ConfigError::Read`] for other I/O failures.
    pub fn load_from_path(path: &Path) -> Result<DashboardConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::parse_toml(&content, path)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist. Parse failures still surface as errors.
    pub fn load_or_default(path: &Path) -> Result<DashboardConfig, ConfigError> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            tracing::debug!("no config file at {:?}, using defaults", path);
            Ok(DashboardConfig::default())
        }
    }

    /// Parses a TOML string with position-aware error reporting.
    fn parse_toml(content: &str, path: &Path) -> Result<DashboardConfig, ConfigError> {
        toml::from_str(content).map_err(|e| {
            let (line, column) = e
                .span()
                .map(|span| {
                    let line = content[..span.start].matches('\n').count() + 1;
                    let last_newline = content[..span.start]
                        .rfind('\n')
                        .map(|p| p + 1)
                        .unwrap_or(0);
                    let column = span.start - last_newline + 1;
                    (line, column)
                })
                .unwrap_or((0, 0));
            ConfigError::Parse {
                path: path.to_path_buf(),
                line,
                column,
                message: e.message().to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn full_config_round_trips() {
        let file = write_config(
            r#"
seed_defaults = true

[cache]
ttl = "30s"

[[areas]]
code = "ops.dashboard.main"
name = "Operations"

[[areas]]
code = "ops.dashboard.side"
"#,
        );
        let config = ConfigLoader::load_from_path(file.path()).expect("config loads");
        assert!(config.seed_defaults);
        assert_eq!(config.cache_ttl().expect("ttl parses"), Duration::from_secs(30));
        let areas = config.area_definitions();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].code, "ops.dashboard.main");
        assert_eq!(areas[0].name, "Operations");
    }

    #[test]
    fn missing_file_errors_on_explicit_path() {
        let err = ConfigLoader::load_from_path(Path::new("/nonexistent/dashboard.toml"))
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn missing_file_defaults_with_load_or_default() {
        let config = ConfigLoader::load_or_default(Path::new("/nonexistent/dashboard.toml"))
            .expect("defaults");
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(
            config.area_definitions().len(),
            3,
            "defaults fall back to the built-in areas"
        );
    }

    #[test]
    fn parse_error_reports_position() {
        let file = write_config("[cache\nttl = \"5m\"\n");
        let err = ConfigLoader::load_from_path(file.path()).expect_err("invalid toml");
        match err {
            ConfigError::Parse { line, .. } => assert!(line >= 1),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_ttl_surfaces_field_name() {
        let file = write_config("[cache]\nttl = \"five minutes-ish\"\n");
        let config = ConfigLoader::load_from_path(file.path()).expect("toml parses");
        let err = config.cache_ttl().expect_err("bad duration");
        assert!(err.to_string().contains("cache.ttl"));
    }

    #[test]
    fn default_ttl_parses() {
        let config = DashboardConfig::default();
        assert_eq!(config.cache_ttl().expect("default ttl"), Duration::from_secs(300));
    }
}
