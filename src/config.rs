//! Configuration: environment selection, settings from env vars, and an
//! optional `practica.toml` file.
//!
//! Nothing here has side effects at load time; the resolved values are
//! handed to the store and server explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{Error, Result};

/// Deployment environment identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    /// Default connection string when DATABASE_URL is not set.
    pub fn default_database_url(&self) -> &'static str {
        match self {
            Environment::Development => "sqlite://practica.db",
            Environment::Test => "sqlite://:memory:",
            Environment::Production => "sqlite:///var/lib/practica/practica.db",
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" => Ok(Environment::Production),
            _ => Err(Error::Config(format!("unknown environment: {}", s))),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub database_url: String,
    pub debug: bool,
    pub log_sql: bool,
}

impl Settings {
    /// Default tracing directives when RUST_LOG is unset. `DEBUG` (or
    /// --verbose) lowers the base level; `LOG_SQL` additionally turns on
    /// trace output from the storage layer.
    pub fn log_directives(&self, verbose: bool) -> String {
        let mut directives = if verbose || self.debug {
            "debug".to_string()
        } else {
            "info".to_string()
        };
        if self.log_sql {
            directives.push_str(",practica::storage=trace");
        }
        directives
    }
}

/// Load settings from environment variables.
///
/// `PRACTICA_ENV` selects the environment (default: development);
/// `DATABASE_URL` overrides the per-environment default; `DEBUG` and
/// `LOG_SQL` are "true"/"false" flags.
pub fn load_settings_from_env() -> Result<Settings> {
    let environment: Environment = std::env::var("PRACTICA_ENV")
        .unwrap_or_else(|_| "development".to_string())
        .parse()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| environment.default_database_url().to_string());
    let debug = env_flag("DEBUG");
    let log_sql = env_flag("LOG_SQL");

    Ok(Settings {
        environment,
        database_url,
        debug,
        log_sql,
    })
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Optional config file, overriding env-derived settings where present.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PracticaConfig {
    pub database: Option<String>,
    pub port: Option<u16>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("practica.toml")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<PracticaConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: PracticaConfig =
        toml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &PracticaConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_default_database_urls() {
        assert_eq!(
            Environment::Test.default_database_url(),
            "sqlite://:memory:"
        );
        assert!(Environment::Production
            .default_database_url()
            .starts_with("sqlite://"));
    }

    #[test]
    fn test_log_directives() {
        let settings = Settings {
            environment: Environment::Development,
            database_url: "sqlite://practica.db".to_string(),
            debug: false,
            log_sql: false,
        };
        assert_eq!(settings.log_directives(false), "info");
        assert_eq!(settings.log_directives(true), "debug");

        let settings = Settings {
            debug: true,
            log_sql: true,
            ..settings
        };
        assert_eq!(
            settings.log_directives(false),
            "debug,practica::storage=trace"
        );
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("practica.toml");
        let config = PracticaConfig {
            database: Some("sqlite://test.db".to_string()),
            port: Some(4000),
        };
        write_config(&path, &config, false).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.database.as_deref(), Some("sqlite://test.db"));
        assert_eq!(loaded.port, Some(4000));

        // Second write without force refuses to clobber.
        assert!(write_config(&path, &config, false).is_err());
        assert!(write_config(&path, &config, true).is_ok());
    }
}
