//! Preview configuration management for `preview.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [serve], [liveness], [events]
//! ├── types/         # ConfigError
//! ├── util.rs        # config file lookup, path resolution
//! └── mod.rs         # PreviewConfig (this file)
//! ```
//!
//! The file is optional. Without one every field takes its default and
//! the project root is the current directory.

pub mod section;
pub mod types;
mod util;

use util::{find_config_file, resolve_against};

pub use section::{EventsConfig, LivenessConfig, ServeConfig};
pub use types::ConfigError;

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing preview.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Project root directory - parent of config file or cwd (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Producer heartbeat settings
    #[serde(default)]
    pub liveness: LivenessConfig,

    /// Event stream settings
    #[serde(default)]
    pub events: EventsConfig,
}

impl PreviewConfig {
    /// Load configuration for the given command line.
    ///
    /// Searches upward from cwd for the config file; a missing file is not an
    /// error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = Some(path);
                config
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                Self {
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        config.finalize(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());

        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve paths against the root and apply command-line overrides.
    fn finalize(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        if let Commands::Serve {
            interface,
            port,
            docs,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.docs, docs.as_ref());
        }

        self.root = crate::utils::path::normalize_path(&self.root);
        self.serve.docs = resolve_against(&self.root, &self.serve.docs);
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Directory holding the diary entries.
    pub fn docs_root(&self) -> PathBuf {
        self.serve.docs.clone()
    }

    /// Base URL producers use to reach the server.
    ///
    /// An unspecified bind address (`0.0.0.0`, `::`) is reached via loopback.
    pub fn server_url(&self) -> String {
        let interface = if self.serve.interface.is_unspecified() {
            std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)
        } else {
            self.serve.interface
        };
        let addr = std::net::SocketAddr::new(interface, self.serve.port);
        format!("http://{addr}")
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("liveness.timeout_ms", self.liveness.timeout_ms),
            ("liveness.check_interval_ms", self.liveness.check_interval_ms),
            ("liveness.heartbeat_interval_ms", self.liveness.heartbeat_interval_ms),
            ("events.keepalive_ms", self.events.keepalive_ms),
            ("events.idle_check_ms", self.events.idle_check_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Validation(format!("`{name}` must be greater than 0")));
        }

        if self.liveness.check_interval_ms > self.liveness.timeout_ms {
            return Err(ConfigError::Validation(format!(
                "`liveness.check_interval_ms` ({}) must not exceed `liveness.timeout_ms` ({})",
                self.liveness.check_interval_ms, self.liveness.timeout_ms
            )));
        }

        if self.serve.workers == 0 {
            return Err(ConfigError::Validation(
                "`serve.workers` must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// Parse a config snippet, failing on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PreviewConfig {
    let (parsed, ignored) = PreviewConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(PreviewConfig::parse_with_ignored("[serve\nport = 1").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[serve]\nport = 9000\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = PreviewConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.serve.port, 9000);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(PreviewConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = test_parse_config("[liveness]\ntimeout_ms = 0");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("liveness.timeout_ms"));

        let config = test_parse_config("[events]\nkeepalive_ms = 0");
        assert!(config.validate().is_err());

        let config = test_parse_config("[events]\nidle_check_ms = 0");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("events.idle_check_ms"));
    }

    #[test]
    fn test_check_interval_must_fit_timeout() {
        let config = test_parse_config("[liveness]\ntimeout_ms = 1000\ncheck_interval_ms = 2000");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = test_parse_config("[serve]\nworkers = 0");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_url() {
        let mut config = PreviewConfig::default();
        assert_eq!(config.server_url(), "http://127.0.0.1:8001");

        config.serve.interface = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        config.serve.port = 9000;
        assert_eq!(config.server_url(), "http://127.0.0.1:9000");

        config.serve.interface = IpAddr::V6(Ipv6Addr::LOCALHOST);
        assert_eq!(config.server_url(), "http://[::1]:9000");
    }

    #[test]
    fn test_finalize_applies_serve_overrides() {
        let temp = tempfile::TempDir::new().unwrap();
        let cli = Cli::parse_from(["diary-preview", "serve", "-p", "9100", "-d", "journal"]);

        let mut config = PreviewConfig {
            root: temp.path().to_path_buf(),
            ..PreviewConfig::default()
        };
        config.finalize(&cli);

        assert_eq!(config.serve.port, 9100);
        assert!(config.docs_root().ends_with("journal"));
        assert!(config.docs_root().is_absolute());
    }

    #[test]
    fn test_finalize_ignores_serve_flags_for_other_commands() {
        let temp = tempfile::TempDir::new().unwrap();
        let cli = Cli::parse_from(["diary-preview", "pointer"]);

        let mut config = PreviewConfig {
            root: temp.path().to_path_buf(),
            ..PreviewConfig::default()
        };
        config.finalize(&cli);

        assert_eq!(config.serve.port, 8001);
        assert!(config.docs_root().ends_with("docs"));
    }
}
