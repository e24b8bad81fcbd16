//! Host configuration, read from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::DuplicateServicePolicy;

const DEFAULT_STATUS_TIMEOUT_MS: u64 = 4000;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("I/O error reading {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	#[error("invalid config{}: {error}", .path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
	Parse {
		path: Option<PathBuf>,
		error: toml::de::Error,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
	/// Auto-dismiss delay for status banners shown with the default timeout.
	pub status_timeout_ms: u64,
	pub service_policy: DuplicateServicePolicy,
	/// Installs the tracing middleware ahead of every plugin middleware.
	pub log_middleware: bool,
}

impl Default for HostConfig {
	fn default() -> Self {
		Self {
			status_timeout_ms: DEFAULT_STATUS_TIMEOUT_MS,
			service_policy: DuplicateServicePolicy::default(),
			log_middleware: false,
		}
	}
}

impl HostConfig {
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		toml::from_str(input).map_err(|error| ConfigError::Parse { path: None, error })
	}

	/// Reads `path`. A missing file yields the defaults.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = match std::fs::read_to_string(path) {
			Ok(content) => content,
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
			Err(error) => {
				return Err(ConfigError::Io {
					path: path.to_path_buf(),
					error,
				});
			}
		};
		toml::from_str(&content).map_err(|error| ConfigError::Parse {
			path: Some(path.to_path_buf()),
			error,
		})
	}

	pub fn status_timeout(&self) -> Duration {
		Duration::from_millis(self.status_timeout_ms)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_input_gives_defaults() {
		assert_eq!(HostConfig::from_toml_str("").unwrap(), HostConfig::default());
		assert_eq!(HostConfig::default().status_timeout(), Duration::from_secs(4));
	}

	#[test]
	fn parses_every_field() {
		let config = HostConfig::from_toml_str(
			r#"
			status_timeout_ms = 250
			service_policy = "first-wins"
			log_middleware = true
			"#,
		)
		.unwrap();
		assert_eq!(
			config,
			HostConfig {
				status_timeout_ms: 250,
				service_policy: DuplicateServicePolicy::FirstWins,
				log_middleware: true,
			}
		);
	}

	#[test]
	fn unknown_keys_and_bad_values_are_errors() {
		assert!(matches!(
			HostConfig::from_toml_str("colour = \"red\""),
			Err(ConfigError::Parse { path: None, .. })
		));
		assert!(HostConfig::from_toml_str("service_policy = \"random\"").is_err());
	}

	#[test]
	fn missing_file_gives_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let config = HostConfig::load(dir.path().join("absent.toml")).unwrap();
		assert_eq!(config, HostConfig::default());
	}

	#[test]
	fn load_reports_path_on_parse_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("host.toml");
		std::fs::write(&path, "status_timeout_ms = \"soon\"").unwrap();

		let err = HostConfig::load(&path).unwrap_err();
		assert!(err.to_string().contains("host.toml"));
	}
}
