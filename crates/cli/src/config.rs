use std::path::{Path, PathBuf};

use quire_plugin::{ConfigError, HostConfig};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "quire.toml";
pub const DEFAULT_STATE_FILE: &str = "quire-state.json";

/// Contents of `quire.toml`.
///
/// ```toml
/// state_file = "notes.json"
///
/// [host]
/// status_timeout_ms = 4000
/// service_policy = "last-wins"
/// log_middleware = false
///
/// [plugins.auto-tag]
/// tag = "inbox"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
	pub state_file: Option<PathBuf>,
	pub host: HostConfig,
	/// Initial settings per plugin, applied when the state file has none.
	pub plugins: toml::Table,
}

impl CliConfig {
	/// Reads `path`; a missing file yields the defaults.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
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

	/// `--state` wins over `state_file`, which wins over the default.
	pub fn state_path(&self, flag: Option<&Path>) -> PathBuf {
		flag.map(Path::to_path_buf)
			.or_else(|| self.state_file.clone())
			.unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
	}
}
