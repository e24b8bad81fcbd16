use std::path::{Path, PathBuf};

use anyhow::Context;
use quire_state::PersistedState;
use quire_store::StateSink;

/// Writes the durable projection as pretty JSON, replacing the file whole.
pub struct JsonFileSink {
	path: PathBuf,
}

impl JsonFileSink {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl StateSink for JsonFileSink {
	fn persist(&self, state: &PersistedState) -> anyhow::Result<()> {
		let json = serde_json::to_vec_pretty(state).context("encoding state")?;
		if let Some(parent) = self.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			std::fs::create_dir_all(parent)
				.with_context(|| format!("creating {}", parent.display()))?;
		}
		let tmp = self.path.with_extension("json.tmp");
		std::fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
		std::fs::rename(&tmp, &self.path)
			.with_context(|| format!("replacing {}", self.path.display()))?;
		Ok(())
	}
}

/// Reads a state file written by [`JsonFileSink`]. `None` when absent.
pub fn load_persisted(path: &Path) -> anyhow::Result<Option<PersistedState>> {
	let bytes = match std::fs::read(path) {
		Ok(bytes) => bytes,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
		Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
	};
	let state = serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?;
	Ok(Some(state))
}
