//! Registered plugins and their lifecycle status.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::def::{PluginDef, Provides};
use crate::error::RegistrationError;
use crate::graph::DependencyNode;
use crate::services::AnyService;

/// `registered → activating → active | error`. Both end states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
	Registered,
	Activating,
	Active,
	Error,
}

impl PluginStatus {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Registered => "registered",
			Self::Activating => "activating",
			Self::Active => "active",
			Self::Error => "error",
		}
	}
}

impl fmt::Display for PluginStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(self.as_str())
	}
}

struct PluginEntry {
	def: Arc<PluginDef>,
	provides: Provides,
	status: PluginStatus,
	error: Option<String>,
	api: Option<AnyService>,
}

/// Plugins in registration order.
#[derive(Default)]
pub struct PluginRegistry {
	entries: IndexMap<String, PluginEntry>,
}

impl PluginRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Validates and stores `def` with status `registered`.
	pub fn register(&mut self, def: PluginDef) -> Result<(), RegistrationError> {
		if let Err(error) = self.validate(&def) {
			warn!(plugin = def.id(), error = %error, "plugin registration rejected");
			return Err(error);
		}

		let provides = def.provides();
		debug!(
			plugin = def.id(),
			dependencies = ?def.dependencies(),
			provides = ?provides,
			"plugin registered"
		);
		self.entries.insert(
			def.id().to_owned(),
			PluginEntry {
				def: Arc::new(def),
				provides,
				status: PluginStatus::Registered,
				error: None,
				api: None,
			},
		);
		Ok(())
	}

	fn validate(&self, def: &PluginDef) -> Result<(), RegistrationError> {
		let id = def.id();
		if id.trim().is_empty() {
			return Err(RegistrationError::MissingId);
		}
		if def.name().trim().is_empty() {
			return Err(RegistrationError::MissingName { id: id.to_owned() });
		}
		if !def.has_init() {
			return Err(RegistrationError::MissingInit { id: id.to_owned() });
		}
		if self.entries.contains_key(id) {
			return Err(RegistrationError::Duplicate { id: id.to_owned() });
		}
		Ok(())
	}

	pub fn contains(&self, id: &str) -> bool {
		self.entries.contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn ids(&self) -> Vec<String> {
		self.entries.keys().cloned().collect()
	}

	pub fn status(&self, id: &str) -> Option<PluginStatus> {
		self.entries.get(id).map(|entry| entry.status)
	}

	/// Message recorded when the plugin entered `error`.
	pub fn error(&self, id: &str) -> Option<&str> {
		self.entries.get(id).and_then(|entry| entry.error.as_deref())
	}

	pub fn provides(&self, id: &str) -> Option<Provides> {
		self.entries.get(id).map(|entry| entry.provides)
	}

	pub fn definition(&self, id: &str) -> Option<Arc<PluginDef>> {
		self.entries.get(id).map(|entry| Arc::clone(&entry.def))
	}

	/// `(id, status)` pairs in registration order.
	pub fn statuses(&self) -> Vec<(String, PluginStatus)> {
		self.entries
			.iter()
			.map(|(id, entry)| (id.clone(), entry.status))
			.collect()
	}

	pub(crate) fn dependency_graph(&self) -> Vec<DependencyNode> {
		self.entries
			.values()
			.map(|entry| DependencyNode::new(entry.def.id(), entry.def.dependencies().iter().cloned()))
			.collect()
	}

	pub(crate) fn set_status(&mut self, id: &str, status: PluginStatus) {
		if let Some(entry) = self.entries.get_mut(id) {
			entry.status = status;
		}
	}

	pub(crate) fn fail(&mut self, id: &str, message: String) {
		if let Some(entry) = self.entries.get_mut(id) {
			entry.status = PluginStatus::Error;
			entry.error = Some(message);
		}
	}

	pub(crate) fn set_api(&mut self, id: &str, api: AnyService) {
		if let Some(entry) = self.entries.get_mut(id) {
			entry.api = Some(api);
		}
	}

	/// Cached API together with the plugin's status.
	pub(crate) fn api(&self, id: &str) -> Option<(PluginStatus, Option<AnyService>)> {
		self.entries
			.get(id)
			.map(|entry| (entry.status, entry.api.clone()))
	}
}
