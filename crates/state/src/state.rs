//! The state tree and its slices.
//!
//! Every slice sits behind an [`Arc`] so a new root produced by a dispatch
//! shares all untouched slices with its predecessor. Subscribers compare
//! slices with [`Arc::ptr_eq`] to detect change without walking the tree.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::note::{Note, NoteId};

/// Entity collection keyed by note id.
pub type NoteMap = BTreeMap<NoteId, Arc<Note>>;

/// Free-form string-keyed slice (plugin runtime state, cache).
pub type ValueMap = BTreeMap<String, Value>;

/// Names of the top-level slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slice {
	Notes,
	NoteOrder,
	Settings,
	Ui,
	PluginRuntime,
	Cache,
}

impl Slice {
	pub const ALL: [Slice; 6] = [
		Slice::Notes,
		Slice::NoteOrder,
		Slice::Settings,
		Slice::Ui,
		Slice::PluginRuntime,
		Slice::Cache,
	];

	/// Returns true for slices that survive a restart.
	pub const fn is_durable(self) -> bool {
		matches!(self, Slice::Notes | Slice::NoteOrder | Slice::Settings)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Notes => "notes",
			Self::NoteOrder => "note_order",
			Self::Settings => "settings",
			Self::Ui => "ui",
			Self::PluginRuntime => "plugin_runtime",
			Self::Cache => "cache",
		}
	}
}

/// User settings, including one opaque value per plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub general: ValueMap,
	pub plugins: ValueMap,
}

/// Severity of a status banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
	#[default]
	Info,
	Success,
	Warn,
	Error,
}

/// Transient message shown in the status area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBanner {
	pub id: u64,
	pub message: String,
	#[serde(default)]
	pub level: StatusLevel,
}

/// UI-only state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiState {
	pub selected_note_id: Option<NoteId>,
	pub search_term: String,
	pub status: Option<StatusBanner>,
}

/// Root of the state tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
	pub notes: Arc<NoteMap>,
	/// Ordering of note ids, newest first.
	pub note_order: Arc<Vec<NoteId>>,
	pub settings: Arc<Settings>,
	pub ui: Arc<UiState>,
	pub plugin_runtime: Arc<ValueMap>,
	pub cache: Arc<ValueMap>,
}

impl State {
	pub fn note(&self, id: &str) -> Option<&Arc<Note>> {
		self.notes.get(id)
	}

	pub fn selected_note(&self) -> Option<&Arc<Note>> {
		let id = self.ui.selected_note_id.as_ref()?;
		self.notes.get(id)
	}

	/// Returns the first note, in display order, carrying the given type tag.
	pub fn note_by_type(&self, tag: &str) -> Option<&Arc<Note>> {
		self.ordered_notes()
			.find(|note| note.note_type.as_deref() == Some(tag))
	}

	/// Iterates notes in display order, skipping dangling ordering entries.
	pub fn ordered_notes(&self) -> impl Iterator<Item = &Arc<Note>> {
		self.note_order.iter().filter_map(|id| self.notes.get(id))
	}

	pub fn plugin_settings(&self, plugin_id: &str) -> Option<&Value> {
		self.settings.plugins.get(plugin_id)
	}

	pub fn plugin_runtime(&self, plugin_id: &str) -> Option<&Value> {
		self.plugin_runtime.get(plugin_id)
	}

	pub fn cache_entry(&self, key: &str) -> Option<&Value> {
		self.cache.get(key)
	}

	/// Returns true when `slice` is the same allocation in both roots.
	pub fn shares_slice(&self, other: &State, slice: Slice) -> bool {
		match slice {
			Slice::Notes => Arc::ptr_eq(&self.notes, &other.notes),
			Slice::NoteOrder => Arc::ptr_eq(&self.note_order, &other.note_order),
			Slice::Settings => Arc::ptr_eq(&self.settings, &other.settings),
			Slice::Ui => Arc::ptr_eq(&self.ui, &other.ui),
			Slice::PluginRuntime => Arc::ptr_eq(&self.plugin_runtime, &other.plugin_runtime),
			Slice::Cache => Arc::ptr_eq(&self.cache, &other.cache),
		}
	}
}
