//! Durable projection of the state tree.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::note::{Note, NoteId};
use crate::state::{Settings, State};

/// The slices written to storage. Transient slices (`ui`, `plugin_runtime`,
/// `cache`) never appear here.
///
/// Every field is optional: data written by an older build may lack slices
/// that exist today, and loading must still produce a complete tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedState {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub notes: Option<BTreeMap<NoteId, Note>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub note_order: Option<Vec<NoteId>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub settings: Option<Settings>,
}

impl State {
	/// Projects the durable slices.
	pub fn to_persisted(&self) -> PersistedState {
		PersistedState {
			notes: Some(
				self.notes
					.iter()
					.map(|(id, note)| (id.clone(), Note::clone(note)))
					.collect(),
			),
			note_order: Some(self.note_order.to_vec()),
			settings: Some(Settings::clone(&self.settings)),
		}
	}
}

impl PersistedState {
	/// Builds a fresh tree: defaults first, then every durable slice present
	/// in `self`.
	///
	/// The ordering list is repaired against the loaded notes: entries that
	/// point at missing notes are dropped, duplicates collapse to their first
	/// occurrence, and notes absent from the ordering are appended.
	pub fn into_state(self) -> State {
		let mut state = State::default();

		if let Some(notes) = self.notes {
			state.notes = Arc::new(
				notes
					.into_iter()
					.map(|(id, mut note)| {
						note.id = id.clone();
						(id, Arc::new(note))
					})
					.collect(),
			);
		}

		let mut seen = BTreeSet::new();
		let mut order: Vec<NoteId> = self
			.note_order
			.unwrap_or_default()
			.into_iter()
			.filter(|id| state.notes.contains_key(id) && seen.insert(id.clone()))
			.collect();
		order.extend(state.notes.keys().filter(|id| !seen.contains(*id)).cloned());
		state.note_order = Arc::new(order);

		if let Some(settings) = self.settings {
			state.settings = Arc::new(settings);
		}
		state
	}
}

#[cfg(test)]
mod tests {
	use chrono::Utc;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;
	use crate::state::{StatusBanner, UiState};

	#[test]
	fn projection_excludes_transient_slices() {
		let mut state = State::default();
		Arc::make_mut(&mut state.cache).insert("k".into(), json!(1));
		state.ui = Arc::new(UiState {
			status: Some(StatusBanner {
				id: 7,
				message: "hi".into(),
				level: Default::default(),
			}),
			..UiState::default()
		});

		let value = serde_json::to_value(state.to_persisted()).unwrap();
		let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
		assert_eq!(keys, ["noteOrder", "notes", "settings"]);
	}

	#[test]
	fn missing_slices_fall_back_to_defaults() {
		let loaded: PersistedState = serde_json::from_value(json!({
			"settings": { "general": { "theme": "dark" } }
		}))
		.unwrap();
		let state = loaded.into_state();
		assert!(state.notes.is_empty());
		assert!(state.note_order.is_empty());
		assert_eq!(state.settings.general.get("theme"), Some(&json!("dark")));
		assert!(state.settings.plugins.is_empty());
	}

	#[test]
	fn ordering_is_repaired_against_notes() {
		let now = Utc::now();
		let mut notes = BTreeMap::new();
		for id in ["a", "b", "c"] {
			notes.insert(NoteId::from(id), Note::new(NoteId::from(id), now));
		}
		let loaded = PersistedState {
			notes: Some(notes),
			note_order: Some(vec!["c".into(), "ghost".into(), "c".into(), "a".into()]),
			settings: None,
		};

		let state = loaded.into_state();
		let order: Vec<_> = state.note_order.iter().map(NoteId::as_str).collect();
		assert_eq!(order, ["c", "a", "b"]);
	}

	#[test]
	fn note_id_follows_map_key() {
		let now = Utc::now();
		let mut notes = BTreeMap::new();
		notes.insert(NoteId::from("real"), Note::new(NoteId::from("stale"), now));
		let state = PersistedState {
			notes: Some(notes),
			..PersistedState::default()
		}
		.into_state();
		assert_eq!(state.note("real").unwrap().id.as_str(), "real");
	}
}
