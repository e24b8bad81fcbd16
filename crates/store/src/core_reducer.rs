//! Reducer for the `CORE_*` action catalogue.

use std::sync::Arc;

use chrono::Utc;
use quire_state::{Action, Draft, Note, NoteId, PersistedState, StatusBanner, kinds};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::reducer::{Reducer, reducer};

/// Registrant id used in logs for the core reducer.
pub const CORE_REDUCER_ID: &str = "core";

const UNTITLED: &str = "Untitled Note";

#[derive(Debug, thiserror::Error)]
pub enum CoreReducerError {
	#[error("{action}: payload is required")]
	MissingPayload { action: String },
	#[error("{action}: invalid payload: {source}")]
	InvalidPayload {
		action: String,
		#[source]
		source: serde_json::Error,
	},
	#[error("note {0} already exists")]
	DuplicateNote(NoteId),
	#[error("note id must not be blank")]
	BlankNoteId,
}

/// Returns the core reducer.
pub fn core_reducer() -> Reducer {
	reducer(|draft, action| reduce_core(draft, action).map_err(Into::into))
}

/// Applies one core action to `draft`. Unknown types are ignored.
pub fn reduce_core(draft: &mut Draft<'_>, action: &Action) -> Result<(), CoreReducerError> {
	match action.kind() {
		kinds::ADD_NOTE => add_note(draft, payload_or_default(action)?),
		kinds::UPDATE_NOTE => update_note(draft, payload(action)?),
		kinds::DELETE_NOTE => delete_note(draft, payload::<NoteRef>(action)?.note_id),
		kinds::SELECT_NOTE => select_note(draft, payload_or_default::<SelectNote>(action)?.note_id),
		kinds::SEARCH_TERM_CHANGED => {
			draft.ui_mut().search_term = payload::<SearchTerm>(action)?.term;
			Ok(())
		}
		kinds::UPDATE_SETTINGS => {
			let UpdateSetting { key, value } = payload(action)?;
			draft.settings_mut().general.insert(key, value);
			Ok(())
		}
		kinds::UPDATE_PLUGIN_SETTINGS => {
			let PluginSettings { plugin_id, settings } = payload(action)?;
			draft.settings_mut().plugins.insert(plugin_id, settings);
			Ok(())
		}
		kinds::SET_PLUGIN_RUNTIME_STATE => {
			let PluginRuntime { plugin_id, state } = payload(action)?;
			draft.plugin_runtime_mut().insert(plugin_id, state);
			Ok(())
		}
		kinds::SET_CACHE_ITEM => {
			let CacheItem { key, value } = payload(action)?;
			draft.cache_mut().insert(key, value);
			Ok(())
		}
		kinds::REMOVE_CACHE_ITEM => {
			let CacheKey { key } = payload(action)?;
			if draft.state().cache.contains_key(&key) {
				draft.cache_mut().remove(&key);
			}
			Ok(())
		}
		kinds::SET_STATUS => {
			draft.ui_mut().status = Some(payload::<StatusBanner>(action)?);
			Ok(())
		}
		kinds::CLEAR_STATUS => {
			let ClearStatus { id } = payload_or_default(action)?;
			let shown = draft.state().ui.status.as_ref().map(|status| status.id);
			if shown.is_some() && (id.is_none() || id == shown) {
				draft.ui_mut().status = None;
			}
			Ok(())
		}
		kinds::STATE_LOADED => {
			let loaded: PersistedState = payload_or_default(action)?;
			draft.replace(loaded.into_state());
			Ok(())
		}
		_ => Ok(()),
	}
}

fn add_note(draft: &mut Draft<'_>, p: AddNote) -> Result<(), CoreReducerError> {
	let id = p
		.id
		.unwrap_or_else(|| NoteId::new(Uuid::new_v4().to_string()));
	if id.as_str().trim().is_empty() {
		return Err(CoreReducerError::BlankNoteId);
	}
	if draft.state().notes.contains_key(&id) {
		return Err(CoreReducerError::DuplicateNote(id));
	}

	let mut note = Note::new(id.clone(), Utc::now());
	note.title = p.title.unwrap_or_else(|| UNTITLED.to_owned());
	note.content = p.content.unwrap_or_default();
	note.note_type = p.note_type;
	note.tags = p.tags.unwrap_or_default();

	draft.notes_mut().insert(id.clone(), Arc::new(note));
	draft.note_order_mut().insert(0, id.clone());
	draft.ui_mut().selected_note_id = Some(id);
	Ok(())
}

fn update_note(draft: &mut Draft<'_>, p: UpdateNote) -> Result<(), CoreReducerError> {
	let Some(current) = draft.state().note(p.note_id.as_str()) else {
		return Ok(());
	};
	let mut next = Note::clone(current);
	let NoteChanges {
		title,
		content,
		note_type,
		tags,
	} = p.changes;
	if let Some(title) = title {
		next.title = title;
	}
	if let Some(content) = content {
		next.content = content;
	}
	if let Some(note_type) = note_type {
		next.note_type = Some(note_type);
	}
	if let Some(tags) = tags {
		next.tags = tags;
	}
	if next == **current {
		return Ok(());
	}

	next.updated_at = Utc::now();
	draft.notes_mut().insert(p.note_id, Arc::new(next));
	Ok(())
}

fn delete_note(draft: &mut Draft<'_>, id: NoteId) -> Result<(), CoreReducerError> {
	if draft.state().notes.contains_key(&id) {
		draft.notes_mut().remove(&id);
	}
	// A hand-built state may list an id with no note behind it.
	if draft.state().note_order.contains(&id) {
		draft.note_order_mut().retain(|entry| *entry != id);
	}
	if draft.state().ui.selected_note_id.as_ref() == Some(&id) {
		draft.ui_mut().selected_note_id = None;
	}
	Ok(())
}

fn select_note(draft: &mut Draft<'_>, id: Option<NoteId>) -> Result<(), CoreReducerError> {
	if let Some(id) = &id
		&& !draft.state().notes.contains_key(id)
	{
		return Ok(());
	}
	draft.ui_mut().selected_note_id = id;
	Ok(())
}

fn payload<T: DeserializeOwned>(action: &Action) -> Result<T, CoreReducerError> {
	let value = action
		.payload()
		.ok_or_else(|| CoreReducerError::MissingPayload {
			action: action.kind().to_owned(),
		})?;
	decode(action, value)
}

fn payload_or_default<T: DeserializeOwned + Default>(action: &Action) -> Result<T, CoreReducerError> {
	match action.payload() {
		None | Some(Value::Null) => Ok(T::default()),
		Some(value) => decode(action, value),
	}
}

fn decode<T: DeserializeOwned>(action: &Action, value: &Value) -> Result<T, CoreReducerError> {
	T::deserialize(value).map_err(|source| CoreReducerError::InvalidPayload {
		action: action.kind().to_owned(),
		source,
	})
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AddNote {
	id: Option<NoteId>,
	title: Option<String>,
	content: Option<String>,
	#[serde(rename = "type")]
	note_type: Option<String>,
	tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteRef {
	note_id: NoteId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SelectNote {
	note_id: Option<NoteId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateNote {
	note_id: NoteId,
	#[serde(default)]
	changes: NoteChanges,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NoteChanges {
	title: Option<String>,
	content: Option<String>,
	#[serde(rename = "type")]
	note_type: Option<String>,
	tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SearchTerm {
	term: String,
}

#[derive(Debug, Deserialize)]
struct UpdateSetting {
	key: String,
	value: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PluginSettings {
	plugin_id: String,
	settings: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PluginRuntime {
	plugin_id: String,
	state: Value,
}

#[derive(Debug, Deserialize)]
struct CacheItem {
	key: String,
	value: Value,
}

#[derive(Debug, Deserialize)]
struct CacheKey {
	key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClearStatus {
	id: Option<u64>,
}

#[cfg(test)]
mod tests;
