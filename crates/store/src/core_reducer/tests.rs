use pretty_assertions::assert_eq;
use quire_state::{State, StatusLevel};
use rstest::rstest;
use serde_json::json;

use super::*;

fn apply(state: &Arc<State>, action: Action) -> Result<Arc<State>, CoreReducerError> {
	let mut draft = Draft::new(state);
	reduce_core(&mut draft, &action)?;
	Ok(draft.finish())
}

fn apply_ok(state: &Arc<State>, action: Action) -> Arc<State> {
	apply(state, action).expect("core action should apply")
}

fn add(id: &str) -> Action {
	Action::with_payload(kinds::ADD_NOTE, json!({ "id": id, "title": id }))
}

fn seeded(ids: &[&str]) -> Arc<State> {
	ids.iter()
		.fold(Arc::new(State::default()), |state, id| apply_ok(&state, add(id)))
}

#[test]
fn add_note_without_payload_creates_selected_note() {
	let next = apply_ok(&Arc::new(State::default()), Action::new(kinds::ADD_NOTE));

	assert_eq!(next.notes.len(), 1);
	assert_eq!(next.note_order.len(), 1);
	let id = &next.note_order[0];
	assert!(next.notes.contains_key(id));
	assert_eq!(next.ui.selected_note_id.as_ref(), Some(id));
	assert_eq!(next.note(id.as_str()).unwrap().title, "Untitled Note");
}

#[test]
fn add_note_prepends_to_order() {
	let state = seeded(&["a", "b"]);
	let order: Vec<_> = state.note_order.iter().map(NoteId::as_str).collect();
	assert_eq!(order, ["b", "a"]);
}

#[test]
fn add_note_rejects_duplicate_id() {
	let state = seeded(&["a"]);
	let err = apply(&state, add("a")).unwrap_err();
	assert!(matches!(err, CoreReducerError::DuplicateNote(id) if id.as_str() == "a"));
}

#[test]
fn delete_selected_note_clears_selection() {
	let state = seeded(&["a"]);
	let next = apply_ok(
		&state,
		Action::with_payload(kinds::DELETE_NOTE, json!({ "noteId": "a" })),
	);
	assert!(next.notes.is_empty());
	assert!(next.note_order.is_empty());
	assert_eq!(next.ui.selected_note_id, None);
}

#[test]
fn delete_other_note_keeps_selection() {
	let state = seeded(&["a", "b"]);
	let next = apply_ok(
		&state,
		Action::with_payload(kinds::DELETE_NOTE, json!({ "noteId": "a" })),
	);
	assert_eq!(next.ui.selected_note_id.as_ref().map(NoteId::as_str), Some("b"));
	assert!(next.shares_slice(&state, quire_state::Slice::Ui));
}

#[test]
fn delete_drops_order_entry_without_a_note() {
	let state = Arc::new(State {
		note_order: Arc::new(vec![NoteId::new("dangling")]),
		..State::default()
	});
	let next = apply_ok(
		&state,
		Action::with_payload(kinds::DELETE_NOTE, json!({ "noteId": "dangling" })),
	);
	assert!(next.note_order.is_empty());
	assert!(next.shares_slice(&state, quire_state::Slice::Notes));
}

#[test]
fn add_note_rejects_blank_id() {
	let err = apply(
		&Arc::new(State::default()),
		Action::with_payload(kinds::ADD_NOTE, json!({ "id": "" })),
	)
	.unwrap_err();
	assert!(matches!(err, CoreReducerError::BlankNoteId));
}

#[test]
fn update_note_bumps_timestamp_only_on_change() {
	let state = seeded(&["a"]);
	let same = apply_ok(
		&state,
		Action::with_payload(
			kinds::UPDATE_NOTE,
			json!({ "noteId": "a", "changes": { "title": "a" } }),
		),
	);
	assert!(Arc::ptr_eq(&same, &state));

	let changed = apply_ok(
		&state,
		Action::with_payload(
			kinds::UPDATE_NOTE,
			json!({ "noteId": "a", "changes": { "content": "body", "tags": ["x"] } }),
		),
	);
	let note = changed.note("a").unwrap();
	assert_eq!(note.content, "body");
	assert_eq!(note.tags, ["x"]);
	assert!(note.updated_at >= state.note("a").unwrap().updated_at);
}

#[rstest]
#[case::unknown_type(Action::new("PLUGIN_SOMETHING"))]
#[case::reselect(Action::with_payload(kinds::SELECT_NOTE, json!({ "noteId": "a" })))]
#[case::select_missing(Action::with_payload(kinds::SELECT_NOTE, json!({ "noteId": "ghost" })))]
#[case::delete_missing(Action::with_payload(kinds::DELETE_NOTE, json!({ "noteId": "ghost" })))]
#[case::update_missing(Action::with_payload(kinds::UPDATE_NOTE, json!({ "noteId": "ghost", "changes": { "title": "x" } })))]
#[case::remove_missing_cache(Action::with_payload(kinds::REMOVE_CACHE_ITEM, json!({ "key": "nope" })))]
#[case::clear_without_status(Action::new(kinds::CLEAR_STATUS))]
fn no_op_actions_keep_identity(#[case] action: Action) {
	let state = seeded(&["a"]);
	let next = apply_ok(&state, action);
	assert!(Arc::ptr_eq(&next, &state));
}

#[rstest]
#[case::delete_without_payload(Action::new(kinds::DELETE_NOTE))]
#[case::delete_wrong_shape(Action::with_payload(kinds::DELETE_NOTE, json!({ "id": 3 })))]
#[case::status_without_message(Action::with_payload(kinds::SET_STATUS, json!({ "id": 1 })))]
#[case::blank_note_id(Action::with_payload(kinds::ADD_NOTE, json!({ "id": "  " })))]
fn malformed_payloads_error(#[case] action: Action) {
	let state = seeded(&["a"]);
	assert!(apply(&state, action).is_err());
}

#[test]
fn clear_status_respects_banner_id() {
	let state = apply_ok(
		&Arc::new(State::default()),
		Action::with_payload(
			kinds::SET_STATUS,
			json!({ "id": 2, "message": "saved", "level": "success" }),
		),
	);
	assert_eq!(state.ui.status.as_ref().unwrap().level, StatusLevel::Success);

	let stale = apply_ok(&state, Action::with_payload(kinds::CLEAR_STATUS, json!({ "id": 1 })));
	assert!(Arc::ptr_eq(&stale, &state));

	let cleared = apply_ok(&state, Action::with_payload(kinds::CLEAR_STATUS, json!({ "id": 2 })));
	assert!(cleared.ui.status.is_none());
}

#[test]
fn settings_runtime_and_cache_slices() {
	let state = Arc::new(State::default());
	let state = apply_ok(
		&state,
		Action::with_payload(kinds::UPDATE_SETTINGS, json!({ "key": "theme", "value": "dark" })),
	);
	let state = apply_ok(
		&state,
		Action::with_payload(
			kinds::UPDATE_PLUGIN_SETTINGS,
			json!({ "pluginId": "auto-tag", "settings": { "tag": "inbox" } }),
		),
	);
	let state = apply_ok(
		&state,
		Action::with_payload(
			kinds::SET_PLUGIN_RUNTIME_STATE,
			json!({ "pluginId": "word-count", "state": { "total": 3 } }),
		),
	);
	let state = apply_ok(
		&state,
		Action::with_payload(kinds::SET_CACHE_ITEM, json!({ "key": "k", "value": [1, 2] })),
	);

	assert_eq!(state.settings.general.get("theme"), Some(&json!("dark")));
	assert_eq!(state.plugin_settings("auto-tag"), Some(&json!({ "tag": "inbox" })));
	assert_eq!(state.plugin_runtime("word-count"), Some(&json!({ "total": 3 })));
	assert_eq!(state.cache_entry("k"), Some(&json!([1, 2])));

	let state = apply_ok(&state, Action::with_payload(kinds::REMOVE_CACHE_ITEM, json!({ "key": "k" })));
	assert!(state.cache_entry("k").is_none());
}

#[test]
fn state_loaded_resets_then_overlays_durable_slices() {
	let state = seeded(&["old"]);
	let state = apply_ok(
		&state,
		Action::with_payload(kinds::SET_CACHE_ITEM, json!({ "key": "k", "value": 1 })),
	);
	let loaded = json!({
		"notes": {
			"n1": {
				"id": "n1",
				"title": "Loaded",
				"createdAt": "2025-01-01T00:00:00Z",
				"updatedAt": "2025-01-01T00:00:00Z"
			}
		},
		"noteOrder": ["n1"],
		"someFutureSlice": { "ignored": true }
	});

	let next = apply_ok(&state, Action::with_payload(kinds::STATE_LOADED, loaded));
	assert!(next.note("old").is_none());
	assert_eq!(next.note("n1").unwrap().title, "Loaded");
	assert!(next.cache.is_empty());
	assert_eq!(next.ui.selected_note_id, None);
	assert!(next.settings.general.is_empty());
}
