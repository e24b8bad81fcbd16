use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;
use quire_state::{Action, State, kinds};
use quire_store::{Store, reducer};
use serde_json::json;

fn seeded_store(notes: usize) -> Store {
	let store = Store::new(State::default());
	for i in 0..notes {
		store.dispatch(Action::with_payload(kinds::ADD_NOTE, json!({ "id": format!("n{i}") })));
	}
	store
}

proptest! {
	#[test]
	fn unrecognised_actions_leave_state_identical(
		notes in 0usize..4,
		kind in "[A-Z_]{1,12}".prop_filter("not a core action", |k| !k.starts_with("CORE_")),
		payload in proptest::option::of(any::<i64>()),
	) {
		let store = seeded_store(notes);
		let calls = Arc::new(AtomicUsize::new(0));
		let seen = Arc::clone(&calls);
		let _sub = store.subscribe(move |_, _| {
			seen.fetch_add(1, Ordering::SeqCst);
		});
		let before = store.get_state();

		let action = match payload {
			Some(value) => Action::with_payload(kind, json!({ "value": value })),
			None => Action::new(kind),
		};
		prop_assert!(store.dispatch(action).is_some());

		prop_assert!(Arc::ptr_eq(&before, &store.get_state()));
		prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn old_state_matches_snapshot_before_each_dispatch(ids in proptest::collection::vec("[a-z]{1,6}", 1..8)) {
		let store = Store::new(State::default());
		let mismatches = Arc::new(AtomicUsize::new(0));
		let expected = Arc::new(parking_lot::Mutex::new(store.get_state()));

		let check = Arc::clone(&expected);
		let bad = Arc::clone(&mismatches);
		let _sub = store.subscribe(move |_, prev| {
			if !Arc::ptr_eq(&*check.lock(), prev) {
				bad.fetch_add(1, Ordering::SeqCst);
			}
		});

		for id in ids {
			*expected.lock() = store.get_state();
			store.dispatch(Action::with_payload(kinds::ADD_NOTE, json!({ "id": id })));
		}
		prop_assert_eq!(mismatches.load(Ordering::SeqCst), 0);
	}
}

#[test]
fn throwing_plugin_reducer_does_not_block_siblings() {
	let store = Store::new(State::default());
	store.register_reducer(
		"thrower",
		reducer(|_, action| {
			if action.is("X") {
				anyhow::bail!("cannot handle X");
			}
			Ok(())
		}),
	);
	store.register_reducer(
		"counter",
		reducer(|draft, action| {
			if action.is("X") {
				let seen = draft
					.state()
					.cache_entry("x-count")
					.and_then(|v| v.as_u64())
					.unwrap_or(0);
				draft.cache_mut().insert("x-count".into(), json!(seen + 1));
			}
			Ok(())
		}),
	);

	assert!(store.dispatch(Action::new("X")).is_some());
	assert_eq!(store.get_state().cache_entry("x-count"), Some(&json!(1)));
}

#[test]
fn add_then_delete_round_trip() {
	let store = Store::new(State::default());

	store.dispatch(Action::new(kinds::ADD_NOTE));
	let state = store.get_state();
	assert_eq!(state.notes.len(), 1);
	let id = state.note_order[0].clone();
	assert_eq!(state.ui.selected_note_id.as_ref(), Some(&id));

	store.dispatch(Action::with_payload(
		kinds::DELETE_NOTE,
		json!({ "noteId": id.as_str() }),
	));
	let state = store.get_state();
	assert!(state.notes.is_empty());
	assert!(state.note_order.is_empty());
	assert_eq!(state.ui.selected_note_id, None);
}
