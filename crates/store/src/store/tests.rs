use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use quire_state::kinds;
use serde_json::json;

use super::*;
use crate::middleware::middleware;
use crate::reducer::reducer;

fn add(id: &str) -> Action {
	Action::with_payload(kinds::ADD_NOTE, json!({ "id": id }))
}

fn counter(store: &Store) -> (Arc<AtomicUsize>, Subscription) {
	let calls = Arc::new(AtomicUsize::new(0));
	let seen = Arc::clone(&calls);
	let subscription = store.subscribe(move |_, _| {
		seen.fetch_add(1, Ordering::SeqCst);
	});
	(calls, subscription)
}

/// Middleware that appends `tag:kind` to `log` for every action it sees.
fn recording(tag: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Middleware {
	let log = Arc::clone(log);
	middleware(move |_api, next| {
		let log = Arc::clone(&log);
		next_fn(move |action| {
			log.lock().push(format!("{tag}:{}", action.kind()));
			next(action)
		})
	})
}

#[test]
fn malformed_action_is_rejected_without_notification() {
	let store = Store::new(State::default());
	let (calls, _sub) = counter(&store);
	let before = store.get_state();

	assert_eq!(store.dispatch(Action::new("   ")), None);
	assert!(Arc::ptr_eq(&before, &store.get_state()));
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unchanged_dispatch_keeps_snapshot_and_skips_listeners() {
	let store = Store::new(State::default());
	store.dispatch(add("a"));
	let (calls, _sub) = counter(&store);
	let before = store.get_state();

	let result = store.dispatch(Action::with_payload(kinds::SELECT_NOTE, json!({ "noteId": "a" })));

	assert!(result.is_some());
	assert!(Arc::ptr_eq(&before, &store.get_state()));
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn listeners_receive_new_and_previous_snapshots() {
	let store = Store::new(State::default());
	let before = store.get_state();
	let seen: Arc<Mutex<Option<(Arc<State>, Arc<State>)>>> = Arc::default();
	let slot = Arc::clone(&seen);
	let _sub = store.subscribe(move |next, prev| {
		*slot.lock() = Some((Arc::clone(next), Arc::clone(prev)));
	});

	store.dispatch(add("a"));

	let (next, prev) = seen.lock().take().expect("listener was called");
	assert!(Arc::ptr_eq(&prev, &before));
	assert!(Arc::ptr_eq(&next, &store.get_state()));
	assert!(next.shares_slice(&prev, quire_state::Slice::Cache));
}

#[test]
fn unsubscribe_removes_only_that_listener() {
	let store = Store::new(State::default());
	let (first, first_sub) = counter(&store);
	let (second, _second_sub) = counter(&store);
	assert_eq!(store.subscriber_count(), 2);

	assert!(first_sub.unsubscribe());
	store.dispatch(add("a"));

	assert_eq!(first.load(Ordering::SeqCst), 0);
	assert_eq!(second.load(Ordering::SeqCst), 1);
	assert_eq!(store.subscriber_count(), 1);
}

#[test]
fn panicking_listener_does_not_stop_siblings() {
	let store = Store::new(State::default());
	let _bad = store.subscribe(|_, _| panic!("listener exploded"));
	let (calls, _sub) = counter(&store);

	assert!(store.dispatch(add("a")).is_some());
	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert!(!store.is_dispatching());
}

#[test]
fn nested_dispatch_from_reducer_is_refused() {
	let store = Store::new(State::default());
	let inner: Arc<Mutex<Option<Option<Action>>>> = Arc::default();
	let handle = store.clone();
	let slot = Arc::clone(&inner);
	store.register_reducer(
		"reentrant",
		reducer(move |draft, action| {
			if action.is("TRIGGER") {
				*slot.lock() = Some(handle.dispatch(add("nested")));
				draft.cache_mut().insert("triggered".into(), json!(true));
			}
			Ok(())
		}),
	);

	store.dispatch(Action::new("TRIGGER"));

	let state = store.get_state();
	assert!(state.note("nested").is_none());
	assert_eq!(state.cache_entry("triggered"), Some(&json!(true)));
	let nested = inner.lock().take().expect("reducer ran");
	assert_eq!(
		nested.map(|action| action.kind().to_owned()).as_deref(),
		Some(kinds::ADD_NOTE)
	);
}

#[test]
fn nested_dispatch_from_listener_is_refused() {
	let store = Store::new(State::default());
	let handle = store.clone();
	let _sub = store.subscribe(move |next, _| {
		if next.notes.len() == 1 {
			handle.dispatch(add("from-listener"));
		}
	});

	store.dispatch(add("a"));

	let state = store.get_state();
	assert_eq!(state.notes.len(), 1);
	assert!(state.note("from-listener").is_none());
	assert!(!store.is_dispatching());
}

#[test]
fn failing_reducers_leave_core_changes_applied() {
	let store = Store::new(State::default());
	store.register_reducer("broken", reducer(|_, _| anyhow::bail!("nope")));
	store.register_reducer("panicky", reducer(|_, _| panic!("boom")));

	store.dispatch(add("a"));

	assert!(store.get_state().note("a").is_some());
	assert_eq!(store.reducer_ids(), ["broken", "panicky"]);
}

#[test]
fn middleware_runs_in_registration_order() {
	let store = Store::new(State::default());
	let log = Arc::new(Mutex::new(Vec::new()));
	store.register_middleware("first", recording("first", &log));
	store.register_middleware("second", recording("second", &log));

	store.dispatch(Action::new("PING"));

	assert_eq!(*log.lock(), ["first:PING", "second:PING"]);
	assert_eq!(store.middleware_ids(), ["first", "second"]);
}

#[test]
fn middleware_can_swallow_actions() {
	let store = Store::new(State::default());
	store.register_middleware(
		"gate",
		middleware(|_api, next| {
			next_fn(move |action| {
				if action.is(kinds::DELETE_NOTE) {
					None
				} else {
					next(action)
				}
			})
		}),
	);
	store.dispatch(add("a"));

	let before = store.get_state();
	let result = store.dispatch(Action::with_payload(kinds::DELETE_NOTE, json!({ "noteId": "a" })));

	assert_eq!(result, None);
	assert!(Arc::ptr_eq(&before, &store.get_state()));
}

#[test]
fn middleware_can_rewrite_actions() {
	let store = Store::new(State::default());
	store.register_middleware(
		"titler",
		middleware(|_api, next| {
			next_fn(move |action| {
				if !action.is(kinds::ADD_NOTE) {
					return next(action);
				}
				next(action.map_payload(|payload| {
					let mut payload = payload.cloned().unwrap_or_else(|| json!({}));
					payload["title"] = json!("Rewritten");
					payload
				}))
			})
		}),
	);

	let reached = store.dispatch(add("a")).expect("reached reducers");

	assert_eq!(reached.payload().and_then(|p| p.get("title")), Some(&json!("Rewritten")));
	assert_eq!(store.get_state().note("a").unwrap().title, "Rewritten");
}

#[test]
fn middleware_api_reads_state_and_redispatches() {
	let store = Store::new(State::default());
	let observed = Arc::new(AtomicUsize::new(0));
	let seen = Arc::clone(&observed);
	store.register_middleware(
		"expander",
		middleware(move |api, next| {
			let seen = Arc::clone(&seen);
			next_fn(move |action| {
				if action.is("ADD_TWO") {
					api.dispatch(add("one"));
					api.dispatch(add("two"));
					seen.store(api.get_state().notes.len(), Ordering::SeqCst);
				}
				next(action)
			})
		}),
	);

	assert!(store.dispatch(Action::new("ADD_TWO")).is_some());
	assert_eq!(observed.load(Ordering::SeqCst), 2);
	assert_eq!(store.get_state().notes.len(), 2);
}

#[test]
fn in_flight_dispatch_keeps_its_pipeline() {
	let store = Store::new(State::default());
	let log = Arc::new(Mutex::new(Vec::new()));
	let handle = store.clone();
	let late = recording("late", &log);
	store.register_middleware(
		"installer",
		middleware(move |_api, next| {
			let handle = handle.clone();
			let late = Arc::clone(&late);
			next_fn(move |action| {
				if action.is("INSTALL") {
					handle.register_middleware("late", Arc::clone(&late));
				}
				next(action)
			})
		}),
	);

	store.dispatch(Action::new("INSTALL"));
	assert!(log.lock().is_empty());

	store.dispatch(Action::new("AFTER"));
	assert_eq!(*log.lock(), ["late:AFTER"]);
}

#[test]
fn panicking_middleware_is_contained() {
	let store = Store::new(State::default());
	store.register_middleware(
		"explodes",
		middleware(|_api, _next| next_fn(|_| panic!("middleware exploded"))),
	);

	assert_eq!(store.dispatch(Action::new("ANY")), None);
	assert!(!store.is_dispatching());
}

#[test]
fn dispatches_from_other_threads_wait_instead_of_being_refused() {
	let store = Store::new(State::default());
	store.register_reducer(
		"slow",
		reducer(|_, action| {
			if action.is("SLOW") {
				std::thread::sleep(std::time::Duration::from_millis(200));
			}
			Ok(())
		}),
	);

	let background = store.clone();
	let slow = std::thread::spawn(move || {
		background.dispatch(Action::new("SLOW"));
	});
	while !store.is_dispatching() {
		std::thread::yield_now();
	}

	assert!(store.dispatch(add("while-busy")).is_some());
	slow.join().unwrap();

	assert!(store.get_state().note("while-busy").is_some());
	assert!(!store.is_dispatching());
}
