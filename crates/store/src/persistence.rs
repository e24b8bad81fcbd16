//! Durable projection of the store, written on change.

use std::sync::Arc;

use quire_state::{Action, PersistedState, Slice, State, kinds};
use tracing::{debug, warn};

use crate::store::Store;
use crate::subscribers::Subscription;

/// Destination for the durable slices.
pub trait StateSink: Send + Sync {
	fn persist(&self, state: &PersistedState) -> anyhow::Result<()>;
}

/// Wires a [`StateSink`] to a store.
pub struct Persistence;

impl Persistence {
	/// Writes the durable projection after every change that touched a
	/// durable slice. Sink failures are logged and dropped.
	pub fn attach(store: &Store, sink: Arc<dyn StateSink>) -> Subscription {
		store.subscribe(move |next, prev| {
			if !durable_changed(next, prev) {
				return;
			}
			match sink.persist(&next.to_persisted()) {
				Ok(()) => debug!(notes = next.notes.len(), "state persisted"),
				Err(error) => warn!(error = %error, "failed to persist state"),
			}
		})
	}

	/// Replaces the durable slices with `persisted`.
	pub fn restore(store: &Store, persisted: &PersistedState) -> Option<Action> {
		let payload = match serde_json::to_value(persisted) {
			Ok(payload) => payload,
			Err(error) => {
				warn!(error = %error, "persisted state could not be encoded");
				return None;
			}
		};
		store.dispatch(Action::with_payload(kinds::STATE_LOADED, payload))
	}
}

fn durable_changed(next: &State, prev: &State) -> bool {
	Slice::ALL
		.iter()
		.filter(|slice| slice.is_durable())
		.any(|slice| !next.shares_slice(prev, *slice))
}
