use std::sync::Arc;

use quire_plugin::{PluginDef, ServiceSet};
use quire_state::{Action, State, kinds};
use quire_store::reducer;
use serde_json::{Value, json};

pub const ID: &str = "word-count";

/// Counts words in note bodies. Exposed as the `word-count` service.
#[derive(Debug, Default)]
pub struct WordCounter;

impl WordCounter {
	pub fn count(&self, text: &str) -> usize {
		text.split_whitespace().count()
	}

	pub fn total(&self, state: &State) -> usize {
		state.notes.values().map(|note| self.count(&note.content)).sum()
	}
}

pub fn plugin() -> PluginDef {
	let counter = Arc::new(WordCounter);
	let service = Arc::clone(&counter);
	let public = Arc::clone(&counter);

	PluginDef::new(ID, "Word count")
		.version("0.3.0")
		.init(|api| {
			// Notes present before activation never pass through the reducer.
			let state = totals(&api.get_state(), &WordCounter);
			api.dispatch(Action::with_payload(
				kinds::SET_PLUGIN_RUNTIME_STATE,
				json!({ "pluginId": ID, "state": state }),
			));
			Ok(())
		})
		.reducer(move |_| {
			let counter = Arc::clone(&counter);
			Ok(reducer(move |draft, action| {
				if tracks(action.kind()) {
					let next = totals(draft.state(), &counter);
					draft.plugin_runtime_mut().insert(ID.to_owned(), next);
				}
				Ok(())
			}))
		})
		.services(move |_| Ok(ServiceSet::new().with(ID, Arc::clone(&service))))
		.api(move |_| Ok(Arc::clone(&public)))
}

fn tracks(kind: &str) -> bool {
	matches!(
		kind,
		kinds::ADD_NOTE | kinds::UPDATE_NOTE | kinds::DELETE_NOTE | kinds::STATE_LOADED
	)
}

fn totals(state: &State, counter: &WordCounter) -> Value {
	json!({
		"notes": state.notes.len(),
		"words": counter.total(state),
	})
}
