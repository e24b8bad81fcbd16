use std::sync::Arc;

use indexmap::IndexMap;
use quire_state::{Action, Draft};

/// Mutation function applied to the dispatch working copy.
///
/// Must treat unrecognized action types as a no-op. An `Err` (or a panic) is
/// logged and contained; sibling reducers still run against the same draft.
pub type Reducer = Arc<dyn Fn(&mut Draft<'_>, &Action) -> anyhow::Result<()> + Send + Sync>;

/// Wraps a closure as a [`Reducer`].
pub fn reducer<F>(f: F) -> Reducer
where
	F: Fn(&mut Draft<'_>, &Action) -> anyhow::Result<()> + Send + Sync + 'static,
{
	Arc::new(f)
}

/// Plugin reducers in registration order.
#[derive(Default, Clone)]
pub(crate) struct ReducerRegistry {
	by_plugin: IndexMap<Arc<str>, Reducer>,
}

impl ReducerRegistry {
	/// Appends a reducer, or replaces it in place when `plugin_id` already
	/// registered one. Returns true on replacement.
	pub fn insert(&mut self, plugin_id: &str, reducer: Reducer) -> bool {
		self.by_plugin.insert(Arc::from(plugin_id), reducer).is_some()
	}

	/// Clones the ordered entries so reducers run without holding the lock.
	pub fn snapshot(&self) -> Vec<(Arc<str>, Reducer)> {
		self.by_plugin
			.iter()
			.map(|(id, reducer)| (Arc::clone(id), Arc::clone(reducer)))
			.collect()
	}

	pub fn ids(&self) -> Vec<String> {
		self.by_plugin.keys().map(|id| id.to_string()).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn noop() -> Reducer {
		reducer(|_, _| Ok(()))
	}

	#[test]
	fn replacement_keeps_position() {
		let mut registry = ReducerRegistry::default();
		assert!(!registry.insert("a", noop()));
		assert!(!registry.insert("b", noop()));
		assert!(registry.insert("a", noop()));
		assert_eq!(registry.ids(), ["a", "b"]);
	}
}
