//! Middleware chain composed around the base dispatch.

use std::sync::{Arc, Weak};

use quire_state::{Action, State};
use tracing::{debug, trace};

use crate::store::{Store, StoreShared};

/// One link of the dispatch pipeline.
///
/// Returns the action that reached the reducers (possibly rewritten), or
/// `None` when a link swallowed it.
pub type Next = Arc<dyn Fn(Action) -> Option<Action> + Send + Sync>;

/// Higher-order middleware: given the store view and the next link, build
/// this link. Chains compose right-to-left, so the first registered
/// middleware sees every action first.
pub type Middleware = Arc<dyn Fn(MiddlewareApi, Next) -> Next + Send + Sync>;

/// Wraps a closure as a [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
	F: Fn(MiddlewareApi, Next) -> Next + Send + Sync + 'static,
{
	Arc::new(f)
}

/// Wraps a closure as a [`Next`] link.
pub fn next_fn<F>(f: F) -> Next
where
	F: Fn(Action) -> Option<Action> + Send + Sync + 'static,
{
	Arc::new(f)
}

/// Store view handed to middleware.
///
/// Holds the store weakly: the composed pipeline lives inside the store, so
/// a strong handle here would keep the store alive forever.
#[derive(Clone)]
pub struct MiddlewareApi {
	store: Weak<StoreShared>,
}

impl MiddlewareApi {
	pub(crate) fn new(store: Weak<StoreShared>) -> Self {
		Self { store }
	}

	/// Returns the current snapshot, or an empty tree once the store is gone.
	pub fn get_state(&self) -> Arc<State> {
		self.store
			.upgrade()
			.map(|shared| shared.current())
			.unwrap_or_default()
	}

	/// Dispatches through the full pipeline, this middleware included.
	pub fn dispatch(&self, action: Action) -> Option<Action> {
		let shared = self.store.upgrade()?;
		Store::from_shared(shared).dispatch(action)
	}
}

/// Composes `chain` around `base`, outermost first.
pub(crate) fn compose(api: &MiddlewareApi, chain: &[(Arc<str>, Middleware)], base: Next) -> Next {
	chain.iter().rev().fold(base, |next, (plugin_id, link)| {
		match crate::panic::contain(|| link(api.clone(), Arc::clone(&next))) {
			Ok(composed) => composed,
			Err(message) => {
				tracing::warn!(plugin = %plugin_id, panic = %message, "middleware factory panicked, skipping link");
				next
			}
		}
	})
}

/// Traces every action passing through the pipeline.
pub fn logging_middleware() -> Middleware {
	middleware(|_api, next| {
		next_fn(move |action| {
			let kind = action.kind().to_owned();
			debug!(action = %kind, payload = ?action.payload(), "dispatch");
			let result = next(action);
			trace!(action = %kind, reached_reducers = result.is_some(), "dispatch finished");
			result
		})
	})
}
