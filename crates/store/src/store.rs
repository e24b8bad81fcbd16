//! The state container and its dispatch pipeline.

use std::cell::Cell;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard, RwLock};
use quire_state::{Action, Draft, State};
use tracing::{debug, trace, warn};

use crate::core_reducer::{CORE_REDUCER_ID, core_reducer};
use crate::middleware::{Middleware, MiddlewareApi, Next, compose, next_fn};
use crate::panic::contain;
use crate::reducer::{Reducer, ReducerRegistry};
use crate::subscribers::{Listener, Subscribers, Subscription};

/// Composed pipeline. Swapped as a whole so a dispatch keeps the chain it
/// started with even if middleware is registered meanwhile.
struct Pipeline {
	run: Next,
}

pub(crate) struct StoreShared {
	state: ArcSwap<State>,
	core: Reducer,
	reducers: RwLock<ReducerRegistry>,
	middleware: Mutex<Vec<(Arc<str>, Middleware)>>,
	pipeline: ArcSwap<Pipeline>,
	subscribers: Arc<Subscribers>,
	/// Serializes base dispatches across threads. The flag marks a dispatch
	/// running on the thread that holds the lock.
	gate: ReentrantMutex<Cell<bool>>,
}

/// Holds the authoritative state snapshot and owns the dispatch pipeline.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct Store {
	shared: Arc<StoreShared>,
}

impl Store {
	/// Creates a store running the core note reducer.
	pub fn new(initial: State) -> Self {
		Self::with_core_reducer(initial, core_reducer())
	}

	/// Creates a store with a custom core reducer.
	pub fn with_core_reducer(initial: State, core: Reducer) -> Self {
		let shared = Arc::new_cyclic(|weak: &Weak<StoreShared>| StoreShared {
			state: ArcSwap::from_pointee(initial),
			core,
			reducers: RwLock::new(ReducerRegistry::default()),
			middleware: Mutex::new(Vec::new()),
			pipeline: ArcSwap::from_pointee(Pipeline {
				run: base_dispatch(weak.clone()),
			}),
			subscribers: Arc::new(Subscribers::default()),
			gate: ReentrantMutex::new(Cell::new(false)),
		});
		Self { shared }
	}

	pub(crate) fn from_shared(shared: Arc<StoreShared>) -> Self {
		Self { shared }
	}

	/// Returns the current snapshot. Treat it as read-only.
	pub fn get_state(&self) -> Arc<State> {
		self.shared.current()
	}

	/// Registers a change listener. Registering the same closure twice yields
	/// two independent subscriptions.
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&Arc<State>, &Arc<State>) + Send + Sync + 'static,
	{
		let listener: Listener = Arc::new(listener);
		self.shared.subscribers.add(listener)
	}

	pub fn subscriber_count(&self) -> usize {
		self.shared.subscribers.len()
	}

	/// Routes `action` through the middleware chain to the reducers.
	///
	/// Returns `None` when the action was rejected as malformed or swallowed
	/// by middleware. Nothing that happens inside a dispatch propagates to
	/// the caller.
	///
	/// A dispatch issued from inside a running one on the same thread is
	/// refused and returned unapplied. Dispatches from other threads wait for
	/// the running one to finish.
	pub fn dispatch(&self, action: Action) -> Option<Action> {
		if !action.is_well_formed() {
			warn!(payload = ?action.payload(), "rejected action with empty type");
			return None;
		}
		let pipeline = self.shared.pipeline.load_full();
		let kind = action.kind().to_owned();
		match contain(|| (pipeline.run)(action)) {
			Ok(result) => result,
			Err(message) => {
				warn!(action = %kind, panic = %message, "dispatch pipeline panicked");
				None
			}
		}
	}

	/// Installs `reducer` for `plugin_id`, effective from the next dispatch.
	///
	/// A second registration under the same id replaces the first in place.
	pub fn register_reducer(&self, plugin_id: &str, reducer: Reducer) {
		let replaced = self.shared.reducers.write().insert(plugin_id, reducer);
		if replaced {
			debug!(plugin = plugin_id, "reducer replaced");
		} else {
			debug!(plugin = plugin_id, "reducer registered");
		}
	}

	/// Appends `middleware` and rebuilds the pipeline immediately.
	pub fn register_middleware(&self, plugin_id: &str, middleware: Middleware) {
		self.shared
			.middleware
			.lock()
			.push((Arc::from(plugin_id), middleware));
		self.shared.rebuild_pipeline();
		debug!(plugin = plugin_id, "middleware registered, pipeline rebuilt");
	}

	/// Plugin ids with a reducer, in execution order.
	pub fn reducer_ids(&self) -> Vec<String> {
		self.shared.reducers.read().ids()
	}

	/// Plugin ids with middleware, outermost first.
	pub fn middleware_ids(&self) -> Vec<String> {
		self.shared
			.middleware
			.lock()
			.iter()
			.map(|(id, _)| id.to_string())
			.collect()
	}

	/// Returns true while a base dispatch is running on any thread.
	pub fn is_dispatching(&self) -> bool {
		self.shared.gate.try_lock().is_none_or(|flag| flag.get())
	}
}

impl StoreShared {
	pub(crate) fn current(&self) -> Arc<State> {
		self.state.load_full()
	}

	fn rebuild_pipeline(self: &Arc<Self>) {
		let chain = self.middleware.lock().clone();
		let weak = Arc::downgrade(self);
		let api = MiddlewareApi::new(weak.clone());
		let run = compose(&api, &chain, base_dispatch(weak));
		self.pipeline.store(Arc::new(Pipeline { run }));
	}

	/// Terminal link: reducers, snapshot swap, notification.
	fn apply(&self, action: Action) -> Option<Action> {
		let Some(_guard) = DispatchGuard::acquire(&self.gate) else {
			warn!(
				action = action.kind(),
				"nested dispatch refused while this thread is already dispatching"
			);
			return Some(action);
		};

		let prev = self.current();
		let next = self.reduce(&prev, &action);
		if Arc::ptr_eq(&prev, &next) {
			trace!(action = action.kind(), "dispatch left state unchanged");
			return Some(action);
		}

		self.state.store(Arc::clone(&next));
		self.subscribers.notify(&next, &prev);
		Some(action)
	}

	fn reduce(&self, prev: &Arc<State>, action: &Action) -> Arc<State> {
		let reducers = self.reducers.read().snapshot();
		// Reducers are contained one by one; this covers the draft itself.
		let produced = contain(|| {
			let mut draft = Draft::new(prev);
			run_reducer(CORE_REDUCER_ID, &self.core, &mut draft, action);
			for (plugin_id, reducer) in &reducers {
				run_reducer(plugin_id, reducer, &mut draft, action);
			}
			draft.finish()
		});
		match produced {
			Ok(next) => next,
			Err(message) => {
				warn!(
					action = action.kind(),
					panic = %message,
					"state transaction failed, keeping previous state"
				);
				Arc::clone(prev)
			}
		}
	}
}

fn run_reducer(plugin_id: &str, reducer: &Reducer, draft: &mut Draft<'_>, action: &Action) {
	match contain(|| reducer(draft, action)) {
		Ok(Ok(())) => {}
		Ok(Err(error)) => warn!(
			plugin = plugin_id,
			action = action.kind(),
			payload = ?action.payload(),
			error = %error,
			"reducer failed"
		),
		Err(message) => warn!(
			plugin = plugin_id,
			action = action.kind(),
			payload = ?action.payload(),
			panic = %message,
			"reducer panicked"
		),
	}
}

fn base_dispatch(store: Weak<StoreShared>) -> Next {
	next_fn(move |action| match store.upgrade() {
		Some(shared) => shared.apply(action),
		None => Some(action),
	})
}

/// Marks a base dispatch in progress on this thread; released on drop,
/// unwinding included.
///
/// Another thread blocks in [`acquire`](Self::acquire) until the running
/// dispatch finishes. Only a re-entry from the same thread is refused.
struct DispatchGuard<'a>(ReentrantMutexGuard<'a, Cell<bool>>);

impl<'a> DispatchGuard<'a> {
	fn acquire(gate: &'a ReentrantMutex<Cell<bool>>) -> Option<Self> {
		let flag = gate.lock();
		if flag.replace(true) {
			return None;
		}
		Some(Self(flag))
	}
}

impl Drop for DispatchGuard<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

#[cfg(test)]
mod tests;
