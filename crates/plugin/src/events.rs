//! Named publish/subscribe channel between plugins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use quire_store::panic::contain;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{trace, warn};

/// Subscribing to this name receives every event.
pub const WILDCARD: &str = "*";

/// Published once per activation pass with the [`ActivationSummary`](crate::ActivationSummary).
pub const PLUGINS_ACTIVATED: &str = "core:plugins-activated";
/// Published when the dependency graph could not be ordered.
pub const ACTIVATION_ABORTED: &str = "core:plugin-activation-aborted";

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
	pub name: String,
	pub payload: Value,
}

pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Default)]
struct Listeners {
	next_id: AtomicU64,
	by_name: Mutex<FxHashMap<String, Vec<(u64, EventHandler)>>>,
}

/// Cheap to clone; clones share listeners.
#[derive(Clone, Default)]
pub struct EventBus {
	listeners: Arc<Listeners>,
}

impl EventBus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler` for `name`, or for everything with [`WILDCARD`].
	pub fn subscribe<F>(&self, name: impl Into<String>, handler: F) -> EventSubscription
	where
		F: Fn(&Event) + Send + Sync + 'static,
	{
		let name = name.into();
		let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
		self.listeners
			.by_name
			.lock()
			.entry(name.clone())
			.or_default()
			.push((id, Arc::new(handler)));
		EventSubscription {
			name,
			id,
			owner: Arc::downgrade(&self.listeners),
		}
	}

	/// Delivers the event to exact-name listeners, then wildcard listeners.
	/// Returns how many handlers ran to completion.
	pub fn publish(&self, name: &str, payload: Value) -> usize {
		let handlers: Vec<(u64, EventHandler)> = {
			let by_name = self.listeners.by_name.lock();
			let exact = by_name.get(name).into_iter().flatten();
			let wildcard = by_name.get(WILDCARD).into_iter().flatten();
			exact.chain(wildcard).cloned().collect()
		};
		if handlers.is_empty() {
			trace!(event = name, "event published without listeners");
			return 0;
		}

		let event = Event {
			name: name.to_owned(),
			payload,
		};
		handlers
			.into_iter()
			.filter(|(id, handler)| match contain(|| handler(&event)) {
				Ok(()) => true,
				Err(message) => {
					warn!(event = name, listener = id, panic = %message, "event handler panicked");
					false
				}
			})
			.count()
	}

	pub fn has_listeners(&self, name: &str) -> bool {
		let by_name = self.listeners.by_name.lock();
		[name, WILDCARD]
			.iter()
			.any(|key| by_name.get(*key).is_some_and(|bucket| !bucket.is_empty()))
	}
}

/// Handle for one event listener. Dropping it leaves the listener in place.
#[derive(Debug)]
pub struct EventSubscription {
	name: String,
	id: u64,
	owner: Weak<Listeners>,
}

impl EventSubscription {
	pub fn unsubscribe(self) -> bool {
		let Some(listeners) = self.owner.upgrade() else {
			return false;
		};
		let mut by_name = listeners.by_name.lock();
		let Some(bucket) = by_name.get_mut(&self.name) else {
			return false;
		};
		let before = bucket.len();
		bucket.retain(|(id, _)| *id != self.id);
		let removed = bucket.len() != before;
		if bucket.is_empty() {
			by_name.remove(&self.name);
		}
		removed
	}
}
