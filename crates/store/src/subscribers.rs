use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use quire_state::State;
use tracing::warn;

use crate::panic::contain;

/// Change listener, called with `(new_state, old_state)`.
pub type Listener = Arc<dyn Fn(&Arc<State>, &Arc<State>) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Subscribers {
	next_id: AtomicU64,
	entries: Mutex<Vec<(u64, Listener)>>,
}

impl Subscribers {
	pub fn add(self: &Arc<Self>, listener: Listener) -> Subscription {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		self.entries.lock().push((id, listener));
		Subscription {
			id,
			owner: Arc::downgrade(self),
		}
	}

	fn remove(&self, id: u64) -> bool {
		let mut entries = self.entries.lock();
		let before = entries.len();
		entries.retain(|(existing, _)| *existing != id);
		entries.len() != before
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Calls every listener registered at the time of the call.
	///
	/// The list is cloned first so listeners may subscribe or unsubscribe
	/// while being notified. Each call is guarded on its own.
	pub fn notify(&self, next: &Arc<State>, prev: &Arc<State>) {
		let listeners: Vec<(u64, Listener)> = self.entries.lock().clone();
		for (id, listener) in listeners {
			if let Err(message) = contain(|| listener(next, prev)) {
				warn!(subscriber = id, panic = %message, "subscriber panicked");
			}
		}
	}
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
	id: u64,
	owner: Weak<Subscribers>,
}

impl Subscription {
	/// Removes the listener. Returns false when it was already gone.
	pub fn unsubscribe(self) -> bool {
		self.owner.upgrade().is_some_and(|owner| owner.remove(self.id))
	}
}
