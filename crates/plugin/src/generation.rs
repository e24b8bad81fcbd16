//! Generation tokens for plugin background work.
//!
//! Starting a task under a key bumps that key's generation and cancels the
//! token handed out for the previous one, so results computed for a stale
//! generation can be recognised and dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Token for one generation of a plugin task.
#[derive(Debug, Clone)]
pub struct TaskToken {
	plugin_id: Arc<str>,
	key: Arc<str>,
	generation: u64,
	latest: Arc<AtomicU64>,
	cancel: CancellationToken,
}

impl TaskToken {
	pub fn plugin_id(&self) -> &str {
		&self.plugin_id
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub const fn generation(&self) -> u64 {
		self.generation
	}

	/// True while no newer task started under the same key and the token
	/// was not cancelled.
	pub fn is_current(&self) -> bool {
		!self.cancel.is_cancelled() && self.latest.load(Ordering::Acquire) == self.generation
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Resolves once the token is cancelled or superseded.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}
}

struct Slot {
	latest: Arc<AtomicU64>,
	cancel: CancellationToken,
}

/// Per `(plugin, key)` generation slots. Each key counts its own
/// generations from 1; zero means nothing was started.
#[derive(Default)]
pub(crate) struct TaskRegistry {
	slots: Mutex<FxHashMap<(Arc<str>, Arc<str>), Slot>>,
}

impl TaskRegistry {
	pub fn begin(&self, plugin_id: &str, key: &str) -> TaskToken {
		let cancel = CancellationToken::new();
		let plugin_id: Arc<str> = Arc::from(plugin_id);
		let key: Arc<str> = Arc::from(key);

		let mut slots = self.slots.lock();
		let slot = slots
			.entry((Arc::clone(&plugin_id), Arc::clone(&key)))
			.or_insert_with(|| Slot {
				latest: Arc::new(AtomicU64::new(0)),
				cancel: CancellationToken::new(),
			});
		slot.cancel.cancel();
		slot.cancel = cancel.clone();
		let generation = slot.latest.fetch_add(1, Ordering::AcqRel) + 1;

		TaskToken {
			plugin_id,
			key,
			generation,
			latest: Arc::clone(&slot.latest),
			cancel,
		}
	}

	/// Cancels every outstanding token of `plugin_id`. Returns how many keys
	/// were affected.
	pub fn cancel_plugin(&self, plugin_id: &str) -> usize {
		let slots = self.slots.lock();
		let mut cancelled = 0;
		for ((owner, key), slot) in slots.iter() {
			if &**owner == plugin_id && !slot.cancel.is_cancelled() {
				slot.cancel.cancel();
				debug!(plugin = plugin_id, task = %key, "task cancelled");
				cancelled += 1;
			}
		}
		cancelled
	}
}
