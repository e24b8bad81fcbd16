//! Extension points handed to the UI collaborator.
//!
//! The core never renders. It forwards each plugin's slot renderers to a
//! [`UiHost`] and builds the [`SlotProps`] a renderer receives.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use quire_state::{Action, State};
use quire_store::Store;
use quire_store::panic::contain;
use tracing::{debug, warn};

use crate::host::HostInner;

/// Renders one slot contribution to text.
pub type SlotRenderer = Arc<dyn Fn(&SlotProps) -> String + Send + Sync>;

pub fn slot_renderer<F>(f: F) -> SlotRenderer
where
	F: Fn(&SlotProps) -> String + Send + Sync + 'static,
{
	Arc::new(f)
}

/// Receives slot registrations during activation.
pub trait UiHost: Send + Sync {
	fn register_slot(&self, plugin_id: &str, slot: &str, renderer: SlotRenderer);
}

/// Store-bound dispatch function handed to renderers.
#[derive(Clone)]
pub struct Dispatcher {
	store: Store,
}

impl Dispatcher {
	pub(crate) fn new(store: Store) -> Self {
		Self { store }
	}

	pub fn dispatch(&self, action: Action) -> Option<Action> {
		self.store.dispatch(action)
	}
}

/// Service and plugin API lookup handed to renderers.
#[derive(Clone)]
pub struct ServiceLookup {
	host: Arc<HostInner>,
}

impl ServiceLookup {
	pub(crate) fn new(host: Arc<HostInner>) -> Self {
		Self { host }
	}

	pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
		self.host.services.get(name)
	}

	pub fn plugin_api<T: Any + Send + Sync>(&self, plugin_id: &str) -> Option<Arc<T>> {
		self.host.plugin_api("ui", plugin_id)
	}
}

/// Everything a slot renderer may use.
#[derive(Clone)]
pub struct SlotProps {
	pub state: Arc<State>,
	pub dispatch: Dispatcher,
	pub lookup: ServiceLookup,
	/// Entity the slot is rendered for, typically the selected note.
	pub context_id: Option<String>,
}

impl fmt::Debug for SlotProps {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SlotProps")
			.field("notes", &self.state.notes.len())
			.field("context_id", &self.context_id)
			.finish_non_exhaustive()
	}
}

/// One contribution's rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSlot {
	pub plugin_id: String,
	pub output: String,
}

struct SlotEntry {
	plugin_id: String,
	renderer: SlotRenderer,
}

/// In-memory [`UiHost`]: slots keep first-registration order, contributions
/// keep plugin activation order.
#[derive(Default)]
pub struct SlotRegistry {
	slots: RwLock<IndexMap<String, Vec<SlotEntry>>>,
}

impl SlotRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn slots(&self) -> Vec<String> {
		self.slots.read().keys().cloned().collect()
	}

	pub fn contributors(&self, slot: &str) -> Vec<String> {
		self.slots
			.read()
			.get(slot)
			.map(|entries| entries.iter().map(|entry| entry.plugin_id.clone()).collect())
			.unwrap_or_default()
	}

	/// Renders every contribution to `slot`. A panicking renderer is logged
	/// and left out.
	pub fn render(&self, slot: &str, props: &SlotProps) -> Vec<RenderedSlot> {
		let entries: Vec<(String, SlotRenderer)> = self
			.slots
			.read()
			.get(slot)
			.map(|entries| {
				entries
					.iter()
					.map(|entry| (entry.plugin_id.clone(), Arc::clone(&entry.renderer)))
					.collect()
			})
			.unwrap_or_default();

		entries
			.into_iter()
			.filter_map(|(plugin_id, renderer)| match contain(|| renderer(props)) {
				Ok(output) => Some(RenderedSlot { plugin_id, output }),
				Err(message) => {
					warn!(plugin = %plugin_id, slot, panic = %message, "slot renderer panicked");
					None
				}
			})
			.collect()
	}
}

impl UiHost for SlotRegistry {
	fn register_slot(&self, plugin_id: &str, slot: &str, renderer: SlotRenderer) {
		self.slots
			.write()
			.entry(slot.to_owned())
			.or_default()
			.push(SlotEntry {
				plugin_id: plugin_id.to_owned(),
				renderer,
			});
		debug!(plugin = plugin_id, slot, "ui slot registered");
	}
}
