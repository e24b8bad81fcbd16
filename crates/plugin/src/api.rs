//! The capability facade handed to plugin hooks.
//!
//! Plugins never see the store, the registry or each other directly. Every
//! interaction goes through a [`PluginApi`] bound to the calling plugin's
//! id. The facade has no mutators; clones share the same host.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};
use quire_state::{Action, Note, State, StatusLevel, kinds};
use quire_store::{Store, Subscription};
use serde_json::{Value, json};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::{Event, EventSubscription};
use crate::generation::TaskToken;
use crate::host::HostInner;

/// Controls automatic dismissal of status banners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoDismiss {
	/// Banner stays until replaced or cleared.
	Never,
	/// Banner clears after the given delay.
	After(Duration),
	/// Banner clears after the host's configured `status_timeout_ms`.
	#[default]
	Configured,
}

impl AutoDismiss {
	pub const DEFAULT: Self = Self::Configured;
}

/// Stateless helpers exposed as `api.utils()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utils;

impl Utils {
	pub fn new_id(&self) -> String {
		Uuid::new_v4().to_string()
	}

	pub fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

#[derive(Clone)]
pub struct PluginApi {
	plugin_id: Arc<str>,
	host: Arc<HostInner>,
	utils: Utils,
}

impl PluginApi {
	pub(crate) fn new(host: Arc<HostInner>, plugin_id: &str) -> Self {
		Self {
			plugin_id: Arc::from(plugin_id),
			host,
			utils: Utils,
		}
	}

	pub fn plugin_id(&self) -> &str {
		&self.plugin_id
	}

	pub fn dispatch(&self, action: Action) -> Option<Action> {
		self.host.store.dispatch(action)
	}

	pub fn get_state(&self) -> Arc<State> {
		self.host.store.get_state()
	}

	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&Arc<State>, &Arc<State>) + Send + Sync + 'static,
	{
		self.host.store.subscribe(listener)
	}

	pub fn get_note(&self, id: &str) -> Option<Arc<Note>> {
		self.get_state().note(id).cloned()
	}

	pub fn selected_note(&self) -> Option<Arc<Note>> {
		self.get_state().selected_note().cloned()
	}

	/// First note in display order whose type is `note_type`.
	pub fn note_by_type(&self, note_type: &str) -> Option<Arc<Note>> {
		self.get_state().note_by_type(note_type).cloned()
	}

	/// This plugin's own settings slice.
	pub fn settings(&self) -> Option<Value> {
		self.get_state().plugin_settings(&self.plugin_id).cloned()
	}

	/// This plugin's runtime slice.
	pub fn runtime_state(&self) -> Option<Value> {
		self.get_state().plugin_runtime(&self.plugin_id).cloned()
	}

	pub fn cache_entry(&self, key: &str) -> Option<Value> {
		self.get_state().cache_entry(key).cloned()
	}

	pub fn publish_event(&self, name: &str, payload: Value) -> usize {
		self.host.events.publish(name, payload)
	}

	pub fn subscribe_to_event<F>(&self, name: impl Into<String>, handler: F) -> EventSubscription
	where
		F: Fn(&Event) + Send + Sync + 'static,
	{
		self.host.events.subscribe(name, handler)
	}

	/// Shows a banner and schedules its removal. Returns the banner id.
	///
	/// The clear names the banner id, so it never removes a newer banner.
	pub fn show_status(&self, message: impl Into<String>, level: StatusLevel, dismiss: AutoDismiss) -> u64 {
		let id = self.host.banner_ids.fetch_add(1, Ordering::Relaxed) + 1;
		self.dispatch(Action::with_payload(
			kinds::SET_STATUS,
			json!({ "id": id, "message": message.into(), "level": level }),
		));

		let delay = match dismiss {
			AutoDismiss::Never => return id,
			AutoDismiss::After(delay) => delay,
			AutoDismiss::Configured => self.host.config.status_timeout(),
		};
		schedule_clear(self.host.store.clone(), id, delay);
		id
	}

	pub fn get_service<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
		let service = self.host.services.get(name);
		if service.is_none() {
			debug!(plugin = %self.plugin_id, service = name, "service unavailable");
		}
		service
	}

	/// Public API of another plugin, only while that plugin is `active`.
	pub fn get_plugin_api<T: Any + Send + Sync>(&self, plugin_id: &str) -> Option<Arc<T>> {
		self.host.plugin_api(&self.plugin_id, plugin_id)
	}

	/// Starts a new generation for `key`, superseding the previous token.
	pub fn begin_task(&self, key: &str) -> TaskToken {
		self.host.tasks.begin(&self.plugin_id, key)
	}

	/// Dispatches only if `token` is still current; stale results are dropped.
	pub fn dispatch_if_current(&self, token: &TaskToken, action: Action) -> Option<Action> {
		if !token.is_current() {
			debug!(
				plugin = %self.plugin_id,
				task = token.key(),
				generation = token.generation(),
				action = action.kind(),
				"dropping stale task result"
			);
			return None;
		}
		self.dispatch(action)
	}

	pub fn utils(&self) -> &Utils {
		&self.utils
	}
}

fn schedule_clear(store: Store, id: u64, delay: Duration) {
	let clear = move || {
		store.dispatch(Action::with_payload(kinds::CLEAR_STATUS, json!({ "id": id })));
	};

	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		handle.spawn(async move {
			tokio::time::sleep(delay).await;
			clear();
		});
		return;
	}

	let spawned = std::thread::Builder::new()
		.name("quire-status-clear".into())
		.spawn(move || {
			std::thread::sleep(delay);
			clear();
		});
	if let Err(error) = spawned {
		warn!(status = id, error = %error, "could not schedule status clear");
	}
}
