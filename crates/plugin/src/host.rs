//! Wires the store, plugin registry and collaborators together.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use parking_lot::RwLock;
use quire_store::{Store, logging_middleware};
use tracing::{debug, warn};

use crate::activate::{ActivationSummary, activate_all};
use crate::api::PluginApi;
use crate::config::HostConfig;
use crate::def::PluginDef;
use crate::error::{GraphError, RegistrationError};
use crate::events::EventBus;
use crate::generation::TaskRegistry;
use crate::registry::{PluginRegistry, PluginStatus};
use crate::services::ServiceRegistry;
use crate::ui::{Dispatcher, ServiceLookup, SlotProps, SlotRegistry, UiHost};

/// Registrant id of the tracing middleware installed by `log_middleware`.
pub const LOG_MIDDLEWARE_ID: &str = "core:log";

pub(crate) struct HostInner {
	pub store: Store,
	pub config: HostConfig,
	pub registry: RwLock<PluginRegistry>,
	pub services: ServiceRegistry,
	pub events: EventBus,
	pub ui: Arc<dyn UiHost>,
	pub tasks: TaskRegistry,
	pub banner_ids: AtomicU64,
}

impl HostInner {
	/// Status-gated API lookup shared by the facade and slot props.
	pub fn plugin_api<T: Any + Send + Sync>(&self, requester: &str, plugin_id: &str) -> Option<Arc<T>> {
		let found = self.registry.read().api(plugin_id);
		let (status, api) = match found {
			Some(found) => found,
			None => {
				warn!(plugin = requester, requested = plugin_id, "plugin api requested for unknown plugin");
				return None;
			}
		};
		if status != PluginStatus::Active {
			warn!(plugin = requester, requested = plugin_id, status = %status, "plugin api requested before activation");
			return None;
		}
		let api = api?;
		match api.downcast::<T>() {
			Ok(api) => Some(api),
			Err(_) => {
				debug!(
					plugin = requester,
					requested = plugin_id,
					expected = std::any::type_name::<T>(),
					"plugin api type mismatch"
				);
				None
			}
		}
	}
}

/// Owns plugin registration and activation for one store.
///
/// Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct PluginHost {
	inner: Arc<HostInner>,
}

impl PluginHost {
	/// Creates a host that collects slot registrations in a fresh
	/// [`SlotRegistry`].
	pub fn new(store: Store, config: HostConfig) -> Self {
		Self::with_ui(store, config, Arc::new(SlotRegistry::new()))
	}

	pub fn with_ui(store: Store, config: HostConfig, ui: Arc<dyn UiHost>) -> Self {
		if config.log_middleware {
			store.register_middleware(LOG_MIDDLEWARE_ID, logging_middleware());
		}
		let inner = HostInner {
			services: ServiceRegistry::new(config.service_policy),
			store,
			config,
			registry: RwLock::new(PluginRegistry::new()),
			events: EventBus::new(),
			ui,
			tasks: TaskRegistry::default(),
			banner_ids: AtomicU64::new(0),
		};
		Self { inner: Arc::new(inner) }
	}

	pub fn register(&self, def: PluginDef) -> Result<(), RegistrationError> {
		self.inner.registry.write().register(def)
	}

	/// Activates every plugin still `registered`, in dependency order.
	///
	/// Fails as a whole only when the dependency graph cannot be ordered;
	/// per-plugin hook failures are reported in the summary.
	pub fn activate_all(&self) -> Result<ActivationSummary, GraphError> {
		activate_all(&self.inner)
	}

	pub fn status(&self, id: &str) -> Option<PluginStatus> {
		self.inner.registry.read().status(id)
	}

	pub fn error(&self, id: &str) -> Option<String> {
		self.inner.registry.read().error(id).map(str::to_owned)
	}

	pub fn statuses(&self) -> Vec<(String, PluginStatus)> {
		self.inner.registry.read().statuses()
	}

	/// Runs `f` against the registry under a read lock.
	pub fn with_registry<R>(&self, f: impl FnOnce(&PluginRegistry) -> R) -> R {
		f(&self.inner.registry.read())
	}

	pub fn store(&self) -> &Store {
		&self.inner.store
	}

	pub fn config(&self) -> &HostConfig {
		&self.inner.config
	}

	pub fn events(&self) -> &EventBus {
		&self.inner.events
	}

	pub fn services(&self) -> &ServiceRegistry {
		&self.inner.services
	}

	/// Facade bound to `plugin_id`, for host-side code acting on a plugin's
	/// behalf.
	pub fn api_for(&self, plugin_id: &str) -> PluginApi {
		PluginApi::new(Arc::clone(&self.inner), plugin_id)
	}

	/// Props for rendering slots against the current state.
	pub fn slot_props(&self, context_id: Option<&str>) -> SlotProps {
		SlotProps {
			state: self.inner.store.get_state(),
			dispatch: Dispatcher::new(self.inner.store.clone()),
			lookup: ServiceLookup::new(Arc::clone(&self.inner)),
			context_id: context_id.map(str::to_owned),
		}
	}
}
