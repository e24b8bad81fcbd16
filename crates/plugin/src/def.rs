//! Plugin definitions.
//!
//! A [`PluginDef`] is plain data plus optional lifecycle hooks. Which hooks
//! are present is captured once, at registration, as a [`Provides`] set.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use quire_store::{Middleware, Reducer};

use crate::api::PluginApi;
use crate::services::AnyService;
use crate::ui::SlotRenderer;

/// Hook returning nothing but success or failure.
pub type Hook = Arc<dyn Fn(&PluginApi) -> anyhow::Result<()> + Send + Sync>;
/// Hook producing a value the host installs somewhere.
pub type Factory<T> = Arc<dyn Fn(&PluginApi) -> anyhow::Result<T> + Send + Sync>;

bitflags! {
	/// Optional capabilities a plugin contributes beyond `init`.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct Provides: u8 {
		const REDUCER = 1 << 0;
		const MIDDLEWARE = 1 << 1;
		const UI_SLOTS = 1 << 2;
		const SERVICES = 1 << 3;
		const API = 1 << 4;
		const ON_ACTIVATE = 1 << 5;
	}
}

/// Named services contributed by a plugin.
#[derive(Default, Clone)]
pub struct ServiceSet {
	entries: Vec<(String, AnyService)>,
}

impl ServiceSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `instance` under `name`. Later lookups downcast to `T`.
	pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, instance: Arc<T>) -> Self {
		self.entries.push((name.into(), instance));
		self
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl IntoIterator for ServiceSet {
	type Item = (String, AnyService);
	type IntoIter = std::vec::IntoIter<(String, AnyService)>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}

/// Slot name to renderer pairs contributed by a plugin.
pub type UiSlots = Vec<(String, SlotRenderer)>;

#[derive(Default, Clone)]
pub(crate) struct Hooks {
	pub init: Option<Hook>,
	pub reducer: Option<Factory<Reducer>>,
	pub middleware: Option<Factory<Middleware>>,
	pub ui_slots: Option<Factory<UiSlots>>,
	pub services: Option<Factory<ServiceSet>>,
	pub api: Option<Factory<AnyService>>,
	pub on_activate: Option<Hook>,
}

/// Static description of a plugin.
#[derive(Clone)]
pub struct PluginDef {
	id: String,
	name: String,
	version: Option<String>,
	dependencies: Vec<String>,
	pub(crate) hooks: Hooks,
}

impl PluginDef {
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			version: None,
			dependencies: Vec::new(),
			hooks: Hooks::default(),
		}
	}

	pub fn version(mut self, version: impl Into<String>) -> Self {
		self.version = Some(version.into());
		self
	}

	/// Declares a plugin that must be active before this one activates.
	pub fn depends_on(mut self, id: impl Into<String>) -> Self {
		let id = id.into();
		if !self.dependencies.contains(&id) {
			self.dependencies.push(id);
		}
		self
	}

	/// Required. Runs first during activation.
	pub fn init<F>(mut self, f: F) -> Self
	where
		F: Fn(&PluginApi) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		self.hooks.init = Some(Arc::new(f));
		self
	}

	pub fn reducer<F>(mut self, f: F) -> Self
	where
		F: Fn(&PluginApi) -> anyhow::Result<Reducer> + Send + Sync + 'static,
	{
		self.hooks.reducer = Some(Arc::new(f));
		self
	}

	pub fn middleware<F>(mut self, f: F) -> Self
	where
		F: Fn(&PluginApi) -> anyhow::Result<Middleware> + Send + Sync + 'static,
	{
		self.hooks.middleware = Some(Arc::new(f));
		self
	}

	pub fn ui_slots<F>(mut self, f: F) -> Self
	where
		F: Fn(&PluginApi) -> anyhow::Result<UiSlots> + Send + Sync + 'static,
	{
		self.hooks.ui_slots = Some(Arc::new(f));
		self
	}

	pub fn services<F>(mut self, f: F) -> Self
	where
		F: Fn(&PluginApi) -> anyhow::Result<ServiceSet> + Send + Sync + 'static,
	{
		self.hooks.services = Some(Arc::new(f));
		self
	}

	/// Public API other plugins reach through `get_plugin_api`.
	pub fn api<T, F>(mut self, f: F) -> Self
	where
		T: Any + Send + Sync,
		F: Fn(&PluginApi) -> anyhow::Result<Arc<T>> + Send + Sync + 'static,
	{
		self.hooks.api = Some(Arc::new(move |api: &PluginApi| {
			f(api).map(|value| value as AnyService)
		}));
		self
	}

	/// Runs last, once every other hook succeeded.
	pub fn on_activate<F>(mut self, f: F) -> Self
	where
		F: Fn(&PluginApi) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		self.hooks.on_activate = Some(Arc::new(f));
		self
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn version_str(&self) -> Option<&str> {
		self.version.as_deref()
	}

	pub fn dependencies(&self) -> &[String] {
		&self.dependencies
	}

	pub fn has_init(&self) -> bool {
		self.hooks.init.is_some()
	}

	pub fn provides(&self) -> Provides {
		let hooks = &self.hooks;
		let mut provides = Provides::empty();
		provides.set(Provides::REDUCER, hooks.reducer.is_some());
		provides.set(Provides::MIDDLEWARE, hooks.middleware.is_some());
		provides.set(Provides::UI_SLOTS, hooks.ui_slots.is_some());
		provides.set(Provides::SERVICES, hooks.services.is_some());
		provides.set(Provides::API, hooks.api.is_some());
		provides.set(Provides::ON_ACTIVATE, hooks.on_activate.is_some());
		provides
	}
}

impl fmt::Debug for PluginDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PluginDef")
			.field("id", &self.id)
			.field("name", &self.name)
			.field("version", &self.version)
			.field("dependencies", &self.dependencies)
			.field("provides", &self.provides())
			.finish()
	}
}
