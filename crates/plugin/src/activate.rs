//! The activation pass.

use std::sync::Arc;

use anyhow::Context;
use quire_store::panic::contain;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::api::PluginApi;
use crate::def::PluginDef;
use crate::error::GraphError;
use crate::events::{ACTIVATION_ABORTED, PLUGINS_ACTIVATED};
use crate::graph::activation_order;
use crate::host::HostInner;
use crate::registry::PluginStatus;

/// Outcome of one activation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationSummary {
	/// Full dependency order, including plugins that were already settled.
	pub order: Vec<String>,
	/// Plugins that reached `active` in this pass.
	pub activated: Vec<String>,
	/// Plugins that entered `error` in this pass, with the reason.
	pub failed: Vec<(String, String)>,
}

impl ActivationSummary {
	pub fn is_clean(&self) -> bool {
		self.failed.is_empty()
	}
}

pub(crate) fn activate_all(host: &Arc<HostInner>) -> Result<ActivationSummary, GraphError> {
	let graph = host.registry.read().dependency_graph();
	let order = match activation_order(&graph) {
		Ok(order) => order,
		Err(err) => {
			error!(error = %err, "plugin activation aborted");
			host.events
				.publish(ACTIVATION_ABORTED, json!({ "error": err.to_string() }));
			return Err(err);
		}
	};

	let mut summary = ActivationSummary {
		order: order.clone(),
		..ActivationSummary::default()
	};

	for id in &order {
		let pending = {
			let registry = host.registry.read();
			match registry.status(id) {
				Some(PluginStatus::Registered) => registry.definition(id),
				_ => None,
			}
		};
		let Some(def) = pending else {
			continue;
		};

		if let Some(missing) = inactive_dependency(host, &def) {
			let message = format!("dependency {missing} is not active");
			fail(host, id, message, &mut summary);
			continue;
		}

		host.registry.write().set_status(id, PluginStatus::Activating);
		let api = PluginApi::new(Arc::clone(host), id);
		match contain(|| run_hooks(host, &def, &api)) {
			Ok(Ok(())) => {
				host.registry.write().set_status(id, PluginStatus::Active);
				debug!(plugin = %id, "plugin active");
				summary.activated.push(id.clone());
			}
			Ok(Err(err)) => fail(host, id, format!("{err:#}"), &mut summary),
			Err(panic) => fail(host, id, format!("panicked: {panic}"), &mut summary),
		}
	}

	if summary.is_clean() {
		info!(activated = summary.activated.len(), "plugins activated");
	} else {
		let failed: Vec<&str> = summary.failed.iter().map(|(id, _)| id.as_str()).collect();
		error!(
			count = failed.len(),
			plugins = ?failed,
			activated = summary.activated.len(),
			"some plugins failed to activate"
		);
	}

	match serde_json::to_value(&summary) {
		Ok(payload) => {
			host.events.publish(PLUGINS_ACTIVATED, payload);
		}
		Err(err) => warn!(error = %err, "activation summary could not be encoded"),
	}
	Ok(summary)
}

fn inactive_dependency<'a>(host: &HostInner, def: &'a PluginDef) -> Option<&'a str> {
	let registry = host.registry.read();
	def.dependencies()
		.iter()
		.find(|dep| registry.status(dep) != Some(PluginStatus::Active))
		.map(String::as_str)
}

fn fail(host: &HostInner, id: &str, message: String, summary: &mut ActivationSummary) {
	warn!(plugin = id, error = %message, "plugin activation failed");
	host.registry.write().fail(id, message.clone());
	let cancelled = host.tasks.cancel_plugin(id);
	if cancelled > 0 {
		debug!(plugin = id, tasks = cancelled, "cancelled tasks of failed plugin");
	}
	summary.failed.push((id.to_owned(), message));
}

/// Runs the lifecycle hooks in their fixed order. The first failure stops
/// the remaining hooks of this plugin.
fn run_hooks(host: &HostInner, def: &PluginDef, api: &PluginApi) -> anyhow::Result<()> {
	let id = def.id();
	let hooks = &def.hooks;

	if let Some(init) = &hooks.init {
		init(api).context("init failed")?;
	}
	if let Some(factory) = &hooks.reducer {
		let reducer = factory(api).context("reducer hook failed")?;
		host.store.register_reducer(id, reducer);
	}
	if let Some(factory) = &hooks.middleware {
		let middleware = factory(api).context("middleware hook failed")?;
		host.store.register_middleware(id, middleware);
	}
	if let Some(factory) = &hooks.ui_slots {
		for (slot, renderer) in factory(api).context("ui slot hook failed")? {
			host.ui.register_slot(id, &slot, renderer);
		}
	}
	if let Some(factory) = &hooks.services {
		for (name, instance) in factory(api).context("services hook failed")? {
			if let Err(err) = host.services.register(id, &name, instance) {
				warn!(plugin = id, service = %name, error = %err, "service not installed");
			}
		}
	}
	if let Some(factory) = &hooks.api {
		let public = factory(api).context("api hook failed")?;
		host.registry.write().set_api(id, public);
	}
	if let Some(on_activate) = &hooks.on_activate {
		on_activate(api).context("on_activate failed")?;
	}
	Ok(())
}
