//! Command execution against an activated plugin host.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use quire_plugin::{AutoDismiss, PluginApi, PluginHost, Provides, SlotRegistry};
use quire_state::{Action, Note, State, StatusLevel, kinds};
use quire_store::{Persistence, Store, Subscription};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::cli::Command;
use crate::config::CliConfig;
use crate::plugins::{self, SIDEBAR_SLOT};
use crate::sink::{JsonFileSink, load_persisted};

/// Id the front end uses when it acts through the plugin facade.
const FRONTEND_ID: &str = "quire";

pub struct App {
	host: PluginHost,
	slots: Arc<SlotRegistry>,
	api: PluginApi,
	_persistence: Subscription,
}

impl App {
	/// Activates the bundled plugins, restores `state_path` and starts
	/// writing changes back to it.
	pub fn start(config: &CliConfig, state_path: &Path) -> anyhow::Result<Self> {
		let store = Store::new(State::default());
		let slots = Arc::new(SlotRegistry::new());
		let host = PluginHost::with_ui(store.clone(), config.host.clone(), slots.clone());

		for def in plugins::bundled() {
			let id = def.id().to_owned();
			host.register(def)
				.with_context(|| format!("registering bundled plugin {id}"))?;
		}
		let summary = host.activate_all().context("activating plugins")?;
		debug!(order = ?summary.order, failed = summary.failed.len(), "plugins ready");

		if let Some(persisted) = load_persisted(state_path)? {
			Persistence::restore(&store, &persisted);
			info!(path = %state_path.display(), notes = store.get_state().notes.len(), "state restored");
		}
		seed_plugin_settings(&store, config);

		let persistence = Persistence::attach(&store, Arc::new(JsonFileSink::new(state_path)));
		let api = host.api_for(FRONTEND_ID);
		Ok(Self {
			host,
			slots,
			api,
			_persistence: persistence,
		})
	}

	pub fn store(&self) -> &Store {
		self.host.store()
	}

	pub fn run(&self, command: &Command, out: &mut impl Write) -> anyhow::Result<()> {
		match command {
			Command::Add {
				title,
				content,
				note_type,
			} => self.add(title.as_deref(), content.as_deref(), note_type.as_deref(), out),
			Command::List => self.list(out),
			Command::Show { id } => self.show(id, out),
			Command::Delete { id } => self.delete(id, out),
			Command::Plugins => self.plugins(out),
		}
	}

	fn add(
		&self,
		title: Option<&str>,
		content: Option<&str>,
		note_type: Option<&str>,
		out: &mut impl Write,
	) -> anyhow::Result<()> {
		let before = self.store().get_state();
		self.store().dispatch(Action::with_payload(
			kinds::ADD_NOTE,
			json!({ "title": title, "content": content, "type": note_type }),
		));
		let state = self.store().get_state();
		let created = state
			.selected_note()
			.filter(|note| !before.notes.contains_key(&note.id))
			.cloned();
		let Some(note) = created else {
			bail!("note was not created");
		};

		self.api.publish_event("note:added", json!(note.id));
		self.api.show_status(
			format!("Added \"{}\"", note.title),
			StatusLevel::Success,
			AutoDismiss::DEFAULT,
		);
		writeln!(out, "{}", note.id)?;
		Ok(())
	}

	fn list(&self, out: &mut impl Write) -> anyhow::Result<()> {
		let state = self.store().get_state();
		for note in state.ordered_notes() {
			writeln!(out, "{}\t{}\t{}", note.id, note.title, note.tags.join(","))?;
		}
		if let Some(words) = state
			.plugin_runtime(plugins::WORD_COUNT_ID)
			.and_then(|totals| totals["words"].as_u64())
		{
			writeln!(out, "{} notes, {words} words", state.notes.len())?;
		}
		Ok(())
	}

	fn show(&self, id: &str, out: &mut impl Write) -> anyhow::Result<()> {
		let Some(note) = self.api.get_note(id) else {
			bail!("no note with id {id}");
		};
		write_note(&note, out)?;
		Ok(())
	}

	fn delete(&self, id: &str, out: &mut impl Write) -> anyhow::Result<()> {
		if self.api.get_note(id).is_none() {
			bail!("no note with id {id}");
		}
		self.store()
			.dispatch(Action::with_payload(kinds::DELETE_NOTE, json!({ "noteId": id })));
		self.api.publish_event("note:deleted", json!(id));
		writeln!(out, "deleted {id}")?;
		Ok(())
	}

	fn plugins(&self, out: &mut impl Write) -> anyhow::Result<()> {
		let rows = self.host.with_registry(|registry| {
			registry
				.statuses()
				.into_iter()
				.map(|(id, status)| {
					let version = registry
						.definition(&id)
						.and_then(|def| def.version_str().map(str::to_owned))
						.unwrap_or_else(|| "-".to_owned());
					let provides = registry.provides(&id).map(describe_provides).unwrap_or_default();
					let error = registry.error(&id).unwrap_or_default().to_owned();
					(id, status, version, provides, error)
				})
				.collect::<Vec<_>>()
		});

		for (id, status, version, provides, error) in rows {
			write!(out, "{id:<14} {status:<10} {version:<8} {provides}")?;
			if !error.is_empty() {
				write!(out, "  ({error})")?;
			}
			writeln!(out)?;
		}

		let selected = self.store().get_state().ui.selected_note_id.clone();
		let props = self.host.slot_props(selected.as_ref().map(|id| id.as_str()));
		for rendered in self.slots.render(SIDEBAR_SLOT, &props) {
			writeln!(out, "\n[{}]\n{}", rendered.plugin_id, rendered.output)?;
		}
		Ok(())
	}
}

/// Applies `[plugins.<id>]` tables from the config to plugins that have no
/// settings in the restored state yet.
fn seed_plugin_settings(store: &Store, config: &CliConfig) {
	for (plugin_id, table) in &config.plugins {
		if store.get_state().plugin_settings(plugin_id).is_some() {
			continue;
		}
		let settings = match serde_json::to_value(table) {
			Ok(settings) => settings,
			Err(error) => {
				warn!(plugin = %plugin_id, error = %error, "ignoring plugin settings from config");
				continue;
			}
		};
		store.dispatch(Action::with_payload(
			kinds::UPDATE_PLUGIN_SETTINGS,
			json!({ "pluginId": plugin_id, "settings": settings }),
		));
	}
}

fn describe_provides(provides: Provides) -> String {
	let names: Vec<&str> = provides.iter_names().map(|(name, _)| name).collect();
	names.join(",").to_lowercase()
}

fn write_note(note: &Note, out: &mut impl Write) -> std::io::Result<()> {
	writeln!(out, "id:      {}", note.id)?;
	writeln!(out, "title:   {}", note.title)?;
	if let Some(note_type) = &note.note_type {
		writeln!(out, "type:    {note_type}")?;
	}
	writeln!(out, "tags:    {}", note.tags.join(", "))?;
	writeln!(out, "created: {}", note.created_at.to_rfc3339())?;
	writeln!(out, "updated: {}", note.updated_at.to_rfc3339())?;
	if !note.content.is_empty() {
		writeln!(out, "\n{}", note.content)?;
	}
	Ok(())
}
