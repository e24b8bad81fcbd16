use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;
use quire_plugin::events::{PLUGINS_ACTIVATED, WILDCARD};
use quire_plugin::{Event, PluginDef, SlotProps, slot_renderer};

use super::word_count::{self, WordCounter};

pub const ID: &str = "activity-log";
pub const SIDEBAR_SLOT: &str = "sidebar";
const CAPACITY: usize = 20;

/// Most recent events seen on the bus, oldest first.
#[derive(Debug, Default)]
pub struct ActivityLog {
	entries: Mutex<VecDeque<String>>,
}

impl ActivityLog {
	fn record(&self, entry: String) {
		let mut entries = self.entries.lock();
		if entries.len() == CAPACITY {
			entries.pop_front();
		}
		entries.push_back(entry);
	}

	pub fn recent(&self) -> Vec<String> {
		self.entries.lock().iter().cloned().collect()
	}
}

pub fn plugin() -> PluginDef {
	let log = Arc::new(ActivityLog::default());
	let listener = Arc::clone(&log);
	let sidebar = Arc::clone(&log);

	PluginDef::new(ID, "Activity log")
		.version("0.3.0")
		.init(move |api| {
			let log = Arc::clone(&listener);
			api.subscribe_to_event(WILDCARD, move |event: &Event| log.record(describe(event)));
			Ok(())
		})
		.ui_slots(move |_| {
			let log = Arc::clone(&sidebar);
			Ok(vec![(
				SIDEBAR_SLOT.to_owned(),
				slot_renderer(move |props| render(&log, props)),
			)])
		})
		.api(move |_| Ok(Arc::clone(&log)))
}

fn describe(event: &Event) -> String {
	if event.name == PLUGINS_ACTIVATED {
		let activated = event.payload["activated"].as_array().map_or(0, Vec::len);
		return format!("{activated} plugins activated");
	}
	match &event.payload {
		serde_json::Value::Null => event.name.clone(),
		payload => format!("{} {payload}", event.name),
	}
}

fn render(log: &ActivityLog, props: &SlotProps) -> String {
	let mut out = String::new();
	let words = props
		.lookup
		.service::<WordCounter>(word_count::ID)
		.map(|counter| counter.total(&props.state));
	let _ = write!(out, "{} notes", props.state.notes.len());
	if let Some(words) = words {
		let _ = write!(out, ", {words} words");
	}
	if let Some(note) = props.context_id.as_deref().and_then(|id| props.state.note(id)) {
		let _ = write!(out, "\nselected: {}", note.title);
	}
	for entry in log.recent() {
		let _ = write!(out, "\n- {entry}");
	}
	out
}
