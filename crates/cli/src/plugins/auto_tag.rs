
use quire_plugin::PluginDef;
use quire_state::kinds;
use quire_store::{middleware, next_fn};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::warn;

use super::word_count::{self, WordCounter};

pub const ID: &str = "auto-tag";
const LONG_TAG: &str = "long";

/// Settings read from `settings.plugins["auto-tag"]` on every new note.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
struct TagRules {
	tag: String,
	/// Word count from which a note is also tagged `long`.
	long_after: usize,
}

impl Default for TagRules {
	fn default() -> Self {
		Self {
			tag: "inbox".to_owned(),
			long_after: 200,
		}
	}
}

impl TagRules {
	fn from_settings(settings: Option<&Value>) -> Self {
		settings
			.and_then(|value| Self::deserialize(value).ok())
			.unwrap_or_default()
	}
}

pub fn plugin() -> PluginDef {
	PluginDef::new(ID, "Auto tag")
		.version("0.3.0")
		.depends_on(word_count::ID)
		.init(|api| {
			if api.get_service::<WordCounter>(word_count::ID).is_none() {
				warn!(plugin = ID, "word-count service missing, long notes will not be tagged");
			}
			Ok(())
		})
		.middleware(|api| {
			let counter = api.get_service::<WordCounter>(word_count::ID);
			Ok(middleware(move |view, next| {
				let counter = counter.clone();
				next_fn(move |action| {
					if !action.is(kinds::ADD_NOTE) {
						return next(action);
					}
					let rules = TagRules::from_settings(view.get_state().plugin_settings(ID));
					next(action.map_payload(|payload| tag_payload(payload, &rules, counter.as_deref())))
				})
			}))
		})
}

fn tag_payload(payload: Option<&Value>, rules: &TagRules, counter: Option<&WordCounter>) -> Value {
	let mut fields = match payload {
		Some(Value::Object(fields)) => fields.clone(),
		_ => Map::new(),
	};
	let mut tags: Vec<String> = fields
		.get("tags")
		.and_then(|tags| Vec::<String>::deserialize(tags).ok())
		.unwrap_or_default();

	let mut add = |tag: &str| {
		if !tags.iter().any(|existing| existing == tag) {
			tags.push(tag.to_owned());
		}
	};
	add(&rules.tag);
	let content = fields.get("content").and_then(Value::as_str).unwrap_or_default();
	if let Some(counter) = counter
		&& counter.count(content) >= rules.long_after
	{
		add(LONG_TAG);
	}

	fields.insert("tags".to_owned(), json!(tags));
	Value::Object(fields)
}
