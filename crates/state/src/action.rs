use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action types understood by the core reducer.
///
/// Plugins define their own types freely; a type no reducer recognizes is
/// legal and simply leaves the state untouched.
pub mod kinds {
	pub const ADD_NOTE: &str = "CORE_ADD_NOTE";
	pub const UPDATE_NOTE: &str = "CORE_UPDATE_NOTE";
	pub const DELETE_NOTE: &str = "CORE_DELETE_NOTE";
	pub const SELECT_NOTE: &str = "CORE_SELECT_NOTE";
	pub const SEARCH_TERM_CHANGED: &str = "CORE_SEARCH_TERM_CHANGED";
	pub const UPDATE_SETTINGS: &str = "CORE_UPDATE_SETTINGS";
	pub const UPDATE_PLUGIN_SETTINGS: &str = "CORE_UPDATE_PLUGIN_SETTINGS";
	pub const SET_PLUGIN_RUNTIME_STATE: &str = "CORE_SET_PLUGIN_RUNTIME_STATE";
	pub const SET_CACHE_ITEM: &str = "CORE_SET_CACHE_ITEM";
	pub const REMOVE_CACHE_ITEM: &str = "CORE_REMOVE_CACHE_ITEM";
	pub const SET_STATUS: &str = "CORE_SET_STATUS";
	pub const CLEAR_STATUS: &str = "CORE_CLEAR_STATUS";
	pub const STATE_LOADED: &str = "CORE_STATE_LOADED";
}

/// Tagged, immutable description of an intended state change.
///
/// Middleware may replace an action with a rewritten one, but an action value
/// itself is never edited in place once dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
	#[serde(rename = "type")]
	kind: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	payload: Option<Value>,
}

impl Action {
	/// Creates an action without payload.
	pub fn new(kind: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			payload: None,
		}
	}

	/// Creates an action carrying `payload`.
	pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
		Self {
			kind: kind.into(),
			payload: Some(payload),
		}
	}

	/// Returns the action type tag.
	pub fn kind(&self) -> &str {
		&self.kind
	}

	pub fn payload(&self) -> Option<&Value> {
		self.payload.as_ref()
	}

	/// Returns true when the type tag is usable for dispatch.
	pub fn is_well_formed(&self) -> bool {
		!self.kind.trim().is_empty()
	}

	/// Returns true when this action carries the given type tag.
	pub fn is(&self, kind: &str) -> bool {
		self.kind == kind
	}

	/// Returns a copy of this action with its payload replaced.
	pub fn map_payload(&self, f: impl FnOnce(Option<&Value>) -> Value) -> Self {
		Self {
			kind: self.kind.clone(),
			payload: Some(f(self.payload.as_ref())),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn blank_type_is_malformed() {
		assert!(!Action::new("").is_well_formed());
		assert!(!Action::new("   ").is_well_formed());
		assert!(Action::new(kinds::ADD_NOTE).is_well_formed());
	}

	#[test]
	fn serializes_type_field() {
		let action = Action::with_payload(kinds::DELETE_NOTE, json!({ "noteId": "n1" }));
		let value = serde_json::to_value(&action).unwrap();
		assert_eq!(value, json!({ "type": "CORE_DELETE_NOTE", "payload": { "noteId": "n1" } }));

		let bare: Action = serde_json::from_value(json!({ "type": "PLUGIN_PING" })).unwrap();
		assert_eq!(bare.kind(), "PLUGIN_PING");
		assert!(bare.payload().is_none());
	}

	#[test]
	fn map_payload_leaves_original_untouched() {
		let original = Action::with_payload("X", json!({ "n": 1 }));
		let rewritten = original.map_payload(|_| json!({ "n": 2 }));
		assert_eq!(original.payload(), Some(&json!({ "n": 1 })));
		assert_eq!(rewritten.payload(), Some(&json!({ "n": 2 })));
		assert_eq!(rewritten.kind(), "X");
	}
}
