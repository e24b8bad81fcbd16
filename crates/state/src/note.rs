use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a note in the entity collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NoteId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl Borrow<str> for NoteId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl From<&str> for NoteId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

impl From<String> for NoteId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

/// A single note entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
	pub id: NoteId,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub content: String,
	/// Optional type tag; notes with a tag act as singletons looked up by it.
	#[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
	pub note_type: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Note {
	/// Creates an empty note stamped with `now`.
	pub fn new(id: NoteId, now: DateTime<Utc>) -> Self {
		Self {
			id,
			title: String::new(),
			content: String::new(),
			note_type: None,
			tags: Vec::new(),
			created_at: now,
			updated_at: now,
		}
	}
}
