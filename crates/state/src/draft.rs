//! Scoped copy-on-write working copy used by reducers.

use std::sync::Arc;

use crate::note::{Note, NoteId};
use crate::state::{NoteMap, Settings, Slice, State, UiState, ValueMap};

/// Mutable view over a state snapshot for the duration of one dispatch.
///
/// Reads are served from the base snapshot until the first write. The first
/// write clones the root (a handful of `Arc` bumps); each slice is then
/// cloned lazily on its own first write through [`Arc::make_mut`].
///
/// [`Draft::finish`] yields the base `Arc` itself when nothing effectively
/// changed, so callers can detect a no-op dispatch with [`Arc::ptr_eq`].
pub struct Draft<'a> {
	base: &'a Arc<State>,
	working: Option<State>,
}

impl<'a> Draft<'a> {
	pub fn new(base: &'a Arc<State>) -> Self {
		Self { base, working: None }
	}

	/// Returns the snapshot this draft started from.
	pub fn base(&self) -> &State {
		self.base
	}

	/// Returns the current view, including writes made so far.
	pub fn state(&self) -> &State {
		self.working.as_ref().unwrap_or(&**self.base)
	}

	/// Returns true once any mutable accessor has been used.
	pub fn is_touched(&self) -> bool {
		self.working.is_some()
	}

	fn root_mut(&mut self) -> &mut State {
		let base = self.base;
		self.working.get_or_insert_with(|| State::clone(base))
	}

	pub fn notes_mut(&mut self) -> &mut NoteMap {
		Arc::make_mut(&mut self.root_mut().notes)
	}

	/// Returns a mutable note, cloning only that note and the map spine.
	pub fn note_mut(&mut self, id: &str) -> Option<&mut Note> {
		if !self.state().notes.contains_key(id) {
			return None;
		}
		self.notes_mut().get_mut(id).map(Arc::make_mut)
	}

	pub fn note_order_mut(&mut self) -> &mut Vec<NoteId> {
		Arc::make_mut(&mut self.root_mut().note_order)
	}

	pub fn settings_mut(&mut self) -> &mut Settings {
		Arc::make_mut(&mut self.root_mut().settings)
	}

	pub fn ui_mut(&mut self) -> &mut UiState {
		Arc::make_mut(&mut self.root_mut().ui)
	}

	pub fn plugin_runtime_mut(&mut self) -> &mut ValueMap {
		Arc::make_mut(&mut self.root_mut().plugin_runtime)
	}

	pub fn cache_mut(&mut self) -> &mut ValueMap {
		Arc::make_mut(&mut self.root_mut().cache)
	}

	/// Replaces the whole working copy.
	pub fn replace(&mut self, state: State) {
		*self.root_mut() = state;
	}

	/// Finalizes the draft into a snapshot.
	///
	/// Slices (and individual notes) that compare equal to the base are
	/// re-pointed at the base allocation. If every slice ends up shared, the
	/// base snapshot is returned unchanged.
	pub fn finish(self) -> Arc<State> {
		let Some(mut next) = self.working else {
			return Arc::clone(self.base);
		};
		let base: &State = self.base;

		reshare_notes(&mut next.notes, &base.notes);
		reshare(&mut next.note_order, &base.note_order);
		reshare(&mut next.settings, &base.settings);
		reshare(&mut next.ui, &base.ui);
		reshare(&mut next.plugin_runtime, &base.plugin_runtime);
		reshare(&mut next.cache, &base.cache);

		if Slice::ALL.iter().all(|&slice| next.shares_slice(base, slice)) {
			return Arc::clone(self.base);
		}
		Arc::new(next)
	}
}

fn reshare<T: PartialEq>(slot: &mut Arc<T>, base: &Arc<T>) {
	if !Arc::ptr_eq(slot, base) && **slot == **base {
		*slot = Arc::clone(base);
	}
}

fn reshare_notes(slot: &mut Arc<NoteMap>, base: &Arc<NoteMap>) {
	if Arc::ptr_eq(slot, base) {
		return;
	}
	for (id, note) in Arc::make_mut(slot).iter_mut() {
		if let Some(prev) = base.get(id)
			&& !Arc::ptr_eq(note, prev)
			&& **note == **prev
		{
			*note = Arc::clone(prev);
		}
	}
	reshare(slot, base);
}
