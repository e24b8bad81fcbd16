//! State model for the quire store.
//!
//! - [`Action`]: tagged message describing an intended change
//! - [`State`]: the single state tree, partitioned into `Arc`-shared slices
//! - [`Draft`]: copy-on-write working copy handed to reducers
//! - [`PersistedState`]: the durable projection written by persistence

mod action;
mod draft;
mod note;
mod persisted;
mod state;

pub use action::{Action, kinds};
pub use draft::Draft;
pub use note::{Note, NoteId};
pub use persisted::PersistedState;
pub use state::{NoteMap, Settings, Slice, State, StatusBanner, StatusLevel, UiState, ValueMap};
