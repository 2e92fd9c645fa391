//! Client-side note lifecycle.
//!
//! `store` owns the three exclusive lists (active / archive / trash) and the
//! per-note pending markers. `search` is the two-tier resolver plus sorting.
//! Neither touches the network or the DOM; `state::NotesController` drives
//! them from the UI.

mod search;
mod store;

pub(crate) use search::{
    displayed_notes, is_blank_query, resolve_search, SearchGate, SearchResolution, SearchSource,
    REMOTE_SEARCH_TIMEOUT_MS, SEARCH_DEBOUNCE_MS,
};
pub(crate) use store::{
    pick_color, Mirror, MirrorSnapshot, NewNote, NoteStore, OpOutcome, PendingOp, PALETTE,
};
