mod notes;

pub(crate) use notes::{NoteAction, NotesController};

use crate::api::{ApiClient, SpellMatch};
use crate::geometry::StickyFrame;
use crate::models::{AccountInfo, Note, NoteView, SortKey};
use crate::notes::{NoteStore, SearchGate, SearchResolution};
use crate::storage::{load_dark_mode, load_user_from_storage, LocalStorageMirror};
use leptos::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NoticeKind {
    Info,
    Error,
}

/// The single inline alert shown above the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// Word-highlight state for the note being read aloud.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SpeechState {
    pub note_id: Option<String>,
    /// One flag per content token.
    pub spoken: Vec<bool>,
}

/// A note pinned to the floating overlay. The note is a snapshot; later
/// edits to the list do not reach it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StickyState {
    pub note: Note,
    pub frame: StickyFrame,
}

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,
    pub current_user: RwSignal<Option<AccountInfo>>,
    pub dark_mode: RwSignal<bool>,

    /// Notes, archive and trash plus pending markers.
    pub store: RwSignal<NoteStore>,
    pub notes_loading: RwSignal<bool>,

    pub view: RwSignal<NoteView>,
    pub sort_key: RwSignal<SortKey>,

    pub search_query: RwSignal<String>,
    pub search: RwSignal<Option<SearchResolution>>,
    /// Debounce timer and request ids; responses carrying an older id are dropped.
    pub search_gate: RwSignal<SearchGate>,

    pub notice: RwSignal<Option<Notice>>,

    /// Spell-check spans per note id.
    pub spelling: RwSignal<HashMap<String, Vec<SpellMatch>>>,
    pub spell_checking: RwSignal<Option<String>>,

    pub speech: RwSignal<SpeechState>,
    pub sticky: RwSignal<Option<StickyState>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api_client: RwSignal::new(ApiClient::load_from_storage()),
            current_user: RwSignal::new(load_user_from_storage()),
            dark_mode: RwSignal::new(load_dark_mode()),
            store: RwSignal::new(NoteStore::load(&LocalStorageMirror)),
            notes_loading: RwSignal::new(false),
            view: RwSignal::new(NoteView::default()),
            sort_key: RwSignal::new(SortKey::default()),
            search_query: RwSignal::new(String::new()),
            search: RwSignal::new(None),
            search_gate: RwSignal::new(SearchGate::default()),
            notice: RwSignal::new(None),
            spelling: RwSignal::new(HashMap::new()),
            spell_checking: RwSignal::new(None),
            speech: RwSignal::new(SpeechState::default()),
            sticky: RwSignal::new(None),
        }
    }

    pub fn notify_info(&self, text: impl Into<String>) {
        self.notice.set(Some(Notice {
            kind: NoticeKind::Info,
            text: text.into(),
        }));
    }

    pub fn notify_error(&self, text: impl Into<String>) {
        self.notice.set(Some(Notice {
            kind: NoticeKind::Error,
            text: text.into(),
        }));
    }

    pub fn clear_notice(&self) {
        self.notice.set(None);
    }

    /// Drop the session and everything scoped to it. The note mirror stays
    /// so the next login starts from the offline copy.
    pub fn logout(&self) {
        self.api_client.update(|c| c.logout());
        self.current_user.set(None);
        self.search_query.set(String::new());
        let timer = self.search_gate.try_update(|g| {
            g.invalidate();
            g.keystroke()
        });
        if let (Some(win), Some(Some(tid))) = (web_sys::window(), timer) {
            win.clear_timeout_with_handle(tid);
        }
        self.search.set(None);
        self.spelling.set(HashMap::new());
        self.sticky.set(None);
        crate::speech::cancel_speech();
        self.speech.set(SpeechState::default());
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
