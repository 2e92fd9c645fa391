use super::{AppState, SpeechState, StickyState};
use crate::api::{ApiError, ApiResult};
use crate::geometry::StickyFrame;
use crate::models::Note;
use crate::notes::{
    is_blank_query, pick_color, resolve_search, NewNote, OpOutcome, PendingOp,
    REMOTE_SEARCH_TIMEOUT_MS, SEARCH_DEBOUNCE_MS,
};
use crate::storage::LocalStorageMirror;
use crate::tokens::tokenize;
use crate::util::{now_iso, random_byte, with_timeout};
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

/// Drives every remote note operation against [`AppState`].
///
/// Each operation marks the note pending, calls the backend, then commits or
/// reverts. The mirror is written after every list change.
#[derive(Clone, Copy)]
pub(crate) struct NotesController {
    state: AppState,
}

/// A move between lists, sent to the backend as one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NoteAction {
    Remove,
    Archive,
    Unarchive,
}

impl NoteAction {
    fn pending(&self) -> PendingOp {
        match self {
            NoteAction::Remove => PendingOp::Remove,
            NoteAction::Archive => PendingOp::Archive,
            NoteAction::Unarchive => PendingOp::Unarchive,
        }
    }

    fn what(&self) -> &'static str {
        match self {
            NoteAction::Remove => "Delete",
            NoteAction::Archive => "Archive",
            NoteAction::Unarchive => "Unarchive",
        }
    }
}

impl NotesController {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn persist(&self) {
        self.state
            .store
            .with_untracked(|s| s.persist(&LocalStorageMirror));
    }

    /// Log, surface, and on 401 / missing token drop the session.
    fn report(&self, what: &str, e: &ApiError) -> String {
        leptos::logging::error!("{what} failed: {e}");
        if e.is_unauthorized() {
            self.state.logout();
        }
        let msg = format!("{what} failed: {e}");
        self.state.notify_error(msg.clone());
        msg
    }

    fn busy(&self, msg: String) -> OpOutcome {
        leptos::logging::warn!("{msg}");
        self.state.notify_error(msg.clone());
        OpOutcome::Rejected(msg)
    }

    /// Fetch active and archived lists. Each remote answer replaces its list;
    /// a failed fetch leaves the offline copy in place.
    pub async fn load(self) {
        self.state.notes_loading.set(true);
        let client = self.state.api_client.get_untracked();
        let (active, archived) = futures::join!(
            client.fetch_active_notes(),
            client.fetch_archived_notes()
        );

        match active {
            Ok(list) => {
                leptos::logging::log!("Loaded {} notes", list.len());
                self.state.store.update(|s| s.replace_active(list));
            }
            Err(e) => {
                self.report("Loading notes", &e);
                if e.kind == crate::api::ApiErrorKind::Network {
                    self.state
                        .notify_info("Offline: showing the last saved copy of your notes.");
                }
            }
        }
        match archived {
            Ok(list) => self.state.store.update(|s| s.replace_archived(list)),
            Err(e) => leptos::logging::warn!("Loading archive failed: {e}"),
        }

        self.persist();
        self.state.notes_loading.set(false);
        self.refresh_search();
    }

    pub async fn create(self, title: String, content: String) -> OpOutcome {
        let new = match NewNote::parse(&title, &content) {
            Ok(n) => n,
            Err(msg) => return self.busy(msg),
        };

        let color = pick_color(random_byte());
        let client = self.state.api_client.get_untracked();
        match client.create_note(&new.title, &new.content, color).await {
            Ok(mut note) => {
                if note.color.is_none() {
                    note.color = Some(color.to_string());
                }
                if note.created_at.trim().is_empty() {
                    note.created_at = now_iso();
                }
                self.state.store.update(|s| s.push_created(note));
                self.persist();
                self.refresh_search();
                OpOutcome::Applied
            }
            Err(e) => OpOutcome::Failed(self.report("Creating note", &e)),
        }
    }

    /// Edit applies locally first, then PUTs; a failure restores the prior text.
    /// Edits are sent as typed; only new notes require both fields.
    pub async fn update(self, id: String, title: String, content: String) -> OpOutcome {
        let begun = self
            .state
            .store
            .try_update(|s| s.begin_save(&id, &title, &content))
            .unwrap_or_else(|| Err("Notes are not loaded".to_string()));
        if let Err(msg) = begun {
            return self.busy(msg);
        }
        self.persist();

        let client = self.state.api_client.get_untracked();
        let result = client.update_note(&id, &title, &content).await;
        self.settle(&id, "Saving note", result)
    }

    /// Delete, archive or unarchive. The note moves lists only once the
    /// backend acknowledges.
    pub async fn apply(self, id: String, t: NoteAction) -> OpOutcome {
        let begun = self
            .state
            .store
            .try_update(|s| s.begin(&id, t.pending()))
            .unwrap_or_else(|| Err("Notes are not loaded".to_string()));
        if let Err(msg) = begun {
            return self.busy(msg);
        }

        let client = self.state.api_client.get_untracked();
        let result = match t {
            NoteAction::Remove => client.delete_note(&id).await.map(|_| None),
            NoteAction::Archive => client.archive_note(&id).await,
            NoteAction::Unarchive => client.unarchive_note(&id).await,
        };
        self.settle(&id, t.what(), result)
    }

    fn settle(&self, id: &str, what: &str, result: ApiResult<Option<Note>>) -> OpOutcome {
        let outcome = match result {
            Ok(echo) => {
                self.state.store.update(|s| s.commit(id, echo));
                OpOutcome::Applied
            }
            Err(e) => {
                self.state.store.update(|s| s.revert(id));
                OpOutcome::Failed(self.report(what, &e))
            }
        };
        self.persist();
        self.refresh_search();
        outcome
    }

    pub fn empty_trash(&self) {
        let mut dropped = 0;
        self.state.store.update(|s| dropped = s.empty_trash());
        self.persist();
        if dropped > 0 {
            self.state
                .notify_info(format!("Removed {dropped} note(s) from trash."));
        }
    }

    /// Keystroke handler for the search box. Debounced; a blank query
    /// resolves immediately to the full list.
    pub fn on_query_input(&self, query: String) {
        self.state.search_query.set(query.clone());

        let Some(win) = web_sys::window() else {
            return;
        };
        let gate = self.state.search_gate;
        if let Some(Some(tid)) = gate.try_update(|g| g.keystroke()) {
            win.clear_timeout_with_handle(tid);
        }

        if is_blank_query(&query) {
            gate.update(|g| g.invalidate());
            self.state.search.set(None);
            return;
        }

        let s2 = *self;
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            s2.state.search_gate.update(|g| g.fired());
            spawn_local(s2.run_search(query));
        });
        if let Ok(tid) = win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            SEARCH_DEBOUNCE_MS,
        ) {
            gate.update(|g| g.arm(tid));
        }
    }

    /// Remote search with a timeout, falling back to a local match.
    /// Results from superseded requests are dropped.
    pub async fn run_search(self, query: String) {
        let Some(request_id) = self.state.search_gate.try_update(|g| g.issue()) else {
            return;
        };

        let client = self.state.api_client.get_untracked();
        let remote = with_timeout(REMOTE_SEARCH_TIMEOUT_MS, client.search_notes(&query))
            .await
            .unwrap_or_else(|| Err(ApiError::timeout("Search", REMOTE_SEARCH_TIMEOUT_MS)));

        if !self.state.search_gate.with_untracked(|g| g.is_current(request_id)) {
            return;
        }
        if let Err(e) = &remote {
            leptos::logging::warn!("Remote search failed, matching locally: {e}");
            if e.is_unauthorized() {
                self.state.logout();
            }
        }

        let res = self
            .state
            .store
            .with_untracked(|s| resolve_search(&query, s.active(), remote));
        self.state.search.set(Some(res));
    }

    /// Re-run the current query after the active list changed.
    fn refresh_search(&self) {
        let query = self.state.search_query.get_untracked();
        if is_blank_query(&query) {
            return;
        }
        spawn_local(self.run_search(query));
    }

    pub async fn check_spelling(self, note: Note) {
        self.state.spell_checking.set(Some(note.id.clone()));
        let client = self.state.api_client.get_untracked();
        match client.check_spelling(&note.content).await {
            Ok(matches) => {
                leptos::logging::log!("Spell check found {} issue(s)", matches.len());
                self.state
                    .spelling
                    .update(|m| {
                        m.insert(note.id.clone(), matches);
                    });
            }
            Err(e) => {
                self.report("Spell check", &e);
            }
        }
        self.state.spell_checking.set(None);
    }

    pub fn clear_spelling(&self, id: &str) {
        self.state.spelling.update(|m| {
            m.remove(id);
        });
    }

    /// Read a note aloud, highlighting each content word as it is reached.
    /// Pressed again while anything is speaking, it stops instead.
    pub fn toggle_speech(&self, note: &Note) {
        if crate::speech::is_speaking() {
            crate::speech::cancel_speech();
            self.state.speech.set(SpeechState::default());
            return;
        }

        let words = tokenize(&note.content).len();
        self.state.speech.set(SpeechState {
            note_id: Some(note.id.clone()),
            spoken: vec![false; words],
        });

        let speech = self.state.speech;
        let on_word = move |i: usize| {
            speech.update(|s| {
                if let Some(flag) = s.spoken.get_mut(i) {
                    *flag = true;
                }
            });
        };
        let on_end = move || speech.set(SpeechState::default());

        if let Err(e) = crate::speech::speak(note, on_word, on_end) {
            self.state.speech.set(SpeechState::default());
            self.report("Text-to-speech", &e);
        }
    }

    pub fn pin(&self, note: &Note) {
        let width = web_sys::window()
            .and_then(|w| w.inner_width().ok())
            .and_then(|v| v.as_f64())
            .unwrap_or(1024.0);
        self.state.sticky.set(Some(StickyState {
            note: note.clone(),
            frame: StickyFrame::open(width),
        }));
    }

    pub fn unpin(&self) {
        self.state.sticky.set(None);
    }
}
