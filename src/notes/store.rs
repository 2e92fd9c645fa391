use crate::models::{Note, NoteView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Note background colors. A new note gets one at random.
pub(crate) const PALETTE: [&str; 5] = ["#ffe666", "#f5c27d", "#f6cebf", "#e3b7d2", "#bfe7f6"];

pub(crate) fn pick_color(seed: u8) -> &'static str {
    PALETTE[seed as usize % PALETTE.len()]
}

/// What was persisted locally: one array per list.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct MirrorSnapshot {
    pub notes: Vec<Note>,
    pub archive: Vec<Note>,
    pub trash: Vec<Note>,
}

/// Persistence boundary for the offline copy.
///
/// The remote store is authoritative. The mirror is read once at startup and
/// is overwritten after every list change.
pub(crate) trait Mirror {
    fn load(&self) -> MirrorSnapshot;
    fn save(&self, snapshot: &MirrorSnapshot);
}

/// A remote write in flight for one note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PendingOp {
    /// The edit is already applied locally; `previous` restores it on failure.
    Save { previous: Note },
    Remove,
    Archive,
    Unarchive,
}

impl PendingOp {
    pub fn label(&self) -> &'static str {
        match self {
            PendingOp::Save { .. } => "Saving…",
            PendingOp::Remove => "Deleting…",
            PendingOp::Archive => "Archiving…",
            PendingOp::Unarchive => "Restoring…",
        }
    }
}

/// Result of a user-triggered note operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum OpOutcome {
    Applied,
    /// Refused before anything was sent (validation, note busy, not found).
    Rejected(String),
    /// The remote call failed; local state was reverted.
    Failed(String),
}

impl OpOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, OpOutcome::Applied)
    }
}

/// A validated create request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NewNote {
    pub title: String,
    pub content: String,
}

impl NewNote {
    /// Both fields are required after trimming.
    pub fn parse(title: &str, content: &str) -> Result<NewNote, String> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() || content.is_empty() {
            return Err("A note needs both a title and some content.".to_string());
        }
        Ok(NewNote {
            title: title.to_string(),
            content: content.to_string(),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct NoteStore {
    notes: Vec<Note>,
    archive: Vec<Note>,
    trash: Vec<Note>,
    pending: BTreeMap<String, PendingOp>,
}

impl NoteStore {
    pub fn from_snapshot(snap: MirrorSnapshot) -> Self {
        let mut s = Self::default();
        // Later lists lose on duplicate ids so membership stays exclusive.
        for n in snap.notes {
            s.insert(NoteView::Notes, n);
        }
        for n in snap.archive {
            s.insert(NoteView::Archive, n);
        }
        for n in snap.trash {
            s.insert(NoteView::Trash, n);
        }
        s
    }

    pub fn load(mirror: &impl Mirror) -> Self {
        Self::from_snapshot(mirror.load())
    }

    pub fn snapshot(&self) -> MirrorSnapshot {
        MirrorSnapshot {
            notes: self.notes.clone(),
            archive: self.archive.clone(),
            trash: self.trash.clone(),
        }
    }

    pub fn persist(&self, mirror: &impl Mirror) {
        mirror.save(&self.snapshot());
    }

    pub fn active(&self) -> &[Note] {
        &self.notes
    }

    pub fn archived(&self) -> &[Note] {
        &self.archive
    }

    pub fn trashed(&self) -> &[Note] {
        &self.trash
    }

    pub fn list(&self, view: NoteView) -> &[Note] {
        match view {
            NoteView::Notes => self.active(),
            NoteView::Archive => self.archived(),
            NoteView::Trash => self.trashed(),
        }
    }

    fn list_mut(&mut self, view: NoteView) -> &mut Vec<Note> {
        match view {
            NoteView::Notes => &mut self.notes,
            NoteView::Archive => &mut self.archive,
            NoteView::Trash => &mut self.trash,
        }
    }

    pub fn find(&self, id: &str) -> Option<(NoteView, &Note)> {
        [NoteView::Notes, NoteView::Archive, NoteView::Trash]
            .into_iter()
            .find_map(|v| self.list(v).iter().find(|n| n.id == id).map(|n| (v, n)))
    }

    pub fn pending(&self, id: &str) -> Option<&PendingOp> {
        self.pending.get(id)
    }

    /// Take a note out of whichever list holds it.
    fn detach(&mut self, id: &str) -> Option<Note> {
        for v in [NoteView::Notes, NoteView::Archive, NoteView::Trash] {
            let list = self.list_mut(v);
            if let Some(pos) = list.iter().position(|n| n.id == id) {
                return Some(list.remove(pos));
            }
        }
        None
    }

    /// Append to `view`, first removing the id from every list.
    fn insert(&mut self, view: NoteView, note: Note) {
        self.detach(&note.id);
        self.list_mut(view).push(note);
    }

    /// Remote result for the active list. It replaces local state outright;
    /// any of these ids held elsewhere locally are moved here.
    pub fn replace_active(&mut self, notes: Vec<Note>) {
        self.replace_list(NoteView::Notes, notes);
    }

    pub fn replace_archived(&mut self, notes: Vec<Note>) {
        self.replace_list(NoteView::Archive, notes);
    }

    fn replace_list(&mut self, view: NoteView, notes: Vec<Note>) {
        self.list_mut(view).clear();
        for n in notes {
            self.insert(view, n);
        }
        let known: Vec<String> = self.pending.keys().cloned().collect();
        for id in known {
            if self.find(&id).is_none() {
                self.pending.remove(&id);
            }
        }
    }

    /// A freshly created note from the server.
    pub fn push_created(&mut self, note: Note) {
        self.insert(NoteView::Notes, note);
    }

    /// Mark `id` as having a remote write in flight.
    ///
    /// The note must sit in the list the op starts from, and must not already
    /// be pending. `Save` is handled by [`NoteStore::begin_save`].
    pub fn begin(&mut self, id: &str, op: PendingOp) -> Result<(), String> {
        if self.pending.contains_key(id) {
            return Err("This note is busy, try again in a moment.".to_string());
        }
        let Some((view, _)) = self.find(id) else {
            return Err(format!("Note {id} not found"));
        };
        let expected = match op {
            PendingOp::Save { .. } => return Err("use begin_save for edits".to_string()),
            PendingOp::Remove | PendingOp::Archive => NoteView::Notes,
            PendingOp::Unarchive => NoteView::Archive,
        };
        if view != expected {
            return Err(format!("Note {id} is not in {expected}"));
        }
        self.pending.insert(id.to_string(), op);
        Ok(())
    }

    /// Apply an edit locally and remember the prior version.
    pub fn begin_save(&mut self, id: &str, title: &str, content: &str) -> Result<(), String> {
        if self.pending.contains_key(id) {
            return Err("This note is busy, try again in a moment.".to_string());
        }
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            return Err(format!("Note {id} not found"));
        };
        let previous = note.clone();
        note.title = title.to_string();
        note.content = content.to_string();
        self.pending
            .insert(id.to_string(), PendingOp::Save { previous });
        Ok(())
    }

    /// The server acknowledged the pending op for `id`.
    ///
    /// `echo` is the server's copy of the note when the response carried one.
    /// Its id is forced to `id`: identity never changes across transitions.
    pub fn commit(&mut self, id: &str, echo: Option<Note>) {
        let Some(op) = self.pending.remove(id) else {
            return;
        };
        let echo = echo.map(|mut n| {
            n.id = id.to_string();
            n
        });

        match op {
            PendingOp::Save { .. } => {
                if let (Some(server), Some(slot)) =
                    (echo, self.notes.iter_mut().find(|n| n.id == id))
                {
                    *slot = fill_missing(server, slot);
                }
            }
            PendingOp::Remove => {
                if let Some(local) = self.detach(id) {
                    self.trash.push(local);
                }
            }
            PendingOp::Archive => {
                if let Some(local) = self.detach(id) {
                    let moved = echo.map(|e| fill_missing(e, &local)).unwrap_or(local);
                    self.archive.push(moved);
                }
            }
            PendingOp::Unarchive => {
                if let Some(local) = self.detach(id) {
                    let moved = echo.map(|e| fill_missing(e, &local)).unwrap_or(local);
                    self.notes.push(moved);
                }
            }
        }
    }

    /// The remote write failed: undo anything applied locally.
    pub fn revert(&mut self, id: &str) {
        let Some(op) = self.pending.remove(id) else {
            return;
        };
        if let PendingOp::Save { previous } = op {
            if let Some(slot) = self.notes.iter_mut().find(|n| n.id == id) {
                *slot = previous;
            }
        }
    }

    /// Trash is local-only; the server already forgot these notes.
    pub fn empty_trash(&mut self) -> usize {
        let n = self.trash.len();
        self.trash.clear();
        n
    }
}

/// Server copies sometimes omit fields; keep what we already had.
fn fill_missing(mut server: Note, local: &Note) -> Note {
    if server.color.is_none() {
        server.color = local.color.clone();
    }
    if server.created_at.trim().is_empty() {
        server.created_at = local.created_at.clone();
    }
    if server.title.is_empty() && server.content.is_empty() {
        server.title = local.title.clone();
        server.content = local.content.clone();
    }
    server
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn note(id: &str, title: &str, content: &str) -> Note {
        Note {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            color: Some(PALETTE[0].to_string()),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn ids(list: &[Note]) -> Vec<&str> {
        list.iter().map(|n| n.id.as_str()).collect()
    }

    #[derive(Default)]
    struct MemoryMirror(RefCell<MirrorSnapshot>);

    impl Mirror for MemoryMirror {
        fn load(&self) -> MirrorSnapshot {
            self.0.borrow().clone()
        }
        fn save(&self, snapshot: &MirrorSnapshot) {
            *self.0.borrow_mut() = snapshot.clone();
        }
    }

    fn store_with(active: &[&str], archived: &[&str]) -> NoteStore {
        NoteStore::from_snapshot(MirrorSnapshot {
            notes: active.iter().map(|id| note(id, id, id)).collect(),
            archive: archived.iter().map(|id| note(id, id, id)).collect(),
            trash: vec![],
        })
    }

    #[test]
    fn test_new_note_requires_title_and_content() {
        assert!(NewNote::parse("", "body").is_err());
        assert!(NewNote::parse("title", "   ").is_err());
        assert!(NewNote::parse(" \n", "\t").is_err());

        let n = NewNote::parse("  Groceries ", " milk ").expect("valid");
        assert_eq!(n.title, "Groceries");
        assert_eq!(n.content, "milk");
    }

    #[test]
    fn test_pick_color_stays_in_palette() {
        for seed in [0u8, 1, 4, 5, 200, 255] {
            assert!(PALETTE.contains(&pick_color(seed)));
        }
        assert_eq!(pick_color(5), PALETTE[0]);
    }

    #[test]
    fn test_archive_then_unarchive_keeps_identity() {
        let mut s = store_with(&["a", "b"], &[]);

        s.begin("a", PendingOp::Archive).expect("archive should start");
        assert_eq!(s.pending("a"), Some(&PendingOp::Archive));
        // Nothing moves until the server acknowledges.
        assert_eq!(ids(s.active()), vec!["a", "b"]);

        s.commit("a", None);
        assert_eq!(ids(s.active()), vec!["b"]);
        assert_eq!(ids(s.archived()), vec!["a"]);
        assert!(s.pending("a").is_none());

        s.begin("a", PendingOp::Unarchive).expect("unarchive should start");
        s.commit("a", None);
        assert_eq!(ids(s.active()), vec!["b", "a"]);
        assert!(s.archived().is_empty());
    }

    #[test]
    fn test_archive_echo_keeps_local_id_and_fields() {
        let mut s = store_with(&["a"], &[]);
        s.begin("a", PendingOp::Archive).expect("should start");

        let mut echo = note("server-renamed", "a", "a");
        echo.color = None;
        echo.created_at = String::new();
        s.commit("a", Some(echo));

        let archived = &s.archived()[0];
        assert_eq!(archived.id, "a");
        assert_eq!(archived.color.as_deref(), Some(PALETTE[0]));
        assert_eq!(archived.created_at, "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_failed_archive_reverts_to_prior_state() {
        let mut s = store_with(&["a"], &[]);
        let before = s.clone();
        s.begin("a", PendingOp::Archive).expect("should start");
        s.revert("a");
        assert_eq!(s, before);
    }

    #[test]
    fn test_second_op_on_busy_note_is_rejected() {
        let mut s = store_with(&["a"], &[]);
        s.begin("a", PendingOp::Archive).expect("first should start");
        assert!(s.begin("a", PendingOp::Archive).is_err());
        assert!(s.begin("a", PendingOp::Remove).is_err());
        assert!(s.begin_save("a", "x", "y").is_err());
    }

    #[test]
    fn test_op_must_start_from_expected_list() {
        let mut s = store_with(&["a"], &["z"]);
        assert!(s.begin("z", PendingOp::Archive).is_err());
        assert!(s.begin("a", PendingOp::Unarchive).is_err());
        assert!(s.begin("missing", PendingOp::Remove).is_err());
        assert!(s.pending("a").is_none() && s.pending("z").is_none());
    }

    #[test]
    fn test_remove_moves_to_trash_after_ack() {
        let mut s = store_with(&["a", "b"], &[]);
        s.begin("a", PendingOp::Remove).expect("should start");
        assert_eq!(s.active().len(), 2);

        s.commit("a", None);
        assert_eq!(ids(s.active()), vec!["b"]);
        assert_eq!(ids(s.trashed()), vec!["a"]);

        assert_eq!(s.empty_trash(), 1);
        assert!(s.trashed().is_empty());
    }

    #[test]
    fn test_failed_remove_leaves_note_in_place() {
        let mut s = store_with(&["a"], &[]);
        s.begin("a", PendingOp::Remove).expect("should start");
        s.revert("a");
        assert_eq!(ids(s.active()), vec!["a"]);
        assert!(s.trashed().is_empty());
    }

    #[test]
    fn test_save_applies_locally_and_reverts_on_failure() {
        let mut s = store_with(&["a"], &[]);
        s.begin_save("a", "new title", "new body").expect("should start");
        assert_eq!(s.active()[0].title, "new title");
        assert!(matches!(s.pending("a"), Some(PendingOp::Save { .. })));

        s.revert("a");
        assert_eq!(s.active()[0].title, "a");
        assert_eq!(s.active()[0].content, "a");
    }

    #[test]
    fn test_edit_may_clear_a_field() {
        let mut s = store_with(&["a"], &[]);
        s.begin_save("a", "a", "").expect("empty content is a valid edit");
        s.commit("a", None);
        assert_eq!(s.active()[0].content, "");
        // Creating still needs both.
        assert!(NewNote::parse("a", "").is_err());
    }

    #[test]
    fn test_save_commit_takes_server_copy() {
        let mut s = store_with(&["a"], &[]);
        s.begin_save("a", "mine", "mine").expect("should start");
        s.commit("a", Some(note("a", "server", "server")));
        assert_eq!(s.active()[0].title, "server");

        // An ack without a body keeps the local edit.
        s.begin_save("a", "second", "edit").expect("should start");
        s.commit("a", None);
        assert_eq!(s.active()[0].title, "second");
    }

    #[test]
    fn test_membership_is_exclusive_on_load() {
        let s = NoteStore::from_snapshot(MirrorSnapshot {
            notes: vec![note("a", "", "")],
            archive: vec![note("a", "", ""), note("b", "", "")],
            trash: vec![note("b", "", "")],
        });
        assert!(s.active().is_empty());
        assert_eq!(ids(s.archived()), vec!["a"]);
        assert_eq!(ids(s.trashed()), vec!["b"]);
    }

    #[test]
    fn test_remote_replace_is_authoritative() {
        let mut s = store_with(&["stale"], &["x"]);
        s.replace_active(vec![note("x", "", ""), note("fresh", "", "")]);
        assert_eq!(ids(s.active()), vec!["x", "fresh"]);
        assert!(s.archived().is_empty());

        s.replace_archived(vec![]);
        assert_eq!(ids(s.active()), vec!["x", "fresh"]);
    }

    #[test]
    fn test_remote_replace_drops_markers_for_vanished_notes() {
        let mut s = store_with(&["a", "b"], &[]);
        s.begin("a", PendingOp::Archive).expect("should start");
        s.begin("b", PendingOp::Archive).expect("should start");
        s.replace_active(vec![note("b", "", "")]);
        assert!(s.pending("a").is_none());
        assert!(s.pending("b").is_some());

        // A late ack for the vanished note is a no-op.
        s.commit("a", None);
        assert!(s.archived().is_empty());
    }

    #[test]
    fn test_mirror_roundtrip() {
        let mirror = MemoryMirror::default();
        let mut s = NoteStore::load(&mirror);
        assert!(s.active().is_empty());

        s.push_created(note("a", "t", "c"));
        s.persist(&mirror);

        let reloaded = NoteStore::load(&mirror);
        assert_eq!(ids(reloaded.active()), vec!["a"]);
        assert_eq!(mirror.load().notes[0].title, "t");
    }

    #[test]
    fn test_find_reports_list() {
        let s = store_with(&["a"], &["b"]);
        assert_eq!(s.find("a").map(|(v, _)| v), Some(NoteView::Notes));
        assert_eq!(s.find("b").map(|(v, _)| v), Some(NoteView::Archive));
        assert!(s.find("c").is_none());
    }

    #[test]
    fn test_op_outcome() {
        assert!(OpOutcome::Applied.is_applied());
        assert!(!OpOutcome::Failed("x".into()).is_applied());
        assert_eq!(PendingOp::Archive.label(), "Archiving…");
    }
}
