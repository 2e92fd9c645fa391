use super::store::NoteStore;
use crate::api::ApiResult;
use crate::models::{Note, NoteView, SortKey};
use crate::util::parse_timestamp_ms;

/// Input must be idle this long before a remote search is sent.
pub(crate) const SEARCH_DEBOUNCE_MS: i32 = 500;

/// A remote search slower than this falls back to the local match.
pub(crate) const REMOTE_SEARCH_TIMEOUT_MS: i32 = 5_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SearchSource {
    /// Blank query: the whole active list.
    All,
    Remote,
    /// The remote tier failed; `reason` says why.
    LocalFallback { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SearchResolution {
    pub query: String,
    pub notes: Vec<Note>,
    pub source: SearchSource,
}

/// Single-flight bookkeeping for the search box. At most one debounce timer
/// is armed, and only the newest issued request may publish its result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SearchGate {
    latest: u64,
    timer: Option<i32>,
}

impl SearchGate {
    /// A keystroke arrived. Returns the armed timer, which the caller clears.
    pub fn keystroke(&mut self) -> Option<i32> {
        self.timer.take()
    }

    pub fn arm(&mut self, timer: i32) {
        self.timer = Some(timer);
    }

    pub fn fired(&mut self) {
        self.timer = None;
    }

    pub fn pending_timer(&self) -> Option<i32> {
        self.timer
    }

    /// Id for a request about to be sent.
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Make every request already sent stale.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, id: u64) -> bool {
        id == self.latest
    }

    pub fn issued(&self) -> u64 {
        self.latest
    }
}

pub(crate) fn is_blank_query(query: &str) -> bool {
    query.trim().is_empty()
}

/// Case-insensitive substring match over title or content.
///
/// The query is used as typed (not trimmed), matching what the remote
/// endpoint receives.
pub(crate) fn local_match(query: &str, notes: &[Note]) -> Vec<Note> {
    let q = query.to_lowercase();
    notes
        .iter()
        .filter(|n| n.title.to_lowercase().contains(&q) || n.content.to_lowercase().contains(&q))
        .cloned()
        .collect()
}

/// Two-tier search: take the remote answer when there is one, otherwise
/// match locally over `active`.
///
/// `remote` is ignored for a blank query; callers should not send one.
pub(crate) fn resolve_search(
    query: &str,
    active: &[Note],
    remote: ApiResult<Vec<Note>>,
) -> SearchResolution {
    if is_blank_query(query) {
        return SearchResolution {
            query: query.to_string(),
            notes: active.to_vec(),
            source: SearchSource::All,
        };
    }

    match remote {
        Ok(notes) => SearchResolution {
            query: query.to_string(),
            notes,
            source: SearchSource::Remote,
        },
        Err(e) => SearchResolution {
            query: query.to_string(),
            notes: local_match(query, active),
            source: SearchSource::LocalFallback {
                reason: e.to_string(),
            },
        },
    }
}

/// Stable in-place sort. Notes whose `created_at` does not parse sort last
/// under [`SortKey::Date`].
pub(crate) fn sort_notes(notes: &mut [Note], key: SortKey) {
    match key {
        SortKey::Date => notes.sort_by_key(|n| std::cmp::Reverse(parse_timestamp_ms(&n.created_at))),
        SortKey::Content => notes.sort_by(|a, b| a.content.cmp(&b.content)),
    }
}

/// What the dashboard grid shows.
///
/// The notes view shows the latest search result while a query is active
/// (the plain active list until the first result lands) and is sorted.
/// Archive and trash are shown in list order.
pub(crate) fn displayed_notes(
    store: &NoteStore,
    view: NoteView,
    query: &str,
    search: Option<&SearchResolution>,
    sort: SortKey,
) -> Vec<Note> {
    match view {
        NoteView::Notes => {
            let mut out = match search {
                Some(res) if !is_blank_query(query) => res.notes.clone(),
                _ => store.active().to_vec(),
            };
            sort_notes(&mut out, sort);
            out
        }
        NoteView::Archive | NoteView::Trash => store.list(view).to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::notes::MirrorSnapshot;

    #[test]
    fn test_gate_drops_superseded_response() {
        let mut gate = SearchGate::default();
        let first = gate.issue();
        let second = gate.issue();
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }

    #[test]
    fn test_gate_blank_query_invalidates_in_flight() {
        let mut gate = SearchGate::default();
        let id = gate.issue();
        gate.invalidate();
        assert!(!gate.is_current(id));
        assert_eq!(gate.issued(), 2);
    }

    #[test]
    fn test_gate_keeps_one_timer_armed() {
        let mut gate = SearchGate::default();
        assert_eq!(gate.keystroke(), None);
        gate.arm(7);
        // Next keystroke hands back the old timer to clear.
        assert_eq!(gate.keystroke(), Some(7));
        assert_eq!(gate.pending_timer(), None);
        gate.arm(8);
        gate.fired();
        assert_eq!(gate.keystroke(), None);
    }

    fn note(id: &str, title: &str, content: &str, created_at: &str) -> Note {
        Note {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            color: None,
            created_at: created_at.to_string(),
        }
    }

    fn ids(list: &[Note]) -> Vec<&str> {
        list.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_local_match_on_title() {
        let notes = vec![note("1", "abcd", "", ""), note("2", "xyz", "", "")];
        assert_eq!(ids(&local_match("abc", &notes)), vec!["1"]);
    }

    #[test]
    fn test_local_match_is_case_insensitive_and_covers_content() {
        let notes = vec![
            note("1", "Shopping", "Milk and EGGS", ""),
            note("2", "Work", "standup", ""),
            note("3", "eggs benedict", "", ""),
        ];
        assert_eq!(ids(&local_match("eGgS", &notes)), vec!["1", "3"]);
        assert!(local_match("nothing", &notes).is_empty());
    }

    #[test]
    fn test_blank_query_returns_full_active_list() {
        let active = vec![note("1", "b", "", ""), note("2", "a", "", "")];
        for q in ["", "   ", "\t\n"] {
            let res = resolve_search(q, &active, Err(ApiError::network_msg("offline")));
            assert_eq!(res.source, SearchSource::All);
            assert_eq!(ids(&res.notes), vec!["1", "2"]);
        }
    }

    #[test]
    fn test_remote_result_wins_when_available() {
        let active = vec![note("1", "abcd", "", "")];
        let remote = vec![note("9", "from server", "", "")];
        let res = resolve_search("abc", &active, Ok(remote));
        assert_eq!(res.source, SearchSource::Remote);
        assert_eq!(ids(&res.notes), vec!["9"]);
    }

    #[test]
    fn test_remote_failure_falls_back_to_local_match() {
        let active = vec![note("1", "abcd", "", ""), note("2", "xyz", "", "")];

        let res = resolve_search("abc", &active, Err(ApiError::timeout("Search", 5_000)));
        assert_eq!(ids(&res.notes), vec!["1"]);
        match res.source {
            SearchSource::LocalFallback { reason } => assert!(reason.contains("timed out")),
            other => panic!("expected fallback, got {other:?}"),
        }

        let res = resolve_search("XY", &active, Err(ApiError::server("search failed")));
        assert_eq!(ids(&res.notes), vec!["2"]);
    }

    #[test]
    fn test_sort_by_content_is_stable_ascending() {
        let mut notes = vec![
            note("1", "", "pear", ""),
            note("2", "", "apple", ""),
            note("3", "", "pear", ""),
            note("4", "", "apple", ""),
        ];
        sort_notes(&mut notes, SortKey::Content);
        assert_eq!(ids(&notes), vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn test_sort_by_date_newest_first_unparseable_last() {
        let mut notes = vec![
            note("old", "", "", "2023-01-01T00:00:00.000Z"),
            note("bad", "", "", "n/a"),
            note("new", "", "", "2024-06-01T00:00:00.000Z"),
            note("mid", "", "", "2024-01-01T00:00:00.000Z"),
        ];
        sort_notes(&mut notes, SortKey::Date);
        assert_eq!(ids(&notes), vec!["new", "mid", "old", "bad"]);
    }

    #[test]
    fn test_displayed_notes_prefers_search_while_query_active() {
        let store = NoteStore::from_snapshot(MirrorSnapshot {
            notes: vec![note("1", "abcd", "b", ""), note("2", "xyz", "a", "")],
            archive: vec![note("3", "old", "", "")],
            trash: vec![],
        });
        let res = resolve_search("abc", store.active(), Err(ApiError::network_msg("x")));

        let shown = displayed_notes(&store, NoteView::Notes, "abc", Some(&res), SortKey::Content);
        assert_eq!(ids(&shown), vec!["1"]);

        // Cleared query: back to the whole list even if a stale result lingers.
        let shown = displayed_notes(&store, NoteView::Notes, "", Some(&res), SortKey::Content);
        assert_eq!(ids(&shown), vec!["2", "1"]);

        let shown = displayed_notes(&store, NoteView::Archive, "abc", Some(&res), SortKey::Content);
        assert_eq!(ids(&shown), vec!["3"]);
    }
}
