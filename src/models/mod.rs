use serde::{Deserialize, Serialize};

/// Backend user object.
///
/// Signup returns this under the `user` field. It is persisted verbatim and
/// never inspected beyond display, so it stays opaque.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct AccountInfo {
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl AccountInfo {
    pub fn display_name(&self) -> Option<String> {
        ["Username", "username", "email"]
            .iter()
            .find_map(|k| self.extra.get(*k).and_then(|v| v.as_str()))
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_string())
    }
}

/// A note as mirrored locally.
///
/// The backend keys notes by `_id` (Mongo style); some responses use `id`.
/// Server payloads go through [`Note::from_value`]; the serde derive is the
/// mirror format.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Note {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

impl Note {
    /// Parse a server note object. Returns `None` when it carries no id.
    pub fn from_value(item: &serde_json::Value) -> Option<Note> {
        let get_s = |k: &str| item.get(k).and_then(|v| v.as_str()).map(|s| s.to_string());

        let id = get_s("_id").or_else(|| get_s("id")).unwrap_or_default();
        if id.trim().is_empty() {
            return None;
        }

        Some(Note {
            id,
            title: get_s("title").unwrap_or_default(),
            content: get_s("content").unwrap_or_default(),
            color: get_s("color").filter(|c| !c.trim().is_empty()),
            created_at: get_s("createdAt")
                .or_else(|| get_s("created_at"))
                .unwrap_or_default(),
        })
    }

    pub fn list_from_value(list: &serde_json::Value) -> Vec<Note> {
        list.as_array()
            .map(|items| items.iter().filter_map(Note::from_value).collect())
            .unwrap_or_default()
    }

    /// Text handed to speech synthesis.
    pub fn spoken_text(&self) -> String {
        format!("{}. {}", self.title, self.content)
    }
}

/// Which list the dashboard is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
pub(crate) enum NoteView {
    #[default]
    Notes,
    Archive,
    Trash,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, strum::Display)]
pub(crate) enum SortKey {
    /// Newest first.
    #[default]
    Date,
    /// Ascending by content.
    Content,
}

impl SortKey {
    pub fn toggled(self) -> Self {
        match self {
            SortKey::Date => SortKey::Content,
            SortKey::Content => SortKey::Date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_from_value_accepts_mongo_id() {
        let v = serde_json::json!({
            "_id": "n1",
            "title": "t",
            "content": "c",
            "color": "#ffe666",
            "createdAt": "2024-01-02T03:04:05.000Z"
        });
        let n = Note::from_value(&v).expect("should parse");
        assert_eq!(n.id, "n1");
        assert_eq!(n.color.as_deref(), Some("#ffe666"));
        assert_eq!(n.created_at, "2024-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_note_from_value_accepts_plain_id_and_rejects_missing() {
        let n = Note::from_value(&serde_json::json!({"id": "n2", "title": "x"}))
            .expect("plain id should parse");
        assert_eq!(n.id, "n2");
        assert!(n.color.is_none());
        assert!(n.content.is_empty());

        assert!(Note::from_value(&serde_json::json!({"title": "no id"})).is_none());
        assert!(Note::from_value(&serde_json::json!({"_id": "  "})).is_none());
    }

    #[test]
    fn test_note_mirror_format_uses_mongo_keys() {
        let n = Note {
            id: "a".to_string(),
            title: "t".to_string(),
            content: "c".to_string(),
            color: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };
        let v = serde_json::to_value(&n).expect("should serialize");
        assert_eq!(v["_id"], "a");
        assert_eq!(v["createdAt"], "2024-01-01T00:00:00Z");
        assert!(v.get("color").is_none());

        let back: Note = serde_json::from_value(v).expect("should deserialize");
        assert_eq!(back, n);
    }

    #[test]
    fn test_list_from_value_skips_invalid_items() {
        let v = serde_json::json!([{"_id": "1"}, {"title": "orphan"}, {"_id": "2"}]);
        let ids: Vec<String> = Note::list_from_value(&v).into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(Note::list_from_value(&serde_json::json!({"not": "a list"})).is_empty());
    }

    #[test]
    fn test_account_display_name() {
        let u = AccountInfo {
            extra: serde_json::json!({"Username": "ana", "email": "a@x.io"}),
        };
        assert_eq!(u.display_name().as_deref(), Some("ana"));

        let u = AccountInfo {
            extra: serde_json::json!({"email": "a@x.io"}),
        };
        assert_eq!(u.display_name().as_deref(), Some("a@x.io"));
    }

    #[test]
    fn test_sort_key_toggle() {
        assert_eq!(SortKey::Date.toggled(), SortKey::Content);
        assert_eq!(SortKey::Content.toggled(), SortKey::Date);
    }
}
