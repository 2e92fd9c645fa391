use crate::models::{AccountInfo, Note};
use crate::notes::{Mirror, MirrorSnapshot};
use serde::{Deserialize, Serialize};

pub(crate) const TOKEN_KEY: &str = "token";
pub(crate) const USER_KEY: &str = "user";
pub(crate) const DARK_MODE_KEY: &str = "darkMode";

// Offline mirror of the three note lists.
pub(crate) const NOTES_KEY: &str = "notes";
pub(crate) const ARCHIVE_KEY: &str = "archive";
pub(crate) const TRASH_KEY: &str = "trash";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn save_user_to_storage(user: &AccountInfo) {
    save_json_to_storage(USER_KEY, user);
}

pub(crate) fn load_user_from_storage() -> Option<AccountInfo> {
    load_json_from_storage(USER_KEY)
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let json = local_storage()?.get_item(key).ok().flatten()?;
    match serde_json::from_str(&json) {
        Ok(v) => Some(v),
        Err(e) => {
            leptos::logging::warn!("Error parsing {key} from localStorage: {e}");
            None
        }
    }
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, &json);
        }
    }
}

pub(crate) fn load_dark_mode() -> bool {
    local_storage()
        .and_then(|s| s.get_item(DARK_MODE_KEY).ok().flatten())
        .map(|v| v == "true")
        .unwrap_or(false)
}

pub(crate) fn save_dark_mode(on: bool) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(DARK_MODE_KEY, if on { "true" } else { "false" });
    }
}

/// The browser-side mirror: three JSON arrays under fixed keys.
///
/// A corrupt or missing key loads as an empty list.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LocalStorageMirror;

impl Mirror for LocalStorageMirror {
    fn load(&self) -> MirrorSnapshot {
        let list = |key: &str| load_json_from_storage::<Vec<Note>>(key).unwrap_or_default();
        MirrorSnapshot {
            notes: list(NOTES_KEY),
            archive: list(ARCHIVE_KEY),
            trash: list(TRASH_KEY),
        }
    }

    fn save(&self, snapshot: &MirrorSnapshot) {
        save_json_to_storage(NOTES_KEY, &snapshot.notes);
        save_json_to_storage(ARCHIVE_KEY, &snapshot.archive);
        save_json_to_storage(TRASH_KEY, &snapshot.trash);
    }
}
