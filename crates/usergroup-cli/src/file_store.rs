//! Session persistence in a JSON file under the user's config directory.
//!
//! The file holds a flat `{key: value}` object using the same
//! `{app}_goapi_{field}` keys as every other store, so several
//! applications can share one file. It is re-read on every access; a
//! session removed by another process is noticed immediately.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use usergroup_sdk::{PersistedSession, SessionField, SessionStore, StoreError};

const APP_DIR: &str = "usergroup-cli";
const SESSION_FILE: &str = "session.json";

type Entries = BTreeMap<String, String>;

/// [`SessionStore`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    app: String,
    path: Option<PathBuf>,
}

impl FileSessionStore {
    /// Store at an explicit path.
    pub fn new(app: &str, path: PathBuf) -> Self {
        Self {
            app: app.to_string(),
            path: Some(path),
        }
    }

    /// Store at `<config dir>/usergroup-cli/session.json`.
    ///
    /// Hosts without a config directory get an unavailable store.
    pub fn in_config_dir(app: &str) -> Self {
        Self {
            app: app.to_string(),
            path: dirs::config_dir().map(|d| d.join(APP_DIR).join(SESSION_FILE)),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current entries, for read paths: any failure reads as an empty file.
    fn load(path: &Path) -> Entries {
        Self::load_for_update(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "cannot read session file");
            Entries::new()
        })
    }

    /// Current entries, for read-modify-write paths.
    ///
    /// A missing or unparsable file starts from empty. A file that exists
    /// but cannot be read is an error, so other applications' keys are
    /// never overwritten with an empty map.
    fn load_for_update(path: &Path) -> Result<Entries, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(StoreError::Backend(e.to_string())),
        };
        Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unparsable session file");
            Entries::new()
        }))
    }

    fn save(path: &Path, entries: &Entries) -> Result<(), StoreError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(entries).map_err(|e| StoreError::Backend(e.to_string()))?;

        // Write then rename so readers never see a partial file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Backend(e.to_string()))?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, path).map_err(|e| StoreError::Backend(e.to_string()))?;

        debug!(path = %path.display(), keys = entries.len(), "session file written");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| StoreError::Backend(e.to_string()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

impl SessionStore for FileSessionStore {
    fn is_available(&self) -> bool {
        self.path.is_some()
    }

    fn write(&self, session: &PersistedSession) -> Result<(), StoreError> {
        let path = self.path.as_deref().ok_or(StoreError::Unavailable)?;
        let mut entries = Self::load_for_update(path)?;
        for (field, value) in session.fields() {
            entries.insert(field.key(&self.app), value);
        }
        Self::save(path, &entries)
    }

    fn read_field(&self, field: SessionField) -> Option<String> {
        let path = self.path.as_deref()?;
        Self::load(path).remove(&field.key(&self.app))
    }

    fn remove_all(&self) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        let mut entries = match Self::load_for_update(path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot clear session file");
                return;
            }
        };
        let before = entries.len();
        for field in SessionField::all() {
            entries.remove(&field.key(&self.app));
        }
        if entries.len() == before {
            return;
        }
        if let Err(e) = Self::save(path, &entries) {
            warn!(path = %path.display(), error = %e, "cannot clear session file");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tempfile::TempDir;
    use usergroup_sdk::GroupIds;

    use super::*;

    fn session() -> PersistedSession {
        PersistedSession {
            token: "a.b.c".into(),
            user_id: 5,
            external_id: String::new(),
            name: "Zoë".into(),
            login: "zoe".into(),
            email: "zoe@example.com".into(),
            is_admin: false,
            group_ids: GroupIds::new(vec![1, 2]),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn write_then_read() {
        let tmp = TempDir::new().unwrap();
        let store = FileSessionStore::new("App", tmp.path().join("nested/session.json"));

        store.write(&session()).unwrap();

        assert_eq!(store.read_field(SessionField::Name).as_deref(), Some("Zoë"));
        assert_eq!(store.read_field(SessionField::Groups).as_deref(), Some("1,2"));
        let raw = fs::read_to_string(store.path().unwrap()).unwrap();
        assert!(raw.contains("App_goapi_jwt_session_token"));
    }

    #[test]
    fn remove_all_keeps_other_apps() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        let mine = FileSessionStore::new("Mine", path.clone());
        let theirs = FileSessionStore::new("Theirs", path);

        mine.write(&session()).unwrap();
        theirs.write(&session()).unwrap();
        mine.remove_all();
        mine.remove_all();

        assert_eq!(mine.read_field(SessionField::Token), None);
        assert_eq!(theirs.read_field(SessionField::Token).as_deref(), Some("a.b.c"));
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileSessionStore::new("App", path);

        assert_eq!(store.read_field(SessionField::Token), None);
        store.write(&session()).unwrap();
        assert_eq!(store.read_field(SessionField::UserId).as_deref(), Some("5"));
    }

    #[test]
    fn unreadable_file_is_left_alone() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        // Not UTF-8: the read fails with InvalidData.
        let original = b"{\"Theirs_goapi_name\":\"Zo\xeb\"}".to_vec();
        fs::write(&path, &original).unwrap();
        let store = FileSessionStore::new("Mine", path.clone());

        let err = store.write(&session()).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        store.remove_all();
        assert_eq!(fs::read(&path).unwrap(), original);
        assert_eq!(store.read_field(SessionField::Token), None);
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = FileSessionStore::new("App", tmp.path().join("session.json"));
        store.write(&session()).unwrap();

        let mode = fs::metadata(store.path().unwrap()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
