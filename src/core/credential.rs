//! The single API credential: where it is persisted and how it is updated.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::core::config::data::path_display;
use crate::core::config::io::project_dirs;
use crate::core::config::Config;
use crate::core::constants::{API_KEY_ENV, CREDENTIAL_SLOT, KEYRING_SERVICE};
use crate::core::keyring::{KeyringAccessError, KeyringSlot};

#[derive(Debug)]
pub enum CredentialError {
    /// The submitted value was blank after trimming; nothing was stored.
    Empty,
    Keyring(KeyringAccessError),
    Io { path: PathBuf, source: std::io::Error },
    /// No platform directory to keep the credential file in.
    NoStorageDir,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::Empty => write!(f, "API key cannot be empty"),
            CredentialError::Keyring(err) if err.is_recoverable() => {
                write!(f, "System keyring is unavailable: {err}")
            }
            CredentialError::Keyring(err) => write!(f, "System keyring error: {err}"),
            CredentialError::Io { path, source } => {
                write!(f, "Failed to access {}: {}", path_display(path), source)
            }
            CredentialError::NoStorageDir => write!(f, "Failed to determine data directory"),
        }
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CredentialError::Keyring(err) => Some(err),
            CredentialError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<KeyringAccessError> for CredentialError {
    fn from(err: KeyringAccessError) -> Self {
        CredentialError::Keyring(err)
    }
}

/// Persistence for one credential string.
pub trait CredentialStore: Send {
    fn load(&self) -> Result<Option<String>, CredentialError>;
    fn save(&mut self, value: &str) -> Result<(), CredentialError>;
    fn clear(&mut self) -> Result<(), CredentialError>;

    /// Whether a saved value outlives the process.
    fn persists(&self) -> bool {
        true
    }
}

pub struct KeyringCredentialStore {
    slot: KeyringSlot,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            slot: KeyringSlot::new(KEYRING_SERVICE, CREDENTIAL_SLOT),
        }
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.slot.read()?)
    }

    fn save(&mut self, value: &str) -> Result<(), CredentialError> {
        Ok(self.slot.write(value)?)
    }

    fn clear(&mut self) -> Result<(), CredentialError> {
        Ok(self.slot.delete()?)
    }
}

/// Keeps the credential in an owner-only file, for systems without a usable
/// keyring.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self, CredentialError> {
        let dirs = project_dirs().ok_or(CredentialError::NoStorageDir)?;
        Ok(Self::new(dirs.data_local_dir().join(CREDENTIAL_SLOT)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_err(err)),
        }
    }

    fn save(&mut self, value: &str) -> Result<(), CredentialError> {
        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;

        let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| self.io_err(e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp_file
                .as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_err(e))?;
        }
        temp_file
            .write_all(value.as_bytes())
            .map_err(|e| self.io_err(e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| self.io_err(e.error))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_err(err)),
        }
    }
}

/// Process-local store; nothing survives the run.
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    value: Option<String>,
}

impl MemoryCredentialStore {
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.value.clone())
    }

    fn save(&mut self, value: &str) -> Result<(), CredentialError> {
        self.value = Some(value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CredentialError> {
        self.value = None;
        Ok(())
    }

    fn persists(&self) -> bool {
        false
    }
}

/// Pick the backing store for this run: memory only with `--env-only`,
/// otherwise the keyring unless the config turns it off.
pub fn store_for(
    config: &Config,
    env_only: bool,
) -> Result<Box<dyn CredentialStore>, CredentialError> {
    if env_only {
        return Ok(Box::new(MemoryCredentialStore::default()));
    }
    if config.use_keyring() {
        Ok(Box::new(KeyringCredentialStore::new()))
    } else {
        Ok(Box::new(FileCredentialStore::default_location()?))
    }
}

/// In-memory copy of the credential plus the store it came from.
pub struct CredentialHolder {
    store: Box<dyn CredentialStore>,
    current: String,
}

impl CredentialHolder {
    /// Read the persisted value. A store that cannot be read leaves the
    /// credential unset so the user is asked for one.
    pub fn load(store: Box<dyn CredentialStore>) -> Self {
        let current = match store.load() {
            Ok(value) => value.map(|v| v.trim().to_string()).unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "could not read stored credential");
                String::new()
            }
        };
        debug!(present = !current.is_empty(), "credential loaded");
        Self { store, current }
    }

    /// Apply `ABZ_API_KEY` for this run without persisting it.
    pub fn with_env_override(self) -> Self {
        let value = std::env::var(API_KEY_ENV).ok();
        self.with_override(value)
    }

    pub fn with_override(mut self, value: Option<String>) -> Self {
        if let Some(value) = value {
            let value = value.trim();
            if !value.is_empty() {
                self.current = value.to_string();
            }
        }
        self
    }

    /// Trim and persist `value`. Blank input is rejected and leaves both the
    /// store and the in-memory value untouched.
    pub fn save(&mut self, value: &str) -> Result<(), CredentialError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CredentialError::Empty);
        }
        self.store.save(value)?;
        self.current = value.to_string();
        info!("credential stored");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), CredentialError> {
        self.store.clear()?;
        self.current.clear();
        info!("credential cleared");
        Ok(())
    }

    pub fn current(&self) -> Option<&str> {
        (!self.current.is_empty()).then_some(self.current.as_str())
    }

    pub fn is_set(&self) -> bool {
        !self.current.is_empty()
    }

    /// False when saves only last for this run.
    pub fn persists(&self) -> bool {
        self.store.persists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Memory store whose contents stay observable after being boxed.
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<Option<String>>>);

    impl CredentialStore for SharedStore {
        fn load(&self) -> Result<Option<String>, CredentialError> {
            Ok(self.0.lock().unwrap().clone())
        }

        fn save(&mut self, value: &str) -> Result<(), CredentialError> {
            *self.0.lock().unwrap() = Some(value.to_string());
            Ok(())
        }

        fn clear(&mut self) -> Result<(), CredentialError> {
            *self.0.lock().unwrap() = None;
            Ok(())
        }
    }

    struct BrokenStore;

    impl CredentialStore for BrokenStore {
        fn load(&self) -> Result<Option<String>, CredentialError> {
            Err(CredentialError::NoStorageDir)
        }

        fn save(&mut self, _value: &str) -> Result<(), CredentialError> {
            Err(CredentialError::NoStorageDir)
        }

        fn clear(&mut self) -> Result<(), CredentialError> {
            Err(CredentialError::NoStorageDir)
        }
    }

    #[test]
    fn absent_credential_loads_as_unset() {
        let holder = CredentialHolder::load(Box::new(MemoryCredentialStore::default()));
        assert!(holder.current().is_none());
        assert!(!holder.is_set());
    }

    #[test]
    fn blank_saves_are_rejected_without_persisting() {
        let shared = SharedStore::default();
        *shared.0.lock().unwrap() = Some("old".to_string());
        let mut holder = CredentialHolder::load(Box::new(shared.clone()));

        for blank in ["", "   "] {
            assert!(matches!(holder.save(blank), Err(CredentialError::Empty)));
        }
        assert_eq!(holder.current(), Some("old"));
        assert_eq!(shared.0.lock().unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn save_trims_and_persists() {
        let shared = SharedStore::default();
        let mut holder = CredentialHolder::load(Box::new(shared.clone()));

        holder.save(" abc ").expect("save");
        assert_eq!(holder.current(), Some("abc"));
        assert_eq!(shared.0.lock().unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn failed_store_keeps_previous_value() {
        let mut holder =
            CredentialHolder::load(Box::new(BrokenStore)).with_override(Some("env".to_string()));
        assert!(holder.save("new").is_err());
        assert_eq!(holder.current(), Some("env"));
    }

    #[test]
    fn blank_override_is_ignored() {
        let holder = CredentialHolder::load(Box::new(MemoryCredentialStore::with_value("kept")))
            .with_override(Some("  ".to_string()));
        assert_eq!(holder.current(), Some("kept"));
    }

    #[test]
    fn clear_unsets_credential() {
        let mut holder =
            CredentialHolder::load(Box::new(MemoryCredentialStore::with_value("sk-1")));
        holder.clear().expect("clear");
        assert!(holder.current().is_none());
    }

    #[test]
    fn only_memory_store_is_session_only() {
        let memory = CredentialHolder::load(Box::new(MemoryCredentialStore::default()));
        assert!(!memory.persists());

        let dir = TempDir::new().expect("tempdir");
        let file = CredentialHolder::load(Box::new(FileCredentialStore::new(dir.path().join("k"))));
        assert!(file.persists());
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = TempDir::new().expect("tempdir");
        let mut store = FileCredentialStore::new(dir.path().join("data").join("nexus_api_key"));

        assert_eq!(store.load().expect("load"), None);
        store.save("sk-file").expect("save");
        assert_eq!(store.load().expect("load").as_deref(), Some("sk-file"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(store.path()).expect("meta").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        store.clear().expect("clear");
        assert_eq!(store.load().expect("load"), None);
        store.clear().expect("clearing twice is fine");
    }
}
