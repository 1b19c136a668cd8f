//! Credential availability: the in-memory key store, the picker surface, and
//! the probe the controller polls.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::RwLock;
use proto::ProbeError;
use tracing::{debug, info};

/// Answers "is a usable key selected?" and opens the key picker.
#[async_trait]
pub trait KeyProbe: Send + Sync {
    /// Returns whether a key is selected.
    ///
    /// Returns `ProbeError::Unavailable` while the key service is not loaded;
    /// callers poll with a bounded budget.
    async fn has_key(&self) -> Result<bool, ProbeError>;

    /// Opens the key picker. Resolves once a key was chosen.
    async fn prompt_selection(&self) -> Result<(), ProbeError>;

    /// Drops the selected key after the remote rejected it.
    fn forget_key(&self) {}
}

/// User-facing key picker.
#[async_trait]
pub trait KeyPicker: Send + Sync {
    /// Asks the user for a key. `ProbeError::Cancelled` when dismissed.
    async fn pick(&self) -> Result<String, ProbeError>;
}

/// Basic API key validation for picker and config input.
pub fn validate_api_key(api_key: &str) -> Result<String, String> {
    let key = api_key.trim().to_string();
    if key.is_empty() {
        return Err("API key cannot be empty".to_string());
    }
    if key.chars().any(char::is_whitespace) {
        return Err("API key must not contain whitespace".to_string());
    }
    Ok(key)
}

/// Currently selected API key. Lives for the process only.
#[derive(Default)]
pub struct CredentialStore {
    key: RwLock<Option<String>>,
}

impl CredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `key` when it validates.
    pub fn with_key(key: Option<&str>) -> Self {
        let store = Self::new();
        if let Some(key) = key
            && let Ok(key) = validate_api_key(key)
        {
            *store.key.write() = Some(key);
        }
        store
    }

    /// Returns `true` when a key is selected.
    pub fn has_key(&self) -> bool {
        self.key.read().is_some()
    }

    /// Returns the selected key.
    pub fn current(&self) -> Option<String> {
        self.key.read().clone()
    }

    /// Selects `key` after validation.
    pub fn set(&self, key: &str) -> Result<(), String> {
        let key = validate_api_key(key)?;
        *self.key.write() = Some(key);
        debug!("API key selected");
        Ok(())
    }

    /// Forgets the selected key. Returns `true` if one was set.
    pub fn clear(&self) -> bool {
        self.key.write().take().is_some()
    }
}

/// Probe backed by the credential store and a picker attached by the host
/// once its UI is up.
pub struct HostKeyProbe {
    store: Arc<CredentialStore>,
    picker: OnceLock<Arc<dyn KeyPicker>>,
}

impl HostKeyProbe {
    /// Creates a probe whose key service is not loaded yet.
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self {
            store,
            picker: OnceLock::new(),
        }
    }

    /// Attaches the picker, making the key service available.
    /// Returns `false` if a picker was already attached.
    pub fn attach(&self, picker: Arc<dyn KeyPicker>) -> bool {
        let attached = self.picker.set(picker).is_ok();
        if attached {
            info!("Key service attached");
        }
        attached
    }

    /// Returns `true` once a picker is attached.
    pub fn is_available(&self) -> bool {
        self.picker.get().is_some()
    }

    /// Shared credential store.
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }
}

#[async_trait]
impl KeyProbe for HostKeyProbe {
    async fn has_key(&self) -> Result<bool, ProbeError> {
        if !self.is_available() {
            return Err(ProbeError::Unavailable);
        }
        Ok(self.store.has_key())
    }

    async fn prompt_selection(&self) -> Result<(), ProbeError> {
        let picker = self.picker.get().ok_or(ProbeError::Unavailable)?;
        let key = picker.pick().await?;
        self.store.set(&key).map_err(ProbeError::Failed)
    }

    fn forget_key(&self) {
        if self.store.clear() {
            info!("Rejected API key forgotten");
        }
    }
}
