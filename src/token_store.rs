//! Durable storage for the access/refresh token pair.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session manager is the only writer. Stores do no expiry tracking; an
//! expired access token is discovered when an authenticated call fails.
//!
//! DESIGN
//! ======
//! `FileTokenStore` keeps one JSON object under fixed keys (`access_token`,
//! `refresh_token`, plus the pair's metadata) so the session survives process
//! restarts. Writes go to a sibling temp file and are renamed into place.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::TokenStoreError;
use crate::types::TokenPair;

/// Persistence contract for the session's token pair.
pub trait TokenStore: Send + Sync {
    /// Replace any stored pair with `pair`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, pair: &TokenPair) -> Result<(), TokenStoreError>;

    /// Return the stored pair, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage exists but cannot be read.
    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError>;

    /// Remove both tokens. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be removed.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    pair: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded store, as if a previous run had saved `pair`.
    #[must_use]
    pub fn with_pair(pair: TokenPair) -> Self {
        Self { pair: Mutex::new(Some(pair)) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, pair: &TokenPair) -> Result<(), TokenStoreError> {
        *self.pair.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(pair.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError> {
        Ok(self.pair.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.pair.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON-file store, the native counterpart of browser local storage.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, pair: &TokenPair) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_vec_pretty(pair).map_err(TokenStoreError::Encode)?;
        let tmp = self.temp_path();
        write_private(&tmp, &encoded)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "token pair saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let pair: TokenPair = serde_json::from_slice(&raw).map_err(TokenStoreError::Decode)?;
        if pair.access_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(pair))
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "token pair cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `bytes` to `path`, creating it owner-only before any byte lands.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // A leftover temp file keeps its old mode; tighten it before writing.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
#[path = "token_store_test.rs"]
mod tests;
