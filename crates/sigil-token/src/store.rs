//! In-memory key store with file snapshots.
//!
//! The store maps identity -> [`KeyPair`]. Pairs are immutable and shared as
//! `Arc`s, so a replacement is a single map insert: a concurrent reader sees
//! either the old pair or the new one.
//!
//! ## Persisted layout
//!
//! ```text
//! <dir>/
//!   servicea-public.pem
//!   servicea-private.pem
//!   service-b-public.pem     # identities may contain dashes
//!   service-b-private.pem
//! ```

use crate::error::TokenError;
use crate::keys::{KEY_FILE_EXTENSION, KeyPair, validate_identity};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// Which half of a pair a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyHalf {
    Public,
    Private,
}

/// Thread-safe identity -> key pair table backed by a key directory.
pub struct KeyStore {
    keys: RwLock<HashMap<String, Arc<KeyPair>>>,
    dir: PathBuf,
}

impl KeyStore {
    /// Create an empty store persisting to `dir`. Nothing is read yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            dir: dir.into(),
        }
    }

    /// Create a store and load whatever `dir` already holds.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, TokenError> {
        let store = Self::new(dir);
        store.load_from_durable_store()?;
        Ok(store)
    }

    /// Generate a fresh pair for `identity`, replacing any existing one.
    pub fn create(&self, identity: &str) -> Result<Arc<KeyPair>, TokenError> {
        let pair = KeyPair::generate(identity)?;
        Ok(self.insert(pair))
    }

    /// Register a pair produced elsewhere, replacing any existing one.
    pub fn insert(&self, pair: KeyPair) -> Arc<KeyPair> {
        let pair = Arc::new(pair);
        tracing::info!(identity = %pair.identity(), "Storing key pair");
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pair.identity().to_string(), Arc::clone(&pair));
        pair
    }

    /// Look up the pair for `identity`.
    pub fn get(&self, identity: &str) -> Option<Arc<KeyPair>> {
        tracing::debug!(identity = %identity, "Getting key pair");
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }

    /// Check if an identity has a key pair.
    pub fn contains(&self, identity: &str) -> bool {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(identity)
    }

    /// All known identities, sorted.
    pub fn identities(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every pair to the key directory, creating it if needed and
    /// overwriting existing files. Returns the directory.
    pub fn snapshot_to_durable_store(&self) -> Result<PathBuf, TokenError> {
        fs::create_dir_all(&self.dir)?;

        let pairs: Vec<Arc<KeyPair>> = self
            .keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for pair in &pairs {
            tracing::info!(identity = %pair.identity(), "Saving key pair");
            pair.save_to_dir(&self.dir)?;
        }

        tracing::info!(dir = %self.dir.display(), count = pairs.len(), "Key snapshot written");
        Ok(self.dir.clone())
    }

    /// Load every pair found in the key directory, returning how many were loaded.
    ///
    /// Files are paired by identity prefix regardless of listing order.
    /// Names that do not follow `<identity>-{public,private}.pem` are skipped
    /// with a warning. A missing directory is created and yields zero pairs.
    pub fn load_from_durable_store(&self) -> Result<usize, TokenError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
            return Ok(0);
        }

        let mut halves: HashMap<String, (Option<String>, Option<String>)> = HashMap::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let Some((identity, half)) = file_name.to_str().and_then(parse_key_file_name) else {
                tracing::warn!(file = ?file_name, "Skipping file with unrecognized key file name");
                continue;
            };

            tracing::info!(identity = %identity, half = ?half, "Loading key");
            let pem = fs::read_to_string(entry.path())?;
            let slot = halves.entry(identity.to_string()).or_default();
            match half {
                KeyHalf::Public => slot.0 = Some(pem),
                KeyHalf::Private => slot.1 = Some(pem),
            }
        }

        let count = halves.len();
        for (identity, (public_pem, private_pem)) in halves {
            let pair = KeyPair::from_pem(identity, public_pem, private_pem)?;
            self.insert(pair);
        }

        tracing::info!(dir = %self.dir.display(), count, "Loaded key pairs");
        Ok(count)
    }
}

/// Split `<identity>-<half>.pem` at the last dash.
fn parse_key_file_name(name: &str) -> Option<(&str, KeyHalf)> {
    let stem = name.strip_suffix(KEY_FILE_EXTENSION)?.strip_suffix('.')?;
    let (identity, half) = stem.rsplit_once('-')?;
    validate_identity(identity).ok()?;
    let half = match half {
        "public" => KeyHalf::Public,
        "private" => KeyHalf::Private,
        _ => return None,
    };
    Some((identity, half))
}
