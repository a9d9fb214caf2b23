//! Object-store collaborator — where the intake service parks raw mail.
//!
//! The relay never writes to storage; it only fetches the raw bytes of
//! the one message named by the notification. The store is injected as a
//! trait so tests can substitute an in-memory fake.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::FetchError;

/// Location of one stored raw message: the configured storage location
/// plus a key built from the configured prefix and the message id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageReference {
    pub location: String,
    pub key: String,
}

impl StorageReference {
    pub fn new(location: &str, key_prefix: &str, message_id: &str) -> Self {
        Self {
            location: location.to_string(),
            key: format!("{key_prefix}{message_id}"),
        }
    }
}

impl fmt::Display for StorageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store://{}/{}", self.location, self.key)
    }
}

/// Read-only object store holding raw messages.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the raw bytes stored at `reference`.
    async fn fetch(&self, reference: &StorageReference) -> Result<Vec<u8>, FetchError>;
}

/// Filesystem-backed store: `root/<location>/<key>`.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, reference: &StorageReference) -> PathBuf {
        self.root.join(&reference.location).join(&reference.key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn fetch(&self, reference: &StorageReference) -> Result<Vec<u8>, FetchError> {
        let path = self.path_for(reference);
        tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound {
                    reference: reference.to_string(),
                }
            } else {
                FetchError::Io {
                    reference: reference.to_string(),
                    source,
                }
            }
        })
    }
}
