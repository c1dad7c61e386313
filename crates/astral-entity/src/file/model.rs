//! File entity model.

use std::collections::{BTreeMap, BTreeSet};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use astral_core::error::{AppError, ErrorKind};
use astral_core::result::AppResult;

/// A stored document as seen by callers (no content attached).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Generated identifier, the second half of the object key.
    pub id: Uuid,
    /// Original file name.
    pub name: String,
    /// `true` when the document carries byte content, `false` for a pure JSON record.
    #[serde(rename = "file")]
    pub is_inline_file: bool,
    /// Whether any authenticated user may read the document.
    pub public: bool,
    /// Content type.
    #[serde(rename = "mime")]
    pub mime_type: String,
    /// Logins with explicit read access.
    #[serde(default)]
    pub grant: BTreeSet<String>,
    /// Size of the content in bytes.
    #[serde(rename = "size")]
    pub size_bytes: u64,
    /// User-supplied metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Upload time.
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
    /// Login of the owner.
    #[serde(rename = "owner")]
    pub owner_login: String,
}

impl File {
    /// Backend object key for this file.
    pub fn object_key(&self) -> String {
        super::metadata::object_key(&self.owner_login, self.id)
    }

    /// Whether `login` owns this file.
    pub fn is_owned_by(&self, login: &str) -> bool {
        self.owner_login == login
    }

    /// Read access: denied only when the file is private, `login` is not the
    /// owner, and `login` is not in the grant list.
    pub fn is_readable_by(&self, login: &str) -> bool {
        self.public || self.is_owned_by(login) || self.grant.contains(login)
    }
}

/// A file together with its content bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// File attributes.
    pub file: File,
    /// Full content.
    pub content: Bytes,
}

/// Cache representation of a [`StoredFile`]; content travels as base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedFile {
    /// File attributes.
    #[serde(flatten)]
    pub file: File,
    /// Base64-encoded content.
    pub data: String,
}

impl From<&StoredFile> for CachedFile {
    fn from(stored: &StoredFile) -> Self {
        Self {
            file: stored.file.clone(),
            data: STANDARD.encode(&stored.content),
        }
    }
}

impl TryFrom<CachedFile> for StoredFile {
    type Error = AppError;

    fn try_from(cached: CachedFile) -> AppResult<Self> {
        let content = STANDARD.decode(cached.data.as_bytes()).map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Corrupt cached file content", e)
        })?;
        Ok(Self {
            file: cached.file,
            content: Bytes::from(content),
        })
    }
}
