//! Upload descriptor.

use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;

/// Everything a caller supplies to store a new document. The owner comes
/// from the authenticated request, not from this struct.
#[derive(Debug, Clone, Default)]
pub struct NewFile {
    /// File name; validated before anything is written.
    pub name: String,
    /// Whether the document carries byte content.
    pub is_inline_file: bool,
    /// Whether any authenticated user may read the document.
    pub public: bool,
    /// Declared content type; detected from the name when absent.
    pub mime_type: Option<String>,
    /// Logins granted read access.
    pub grant: BTreeSet<String>,
    /// Raw user metadata; trimmed and filtered on upload.
    pub metadata: BTreeMap<String, String>,
    /// Content bytes.
    pub content: Bytes,
}

impl NewFile {
    /// Size of the content in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }
}
