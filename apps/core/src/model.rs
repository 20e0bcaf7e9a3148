use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Opaque key a catalog uses for the directory holding a file.
pub type DirectoryId = i64;

/// Normalized clipboard subject used as the substring search key.
///
/// Only [`crate::extract::extract`] builds these, so a token is never shorter
/// than [`crate::extract::MIN_TOKEN_CHARS`] characters and never holds a `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SearchToken(String);

impl SearchToken {
    pub(crate) fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for SearchToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SearchToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One row of a catalog's file table, exactly as fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub file_name: String,
    pub file_size: u64,
    pub parent_directory_id: DirectoryId,
}

/// A catalog row whose directory id has been turned into a display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub file_name: String,
    pub file_size: u64,
    pub directory: String,
}

impl ResolvedEntry {
    pub fn with_directory(entry: CatalogEntry, directory: String) -> Self {
        Self {
            file_name: entry.file_name,
            file_size: entry.file_size,
            directory,
        }
    }

    /// Keeps the raw directory id as the label.
    pub fn unresolved(entry: CatalogEntry) -> Self {
        let directory = entry.parent_directory_id.to_string();
        Self::with_directory(entry, directory)
    }
}

/// Matches from one catalog for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub catalog_name: String,
    pub original_token: String,
    pub entries: Vec<ResolvedEntry>,
    pub count: usize,
}

impl QueryResult {
    pub fn new(catalog_name: &str, token: &SearchToken, entries: Vec<ResolvedEntry>) -> Self {
        let count = entries.len();
        Self {
            catalog_name: catalog_name.to_string(),
            original_token: token.as_str().to_string(),
            entries,
            count,
        }
    }

    pub fn found(&self) -> bool {
        self.count > 0
    }
}
