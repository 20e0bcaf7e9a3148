use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog_store::{make_select, BackendError, CatalogBackend, CatalogConnector, PATH_SEPARATOR};
use crate::collation;
use crate::model::{CatalogEntry, DirectoryId, QueryResult, ResolvedEntry, SearchToken};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No connection to \"{catalog}\": {source}")]
    Connection {
        catalog: String,
        #[source]
        source: BackendError,
    },
    #[error("No connection to catalog {catalog}.")]
    NotConnected { catalog: String },
    #[error("Error while looking up \"{token}\" in {catalog}: {source}")]
    Query {
        catalog: String,
        token: String,
        #[source]
        source: BackendError,
    },
}

impl CatalogError {
    pub fn catalog(&self) -> &str {
        match self {
            Self::Connection { catalog, .. }
            | Self::NotConnected { catalog }
            | Self::Query { catalog, .. } => catalog,
        }
    }
}

/// Where a catalog lives and how it should be queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSource {
    pub filepath: PathBuf,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_results: u32,
    pub wants_parent_directories: bool,
}

impl CatalogSource {
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
            username: None,
            password: None,
            max_results: 0,
            wants_parent_directories: true,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_parent_directories(mut self, wanted: bool) -> Self {
        self.wants_parent_directories = wanted;
        self
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    pub fn display_name(&self) -> String {
        self.filepath
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filepath.to_string_lossy().into_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// A configured catalog and its (possibly absent) live connection.
pub struct Catalog {
    source: CatalogSource,
    name: String,
    connection: Option<Box<dyn CatalogBackend>>,
}

impl Catalog {
    pub fn new(source: CatalogSource) -> Self {
        let name = source.display_name();
        Self {
            source,
            name,
            connection: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn status(&self) -> ConnectionStatus {
        if self.connection.is_some() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Opens a fresh connection, replacing any existing one.
    pub fn connect(&mut self, connector: &dyn CatalogConnector) -> Result<(), CatalogError> {
        match connector.connect(&self.source) {
            Ok(backend) => {
                self.connection = Some(backend);
                tracing::info!(catalog = %self.name, "catalog connected");
                Ok(())
            }
            Err(source) => {
                self.connection = None;
                Err(CatalogError::Connection {
                    catalog: self.name.clone(),
                    source,
                })
            }
        }
    }

    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            tracing::info!(catalog = %self.name, "catalog disconnected");
        }
    }

    /// Runs the substring query and shapes the rows into display entries.
    ///
    /// Entries come back in collated name order. Directory labels are looked
    /// up once per distinct directory id.
    pub fn query(&self, token: &SearchToken) -> Result<(Vec<ResolvedEntry>, usize), CatalogError> {
        let backend = self.backend()?;
        let statement = make_select(token.as_str(), self.source.max_results);
        let mut rows = backend
            .select_entries(&statement)
            .map_err(|source| CatalogError::Query {
                catalog: self.name.clone(),
                token: token.as_str().to_string(),
                source,
            })?;

        collation::sort_by_name(&mut rows, |row| row.file_name.as_str());

        let entries = if self.source.wants_parent_directories {
            self.resolve_entries(backend, rows)
        } else {
            rows.into_iter().map(ResolvedEntry::unresolved).collect()
        };
        let count = entries.len();
        Ok((entries, count))
    }

    pub fn search(&self, token: &SearchToken) -> Result<QueryResult, CatalogError> {
        let (entries, _) = self.query(token)?;
        Ok(QueryResult::new(&self.name, token, entries))
    }

    /// Best effort: failures are logged and yield an empty label.
    pub fn resolve_directory(&self, directory_id: DirectoryId) -> String {
        match self.backend() {
            Ok(backend) => self.lookup_directory(backend, directory_id),
            Err(error) => {
                tracing::warn!(catalog = %self.name, directory_id, %error, "directory lookup skipped");
                String::new()
            }
        }
    }

    fn backend(&self) -> Result<&dyn CatalogBackend, CatalogError> {
        self.connection
            .as_deref()
            .ok_or_else(|| CatalogError::NotConnected {
                catalog: self.name.clone(),
            })
    }

    fn resolve_entries(
        &self,
        backend: &dyn CatalogBackend,
        rows: Vec<CatalogEntry>,
    ) -> Vec<ResolvedEntry> {
        let mut labels: HashMap<DirectoryId, String> = HashMap::new();
        rows.into_iter()
            .map(|row| {
                let label = labels
                    .entry(row.parent_directory_id)
                    .or_insert_with(|| self.lookup_directory(backend, row.parent_directory_id))
                    .clone();
                ResolvedEntry::with_directory(row, label)
            })
            .collect()
    }

    fn lookup_directory(&self, backend: &dyn CatalogBackend, directory_id: DirectoryId) -> String {
        match backend.full_path(directory_id, PATH_SEPARATOR) {
            Ok(Some(path)) => strip_root_segment(&path).to_string(),
            Ok(None) => String::new(),
            Err(error) => {
                tracing::warn!(catalog = %self.name, directory_id, %error, "directory lookup failed");
                String::new()
            }
        }
    }
}

/// Drops the leading (root) segment of a catalog path.
pub fn strip_root_segment(path: &str) -> &str {
    match path.split_once(PATH_SEPARATOR) {
        Some((_, rest)) => rest,
        None => path,
    }
}
