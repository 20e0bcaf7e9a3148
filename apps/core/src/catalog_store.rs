use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OpenFlags};
use thiserror::Error;

use crate::catalog::CatalogSource;
use crate::model::{CatalogEntry, DirectoryId};

pub const PATH_SEPARATOR: &str = "/";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_PATH_DEPTH: u32 = 512;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("catalog file does not exist: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("not a file catalog (FILES/PATHS tables missing): {}", .0.display())]
    NotACatalog(PathBuf),
}

/// One live, read-only connection to a catalog.
pub trait CatalogBackend {
    fn select_entries(&self, statement: &str) -> Result<Vec<CatalogEntry>, BackendError>;
    fn full_path(
        &self,
        directory_id: DirectoryId,
        separator: &str,
    ) -> Result<Option<String>, BackendError>;
}

pub trait CatalogConnector {
    fn connect(&self, source: &CatalogSource) -> Result<Box<dyn CatalogBackend>, BackendError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteConnector;

impl CatalogConnector for SqliteConnector {
    fn connect(&self, source: &CatalogSource) -> Result<Box<dyn CatalogBackend>, BackendError> {
        if source.username.is_some() || source.password.is_some() {
            tracing::debug!(
                catalog = %source.filepath.display(),
                "sqlite catalogs have no authentication; credentials ignored"
            );
        }
        let conn = open_read_only(&source.filepath)?;
        Ok(Box::new(SqliteCatalog { conn }))
    }
}

pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        Ok(Self {
            conn: open_read_only(path)?,
        })
    }
}

impl CatalogBackend for SqliteCatalog {
    fn select_entries(&self, statement: &str) -> Result<Vec<CatalogEntry>, BackendError> {
        let mut stmt = self.conn.prepare(statement)?;
        let rows = stmt.query_map([], |row| {
            let size: i64 = row.get(1)?;
            Ok(CatalogEntry {
                file_name: row.get(0)?,
                file_size: u64::try_from(size).unwrap_or(0),
                parent_directory_id: row.get(2)?,
            })
        })?;
        let entries = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn full_path(
        &self,
        directory_id: DirectoryId,
        separator: &str,
    ) -> Result<Option<String>, BackendError> {
        let path = self.conn.query_row(
            "WITH RECURSIVE chain(id, father, name, depth) AS (
                 SELECT PATH_ID, FATHER_ID, PATH_NAME, 0 FROM PATHS WHERE PATH_ID = ?1
                 UNION ALL
                 SELECT p.PATH_ID, p.FATHER_ID, p.PATH_NAME, chain.depth + 1
                 FROM PATHS p JOIN chain ON p.PATH_ID = chain.father
                 WHERE chain.depth < ?3
             )
             SELECT group_concat(name, ?2) FROM (SELECT name FROM chain ORDER BY depth DESC)",
            params![directory_id, separator, MAX_PATH_DEPTH],
            |row| row.get::<_, Option<String>>(0),
        )?;
        Ok(path)
    }
}

pub fn open_read_only(path: &Path) -> Result<Connection, BackendError> {
    if !path.is_file() {
        return Err(BackendError::MissingFile(path.to_path_buf()));
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    register_unicode_upper(&conn)?;

    let tables: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master
         WHERE type = 'table' AND UPPER(name) IN ('FILES', 'PATHS')",
        [],
        |row| row.get(0),
    )?;
    if tables < 2 {
        return Err(BackendError::NotACatalog(path.to_path_buf()));
    }
    Ok(conn)
}

/// Replaces the built-in ASCII-only `UPPER` so accented and non-Latin names
/// fold case too.
fn register_unicode_upper(conn: &Connection) -> Result<(), BackendError> {
    conn.create_scalar_function(
        "UPPER",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|text| text.to_uppercase()))
        },
    )?;
    Ok(())
}

/// Builds the case-insensitive substring select for `token`.
///
/// Single quotes are doubled. A `max_results` of zero means no row limit.
pub fn make_select(token: &str, max_results: u32) -> String {
    let escaped = token.replace('\'', "''");
    let limit = if max_results > 0 {
        format!(" LIMIT {max_results}")
    } else {
        String::new()
    };
    format!(
        "SELECT FILE_NAME, FILE_SIZE, PATH_ID FROM FILES \
         WHERE UPPER(FILE_NAME) LIKE '%' || UPPER('{escaped}') || '%'{limit}"
    )
}
