//! SQLite page store implementation
//!
//! This module provides a SQLite-based implementation of the PageStore trait.
//! Links and images are stored as JSON arrays.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageStore, StorageError, StorageResult};
use crate::storage::PageRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

/// Optional URI prefix accepted in front of the database path
const URI_PREFIX: &str = "sqlite://";

/// SQLite page store, scoped to one namespace
pub struct SqlitePageStore {
    conn: Connection,
    namespace: String,
}

/// A page row before JSON and timestamp decoding
struct StoredRow {
    id: String,
    url: String,
    fetched_at: String,
    title: String,
    raw_markup: String,
    text_content: String,
    links: String,
    images: String,
    language: String,
}

impl StoredRow {
    fn into_record(self) -> StorageResult<PageRecord> {
        Ok(PageRecord {
            id: self.id,
            url: self.url,
            fetched_at: DateTime::parse_from_rfc3339(&self.fetched_at)?.with_timezone(&Utc),
            title: self.title,
            raw_markup: self.raw_markup,
            text_content: self.text_content,
            links: serde_json::from_str(&self.links)?,
            images: serde_json::from_str(&self.images)?,
            language: self.language,
        })
    }
}

impl SqlitePageStore {
    /// Opens (or creates) the page store at the given URI
    ///
    /// The URI is a filesystem path, optionally prefixed with `sqlite://`.
    /// `:memory:` opens a private in-memory database.
    ///
    /// # Returns
    ///
    /// * `Ok(SqlitePageStore)` - Store opened and answered a ping
    /// * `Err(StorageError::Connection)` - Store could not be opened or initialized
    pub fn open(uri: &str, namespace: &str) -> StorageResult<Self> {
        let path = uri.strip_prefix(URI_PREFIX).unwrap_or(uri);

        let conn = Connection::open(path)
            .map_err(|e| StorageError::Connection(format!("{}: {}", path, e)))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(|e| StorageError::Connection(format!("{}: {}", path, e)))?;

        Self::from_connection(conn, namespace)
    }

    /// Creates an in-memory store (for tests and dry runs)
    pub fn open_in_memory(namespace: &str) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Self::from_connection(conn, namespace)
    }

    fn from_connection(conn: Connection, namespace: &str) -> StorageResult<Self> {
        initialize_schema(&conn).map_err(|e| StorageError::Connection(e.to_string()))?;

        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| StorageError::Connection(format!("ping failed: {}", e)))?;

        Ok(Self {
            conn,
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl PageStore for SqlitePageStore {
    fn find_all_urls(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM pages WHERE namespace = ?1 ORDER BY row_id")?;

        let urls = stmt
            .query_map(params![self.namespace], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(urls)
    }

    fn insert(&mut self, page: &PageRecord) -> StorageResult<Option<String>> {
        let links = serde_json::to_string(&page.links)?;
        let images = serde_json::to_string(&page.images)?;
        let fetched_at = page.fetched_at.to_rfc3339_opts(SecondsFormat::Micros, true);

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO pages
             (id, namespace, url, fetched_at, title, raw_markup, text_content, links, images, language)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                page.id,
                self.namespace,
                page.url,
                fetched_at,
                page.title,
                page.raw_markup,
                page.text_content,
                links,
                images,
                page.language,
            ],
        )?;

        // A duplicate id is ignored by SQLite and reported as "no id assigned"
        if inserted == 1 {
            Ok(Some(page.id.clone()))
        } else {
            Ok(None)
        }
    }

    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, fetched_at, title, raw_markup, text_content, links, images, language
             FROM pages WHERE namespace = ?1 AND url = ?2
             ORDER BY row_id DESC LIMIT 1",
        )?;

        let row = stmt
            .query_row(params![self.namespace, url], |row| {
                Ok(StoredRow {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    fetched_at: row.get(2)?,
                    title: row.get(3)?,
                    raw_markup: row.get(4)?,
                    text_content: row.get(5)?,
                    links: row.get(6)?,
                    images: row.get(7)?,
                    language: row.get(8)?,
                })
            })
            .optional()?;

        row.map(StoredRow::into_record).transpose()
    }

    fn count_pages(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE namespace = ?1",
            params![self.namespace],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_by_language(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT language, COUNT(*) AS pages FROM pages WHERE namespace = ?1
             GROUP BY language ORDER BY pages DESC, language ASC",
        )?;

        let counts = stmt
            .query_map(params![self.namespace], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
