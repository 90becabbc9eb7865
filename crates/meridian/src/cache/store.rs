//! Persistence for the content cache.
//!
//! The indexer treats the store as an opaque key-value collection: it loads
//! everything at startup and saves everything at shutdown. A missing store is
//! an empty cache; a corrupt row is skipped and counted, never fatal.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection};
use tracing::{debug, info, warn};

use super::CacheKey;
use crate::error::{Error, Result};
use crate::types::{ContentHash, FileFacts, Language};

/// Entries read back from a store.
#[derive(Debug, Default)]
pub struct LoadedEntries {
    /// Valid entries, least recently used first
    pub entries: Vec<(CacheKey, FileFacts)>,
    /// Rows that could not be decoded and were skipped
    pub corrupt: usize,
}

/// Load-at-startup / save-at-shutdown contract for the content cache.
pub trait CacheStore: Send + Sync {
    /// Read every stored entry.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store as a whole is unreadable. Bad
    /// individual entries are reported through [`LoadedEntries::corrupt`].
    fn load(&self) -> Result<LoadedEntries>;

    /// Replace the stored contents with `entries`, returning how many were written.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn save(&self, entries: &[(CacheKey, Arc<FileFacts>)]) -> Result<usize>;

    /// Where the store lives, for diagnostics.
    fn location(&self) -> Option<&Path> {
        None
    }
}

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS facts (
    seq INTEGER NOT NULL,
    language TEXT NOT NULL,
    analyzer_version INTEGER NOT NULL,
    content_hash TEXT NOT NULL,
    facts TEXT NOT NULL,
    PRIMARY KEY (language, analyzer_version, content_hash)
);
";

/// `SQLite`-backed cache store.
///
/// Facts are stored as JSON, one row per cache key. The connection is
/// wrapped in a `Mutex` so the store can be shared with the indexer.
pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCacheStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteCacheStore {
    /// Open or create the cache database.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or is not a usable
    /// `SQLite` database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;

        debug!(path = %path.display(), "Opened cache store");
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    /// Open the cache database, deleting and recreating it if it is unusable.
    ///
    /// # Errors
    ///
    /// Returns an error if even a fresh database cannot be created.
    pub fn open_or_recreate(path: &Path) -> Result<Self> {
        match Self::open(path) {
            Ok(store) => Ok(store),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Cache store unusable, recreating"
                );
                for suffix in ["", "-wal", "-shm"] {
                    let mut file = path.as_os_str().to_owned();
                    file.push(suffix);
                    match std::fs::remove_file(PathBuf::from(file)) {
                        Ok(()) => {}
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                Self::open(path)
            }
        }
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            Error::Internal(format!(
                "cache store mutex poisoned (a thread panicked while holding the lock): {e}"
            ))
        })
    }
}

/// A stored row before validation.
struct RawRow {
    language: String,
    analyzer_version: i64,
    content_hash: String,
    facts: String,
}

impl RawRow {
    fn decode(self) -> Option<(CacheKey, FileFacts)> {
        let language = Language::parse(&self.language)?;
        let analyzer_version = u32::try_from(self.analyzer_version).ok()?;
        let content_hash = u64::from_str_radix(&self.content_hash, 16).ok()?;
        let facts = serde_json::from_str(&self.facts).ok()?;
        Some((
            CacheKey::new(language, analyzer_version, ContentHash(content_hash)),
            facts,
        ))
    }
}

impl CacheStore for SqliteCacheStore {
    fn load(&self) -> Result<LoadedEntries> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT language, analyzer_version, content_hash, facts FROM facts ORDER BY seq",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RawRow {
                language: row.get(0)?,
                analyzer_version: row.get(1)?,
                content_hash: row.get(2)?,
                facts: row.get(3)?,
            })
        })?;

        let mut loaded = LoadedEntries::default();
        for row in rows {
            match row.ok().and_then(RawRow::decode) {
                Some(entry) => loaded.entries.push(entry),
                None => loaded.corrupt += 1,
            }
        }

        if loaded.corrupt > 0 {
            warn!(
                path = %self.path.display(),
                corrupt = loaded.corrupt,
                "Skipped corrupt cache entries"
            );
        }
        info!(
            path = %self.path.display(),
            entries = loaded.entries.len(),
            "Loaded cache store"
        );
        Ok(loaded)
    }

    fn save(&self, entries: &[(CacheKey, Arc<FileFacts>)]) -> Result<usize> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM facts", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO facts (seq, language, analyzer_version, content_hash, facts)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (seq, (key, facts)) in entries.iter().enumerate() {
                let json = serde_json::to_string(facts.as_ref())?;
                stmt.execute(params![
                    i64::try_from(seq).unwrap_or(i64::MAX),
                    key.language.as_str(),
                    i64::from(key.analyzer_version),
                    key.content_hash.to_string(),
                    json,
                ])?;
            }
        }
        tx.commit()?;

        info!(
            path = %self.path.display(),
            entries = entries.len(),
            "Saved cache store"
        );
        Ok(entries.len())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
