//! Keyed graph store using redb
//!
//! One database file per store directory. Each repository key (`owner/name`)
//! maps to the JSON form of its latest [`RecordSet`]. A second table holds the
//! write time per key, so listings never decode graphs. Writes replace the
//! previous graph wholesale inside one write transaction; readers only ever
//! see committed graphs.

use crate::error::{ProvError, ProvResult};
use crate::models::RepoRef;
use crate::prov::RecordSet;
use crate::rdf::{self, ContentType};
use chrono::{DateTime, Utc};
use redb::TableDefinition;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Database file inside the store directory
pub const DB_FILE: &str = "graphs.redb";

// redb table definitions
const GRAPHS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("graphs");
/// key -> write time, milliseconds since the epoch
const STORED_AT_TABLE: TableDefinition<&str, i64> = TableDefinition::new("stored_at");

/// Persistent provenance graphs keyed by repository
pub struct GraphStore {
    db: redb::Database,
    dir: PathBuf,
}

impl GraphStore {
    /// Create or open the store in `dir`
    pub fn open(dir: &Path) -> ProvResult<Self> {
        std::fs::create_dir_all(dir)?;

        // redb uses a single file, not a directory
        let db = redb::Database::create(dir.join(DB_FILE))?;
        debug!("Opened graph store at {}", dir.display());

        Ok(Self {
            db,
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `records` under `key`, replacing any earlier graph.
    ///
    /// `key` must be the repository the graph was built for.
    /// A second writer blocks until the first one commits.
    pub fn store(&self, key: &str, records: &RecordSet) -> ProvResult<()> {
        if RepoRef::parse(key)?.key() != records.repository {
            return Err(ProvError::InvalidRepoRef(format!(
                "{} (graph is for {})",
                key, records.repository
            )));
        }
        let value = serde_json::to_vec(records)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut graphs = write_txn.open_table(GRAPHS_TABLE)?;
            graphs.insert(key, value.as_slice())?;
            let mut stamps = write_txn.open_table(STORED_AT_TABLE)?;
            stamps.insert(key, Utc::now().timestamp_millis())?;
        }
        write_txn.commit()?;

        info!(
            "Stored graph for {} ({} statements, {} bytes)",
            key,
            records.statement_count(),
            value.len()
        );
        Ok(())
    }

    fn read(&self, key: &str) -> ProvResult<Option<RecordSet>> {
        let read_txn = self.db.begin_read()?;

        // nothing stored yet
        let table = match read_txn.open_table(GRAPHS_TABLE) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// The stored record set for `key`
    pub fn load(&self, key: &str) -> ProvResult<RecordSet> {
        self.read(key)?
            .ok_or_else(|| ProvError::NotFound(key.to_string()))
    }

    /// The stored graph for `key`, serialized as `content_type`
    pub fn retrieve(&self, key: &str, content_type: ContentType) -> ProvResult<Vec<u8>> {
        if !content_type.is_producible() {
            return Err(ProvError::UnsupportedFormat(content_type.mime().to_string()));
        }
        let records = self.load(key)?;
        rdf::serialize(&records, content_type)
    }

    /// Like [`GraphStore::retrieve`] with the content type given as a MIME string
    pub fn retrieve_mime(&self, key: &str, mime: &str) -> ProvResult<Vec<u8>> {
        self.retrieve(key, ContentType::from_mime(mime)?)
    }

    /// When the graph for `key` was written, if it exists
    pub fn stored_at(&self, key: &str) -> ProvResult<Option<DateTime<Utc>>> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(STORED_AT_TABLE) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(table
            .get(key)?
            .and_then(|millis| DateTime::<Utc>::from_timestamp_millis(millis.value())))
    }

    /// Stored repositories. Keys that are not `owner/name` are skipped.
    pub fn list_keys(&self) -> ProvResult<Vec<RepoRef>> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(GRAPHS_TABLE) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for item in table.range::<&str>(..)? {
            let (key, _) = item?;
            match RepoRef::parse(key.value()) {
                Ok(repo) => keys.push(repo),
                Err(_) => warn!("Skipping malformed graph key '{}'", key.value()),
            }
        }
        Ok(keys)
    }

    /// Delete the graph for `key`; false if there was none
    pub fn remove(&self, key: &str) -> ProvResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut graphs = write_txn.open_table(GRAPHS_TABLE)?;
            let removed = graphs.remove(key)?.is_some();
            let mut stamps = write_txn.open_table(STORED_AT_TABLE)?;
            stamps.remove(key)?;
            removed
        };
        write_txn.commit()?;

        if removed {
            info!("Removed graph for {}", key);
        }
        Ok(removed)
    }
}
