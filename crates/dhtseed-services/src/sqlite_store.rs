//! SQLite-backed record store.
//!
//! One table keyed on the identifier. Registration is a single
//! `INSERT .. ON CONFLICT DO UPDATE .. RETURNING` statement, so concurrent
//! registrations of one identifier are serialised by SQLite itself.

use std::net::IpAddr;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use dhtseed_core::peer::{now_secs, PeerId, PeerRecord};

use crate::store::{PeerMatch, PeerQuery, PeerUpdate, PeerUpsert, RecordStore, StoreError, StoreStats};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS peers (
    identifier       TEXT    PRIMARY KEY NOT NULL,
    address          TEXT    NOT NULL,
    port             INTEGER NOT NULL,
    connection_count INTEGER NOT NULL DEFAULT 1,
    user_agent       TEXT    NULL,
    live             INTEGER NOT NULL DEFAULT 0,
    last_seen        INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS peers_live ON peers (live);
";

const COLUMNS: &str = "identifier, address, port, connection_count, user_agent, live, last_seen";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Open(path.to_path_buf(), e))?;
        let store = Self::init(conn)?;
        tracing::info!(path = %path.display(), "sqlite store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Column values as SQLite hands them back, before typing.
struct RawRow {
    identifier: String,
    address: String,
    port: i64,
    connection_count: i64,
    user_agent: Option<String>,
    live: bool,
    last_seen: i64,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            identifier: row.get(0)?,
            address: row.get(1)?,
            port: row.get(2)?,
            connection_count: row.get(3)?,
            user_agent: row.get(4)?,
            live: row.get(5)?,
            last_seen: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<PeerRecord, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            identifier: self.identifier.clone(),
            reason,
        };
        let identifier = PeerId::parse(&self.identifier).map_err(|e| corrupt(e.to_string()))?;
        let address: IpAddr = self
            .address
            .parse()
            .map_err(|_| corrupt(format!("bad address {:?}", self.address)))?;
        let port = u16::try_from(self.port).map_err(|_| corrupt(format!("bad port {}", self.port)))?;
        let connection_count = u32::try_from(self.connection_count)
            .map_err(|_| corrupt(format!("bad connection count {}", self.connection_count)))?;

        Ok(PeerRecord {
            identifier,
            address,
            port,
            connection_count,
            user_agent: self.user_agent,
            live: self.live,
            last_seen: u64::try_from(self.last_seen).unwrap_or(0),
        })
    }
}

impl RecordStore for SqliteStore {
    fn upsert(&self, peer: &PeerUpsert) -> Result<PeerRecord, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "INSERT INTO peers (identifier, address, port, user_agent, last_seen)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (identifier) DO UPDATE SET
                 address          = excluded.address,
                 port             = excluded.port,
                 user_agent       = excluded.user_agent,
                 last_seen        = excluded.last_seen,
                 connection_count = peers.connection_count + 1
             RETURNING {COLUMNS}"
        );
        let raw = conn.query_row(
            &sql,
            params![
                peer.identifier.as_str(),
                peer.address.to_string(),
                peer.port,
                peer.user_agent,
                now_secs() as i64,
            ],
            RawRow::from_row,
        )?;
        raw.into_record()
    }

    fn update_where(&self, filter: &PeerMatch, update: &PeerUpdate) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE peers SET live = COALESCE(?1, live), last_seen = ?2
             WHERE identifier = ?3 AND address = ?4",
            params![
                update.live,
                now_secs() as i64,
                filter.identifier.as_str(),
                filter.address.to_string(),
            ],
        )?;
        Ok(changed)
    }

    fn delete_where(&self, filter: &PeerMatch) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM peers WHERE identifier = ?1 AND address = ?2",
            params![filter.identifier.as_str(), filter.address.to_string()],
        )?;
        Ok(deleted)
    }

    fn query_where(&self, query: &PeerQuery) -> Result<Vec<PeerRecord>, StoreError> {
        let mut sql = format!("SELECT {COLUMNS} FROM peers WHERE 1 = 1");
        let mut args: Vec<Value> = Vec::new();
        if let Some(live) = query.live {
            sql.push_str(" AND live = ?");
            args.push(Value::Integer(i64::from(live)));
        }
        if let Some(exclude) = &query.exclude {
            sql.push_str(" AND identifier <> ?");
            args.push(Value::Text(exclude.as_str().to_owned()));
        }
        if query.random {
            sql.push_str(" ORDER BY RANDOM()");
        }
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            args.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params_from_iter(args.iter()), RawRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawRow::into_record).collect()
    }

    fn get(&self, identifier: &PeerId) -> Result<Option<PeerRecord>, StoreError> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM peers WHERE identifier = ?1"),
                params![identifier.as_str()],
                RawRow::from_row,
            )
            .optional()?;
        raw.map(RawRow::into_record).transpose()
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.lock()?;
        let (peers, live_peers): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(live), 0) FROM peers",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(StoreStats {
            peers: usize::try_from(peers).unwrap_or(0),
            live_peers: usize::try_from(live_peers).unwrap_or(0),
        })
    }
}
