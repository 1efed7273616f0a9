use std::path::Path;

use async_trait::async_trait;
use tokio_rusqlite::Connection;

use crate::store::{DeviceStore, StoreError};
use crate::types::{DeviceId, DeviceRecord, DoorState, ReachabilityUpdate};

/// Async SQLite-backed device store.
pub struct SqliteDeviceStore {
    conn: Connection,
}

impl SqliteDeviceStore {
    /// Open (or create) a database at the given file path.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref()).await?;
        let db = Self { conn };
        db.init_schema().await?;
        Ok(db)
    }

    /// Create a purely in-memory database (useful for tests).
    pub async fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        let db = Self { conn };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "
                    PRAGMA journal_mode=WAL;
                    PRAGMA synchronous=NORMAL;
                    PRAGMA busy_timeout=5000;

                    CREATE TABLE IF NOT EXISTS devices (
                        id                TEXT PRIMARY KEY,
                        door_state        INTEGER,
                        remote_ip_address TEXT,
                        last_ip_update    INTEGER
                    );
                    ",
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, Option<i64>, Option<String>, Option<i64>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_record(
    (id, door_state, remote_ip_address, last_ip_update): (String, Option<i64>, Option<String>, Option<i64>),
) -> Result<DeviceRecord, StoreError> {
    let id = DeviceId::parse(&id).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let door_state = door_state
        .map(|code| {
            u8::try_from(code)
                .map_err(|_| StoreError::Corrupt(format!("door_state {code} for {id}")))
                .and_then(|c| DoorState::new(c).map_err(|e| StoreError::Corrupt(e.to_string())))
        })
        .transpose()?;
    Ok(DeviceRecord {
        id,
        door_state,
        remote_ip_address,
        last_ip_update,
    })
}

#[async_trait]
impl DeviceStore for SqliteDeviceStore {
    async fn get_device(&self, id: &DeviceId) -> Result<Option<DeviceRecord>, StoreError> {
        let id = id.to_string();
        let row = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, door_state, remote_ip_address, last_ip_update
                     FROM devices WHERE id = ?1",
                )?;
                let mut rows = stmt.query(rusqlite::params![id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row_to_record(row)?)),
                    None => Ok(None),
                }
            })
            .await?;
        row.map(into_record).transpose()
    }

    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, StoreError> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, door_state, remote_ip_address, last_ip_update
                     FROM devices ORDER BY id",
                )?;
                let mut rows = stmt.query([])?;
                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    out.push(row_to_record(row)?);
                }
                Ok(out)
            })
            .await?;
        rows.into_iter().map(into_record).collect()
    }

    async fn set_door_state(&self, id: &DeviceId, state: DoorState) -> Result<(), StoreError> {
        let id = id.to_string();
        let code = i64::from(state.code());
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO devices (id, door_state) VALUES (?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET door_state = excluded.door_state",
                    rusqlite::params![id, code],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn update_reachability(
        &self,
        id: &DeviceId,
        update: &ReachabilityUpdate,
    ) -> Result<(), StoreError> {
        let id = id.to_string();
        let address = update.remote_ip_address.clone();
        let stamp = update.last_ip_update;
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO devices (id, remote_ip_address, last_ip_update) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET
                        remote_ip_address = excluded.remote_ip_address,
                        last_ip_update = excluded.last_ip_update",
                    rusqlite::params![id, address, stamp],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}
