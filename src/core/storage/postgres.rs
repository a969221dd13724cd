use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{SettingsRepository, Store, StoreError};
use crate::core::shared::schema::settings;
use crate::core::shared::utils::DbPool;

pub type PgConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Postgres backend. Each entity module implements `Repository` for it in
/// its own `storage.rs`.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn conn(&self) -> Result<PgConn, StoreError> {
        Ok(self.pool.get()?)
    }

    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut PgConnection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut pooled = self.conn()?;
        f(&mut pooled)
    }

    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&mut PgConnection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.with_conn(|conn| conn.transaction(f))
    }
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.pool.state();
        f.debug_struct("PgStore")
            .field("connections", &state.connections)
            .field("idle", &state.idle_connections)
            .finish()
    }
}

/// Turns a unique-constraint violation into a `Conflict` carrying `message`.
pub fn unique_violation(err: DieselError, message: &str) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::Conflict(message.to_string())
        }
        other => StoreError::Query(other),
    }
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = settings)]
struct SettingRow {
    key: String,
    value: Value,
    updated_at: chrono::DateTime<Utc>,
}

fn load_all(conn: &mut PgConnection) -> Result<BTreeMap<String, Value>, DieselError> {
    let rows: Vec<SettingRow> = settings::table.order(settings::key.asc()).load(conn)?;
    Ok(rows.into_iter().map(|row| (row.key, row.value)).collect())
}

impl SettingsRepository for PgStore {
    fn load_settings(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        self.with_conn(|conn| Ok(load_all(conn)?))
    }

    fn merge_settings(
        &self,
        changes: Map<String, Value>,
    ) -> Result<BTreeMap<String, Value>, StoreError> {
        let now = Utc::now();

        self.transaction(|conn| {
            for (key, value) in changes {
                if value.is_null() {
                    diesel::delete(settings::table.find(&key)).execute(conn)?;
                    continue;
                }
                let row = SettingRow {
                    key,
                    value,
                    updated_at: now,
                };
                diesel::insert_into(settings::table)
                    .values(&row)
                    .on_conflict(settings::key)
                    .do_update()
                    .set((settings::value.eq(&row.value), settings::updated_at.eq(now)))
                    .execute(conn)?;
            }
            Ok(load_all(conn)?)
        })
    }
}

impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            diesel::sql_query("SELECT 1").execute(conn)?;
            Ok(())
        })
    }
}
