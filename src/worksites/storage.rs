use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::types::{Worksite, WorksiteFilter, WorksiteInput};
use crate::core::shared::schema::worksites;
use crate::core::storage::{PgStore, Record, Repository, StoreError};

impl Repository<Worksite> for PgStore {
    fn list(&self, filter: &WorksiteFilter) -> Result<Vec<Worksite>, StoreError> {
        self.with_conn(|conn| {
            let mut query = worksites::table.into_boxed();

            if let Some(status) = &filter.status {
                query = query.filter(worksites::status.eq(status));
            }
            if let Some(client_id) = &filter.client_id {
                query = query.filter(worksites::client_id.eq(client_id));
            }

            Ok(query.order(worksites::created_at.desc()).load(conn)?)
        })
    }

    fn get(&self, id: Uuid) -> Result<Option<Worksite>, StoreError> {
        self.with_conn(|conn| Ok(worksites::table.find(id).first(conn).optional()?))
    }

    fn insert(&self, record: Worksite) -> Result<Worksite, StoreError> {
        self.with_conn(|conn| {
            Ok(diesel::insert_into(worksites::table)
                .values(&record)
                .get_result(conn)?)
        })
    }

    fn update(
        &self,
        id: Uuid,
        input: WorksiteInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Worksite>, StoreError> {
        self.transaction(|conn| {
            let Some(mut worksite) = worksites::table
                .find(id)
                .for_update()
                .first::<Worksite>(conn)
                .optional()?
            else {
                return Ok(None);
            };

            worksite.apply(input, now)?;

            let saved = diesel::update(worksites::table.find(id))
                .set(&worksite)
                .get_result(conn)?;
            Ok(Some(saved))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let deleted = diesel::delete(worksites::table.find(id)).execute(conn)?;
            Ok(deleted > 0)
        })
    }
}
