use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::types::{PlanningEntry, PlanningFilter, PlanningInput};
use crate::core::shared::schema::planning_entries;
use crate::core::storage::{PgStore, Record, Repository, StoreError};

impl Repository<PlanningEntry> for PgStore {
    fn list(&self, filter: &PlanningFilter) -> Result<Vec<PlanningEntry>, StoreError> {
        self.with_conn(|conn| {
            let mut query = planning_entries::table.into_boxed();

            if let Some(task_id) = filter.task_id {
                query = query.filter(planning_entries::task_id.eq(task_id));
            }
            if let Some(resource_id) = filter.resource_id {
                query = query.filter(planning_entries::resource_id.eq(resource_id));
            }
            if let Some(user_id) = filter.user_id {
                query = query.filter(planning_entries::user_id.eq(user_id));
            }
            if let Some(status) = &filter.status {
                query = query.filter(planning_entries::status.eq(status));
            }
            if let Some(day) = filter.date {
                query = query.filter(planning_entries::day.eq(day));
            }
            if let Some(week) = filter.week {
                query = query.filter(planning_entries::day.between(week.start, week.end));
            }
            if let Some(from) = filter.from {
                query = query.filter(planning_entries::day.ge(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(planning_entries::day.le(to));
            }

            Ok(query
                .order(planning_entries::created_at.desc())
                .load(conn)?)
        })
    }

    fn get(&self, id: Uuid) -> Result<Option<PlanningEntry>, StoreError> {
        self.with_conn(|conn| {
            Ok(planning_entries::table
                .find(id)
                .first(conn)
                .optional()?)
        })
    }

    fn insert(&self, record: PlanningEntry) -> Result<PlanningEntry, StoreError> {
        self.with_conn(|conn| {
            Ok(diesel::insert_into(planning_entries::table)
                .values(&record)
                .get_result(conn)?)
        })
    }

    fn update(
        &self,
        id: Uuid,
        input: PlanningInput,
        now: DateTime<Utc>,
    ) -> Result<Option<PlanningEntry>, StoreError> {
        self.transaction(|conn| {
            let Some(mut entry) = planning_entries::table
                .find(id)
                .for_update()
                .first::<PlanningEntry>(conn)
                .optional()?
            else {
                return Ok(None);
            };

            entry.apply(input, now)?;

            let saved = diesel::update(planning_entries::table.find(id))
                .set(&entry)
                .get_result(conn)?;
            Ok(Some(saved))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let deleted = diesel::delete(planning_entries::table.find(id)).execute(conn)?;
            Ok(deleted > 0)
        })
    }
}
