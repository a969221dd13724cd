use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::types::{Task, TaskFilter, TaskInput};
use crate::core::shared::schema::tasks;
use crate::core::storage::{PgStore, Record, Repository, StoreError};

impl Repository<Task> for PgStore {
    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        self.with_conn(|conn| {
            let mut query = tasks::table.into_boxed();

            if let Some(status) = &filter.status {
                query = query.filter(tasks::status.eq(status));
            }
            if let Some(priority) = &filter.priority {
                query = query.filter(tasks::priority.eq(priority));
            }
            if let Some(worksite_id) = filter.worksite_id {
                query = query.filter(tasks::worksite_id.eq(worksite_id));
            }
            if let Some(assignee_id) = filter.assignee_id {
                query = query.filter(tasks::assignee_id.eq(assignee_id));
            }
            if let Some(week) = filter.week {
                // Undated tasks never match; a missing end date means a one-day task.
                query = query.filter(tasks::start_date.le(week.end)).filter(
                    tasks::end_date
                        .ge(week.start)
                        .or(tasks::end_date
                            .is_null()
                            .and(tasks::start_date.ge(week.start))),
                );
            }

            Ok(query.order(tasks::created_at.desc()).load(conn)?)
        })
    }

    fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        self.with_conn(|conn| Ok(tasks::table.find(id).first(conn).optional()?))
    }

    fn insert(&self, record: Task) -> Result<Task, StoreError> {
        self.with_conn(|conn| {
            Ok(diesel::insert_into(tasks::table)
                .values(&record)
                .get_result(conn)?)
        })
    }

    fn update(
        &self,
        id: Uuid,
        input: TaskInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError> {
        self.transaction(|conn| {
            let Some(mut task) = tasks::table
                .find(id)
                .for_update()
                .first::<Task>(conn)
                .optional()?
            else {
                return Ok(None);
            };

            task.apply(input, now)?;

            let saved = diesel::update(tasks::table.find(id))
                .set(&task)
                .get_result(conn)?;
            Ok(Some(saved))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let deleted = diesel::delete(tasks::table.find(id)).execute(conn)?;
            Ok(deleted > 0)
        })
    }
}
