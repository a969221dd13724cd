//! Sub-tasks (sous-tâches): checklist items under a task.

use axum::Router;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::crud::crud_routes;
use crate::core::shared::schema::sub_tasks;
use crate::core::shared::state::AppState;
use crate::core::shared::validation::{non_blank, required, required_text};
use crate::core::storage::{PgStore, Record, Repository, StoreError, ValidationError};
use crate::core::urls::ApiUrls;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = sub_tasks)]
pub struct SubTask {
    pub id: Uuid,
    #[serde(rename = "tache_id")]
    pub task_id: Uuid,
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(rename = "termine")]
    pub completed: bool,
    #[serde(rename = "date_creation")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "date_modification")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubTaskInput {
    #[serde(rename = "tache_id", alias = "task_id", alias = "tacheId")]
    pub task_id: Option<Uuid>,
    #[serde(rename = "titre", alias = "title")]
    pub title: Option<String>,
    #[serde(rename = "termine", alias = "completed")]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubTaskFilter {
    #[serde(rename = "tacheId", alias = "tache_id")]
    pub task_id: Option<Uuid>,
    #[serde(rename = "termine", alias = "completed")]
    pub completed: Option<bool>,
}

impl Record for SubTask {
    type Input = SubTaskInput;
    type Filter = SubTaskFilter;

    const LABEL: &'static str = "Sous-tâche";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn create(id: Uuid, input: SubTaskInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            task_id: required(input.task_id, "tache_id")?,
            title: required_text(input.title, "titre")?,
            completed: input.completed.unwrap_or(false),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, input: SubTaskInput, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(task_id) = input.task_id {
            self.task_id = task_id;
        }
        if let Some(title) = input.title {
            self.title = non_blank(title, "titre")?;
        }
        if let Some(completed) = input.completed {
            self.completed = completed;
        }
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &SubTaskFilter) -> bool {
        filter.task_id.map_or(true, |t| self.task_id == t)
            && filter.completed.map_or(true, |c| self.completed == c)
    }
}

impl Repository<SubTask> for PgStore {
    fn list(&self, filter: &SubTaskFilter) -> Result<Vec<SubTask>, StoreError> {
        self.with_conn(|conn| {
            let mut query = sub_tasks::table.into_boxed();
            if let Some(task_id) = filter.task_id {
                query = query.filter(sub_tasks::task_id.eq(task_id));
            }
            if let Some(completed) = filter.completed {
                query = query.filter(sub_tasks::completed.eq(completed));
            }
            Ok(query.order(sub_tasks::created_at.desc()).load(conn)?)
        })
    }

    fn get(&self, id: Uuid) -> Result<Option<SubTask>, StoreError> {
        self.with_conn(|conn| Ok(sub_tasks::table.find(id).first(conn).optional()?))
    }

    fn insert(&self, record: SubTask) -> Result<SubTask, StoreError> {
        self.with_conn(|conn| {
            Ok(diesel::insert_into(sub_tasks::table)
                .values(&record)
                .get_result(conn)?)
        })
    }

    fn update(
        &self,
        id: Uuid,
        input: SubTaskInput,
        now: DateTime<Utc>,
    ) -> Result<Option<SubTask>, StoreError> {
        self.transaction(|conn| {
            let Some(mut sub_task) = sub_tasks::table
                .find(id)
                .for_update()
                .first::<SubTask>(conn)
                .optional()?
            else {
                return Ok(None);
            };
            sub_task.apply(input, now)?;
            let saved = diesel::update(sub_tasks::table.find(id))
                .set(&sub_task)
                .get_result(conn)?;
            Ok(Some(saved))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            Ok(diesel::delete(sub_tasks::table.find(id)).execute(conn)? > 0)
        })
    }
}

pub fn configure_subtask_routes() -> Router<Arc<AppState>> {
    crud_routes::<SubTask>(ApiUrls::SUBTASKS, ApiUrls::SUBTASK_BY_ID)
}
