use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::shared::dates::WeekRange;
use crate::core::shared::schema::tasks;
use crate::core::shared::validation::{date_order, non_blank, one_of, percentage, required_text};
use crate::core::storage::{Record, ValidationError};

pub const TASK_STATUSES: &[&str] = &["a_faire", "en_cours", "bloque", "termine"];
pub const TASK_PRIORITIES: &[&str] = &["basse", "moyenne", "haute", "urgente"];
pub const DEFAULT_TASK_STATUS: &str = "a_faire";
pub const DEFAULT_TASK_PRIORITY: &str = "moyenne";
pub const DONE_STATUS: &str = "termine";
pub const IN_PROGRESS_STATUS: &str = "en_cours";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct Task {
    pub id: Uuid,
    #[serde(rename = "titre")]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "chantier_id")]
    pub worksite_id: Option<Uuid>,
    #[serde(rename = "assigne_id")]
    pub assignee_id: Option<Uuid>,
    #[serde(rename = "date_debut")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "date_fin")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "priorite")]
    pub priority: String,
    #[serde(rename = "statut")]
    pub status: String,
    #[serde(rename = "progression")]
    pub progress: i32,
    #[serde(rename = "dependances")]
    pub dependencies: Vec<Uuid>,
    #[serde(rename = "ressource_ids")]
    pub resource_ids: Vec<Uuid>,
    #[serde(rename = "date_achevement")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "date_creation")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "date_modification")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskInput {
    #[serde(rename = "titre", alias = "title")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "chantier_id", alias = "worksite_id", alias = "chantierId")]
    pub worksite_id: Option<Uuid>,
    #[serde(rename = "assigne_id", alias = "assignee_id", alias = "assigneId")]
    pub assignee_id: Option<Uuid>,
    #[serde(rename = "date_debut", alias = "start_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "date_fin", alias = "end_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "priorite", alias = "priority")]
    pub priority: Option<String>,
    #[serde(rename = "statut", alias = "status")]
    pub status: Option<String>,
    #[serde(rename = "progression", alias = "progress")]
    pub progress: Option<i32>,
    #[serde(rename = "dependances", alias = "dependencies")]
    pub dependencies: Option<Vec<Uuid>>,
    #[serde(rename = "ressource_ids", alias = "resource_ids")]
    pub resource_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    #[serde(rename = "statut", alias = "status")]
    pub status: Option<String>,
    #[serde(rename = "priorite", alias = "priority")]
    pub priority: Option<String>,
    #[serde(rename = "chantierId", alias = "chantier_id")]
    pub worksite_id: Option<Uuid>,
    #[serde(rename = "assigneId", alias = "assigne_id")]
    pub assignee_id: Option<Uuid>,
    #[serde(rename = "semaine", alias = "week")]
    pub week: Option<WeekRange>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.status == DONE_STATUS
    }

    /// Inclusive day span; a task with only a start date spans that day.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.start_date?;
        Some((start, self.end_date.unwrap_or(start)))
    }

    pub fn is_late(&self, today: NaiveDate) -> bool {
        !self.is_done() && self.span().is_some_and(|(_, end)| end < today)
    }

    /// Done tasks are at 100% with a completion date. Reopening only clears
    /// the date; progress keeps whatever value it has.
    fn sync_completion(&mut self, now: DateTime<Utc>) {
        if self.is_done() {
            self.progress = 100;
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        one_of(&self.status, TASK_STATUSES, "statut")?;
        one_of(&self.priority, TASK_PRIORITIES, "priorite")?;
        percentage(self.progress, "progression")?;
        date_order(self.start_date, self.end_date)?;
        if self.dependencies.contains(&self.id) {
            return Err(ValidationError::new(
                "Une tâche ne peut pas dépendre d'elle-même",
            ));
        }
        Ok(())
    }
}

impl Record for Task {
    type Input = TaskInput;
    type Filter = TaskFilter;

    const LABEL: &'static str = "Tâche";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn create(id: Uuid, input: TaskInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let mut task = Self {
            id,
            title: required_text(input.title, "titre")?,
            description: input.description,
            worksite_id: input.worksite_id,
            assignee_id: input.assignee_id,
            start_date: input.start_date,
            end_date: input.end_date,
            priority: input
                .priority
                .unwrap_or_else(|| DEFAULT_TASK_PRIORITY.to_string()),
            status: input
                .status
                .unwrap_or_else(|| DEFAULT_TASK_STATUS.to_string()),
            progress: input.progress.unwrap_or(0),
            dependencies: input.dependencies.unwrap_or_default(),
            resource_ids: input.resource_ids.unwrap_or_default(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        task.validate()?;
        task.sync_completion(now);
        Ok(task)
    }

    fn apply(&mut self, input: TaskInput, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(title) = input.title {
            self.title = non_blank(title, "titre")?;
        }
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        if let Some(worksite_id) = input.worksite_id {
            self.worksite_id = Some(worksite_id);
        }
        if let Some(assignee_id) = input.assignee_id {
            self.assignee_id = Some(assignee_id);
        }
        if let Some(start_date) = input.start_date {
            self.start_date = Some(start_date);
        }
        if let Some(end_date) = input.end_date {
            self.end_date = Some(end_date);
        }
        if let Some(priority) = input.priority {
            self.priority = priority;
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(progress) = input.progress {
            self.progress = progress;
        }
        if let Some(dependencies) = input.dependencies {
            self.dependencies = dependencies;
        }
        if let Some(resource_ids) = input.resource_ids {
            self.resource_ids = resource_ids;
        }
        self.validate()?;
        self.sync_completion(now);
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &TaskFilter) -> bool {
        filter.status.as_ref().map_or(true, |s| &self.status == s)
            && filter.priority.as_ref().map_or(true, |p| &self.priority == p)
            && filter.worksite_id.map_or(true, |w| self.worksite_id == Some(w))
            && filter.assignee_id.map_or(true, |a| self.assignee_id == Some(a))
            && filter.week.map_or(true, |week| {
                self.span()
                    .is_some_and(|(start, end)| week.overlaps(start, end))
            })
    }
}
