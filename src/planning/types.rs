use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::shared::dates::{hour_format, hours_between, WeekRange};
use crate::core::shared::schema::planning_entries;
use crate::core::shared::validation::{hour_order, one_of, required};
use crate::core::storage::{Record, ValidationError};

pub const PLANNING_STATUSES: &[&str] = &["planifie", "confirme", "en_cours", "termine", "annule"];
pub const RECURRENCES: &[&str] = &["aucune", "quotidienne", "hebdomadaire", "mensuelle"];
pub const DEFAULT_PLANNING_STATUS: &str = "planifie";
pub const CANCELLED_STATUS: &str = "annule";
pub const NO_RECURRENCE: &str = "aucune";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = planning_entries)]
#[diesel(treat_none_as_null = true)]
pub struct PlanningEntry {
    pub id: Uuid,
    #[serde(rename = "tache_id")]
    pub task_id: Uuid,
    #[serde(rename = "ressource_id")]
    pub resource_id: Option<Uuid>,
    #[serde(rename = "utilisateur_id")]
    pub user_id: Option<Uuid>,
    #[serde(rename = "date")]
    pub day: NaiveDate,
    #[serde(rename = "heure_debut", default, with = "hour_format")]
    pub start_hour: Option<NaiveTime>,
    #[serde(rename = "heure_fin", default, with = "hour_format")]
    pub end_hour: Option<NaiveTime>,
    #[serde(rename = "statut")]
    pub status: String,
    pub recurrence: String,
    /// JSON array of [`HistoryEntry`].
    #[serde(rename = "historique")]
    pub history: Value,
    #[serde(rename = "date_creation")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "date_modification")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanningInput {
    #[serde(rename = "tache_id", alias = "task_id", alias = "tacheId")]
    pub task_id: Option<Uuid>,
    #[serde(rename = "ressource_id", alias = "resource_id", alias = "ressourceId")]
    pub resource_id: Option<Uuid>,
    #[serde(rename = "utilisateur_id", alias = "user_id", alias = "utilisateurId")]
    pub user_id: Option<Uuid>,
    #[serde(rename = "date", alias = "day")]
    pub day: Option<NaiveDate>,
    #[serde(rename = "heure_debut", alias = "start_hour", default, with = "hour_format")]
    pub start_hour: Option<NaiveTime>,
    #[serde(rename = "heure_fin", alias = "end_hour", default, with = "hour_format")]
    pub end_hour: Option<NaiveTime>,
    #[serde(rename = "statut", alias = "status")]
    pub status: Option<String>,
    pub recurrence: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanningFilter {
    #[serde(rename = "tacheId", alias = "tache_id")]
    pub task_id: Option<Uuid>,
    #[serde(rename = "ressourceId", alias = "ressource_id")]
    pub resource_id: Option<Uuid>,
    #[serde(rename = "utilisateurId", alias = "utilisateur_id")]
    pub user_id: Option<Uuid>,
    #[serde(rename = "statut", alias = "status")]
    pub status: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(rename = "semaine", alias = "week")]
    pub week: Option<WeekRange>,
    #[serde(rename = "du", alias = "from")]
    pub from: Option<NaiveDate>,
    #[serde(rename = "au", alias = "to")]
    pub to: Option<NaiveDate>,
}

/// One line of an entry's change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "le")]
    pub at: DateTime<Utc>,
    #[serde(rename = "champ")]
    pub field: String,
    #[serde(rename = "ancien", default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(rename = "nouveau", default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

fn hour_value(hour: Option<NaiveTime>) -> Value {
    hour.map_or(Value::Null, |h| Value::from(h.format("%H:%M").to_string()))
}

impl PlanningEntry {
    pub fn is_cancelled(&self) -> bool {
        self.status == CANCELLED_STATUS
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence != NO_RECURRENCE
    }

    /// Whether the entry, expanded by its recurrence, covers `date`.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        if date < self.day {
            return false;
        }
        match self.recurrence.as_str() {
            "quotidienne" => true,
            "hebdomadaire" => date.weekday() == self.day.weekday(),
            "mensuelle" => date.day() == self.day.day(),
            _ => date == self.day,
        }
    }

    /// Planned hours of one occurrence; `None` when the slot has no hours.
    pub fn slot_hours(&self) -> Option<f64> {
        match (self.start_hour, self.end_hour) {
            (Some(start), Some(end)) => Some(hours_between(start, end)),
            _ => None,
        }
    }

    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        serde_json::from_value(self.history.clone()).unwrap_or_default()
    }

    fn tracked_fields(&self) -> [(&'static str, Value); 8] {
        [
            ("tache_id", json!(self.task_id)),
            ("ressource_id", json!(self.resource_id)),
            ("utilisateur_id", json!(self.user_id)),
            ("date", json!(self.day)),
            ("heure_debut", hour_value(self.start_hour)),
            ("heure_fin", hour_value(self.end_hour)),
            ("statut", json!(self.status)),
            ("recurrence", json!(self.recurrence)),
        ]
    }

    fn record_history(&mut self, entries: impl IntoIterator<Item = HistoryEntry>) {
        let mut log = match self.history.take() {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        log.extend(
            entries
                .into_iter()
                .filter_map(|entry| serde_json::to_value(entry).ok()),
        );
        self.history = Value::Array(log);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        one_of(&self.status, PLANNING_STATUSES, "statut")?;
        one_of(&self.recurrence, RECURRENCES, "recurrence")?;
        hour_order(self.start_hour, self.end_hour)
    }
}

impl Record for PlanningEntry {
    type Input = PlanningInput;
    type Filter = PlanningFilter;

    const LABEL: &'static str = "Entrée de planning";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn create(id: Uuid, input: PlanningInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let mut entry = Self {
            id,
            task_id: required(input.task_id, "tache_id")?,
            resource_id: input.resource_id,
            user_id: input.user_id,
            day: required(input.day, "date")?,
            start_hour: input.start_hour,
            end_hour: input.end_hour,
            status: input
                .status
                .unwrap_or_else(|| DEFAULT_PLANNING_STATUS.to_string()),
            recurrence: input.recurrence.unwrap_or_else(|| NO_RECURRENCE.to_string()),
            history: Value::Array(Vec::new()),
            created_at: now,
            updated_at: now,
        };
        entry.validate()?;
        entry.record_history([HistoryEntry {
            at: now,
            field: "creation".to_string(),
            old: None,
            new: None,
        }]);
        Ok(entry)
    }

    fn apply(&mut self, input: PlanningInput, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let before = self.tracked_fields();

        if let Some(task_id) = input.task_id {
            self.task_id = task_id;
        }
        if let Some(resource_id) = input.resource_id {
            self.resource_id = Some(resource_id);
        }
        if let Some(user_id) = input.user_id {
            self.user_id = Some(user_id);
        }
        if let Some(day) = input.day {
            self.day = day;
        }
        if let Some(start_hour) = input.start_hour {
            self.start_hour = Some(start_hour);
        }
        if let Some(end_hour) = input.end_hour {
            self.end_hour = Some(end_hour);
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(recurrence) = input.recurrence {
            self.recurrence = recurrence;
        }
        self.validate()?;

        let changes: Vec<HistoryEntry> = before
            .into_iter()
            .zip(self.tracked_fields())
            .filter(|((_, old), (_, new))| old != new)
            .map(|((field, old), (_, new))| HistoryEntry {
                at: now,
                field: field.to_string(),
                old: Some(old),
                new: Some(new),
            })
            .collect();
        self.record_history(changes);
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &PlanningFilter) -> bool {
        filter.task_id.map_or(true, |t| self.task_id == t)
            && filter.resource_id.map_or(true, |r| self.resource_id == Some(r))
            && filter.user_id.map_or(true, |u| self.user_id == Some(u))
            && filter.status.as_ref().map_or(true, |s| &self.status == s)
            && filter.date.map_or(true, |d| self.day == d)
            && filter.week.map_or(true, |w| w.contains(self.day))
            && filter.from.map_or(true, |from| self.day >= from)
            && filter.to.map_or(true, |to| self.day <= to)
    }
}
