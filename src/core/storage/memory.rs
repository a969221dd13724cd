use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::{sort_newest_first, Record, Repository, SettingsRepository, Store, StoreError};
use crate::planning::PlanningEntry;
use crate::resources::Resource;
use crate::subtasks::SubTask;
use crate::tags::Tag;
use crate::tasks::Task;
use crate::teams::Team;
use crate::users::User;
use crate::worksites::Worksite;

#[derive(Debug)]
pub struct MemoryTable<R> {
    rows: RwLock<Vec<R>>,
}

impl<R> Default for MemoryTable<R> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<R: Record> MemoryTable<R> {
    fn list(&self, filter: &R::Filter) -> Result<Vec<R>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        let mut matching: Vec<R> = rows.iter().filter(|r| r.matches(filter)).cloned().collect();
        sort_newest_first(&mut matching);
        Ok(matching)
    }

    fn get(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.iter().find(|r| r.id() == id).cloned())
    }

    fn insert(&self, record: R) -> Result<R, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        check_conflicts(&rows, &record)?;
        rows.push(record.clone());
        Ok(record)
    }

    fn update(&self, id: Uuid, input: R::Input, now: DateTime<Utc>) -> Result<Option<R>, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        let Some(index) = rows.iter().position(|r| r.id() == id) else {
            return Ok(None);
        };

        // Merge into a copy so a rejected change leaves the row untouched.
        let mut merged = rows[index].clone();
        merged.apply(input, now)?;
        check_conflicts(&rows, &merged)?;
        rows[index] = merged.clone();
        Ok(Some(merged))
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        Ok(rows.len() != before)
    }
}

fn check_conflicts<R: Record>(rows: &[R], candidate: &R) -> Result<(), StoreError> {
    for existing in rows.iter().filter(|r| r.id() != candidate.id()) {
        if let Some(message) = candidate.conflicts_with(existing) {
            return Err(StoreError::Conflict(message));
        }
    }
    Ok(())
}

pub trait HasTable<R> {
    fn table(&self) -> &MemoryTable<R>;
}

/// Process-local backend used for development and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    worksites: MemoryTable<Worksite>,
    tasks: MemoryTable<Task>,
    subtasks: MemoryTable<SubTask>,
    teams: MemoryTable<Team>,
    resources: MemoryTable<Resource>,
    users: MemoryTable<User>,
    tags: MemoryTable<Tag>,
    planning: MemoryTable<PlanningEntry>,
    settings: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HasTable<Worksite> for MemoryStore {
    fn table(&self) -> &MemoryTable<Worksite> {
        &self.worksites
    }
}

impl HasTable<Task> for MemoryStore {
    fn table(&self) -> &MemoryTable<Task> {
        &self.tasks
    }
}

impl HasTable<SubTask> for MemoryStore {
    fn table(&self) -> &MemoryTable<SubTask> {
        &self.subtasks
    }
}

impl HasTable<Team> for MemoryStore {
    fn table(&self) -> &MemoryTable<Team> {
        &self.teams
    }
}

impl HasTable<Resource> for MemoryStore {
    fn table(&self) -> &MemoryTable<Resource> {
        &self.resources
    }
}

impl HasTable<User> for MemoryStore {
    fn table(&self) -> &MemoryTable<User> {
        &self.users
    }
}

impl HasTable<Tag> for MemoryStore {
    fn table(&self) -> &MemoryTable<Tag> {
        &self.tags
    }
}

impl HasTable<PlanningEntry> for MemoryStore {
    fn table(&self) -> &MemoryTable<PlanningEntry> {
        &self.planning
    }
}

impl<R: Record> Repository<R> for MemoryStore
where
    MemoryStore: HasTable<R>,
{
    fn list(&self, filter: &R::Filter) -> Result<Vec<R>, StoreError> {
        self.table().list(filter)
    }

    fn get(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        self.table().get(id)
    }

    fn insert(&self, record: R) -> Result<R, StoreError> {
        self.table().insert(record)
    }

    fn update(&self, id: Uuid, input: R::Input, now: DateTime<Utc>) -> Result<Option<R>, StoreError> {
        self.table().update(id, input, now)
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.table().delete(id)
    }
}

impl SettingsRepository for MemoryStore {
    fn load_settings(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        let settings = self.settings.read().map_err(|_| StoreError::Poisoned)?;
        Ok(settings.clone())
    }

    fn merge_settings(
        &self,
        changes: Map<String, Value>,
    ) -> Result<BTreeMap<String, Value>, StoreError> {
        let mut settings = self.settings.write().map_err(|_| StoreError::Poisoned)?;
        for (key, value) in changes {
            if value.is_null() {
                settings.remove(&key);
            } else {
                settings.insert(key, value);
            }
        }
        Ok(settings.clone())
    }
}

impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
