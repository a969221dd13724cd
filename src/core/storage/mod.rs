//! Persistence seam shared by every resource.
//!
//! A resource type implements [`Record`]; a backend implements
//! [`Repository`] for it. [`Store`] bundles the repositories of every
//! resource so handlers can hold a single `Arc<dyn Store>`. Two backends
//! exist: [`postgres::PgStore`] (diesel + r2d2) and [`memory::MemoryStore`].

pub mod memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::planning::PlanningEntry;
use crate::resources::Resource;
use crate::subtasks::SubTask;
use crate::tags::Tag;
use crate::tasks::Task;
use crate::teams::Team;
use crate::users::User;
use crate::worksites::Worksite;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("In-memory table lock poisoned")]
    Poisoned,
    #[error("Blocking task failed: {0}")]
    Join(String),
}

/// A persisted resource.
///
/// `Input` is the JSON body accepted by both POST and PUT/PATCH: every field
/// is optional, `create` enforces the required ones and `apply` merges the
/// supplied ones into an existing record.
pub trait Record: Clone + Serialize + Send + Sync + 'static {
    type Input: DeserializeOwned + Send + 'static;
    type Filter: DeserializeOwned + Default + Send + Sync + 'static;

    /// Human label used in messages, e.g. "Chantier".
    const LABEL: &'static str;

    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;

    fn create(id: Uuid, input: Self::Input, now: DateTime<Utc>) -> Result<Self, ValidationError>;
    fn apply(&mut self, input: Self::Input, now: DateTime<Utc>) -> Result<(), ValidationError>;

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Message describing a unique-value clash with `other`, if any.
    fn conflicts_with(&self, _other: &Self) -> Option<String> {
        None
    }
}

pub trait Repository<R: Record>: Send + Sync {
    /// Records matching `filter`, newest first.
    fn list(&self, filter: &R::Filter) -> Result<Vec<R>, StoreError>;
    fn get(&self, id: Uuid) -> Result<Option<R>, StoreError>;
    fn insert(&self, record: R) -> Result<R, StoreError>;
    /// Merges `input` into the stored record. `Ok(None)` when `id` is unknown.
    fn update(&self, id: Uuid, input: R::Input, now: DateTime<Utc>) -> Result<Option<R>, StoreError>;
    /// `Ok(false)` when `id` is unknown.
    fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Free-form key/value configuration of the planning board.
pub trait SettingsRepository: Send + Sync {
    fn load_settings(&self) -> Result<BTreeMap<String, Value>, StoreError>;
    /// Upserts every key of `changes`; a `null` value removes the key.
    fn merge_settings(&self, changes: Map<String, Value>)
        -> Result<BTreeMap<String, Value>, StoreError>;
}

pub trait Store:
    Repository<Worksite>
    + Repository<Task>
    + Repository<SubTask>
    + Repository<Team>
    + Repository<Resource>
    + Repository<User>
    + Repository<Tag>
    + Repository<PlanningEntry>
    + SettingsRepository
{
    fn backend(&self) -> &'static str;
    fn ping(&self) -> Result<(), StoreError>;
}

/// Newest-first ordering shared by both backends.
pub fn sort_newest_first<R: Record>(records: &mut [R]) {
    records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}
