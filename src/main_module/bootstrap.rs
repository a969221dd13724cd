//! Bootstrap and application initialization logic

use anyhow::Context;
use chrono::{Duration, NaiveTime, Utc};
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::config::{AppConfig, StorageBackend};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{create_conn, redact_database_url, run_migrations};
use crate::core::storage::{MemoryStore, PgStore, Record, Repository, Store, StoreError};
use crate::planning::{PlanningEntry, PlanningInput};
use crate::resources::{Resource, ResourceInput};
use crate::subtasks::{SubTask, SubTaskInput};
use crate::tags::{Tag, TagInput};
use crate::tasks::{Task, TaskInput};
use crate::teams::{Team, TeamInput};
use crate::users::{User, UserInput};
use crate::worksites::{Worksite, WorksiteInput};

/// Initialize logging; `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

pub fn create_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Postgres => {
            let url = storage
                .database_url
                .as_deref()
                .context("storage.database_url is not set")?;
            info!("Connecting to {}", redact_database_url(url));

            let pool = create_conn(url, storage.max_connections)
                .context("Failed to create database connection pool")?;
            if storage.run_migrations {
                run_migrations(&pool)
                    .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
            }
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory store: data is lost on restart");
            let store = MemoryStore::new();
            if storage.seed_demo {
                seed_demo(&store).context("Failed to load demo data")?;
            }
            Ok(Arc::new(store))
        }
    }
}

pub fn create_app_state(config: AppConfig) -> anyhow::Result<Arc<AppState>> {
    let store = create_store(&config)?;
    info!("Storage backend: {}", store.backend());
    Ok(Arc::new(AppState::new(config, store)))
}

fn insert<R: Record>(store: &MemoryStore, input: R::Input) -> Result<R, StoreError>
where
    MemoryStore: Repository<R>,
{
    let record = R::create(Uuid::new_v4(), input, Utc::now())?;
    Repository::<R>::insert(store, record)
}

/// A small worksite with its team, people, equipment and this week's slots.
pub fn seed_demo(store: &MemoryStore) -> Result<(), StoreError> {
    let today = Utc::now().date_naive();
    let hour = |h: u32| NaiveTime::from_hms_opt(h, 0, 0);

    let worksite: Worksite = insert(
        store,
        WorksiteInput {
            name: Some("Résidence Les Tilleuls".to_string()),
            description: Some("Construction de 12 logements collectifs".to_string()),
            client_id: Some("CLI-0042".to_string()),
            start_date: Some(today - Duration::days(14)),
            end_date: Some(today + Duration::days(120)),
            status: Some("en_cours".to_string()),
            budget: Some(1_250_000.0),
            address: Some("18 avenue des Tilleuls, Lyon".to_string()),
        },
    )?;

    let lead: User = insert(
        store,
        UserInput {
            name: Some("Claire Dubois".to_string()),
            email: Some("claire.dubois@example.fr".to_string()),
            role: Some("chef_chantier".to_string()),
            skills: Some(vec!["gros_oeuvre".to_string(), "coordination".to_string()]),
            ..UserInput::default()
        },
    )?;
    let mason: User = insert(
        store,
        UserInput {
            name: Some("Karim Benali".to_string()),
            email: Some("karim.benali@example.fr".to_string()),
            skills: Some(vec!["maconnerie".to_string()]),
            ..UserInput::default()
        },
    )?;

    let _team: Team = insert(
        store,
        TeamInput {
            name: Some("Gros œuvre".to_string()),
            members: Some(vec![lead.id, mason.id]),
            leader_id: Some(lead.id),
            specialty: Some("maconnerie".to_string()),
            capacity: Some(6),
        },
    )?;

    let mixer: Resource = insert(
        store,
        ResourceInput {
            name: Some("Bétonnière 350L".to_string()),
            kind: Some("materiel".to_string()),
            cost: Some(45.0),
            location: Some("Dépôt Vénissieux".to_string()),
            ..ResourceInput::default()
        },
    )?;

    let foundations: Task = insert(
        store,
        TaskInput {
            title: Some("Fondations".to_string()),
            worksite_id: Some(worksite.id),
            assignee_id: Some(lead.id),
            start_date: Some(today - Duration::days(14)),
            end_date: Some(today - Duration::days(3)),
            priority: Some("haute".to_string()),
            status: Some("termine".to_string()),
            ..TaskInput::default()
        },
    )?;
    let walls: Task = insert(
        store,
        TaskInput {
            title: Some("Élévation des murs RDC".to_string()),
            worksite_id: Some(worksite.id),
            assignee_id: Some(mason.id),
            start_date: Some(today - Duration::days(2)),
            end_date: Some(today + Duration::days(10)),
            status: Some("en_cours".to_string()),
            progress: Some(20),
            dependencies: Some(vec![foundations.id]),
            resource_ids: Some(vec![mixer.id]),
            ..TaskInput::default()
        },
    )?;

    let _check: SubTask = insert(
        store,
        SubTaskInput {
            task_id: Some(walls.id),
            title: Some("Réception des parpaings".to_string()),
            completed: Some(true),
        },
    )?;

    let _slot: PlanningEntry = insert(
        store,
        PlanningInput {
            task_id: Some(walls.id),
            resource_id: Some(mixer.id),
            user_id: Some(mason.id),
            day: Some(today),
            start_hour: hour(8),
            end_hour: hour(12),
            recurrence: Some("quotidienne".to_string()),
            ..PlanningInput::default()
        },
    )?;

    let _tag: Tag = insert(
        store,
        TagInput {
            name: Some("prioritaire".to_string()),
            color: Some("#ef4444".to_string()),
        },
    )?;

    info!("Loaded demo data for worksite {}", worksite.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFilter;

    #[test]
    fn test_seed_demo() {
        let store = MemoryStore::new();
        seed_demo(&store).unwrap();
        let tasks = Repository::<Task>::list(&store, &TaskFilter::default()).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().any(|t| t.is_done() && t.progress == 100));
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Memory;
        let store = create_store(&config).unwrap();
        assert_eq!(store.backend(), "memory");
    }
}
