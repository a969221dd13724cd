//! Home dashboard counters with month-over-month and week-over-week trends.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::core::crud::list_records;
use crate::core::shared::dates::{month_start, next_month_start, previous_month_start, WeekRange};
use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::resources::{Resource, ResourceFilter};
use crate::tasks::{Task, TaskFilter, IN_PROGRESS_STATUS};
use crate::teams::{Team, TeamFilter};
use crate::users::{User, UserFilter};
use crate::worksites::{Worksite, WorksiteFilter};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorksiteStats {
    pub total: usize,
    #[serde(rename = "actifs")]
    pub active: usize,
    #[serde(rename = "ce_mois")]
    pub this_month: usize,
    #[serde(rename = "mois_precedent")]
    pub previous_month: usize,
    pub evolution: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    #[serde(rename = "terminees")]
    pub done: usize,
    #[serde(rename = "en_cours")]
    pub in_progress: usize,
    #[serde(rename = "en_retard")]
    pub late: usize,
    #[serde(rename = "terminees_cette_semaine")]
    pub done_this_week: usize,
    #[serde(rename = "terminees_semaine_precedente")]
    pub done_previous_week: usize,
    pub evolution: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    #[serde(rename = "chantiers")]
    pub worksites: WorksiteStats,
    #[serde(rename = "taches")]
    pub tasks: TaskStats,
    #[serde(rename = "equipes")]
    pub teams: usize,
    #[serde(rename = "ressources")]
    pub resources: usize,
    #[serde(rename = "ressources_disponibles")]
    pub available_resources: usize,
    #[serde(rename = "utilisateurs")]
    pub users: usize,
}

/// Whole-percent change from `previous` to `current`; 0 when there is no
/// previous value to compare against.
pub fn percent_change(current: usize, previous: usize) -> i64 {
    if previous == 0 {
        return 0;
    }
    let delta = current as f64 - previous as f64;
    (delta * 100.0 / previous as f64).round() as i64
}

fn worksite_stats(worksites: &[Worksite], today: NaiveDate) -> WorksiteStats {
    let this_month = month_start(today)..next_month_start(today).unwrap_or(NaiveDate::MAX);
    let previous_month = previous_month_start(today).unwrap_or(NaiveDate::MIN)..month_start(today);
    let created_in = |range: &std::ops::Range<NaiveDate>| {
        worksites
            .iter()
            .filter(|w| range.contains(&w.created_at.date_naive()))
            .count()
    };

    let current = created_in(&this_month);
    let previous = created_in(&previous_month);
    WorksiteStats {
        total: worksites.len(),
        active: worksites.iter().filter(|w| w.is_active()).count(),
        this_month: current,
        previous_month: previous,
        evolution: percent_change(current, previous),
    }
}

fn task_stats(tasks: &[Task], today: NaiveDate) -> TaskStats {
    let week = WeekRange::containing(today).ok();
    let previous_week = week.and_then(|w| w.previous().ok());
    let completed_in = |range: Option<WeekRange>| {
        let Some(range) = range else {
            return 0;
        };
        tasks
            .iter()
            .filter_map(|t| t.completed_at)
            .filter(|at| range.contains(at.date_naive()))
            .count()
    };

    let current = completed_in(week);
    let previous = completed_in(previous_week);
    TaskStats {
        total: tasks.len(),
        done: tasks.iter().filter(|t| t.is_done()).count(),
        in_progress: tasks.iter().filter(|t| t.status == IN_PROGRESS_STATUS).count(),
        late: tasks.iter().filter(|t| t.is_late(today)).count(),
        done_this_week: current,
        done_previous_week: previous,
        evolution: percent_change(current, previous),
    }
}

pub fn compute_stats(
    worksites: &[Worksite],
    tasks: &[Task],
    teams: &[Team],
    resources: &[Resource],
    users: &[User],
    today: NaiveDate,
) -> DashboardStats {
    DashboardStats {
        worksites: worksite_stats(worksites, today),
        tasks: task_stats(tasks, today),
        teams: teams.len(),
        resources: resources.len(),
        available_resources: resources.iter().filter(|r| r.available).count(),
        users: users.len(),
    }
}

pub async fn handle_dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, ApiError> {
    let worksites = list_records::<Worksite>(&state, WorksiteFilter::default()).await?;
    let tasks = list_records::<Task>(&state, TaskFilter::default()).await?;
    let teams = list_records::<Team>(&state, TeamFilter::default()).await?;
    let resources = list_records::<Resource>(&state, ResourceFilter::default()).await?;
    let users = list_records::<User>(&state, UserFilter::default()).await?;

    Ok(Json(compute_stats(
        &worksites,
        &tasks,
        &teams,
        &resources,
        &users,
        Utc::now().date_naive(),
    )))
}

pub fn configure_dashboard_routes() -> Router<Arc<AppState>> {
    Router::new().route(ApiUrls::DASHBOARD_STATS, get(handle_dashboard_stats))
}
