#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    // Health
    pub const HEALTH_SIMPLE: &'static str = "/health";
    pub const HEALTH: &'static str = "/api/health";

    // Worksites (chantiers)
    pub const WORKSITES: &'static str = "/api/chantiers";
    pub const WORKSITE_BY_ID: &'static str = "/api/chantiers/:id";

    // Tasks (tâches)
    pub const TASKS: &'static str = "/api/taches";
    pub const TASK_BY_ID: &'static str = "/api/taches/:id";
    pub const TASK_RESCHEDULE: &'static str = "/api/taches/:id/planifier";
    pub const TASK_SUBTASKS: &'static str = "/api/taches/:id/sous-taches";

    // Sub-tasks
    pub const SUBTASKS: &'static str = "/api/sous-taches";
    pub const SUBTASK_BY_ID: &'static str = "/api/sous-taches/:id";

    // Teams (équipes)
    pub const TEAMS: &'static str = "/api/equipes";
    pub const TEAM_BY_ID: &'static str = "/api/equipes/:id";

    // Resources (ressources)
    pub const RESOURCES: &'static str = "/api/ressources";
    pub const RESOURCE_BY_ID: &'static str = "/api/ressources/:id";

    // Users (utilisateurs)
    pub const USERS: &'static str = "/api/utilisateurs";
    pub const USER_BY_ID: &'static str = "/api/utilisateurs/:id";

    // Tags
    pub const TAGS: &'static str = "/api/tags";
    pub const TAG_BY_ID: &'static str = "/api/tags/:id";

    // Planning board
    pub const PLANNING: &'static str = "/api/planning";
    pub const PLANNING_BY_ID: &'static str = "/api/planning/:id";
    pub const PLANNING_MOVE: &'static str = "/api/planning/:id/deplacer";
    pub const PLANNING_CALENDAR: &'static str = "/api/planning/calendrier";
    pub const PLANNING_GANTT: &'static str = "/api/planning/gantt";
    pub const PLANNING_HEATMAP: &'static str = "/api/planning/heatmap";
    pub const PLANNING_WORKLOAD: &'static str = "/api/planning/charge";

    // Configuration & dashboard
    pub const SETTINGS: &'static str = "/api/configuration";
    pub const DASHBOARD_STATS: &'static str = "/api/dashboard/stats";
}
