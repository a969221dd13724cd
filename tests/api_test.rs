use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use chantierserver::core::shared::state::AppState;
use chantierserver::main_module::build_router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> Router {
    build_router(Arc::new(AppState::in_memory()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let (status, value) = send(app, Method::POST, uri, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{value}");
    value
}

#[tokio::test]
async fn test_worksite_without_name_is_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/chantiers",
        Some(json!({"client_id": "CLI-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Le champ 'nom' est requis");
}

#[tokio::test]
async fn test_worksite_created_with_generated_id() {
    let app = app();
    let created = create(
        &app,
        "/api/chantiers",
        json!({"nom": "Gare de Lyon", "client_id": "CLI-1", "budget": 50000.0}),
    )
    .await;
    assert_eq!(created["nom"], "Gare de Lyon");
    assert_eq!(created["client_id"], "CLI-1");
    assert_eq!(created["statut"], "planifie");
    let id: Uuid = serde_json::from_value(created["id"].clone()).unwrap();

    let (status, fetched) = send(&app, Method::GET, &format!("/api/chantiers/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["budget"], 50000.0);

    let (_, listed) = send(&app, Method::GET, "/api/chantiers?clientId=CLI-1", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (_, other) = send(&app, Method::GET, "/api/chantiers?clientId=CLI-2", None).await;
    assert!(other.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/taches/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Tâche introuvable");
}

#[tokio::test]
async fn test_deleted_planning_entry_disappears() {
    let app = app();
    let entry = create(
        &app,
        "/api/planning",
        json!({"tache_id": Uuid::new_v4(), "date": "2025-03-04", "heure_debut": "08:00", "heure_fin": "12:00"}),
    )
    .await;
    let uri = format!("/api/planning/{}", entry["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listed) = send(&app, Method::GET, "/api/planning", None).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_evolution_is_zero_without_history() {
    let app = app();
    create(&app, "/api/chantiers", json!({"nom": "Lot A", "client_id": "C"})).await;
    create(
        &app,
        "/api/taches",
        json!({"titre": "Coulage", "statut": "termine"}),
    )
    .await;

    let (status, stats) = send(&app, Method::GET, "/api/dashboard/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["chantiers"]["ce_mois"], 1);
    assert_eq!(stats["chantiers"]["mois_precedent"], 0);
    assert_eq!(stats["chantiers"]["evolution"], 0);
    assert_eq!(stats["taches"]["terminees_cette_semaine"], 1);
    assert_eq!(stats["taches"]["evolution"], 0);
}

#[tokio::test]
async fn test_unsupported_method() {
    let app = app();
    let (status, _) = send(&app, Method::DELETE, "/api/chantiers", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let app = app();
    let task = create(
        &app,
        "/api/taches",
        json!({"titre": "Charpente", "description": "Bois lamellé", "priorite": "haute"}),
    )
    .await;
    let uri = format!("/api/taches/{}", task["id"].as_str().unwrap());

    let (status, updated) = send(&app, Method::PATCH, &uri, Some(json!({"statut": "termine"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["progression"], 100);
    assert!(updated["date_achevement"].is_string());
    assert_eq!(updated["description"], "Bois lamellé");
    assert_eq!(updated["priorite"], "haute");

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({"progression": 150}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/taches/{}", Uuid::new_v4()),
        Some(json!({"titre": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_week_filter() {
    let app = app();
    create(
        &app,
        "/api/taches",
        json!({"titre": "Semaine 10", "date_debut": "2025-03-03", "date_fin": "2025-03-05"}),
    )
    .await;
    create(
        &app,
        "/api/taches",
        json!({"titre": "Semaine 12", "date_debut": "2025-03-17"}),
    )
    .await;
    create(&app, "/api/taches", json!({"titre": "Sans date"})).await;

    let (_, week_10) = send(&app, Method::GET, "/api/taches?semaine=2025-W10", None).await;
    let titles: Vec<&str> = week_10
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["titre"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Semaine 10"]);

    let (_, by_date) = send(&app, Method::GET, "/api/taches?semaine=2025-03-19", None).await;
    assert_eq!(by_date.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/api/taches?semaine=demain", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_dates_at_calendar_edge_are_bad_requests() {
    let app = app();
    let last_day = NaiveDate::MAX.format("%Y-%m-%d").to_string();
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/taches?semaine={}", last_day.replace('+', "%2B")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let task = create(
        &app,
        "/api/taches",
        json!({"titre": "Enduit", "date_debut": "2025-04-01", "date_fin": "2025-04-03"}),
    )
    .await;
    let day_before_last = NaiveDate::MAX
        .pred_opt()
        .unwrap()
        .format("%Y-%m-%d")
        .to_string();
    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/taches/{}/planifier", task["id"].as_str().unwrap()),
        Some(json!({"date_debut": day_before_last})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_reschedule_task_keeps_duration() {
    let app = app();
    let task = create(
        &app,
        "/api/taches",
        json!({"titre": "Dalle", "date_debut": "2025-04-01", "date_fin": "2025-04-03"}),
    )
    .await;
    let uri = format!("/api/taches/{}/planifier", task["id"].as_str().unwrap());

    let (status, moved) = send(&app, Method::PATCH, &uri, Some(json!({"date_debut": "2025-04-14"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["date_debut"], "2025-04-14");
    assert_eq!(moved["date_fin"], "2025-04-16");

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({"date_debut": "2025-04-14", "date_fin": "2025-04-10"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_planning_move_records_history() {
    let app = app();
    let entry = create(
        &app,
        "/api/planning",
        json!({"tache_id": Uuid::new_v4(), "date": "2025-03-04", "heure_debut": "08:00", "heure_fin": "10:00"}),
    )
    .await;
    let id = entry["id"].as_str().unwrap();

    let (status, moved) = send(
        &app,
        Method::PATCH,
        &format!("/api/planning/{id}/deplacer"),
        Some(json!({"date": "2025-03-06", "heure_debut": "14:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["date"], "2025-03-06");
    assert_eq!(moved["heure_fin"], "16:00");

    let history = moved["historique"].as_array().unwrap();
    let fields: Vec<&str> = history.iter().map(|h| h["champ"].as_str().unwrap()).collect();
    assert_eq!(fields, vec!["creation", "date", "heure_debut", "heure_fin"]);
    assert_eq!(history[1]["ancien"], "2025-03-04");
    assert_eq!(history[1]["nouveau"], "2025-03-06");
}

#[tokio::test]
async fn test_board_views() {
    let app = app();
    let task = create(
        &app,
        "/api/taches",
        json!({"titre": "Coffrage", "date_debut": "2025-03-03", "date_fin": "2025-03-07"}),
    )
    .await;
    let user = create(
        &app,
        "/api/utilisateurs",
        json!({"nom": "Nadia", "email": "nadia@btp.fr"}),
    )
    .await;
    create(
        &app,
        "/api/planning",
        json!({
            "tache_id": task["id"],
            "utilisateur_id": user["id"],
            "date": "2025-03-03",
            "heure_debut": "08:00",
            "heure_fin": "12:00",
            "recurrence": "quotidienne"
        }),
    )
    .await;

    let (status, calendar) = send(&app, Method::GET, "/api/planning/calendrier?semaine=2025-W10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calendar["debut"], "2025-03-03");
    let days = calendar["jours"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert!(days.iter().all(|d| d["creneaux"].as_array().unwrap().len() == 1));

    let (_, gantt) = send(&app, Method::GET, "/api/planning/gantt", None).await;
    assert_eq!(gantt["barres"][0]["duree_jours"], 5);

    let (status, heatmap) = send(
        &app,
        Method::GET,
        "/api/planning/heatmap?du=2025-03-01&au=2025-03-04",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let heat = heatmap.as_array().unwrap();
    assert_eq!(heat[0]["creneaux"], 0);
    assert_eq!(heat[2]["heures"], 4.0);
    assert_eq!(heat[2]["intensite"], 4);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/planning/heatmap?du=2025-03-04&au=2025-03-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, load) = send(&app, Method::GET, "/api/planning/charge?semaine=2025-W10", None).await;
    assert_eq!(load["heures_journee"], 9.0);
    assert_eq!(load["utilisateurs"][0]["total_heures"], 28.0);
}

#[tokio::test]
async fn test_configuration_merge() {
    let app = app();
    let (status, defaults) = send(&app, Method::GET, "/api/configuration", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(defaults["heure_debut_journee"], "08:00");

    let (status, merged) = send(
        &app,
        Method::PATCH,
        "/api/configuration",
        Some(json!({"heure_debut_journee": "07:30", "theme": "sombre"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(merged["heure_debut_journee"], "07:30");
    assert_eq!(merged["heure_fin_journee"], "17:00");
    assert_eq!(merged["theme"], "sombre");

    let (_, cleared) = send(
        &app,
        Method::PUT,
        "/api/configuration",
        Some(json!({"heure_debut_journee": null})),
    )
    .await;
    assert_eq!(cleared["heure_debut_journee"], "08:00");
    assert_eq!(cleared["theme"], "sombre");

    let (status, _) = send(&app, Method::PUT, "/api/configuration", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = app();
    create(
        &app,
        "/api/utilisateurs",
        json!({"nom": "Paul", "email": "paul@btp.fr"}),
    )
    .await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/utilisateurs",
        Some(json!({"nom": "Paul B", "email": "PAUL@btp.fr"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_task_subtask_shortcuts() {
    let app = app();
    let task = create(&app, "/api/taches", json!({"titre": "Toiture"})).await;
    let uri = format!("/api/taches/{}/sous-taches", task["id"].as_str().unwrap());

    let sub_task = create(&app, &uri, json!({"titre": "Poser les liteaux"})).await;
    assert_eq!(sub_task["tache_id"], task["id"]);
    assert_eq!(sub_task["termine"], false);

    let (_, listed) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (_, flat) = send(
        &app,
        Method::GET,
        &format!("/api/sous-taches?tacheId={}", task["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(flat.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/taches/{}/sous-taches", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tags")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = app();
    let (status, simple) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(simple["status"], "ok");

    let (status, ready) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ready["status"], "healthy");
    assert_eq!(ready["backend"], "memory");
}
