use std::{path::PathBuf, sync::Arc};

use serde_json::{json, Value};
use vigil_lib::{
    db::Database,
    ipc::{self, Request},
    preferences::PriorityPolicy,
    repository::CredentialStore,
    seed,
    settings::{SettingsStore, SubmissionSettings},
    AppState,
};

fn temp_settings() -> PathBuf {
    std::env::temp_dir().join(format!("vigil-ipc-{}.json", uuid::Uuid::new_v4()))
}

async fn demo_state() -> AppState {
    let db = Database::open_in_memory().unwrap();
    assert!(seed::seed_if_empty(&db).await.unwrap());

    let settings = Arc::new(SettingsStore::new(temp_settings()).unwrap());
    let credentials: Arc<dyn CredentialStore> = settings.clone();
    AppState::new(db, settings, credentials)
}

async fn call(state: &AppState, method: &str, params: Value) -> Value {
    ipc::handle_request(
        state,
        Request {
            id: method.into(),
            method: method.into(),
            params,
        },
    )
    .await
}

fn result(response: Value) -> Value {
    assert_eq!(response["ok"], json!(true), "unexpected failure: {response}");
    response["result"].clone()
}

fn error_code(response: &Value) -> &str {
    assert_eq!(response["ok"], json!(false), "unexpected success: {response}");
    response["error"]["code"].as_str().unwrap()
}

#[tokio::test]
async fn teacher_selects_submits_and_admin_approves() {
    let state = demo_state().await;

    let loaded = result(call(&state, "calendar.setAnchor", json!({ "date": "2024-01-15" })).await);
    assert_eq!(loaded, json!({ "kind": "applied", "sessions": 6 }));

    let full = call(&state, "calendar.toggle", json!({ "sessionId": 2 })).await;
    assert_eq!(error_code(&full), "validation.session_unavailable");

    for session_id in [3, 1] {
        let toggled = result(call(&state, "calendar.toggle", json!({ "sessionId": session_id })).await);
        assert_eq!(toggled, json!("selected"));
    }

    let anonymous = call(&state, "preferences.submit", Value::Null).await;
    assert_eq!(error_code(&anonymous), "validation.not_signed_in");

    let teacher = result(call(&state, "auth.signIn", json!({ "teacherId": 4 })).await);
    assert_eq!(teacher["firstName"], json!("Salma"));
    assert_eq!(teacher["maxSessionsPerWeek"], json!(10));

    let receipt = result(call(&state, "preferences.submit", Value::Null).await);
    assert_eq!(
        receipt["preferences"],
        json!([
            { "sessionId": 3, "priority": 1 },
            { "sessionId": 1, "priority": 2 },
        ])
    );

    let snapshot = result(call(&state, "calendar.snapshot", Value::Null).await);
    assert_eq!(snapshot["selectedIds"], json!([]));
    assert_eq!(snapshot["lastSubmission"]["teacherId"], json!(4));

    let pending = result(call(&state, "preferences.list", Value::Null).await);
    assert_eq!(pending.as_array().unwrap().len(), 2);
    assert!(pending
        .as_array()
        .unwrap()
        .iter()
        .all(|preference| preference["status"] == json!("PENDING")));

    let decided = result(
        call(
            &state,
            "admin.decide",
            json!({ "teacherId": 4, "sessionId": 3, "decision": "APPROVED" }),
        )
        .await,
    );
    assert_eq!(decided["status"], json!("APPROVED"));

    let again = call(
        &state,
        "admin.decide",
        json!({ "teacherId": 4, "sessionId": 3, "decision": "REJECTED" }),
    )
    .await;
    assert_eq!(error_code(&again), "internal");

    let dashboard = result(call(&state, "admin.dashboard", Value::Null).await);
    assert_eq!(dashboard["totalSessions"], json!(6));
    assert_eq!(dashboard["totalTeachers"], json!(6));
    assert_eq!(dashboard["pendingPreferences"], json!(1));

    let events = result(call(&state, "calendar.events", Value::Null).await);
    let session_three = events
        .as_array()
        .unwrap()
        .iter()
        .find(|event| event["id"] == json!("3"))
        .unwrap();
    assert_eq!(
        session_three["extendedProps"]["supervisorsCount"],
        json!(1)
    );
}

#[tokio::test]
async fn selections_over_the_configured_cap_are_refused() {
    let db = Database::open_in_memory().unwrap();
    seed::seed_if_empty(&db).await.unwrap();
    let settings = Arc::new(SettingsStore::new(temp_settings()).unwrap());
    settings
        .update_submission(SubmissionSettings {
            priority_policy: PriorityPolicy::Reject,
            priority_cap: 2,
        })
        .unwrap();
    let credentials: Arc<dyn CredentialStore> = settings.clone();
    let state = AppState::new(db, settings, credentials);

    result(call(&state, "calendar.setAnchor", json!({ "date": "2024-01-15" })).await);
    result(call(&state, "auth.signIn", json!({ "teacherId": 1 })).await);
    for session_id in [1, 3, 4] {
        result(call(&state, "calendar.toggle", json!({ "sessionId": session_id })).await);
    }

    let snapshot = result(call(&state, "calendar.snapshot", Value::Null).await);
    assert_eq!(snapshot["stats"]["selectedCount"], json!(3));
    assert_eq!(snapshot["stats"]["canSubmit"], json!(false));

    let refused = call(&state, "preferences.submit", Value::Null).await;
    assert_eq!(error_code(&refused), "validation.priority_out_of_range");
    assert_eq!(
        result(call(&state, "preferences.list", Value::Null).await),
        json!([])
    );

    let snapshot = result(call(&state, "calendar.snapshot", Value::Null).await);
    assert_eq!(snapshot["selectedIds"], json!([1, 3, 4]));
}

#[tokio::test]
async fn navigation_views_and_filters_round_trip() {
    let state = demo_state().await;
    result(call(&state, "calendar.setAnchor", json!({ "date": "2024-01-15" })).await);

    let week = result(call(&state, "calendar.setView", json!({ "view": "timeGridWeek" })).await);
    assert_eq!(week["kind"], json!("applied"));
    let snapshot = result(call(&state, "calendar.snapshot", Value::Null).await);
    assert_eq!(snapshot["view"], json!("week"));
    assert_eq!(snapshot["viewName"], json!("timeGridWeek"));
    assert_eq!(
        snapshot["visibleRange"],
        json!({ "start": "2024-01-14", "end": "2024-01-20" })
    );

    let filtered = result(
        call(
            &state,
            "calendar.setFilter",
            json!({ "filter": { "department": "Gestion" } }),
        )
        .await,
    );
    assert_eq!(filtered, json!({ "kind": "applied", "sessions": 3 }));

    let bad_view = call(&state, "calendar.setView", json!({ "view": "year" })).await;
    assert_eq!(error_code(&bad_view), "bad_params");

    let next = result(call(&state, "calendar.navigate", json!({ "direction": "next" })).await);
    assert_eq!(next, json!({ "kind": "applied", "sessions": 0 }));
}

#[tokio::test]
async fn protocol_errors_are_reported_per_line() {
    let state = demo_state().await;

    assert!(ipc::handle_line(&state, "   ").await.is_none());

    let garbage = ipc::handle_line(&state, "{not json").await.unwrap();
    assert_eq!(error_code(&garbage), "bad_json");

    let unknown = ipc::handle_line(&state, r#"{"id":"9","method":"calendar.fly"}"#)
        .await
        .unwrap();
    assert_eq!(unknown["id"], json!("9"));
    assert_eq!(error_code(&unknown), "not_implemented");
}

#[tokio::test]
async fn workloads_reflect_demo_assignments() {
    let state = demo_state().await;

    let busy = result(
        call(
            &state,
            "admin.workloads",
            json!({ "filter": { "search": "ben ali" } }),
        )
        .await,
    );
    let rows = busy.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["teacher"]["id"], json!(1));
    assert_eq!(rows[0]["assignedSessions"], json!(1));
    assert_eq!(rows[0]["bucket"], json!("available"));
}

#[tokio::test]
async fn serve_answers_one_line_per_request() {
    let state = demo_state().await;
    let input = concat!(
        r#"{"id":"1","method":"calendar.views"}"#,
        "\n\n",
        r#"{"id":"2","method":"auth.whoami"}"#,
        "\n",
    );
    let mut output = Vec::new();

    vigil_lib::serve(&state, input.as_bytes(), &mut output)
        .await
        .unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], json!("1"));
    assert_eq!(responses[0]["result"].as_array().unwrap().len(), 4);
    assert_eq!(responses[1]["id"], json!("2"));
    assert_eq!(error_code(&responses[1]), "validation.not_signed_in");
}

#[tokio::test]
async fn submitted_preferences_export_as_csv() {
    let state = demo_state().await;
    result(call(&state, "calendar.setAnchor", json!({ "date": "2024-01-15" })).await);
    result(call(&state, "auth.signIn", json!({ "teacherId": 4 })).await);
    for session_id in [3, 1] {
        result(call(&state, "calendar.toggle", json!({ "sessionId": session_id })).await);
    }
    result(call(&state, "preferences.submit", Value::Null).await);

    let export = result(call(&state, "preferences.export", Value::Null).await);
    assert_eq!(export["rows"], json!(2));
    assert!(export["fileName"]
        .as_str()
        .unwrap()
        .starts_with("preferences_Salma_"));
    assert_eq!(
        export["csv"],
        json!(concat!(
            "Session,Priorité,Statut\n",
            "Mathématiques Financières - M1 Finance (17/01/2024 10:00),1,En attente\n",
            "Économie Générale - L1 Eco (15/01/2024 09:00),2,En attente\n",
        ))
    );

    result(call(&state, "auth.signOut", Value::Null).await);
    let anonymous = call(&state, "preferences.export", Value::Null).await;
    assert_eq!(error_code(&anonymous), "validation.not_signed_in");
}
