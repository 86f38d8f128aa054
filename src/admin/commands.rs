use serde::Deserialize;
use serde_json::json;

use crate::{
    db::PreferenceDecision,
    ipc::{parse_params, to_result, CommandResult, Request},
    models::{SessionId, TeacherId},
    AppState,
};

use super::WorkloadFilter;

#[derive(Deserialize)]
struct WorkloadParams {
    #[serde(default)]
    filter: WorkloadFilter,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeacherParams {
    teacher_id: TeacherId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecideParams {
    teacher_id: TeacherId,
    session_id: SessionId,
    decision: PreferenceDecision,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignParams {
    teacher_id: TeacherId,
    session_ids: Vec<SessionId>,
}

pub async fn try_handle(state: &AppState, req: &Request) -> Option<CommandResult> {
    let result = match req.method.as_str() {
        "admin.dashboard" => dashboard(state).await,
        "admin.workloads" => workloads(state, &req.params).await,
        "admin.teachers" => teachers(state).await,
        "admin.grades" => grades(state).await,
        "admin.departments" => departments(state).await,
        "admin.teacherPreferences" => teacher_preferences(state, &req.params).await,
        "admin.decide" => decide(state, &req.params).await,
        "admin.assign" => assign(state, &req.params).await,
        "admin.unassign" => unassign(state, &req.params).await,
        _ => return None,
    };
    Some(result)
}

async fn dashboard(state: &AppState) -> CommandResult {
    to_result(state.db.dashboard_stats().await?)
}

async fn workloads(state: &AppState, params: &serde_json::Value) -> CommandResult {
    let params: WorkloadParams = parse_params(params)?;
    to_result(state.db.teacher_workloads(&params.filter).await?)
}

async fn teachers(state: &AppState) -> CommandResult {
    to_result(state.db.list_teachers().await?)
}

async fn grades(state: &AppState) -> CommandResult {
    to_result(state.db.list_grades().await?)
}

async fn departments(state: &AppState) -> CommandResult {
    to_result(state.db.list_departments().await?)
}

async fn teacher_preferences(state: &AppState, params: &serde_json::Value) -> CommandResult {
    let params: TeacherParams = parse_params(params)?;
    to_result(state.db.list_preferences(params.teacher_id).await?)
}

async fn decide(state: &AppState, params: &serde_json::Value) -> CommandResult {
    let params: DecideParams = parse_params(params)?;
    let preference = state
        .db
        .decide_preference(params.teacher_id, params.session_id, params.decision)
        .await?;
    // Occupancy changed; bring the open calendar up to date.
    if let Err(err) = state.calendar.refresh().await {
        log::warn!("Calendar refresh after decision failed: {err}");
    }
    to_result(preference)
}

async fn assign(state: &AppState, params: &serde_json::Value) -> CommandResult {
    let params: AssignParams = parse_params(params)?;
    let added = state
        .db
        .assign_sessions(params.teacher_id, params.session_ids)
        .await?;
    to_result(json!({ "assigned": added }))
}

async fn unassign(state: &AppState, params: &serde_json::Value) -> CommandResult {
    let params: AssignParams = parse_params(params)?;
    let removed = state
        .db
        .unassign_sessions(params.teacher_id, params.session_ids)
        .await?;
    to_result(json!({ "removed": removed }))
}
