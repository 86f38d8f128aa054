use std::collections::HashMap;

use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use crate::{
    errors::ValidationError,
    ipc::{parse_params, to_result, CommandError, CommandResult, Request},
    models::{SessionId, TeacherId},
    repository::Credentials,
    AppState,
};

use super::export::{export_file_name, preferences_csv};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInParams {
    teacher_id: TeacherId,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawParams {
    session_id: SessionId,
}

fn signed_in(state: &AppState) -> Result<Credentials, CommandError> {
    state
        .credentials
        .current()
        .ok_or_else(|| ValidationError::NotSignedIn.into())
}

pub async fn try_handle(state: &AppState, req: &Request) -> Option<CommandResult> {
    let result = match req.method.as_str() {
        "auth.whoami" => whoami(state).await,
        "auth.signIn" => sign_in(state, &req.params).await,
        "auth.signOut" => sign_out(state),
        "preferences.submit" => submit(state).await,
        "preferences.list" => list(state).await,
        "preferences.withdraw" => withdraw(state, &req.params).await,
        "preferences.export" => export(state).await,
        _ => return None,
    };
    Some(result)
}

async fn whoami(state: &AppState) -> CommandResult {
    let credentials = signed_in(state)?;
    let teacher = state.db.get_teacher(credentials.teacher_id).await?;
    to_result(json!({
        "teacherId": credentials.teacher_id,
        "teacher": teacher,
    }))
}

async fn sign_in(state: &AppState, params: &serde_json::Value) -> CommandResult {
    let params: SignInParams = parse_params(params)?;
    let teacher = state
        .db
        .get_teacher(params.teacher_id)
        .await?
        .ok_or_else(|| {
            CommandError::new(
                "auth.unknown_teacher",
                format!("teacher {} not found", params.teacher_id),
            )
        })?;
    state.settings.sign_in(teacher.id, params.token)?;
    to_result(teacher)
}

fn sign_out(state: &AppState) -> CommandResult {
    state.settings.sign_out()?;
    Ok(json!(null))
}

async fn submit(state: &AppState) -> CommandResult {
    let credentials = signed_in(state)?;
    to_result(
        state
            .calendar
            .submit_preferences(credentials.teacher_id)
            .await?,
    )
}

async fn list(state: &AppState) -> CommandResult {
    let credentials = signed_in(state)?;
    to_result(state.db.list_preferences(credentials.teacher_id).await?)
}

async fn withdraw(state: &AppState, params: &serde_json::Value) -> CommandResult {
    let credentials = signed_in(state)?;
    let params: WithdrawParams = parse_params(params)?;
    let removed = state
        .db
        .withdraw_preference(credentials.teacher_id, params.session_id)
        .await?;
    to_result(json!({ "removed": removed }))
}

async fn export(state: &AppState) -> CommandResult {
    let credentials = signed_in(state)?;
    let teacher = state.db.get_teacher(credentials.teacher_id).await?;
    let preferences = state.db.list_preferences(credentials.teacher_id).await?;

    let mut sessions = HashMap::new();
    for preference in &preferences {
        if let Some(session) = state.db.get_session(preference.session_id).await? {
            sessions.insert(session.id, session);
        }
    }

    to_result(json!({
        "fileName": export_file_name(teacher.as_ref(), Local::now().date_naive()),
        "rows": preferences.len(),
        "csv": preferences_csv(&preferences, &sessions),
    }))
}
