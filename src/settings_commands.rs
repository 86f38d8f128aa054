//! Reading and updating `settings.json` over IPC.
//!
//! Calendar defaults and the priority policy are read when the process starts; updates
//! are persisted and apply from the next start.

use serde::Deserialize;
use serde_json::json;

use crate::{
    ipc::{parse_params, CommandResult, Request},
    settings::{CalendarSettings, SubmissionSettings},
    AppState,
};

#[derive(Deserialize)]
struct CalendarParams {
    calendar: CalendarSettings,
}

#[derive(Deserialize)]
struct SubmissionParams {
    submission: SubmissionSettings,
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<CommandResult> {
    let result = match req.method.as_str() {
        "settings.get" => get_settings(state),
        "settings.updateCalendar" => update_calendar(state, &req.params),
        "settings.updateSubmission" => update_submission(state, &req.params),
        _ => return None,
    };
    Some(result)
}

fn get_settings(state: &AppState) -> CommandResult {
    Ok(json!({
        "calendar": state.settings.calendar(),
        "submission": state.settings.submission(),
        "signedIn": state.credentials.current().is_some(),
    }))
}

fn update_calendar(state: &AppState, params: &serde_json::Value) -> CommandResult {
    let params: CalendarParams = parse_params(params)?;
    state.settings.update_calendar(params.calendar.clone())?;
    Ok(json!({ "calendar": params.calendar }))
}

fn update_submission(state: &AppState, params: &serde_json::Value) -> CommandResult {
    let params: SubmissionParams = parse_params(params)?;
    state.settings.update_submission(params.submission.clone())?;
    Ok(json!({ "submission": params.submission }))
}
