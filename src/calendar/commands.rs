use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    ipc::{parse_params, to_result, CommandError, CommandResult, Request},
    models::SessionId,
    viewport::{Direction, SessionFilter, ViewKind},
    AppState,
};

use super::{CalendarController, CalendarInteraction};

fn controller_from_state(state: &AppState) -> CalendarController {
    state.calendar.clone()
}

#[derive(Deserialize)]
struct NavigateParams {
    direction: String,
}

#[derive(Deserialize)]
struct ViewParams {
    view: String,
}

#[derive(Deserialize)]
struct FilterParams {
    #[serde(default)]
    filter: SessionFilter,
}

#[derive(Deserialize)]
struct AnchorParams {
    date: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleParams {
    session_id: SessionId,
}

#[derive(Deserialize)]
struct InteractionParams {
    interaction: CalendarInteraction,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewDescriptor {
    name: ViewKind,
    widget_name: &'static str,
    title: &'static str,
}

fn parse_view(name: &str) -> Result<ViewKind, CommandError> {
    ViewKind::parse(name).ok_or_else(|| CommandError::bad_params(format!("unknown view '{name}'")))
}

fn parse_direction(value: &str) -> Result<Direction, CommandError> {
    Direction::parse(value)
        .ok_or_else(|| CommandError::bad_params(format!("unknown direction '{value}'")))
}

pub async fn try_handle(state: &AppState, req: &Request) -> Option<CommandResult> {
    let controller = controller_from_state(state);

    let result = match req.method.as_str() {
        "calendar.snapshot" => to_result(controller.snapshot()),
        "calendar.events" => to_result(controller.visible_events().await),
        "calendar.views" => to_result(
            ViewKind::ALL
                .iter()
                .map(|view| ViewDescriptor {
                    name: *view,
                    widget_name: view.widget_name(),
                    title: view.title(),
                })
                .collect::<Vec<_>>(),
        ),
        "calendar.refresh" => match controller.refresh().await {
            Ok(outcome) => to_result(outcome),
            Err(err) => Err(err.into()),
        },
        "calendar.navigate" => navigate(&controller, &req.params).await,
        "calendar.setView" => set_view(&controller, &req.params).await,
        "calendar.setFilter" => set_filter(&controller, &req.params).await,
        "calendar.setAnchor" => set_anchor(&controller, &req.params).await,
        "calendar.today" => match controller.go_to_today().await {
            Ok(outcome) => to_result(outcome),
            Err(err) => Err(err.into()),
        },
        "calendar.toggle" => toggle(&controller, &req.params).await,
        "calendar.clearSelection" => {
            controller.clear_selection().await;
            to_result(controller.snapshot())
        }
        "calendar.interact" => interact(&controller, &req.params).await,
        _ => return None,
    };

    Some(result)
}

async fn navigate(controller: &CalendarController, params: &serde_json::Value) -> CommandResult {
    let params: NavigateParams = parse_params(params)?;
    let direction = parse_direction(&params.direction)?;
    to_result(controller.navigate(direction).await?)
}

async fn set_view(controller: &CalendarController, params: &serde_json::Value) -> CommandResult {
    let params: ViewParams = parse_params(params)?;
    let view = parse_view(&params.view)?;
    to_result(controller.set_view(view).await?)
}

async fn set_filter(controller: &CalendarController, params: &serde_json::Value) -> CommandResult {
    let params: FilterParams = parse_params(params)?;
    to_result(controller.set_filter(params.filter).await?)
}

async fn set_anchor(controller: &CalendarController, params: &serde_json::Value) -> CommandResult {
    let params: AnchorParams = parse_params(params)?;
    to_result(controller.set_anchor(params.date).await?)
}

async fn toggle(controller: &CalendarController, params: &serde_json::Value) -> CommandResult {
    let params: ToggleParams = parse_params(params)?;
    to_result(controller.toggle_session(params.session_id).await?)
}

async fn interact(controller: &CalendarController, params: &serde_json::Value) -> CommandResult {
    let params: InteractionParams = parse_params(params)?;
    to_result(controller.handle_interaction(params.interaction).await?)
}
