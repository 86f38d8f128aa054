//! JSON-lines request/response protocol spoken over stdin/stdout.

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::{
    admin, calendar,
    errors::{PlannerError, ValidationError},
    log_debug, log_warn, preferences, settings_commands, AppState,
};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub code: String,
    pub message: String,
}

impl CommandError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }
}

impl From<PlannerError> for CommandError {
    fn from(err: PlannerError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<ValidationError> for CommandError {
    fn from(err: ValidationError) -> Self {
        PlannerError::from(err).into()
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        Self::new("internal", format!("{err:#}"))
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_params(err.to_string())
    }
}

pub type CommandResult = Result<Value, CommandError>;

pub fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T, CommandError> {
    let params = if params.is_null() { json!({}) } else { params.clone() };
    Ok(serde_json::from_value(params)?)
}

pub fn to_result<T: serde::Serialize>(value: T) -> CommandResult {
    Ok(serde_json::to_value(value)?)
}

pub fn ok(id: &str, result: Value) -> Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(id: &str, code: &str, message: impl Into<String>) -> Value {
    json!({
        "id": id,
        "ok": false,
        "error": {
            "code": code,
            "message": message.into(),
        },
    })
}

pub async fn handle_request(state: &AppState, req: Request) -> Value {
    log_debug!("ipc request {} {}", req.id, req.method);

    let outcome = if let Some(result) = calendar::commands::try_handle(state, &req).await {
        result
    } else if let Some(result) = preferences::commands::try_handle(state, &req).await {
        result
    } else if let Some(result) = admin::commands::try_handle(state, &req).await {
        result
    } else if let Some(result) = settings_commands::try_handle(state, &req) {
        result
    } else {
        return err(
            &req.id,
            "not_implemented",
            format!("unknown method: {}", req.method),
        );
    };

    match outcome {
        Ok(result) => ok(&req.id, result),
        Err(error) => {
            log_warn!("{} failed: {} ({})", req.method, error.message, error.code);
            err(&req.id, &error.code, error.message)
        }
    }
}

/// Parses and answers one input line. Blank lines produce no output.
pub async fn handle_line(state: &AppState, line: &str) -> Option<Value> {
    if line.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Request>(line) {
        Ok(req) => Some(handle_request(state, req).await),
        Err(error) => Some(json!({
            "ok": false,
            "error": { "code": "bad_json", "message": error.to_string() }
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_has_code_and_message_only() {
        let value = err("7", "bad_params", "missing date");
        assert_eq!(value["id"], "7");
        assert_eq!(value["ok"], false);
        assert_eq!(
            value["error"],
            json!({ "code": "bad_params", "message": "missing date" })
        );
    }

    #[test]
    fn planner_errors_keep_their_codes() {
        let error = CommandError::from(ValidationError::EmptySelection);
        assert_eq!(error.code, "validation.empty_selection");
    }

    #[test]
    fn null_params_read_as_empty_object() {
        #[derive(Deserialize)]
        struct Empty {
            #[serde(default)]
            flag: bool,
        }
        let parsed: Empty = parse_params(&Value::Null).unwrap();
        assert!(!parsed.flag);
    }
}
