use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::{
    errors::FormatError,
    models::{Session, SessionId, SessionStatus},
};

pub const EVENT_CLASS: &str = "session-event";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColorTriple {
    pub background_color: &'static str,
    pub border_color: &'static str,
    pub text_color: &'static str,
}

impl ColorTriple {
    const fn white_on(background_color: &'static str, border_color: &'static str) -> Self {
        Self {
            background_color,
            border_color,
            text_color: "#ffffff",
        }
    }
}

pub const SELECTED_COLORS: ColorTriple = ColorTriple::white_on("#1976d2", "#1565c0");
pub const AVAILABLE_COLORS: ColorTriple = ColorTriple::white_on("#4caf50", "#388e3c");
pub const SATURATED_COLORS: ColorTriple = ColorTriple::white_on("#ff9800", "#f57c00");
pub const FULL_COLORS: ColorTriple = ColorTriple::white_on("#f44336", "#d32f2f");
pub const CANCELLED_COLORS: ColorTriple = ColorTriple::white_on("#9e9e9e", "#616161");

/// Fields the calendar widget reads back from an event, plus the session itself.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub session: Session,
    pub status: SessionStatus,
    pub supervisors_count: u32,
    pub required_supervisors: u32,
    pub available: bool,
    pub location: String,
    pub grade: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(flatten)]
    pub colors: ColorTriple,
    pub class_names: Vec<String>,
    pub tooltip: String,
    pub extended_props: EventDetails,
}

impl CalendarEvent {
    pub fn session_id(&self) -> SessionId {
        self.extended_props.session.id
    }
}

pub fn parse_wall_clock(
    session_id: SessionId,
    field: &'static str,
    value: &str,
) -> Result<NaiveTime, FormatError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| FormatError {
        session_id,
        field,
        value: value.to_string(),
    })
}

fn combine(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

pub fn event_title(session: &Session) -> String {
    format!(
        "{} - {} ({}/{})",
        session.subject,
        session.grade.name,
        session.current_supervisors,
        session.required_supervisors
    )
}

pub fn event_colors(status: SessionStatus, is_selected: bool) -> ColorTriple {
    if is_selected {
        return SELECTED_COLORS;
    }

    match status {
        SessionStatus::Available => AVAILABLE_COLORS,
        SessionStatus::Saturated => SATURATED_COLORS,
        SessionStatus::Full => FULL_COLORS,
        SessionStatus::Cancelled => CANCELLED_COLORS,
    }
}

pub fn event_classes(session: &Session, is_selected: bool) -> Vec<String> {
    let mut classes = vec![EVENT_CLASS.to_string()];

    if is_selected {
        classes.push("selected".into());
    }

    classes.push(session.status.as_str().to_ascii_lowercase());

    if !session.available {
        classes.push("unavailable".into());
    }

    if session.has_enough_supervisors() {
        classes.push("saturated".into());
    }

    classes
}

pub fn session_tooltip(session: &Session) -> String {
    format!(
        "{subject}\nGrade: {grade}\nTime: {start} - {end}\nLocation: {location}\nSupervisors: {current}/{required}\nStatus: {status}",
        subject = session.subject,
        grade = session.grade.name,
        start = session.start_time,
        end = session.end_time,
        location = session.location,
        current = session.current_supervisors,
        required = session.required_supervisors,
        status = session.status.as_str(),
    )
}

/// Builds the displayable event for `session`. Pure: the same inputs always give the same event.
pub fn project(session: &Session, is_selected: bool) -> Result<CalendarEvent, FormatError> {
    let start_time = parse_wall_clock(session.id, "startTime", &session.start_time)?;
    let end_time = parse_wall_clock(session.id, "endTime", &session.end_time)?;

    Ok(CalendarEvent {
        id: session.id.to_string(),
        title: event_title(session),
        start: combine(session.date, start_time),
        end: combine(session.date, end_time),
        colors: event_colors(session.status, is_selected),
        class_names: event_classes(session, is_selected),
        tooltip: session_tooltip(session),
        extended_props: EventDetails {
            session: session.clone(),
            status: session.status,
            supervisors_count: session.current_supervisors,
            required_supervisors: session.required_supervisors,
            available: session.available,
            location: session.location.clone(),
            grade: session.grade.name.clone(),
        },
    })
}

/// Projects every session, stopping at the first record with a malformed time.
pub fn project_all<F>(sessions: &[Session], is_selected: F) -> Result<Vec<CalendarEvent>, FormatError>
where
    F: Fn(&Session) -> bool,
{
    sessions
        .iter()
        .map(|session| project(session, is_selected(session)))
        .collect()
}
