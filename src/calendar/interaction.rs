use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{models::SessionId, selection::ToggleOutcome};

/// Everything the calendar widget can report back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CalendarInteraction {
    #[serde(rename_all = "camelCase")]
    EventClick { session_id: SessionId },
    DateClick { date: NaiveDate },
    #[serde(rename_all = "camelCase")]
    EventDrop {
        session_id: SessionId,
        start: NaiveDateTime,
    },
    #[serde(rename_all = "camelCase")]
    EventResize {
        session_id: SessionId,
        end: NaiveDateTime,
    },
    RangeSelect { start: NaiveDate, end: NaiveDate },
}

impl CalendarInteraction {
    pub fn name(&self) -> &'static str {
        match self {
            CalendarInteraction::EventClick { .. } => "eventClick",
            CalendarInteraction::DateClick { .. } => "dateClick",
            CalendarInteraction::EventDrop { .. } => "eventDrop",
            CalendarInteraction::EventResize { .. } => "eventResize",
            CalendarInteraction::RangeSelect { .. } => "rangeSelect",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InteractionOutcome {
    Toggled { outcome: ToggleOutcome },
    AnchorMoved { anchor: NaiveDate },
    /// Sessions are scheduled by administrators; moving them from the calendar does nothing.
    Ignored,
}
