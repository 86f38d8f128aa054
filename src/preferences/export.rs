//! CSV export of a teacher's preferences.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{PreferenceStatus, Session, SessionId, SessionPreference, Teacher};

const HEADER: &str = "Session,Priorité,Statut\n";

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn status_label(status: PreferenceStatus) -> &'static str {
    match status {
        PreferenceStatus::Pending => "En attente",
        PreferenceStatus::Approved => "Approuvé",
        PreferenceStatus::Rejected => "Rejeté",
    }
}

/// `Économie Générale - L1 Eco (15/01/2024 09:00)`.
pub fn session_label(session: &Session) -> String {
    format!(
        "{} - {} ({} {})",
        session.subject,
        session.grade.name,
        session.date.format("%d/%m/%Y"),
        session.start_time
    )
}

/// One row per preference, in the order given. Sessions missing from `sessions` are
/// written as `Session <id>`.
pub fn preferences_csv(
    preferences: &[SessionPreference],
    sessions: &HashMap<SessionId, Session>,
) -> String {
    let mut csv = String::from(HEADER);
    for preference in preferences {
        let label = sessions
            .get(&preference.session_id)
            .map(session_label)
            .unwrap_or_else(|| format!("Session {}", preference.session_id));
        csv.push_str(&format!(
            "{},{},{}\n",
            csv_quote(&label),
            preference.priority,
            status_label(preference.status)
        ));
    }
    csv
}

pub fn export_file_name(teacher: Option<&Teacher>, on: NaiveDate) -> String {
    let first_name = teacher.map_or("user", |teacher| teacher.first_name.as_str());
    format!("preferences_{}_{}.csv", first_name, on.format("%Y-%m-%d"))
}
