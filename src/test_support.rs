use chrono::NaiveDate;

use crate::models::{Grade, Session, SessionId, SessionStatus};

pub fn l1_eco() -> Grade {
    Grade {
        id: 1,
        name: "L1 Eco".into(),
        level: "Licence".into(),
        department: "Économie".into(),
    }
}

/// A Monday-morning session with one of two supervisors in place.
pub fn session(id: SessionId, status: SessionStatus, available: bool) -> Session {
    Session {
        id,
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        start_time: "09:00".into(),
        end_time: "11:00".into(),
        subject: "Économie Générale".into(),
        grade: l1_eco(),
        required_supervisors: 2,
        current_supervisors: 1,
        max_supervisors: 3,
        location: "Salle A101".into(),
        status,
        available,
    }
}

pub fn session_on(id: SessionId, date: NaiveDate) -> Session {
    Session {
        date,
        ..session(id, SessionStatus::Available, true)
    }
}
