//! The January 2024 demo faculty: six teachers, six grades, six sessions.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::{
    db::Database,
    models::{
        GradeRecord, Session, SessionRecord, SessionStatus, Teacher, TeacherRecord, TeacherRole,
    },
};

pub struct DemoDataset {
    pub teachers: Vec<Teacher>,
    pub sessions: Vec<Session>,
    /// Teacher id, session id.
    pub assignments: Vec<(i64, i64)>,
}

fn grade(id: i64, name: &str, level: &str, department: &str) -> GradeRecord {
    GradeRecord {
        id,
        name: name.into(),
        level: Some(level.into()),
        department: Some(department.into()),
    }
}

#[allow(clippy::too_many_arguments)]
fn session(
    id: i64,
    day: u32,
    (start, end): (&str, &str),
    subject: &str,
    grade: GradeRecord,
    location: &str,
    (current, required, max): (u32, u32, u32),
    status: Option<SessionStatus>,
) -> Result<Session> {
    let date = NaiveDate::from_ymd_opt(2024, 1, day)
        .with_context(|| format!("invalid demo date 2024-01-{day}"))?;
    SessionRecord {
        id,
        date,
        start_time: start.into(),
        end_time: end.into(),
        subject: Some(subject.into()),
        grade: Some(grade),
        required_supervisors: Some(required),
        current_supervisors: Some(current),
        max_supervisors: Some(max),
        location: Some(location.into()),
        status,
        available: None,
    }
    .resolve()
}

fn teacher(
    id: i64,
    first_name: &str,
    last_name: &str,
    department: &str,
    role: TeacherRole,
    max_sessions_per_week: Option<u32>,
) -> Teacher {
    let email = format!(
        "{}.{}@univ-sfax.tn",
        first_name.to_lowercase(),
        last_name.to_lowercase().replace(' ', "")
    );
    Teacher::from(TeacherRecord {
        id,
        first_name: first_name.into(),
        last_name: last_name.into(),
        email: Some(email),
        department: Some(department.into()),
        role: Some(role),
        max_sessions_per_week,
    })
}

pub fn demo_dataset() -> Result<DemoDataset> {
    let teachers = vec![
        teacher(1, "Ahmed", "Ben Ali", "Économie", TeacherRole::Professor, Some(10)),
        teacher(2, "Fatma", "Khelil", "Gestion", TeacherRole::AssistantProfessor, Some(8)),
        teacher(3, "Mohamed", "Trabelsi", "Économie", TeacherRole::Professor, Some(12)),
        teacher(4, "Salma", "Hammami", "Gestion", TeacherRole::AssistantProfessor, None),
        teacher(5, "Karim", "Jebali", "Finance", TeacherRole::Assistant, Some(8)),
        teacher(6, "Amina", "Bouaziz", "Finance", TeacherRole::AssistantProfessor, Some(10)),
    ];

    let sessions = vec![
        session(
            1,
            15,
            ("09:00", "11:00"),
            "Économie Générale",
            grade(1, "L1 Eco", "Licence", "Économie"),
            "Salle A101",
            (1, 2, 2),
            None,
        )?,
        session(
            2,
            16,
            ("14:00", "16:00"),
            "Comptabilité",
            grade(2, "L2 Gestion", "Licence", "Gestion"),
            "Salle B205",
            (2, 2, 2),
            None,
        )?,
        session(
            3,
            17,
            ("10:00", "12:00"),
            "Mathématiques Financières",
            grade(3, "M1 Finance", "Master", "Finance"),
            "Salle C301",
            (0, 2, 3),
            None,
        )?,
        session(
            4,
            18,
            ("08:00", "10:00"),
            "Marketing",
            grade(4, "L3 Gestion", "Licence", "Gestion"),
            "Salle D102",
            (0, 1, 2),
            None,
        )?,
        session(
            5,
            19,
            ("13:00", "15:00"),
            "Statistiques",
            grade(5, "L2 Eco", "Licence", "Économie"),
            "Salle E201",
            (2, 2, 3),
            None,
        )?,
        session(
            6,
            20,
            ("11:00", "13:00"),
            "Gestion de Projet",
            grade(6, "M2 Gestion", "Master", "Gestion"),
            "Salle F103",
            (0, 2, 3),
            Some(SessionStatus::Cancelled),
        )?,
    ];

    Ok(DemoDataset {
        teachers,
        sessions,
        assignments: vec![(1, 1), (2, 2), (3, 5)],
    })
}

/// Loads the demo data when the database has no sessions yet. Returns whether it did.
pub async fn seed_if_empty(db: &Database) -> Result<bool> {
    if db.count_sessions().await? > 0 {
        return Ok(false);
    }

    let dataset = demo_dataset()?;
    db.upsert_teachers(dataset.teachers).await?;
    db.upsert_sessions(dataset.sessions).await?;
    for (teacher_id, session_id) in dataset.assignments {
        db.assign_sessions(teacher_id, vec![session_id]).await?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_sessions_resolve_their_status() {
        let dataset = demo_dataset().unwrap();
        let statuses: Vec<_> = dataset.sessions.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                SessionStatus::Available,
                SessionStatus::Full,
                SessionStatus::Available,
                SessionStatus::Available,
                SessionStatus::Saturated,
                SessionStatus::Cancelled,
            ]
        );
        assert!(!dataset.sessions[1].available);
        assert!(!dataset.sessions[5].available);
        assert_eq!(dataset.teachers[3].max_sessions_per_week, 10);
        assert_eq!(dataset.teachers[0].email, "ahmed.benali@univ-sfax.tn");
    }

    #[tokio::test]
    async fn seeding_runs_once() {
        let db = Database::open_in_memory().unwrap();
        assert!(seed_if_empty(&db).await.unwrap());
        assert!(!seed_if_empty(&db).await.unwrap());
        assert_eq!(db.count_sessions().await.unwrap(), 6);
        assert_eq!(db.list_teachers().await.unwrap().len(), 6);
        assert_eq!(db.assigned_session_ids(3).await.unwrap(), vec![5]);
    }
}
