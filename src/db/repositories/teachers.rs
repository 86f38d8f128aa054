use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::{
    db::{
        helpers::{parse_role, to_optional_u32},
        Database,
    },
    models::{Teacher, TeacherId, TeacherRecord},
};

const SELECT_TEACHERS: &str = "SELECT id, first_name, last_name, email, department, role,
        max_sessions_per_week
     FROM teachers";

fn row_to_teacher(row: &Row) -> Result<Teacher> {
    let role: Option<String> = row.get("role")?;
    let record = TeacherRecord {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        department: row.get("department")?,
        role: role.as_deref().map(parse_role).transpose()?,
        max_sessions_per_week: to_optional_u32(
            row.get("max_sessions_per_week")?,
            "max_sessions_per_week",
        )?,
    };
    Ok(Teacher::from(record))
}

pub(crate) fn teacher_exists(conn: &Connection, teacher_id: TeacherId) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM teachers WHERE id = ?1",
            params![teacher_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

impl Database {
    pub async fn upsert_teachers(&self, teachers: Vec<Teacher>) -> Result<usize> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            for teacher in &teachers {
                tx.execute(
                    "INSERT INTO teachers (id, first_name, last_name, email, department, role,
                         max_sessions_per_week)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(id) DO UPDATE SET
                         first_name = excluded.first_name,
                         last_name = excluded.last_name,
                         email = excluded.email,
                         department = excluded.department,
                         role = excluded.role,
                         max_sessions_per_week = excluded.max_sessions_per_week",
                    params![
                        teacher.id,
                        teacher.first_name,
                        teacher.last_name,
                        teacher.email,
                        teacher.department,
                        teacher.role.as_str(),
                        teacher.max_sessions_per_week,
                    ],
                )
                .with_context(|| format!("failed to write teacher {}", teacher.id))?;
            }
            tx.commit()?;
            Ok(teachers.len())
        })
        .await
    }

    pub async fn get_teacher(&self, teacher_id: TeacherId) -> Result<Option<Teacher>> {
        self.execute(move |conn| {
            let sql = format!("{SELECT_TEACHERS} WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![teacher_id])?;
            match rows.next()? {
                Some(row) => row_to_teacher(row).map(Some),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn list_teachers(&self) -> Result<Vec<Teacher>> {
        self.execute(|conn| {
            let sql = format!("{SELECT_TEACHERS} ORDER BY last_name ASC, first_name ASC, id ASC");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            let mut teachers = Vec::new();
            while let Some(row) = rows.next()? {
                teachers.push(row_to_teacher(row)?);
            }
            Ok(teachers)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TeacherRole;

    fn ahmed() -> Teacher {
        Teacher {
            id: 1,
            first_name: "Ahmed".into(),
            last_name: "Ben Ali".into(),
            email: "ahmed.benali@univ-sfax.tn".into(),
            department: "Économie".into(),
            role: TeacherRole::Professor,
            max_sessions_per_week: 10,
        }
    }

    #[tokio::test]
    async fn teachers_round_trip() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_teachers(vec![ahmed()]).await.unwrap();
        assert_eq!(db.get_teacher(1).await.unwrap(), Some(ahmed()));
        assert_eq!(db.list_teachers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_weekly_cap_defaults_to_ten() {
        let db = Database::open_in_memory().unwrap();
        db.execute(|conn| {
            conn.execute(
                "INSERT INTO teachers (id, first_name, last_name) VALUES (4, 'Salma', 'Hammami')",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let teacher = db.get_teacher(4).await.unwrap().unwrap();
        assert_eq!(teacher.max_sessions_per_week, 10);
        assert_eq!(teacher.role, TeacherRole::Assistant);
        assert_eq!(teacher.full_name(), "Salma Hammami");
    }
}
