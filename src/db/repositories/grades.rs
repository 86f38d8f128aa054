use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use crate::{
    db::Database,
    models::{Grade, GradeRecord},
};

fn row_to_grade(row: &Row) -> Result<Grade> {
    Ok(Grade::from(GradeRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        level: row.get("level")?,
        department: row.get("department")?,
    }))
}

pub(crate) fn write_grade(conn: &Connection, grade: &Grade) -> Result<()> {
    conn.execute(
        "INSERT INTO grades (id, name, level, department)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             level = excluded.level,
             department = excluded.department",
        params![grade.id, grade.name, grade.level, grade.department],
    )
    .with_context(|| format!("failed to write grade {}", grade.id))?;
    Ok(())
}

impl Database {
    pub async fn upsert_grades(&self, grades: Vec<Grade>) -> Result<()> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            for grade in &grades {
                write_grade(&tx, grade)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn list_grades(&self) -> Result<Vec<Grade>> {
        self.execute(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, level, department FROM grades ORDER BY id ASC")?;
            let mut rows = stmt.query([])?;
            let mut grades = Vec::new();
            while let Some(row) = rows.next()? {
                grades.push(row_to_grade(row)?);
            }
            Ok(grades)
        })
        .await
    }

    /// Distinct non-empty departments, for filter pickers.
    pub async fn list_departments(&self) -> Result<Vec<String>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT department FROM grades WHERE department IS NOT NULL AND department <> ''
                 UNION
                 SELECT department FROM teachers WHERE department IS NOT NULL AND department <> ''
                 ORDER BY 1",
            )?;
            let departments = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(departments)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::l1_eco;

    #[tokio::test]
    async fn grades_upsert_by_id() {
        let db = Database::open_in_memory().unwrap();
        let mut grade = l1_eco();
        db.upsert_grades(vec![grade.clone()]).await.unwrap();

        grade.name = "L1 Économie".into();
        db.upsert_grades(vec![grade.clone()]).await.unwrap();

        assert_eq!(db.list_grades().await.unwrap(), vec![grade]);
        assert_eq!(db.list_departments().await.unwrap(), vec!["Économie".to_string()]);
    }
}
