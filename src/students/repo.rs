use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::UpsertStudentRequest;
use super::repo_types::{HistoryRow, Student};

impl Student {
    /// Insert-or-replace keyed by email. Every profile column is written,
    /// so omitted request fields reset to their defaults (whole-document
    /// replace, not a patch).
    pub async fn upsert_by_email(
        db: &PgPool,
        email: &str,
        name: &str,
        req: &UpsertStudentRequest,
    ) -> anyhow::Result<Student> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students
                (id, name, email, preferences, allergies, nutrition_goals, activity_level)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE SET
                name            = EXCLUDED.name,
                preferences     = EXCLUDED.preferences,
                allergies       = EXCLUDED.allergies,
                nutrition_goals = EXCLUDED.nutrition_goals,
                activity_level  = EXCLUDED.activity_level,
                updated_at      = now()
            RETURNING id, name, email, preferences, allergies, nutrition_goals,
                      activity_level, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(Json(&req.preferences))
        .bind(&req.allergies)
        .bind(Json(&req.nutrition_goals))
        .bind(req.activity_level)
        .fetch_one(db)
        .await?;
        Ok(student)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, name, email, preferences, allergies, nutrition_goals,
                   activity_level, created_at, updated_at
            FROM students
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(student)
    }

    /// Summary listing: history intentionally omitted.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, name, email, preferences, allergies, nutrition_goals,
                   activity_level, created_at, updated_at
            FROM students
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(students)
    }

    /// History rows in append order. In-place feedback updates refresh the
    /// timestamp but do not move the entry.
    pub async fn history_for(db: &PgPool, student_id: Uuid) -> anyhow::Result<Vec<HistoryRow>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT meal_id, liked, consumed_at
            FROM meal_history
            WHERE student_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(student_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Update-in-place-or-append: feedback for a meal already in the
    /// history overwrites that entry; otherwise a new entry is appended.
    pub async fn record_feedback(
        db: &PgPool,
        student_id: Uuid,
        meal_id: Uuid,
        liked: bool,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO meal_history (student_id, meal_id, liked, consumed_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (student_id, meal_id) DO UPDATE SET
                liked       = EXCLUDED.liked,
                consumed_at = now()
            "#,
        )
        .bind(student_id)
        .bind(meal_id)
        .bind(liked)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Destroy the profile (history rows go with it). Returns false for an
    /// unknown email.
    pub async fn delete_by_email(db: &PgPool, email: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM students WHERE email = $1"#)
            .bind(email)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
