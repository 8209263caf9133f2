use super::*;

impl PostgresDirectoryRepository {
    pub(super) async fn create_student_impl(&self, student: Student) -> AppResult<()> {
        let profile = serde_json::to_value(&student).map_err(|error| {
            AppError::Internal(format!("failed to encode student profile: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO students (id, email, roll_no, profile)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(student.id().as_uuid())
        .bind(student.email().as_str())
        .bind(student.roll_no().as_str())
        .bind(profile)
        .execute(&self.pool)
        .await
        .map_err(|error| email_conflict_or_internal(error, "create student"))?;

        Ok(())
    }

    pub(super) async fn find_student_impl(
        &self,
        student_id: StudentId,
    ) -> AppResult<Option<Student>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT profile
            FROM students
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(student_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find student: {error}")))?;

        row.map(ProfileRow::into_student).transpose()
    }

    pub(super) async fn find_student_by_email_impl(
        &self,
        email: &str,
    ) -> AppResult<Option<Student>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT profile
            FROM students
            WHERE email = LOWER($1)
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find student by email: {error}")))?;

        row.map(ProfileRow::into_student).transpose()
    }

    pub(super) async fn list_students_impl(&self) -> AppResult<Vec<Student>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT profile
            FROM students
            ORDER BY roll_no
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list students: {error}")))?;

        rows.into_iter().map(ProfileRow::into_student).collect()
    }

    pub(super) async fn save_student_impl(&self, student: Student) -> AppResult<()> {
        let profile = serde_json::to_value(&student).map_err(|error| {
            AppError::Internal(format!("failed to encode student profile: {error}"))
        })?;

        let result = sqlx::query(
            r#"
            UPDATE students
            SET email = $2, roll_no = $3, profile = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(student.id().as_uuid())
        .bind(student.email().as_str())
        .bind(student.roll_no().as_str())
        .bind(profile)
        .execute(&self.pool)
        .await
        .map_err(|error| email_conflict_or_internal(error, "save student"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "student '{}' does not exist",
                student.id()
            )));
        }

        Ok(())
    }
}
