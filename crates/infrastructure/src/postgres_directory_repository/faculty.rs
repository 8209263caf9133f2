use super::*;

impl PostgresDirectoryRepository {
    pub(super) async fn create_faculty_impl(&self, member: FacultyMember) -> AppResult<()> {
        let profile = serde_json::to_value(&member).map_err(|error| {
            AppError::Internal(format!("failed to encode faculty profile: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO faculty (id, email, name, profile)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(member.id().as_uuid())
        .bind(member.email().as_str())
        .bind(member.name().as_str())
        .bind(profile)
        .execute(&self.pool)
        .await
        .map_err(|error| email_conflict_or_internal(error, "create faculty member"))?;

        Ok(())
    }

    pub(super) async fn find_faculty_impl(
        &self,
        faculty_id: FacultyId,
    ) -> AppResult<Option<FacultyMember>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT profile
            FROM faculty
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(faculty_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find faculty member: {error}")))?;

        row.map(ProfileRow::into_faculty).transpose()
    }

    pub(super) async fn find_faculty_by_email_impl(
        &self,
        email: &str,
    ) -> AppResult<Option<FacultyMember>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT profile
            FROM faculty
            WHERE email = LOWER($1)
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find faculty member by email: {error}"))
        })?;

        row.map(ProfileRow::into_faculty).transpose()
    }

    pub(super) async fn list_faculty_impl(&self) -> AppResult<Vec<FacultyMember>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT profile
            FROM faculty
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list faculty: {error}")))?;

        rows.into_iter().map(ProfileRow::into_faculty).collect()
    }

    pub(super) async fn save_faculty_impl(&self, member: FacultyMember) -> AppResult<()> {
        let profile = serde_json::to_value(&member).map_err(|error| {
            AppError::Internal(format!("failed to encode faculty profile: {error}"))
        })?;

        let result = sqlx::query(
            r#"
            UPDATE faculty
            SET email = $2, name = $3, profile = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(member.id().as_uuid())
        .bind(member.email().as_str())
        .bind(member.name().as_str())
        .bind(profile)
        .execute(&self.pool)
        .await
        .map_err(|error| email_conflict_or_internal(error, "save faculty member"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "faculty '{}' does not exist",
                member.id()
            )));
        }

        Ok(())
    }
}
