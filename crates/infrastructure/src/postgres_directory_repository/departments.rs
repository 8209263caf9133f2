use clearslip_domain::FacultyRole;

use super::*;

impl PostgresDirectoryRepository {
    pub(super) async fn create_department_impl(&self, department: Department) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO departments (dept_id, dept_name, hod_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(department.dept_id().as_str())
        .bind(department.dept_name().as_str())
        .bind(department.hod_id().map(|id| id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(ref database_error) = error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!(
                    "department '{}' already exists",
                    department.dept_id()
                ));
            }

            AppError::Internal(format!("failed to create department: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn find_department_impl(
        &self,
        dept_id: &DepartmentId,
    ) -> AppResult<Option<Department>> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            r#"
            SELECT dept_id, dept_name, hod_id
            FROM departments
            WHERE dept_id = $1
            LIMIT 1
            "#,
        )
        .bind(dept_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find department: {error}")))?;

        row.map(DepartmentRow::into_department).transpose()
    }

    pub(super) async fn list_departments_impl(&self) -> AppResult<Vec<Department>> {
        let rows = sqlx::query_as::<_, DepartmentRow>(
            r#"
            SELECT dept_id, dept_name, hod_id
            FROM departments
            ORDER BY dept_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list departments: {error}")))?;

        rows.into_iter()
            .map(DepartmentRow::into_department)
            .collect()
    }

    /// Demotes the prior holder, promotes the new one and repoints the
    /// department in a single transaction, with the touched rows locked.
    pub(super) async fn replace_hod_impl(
        &self,
        dept_id: &DepartmentId,
        new_hod: FacultyId,
    ) -> AppResult<Option<FacultyId>> {
        let mut tx = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start HOD replacement: {error}"))
        })?;

        let row = sqlx::query_as::<_, DepartmentRow>(
            r#"
            SELECT dept_id, dept_name, hod_id
            FROM departments
            WHERE dept_id = $1
            FOR UPDATE
            "#,
        )
        .bind(dept_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock department: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("department '{dept_id}' does not exist")))?;

        let prior = row.hod_id.map(FacultyId::from_uuid);

        if let Some(prior_id) = prior
            && prior_id != new_hod
        {
            set_hod_role(&mut tx, prior_id, false).await?;
        }

        set_hod_role(&mut tx, new_hod, true).await?;

        sqlx::query(
            r#"
            UPDATE departments
            SET hod_id = $2, updated_at = now()
            WHERE dept_id = $1
            "#,
        )
        .bind(dept_id.as_str())
        .bind(new_hod.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to repoint department: {error}")))?;

        tx.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit HOD replacement: {error}"))
        })?;

        Ok(prior)
    }
}

async fn set_hod_role(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    faculty_id: FacultyId,
    grant: bool,
) -> AppResult<()> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT profile
        FROM faculty
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(faculty_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|error| AppError::Internal(format!("failed to lock faculty member: {error}")))?
    .ok_or_else(|| AppError::NotFound(format!("faculty '{faculty_id}' does not exist")))?;

    let mut member = row.into_faculty()?;
    if grant {
        member.grant_role(FacultyRole::Hod);
    } else {
        member.revoke_role(FacultyRole::Hod);
    }

    let profile = serde_json::to_value(&member).map_err(|error| {
        AppError::Internal(format!("failed to encode faculty profile: {error}"))
    })?;

    sqlx::query(
        r#"
        UPDATE faculty
        SET profile = $2, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(faculty_id.as_uuid())
    .bind(profile)
    .execute(&mut **tx)
    .await
    .map_err(|error| AppError::Internal(format!("failed to update faculty roles: {error}")))?;

    Ok(())
}
