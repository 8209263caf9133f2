use super::*;

impl PostgresDirectoryRepository {
    pub(super) async fn find_account_by_email_impl(
        &self,
        email: &str,
    ) -> AppResult<Option<AccountRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, display_name, role, password_hash,
                   failed_login_count, locked_until
            FROM accounts
            WHERE email = LOWER($1)
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find account by email: {error}")))?;

        row.map(AccountRow::into_account).transpose()
    }

    pub(super) async fn create_account_impl(&self, account: AccountRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, display_name, role, password_hash)
            VALUES ($1, LOWER($2), $3, $4, $5)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(account.email)
        .bind(account.display_name)
        .bind(account.role.as_str())
        .bind(account.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|error| email_conflict_or_internal(error, "create account"))?;

        Ok(())
    }

    pub(super) async fn record_failed_login_impl(&self, account_id: AccountId) -> AppResult<()> {
        // Exponential lockout: 2^(n-3) seconds from the 3rd consecutive
        // failure, 24 hours from the 10th.
        sqlx::query(
            r#"
            UPDATE accounts
            SET failed_login_count = failed_login_count + 1,
                locked_until = CASE
                    WHEN failed_login_count + 1 >= 10
                        THEN now() + interval '24 hours'
                    WHEN failed_login_count + 1 >= 3
                        THEN now() + make_interval(secs => power(2, LEAST(failed_login_count + 1 - 3, 10))::int)
                    ELSE NULL
                END,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record failed login: {error}")))?;

        Ok(())
    }

    pub(super) async fn reset_failed_logins_impl(&self, account_id: AccountId) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET failed_login_count = 0, locked_until = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to reset failed logins: {error}")))?;

        Ok(())
    }
}
