//! Portal account ports and the login application service.
//!
//! Follows OWASP guidance for authentication: failures are generic and
//! indistinguishable (unknown email, wrong password, locked account), and
//! the hasher runs even when no account matches so response timing does not
//! reveal which emails exist.

use std::sync::Arc;

use async_trait::async_trait;
use clearslip_core::{AppResult, PortalRole, UserIdentity};
use clearslip_domain::{AccountId, AuditAction, EmailAddress, validate_password};

use crate::audit_ports::{AuditEvent, AuditRepository};
use crate::role_gate::require_portal_role;

/// Portal account record returned by repository queries.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    /// Unique account identifier.
    pub id: AccountId,
    /// Canonical lowercased email address.
    pub email: String,
    /// Display name shown in the portal header.
    pub display_name: String,
    /// Portal role resolved at login.
    pub role: PortalRole,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Number of consecutive failed login attempts.
    pub failed_login_count: i32,
    /// Account is locked until this time, if set.
    pub locked_until: Option<chrono::DateTime<chrono::Utc>>,
}

/// Repository port for portal account persistence.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Finds an account by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<AccountRecord>>;

    /// Creates a new account record. Conflict on duplicate email.
    async fn create(&self, account: AccountRecord) -> AppResult<()>;

    /// Increments the failed login counter and applies the lockout policy.
    async fn record_failed_login(&self, account_id: AccountId) -> AppResult<()>;

    /// Resets the failed login counter and removes any account lock.
    async fn reset_failed_logins(&self, account_id: AccountId) -> AppResult<()>;
}

/// Port for password hashing and verification.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password for storage.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, stored_hash: &str) -> AppResult<bool>;
}

/// Outcome of a login attempt.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// Credentials accepted; the identity goes into the session.
    Authenticated(UserIdentity),
    /// Credentials declined for an undisclosed reason.
    Failed,
}

/// Input payload for account registration.
#[derive(Debug, Clone)]
pub struct RegisterAccountInput {
    /// Login email.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Portal role.
    pub role: PortalRole,
    /// Plaintext password, validated and hashed before storage.
    pub password: String,
}

/// Application service for login and account registration.
#[derive(Clone)]
pub struct AuthService {
    account_repository: Arc<dyn AccountRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AuthService {
    /// Creates the service from repository implementations.
    #[must_use]
    pub fn new(
        account_repository: Arc<dyn AccountRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            account_repository,
            password_hasher,
            audit_repository,
        }
    }

    /// Authenticates an email/password pair.
    ///
    /// Returns `AuthOutcome::Failed` with no further detail for any failure.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthOutcome> {
        let Ok(normalized) = EmailAddress::new(email) else {
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Failed);
        };

        let account = self
            .account_repository
            .find_by_email(normalized.as_str())
            .await?;

        let Some(account) = account else {
            // Hash anyway so unknown emails cost the same as known ones.
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Failed);
        };

        if let Some(locked_until) = account.locked_until
            && chrono::Utc::now() < locked_until
        {
            let _ = self.password_hasher.hash_password(password);

            self.append_login_event(
                Some(account.id),
                AuditAction::LoginFailed,
                "account_locked",
            )
            .await?;

            return Ok(AuthOutcome::Failed);
        }

        let password_valid = self
            .password_hasher
            .verify_password(password, account.password_hash.as_str())?;

        if !password_valid {
            self.account_repository
                .record_failed_login(account.id)
                .await?;

            self.append_login_event(
                Some(account.id),
                AuditAction::LoginFailed,
                "invalid_password",
            )
            .await?;

            return Ok(AuthOutcome::Failed);
        }

        self.account_repository
            .reset_failed_logins(account.id)
            .await?;

        self.append_login_event(Some(account.id), AuditAction::LoginSucceeded, "success")
            .await?;

        Ok(AuthOutcome::Authenticated(UserIdentity::new(
            account.id.to_string(),
            account.display_name,
            account.email,
            account.role,
        )))
    }

    /// Records a logout in the audit trail.
    pub async fn record_logout(&self, actor: &UserIdentity) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: Some(actor.subject().to_owned()),
                action: AuditAction::LoggedOut,
                resource_type: "account".to_owned(),
                resource_id: actor.subject().to_owned(),
                detail: None,
            })
            .await
    }

    /// Registers a new portal account.
    pub async fn register_account(
        &self,
        actor: &UserIdentity,
        input: RegisterAccountInput,
    ) -> AppResult<AccountId> {
        require_portal_role(actor, PortalRole::Admin)?;

        let email = EmailAddress::new(input.email)?;
        validate_password(input.password.as_str())?;

        let account = AccountRecord {
            id: AccountId::new(),
            email: email.as_str().to_owned(),
            display_name: input.display_name,
            role: input.role,
            password_hash: self.password_hasher.hash_password(input.password.as_str())?,
            failed_login_count: 0,
            locked_until: None,
        };
        let account_id = account.id;

        self.account_repository.create(account).await?;
        Ok(account_id)
    }

    async fn append_login_event(
        &self,
        subject: Option<AccountId>,
        action: AuditAction,
        outcome: &str,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: subject.map(|id| id.to_string()),
                action,
                resource_type: "account".to_owned(),
                resource_id: subject.map(|id| id.to_string()).unwrap_or_default(),
                detail: Some(outcome.to_owned()),
            })
            .await
    }
}

#[cfg(test)]
mod tests;
