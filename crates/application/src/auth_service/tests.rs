use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use clearslip_core::{AppResult, PortalRole, UserIdentity};
use clearslip_domain::AccountId;

use crate::audit_ports::{AuditEvent, AuditRepository};

use super::{
    AccountRecord, AccountRepository, AuthOutcome, AuthService, PasswordHasher,
    RegisterAccountInput,
};

#[derive(Default)]
struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }

    async fn list_recent(&self, limit: i64) -> AppResult<Vec<AuditEvent>> {
        let events = self.events.lock().await;
        Ok(events.iter().rev().take(limit as usize).cloned().collect())
    }
}

#[derive(Default)]
struct FakeAccountRepository {
    accounts: Mutex<HashMap<String, AccountRecord>>,
}

#[async_trait]
impl AccountRepository for FakeAccountRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<AccountRecord>> {
        Ok(self.accounts.lock().await.get(email).cloned())
    }

    async fn create(&self, account: AccountRecord) -> AppResult<()> {
        self.accounts
            .lock()
            .await
            .insert(account.email.clone(), account);
        Ok(())
    }

    async fn record_failed_login(&self, account_id: AccountId) -> AppResult<()> {
        let mut accounts = self.accounts.lock().await;
        if let Some(account) = accounts.values_mut().find(|a| a.id == account_id) {
            account.failed_login_count += 1;
            if account.failed_login_count >= 5 {
                account.locked_until = Some(Utc::now() + Duration::minutes(15));
            }
        }
        Ok(())
    }

    async fn reset_failed_logins(&self, account_id: AccountId) -> AppResult<()> {
        let mut accounts = self.accounts.lock().await;
        if let Some(account) = accounts.values_mut().find(|a| a.id == account_id) {
            account.failed_login_count = 0;
            account.locked_until = None;
        }
        Ok(())
    }
}

/// Transparent hasher so tests can assert without real Argon2 cost.
struct FakeHasher;

impl PasswordHasher for FakeHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, stored_hash: &str) -> AppResult<bool> {
        Ok(stored_hash == format!("hashed:{password}"))
    }
}

fn account(email: &str, role: PortalRole) -> AccountRecord {
    AccountRecord {
        id: AccountId::new(),
        email: email.to_owned(),
        display_name: "Someone".to_owned(),
        role,
        password_hash: "hashed:correct-horse-battery".to_owned(),
        failed_login_count: 0,
        locked_until: None,
    }
}

async fn service_with(accounts: Vec<AccountRecord>) -> (AuthService, Arc<FakeAccountRepository>) {
    let repository = Arc::new(FakeAccountRepository::default());
    for entry in accounts {
        let _ = repository.create(entry).await;
    }

    let service = AuthService::new(
        repository.clone(),
        Arc::new(FakeHasher),
        Arc::new(FakeAuditRepository::default()),
    );
    (service, repository)
}

#[tokio::test]
async fn valid_credentials_yield_an_identity() {
    let (service, _) = service_with(vec![account("asha@students.college.ac.in", PortalRole::Student)]).await;

    let outcome = service
        .login("Asha@Students.College.AC.IN", "correct-horse-battery")
        .await;

    let role = match outcome {
        Ok(AuthOutcome::Authenticated(identity)) => Some(identity.role()),
        _ => None,
    };
    assert_eq!(role, Some(PortalRole::Student));
}

#[tokio::test]
async fn failures_are_indistinguishable() {
    let (service, _) = service_with(vec![account("asha@students.college.ac.in", PortalRole::Student)]).await;

    for (email, password) in [
        ("unknown@college.ac.in", "correct-horse-battery"),
        ("asha@students.college.ac.in", "wrong-password-here"),
        ("not-an-email", "correct-horse-battery"),
    ] {
        let outcome = service.login(email, password).await;
        assert!(matches!(outcome, Ok(AuthOutcome::Failed)));
    }
}

#[tokio::test]
async fn repeated_failures_lock_the_account() {
    let (service, repository) =
        service_with(vec![account("asha@students.college.ac.in", PortalRole::Student)]).await;

    for _ in 0..5 {
        let _ = service
            .login("asha@students.college.ac.in", "wrong-password-here")
            .await;
    }

    let locked = repository
        .find_by_email("asha@students.college.ac.in")
        .await
        .ok()
        .flatten()
        .and_then(|a| a.locked_until);
    assert!(locked.is_some());

    // Even the correct password now fails, generically.
    let outcome = service
        .login("asha@students.college.ac.in", "correct-horse-battery")
        .await;
    assert!(matches!(outcome, Ok(AuthOutcome::Failed)));
}

#[tokio::test]
async fn successful_login_resets_the_failure_counter() {
    let (service, repository) =
        service_with(vec![account("asha@students.college.ac.in", PortalRole::Student)]).await;

    for _ in 0..3 {
        let _ = service
            .login("asha@students.college.ac.in", "wrong-password-here")
            .await;
    }

    let outcome = service
        .login("asha@students.college.ac.in", "correct-horse-battery")
        .await;
    assert!(matches!(outcome, Ok(AuthOutcome::Authenticated(_))));

    let count = repository
        .find_by_email("asha@students.college.ac.in")
        .await
        .ok()
        .flatten()
        .map(|a| a.failed_login_count);
    assert_eq!(count, Some(0));
}

#[tokio::test]
async fn registration_is_admin_gated_and_validates_the_password() {
    let (service, _) = service_with(Vec::new()).await;

    let admin = UserIdentity::new("acct-admin", "Admin", "admin@college.ac.in", PortalRole::Admin);
    let office = UserIdentity::new("acct-office", "Office", "office@college.ac.in", PortalRole::Office);

    let input = RegisterAccountInput {
        email: "new@college.ac.in".to_owned(),
        display_name: "New Member".to_owned(),
        role: PortalRole::Faculty,
        password: "short".to_owned(),
    };
    assert!(service.register_account(&admin, input.clone()).await.is_err());
    assert!(service.register_account(&office, input.clone()).await.is_err());

    let input = RegisterAccountInput {
        password: "long-enough-passphrase".to_owned(),
        ..input
    };
    assert!(service.register_account(&admin, input).await.is_ok());
}
