//! Construction of the service graph for both storage modes.

use std::sync::Arc;

use clearslip_application::{
    AccountRepository, ApprovalRepository, ApprovalService, AuditRepository, AuthService,
    DepartmentRepository, DirectoryService, FacultyRepository, IssuanceService, PasswordHasher,
    StudentRepository,
};
use clearslip_core::AppError;
use clearslip_infrastructure::{
    Argon2PasswordHasher, InMemoryApprovalRepository, InMemoryAuditRepository,
    InMemoryDirectoryRepository, PostgresApprovalRepository, PostgresAuditRepository,
    PostgresDirectoryRepository,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::state::AppState;

pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}

pub fn build_postgres_state(pool: PgPool, frontend_url: String) -> AppState {
    let directory = Arc::new(PostgresDirectoryRepository::new(pool.clone()));

    assemble(
        Repositories {
            students: directory.clone(),
            faculty: directory.clone(),
            departments: directory.clone(),
            accounts: directory,
            approvals: Arc::new(PostgresApprovalRepository::new(pool.clone())),
            audit: Arc::new(PostgresAuditRepository::new(pool.clone())),
        },
        Some(pool),
        frontend_url,
    )
}

pub fn build_in_memory_state(frontend_url: String) -> AppState {
    let directory = Arc::new(InMemoryDirectoryRepository::new());

    assemble(
        Repositories {
            students: directory.clone(),
            faculty: directory.clone(),
            departments: directory.clone(),
            accounts: directory,
            approvals: Arc::new(InMemoryApprovalRepository::new()),
            audit: Arc::new(InMemoryAuditRepository::new()),
        },
        None,
        frontend_url,
    )
}

struct Repositories {
    students: Arc<dyn StudentRepository>,
    faculty: Arc<dyn FacultyRepository>,
    departments: Arc<dyn DepartmentRepository>,
    accounts: Arc<dyn AccountRepository>,
    approvals: Arc<dyn ApprovalRepository>,
    audit: Arc<dyn AuditRepository>,
}

fn assemble(
    repositories: Repositories,
    postgres_pool: Option<PgPool>,
    frontend_url: String,
) -> AppState {
    let Repositories {
        students,
        faculty,
        departments,
        accounts,
        approvals,
        audit,
    } = repositories;

    let password_hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());

    AppState {
        approval_service: ApprovalService::new(
            approvals.clone(),
            students.clone(),
            faculty.clone(),
            audit.clone(),
        ),
        issuance_service: IssuanceService::new(approvals, students.clone(), audit.clone()),
        directory_service: DirectoryService::new(students, faculty, departments, audit.clone()),
        auth_service: AuthService::new(accounts, password_hasher, audit.clone()),
        audit_repository: audit,
        postgres_pool,
        frontend_url,
    }
}
