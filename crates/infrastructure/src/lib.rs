//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod in_memory_approval_repository;
mod in_memory_audit_repository;
mod in_memory_directory_repository;
mod postgres_approval_repository;
mod postgres_audit_repository;
mod postgres_directory_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use in_memory_approval_repository::InMemoryApprovalRepository;
pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_directory_repository::InMemoryDirectoryRepository;
pub use postgres_approval_repository::PostgresApprovalRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_directory_repository::PostgresDirectoryRepository;
