//! Imagegen-State: SurrealDB Audit Store
//!
//! This crate provides the persistence layer for the image generation
//! gateway. Every generation invocation produces exactly one immutable
//! [`AuditRecord`]; this crate owns how those records are written and read.
//!
//! ## Key Components
//!
//! - `AuditLog`: Backend-agnostic append-only audit trait
//! - `SurrealAuditLog`: SurrealDB implementation (`mem://`, `surrealkv://`, `ws(s)://`)
//! - `fakes`: In-memory implementations for tests

mod error;
pub mod fakes;
mod handle;
pub mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_audit;

pub use error::{StateError, StorageError};
pub use handle::{CloudConfig, StoreConfig};
pub use schema::AuditRow;
pub use storage_traits::{
    AuditId, AuditLog, AuditQuery, AuditRecord, AuditStatus, NewAuditRecord, StatusCounts,
    StorageResult, DEFAULT_LIST_LIMIT, MISSING_PROMPT_PLACEHOLDER,
};
pub use surreal_audit::SurrealAuditLog;

/// Result type for imagegen-state connection and schema operations
pub type Result<T> = std::result::Result<T, StateError>;
