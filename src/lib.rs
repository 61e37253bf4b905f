//! # companysearch - Company Registry Search API
//!
//! Name and CIN lookup over a registry of companies.
//!
//! companysearch provides:
//! - SQLite-backed company store with a trigger-synchronized FTS5 projection
//! - HTTP query service (search, lookup by CIN, aggregate stats)
//! - Bulk loader for open-data company dumps and the data.gov.in resource API
//! - Embedded browser page for ad-hoc searching

pub mod company;
pub mod storage;
pub mod loader;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use company::{Company, CompanyPatch, NewCompany, StoreStats};
pub use storage::CompanyStore;

/// Result type alias for companysearch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for companysearch operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Company with CIN {0} already exists")]
    UniqueConstraintViolation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
