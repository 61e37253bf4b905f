//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with:
//! - companies(id, cin, company_name, status, ..., created_at, updated_at)
//! - companies_fts(company_name, cin), an FTS5 projection keyed by company id
//!
//! Three triggers keep the projection a mirror of the base table.

pub mod schema;
pub mod sqlite;

pub use sqlite::{BatchOutcome, CompanyStore};
