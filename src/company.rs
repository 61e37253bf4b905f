//! Company records
//!
//! A company is keyed internally by a surrogate `id` and externally by its
//! Corporate Identification Number (`cin`).

use serde::{Deserialize, Serialize};

/// Status value counted as active in aggregate reporting.
pub const ACTIVE_STATUS: &str = "Active";

/// A persisted company row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub cin: String,
    pub company_name: String,
    pub status: Option<String>,
    pub registration_date: Option<String>,
    pub company_class: Option<String>,
    pub roc: Option<String>,
    pub email: Option<String>,
    pub state: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A company that has not been written yet.
///
/// `cin` and `company_name` are optional here so that incomplete input can be
/// represented and rejected by the store with a validation error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    pub cin: Option<String>,
    pub company_name: Option<String>,
    pub status: Option<String>,
    pub registration_date: Option<String>,
    pub company_class: Option<String>,
    pub roc: Option<String>,
    pub email: Option<String>,
    pub state: Option<String>,
}

impl NewCompany {
    pub fn new(cin: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            cin: Some(cin.into()),
            company_name: Some(company_name.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Returns the required `(cin, company_name)` pair, or the name of the
    /// first missing field.
    pub fn required_fields(&self) -> std::result::Result<(&str, &str), &'static str> {
        let cin = non_blank(self.cin.as_deref()).ok_or("cin")?;
        let name = non_blank(self.company_name.as_deref()).ok_or("company_name")?;
        Ok((cin, name))
    }
}

/// Partial update for an existing company. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyPatch {
    pub cin: Option<String>,
    pub company_name: Option<String>,
    pub status: Option<String>,
    pub registration_date: Option<String>,
    pub company_class: Option<String>,
    pub roc: Option<String>,
    pub email: Option<String>,
    pub state: Option<String>,
}

impl CompanyPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The search projection's view of a company
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionEntry {
    pub id: i64,
    pub company_name: String,
    pub cin: String,
}

/// Aggregate figures across the whole table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: u64,
    pub active: u64,
    pub last_update: Option<String>,
}

impl StoreStats {
    pub fn inactive(&self) -> u64 {
        self.total.saturating_sub(self.active)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
