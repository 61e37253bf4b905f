//! SQLite storage implementation

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use super::schema;
use crate::company::{Company, CompanyPatch, NewCompany, ProjectionEntry, StoreStats, ACTIVE_STATUS};
use crate::{Error, Result};

const COMPANY_COLUMNS: &str = "id, cin, company_name, status, registration_date, company_class, roc, email, state, created_at, updated_at";

/// SQLite-backed company store.
///
/// Every write to `companies` is mirrored into `companies_fts` by triggers,
/// so callers never touch the projection directly.
pub struct CompanyStore {
    conn: Mutex<Connection>,
}

/// Result of a bulk upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub written: usize,
    pub skipped: usize,
}

impl CompanyStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        initialize_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Unavailable("connection lock poisoned".to_string()))
    }

    // ========== Write Operations ==========

    /// Insert a new company and return it with its assigned id
    pub fn insert(&self, company: &NewCompany) -> Result<Company> {
        let (cin, name) = company
            .required_fields()
            .map_err(|field| Error::Validation(format!("{} is required", field)))?;
        let (cin, name) = (cin.trim(), name.trim());

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO companies (cin, company_name, status, registration_date, company_class, roc, email, state)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                cin,
                name,
                company.status,
                company.registration_date,
                company.company_class,
                company.roc,
                company.email,
                company.state,
            ],
        )
        .map_err(|e| unique_violation(e, cin))?;

        let id = tx.last_insert_rowid();
        let created = fetch_by_id(&tx, id)?
            .ok_or_else(|| Error::NotFound(format!("company {} vanished after insert", id)))?;
        tx.commit()?;

        tracing::debug!(id, cin, "inserted company");
        Ok(created)
    }

    /// Apply a partial update to an existing company
    pub fn update(&self, id: i64, patch: &CompanyPatch) -> Result<Company> {
        if patch.cin.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(Error::Validation("cin must not be empty".to_string()));
        }
        if patch.company_name.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(Error::Validation("company_name must not be empty".to_string()));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let existing = fetch_by_id(&tx, id)?.ok_or_else(|| Error::NotFound(format!("company {}", id)))?;
        if patch.is_empty() {
            return Ok(existing);
        }

        let cin = patch.cin.as_deref().map(str::trim).unwrap_or(existing.cin.as_str());
        let name = patch
            .company_name
            .as_deref()
            .map(str::trim)
            .unwrap_or(existing.company_name.as_str());
        let pick = |new: &Option<String>, old: &Option<String>| new.clone().or_else(|| old.clone());

        tx.execute(
            r#"
            UPDATE companies
            SET cin = ?1, company_name = ?2, status = ?3, registration_date = ?4,
                company_class = ?5, roc = ?6, email = ?7, state = ?8
            WHERE id = ?9
            "#,
            params![
                cin,
                name,
                pick(&patch.status, &existing.status),
                pick(&patch.registration_date, &existing.registration_date),
                pick(&patch.company_class, &existing.company_class),
                pick(&patch.roc, &existing.roc),
                pick(&patch.email, &existing.email),
                pick(&patch.state, &existing.state),
                id,
            ],
        )
        .map_err(|e| unique_violation(e, cin))?;

        let updated = fetch_by_id(&tx, id)?.ok_or_else(|| Error::NotFound(format!("company {}", id)))?;
        tx.commit()?;
        Ok(updated)
    }

    /// Delete a company by id
    pub fn delete(&self, id: i64) -> Result<()> {
        let removed = self.conn()?.execute("DELETE FROM companies WHERE id = ?1", [id])?;
        if removed == 0 {
            return Err(Error::NotFound(format!("company {}", id)));
        }
        Ok(())
    }

    /// Insert or refresh a batch of companies keyed by CIN, in one transaction.
    /// Records missing a CIN or name are skipped.
    pub fn upsert_batch(&self, companies: &[NewCompany]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO companies (cin, company_name, status, registration_date, company_class, roc, email, state)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(cin) DO UPDATE SET
                    company_name = excluded.company_name,
                    status = excluded.status,
                    registration_date = excluded.registration_date,
                    company_class = excluded.company_class,
                    roc = excluded.roc,
                    email = excluded.email,
                    state = excluded.state
                "#,
            )?;

            for company in companies {
                let Ok((cin, name)) = company.required_fields() else {
                    outcome.skipped += 1;
                    continue;
                };
                outcome.written += stmt.execute(params![
                    cin.trim(),
                    name.trim(),
                    company.status,
                    company.registration_date,
                    company.company_class,
                    company.roc,
                    company.email,
                    company.state,
                ])?;
            }
        }
        tx.commit()?;
        Ok(outcome)
    }

    // ========== Read Operations ==========

    /// Get a company by CIN
    pub fn find_by_cin(&self, cin: &str) -> Result<Option<Company>> {
        let sql = format!("SELECT {} FROM companies WHERE cin = ?1", COMPANY_COLUMNS);
        self.conn()?
            .query_row(&sql, [cin], row_to_company)
            .optional()
            .map_err(Into::into)
    }

    /// Companies whose name contains `needle`, ordered by name
    pub fn search_by_name(&self, needle: &str, limit: u32, offset: u64) -> Result<Vec<Company>> {
        let sql = format!(
            r"SELECT {} FROM companies
              WHERE company_name LIKE ?1 ESCAPE '\'
              ORDER BY company_name ASC, id ASC
              LIMIT ?2 OFFSET ?3",
            COMPANY_COLUMNS
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let companies = stmt
            .query_map(
                params![
                    like_pattern(needle),
                    i64::from(limit),
                    i64::try_from(offset).unwrap_or(i64::MAX)
                ],
                row_to_company,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(companies)
    }

    /// Number of companies matched by [`CompanyStore::search_by_name`]
    pub fn count_by_name(&self, needle: &str) -> Result<u64> {
        let count: i64 = self.conn()?.query_row(
            r"SELECT COUNT(*) FROM companies WHERE company_name LIKE ?1 ESCAPE '\'",
            [like_pattern(needle)],
            |row| row.get(0),
        )?;
        Ok(to_count(count))
    }

    /// Count all companies
    pub fn count_companies(&self) -> Result<u64> {
        let count: i64 = self.conn()?.query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;
        Ok(to_count(count))
    }

    /// Totals, active count and most recent `updated_at`
    pub fn aggregate_stats(&self) -> Result<StoreStats> {
        self.conn()?
            .query_row(
                r#"
                SELECT COUNT(*),
                       COUNT(CASE WHEN status = ?1 THEN 1 END),
                       MAX(updated_at)
                FROM companies
                "#,
                [ACTIVE_STATUS],
                |row| {
                    Ok(StoreStats {
                        total: to_count(row.get(0)?),
                        active: to_count(row.get(1)?),
                        last_update: row.get(2)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    // ========== Projection ==========

    /// The search projection row for a company id
    pub fn projection_entry(&self, id: i64) -> Result<Option<ProjectionEntry>> {
        self.conn()?
            .query_row(
                "SELECT rowid, company_name, cin FROM companies_fts WHERE rowid = ?1",
                [id],
                |row| {
                    Ok(ProjectionEntry {
                        id: row.get(0)?,
                        company_name: row.get(1)?,
                        cin: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Count all projection rows
    pub fn projection_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM companies_fts", [], |row| row.get(0))?;
        Ok(to_count(count))
    }

    /// Number of rows on either side without an identical counterpart.
    /// Zero when the projection mirrors the base table.
    pub fn projection_drift(&self) -> Result<u64> {
        let drift: i64 = self.conn()?.query_row(
            r#"
            SELECT
                (SELECT COUNT(*) FROM companies c
                 LEFT JOIN companies_fts f ON f.rowid = c.id
                 WHERE f.rowid IS NULL
                    OR f.company_name IS NOT c.company_name
                    OR f.cin IS NOT c.cin)
              + (SELECT COUNT(*) FROM companies_fts f
                 LEFT JOIN companies c ON c.id = f.rowid
                 WHERE c.id IS NULL)
            "#,
            [],
            |row| row.get(0),
        )?;
        Ok(to_count(drift))
    }
}

/// Initialize the database schema
fn initialize_schema(conn: &Connection) -> Result<()> {
    for stmt in schema::all_schema_statements() {
        conn.execute(stmt, [])?;
    }
    Ok(())
}

fn fetch_by_id(conn: &Connection, id: i64) -> Result<Option<Company>> {
    let sql = format!("SELECT {} FROM companies WHERE id = ?1", COMPANY_COLUMNS);
    conn.query_row(&sql, [id], row_to_company)
        .optional()
        .map_err(Into::into)
}

/// Helper to convert a row to a Company
fn row_to_company(row: &rusqlite::Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        cin: row.get(1)?,
        company_name: row.get(2)?,
        status: row.get(3)?,
        registration_date: row.get(4)?,
        company_class: row.get(5)?,
        roc: row.get(6)?,
        email: row.get(7)?,
        state: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// `LIKE` pattern matching `needle` as a literal substring
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn unique_violation(err: rusqlite::Error, cin: &str) -> Error {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return Error::UniqueConstraintViolation(cin.to_string());
        }
    }
    err.into()
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tata() -> NewCompany {
        NewCompany::new("L28920MH1945PLC004520", "Tata Motors").with_status("Active")
    }

    #[test]
    fn test_insert_and_find() {
        let store = CompanyStore::open_in_memory().unwrap();

        let created = store.insert(&tata()).unwrap();
        assert!(created.id > 0);
        assert_eq!(created.status.as_deref(), Some(ACTIVE_STATUS));

        let found = store.find_by_cin("L28920MH1945PLC004520").unwrap().unwrap();
        assert_eq!(found, created);

        let entry = store.projection_entry(created.id).unwrap().unwrap();
        assert_eq!(entry.company_name, "Tata Motors");
        assert_eq!(entry.cin, "L28920MH1945PLC004520");
    }

    #[test]
    fn test_duplicate_cin_leaves_store_unchanged() {
        let store = CompanyStore::open_in_memory().unwrap();
        store.insert(&tata()).unwrap();

        let dup = NewCompany::new("L28920MH1945PLC004520", "Someone Else");
        let err = store.insert(&dup).unwrap_err();
        assert!(matches!(err, Error::UniqueConstraintViolation(ref cin) if cin == "L28920MH1945PLC004520"));

        assert_eq!(store.count_companies().unwrap(), 1);
        assert_eq!(store.projection_count().unwrap(), 1);
        assert_eq!(store.count_by_name("Someone").unwrap(), 0);
        assert_eq!(store.projection_drift().unwrap(), 0);
    }

    #[test]
    fn test_insert_requires_cin_and_name() {
        let store = CompanyStore::open_in_memory().unwrap();

        let missing_cin = NewCompany {
            company_name: Some("Nameless Ltd".into()),
            ..NewCompany::default()
        };
        assert!(matches!(store.insert(&missing_cin), Err(Error::Validation(_))));
        assert!(matches!(store.insert(&NewCompany::new("U1", " ")), Err(Error::Validation(_))));
        assert_eq!(store.count_companies().unwrap(), 0);
        assert_eq!(store.projection_count().unwrap(), 0);
    }

    #[test]
    fn test_update_rederives_projection() {
        let store = CompanyStore::open_in_memory().unwrap();
        let created = store.insert(&tata()).unwrap();

        let patch = CompanyPatch {
            company_name: Some("Tata Motors Limited".into()),
            cin: Some("L28920MH1945PLC004521".into()),
            ..CompanyPatch::default()
        };
        let updated = store.update(created.id, &patch).unwrap();
        assert_eq!(updated.company_name, "Tata Motors Limited");
        assert_eq!(updated.status.as_deref(), Some("Active"));

        let entry = store.projection_entry(created.id).unwrap().unwrap();
        assert_eq!(entry.company_name, "Tata Motors Limited");
        assert_eq!(entry.cin, "L28920MH1945PLC004521");
        assert!(store.find_by_cin("L28920MH1945PLC004520").unwrap().is_none());
        assert_eq!(store.projection_drift().unwrap(), 0);
    }

    #[test]
    fn test_update_conflict_and_missing() {
        let store = CompanyStore::open_in_memory().unwrap();
        let first = store.insert(&tata()).unwrap();
        store.insert(&NewCompany::new("U72200KA2000PTC027000", "Infosys BPM")).unwrap();

        let steal = CompanyPatch {
            cin: Some("U72200KA2000PTC027000".into()),
            ..CompanyPatch::default()
        };
        assert!(matches!(
            store.update(first.id, &steal),
            Err(Error::UniqueConstraintViolation(_))
        ));
        let entry = store.projection_entry(first.id).unwrap().unwrap();
        assert_eq!(entry.cin, "L28920MH1945PLC004520");

        assert!(matches!(
            store.update(9999, &CompanyPatch::default()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_removes_projection() {
        let store = CompanyStore::open_in_memory().unwrap();
        let created = store.insert(&tata()).unwrap();

        store.delete(created.id).unwrap();
        assert!(store.find_by_cin(&created.cin).unwrap().is_none());
        assert!(store.projection_entry(created.id).unwrap().is_none());
        assert!(matches!(store.delete(created.id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_search_orders_and_paginates() {
        let store = CompanyStore::open_in_memory().unwrap();
        for (i, name) in ["Zeta Steel", "Alpha Steel", "Mid Steel Works", "Unrelated Foods"]
            .iter()
            .enumerate()
        {
            store.insert(&NewCompany::new(format!("CIN{}", i), *name)).unwrap();
        }

        assert_eq!(store.count_by_name("steel").unwrap(), 3);
        let names: Vec<_> = store
            .search_by_name("Steel", 10, 0)
            .unwrap()
            .into_iter()
            .map(|c| c.company_name)
            .collect();
        assert_eq!(names, vec!["Alpha Steel", "Mid Steel Works", "Zeta Steel"]);

        let second_page = store.search_by_name("Steel", 2, 2).unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].company_name, "Zeta Steel");

        assert!(store.search_by_name("Nothing", 10, 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let store = CompanyStore::open_in_memory().unwrap();
        store.insert(&NewCompany::new("A1", "100% Organic")).unwrap();
        store.insert(&NewCompany::new("A2", "1000 Organic")).unwrap();
        store.insert(&NewCompany::new("A3", "A_B Traders")).unwrap();
        store.insert(&NewCompany::new("A4", "AXB Traders")).unwrap();

        assert_eq!(store.count_by_name("0%").unwrap(), 1);
        assert_eq!(store.count_by_name("A_B").unwrap(), 1);
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn test_aggregate_stats() {
        let store = CompanyStore::open_in_memory().unwrap();
        let empty = store.aggregate_stats().unwrap();
        assert_eq!(empty, StoreStats { total: 0, active: 0, last_update: None });

        store.insert(&tata()).unwrap();
        store.insert(&NewCompany::new("U1", "Dormant Co").with_status("Strike Off")).unwrap();
        store.insert(&NewCompany::new("U2", "Unknown Co")).unwrap();
        store.insert(&NewCompany::new("U3", "Lowercase Co").with_status("active")).unwrap();

        let stats = store.aggregate_stats().unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.inactive(), 3);
        assert!(stats.last_update.is_some());
    }

    #[test]
    fn test_upsert_batch_refreshes_existing() {
        let store = CompanyStore::open_in_memory().unwrap();
        let original = store.insert(&tata()).unwrap();

        let batch = vec![
            NewCompany::new("L28920MH1945PLC004520", "Tata Motors Ltd").with_status("Active"),
            NewCompany::new("U3", "Fresh Co"),
            NewCompany {
                company_name: Some("No Cin Co".into()),
                ..NewCompany::default()
            },
        ];
        let outcome = store.upsert_batch(&batch).unwrap();
        assert_eq!(outcome, BatchOutcome { written: 2, skipped: 1 });

        assert_eq!(store.count_companies().unwrap(), 2);
        let refreshed = store.find_by_cin("L28920MH1945PLC004520").unwrap().unwrap();
        assert_eq!(refreshed.id, original.id);
        assert_eq!(
            store.projection_entry(original.id).unwrap().unwrap().company_name,
            "Tata Motors Ltd"
        );
        assert_eq!(store.projection_drift().unwrap(), 0);
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companies.db");
        {
            let store = CompanyStore::open(&path).unwrap();
            store.insert(&tata()).unwrap();
        }
        let store = CompanyStore::open(&path).unwrap();
        assert_eq!(store.count_companies().unwrap(), 1);
        assert_eq!(store.projection_count().unwrap(), 1);
        let reloaded = store.find_by_cin("L28920MH1945PLC004520").unwrap().unwrap();
        assert_eq!(reloaded.company_name, "Tata Motors");
    }
}
