//! Database schema definitions

/// SQL to create the companies table
pub const CREATE_COMPANIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    cin TEXT NOT NULL UNIQUE,
    company_name TEXT NOT NULL,
    status TEXT,
    registration_date TEXT,
    company_class TEXT,
    roc TEXT,
    email TEXT,
    state TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create the full-text projection of `(company_name, cin)`.
/// The FTS rowid is the company id.
pub const CREATE_COMPANIES_FTS_TABLE: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS companies_fts USING fts5(
    company_name,
    cin
)
"#;

/// Triggers keeping `companies_fts` in lockstep with `companies`.
/// They run inside the statement that fired them, so a failed write
/// leaves both tables untouched.
pub const CREATE_TRIGGERS: &[&str] = &[
    r#"
    CREATE TRIGGER IF NOT EXISTS companies_ai AFTER INSERT ON companies BEGIN
        INSERT INTO companies_fts(rowid, company_name, cin)
        VALUES (new.id, new.company_name, new.cin);
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS companies_ad AFTER DELETE ON companies BEGIN
        DELETE FROM companies_fts WHERE rowid = old.id;
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS companies_au AFTER UPDATE ON companies BEGIN
        UPDATE companies_fts
        SET company_name = new.company_name, cin = new.cin
        WHERE rowid = old.id;
    END
    "#,
];

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(company_name)",
    "CREATE INDEX IF NOT EXISTS idx_companies_cin ON companies(cin)",
    "CREATE INDEX IF NOT EXISTS idx_companies_status ON companies(status)",
    "CREATE INDEX IF NOT EXISTS idx_companies_state ON companies(state)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_COMPANIES_TABLE, CREATE_COMPANIES_FTS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts.extend(CREATE_TRIGGERS.iter().copied());
    stmts
}
