//! Bulk loader for open-data company records
//!
//! Records come either from a local dump (the data.gov.in resource response
//! `{"records": [...]}` or a bare JSON array of the same records) or straight
//! from the resource API, paged by `limit`/`offset`. Both paths write through
//! [`CompanyStore::upsert_batch`] so the search projection stays in sync.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::company::NewCompany;
use crate::storage::{BatchOutcome, CompanyStore};
use crate::Result;

pub const MAX_CIN_CHARS: usize = 50;
pub const MAX_NAME_CHARS: usize = 255;

pub const DEFAULT_OGD_API_BASE: &str = "https://api.data.gov.in/resource";
pub const DEFAULT_RESOURCE_ID: &str = "ec58dab7-d891-4abb-936e-d5d274a6ce9b";
pub const DEFAULT_MAX_RECORDS: usize = 2_000_000;
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One raw open-data record
pub type Record = Map<String, Value>;

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Envelope { records: Vec<Record> },
    Records(Vec<Record>),
}

/// A single page of the resource API. Error responses carry no `records`.
#[derive(Deserialize)]
struct ResourcePage {
    #[serde(default)]
    records: Vec<Record>,
}

/// Totals for a completed load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub records: usize,
    pub written: usize,
    pub skipped: usize,
    pub batches: usize,
}

/// Parse a dump into companies. Records without a CIN are dropped and counted.
pub fn parse_records(json: &str) -> Result<(Vec<NewCompany>, usize)> {
    let records = match serde_json::from_str::<Payload>(json)? {
        Payload::Envelope { records } | Payload::Records(records) => records,
    };
    Ok(to_companies(&records))
}

/// Map one open-data record onto a company
pub fn record_to_company(record: &Record) -> Option<NewCompany> {
    let cin = field(record, &["corporate_identification_number"])?;
    Some(NewCompany {
        cin: Some(truncate_chars(&cin, MAX_CIN_CHARS)),
        company_name: field(record, &["company_name"]).map(|name| truncate_chars(&name, MAX_NAME_CHARS)),
        status: field(record, &["company_status"]),
        registration_date: field(record, &["date_of_registration"]),
        company_class: field(record, &["company_class"]),
        roc: field(record, &["registrar_of_companies"]),
        email: field(record, &["email_id", "email"]),
        state: field(record, &["registered_state", "state"]),
    })
}

/// Write already-parsed companies in batches of `batch_size`
pub fn load_companies(
    store: &CompanyStore,
    companies: &[NewCompany],
    batch_size: usize,
    mut on_batch: impl FnMut(usize, BatchOutcome),
) -> Result<LoadSummary> {
    let mut summary = LoadSummary {
        records: companies.len(),
        ..LoadSummary::default()
    };

    for (index, chunk) in companies.chunks(batch_size.max(1)).enumerate() {
        let outcome = store.upsert_batch(chunk)?;
        summary.written += outcome.written;
        summary.skipped += outcome.skipped;
        summary.batches += 1;
        tracing::debug!(batch = index + 1, written = outcome.written, skipped = outcome.skipped, "batch committed");
        on_batch(index + 1, outcome);
    }
    Ok(summary)
}

// ========== Remote sync ==========

/// Something that serves raw records by offset
pub trait PageSource {
    /// Up to `limit` records starting at `offset`. An empty page means the
    /// source is exhausted.
    fn fetch_page(&mut self, offset: usize, limit: usize) -> Result<Vec<Record>>;
}

/// Client for a data.gov.in resource
pub struct OgdClient {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl OgdClient {
    pub fn new(api_base: &str, resource_id: &str, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/{}", api_base.trim_end_matches('/'), resource_id),
            api_key: api_key.into(),
        })
    }
}

impl PageSource for OgdClient {
    fn fetch_page(&mut self, offset: usize, limit: usize) -> Result<Vec<Record>> {
        let (offset, limit) = (offset.to_string(), limit.to_string());
        let body = self
            .client
            .get(&self.url)
            .query(&[
                ("api-key", self.api_key.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ])
            .send()?
            .error_for_status()?
            .text()?;
        let page: ResourcePage = serde_json::from_str(&body)?;
        Ok(page.records)
    }
}

/// Paging limits for [`sync_from_source`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub batch_size: usize,
    /// Stop once this many records have been fetched
    pub max_records: usize,
    /// Sleep between pages
    pub pause: Duration,
}

/// Page through `source` and upsert every page as one batch.
///
/// Stops on an empty page, on a page shorter than requested, or once
/// `max_records` have been fetched.
pub fn sync_from_source<S: PageSource>(
    store: &CompanyStore,
    source: &mut S,
    options: &SyncOptions,
    mut on_batch: impl FnMut(usize, BatchOutcome),
) -> Result<LoadSummary> {
    let existing = store.count_companies()?;
    tracing::info!(existing, max_records = options.max_records, "starting sync");

    let batch_size = options.batch_size.max(1);
    let mut summary = LoadSummary::default();
    let mut offset = 0;

    while summary.records < options.max_records {
        let limit = batch_size.min(options.max_records - summary.records);
        let records = source.fetch_page(offset, limit)?;
        if records.is_empty() {
            if offset == 0 {
                tracing::warn!("source returned no records on the first page");
            }
            break;
        }

        let fetched = records.len();
        let (companies, missing_cin) = to_companies(&records);
        let outcome = store.upsert_batch(&companies)?;

        summary.records += fetched;
        summary.written += outcome.written;
        summary.skipped += outcome.skipped + missing_cin;
        summary.batches += 1;
        tracing::debug!(batch = summary.batches, offset, fetched, written = outcome.written, "page committed");
        on_batch(summary.batches, outcome);

        if fetched < limit {
            break;
        }
        offset += fetched;
        if summary.records < options.max_records && !options.pause.is_zero() {
            std::thread::sleep(options.pause);
        }
    }

    tracing::info!(
        records = summary.records,
        written = summary.written,
        skipped = summary.skipped,
        "sync complete"
    );
    Ok(summary)
}

fn to_companies(records: &[Record]) -> (Vec<NewCompany>, usize) {
    let companies: Vec<NewCompany> = records.iter().filter_map(record_to_company).collect();
    let missing_cin = records.len() - companies.len();
    (companies, missing_cin)
}

/// First non-empty value among `keys`, as text
fn field(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
