// 🌐 Bills API Source - GET <base-url>/api/bills
//
// Upstream rows are loosely typed, so they are decoded into RawBill first and
// converted to the strongly-typed Bill immediately at this boundary.

use crate::bill::Bill;
use crate::error::{BillError, Result};
use crate::status::{derive_status, is_yes, StatusFlags};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const BILLS_PATH: &str = "/api/bills";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// RAW RECORD
// ============================================================================

/// One upstream row. Everything is optional on the wire; only Bill_id is
/// required to turn it into a Bill. Numbers and booleans are kept in their
/// text form, so `"Passed": true` reads as "true" and is not a Yes.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawBill {
    #[serde(deserialize_with = "lenient_string", rename = "Bill_id", default)]
    pub bill_id: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Bill_description", default)]
    pub description: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Patron_name", default)]
    pub patron_name: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Last_house_action", default)]
    pub last_house_action: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Last_senate_action", default)]
    pub last_senate_action: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Last_governor_action", default)]
    pub last_governor_action: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Passed_house", default)]
    pub passed_house: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Passed_senate", default)]
    pub passed_senate: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Passed", default)]
    pub passed: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Vetoed", default)]
    pub vetoed: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Failed", default)]
    pub failed: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Approved", default)]
    pub approved: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Carried_over", default)]
    pub carried_over: Option<String>,

    #[serde(deserialize_with = "lenient_string", rename = "Introduction_date", default)]
    pub introduction_date: Option<String>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

impl RawBill {
    pub fn flags(&self) -> StatusFlags {
        StatusFlags {
            passed_house: is_yes(self.passed_house.as_deref()),
            passed_senate: is_yes(self.passed_senate.as_deref()),
            passed: is_yes(self.passed.as_deref()),
            vetoed: is_yes(self.vetoed.as_deref()),
            failed: is_yes(self.failed.as_deref()),
            approved: is_yes(self.approved.as_deref()),
            carried_over: is_yes(self.carried_over.as_deref()),
        }
    }

    /// Convert to a Bill. `fetched_at` stands in for a missing or unreadable
    /// introduction date. Returns None when the row has no usable Bill_id.
    pub fn into_bill(self, fetched_at: DateTime<Utc>) -> Option<Bill> {
        let bill_id = self
            .bill_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())?
            .to_string();

        let status = derive_status(&bill_id, &self.flags());

        let introduced = match self.introduction_date.as_deref().map(str::trim) {
            None | Some("") => fetched_at,
            Some(raw) => parse_introduction_date(raw).unwrap_or_else(|| {
                tracing::warn!(bill_id = %bill_id, date = raw, "unreadable Introduction_date");
                fetched_at
            }),
        };

        Some(Bill {
            id: bill_id.clone(),
            bill_id,
            description: self.description.unwrap_or_default(),
            patron_name: self.patron_name.unwrap_or_default(),
            house_action: self.last_house_action.unwrap_or_default(),
            senate_action: self.last_senate_action.unwrap_or_default(),
            governor_action: self.last_governor_action.unwrap_or_default(),
            status,
            is_new: false,
            created_at: introduced,
            updated_at: introduced,
        })
    }
}

/// RFC 3339, `YYYY-MM-DD` or `MM/DD/YYYY`; bare dates are midnight UTC.
pub fn parse_introduction_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ============================================================================
// LOADING
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Decode an upstream payload and convert every usable row. Only a payload
/// that is not a JSON array fails; a row that is not an object is skipped.
pub fn decode_bills(payload: &str, fetched_at: DateTime<Utc>) -> Result<(Vec<Bill>, LoadReport)> {
    let rows: Vec<Value> = serde_json::from_str(payload)?;

    let mut undecodable = 0;
    let raws: Vec<RawBill> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping undecodable bill record");
                undecodable += 1;
                None
            }
        })
        .collect();

    let (bills, mut report) = convert_raw_bills(raws, fetched_at);
    report.skipped += undecodable;
    Ok((bills, report))
}

/// `Bill_id` is not unique upstream; repeats get `#2`, `#3`, ... appended to
/// their identity while `bill_id` stays as sent.
fn unique_id(bill_id: &str, taken: &mut HashSet<String>) -> String {
    let mut id = bill_id.to_string();
    let mut n = 1;
    while taken.contains(&id) {
        n += 1;
        id = format!("{} #{}", bill_id, n);
    }
    taken.insert(id.clone());
    id
}

pub fn convert_raw_bills(raws: Vec<RawBill>, fetched_at: DateTime<Utc>) -> (Vec<Bill>, LoadReport) {
    let mut report = LoadReport::default();
    let mut bills = Vec::with_capacity(raws.len());
    let mut taken = HashSet::with_capacity(raws.len());

    for (index, raw) in raws.into_iter().enumerate() {
        match raw.into_bill(fetched_at) {
            Some(mut bill) => {
                bill.id = unique_id(&bill.bill_id, &mut taken);
                if bill.id != bill.bill_id {
                    tracing::debug!(bill_id = %bill.bill_id, id = %bill.id, "duplicate Bill_id");
                }
                bills.push(bill);
                report.loaded += 1;
            }
            None => {
                tracing::warn!(index, "skipping bill record without Bill_id");
                report.skipped += 1;
            }
        }
    }

    (bills, report)
}

// ============================================================================
// HTTP CLIENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn bills_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), BILLS_PATH)
    }
}

/// Anything that can produce the bill collection. The HTTP client is the
/// real one; tests and the server can plug in canned data.
pub trait BillSource: Send + Sync {
    fn fetch(&self, fetched_at: DateTime<Utc>) -> Result<(Vec<Bill>, LoadReport)>;
}

pub struct ApiClient {
    config: ClientConfig,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(ApiClient { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl BillSource for ApiClient {
    fn fetch(&self, fetched_at: DateTime<Utc>) -> Result<(Vec<Bill>, LoadReport)> {
        let url = self.config.bills_url();
        tracing::debug!(%url, "fetching bills");

        let response = self.http.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(BillError::UpstreamStatus(status.as_u16()));
        }

        let payload = response.text()?;
        let (bills, report) = decode_bills(&payload, fetched_at)?;
        tracing::info!(loaded = report.loaded, skipped = report.skipped, "bills fetched");
        Ok((bills, report))
    }
}

/// Fixed collection, used when there is no upstream to talk to
pub struct StaticSource {
    raws: Vec<RawBill>,
}

impl StaticSource {
    pub fn new(raws: Vec<RawBill>) -> Self {
        StaticSource { raws }
    }
}

impl BillSource for StaticSource {
    fn fetch(&self, fetched_at: DateTime<Utc>) -> Result<(Vec<Bill>, LoadReport)> {
        Ok(convert_raw_bills(self.raws.clone(), fetched_at))
    }
}
