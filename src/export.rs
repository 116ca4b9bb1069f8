// 📤 CSV Exporter - the filtered, sorted, unpaginated view

use crate::bill::Bill;
use crate::error::Result;
use chrono::{NaiveDate, SecondsFormat};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const EXPORT_PREFIX: &str = "virginia-bills";
pub const CSV_MIME: &str = "text/csv; charset=utf-8";

pub const HEADERS: [&str; 8] = [
    "Bill ID",
    "Description",
    "Patron Name",
    "House Action",
    "Senate Action",
    "Governor Action",
    "Status",
    "Created At",
];

/// `<prefix>-<YYYY-MM-DD>.csv`
pub fn export_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.csv", prefix, date.format("%Y-%m-%d"))
}

/// Write the header plus one row per bill. Quoting follows RFC 4180 for
/// every field, so commas, quotes and newlines survive in any column.
pub fn write_csv<'a, W, I>(writer: W, bills: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Bill>,
{
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    wtr.write_record(HEADERS)?;

    for bill in bills {
        let created_at = bill.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        wtr.write_record([
            bill.bill_id.as_str(),
            bill.description.as_str(),
            bill.patron_name.as_str(),
            bill.house_action.as_str(),
            bill.senate_action.as_str(),
            bill.governor_action.as_str(),
            bill.status.as_str(),
            created_at.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn to_csv_string<'a, I>(bills: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Bill>,
{
    let mut buf = Vec::new();
    write_csv(&mut buf, bills)?;
    // The csv writer only ever emits the UTF-8 we hand it
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `<dir>/<prefix>-<date>.csv`, replacing any earlier export of the day.
pub fn export_to_dir<'a, I>(dir: &Path, date: NaiveDate, bills: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = &'a Bill>,
{
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(EXPORT_PREFIX, date));
    let file = File::create(&path)?;
    write_csv(file, bills)?;

    tracing::info!(path = %path.display(), "bills exported");
    Ok(path)
}
