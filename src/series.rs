use crate::errors::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;

/// Columns every input file must carry, checked by exact name before any
/// row is parsed.
const REQUIRED_COLUMNS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];

/// One trading-day observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A cleaned price history for a single symbol, sorted ascending by date
/// with duplicate dates removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }
}

// --- Raw CSV rows & lenient field coercion ---

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open", deserialize_with = "deserialize_f64_lenient")]
    open: Option<f64>,
    #[serde(rename = "High", deserialize_with = "deserialize_f64_lenient")]
    high: Option<f64>,
    #[serde(rename = "Low", deserialize_with = "deserialize_f64_lenient")]
    low: Option<f64>,
    #[serde(rename = "Close", deserialize_with = "deserialize_f64_lenient")]
    close: Option<f64>,
    #[serde(rename = "Volume", deserialize_with = "deserialize_f64_lenient")]
    volume: Option<f64>,
}

impl RawRow {
    /// A row becomes a bar only when every field coerces; otherwise the
    /// row is dropped without failing the series.
    fn into_bar(self) -> Option<Bar> {
        Some(Bar {
            date: parse_utc_date(&self.date)?,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: self.volume?,
        })
    }
}

struct LenientF64Visitor;

impl<'de> Visitor<'de> for LenientF64Visitor {
    type Value = Option<f64>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a float, an integer, or a string representing a number")
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        // Bad cells yield None so the caller can drop the row instead of
        // aborting the whole file.
        Ok(v.trim().parse::<f64>().ok())
    }

    fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }
}

fn deserialize_f64_lenient<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientF64Visitor)
}

/// Parses a date cell to a UTC calendar date. Accepts RFC 3339, naive
/// datetimes with or without an embedded offset, and bare dates.
fn parse_utc_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

// --- Loader ---

/// Loads one symbol's CSV into a cleaned, date-sorted [`Series`].
///
/// Rows with unparseable dates or numeric fields are dropped; a missing
/// required column or a series that cleans down to nothing is an error
/// for this symbol only. With `0 < limit < len`, only the most recent
/// `limit` bars are kept.
pub fn load_series<P: AsRef<Path>>(path: P, symbol: &str, limit: usize) -> Result<Series> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::MissingColumn(column));
        }
    }

    let mut bars = Vec::new();
    for result in reader.deserialize::<RawRow>() {
        // Structurally broken lines are dropped like any other bad row.
        let Ok(row) = result else { continue };
        if let Some(bar) = row.into_bar() {
            bars.push(bar);
        }
    }

    // Stable sort, so the first occurrence of a duplicate date wins.
    bars.sort_by_key(|bar| bar.date);
    bars.dedup_by_key(|bar| bar.date);

    if bars.is_empty() {
        return Err(Error::EmptySeries);
    }

    if limit > 0 && limit < bars.len() {
        bars.drain(..bars.len() - limit);
    }

    Ok(Series {
        symbol: symbol.to_string(),
        bars,
    })
}
