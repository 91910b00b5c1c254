use crate::data::{DatedRecord, Error, NormalizedRecordSet, RecordSet, AMOUNT, DATE};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use rust_decimal::Decimal;
use std::str::FromStr;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Slashed dates are month first, as most North American exports write them.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Permissive date parsing: anything that looks like a date or a timestamp
/// becomes a `NaiveDateTime` (midnight for plain dates, UTC for zoned ones),
/// anything else is `None`.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Cells spelled like one of these are missing values, same as a blank one.
const MISSING_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Parses a numeric cell. Empty cells (or spelled-out missing values) are
/// missing rather than errors, non-numeric ones are `InvalidValue` (with `row`
/// counted from 1).
pub(crate) fn parse_decimal(
    column: &'static str,
    row: usize,
    raw: &str,
) -> Result<Option<Decimal>, Error> {
    let raw = raw.trim();
    if raw.is_empty() || MISSING_TOKENS.contains(&raw) {
        return Ok(None);
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map(Some)
        .map_err(|_| Error::InvalidValue {
            column,
            row,
            value: raw.to_string(),
        })
}

/// Turns a `RecordSet` into a time series: rows whose date doesn't parse are
/// dropped without any error, the rest is sorted by date. `sort_by_key` is
/// stable, so transactions on the same day stay in statement order.
pub(crate) fn normalize_for_timeseries(records: &RecordSet) -> Result<NormalizedRecordSet, Error> {
    let dates = records.column(DATE)?;
    let mut rows: Vec<DatedRecord> = records
        .records()
        .iter()
        .zip(dates)
        .enumerate()
        .filter_map(|(index, (record, raw))| match parse_date(raw) {
            Some(date) => Some(DatedRecord {
                row: index + 1,
                date,
                record: record.clone(),
            }),
            None => {
                debug!("Dropping row {}: unparseable date {raw:?}", index + 1);
                None
            }
        })
        .collect();
    rows.sort_by_key(|row| row.date);
    Ok(NormalizedRecordSet::new(records.schemas().to_vec(), rows))
}

/// Net gain/loss: the sum of every `amount`, no date filtering involved.
pub(crate) fn aggregate_amount(records: &RecordSet) -> Result<Decimal, Error> {
    let mut total = Decimal::ZERO;
    for (index, raw) in records.column(AMOUNT)?.into_iter().enumerate() {
        if let Some(amount) = parse_decimal(AMOUNT, index + 1, raw)? {
            total += amount;
        }
    }
    Ok(total)
}
