use chrono::NaiveDateTime;
use csv::StringRecord;
use std::{path::PathBuf, rc::Rc};
use thiserror::Error;

pub const DATE: &str = "date";
pub const AMOUNT: &str = "amount";
pub const BALANCE: &str = "balance";

/// One row of a statement export. We don't deserialize into a fixed struct
/// because exports carry whatever extra columns the bank felt like adding, and
/// we only ever look at `date`, `amount` and `balance`. So a record keeps the
/// header of the file it was read from and looks columns up by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    headers: Rc<StringRecord>,
    values: StringRecord,
}

impl Record {
    pub fn new(headers: Rc<StringRecord>, values: StringRecord) -> Self {
        Self { headers, values }
    }

    /// Value of `column` in this row, or `None` if this row's file has no such
    /// column. A row cut short before `column` reads as a blank cell.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|header| header == column)
            .map(|index| self.values.get(index).unwrap_or(""))
    }
}

/// Ordered rows of one or more statement files, in file order then row order.
///
/// Besides the rows we keep every distinct header we've seen (one per file),
/// so that asking for a column nobody has is a `MissingColumn`, while asking
/// for a column only *some* files have is a `SchemaMismatch` on the first row
/// that lacks it. Files are never reconciled against each other at load time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RecordSet {
    schemas: Vec<Rc<StringRecord>>,
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the rows of a single file sharing `headers`.
    pub fn from_file(headers: StringRecord, rows: Vec<StringRecord>) -> Self {
        let headers = Rc::new(headers);
        Self {
            records: rows
                .into_iter()
                .map(|values| Record::new(Rc::clone(&headers), values))
                .collect(),
            schemas: vec![headers],
        }
    }

    /// Appends `other` after our own rows.
    pub fn append(&mut self, other: RecordSet) {
        self.schemas.extend(other.schemas);
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raw text of `column` for every row, see [`column_values`].
    pub fn column(&self, column: &'static str) -> Result<Vec<&str>, Error> {
        let numbered = self.records.iter().enumerate().map(|(index, record)| (index + 1, record));
        column_values(&self.schemas, numbered, column)
    }

    pub fn schemas(&self) -> &[Rc<StringRecord>] {
        &self.schemas
    }

    #[cfg(test)]
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self::from_file(
            StringRecord::from(headers.to_vec()),
            rows.iter().map(|row| StringRecord::from(row.to_vec())).collect(),
        )
    }
}

/// A record whose `date` parsed. `row` is its position (from 1) in the
/// `RecordSet` it came from, so errors point at the line the user can find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DatedRecord {
    pub row: usize,
    pub date: NaiveDateTime,
    pub record: Record,
}

/// Rows restricted to those with a valid date, sorted ascending by that date.
/// Rows sharing a date keep the order they had in the source `RecordSet`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct NormalizedRecordSet {
    schemas: Vec<Rc<StringRecord>>,
    rows: Vec<DatedRecord>,
}

impl NormalizedRecordSet {
    /// `rows` must already be sorted by date.
    pub fn new(schemas: Vec<Rc<StringRecord>>, rows: Vec<DatedRecord>) -> Self {
        debug_assert!(rows.windows(2).all(|pair| pair[0].date <= pair[1].date));
        Self { schemas, rows }
    }

    pub fn rows(&self) -> &[DatedRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `(source row, date, raw text)` of `column` for every row, in date order.
    pub fn column(
        &self,
        column: &'static str,
    ) -> Result<Vec<(usize, NaiveDateTime, &str)>, Error> {
        let rows = self.rows();
        let numbered = rows.iter().map(|row| (row.row, &row.record));
        let values = column_values(&self.schemas, numbered, column)?;
        Ok(rows
            .iter()
            .zip(values)
            .map(|(row, value)| (row.row, row.date, value))
            .collect())
    }
}

/// Looks `column` up in every record.
///
/// A set built from no file at all has no schema and yields nothing. Otherwise
/// the column must be present in at least one schema, and then in the file of
/// every single row. Records come numbered with their row in the loaded set.
fn column_values<'a>(
    schemas: &[Rc<StringRecord>],
    records: impl Iterator<Item = (usize, &'a Record)>,
    column: &'static str,
) -> Result<Vec<&'a str>, Error> {
    if !schemas.is_empty() && !schemas.iter().any(|schema| schema.iter().any(|h| h == column)) {
        return Err(Error::MissingColumn(column));
    }
    records
        .map(|(row, record)| record.get(column).ok_or(Error::SchemaMismatch { column, row }))
        .collect()
}

/// Everything that can go wrong between reading the statements and handing
/// the charts over. Malformed dates are deliberately absent: those rows are
/// just left out of the time series.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot read statement {}: {source}", .path.display())]
    Ingestion {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Statement {} has no header row", .0.display())]
    MissingHeader(PathBuf),
    #[error("Invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Row {row} comes from a file without a `{column}` column")]
    SchemaMismatch { column: &'static str, row: usize },
    #[error("No `{0}` column in the statements")]
    MissingColumn(&'static str),
    #[error("Row {row}: `{column}` value {value:?} is not a number")]
    InvalidValue {
        column: &'static str,
        row: usize,
        value: String,
    },
    #[error("Cannot write chart: {0}")]
    Output(#[from] csv::Error),
}
