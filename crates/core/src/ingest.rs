//! Transaction table loader.
//!
//! Expected columns (extra columns are ignored):
//!   ID_cliente, CodigoCompra, ValorTotal, DiaCompra

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::transaction::Transaction;
use crate::errors::ValidationError;

pub const CUSTOMER_ID_COLUMN: &str = "ID_cliente";
pub const PURCHASE_ID_COLUMN: &str = "CodigoCompra";
pub const AMOUNT_COLUMN: &str = "ValorTotal";
pub const DATE_COLUMN: &str = "DiaCompra";

pub const REQUIRED_COLUMNS: [&str; 4] =
    [CUSTOMER_ID_COLUMN, PURCHASE_ID_COLUMN, AMOUNT_COLUMN, DATE_COLUMN];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReaderOptions {
    pub delimiter: u8,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

struct ColumnPositions {
    customer_id: usize,
    purchase_id: usize,
    amount: usize,
    date: usize,
}

/// Reads and validates the whole table. Nothing is returned unless every row
/// passes: missing columns, empty cells, bad amounts and bad dates all abort.
pub fn load_transactions<R: Read>(
    reader: R,
    options: &ReaderOptions,
) -> Result<Vec<Transaction>, ValidationError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|error| ValidationError::Read(format!("could not read header row: {error}")))?
        .clone();
    let positions = locate_columns(&headers)?;

    let mut transactions = Vec::new();
    let mut invalid_date_rows = Vec::new();
    let mut first_invalid_date: Option<String> = None;

    for (index, result) in csv_reader.records().enumerate() {
        let record =
            result.map_err(|error| ValidationError::Read(format!("CSV parse error: {error}")))?;
        let line = record.position().map(|pos| pos.line() as usize).unwrap_or(index + 2);

        let customer_id = required_field(&record, positions.customer_id, CUSTOMER_ID_COLUMN, line)?;
        let purchase_id = required_field(&record, positions.purchase_id, PURCHASE_ID_COLUMN, line)?;
        let raw_amount = required_field(&record, positions.amount, AMOUNT_COLUMN, line)?;
        let raw_date = required_field(&record, positions.date, DATE_COLUMN, line)?;

        let amount = parse_amount(raw_amount)
            .ok_or_else(|| ValidationError::InvalidAmount { row: line, value: raw_amount.to_string() })?;

        let Some(purchased_on) = parse_purchase_date(raw_date) else {
            invalid_date_rows.push(line);
            first_invalid_date.get_or_insert_with(|| raw_date.to_string());
            continue;
        };

        transactions.push(Transaction::new(customer_id, purchase_id, amount, purchased_on));
    }

    if !invalid_date_rows.is_empty() {
        debug!(
            event_name = "rfv.ingest.invalid_dates",
            rows = invalid_date_rows.len(),
            "date column failed to parse"
        );
        return Err(ValidationError::InvalidDate {
            column: DATE_COLUMN.to_string(),
            rows: invalid_date_rows,
            first_value: first_invalid_date.unwrap_or_default(),
        });
    }

    info!(event_name = "rfv.ingest.loaded", rows = transactions.len(), "transactions loaded");
    Ok(transactions)
}

pub fn load_transactions_file(
    path: &Path,
    options: &ReaderOptions,
) -> Result<Vec<Transaction>, ValidationError> {
    let file = File::open(path).map_err(|error| {
        ValidationError::Read(format!("failed to open `{}`: {error}", path.display()))
    })?;
    load_transactions(file, options)
}

fn locate_columns(headers: &csv::StringRecord) -> Result<ColumnPositions, ValidationError> {
    let position = |name: &str| {
        headers.iter().position(|header| header.trim_start_matches('\u{feff}') == name)
    };

    let found: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|name| position(*name)).collect();
    match found.as_slice() {
        [Some(customer_id), Some(purchase_id), Some(amount), Some(date)] => Ok(ColumnPositions {
            customer_id: *customer_id,
            purchase_id: *purchase_id,
            amount: *amount,
            date: *date,
        }),
        _ => Err(ValidationError::MissingColumns {
            columns: REQUIRED_COLUMNS
                .iter()
                .zip(&found)
                .filter(|(_, position)| position.is_none())
                .map(|(name, _)| name.to_string())
                .collect(),
        }),
    }
}

fn required_field<'r>(
    record: &'r csv::StringRecord,
    position: usize,
    column: &str,
    line: usize,
) -> Result<&'r str, ValidationError> {
    match record.get(position) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::MissingValue { column: column.to_string(), row: line }),
    }
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
        .filter(|amount| !amount.is_sign_negative() || amount.is_zero())
}

/// Accepts ISO dates, ISO date-times and RFC 3339 timestamps. Time of day is dropped.
pub fn parse_purchase_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|datetime| datetime.date())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|datetime| datetime.date_naive()))
}
