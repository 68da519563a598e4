//! Cleaning rules
//!
//! Applied in order, each row independently, preserving row order:
//! 1. keep rows with `min_price <= price <= max_price`
//! 2. normalize `last_review` to a date or the null marker
//! 3. keep rows inside the geographic box

use contracts::ContractError;
use serde::Serialize;

use crate::filters::{normalize_review_date, parse_number, GeoBox, PriceBounds, NO_REVIEW};
use crate::table::Table;

pub const PRICE_COLUMN: &str = "price";
pub const LONGITUDE_COLUMN: &str = "longitude";
pub const LATITUDE_COLUMN: &str = "latitude";
pub const LAST_REVIEW_COLUMN: &str = "last_review";

/// Columns the stage cannot run without
pub const REQUIRED_COLUMNS: [&str; 4] = [
    PRICE_COLUMN,
    LONGITUDE_COLUMN,
    LATITUDE_COLUMN,
    LAST_REVIEW_COLUMN,
];

/// Filter parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleaningParams {
    pub price: PriceBounds,
    pub geo: GeoBox,
}

impl CleaningParams {
    /// Price bounds with the default geographic box
    pub fn with_price(price: PriceBounds) -> Self {
        Self {
            price,
            geo: GeoBox::default(),
        }
    }
}

/// What the filters did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub after_price_filter: usize,
    pub output_rows: usize,
    /// Retained rows whose review date is the null marker
    pub missing_review_dates: usize,
}

struct Columns {
    price: usize,
    longitude: usize,
    latitude: usize,
    last_review: usize,
}

impl Columns {
    fn resolve(table: &Table) -> Result<Self, ContractError> {
        Ok(Self {
            price: table.column_index(PRICE_COLUMN)?,
            longitude: table.column_index(LONGITUDE_COLUMN)?,
            latitude: table.column_index(LATITUDE_COLUMN)?,
            last_review: table.column_index(LAST_REVIEW_COLUMN)?,
        })
    }
}

/// Filter and normalize `table`
///
/// # Errors
/// [`ContractError::Schema`] when a required column is missing; nothing is
/// filtered in that case.
pub fn clean_table(
    table: Table,
    params: &CleaningParams,
) -> Result<(Table, CleaningReport), ContractError> {
    let columns = Columns::resolve(&table)?;
    let Table { headers, rows } = table;

    let mut report = CleaningReport {
        input_rows: rows.len(),
        ..Default::default()
    };

    let mut kept = Vec::with_capacity(rows.len());
    for mut row in rows {
        let price = cell(&row, columns.price).and_then(parse_number);
        if !price.is_some_and(|p| params.price.contains(p)) {
            continue;
        }
        report.after_price_filter += 1;

        if let Some(review) = row.get_mut(columns.last_review) {
            *review = normalize_review_date(review);
        }

        let longitude = cell(&row, columns.longitude).and_then(parse_number);
        let latitude = cell(&row, columns.latitude).and_then(parse_number);
        let inside = match (longitude, latitude) {
            (Some(lon), Some(lat)) => params.geo.contains(lon, lat),
            _ => false,
        };
        if !inside {
            continue;
        }

        if cell(&row, columns.last_review) == Some(NO_REVIEW) {
            report.missing_review_dates += 1;
        }
        kept.push(row);
    }

    report.output_rows = kept.len();
    Ok((Table::new(headers, kept), report))
}

fn cell(row: &[String], index: usize) -> Option<&str> {
    row.get(index).map(String::as_str)
}
