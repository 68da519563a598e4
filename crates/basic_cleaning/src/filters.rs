//! Row predicates and cell normalization

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use contracts::ContractError;

/// Cell written for a review date that is missing or unparseable
pub const NO_REVIEW: &str = "";

/// Output format of normalized review dates
pub const REVIEW_DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Closed price interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

impl PriceBounds {
    /// # Errors
    /// Configuration error when `min > max` or a bound is NaN
    pub fn new(min: f64, max: f64) -> Result<Self, ContractError> {
        if min.is_nan() || max.is_nan() {
            return Err(ContractError::config_validation(
                "min_price / max_price",
                "price bounds must be numbers",
            ));
        }
        if min > max {
            return Err(ContractError::config_validation(
                "min_price / max_price",
                format!("min_price ({min}) must be <= max_price ({max})"),
            ));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Geographic bounding box, all edges inclusive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBox {
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub min_latitude: f64,
    pub max_latitude: f64,
}

impl GeoBox {
    /// New York City listings
    pub const NYC: GeoBox = GeoBox {
        min_longitude: -74.25,
        max_longitude: -73.50,
        min_latitude: 40.5,
        max_latitude: 41.2,
    };

    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        (self.min_longitude..=self.max_longitude).contains(&longitude)
            && (self.min_latitude..=self.max_latitude).contains(&latitude)
    }
}

impl Default for GeoBox {
    fn default() -> Self {
        Self::NYC
    }
}

/// Numeric cell value; empty or non-numeric cells yield None
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Review date of a cell, if it holds one
pub fn parse_review_date(cell: &str) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                .map(|datetime| datetime.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|datetime| datetime.date_naive())
        })
}

/// Normalized review cell: `YYYY-MM-DD` or [`NO_REVIEW`]
pub fn normalize_review_date(cell: &str) -> String {
    parse_review_date(cell)
        .map(|date| date.format(REVIEW_DATE_FORMAT).to_string())
        .unwrap_or_else(|| NO_REVIEW.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_bounds_inclusive() {
        let bounds = PriceBounds::new(10.0, 350.0).unwrap();
        assert!(bounds.contains(10.0));
        assert!(bounds.contains(350.0));
        assert!(bounds.contains(120.5));
        assert!(!bounds.contains(9.99));
        assert!(!bounds.contains(350.01));
        assert!(!bounds.contains(f64::NAN));
    }

    #[test]
    fn test_price_bounds_rejects_inverted() {
        assert!(PriceBounds::new(500.0, 10.0).is_err());
        assert!(PriceBounds::new(f64::NAN, 10.0).is_err());
        assert!(PriceBounds::new(10.0, 10.0).is_ok());
    }

    #[test]
    fn test_geo_box_edges() {
        let nyc = GeoBox::NYC;
        assert!(nyc.contains(-74.25, 40.5));
        assert!(nyc.contains(-73.50, 41.2));
        assert!(nyc.contains(-73.95, 40.7));
        assert!(!nyc.contains(-75.0, 40.7));
        assert!(!nyc.contains(-73.95, 41.3));
        assert!(!nyc.contains(-73.49, 40.7));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 150 "), Some(150.0));
        assert_eq!(parse_number("-73.95"), Some(-73.95));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("$150"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_review_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2019, 5, 21).unwrap();
        for cell in [
            "2019-05-21",
            "2019/05/21",
            "05/21/2019",
            "2019-05-21 13:45:00",
            "2019-05-21T13:45:00",
            "2019-05-21T13:45:00+00:00",
        ] {
            assert_eq!(parse_review_date(cell), Some(expected), "cell: {cell}");
        }
    }

    #[test]
    fn test_unparseable_review_becomes_null_marker() {
        assert_eq!(normalize_review_date(""), NO_REVIEW);
        assert_eq!(normalize_review_date("last spring"), NO_REVIEW);
        assert_eq!(normalize_review_date("2019-13-40"), NO_REVIEW);
        assert_eq!(normalize_review_date("2019/5/21"), "2019-05-21");
    }
}
