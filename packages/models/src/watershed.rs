//! HUC12 watersheds and discharge monitoring report rows.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// A 12-digit hydrologic unit from the Watershed Boundary Dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Watershed {
    /// Zero-padded 12-digit code.
    pub huc12: String,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// Normalizes a HUC12 code read from CSV.
///
/// Numeric exports drop leading zeros and sometimes carry a trailing
/// `.0`; both are repaired. Returns `None` for blank or non-numeric codes.
#[must_use]
pub fn normalize_huc12(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{digits:0>12}"))
}

/// One discharge monitoring report value from `DMR_FY2022_MVIEW`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DischargeRecord {
    /// NPDES permit number.
    pub permit: String,
    pub facility_name: String,
    /// Pollutant, e.g. `"Nitrogen, total [as N]"`.
    pub parameter: String,
    /// Standard unit for `value`.
    pub unit: String,
    /// Reported value in standard units.
    pub value: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub sic_codes: Option<String>,
    pub naics_codes: Option<String>,
    /// Watershed the facility sits in.
    pub huc12: Option<String>,
}
