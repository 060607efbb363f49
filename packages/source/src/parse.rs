//! Converts raw tables and `GeoJSON` features into typed records.
//!
//! Rows missing their key column are skipped with a warning; every other
//! missing cell becomes `None` or an `Unknown` category.

use chrono::NaiveDate;
use nj_sdwa_models::geometry::{multipolygon_from_geometry, parse_multipolygon};
use nj_sdwa_models::watershed::normalize_huc12;
use nj_sdwa_models::{
    BlockGroup, DischargeRecord, HealthBased, LeadServiceLineReport, PublicWaterSystem, PwsType,
    ServiceArea, SourceWater, SystemSize, Violation, Watershed,
};

use crate::table::{Row, Table};

fn skipped(kind: &str, skipped: usize) {
    if skipped > 0 {
        log::warn!("Skipped {skipped} malformed {kind} rows");
    }
}

fn coordinate(row: &Row<'_>, name: &str) -> Option<f64> {
    row.parse::<f64>(name).filter(|v| v.is_finite())
}

/// Parses `MM/DD/YYYY`, `YYYY-MM-DD`, or a timestamp starting with
/// `YYYY-MM-DD`.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
        .or_else(|| {
            s.get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        })
}

/// Parses a count such as `"1,234"` or `"12.0"`. Negative and
/// non-numeric values read as missing.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_count(s: &str) -> Option<u64> {
    let value: f64 = s.trim().replace(',', "").parse().ok()?;
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}

/// Rows of `SDWA_PUBLIC_WATER_SYSTEMS_MVIEW`.
#[must_use]
pub fn public_water_systems(table: &Table) -> Vec<PublicWaterSystem> {
    let mut bad = 0;
    let systems = table
        .rows()
        .filter_map(|row| {
            let Some(pwsid) = row.get("PWSID") else {
                bad += 1;
                return None;
            };
            Some(PublicWaterSystem {
                pwsid: pwsid.to_string(),
                name: row
                    .get_any(&["FAC_NAME", "PWS_NAME"])
                    .unwrap_or_default()
                    .to_string(),
                pws_type: PwsType::from_code(row.get("PWS_TYPE_CODE").unwrap_or_default()),
                source_water: SourceWater::from_code(
                    row.get_any(&["SOURCE_WATER", "PRIMARY_SOURCE_CODE"])
                        .unwrap_or_default(),
                ),
                system_size: SystemSize::from_label(
                    row.get_any(&["SYSTEM_SIZE", "PWS_SIZE"]).unwrap_or_default(),
                ),
                fiscal_year: row
                    .get("FISCAL_YEAR")
                    .and_then(|y| y.split('.').next())
                    .and_then(|y| y.parse().ok()),
                latitude: coordinate(&row, "FAC_LAT"),
                longitude: coordinate(&row, "FAC_LONG"),
            })
        })
        .collect();
    skipped("public water system", bad);
    systems
}

/// Rows of `SDWA_VIOLATIONS_MVIEW`.
#[must_use]
pub fn violations(table: &Table) -> Vec<Violation> {
    let mut bad = 0;
    let rows = table
        .rows()
        .filter_map(|row| {
            let Some(pwsid) = row.get("PWSID") else {
                bad += 1;
                return None;
            };
            Some(Violation {
                pwsid: pwsid.to_string(),
                facility_name: row
                    .get_any(&["FAC_NAME", "PWS_NAME"])
                    .unwrap_or_default()
                    .to_string(),
                health_based: HealthBased::from_flag(row.get("HEALTH_BASED").unwrap_or_default()),
                pws_type: PwsType::from_code(row.get("PWS_TYPE_CODE").unwrap_or_default()),
                pws_size: row.get("PWS_SIZE").unwrap_or("N/A").to_string(),
                source_water: SourceWater::from_code(row.get("SOURCE_WATER").unwrap_or_default()),
                latitude: coordinate(&row, "FAC_LAT"),
                longitude: coordinate(&row, "FAC_LONG"),
                begin_date: row
                    .get_any(&["COMPL_PER_BEGIN_DATE", "BEGIN_DATE"])
                    .and_then(parse_date),
            })
        })
        .collect();
    skipped("violation", bad);
    rows
}

/// Rows of the published lead service line CSV.
#[must_use]
pub fn lead_reports(table: &Table) -> Vec<LeadServiceLineReport> {
    let mut bad = 0;
    let reports = table
        .rows()
        .filter_map(|row| {
            let Some(pwsid) = row.get("PWSID") else {
                bad += 1;
                return None;
            };
            Some(LeadServiceLineReport {
                pwsid: pwsid.to_string(),
                utility: row.get("Utility").unwrap_or_default().to_string(),
                lead_lines: row
                    .get("Measurement (service lines)")
                    .and_then(parse_count),
                system_size: row.get("size").map(ToString::to_string),
            })
        })
        .collect();
    skipped("lead service line", bad);
    reports
}

/// Rows of `wbdhu12` selected with a `geojson` column.
#[must_use]
pub fn watersheds(table: &Table) -> Vec<Watershed> {
    let mut bad = 0;
    let sheds = table
        .rows()
        .filter_map(|row| {
            let huc12 = row.get("huc12").and_then(normalize_huc12);
            let geometry = row.get("geojson").and_then(parse_multipolygon);
            let (Some(huc12), Some(geometry)) = (huc12, geometry) else {
                bad += 1;
                return None;
            };
            Some(Watershed {
                huc12,
                name: row.get("name").unwrap_or_default().to_string(),
                geometry,
            })
        })
        .collect();
    skipped("watershed", bad);
    sheds
}

/// Rows of the discharge monitoring report table.
#[must_use]
pub fn discharges(table: &Table) -> Vec<DischargeRecord> {
    let mut bad = 0;
    let records = table
        .rows()
        .filter_map(|row| {
            let (Some(permit), Some(parameter)) =
                (row.get("EXTERNAL_PERMIT_NMBR"), row.get("PARAMETER_DESC"))
            else {
                bad += 1;
                return None;
            };
            Some(DischargeRecord {
                permit: permit.to_string(),
                facility_name: row.get("FAC_NAME").unwrap_or_default().to_string(),
                parameter: parameter.to_string(),
                unit: row.get("STANDARD_UNIT_DESC").unwrap_or_default().to_string(),
                value: row
                    .parse::<f64>("DMR_VALUE_STANDARD_UNITS")
                    .filter(|v| v.is_finite()),
                latitude: coordinate(&row, "FAC_LAT"),
                longitude: coordinate(&row, "FAC_LONG"),
                sic_codes: row.get("FAC_SIC_CODES").map(ToString::to_string),
                naics_codes: row.get("FAC_NAICS_CODES").map(ToString::to_string),
                huc12: row.get("FAC_DERIVED_WBD").and_then(normalize_huc12),
            })
        })
        .collect();
    skipped("discharge", bad);
    records
}

/// Reads a feature property as text. Numbers are formatted without a
/// trailing `.0`.
#[must_use]
pub fn property_string(feature: &geojson::Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        serde_json::Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        serde_json::Value::Number(n) => Some(
            n.as_i64()
                .map_or_else(|| n.to_string(), |i| i.to_string()),
        ),
        _ => None,
    }
}

/// NJDEP purveyor service area features.
#[must_use]
pub fn service_areas(features: Vec<geojson::Feature>) -> Vec<ServiceArea> {
    let mut bad = 0;
    let areas = features
        .into_iter()
        .filter_map(|feature| {
            let pwid = property_string(&feature, "PWID");
            let system_name = property_string(&feature, "SYS_NAME").unwrap_or_default();
            let agency_url = property_string(&feature, "AGENCY_URL");
            let pwid_url = property_string(&feature, "PWID_URL");
            let notes = property_string(&feature, "NOTES");
            let geometry = feature.geometry.and_then(multipolygon_from_geometry);
            let (Some(pwid), Some(geometry)) = (pwid, geometry) else {
                bad += 1;
                return None;
            };
            Some(ServiceArea {
                pwid,
                system_name,
                agency_url,
                pwid_url,
                notes,
                geometry,
            })
        })
        .collect();
    skipped("service area", bad);
    areas
}

/// Census block group features keyed by `GEOID20`.
#[must_use]
pub fn block_groups(features: Vec<geojson::Feature>) -> Vec<BlockGroup> {
    let mut bad = 0;
    let groups = features
        .into_iter()
        .filter_map(|feature| {
            let geoid = property_string(&feature, "GEOID20");
            let geometry = feature.geometry.and_then(multipolygon_from_geometry);
            let (Some(geoid), Some(geometry)) = (geoid, geometry) else {
                bad += 1;
                return None;
            };
            Some(BlockGroup { geoid, geometry })
        })
        .collect();
    skipped("block group", bad);
    groups
}
