//! Discharge monitoring summaries for the watershed page.

use std::collections::{BTreeMap, BTreeSet};

use nj_sdwa_models::DischargeRecord;
use serde::Serialize;

use crate::{CategoryCount, distinct_count_by, quantile_bins, sum_by};

/// Number of report-count bins for permit markers.
pub const REPORT_BINS: usize = 4;

/// Summed measurements of one pollutant at one facility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityTotal {
    pub parameter: String,
    pub facility_name: String,
    pub unit: String,
    pub total: f64,
}

/// How often one permit reported a pollutant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermitReports {
    pub permit: String,
    pub facility_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub sic_codes: Option<String>,
    pub naics_codes: Option<String>,
    pub reports: u64,
    /// Quartile of `reports` among the permits, `0..REPORT_BINS`.
    pub bin: usize,
}

impl PermitReports {
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Pollutants ranked by how many distinct facilities report them.
#[must_use]
pub fn top_pollutants(records: &[DischargeRecord]) -> Vec<CategoryCount> {
    distinct_count_by(
        records,
        |r| Some(r.parameter.clone()).filter(|p| !p.is_empty()),
        |r| Some(r.facility_name.clone()).filter(|f| !f.is_empty()),
    )
}

/// Total measured value per (facility, unit) for one pollutant, largest
/// first.
#[must_use]
pub fn pollutant_totals_by_facility(
    records: &[DischargeRecord],
    parameter: &str,
) -> Vec<FacilityTotal> {
    let rows: Vec<&DischargeRecord> = records
        .iter()
        .filter(|r| r.parameter == parameter)
        .collect();

    sum_by(
        &rows,
        |r| Some((r.facility_name.clone(), r.unit.clone())),
        |r| r.value,
    )
    .into_iter()
    .map(|sum| FacilityTotal {
        parameter: parameter.to_string(),
        facility_name: sum.category.0,
        unit: sum.category.1,
        total: sum.total,
    })
    .collect()
}

/// Units a pollutant is reported in, sorted.
#[must_use]
pub fn units_for(records: &[DischargeRecord], parameter: &str) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.parameter == parameter && !r.unit.is_empty())
        .map(|r| r.unit.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Counts reports of one pollutant per permit and bins the counts into
/// quartiles.
///
/// Permits keep the order of their first report. Facility details come
/// from the first report of each permit that carries coordinates, falling
/// back to its first report.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn reports_per_permit(records: &[DischargeRecord], parameter: &str) -> Vec<PermitReports> {
    let mut permits: Vec<PermitReports> = Vec::new();
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();

    for record in records.iter().filter(|r| r.parameter == parameter) {
        if let Some(&i) = index.get(record.permit.as_str()) {
            let permit = &mut permits[i];
            permit.reports += 1;
            if permit.latitude.is_none() && record.latitude.is_some() {
                permit.facility_name.clone_from(&record.facility_name);
                permit.latitude = record.latitude;
                permit.longitude = record.longitude;
                permit.sic_codes.clone_from(&record.sic_codes);
                permit.naics_codes.clone_from(&record.naics_codes);
            }
            continue;
        }
        index.insert(record.permit.as_str(), permits.len());
        permits.push(PermitReports {
            permit: record.permit.clone(),
            facility_name: record.facility_name.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            sic_codes: record.sic_codes.clone(),
            naics_codes: record.naics_codes.clone(),
            reports: 1,
            bin: 0,
        });
    }

    let counts: Vec<f64> = permits.iter().map(|p| p.reports as f64).collect();
    for (permit, bin) in permits.iter_mut().zip(quantile_bins(&counts, REPORT_BINS)) {
        permit.bin = bin;
    }

    permits
}
