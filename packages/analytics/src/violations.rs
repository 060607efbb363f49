//! Violation counts per system and per facility.

use std::collections::{BTreeMap, BTreeSet};

use nj_sdwa_models::{HealthBased, PublicWaterSystem, PwsType, SourceWater, Violation};
use serde::Serialize;

/// `PWS_SIZE` shown for systems that have no violation rows.
pub const NO_SIZE: &str = "N/A";

/// One marker on the violations map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemViolationCount {
    pub pwsid: String,
    pub facility_name: String,
    pub pws_type: PwsType,
    pub pws_size: String,
    pub source_water: SourceWater,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub count: u64,
}

impl SystemViolationCount {
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Violations recorded at one facility with one health-based flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacilityHealthCount {
    pub facility_name: String,
    pub health_based: HealthBased,
    pub count: u64,
}

/// Table row standing in for a system that has no violations.
#[must_use]
pub fn placeholder_violation(system: &PublicWaterSystem) -> Violation {
    Violation {
        pwsid: system.pwsid.clone(),
        facility_name: system.name.clone(),
        health_based: HealthBased::No,
        pws_type: system.pws_type,
        pws_size: NO_SIZE.to_string(),
        source_water: system.source_water,
        latitude: system.latitude,
        longitude: system.longitude,
        begin_date: None,
    }
}

/// Counts violations per PWSID.
///
/// Systems with violations come first, in the order their first violation
/// appears, described by that first row. Every system in `systems` without
/// a violation follows with a count of zero and [`NO_SIZE`].
#[must_use]
pub fn violation_counts_by_system(
    violations: &[Violation],
    systems: &[PublicWaterSystem],
) -> Vec<SystemViolationCount> {
    let mut order: Vec<SystemViolationCount> = Vec::new();
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();

    for violation in violations {
        if let Some(&i) = index.get(violation.pwsid.as_str()) {
            order[i].count += 1;
            continue;
        }
        index.insert(violation.pwsid.as_str(), order.len());
        order.push(SystemViolationCount {
            pwsid: violation.pwsid.clone(),
            facility_name: violation.facility_name.clone(),
            pws_type: violation.pws_type,
            pws_size: violation.pws_size.clone(),
            source_water: violation.source_water,
            latitude: violation.latitude,
            longitude: violation.longitude,
            count: 1,
        });
    }

    let mut seen: BTreeSet<&str> = index.keys().copied().collect();
    for system in systems {
        if !seen.insert(system.pwsid.as_str()) {
            continue;
        }
        let placeholder = placeholder_violation(system);
        order.push(SystemViolationCount {
            pwsid: placeholder.pwsid,
            facility_name: placeholder.facility_name,
            pws_type: placeholder.pws_type,
            pws_size: placeholder.pws_size,
            source_water: placeholder.source_water,
            latitude: placeholder.latitude,
            longitude: placeholder.longitude,
            count: 0,
        });
    }

    log::debug!(
        "{} violations across {} systems",
        violations.len(),
        order.len()
    );
    order
}

/// Counts violations per (facility, health-based) pair, largest first.
#[must_use]
pub fn violations_by_facility_and_health(violations: &[Violation]) -> Vec<FacilityHealthCount> {
    let mut counts: BTreeMap<(&str, HealthBased), u64> = BTreeMap::new();
    for violation in violations {
        *counts
            .entry((violation.facility_name.as_str(), violation.health_based))
            .or_default() += 1;
    }

    let mut counts: Vec<FacilityHealthCount> = counts
        .into_iter()
        .map(|((facility_name, health_based), count)| FacilityHealthCount {
            facility_name: facility_name.to_string(),
            health_based,
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

#[cfg(test)]
mod tests {
    use nj_sdwa_models::SystemSize;

    use super::*;

    fn violation(pwsid: &str, facility: &str, health: HealthBased) -> Violation {
        Violation {
            pwsid: pwsid.to_string(),
            facility_name: facility.to_string(),
            health_based: health,
            pws_type: PwsType::Community,
            pws_size: "Small".to_string(),
            source_water: SourceWater::Groundwater,
            latitude: Some(40.9),
            longitude: Some(-74.2),
            begin_date: None,
        }
    }

    fn system(pwsid: &str) -> PublicWaterSystem {
        PublicWaterSystem {
            pwsid: pwsid.to_string(),
            name: format!("System {pwsid}"),
            pws_type: PwsType::TransientNonCommunity,
            source_water: SourceWater::SurfaceWater,
            system_size: SystemSize::VerySmall,
            fiscal_year: Some(2021),
            latitude: Some(40.95),
            longitude: Some(-74.15),
        }
    }

    #[test]
    fn counts_per_system_with_zero_rows() {
        let violations = vec![
            violation("NJ1", "Plant 1", HealthBased::Yes),
            violation("NJ2", "Plant 2", HealthBased::No),
            violation("NJ1", "Plant 1", HealthBased::No),
        ];
        let systems = vec![system("NJ1"), system("NJ3")];

        let counts = violation_counts_by_system(&violations, &systems);
        let flat: Vec<(&str, u64)> = counts.iter().map(|c| (c.pwsid.as_str(), c.count)).collect();
        assert_eq!(flat, vec![("NJ1", 2), ("NJ2", 1), ("NJ3", 0)]);
        assert_eq!(counts[2].pws_size, NO_SIZE);
        assert_eq!(counts[0].pws_size, "Small");
        assert_eq!(
            counts.iter().map(|c| c.count).sum::<u64>(),
            violations.len() as u64
        );
    }

    #[test]
    fn placeholder_is_not_health_based() {
        let row = placeholder_violation(&system("NJ9"));
        assert_eq!(row.health_based, HealthBased::No);
        assert_eq!(row.pws_size, NO_SIZE);
        assert_eq!(row.facility_name, "System NJ9");
    }

    #[test]
    fn facility_health_pairs() {
        let violations = vec![
            violation("NJ1", "Plant 1", HealthBased::Yes),
            violation("NJ1", "Plant 1", HealthBased::Yes),
            violation("NJ1", "Plant 1", HealthBased::No),
            violation("NJ2", "Plant 2", HealthBased::No),
        ];
        let counts = violations_by_facility_and_health(&violations);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[0].facility_name, "Plant 1");
        assert_eq!(counts[0].health_based, HealthBased::Yes);
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts.iter().map(|c| c.count).sum::<u64>(), 4);
    }

    #[test]
    fn empty_inputs() {
        assert!(violation_counts_by_system(&[], &[]).is_empty());
        assert!(violations_by_facility_and_health(&[]).is_empty());
    }
}
