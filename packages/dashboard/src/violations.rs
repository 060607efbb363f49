//! Safe Drinking Water Act violations for systems in a region.

use std::collections::BTreeSet;
use std::sync::Arc;

use nj_sdwa_analytics::{
    SystemViolationCount, placeholder_violation, violation_counts_by_system,
    violations_by_facility_and_health,
};
use nj_sdwa_models::{HealthBased, PublicWaterSystem, Region, Violation};
use nj_sdwa_render::{
    Bar, BarChart, DataTable, LinearColormap, MapLayer, MapView, MarkerStyle, PolygonStyle, Ramp,
    cell, popup,
};
use nj_sdwa_spatial::{Selection, left_join_by_key};
use serde::Serialize;
use serde_json::Value;

use crate::{Dashboard, Page, PageError, properties, unique_ids};

/// Shown when the region holds no systems at all.
pub const NO_SYSTEMS_MESSAGE: &str = "There are no public water systems in this area.";

const MARKER_RADIUS: f64 = 12.0;

const VIOLATION_HEADERS: [&str; 9] = [
    "PWSID",
    "FAC_NAME",
    "PWS_TYPE_CODE",
    "PWS_SIZE",
    "SOURCE_WATER",
    "HEALTH_BASED",
    "COMPL_PER_BEGIN_DATE",
    "FAC_LAT",
    "FAC_LONG",
];

#[derive(Debug, Clone, Serialize)]
pub struct ViolationsPage {
    pub map: MapView,
    /// One entry per system, zero-count systems included.
    pub counts: Vec<SystemViolationCount>,
    pub chart: BarChart,
    pub table: DataTable,
    pub csv: String,
}

impl Page for ViolationsPage {
    const CSV_FILENAME: &'static str = "selected_public_water_systems_violations.csv";

    fn table(&self) -> &DataTable {
        &self.table
    }

    fn csv(&self) -> &str {
        &self.csv
    }
}

fn violation_table(rows: &[Violation]) -> DataTable {
    let mut table = DataTable::new(VIOLATION_HEADERS);
    for v in rows {
        table.push_row(vec![
            v.pwsid.clone(),
            v.facility_name.clone(),
            v.pws_type.to_string(),
            v.pws_size.clone(),
            v.source_water.to_string(),
            v.health_based.to_string(),
            cell(v.begin_date),
            cell(v.latitude),
            cell(v.longitude),
        ]);
    }
    table
}

/// Markers colored by violation count, darker for more violations.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn count_markers(counts: &[SystemViolationCount]) -> MapLayer {
    let colormap = LinearColormap::scaled(Ramp::Reds, counts.iter().map(|c| Some(c.count as f64)));
    let mut layer = MapLayer::new("Violations");
    for count in counts {
        let Some((lat, lng)) = count.coordinates() else {
            continue;
        };
        let style = MarkerStyle::filled(MARKER_RADIUS, colormap.color(Some(count.count as f64)));
        layer.push_marker(
            lat,
            lng,
            &style,
            popup(
                &count.facility_name,
                &[
                    ("Violations since 2001", count.count.to_string()),
                    ("Source", count.source_water.to_string()),
                    ("Size", count.pws_size.clone()),
                    ("Type", count.pws_type.to_string()),
                ],
            ),
            properties([
                ("PWSID", Value::from(count.pwsid.as_str())),
                ("VIOLATIONS_COUNT", Value::from(count.count)),
            ]),
        );
    }
    layer.with_colormap(colormap)
}

/// Service area outlines carrying the violation count of their system.
fn service_area_counts(selection: &Selection, counts: &[SystemViolationCount]) -> MapLayer {
    let mut layer = MapLayer::new("Purveyor Service Areas");
    let style = PolygonStyle::outline();
    let joined = left_join_by_key(
        &selection.service_areas,
        counts,
        |a| a.pwid.clone(),
        |c| c.pwsid.clone(),
    );
    for (area, count) in joined {
        let count = count.map(|c| c.count);
        layer.push_polygon(
            &area.geometry,
            &style,
            popup(&area.system_name, &[("Violations since 2001", cell(count))]),
            properties([
                ("PWID", Value::from(area.pwid.as_str())),
                ("SYS_NAME", Value::from(area.system_name.as_str())),
                ("VIOLATIONS_COUNT", Value::from(count)),
            ]),
        );
    }
    layer
}

#[allow(clippy::cast_precision_loss)]
fn violations_chart(violations: &[Violation], counts: &[SystemViolationCount]) -> BarChart {
    let mut bars: Vec<Bar> = violations_by_facility_and_health(violations)
        .into_iter()
        .map(|c| Bar::new(c.facility_name, c.count as f64).with_series(c.health_based.to_string()))
        .collect();

    let with_violations: BTreeSet<&str> =
        violations.iter().map(|v| v.facility_name.as_str()).collect();
    let mut zero: BTreeSet<&str> = BTreeSet::new();
    for count in counts.iter().filter(|c| c.count == 0) {
        let name = count.facility_name.as_str();
        if !with_violations.contains(name) && zero.insert(name) {
            bars.push(Bar::new(name, 0.0).with_series(HealthBased::No.to_string()));
        }
    }

    BarChart::new(
        "Number of SDWA violations by facility, 2001-present",
        "Number of violations",
        bars,
    )
}

/// Violation rows and per-system counts for a selection.
pub(crate) struct SelectionViolations {
    pub violations: Arc<Vec<Violation>>,
    /// Current systems that were asked about but have no violations.
    pub without: Vec<PublicWaterSystem>,
    pub counts: Vec<SystemViolationCount>,
}

impl Dashboard {
    /// Fetches the violations of every system and service area purveyor in
    /// `selection`. Empty when the selection holds no ids.
    pub(crate) async fn selection_violations(
        &self,
        selection: &Selection,
    ) -> Result<SelectionViolations, PageError> {
        let ids = unique_ids(
            selection
                .systems
                .iter()
                .map(|s| s.pwsid.as_str())
                .chain(selection.service_areas.iter().map(|a| a.pwid.as_str())),
        );
        if ids.is_empty() {
            return Ok(SelectionViolations {
                violations: Arc::new(vec![]),
                without: vec![],
                counts: vec![],
            });
        }

        let violations = self.source.violations(&ids).await?;
        let violating: BTreeSet<&str> = violations.iter().map(|v| v.pwsid.as_str()).collect();
        let id_set: BTreeSet<&str> = ids.iter().map(String::as_str).collect();

        // Systems of the current year that were asked about but have no rows.
        let without = nj_sdwa_spatial::dedupe_by_key(
            self.current_systems()
                .await?
                .into_iter()
                .filter(|s| id_set.contains(s.pwsid.as_str()))
                .filter(|s| !violating.contains(s.pwsid.as_str()))
                .collect(),
            |s| s.pwsid.clone(),
        );

        let counts = violation_counts_by_system(&violations, &without);
        Ok(SelectionViolations {
            violations,
            without,
            counts,
        })
    }

    /// Violations recorded against the systems selected for `region`.
    ///
    /// Systems without violations are listed with a count of zero.
    ///
    /// # Errors
    ///
    /// * [`PageError::NoData`] if the region holds no systems
    /// * [`PageError::Fetch`] if a fetch fails
    pub async fn violations(&self, region: &Region) -> Result<ViolationsPage, PageError> {
        let selection = self.selection(region).await?;
        let SelectionViolations {
            violations,
            without,
            counts,
        } = self.selection_violations(&selection).await?;
        if counts.is_empty() {
            return Err(PageError::no_data(NO_SYSTEMS_MESSAGE));
        }
        log::info!(
            "Violations: {} rows across {} systems ({} without violations)",
            violations.len(),
            counts.len(),
            without.len()
        );

        let map = MapView::new(Some(&region.bounding_box()))
            .with_layer(service_area_counts(&selection, &counts))
            .with_layer(count_markers(&counts));
        let chart = violations_chart(&violations, &counts);

        let mut rows = violations.to_vec();
        rows.extend(without.iter().map(placeholder_violation));
        let table = violation_table(&rows);
        let csv = table.to_csv()?;

        Ok(ViolationsPage {
            map,
            counts,
            chart,
            table,
            csv,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use nj_sdwa_analytics::NO_SIZE;

    use crate::DashboardConfig;
    use crate::fixtures::{FakeSource, empty_region, test_region};

    use super::*;

    fn dashboard(source: FakeSource) -> Dashboard {
        Dashboard::new(DashboardConfig::default(), Arc::new(source))
    }

    #[tokio::test]
    async fn counts_include_zero_systems() {
        let page = dashboard(FakeSource::sample())
            .violations(&test_region())
            .await
            .unwrap();

        let flat: Vec<(&str, u64)> = page
            .counts
            .iter()
            .map(|c| (c.pwsid.as_str(), c.count))
            .collect();
        assert_eq!(flat, vec![("NJ0001", 3), ("NJ0003", 1), ("NJ0002", 0)]);

        let beta = page.counts.iter().find(|c| c.pwsid == "NJ0002").unwrap();
        assert_eq!(beta.pws_size, NO_SIZE);
    }

    #[tokio::test]
    async fn chart_counts_sum_to_violation_rows() {
        let page = dashboard(FakeSource::sample())
            .violations(&test_region())
            .await
            .unwrap();
        // NJ0004 is outside the region, so four rows remain
        assert!((page.chart.total() - 4.0).abs() < f64::EPSILON);
        assert_eq!(page.chart.bars[0].label, "Alpha Water");
        assert_eq!(page.chart.bars[0].series.as_deref(), Some("Y"));
        assert!(page.chart.bars.iter().any(|b| b.label == "Beta Camp" && b.value.abs() < f64::EPSILON));
    }

    #[tokio::test]
    async fn table_holds_rows_and_placeholders() {
        let page = dashboard(FakeSource::sample())
            .violations(&test_region())
            .await
            .unwrap();
        assert_eq!(page.table.len(), 5);
        let placeholder = page.table.rows.last().unwrap();
        assert_eq!(placeholder[0], "NJ0002");
        assert_eq!(placeholder[3], NO_SIZE);
        assert_eq!(placeholder[5], "N");
    }

    #[tokio::test]
    async fn service_areas_carry_counts() {
        let page = dashboard(FakeSource::sample())
            .violations(&test_region())
            .await
            .unwrap();
        let areas = &page.map.layers[0];
        let props = areas.features.features[0].properties.as_ref().unwrap();
        assert_eq!(props["VIOLATIONS_COUNT"], 1);
        assert!(page.map.layers[1].colormap.is_some());
    }

    #[tokio::test]
    async fn empty_region_has_no_systems() {
        let err = dashboard(FakeSource::sample())
            .violations(&empty_region())
            .await
            .unwrap_err();
        match err {
            PageError::NoData { message } => assert_eq!(message, NO_SYSTEMS_MESSAGE),
            other => panic!("unexpected error: {other}"),
        }
    }
}
