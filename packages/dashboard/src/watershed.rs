//! Pollutant discharges reported in the watersheds around a region's
//! service areas.

use nj_sdwa_analytics::{
    PermitReports, pollutant_totals_by_facility, reports_per_permit, top_pollutants, units_for,
};
use nj_sdwa_models::{DischargeRecord, Region, Watershed};
use nj_sdwa_render::{
    Bar, BarChart, DataTable, MapLayer, MapView, MarkerStyle, PolygonStyle, cell, popup,
    style::quartile_radius,
};
use nj_sdwa_spatial::{Selection, intersecting, total_bounds};
use serde::Serialize;
use serde_json::Value;

use crate::{Dashboard, Page, PageError, properties, service_area_layer};

const PERMIT_COLOR: &str = "orange";

const DISCHARGE_HEADERS: [&str; 10] = [
    "EXTERNAL_PERMIT_NMBR",
    "FAC_NAME",
    "PARAMETER_DESC",
    "DMR_VALUE_STANDARD_UNITS",
    "STANDARD_UNIT_DESC",
    "FAC_LAT",
    "FAC_LONG",
    "FAC_SIC_CODES",
    "FAC_NAICS_CODES",
    "FAC_DERIVED_WBD",
];

#[derive(Debug, Clone, Serialize)]
pub struct WatershedPage {
    pub map: MapView,
    /// HUC12 codes of the watersheds shown.
    pub watersheds: Vec<String>,
    pub top_pollutants: BarChart,
    /// Pollutant the permit markers and totals describe.
    pub pollutant: Option<String>,
    /// Every pollutant reported in the watersheds, most widely reported
    /// first.
    pub pollutants: Vec<String>,
    pub units: Vec<String>,
    pub totals: BarChart,
    pub table: DataTable,
    pub csv: String,
}

impl Page for WatershedPage {
    const CSV_FILENAME: &'static str = "selected_area_pollutants.csv";

    fn table(&self) -> &DataTable {
        &self.table
    }

    fn csv(&self) -> &str {
        &self.csv
    }
}

fn watershed_layer(watersheds: &[Watershed]) -> MapLayer {
    let mut layer = MapLayer::new("HUC12 Watersheds");
    let style = PolygonStyle::watershed();
    for shed in watersheds {
        layer.push_polygon(
            &shed.geometry,
            &style,
            popup(&shed.name, &[("HUC12", shed.huc12.clone())]),
            properties([
                ("HUC12", Value::from(shed.huc12.as_str())),
                ("NAME", Value::from(shed.name.as_str())),
            ]),
        );
    }
    layer
}

fn permit_layer(permits: &[PermitReports], pollutant: &str) -> MapLayer {
    let mut layer = MapLayer::new("Discharge Permits");
    let reports_label = format!("Reports of {pollutant} in 2022");
    for permit in permits {
        let Some((lat, lng)) = permit.coordinates() else {
            continue;
        };
        let codes = format!(
            "{}/{}",
            permit.sic_codes.as_deref().unwrap_or_default(),
            permit.naics_codes.as_deref().unwrap_or_default()
        );
        layer.push_marker(
            lat,
            lng,
            &MarkerStyle::filled(quartile_radius(permit.bin), PERMIT_COLOR),
            popup(
                &permit.facility_name,
                &[
                    (reports_label.as_str(), permit.reports.to_string()),
                    ("Industry codes (NAICS, SICS)", codes),
                ],
            ),
            properties([
                ("EXTERNAL_PERMIT_NMBR", Value::from(permit.permit.as_str())),
                ("REPORTS", Value::from(permit.reports)),
            ]),
        );
    }
    layer
}

#[allow(clippy::cast_precision_loss)]
fn top_pollutants_chart(records: &[DischargeRecord]) -> (BarChart, Vec<String>) {
    let counts = top_pollutants(records);
    let names = counts.iter().map(|c| c.category.clone()).collect();
    let bars = counts
        .into_iter()
        .map(|c| Bar::new(c.category, c.count as f64))
        .collect();
    let chart = BarChart::new(
        "Number of Facilities Reporting Specific Pollutants in Selected Area",
        "Number of facilities reporting pollutant in selected area",
        bars,
    );
    (chart, names)
}

fn totals_chart(records: &[DischargeRecord], pollutant: &str, units: &[String]) -> BarChart {
    let bars = pollutant_totals_by_facility(records, pollutant)
        .into_iter()
        .map(|t| Bar::new(t.facility_name, t.total).with_series(t.unit))
        .collect();
    BarChart::new(
        format!("Amount of {pollutant} reported released in 2022 by facilities in selected watersheds"),
        format!("Amount of {pollutant} measured as {}", units.join(", ")),
        bars,
    )
}

fn discharge_table(records: &[DischargeRecord]) -> DataTable {
    let mut table = DataTable::new(DISCHARGE_HEADERS);
    for r in records {
        table.push_row(vec![
            r.permit.clone(),
            r.facility_name.clone(),
            r.parameter.clone(),
            cell(r.value),
            r.unit.clone(),
            cell(r.latitude),
            cell(r.longitude),
            r.sic_codes.clone().unwrap_or_default(),
            r.naics_codes.clone().unwrap_or_default(),
            r.huc12.clone().unwrap_or_default(),
        ]);
    }
    table
}

impl Dashboard {
    /// Discharges reported by permitted facilities in the HUC12 watersheds
    /// that overlap the service areas touching `region` (or the region
    /// itself when no service area does).
    ///
    /// `pollutant` defaults to the pollutant reported by the most
    /// facilities.
    ///
    /// # Errors
    ///
    /// * [`PageError::InvalidMeasure`] if `pollutant` is not reported in the
    ///   watersheds
    /// * [`PageError::Fetch`] if a fetch fails
    pub async fn watershed_pollution(
        &self,
        region: &Region,
        pollutant: Option<&str>,
    ) -> Result<WatershedPage, PageError> {
        let service_areas = intersecting(region, &self.source.service_areas().await?);
        let extent = total_bounds(&service_areas).unwrap_or_else(|| region.bounding_box());

        let candidates = self.source.watersheds(&extent).await?;
        let watersheds = intersecting(&Region::from_bbox(extent), &candidates);
        let huc12s: Vec<String> = watersheds.iter().map(|w| w.huc12.clone()).collect();
        let records = if huc12s.is_empty() {
            Vec::new()
        } else {
            self.source.discharges(&huc12s).await?.to_vec()
        };
        log::info!(
            "Watersheds: {} HUC12s, {} discharge rows",
            huc12s.len(),
            records.len()
        );

        let (top_pollutants, pollutants) = top_pollutants_chart(&records);
        let pollutant = match pollutant {
            Some(p) if !pollutants.is_empty() && !pollutants.iter().any(|known| known == p) => {
                return Err(PageError::InvalidMeasure {
                    measure: p.to_string(),
                });
            }
            Some(p) => Some(p.to_string()),
            None => pollutants.first().cloned(),
        };

        let selection = Selection {
            systems: vec![],
            service_areas,
        };
        let mut map = MapView::new(Some(&extent))
            .with_layer(watershed_layer(&watersheds))
            .with_layer(service_area_layer(&selection));

        let (units, totals) = if let Some(p) = pollutant.as_deref() {
            let units = units_for(&records, p);
            map = map.with_layer(permit_layer(&reports_per_permit(&records, p), p));
            let totals = totals_chart(&records, p, &units);
            (units, totals)
        } else {
            (vec![], BarChart::new("", "", vec![]))
        };

        let table = discharge_table(&records);
        let csv = table.to_csv()?;

        Ok(WatershedPage {
            map,
            watersheds: huc12s,
            top_pollutants,
            pollutant,
            pollutants,
            units,
            totals,
            table,
            csv,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::DashboardConfig;
    use crate::fixtures::{FakeSource, empty_region, test_region};

    use super::*;

    fn dashboard() -> Dashboard {
        Dashboard::new(DashboardConfig::default(), Arc::new(FakeSource::sample()))
    }

    #[tokio::test]
    async fn defaults_to_most_reported_pollutant() {
        let page = dashboard()
            .watershed_pollution(&test_region(), None)
            .await
            .unwrap();
        assert_eq!(page.watersheds, vec!["020301030101".to_string()]);
        assert_eq!(page.pollutant.as_deref(), Some("Zinc"));
        assert_eq!(page.pollutants, vec!["Zinc".to_string(), "Lead".to_string()]);
        assert_eq!(page.units, vec!["kg/d".to_string()]);
        assert_eq!(page.top_pollutants.bars[0].label, "Zinc");
        assert!((page.top_pollutants.bars[0].value - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn totals_per_facility() {
        let page = dashboard()
            .watershed_pollution(&test_region(), None)
            .await
            .unwrap();
        let totals: Vec<(&str, f64)> = page
            .totals
            .bars
            .iter()
            .map(|b| (b.label.as_str(), b.value))
            .collect();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].0, "Plant B");
        assert!((totals[0].1 - 10.0).abs() < 1e-9);
        assert!((totals[1].1 - 6.0).abs() < 1e-9);
        assert!(page.totals.x_title.ends_with("kg/d"));
    }

    #[tokio::test]
    async fn far_watershed_excluded() {
        let page = dashboard()
            .watershed_pollution(&test_region(), None)
            .await
            .unwrap();
        assert_eq!(page.table.len(), 5);
        assert!(page.table.rows.iter().all(|r| r[1] != "Plant Far"));
        // watershed, service area, two permits
        assert_eq!(page.map.feature_count(), 4);
    }

    #[tokio::test]
    async fn busier_permit_gets_bigger_marker() {
        let page = dashboard()
            .watershed_pollution(&test_region(), None)
            .await
            .unwrap();
        let permits = &page.map.layers[2].features.features;
        let radius = |i: usize| {
            permits[i].properties.as_ref().unwrap()["style"]["radius"]
                .as_f64()
                .unwrap()
        };
        assert!(radius(0) > radius(1));
    }

    #[tokio::test]
    async fn chosen_pollutant() {
        let page = dashboard()
            .watershed_pollution(&test_region(), Some("Lead"))
            .await
            .unwrap();
        assert_eq!(page.totals.bars.len(), 1);
        assert_eq!(page.totals.bars[0].label, "Plant A");
    }

    #[tokio::test]
    async fn unknown_pollutant_rejected() {
        let err = dashboard()
            .watershed_pollution(&test_region(), Some("Unobtainium"))
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::InvalidMeasure { .. }));
    }

    #[tokio::test]
    async fn empty_region_is_valid() {
        let page = dashboard()
            .watershed_pollution(&empty_region(), None)
            .await
            .unwrap();
        assert!(page.pollutant.is_none());
        assert!(page.table.is_empty());
        assert!(page.totals.is_empty());
    }
}
