//! Reported lead service lines per purveyor service area.

use nj_sdwa_models::{LeadServiceLineReport, Region, ServiceArea};
use nj_sdwa_render::{
    Bar, BarChart, DataTable, LinearColormap, MapLayer, MapView, PolygonStyle, Ramp, cell, popup,
};
use nj_sdwa_spatial::{intersecting, left_join_by_key};
use serde::Serialize;
use serde_json::Value;

use crate::{Dashboard, Page, PageError, properties};

/// Shown when no service area touches the region.
pub const NO_SERVICE_AREAS_MESSAGE: &str =
    "There are no purveyor service areas required to count lead service lines in this area.";

const LEAD_LINES_LABEL: &str = "Number of lead service lines in area";

#[derive(Debug, Clone, Serialize)]
pub struct LeadPage {
    pub map: MapView,
    pub chart: BarChart,
    pub table: DataTable,
    pub csv: String,
}

impl Page for LeadPage {
    const CSV_FILENAME: &'static str = "selected_area_leadlines.csv";

    fn table(&self) -> &DataTable {
        &self.table
    }

    fn csv(&self) -> &str {
        &self.csv
    }
}

type Joined<'a> = (&'a ServiceArea, Option<&'a LeadServiceLineReport>);

const fn lead_lines(report: Option<&LeadServiceLineReport>) -> Option<u64> {
    match report {
        Some(report) => report.lead_lines,
        None => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn lead_layer(joined: &[Joined<'_>]) -> MapLayer {
    let colormap = LinearColormap::scaled(
        Ramp::Blues,
        joined
            .iter()
            .map(|(_, report)| lead_lines(*report).map(|n| n as f64)),
    );
    let mut layer = MapLayer::new("Lead Service Lines");
    for (area, report) in joined {
        let lines = lead_lines(*report);
        let utility = report.map(|r| r.utility.clone());
        let size = report.and_then(|r| r.system_size.clone());
        layer.push_polygon(
            &area.geometry,
            &PolygonStyle::choropleth(colormap.color(lines.map(|n| n as f64))),
            popup(
                &area.system_name,
                &[
                    ("Utility", cell(utility.as_deref())),
                    (LEAD_LINES_LABEL, cell(lines)),
                    ("System Size", cell(size.as_deref())),
                ],
            ),
            properties([
                ("PWID", Value::from(area.pwid.as_str())),
                ("SYS_NAME", Value::from(area.system_name.as_str())),
                ("LEAD_LINES", Value::from(lines)),
            ]),
        );
    }
    layer.with_colormap(colormap)
}

/// Bars for the areas that reported a count.
#[allow(clippy::cast_precision_loss)]
fn lead_chart(joined: &[Joined<'_>]) -> BarChart {
    let bars = joined
        .iter()
        .filter_map(|(area, report)| {
            lead_lines(*report).map(|n| Bar::new(area.system_name.clone(), n as f64))
        })
        .collect();
    BarChart::new(
        "Number of Lead Service Lines per Purveyor Service Area in Selected Area",
        "Number of lead service lines in system",
        bars,
    )
}

fn lead_table(joined: &[Joined<'_>]) -> DataTable {
    let mut table = DataTable::new([
        "SYS_NAME",
        "PWID",
        "Utility",
        LEAD_LINES_LABEL,
        "System Size",
    ]);
    for (area, report) in joined {
        table.push_row(vec![
            area.system_name.clone(),
            area.pwid.clone(),
            cell(report.map(|r| r.utility.as_str())),
            cell(lead_lines(*report)),
            cell(report.and_then(|r| r.system_size.as_deref())),
        ]);
    }
    table
}

impl Dashboard {
    /// Lead service line counts for the service areas touching `region`.
    ///
    /// Areas without a report stay on the map and in the table but are left
    /// out of the chart.
    ///
    /// # Errors
    ///
    /// * [`PageError::NoData`] if no service area touches the region
    /// * [`PageError::Fetch`] if the service areas or reports cannot be
    ///   loaded
    pub async fn lead_service_lines(&self, region: &Region) -> Result<LeadPage, PageError> {
        let service_areas = intersecting(region, &self.source.service_areas().await?);
        if service_areas.is_empty() {
            return Err(PageError::no_data(NO_SERVICE_AREAS_MESSAGE));
        }

        let reports = self.source.lead_reports().await?;
        let joined = left_join_by_key(
            &service_areas,
            &reports,
            |a| a.pwid.clone(),
            |r| r.pwsid.clone(),
        );
        log::info!(
            "Lead service lines: {} service areas, {} with reports",
            joined.len(),
            joined.iter().filter(|(_, r)| r.is_some()).count()
        );

        let map = MapView::new(Some(&region.bounding_box())).with_layer(lead_layer(&joined));
        let chart = lead_chart(&joined);
        let table = lead_table(&joined);
        let csv = table.to_csv()?;

        Ok(LeadPage {
            map,
            chart,
            table,
            csv,
        })
    }
}
