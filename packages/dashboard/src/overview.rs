//! Statewide overview: every currently operating system in the state.

use nj_sdwa_analytics::count_by;
use nj_sdwa_models::PublicWaterSystem;
use nj_sdwa_render::{Bar, BarChart, DataTable, MapLayer, MapView, popup, system_marker};
use serde::Serialize;
use serde_json::Value;

use crate::{Dashboard, Page, PageError, properties, system_table};

/// Initial view over New Jersey.
const STATE_CENTER: (f64, f64) = (40.304_857, -74.499_739);
const STATE_ZOOM: u8 = 8;

#[derive(Debug, Clone, Serialize)]
pub struct OverviewPage {
    pub map: MapView,
    /// By type, by water source, by size.
    pub charts: Vec<BarChart>,
    pub table: DataTable,
    pub csv: String,
}

impl Page for OverviewPage {
    const CSV_FILENAME: &'static str = "public_water_systems.csv";

    fn table(&self) -> &DataTable {
        &self.table
    }

    fn csv(&self) -> &str {
        &self.csv
    }
}

/// Marker layer for systems with coordinates.
pub(crate) fn system_layer(systems: &[PublicWaterSystem]) -> MapLayer {
    let mut layer = MapLayer::new("Public Water Systems");
    for system in systems {
        let Some((lat, lng)) = system.coordinates() else {
            continue;
        };
        layer.push_marker(
            lat,
            lng,
            &system_marker(system),
            popup(
                &system.name,
                &[
                    ("Source", system.source_water.to_string()),
                    ("Size", system.system_size.to_string()),
                    ("Type", system.pws_type.to_string()),
                ],
            ),
            properties([
                ("PWSID", Value::from(system.pwsid.as_str())),
                ("FAC_NAME", Value::from(system.name.as_str())),
            ]),
        );
    }
    layer
}

#[allow(clippy::cast_precision_loss)]
fn category_chart<F>(systems: &[PublicWaterSystem], scope: &str, code: &str, key: F) -> BarChart
where
    F: Fn(&PublicWaterSystem) -> String,
{
    let bars = count_by(systems, |s| Some(key(s)))
        .into_iter()
        .map(|c| Bar::new(c.category, c.count as f64))
        .collect();
    BarChart::new(
        format!("Distribution of {scope} Public Water Systems by EPA Code '{code}'"),
        "Number of Facilities",
        bars,
    )
}

/// Facility counts by type, source and size.
pub(crate) fn category_charts(systems: &[PublicWaterSystem], scope: &str) -> Vec<BarChart> {
    vec![
        category_chart(systems, scope, "PWS_TYPE_CODE", |s| s.pws_type.to_string()),
        category_chart(systems, scope, "SOURCE_WATER", |s| {
            s.source_water.to_string()
        }),
        category_chart(systems, scope, "SYSTEM_SIZE", |s| {
            s.system_size.to_string()
        }),
    ]
}

impl Dashboard {
    /// Every system in the configured state and fiscal year.
    ///
    /// # Errors
    ///
    /// * [`PageError::Fetch`] if the systems cannot be loaded
    pub async fn statewide_overview(&self) -> Result<OverviewPage, PageError> {
        let systems = self.current_systems().await?;
        log::info!("Statewide overview: {} systems", systems.len());

        let map = MapView::centered(STATE_CENTER.0, STATE_CENTER.1, STATE_ZOOM)
            .with_layer(system_layer(&systems));
        let charts = category_charts(&systems, "New Jersey's");
        let table = system_table(&systems);
        let csv = table.to_csv()?;

        Ok(OverviewPage {
            map,
            charts,
            table,
            csv,
        })
    }
}
