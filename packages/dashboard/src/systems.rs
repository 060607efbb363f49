//! Find public water systems in a region.

use nj_sdwa_models::Region;
use nj_sdwa_render::{BarChart, DataTable, MapView};
use serde::Serialize;

use crate::overview::{category_charts, system_layer};
use crate::{Dashboard, Page, PageError, service_area_layer, system_table};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemsPage {
    pub map: MapView,
    pub charts: Vec<BarChart>,
    pub service_area_count: usize,
    pub table: DataTable,
    pub csv: String,
}

impl Page for SystemsPage {
    const CSV_FILENAME: &'static str = "selected_public_water_systems.csv";

    fn table(&self) -> &DataTable {
        &self.table
    }

    fn csv(&self) -> &str {
        &self.csv
    }
}

impl Dashboard {
    /// Systems located in `region` or serving a service area that touches
    /// it.
    ///
    /// # Errors
    ///
    /// * [`PageError::Fetch`] if systems or service areas cannot be loaded
    pub async fn find_systems(&self, region: &Region) -> Result<SystemsPage, PageError> {
        let selection = self.selection(region).await?;
        log::info!(
            "Find systems: {} systems, {} service areas",
            selection.systems.len(),
            selection.service_areas.len()
        );

        let map = MapView::new(Some(&region.bounding_box()))
            .with_layer(service_area_layer(&selection))
            .with_layer(system_layer(&selection.systems));
        let charts = category_charts(&selection.systems, "the area's");
        let table = system_table(&selection.systems);
        let csv = table.to_csv()?;

        Ok(SystemsPage {
            map,
            charts,
            service_area_count: selection.service_areas.len(),
            table,
            csv,
        })
    }
}
