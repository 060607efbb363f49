#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Page pipelines for the NJ Safe Drinking Water explorer.
//!
//! Each page runs the same flow: take a [`Region`], fetch what it needs
//! through the [`DataSource`], narrow the rows to the region, aggregate,
//! and describe the result as map layers, bar charts and a table. Nothing
//! is kept between calls; the [`Dashboard`] only holds configuration and
//! the (memoizing) data source, so the same region always yields the same
//! page.

pub mod config;
pub mod ej;
pub mod lead;
pub mod overview;
pub mod systems;
pub mod violations;
pub mod watershed;

#[cfg(test)]
mod fixtures;

use std::collections::BTreeSet;
use std::sync::Arc;

use nj_sdwa_models::{
    BoundingBox, MapBounds, PublicWaterSystem, Region, RegionError, RegionRequest,
};
use nj_sdwa_render::{DataTable, MapLayer, PolygonStyle, RenderError, popup};
use nj_sdwa_source::{DataSource, RemoteDataSource, SourceError};
use nj_sdwa_spatial::Selection;
use serde::Serialize;
use serde_json::{Map, Value};

pub use config::{ConfigError, DashboardConfig, RegionLimits};
pub use ej::{EjPage, EjPanel, MeasureOption};
pub use lead::LeadPage;
pub use overview::OverviewPage;
pub use systems::SystemsPage;
pub use violations::ViolationsPage;
pub use watershed::WatershedPage;

/// Message shown before any region has been chosen.
pub const REGION_REQUIRED_MESSAGE: &str = "Please select an area first";

/// Errors that stop a page from rendering.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// No region has been selected yet.
    #[error("Please select an area first")]
    RegionRequired,

    /// The drawn region is too big.
    #[error(
        "You've drawn a big area ({area:.4} square degrees, limit {max}). Please draw a smaller area."
    )]
    RegionTooLarge { area: f64, max: f64 },

    /// The map is zoomed out too far to use its bounds.
    #[error("Zoom in further to select an area (zoom {zoom}, minimum {min})")]
    ZoomTooLow { zoom: u8, min: u8 },

    /// The region input could not be understood.
    #[error("Invalid region: {message}")]
    InvalidRegion { message: String },

    /// A measure was requested in the wrong panel or does not exist.
    #[error("Unknown measure '{measure}'")]
    InvalidMeasure { measure: String },

    /// The region is valid but there is nothing to show.
    #[error("{message}")]
    NoData { message: String },

    /// A remote fetch failed.
    #[error("Failed to load data: {0}")]
    Fetch(SourceError),

    /// The `EJScreen` database failed.
    #[error("Database error: {0}")]
    Database(nj_sdwa_database::DbError),

    /// Writing the page output failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PageError {
    /// Whether the error is caused by the request rather than a failing
    /// dependency.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::RegionRequired
                | Self::RegionTooLarge { .. }
                | Self::ZoomTooLow { .. }
                | Self::InvalidRegion { .. }
                | Self::InvalidMeasure { .. }
                | Self::NoData { .. }
        )
    }

    fn no_data(message: impl Into<String>) -> Self {
        Self::NoData {
            message: message.into(),
        }
    }
}

impl From<SourceError> for PageError {
    fn from(value: SourceError) -> Self {
        match value {
            SourceError::Database(e) => Self::Database(e),
            other => Self::Fetch(other),
        }
    }
}

impl From<RegionError> for PageError {
    fn from(value: RegionError) -> Self {
        match value {
            RegionError::TooLarge { area, max } => Self::RegionTooLarge { area, max },
            RegionError::ZoomTooLow { zoom, min } => Self::ZoomTooLow { zoom, min },
            other => Self::InvalidRegion {
                message: other.to_string(),
            },
        }
    }
}

/// What every page offers for download.
pub trait Page: Serialize {
    /// File name the CSV is offered under.
    const CSV_FILENAME: &'static str;

    /// The page's table.
    fn table(&self) -> &DataTable;

    /// The table as CSV text.
    fn csv(&self) -> &str;
}

/// Shared context for every page.
pub struct Dashboard {
    config: DashboardConfig,
    source: Arc<dyn DataSource>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    #[must_use]
    pub fn new(config: DashboardConfig, source: Arc<dyn DataSource>) -> Self {
        Self { config, source }
    }

    /// Builds a dashboard reading from the live services named in `config`.
    #[must_use]
    pub fn remote(config: DashboardConfig) -> Self {
        let source = Arc::new(RemoteDataSource::new(config.sources.clone()));
        Self::new(config, source)
    }

    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Region from a bounding box, checked against the size limit.
    ///
    /// # Errors
    ///
    /// * [`PageError::RegionTooLarge`] if the box is too big
    pub fn region_from_bbox(&self, bbox: BoundingBox) -> Result<Region, PageError> {
        let region = Region::from_bbox(bbox);
        region.validate_area(self.config.limits.max_area)?;
        Ok(region)
    }

    /// Region from a drawn `GeoJSON` shape, checked against the size limit.
    ///
    /// # Errors
    ///
    /// * [`PageError::InvalidRegion`] if the shape is not a polygon
    /// * [`PageError::RegionTooLarge`] if it is too big
    pub fn region_from_geojson(&self, geojson: &str) -> Result<Region, PageError> {
        let region = Region::from_geojson(geojson)?;
        region.validate_area(self.config.limits.max_area)?;
        Ok(region)
    }

    /// Region from the visible map bounds.
    ///
    /// # Errors
    ///
    /// * [`PageError::ZoomTooLow`] if the map is zoomed out too far
    pub fn region_from_map_bounds(&self, bounds: &MapBounds, zoom: u8) -> Result<Region, PageError> {
        Ok(Region::from_map_bounds(
            bounds,
            zoom,
            self.config.limits.min_zoom,
        )?)
    }

    /// Circular region around a dropped marker, checked against the size
    /// limit. `radius_km` defaults to the configured radius.
    ///
    /// # Errors
    ///
    /// * [`PageError::InvalidRegion`] if the marker is off the globe or the
    ///   radius is not positive
    /// * [`PageError::RegionTooLarge`] if the circle is too big
    pub fn region_around_point(
        &self,
        lat: f64,
        lng: f64,
        radius_km: Option<f64>,
    ) -> Result<Region, PageError> {
        let radius_m = radius_km.map_or_else(|| self.config.point_radius_m(), |km| km * 1000.0);
        let region = Region::around_point(lat, lng, radius_m)?;
        region.validate_area(self.config.limits.max_area)?;
        Ok(region)
    }

    /// Builds and validates the region a caller asked for.
    ///
    /// # Errors
    ///
    /// * Any of the errors of the `region_from_*` constructors
    pub fn resolve_region(&self, request: &RegionRequest) -> Result<Region, PageError> {
        match request {
            RegionRequest::BoundingBox { bbox } => self.region_from_bbox(*bbox),
            RegionRequest::MapBounds { bounds, zoom } => {
                self.region_from_map_bounds(bounds, *zoom)
            }
            RegionRequest::GeoJson { geojson } => self.region_from_geojson(&geojson.to_string()),
            RegionRequest::Point {
                lat,
                lng,
                radius_km,
            } => self.region_around_point(*lat, *lng, *radius_km),
        }
    }

    /// Systems of the configured state in the configured fiscal year.
    async fn current_systems(&self) -> Result<Vec<PublicWaterSystem>, PageError> {
        let all = self.source.public_water_systems(&self.config.state).await?;
        let year = self.config.fiscal_year;
        let systems: Vec<PublicWaterSystem> = all
            .iter()
            .filter(|s| s.fiscal_year == Some(year))
            .cloned()
            .collect();
        log::debug!(
            "{} of {} system rows are from fiscal year {year}",
            systems.len(),
            all.len()
        );
        Ok(systems)
    }

    /// Systems and service areas relevant to `region`.
    async fn selection(&self, region: &Region) -> Result<Selection, PageError> {
        let systems = self.current_systems().await?;
        let service_areas = self.source.service_areas().await?;
        Ok(nj_sdwa_spatial::select_systems(
            region,
            &systems,
            &service_areas,
        ))
    }
}

/// Outlines of the selected purveyor service areas.
fn service_area_layer(selection: &Selection) -> MapLayer {
    let mut layer = MapLayer::new("Purveyor Service Areas");
    let style = PolygonStyle::outline();
    for area in &selection.service_areas {
        let mut fields = vec![];
        if let Some(url) = &area.pwid_url {
            fields.push(("State-level reports", url.clone()));
        }
        if let Some(url) = &area.agency_url {
            fields.push(("Agency website", url.clone()));
        }
        if let Some(notes) = &area.notes {
            fields.push(("Notes", notes.clone()));
        }
        layer.push_polygon(
            &area.geometry,
            &style,
            popup(&area.system_name, &fields),
            properties([
                ("PWID", Value::from(area.pwid.as_str())),
                ("SYS_NAME", Value::from(area.system_name.as_str())),
                ("AGENCY_URL", Value::from(area.agency_url.clone())),
            ]),
        );
    }
    layer
}

/// Builds a feature property map.
fn properties<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Unique ids in first-seen order.
fn unique_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// The system columns shared by the overview and find pages.
const SYSTEM_HEADERS: [&str; 8] = [
    "PWSID",
    "FAC_NAME",
    "PWS_TYPE_CODE",
    "SOURCE_WATER",
    "SYSTEM_SIZE",
    "FISCAL_YEAR",
    "FAC_LAT",
    "FAC_LONG",
];

fn system_table(systems: &[PublicWaterSystem]) -> DataTable {
    let mut table = DataTable::new(SYSTEM_HEADERS);
    for s in systems {
        table.push_row(vec![
            s.pwsid.clone(),
            s.name.clone(),
            s.pws_type.to_string(),
            s.source_water.to_string(),
            s.system_size.to_string(),
            nj_sdwa_render::cell(s.fiscal_year),
            nj_sdwa_render::cell(s.latitude),
            nj_sdwa_render::cell(s.longitude),
        ]);
    }
    table
}
