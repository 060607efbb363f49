#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the NJ Safe Drinking Water server.
//!
//! Page endpoints take their region as query parameters; these types turn
//! the raw strings into a [`RegionRequest`] the dashboard understands.

use nj_sdwa_models::{BoundingBox, EjMeasure, LatLng, MapBounds, Region, RegionRequest};
use serde::{Deserialize, Serialize};

/// Errors raised while reading query parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// `bbox` is not `west,south,east,north`.
    #[error("Invalid bbox '{0}', expected west,south,east,north")]
    InvalidBbox(String),

    /// `point` is not `lat,lng`.
    #[error("Invalid point '{0}', expected lat,lng")]
    InvalidPoint(String),

    /// `radiusKm` is not a positive distance.
    #[error("Invalid radius '{0}', expected a positive number of kilometers")]
    InvalidRadius(String),

    /// `geojson` is not JSON.
    #[error("Invalid geojson: {0}")]
    InvalidGeoJson(String),

    /// A measure name is not an `EJScreen` column.
    #[error("Unknown measure '{0}'")]
    UnknownMeasure(String),
}

/// Query parameters shared by every page endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQueryParams {
    /// Bounding box as `west,south,east,north`.
    pub bbox: Option<String>,
    /// Map zoom; when present `bbox` is treated as the visible map bounds.
    pub zoom: Option<u8>,
    /// Dropped marker as `lat,lng`.
    pub point: Option<String>,
    /// Radius around `point` in kilometers.
    pub radius_km: Option<f64>,
    /// Drawn shape as `GeoJSON` text.
    pub geojson: Option<String>,
    /// Socioeconomic `EJScreen` column.
    pub socio: Option<String>,
    /// Environmental `EJScreen` column.
    pub env: Option<String>,
    /// Pollutant (`PARAMETER_DESC`) for the watershed page.
    pub pollutant: Option<String>,
}

fn parse_point(s: &str) -> Option<(f64, f64)> {
    let (lat, lng) = s.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    (lat.is_finite() && lat.abs() < 90.0 && lng.is_finite() && lng.abs() <= 180.0)
        .then_some((lat, lng))
}

impl PageQueryParams {
    /// The region the parameters describe. A drawn shape wins over a point,
    /// which wins over a box. `None` when no region was given.
    ///
    /// # Errors
    ///
    /// * [`ParamError`] if a region parameter is malformed
    pub fn region_request(&self) -> Result<Option<RegionRequest>, ParamError> {
        if let Some(geojson) = self.geojson.as_deref() {
            let geojson = serde_json::from_str(geojson)
                .map_err(|e| ParamError::InvalidGeoJson(e.to_string()))?;
            return Ok(Some(RegionRequest::GeoJson { geojson }));
        }

        if let Some(point) = self.point.as_deref() {
            let (lat, lng) =
                parse_point(point).ok_or_else(|| ParamError::InvalidPoint(point.to_string()))?;
            if let Some(radius) = self.radius_km
                && !(radius.is_finite() && radius > 0.0)
            {
                return Err(ParamError::InvalidRadius(radius.to_string()));
            }
            return Ok(Some(RegionRequest::Point {
                lat,
                lng,
                radius_km: self.radius_km,
            }));
        }

        let Some(bbox) = self.bbox.as_deref() else {
            return Ok(None);
        };
        let bbox: BoundingBox = bbox
            .parse()
            .map_err(|_| ParamError::InvalidBbox(bbox.to_string()))?;

        Ok(Some(match self.zoom {
            Some(zoom) => RegionRequest::MapBounds {
                bounds: MapBounds {
                    south_west: LatLng {
                        lat: bbox.south,
                        lng: bbox.west,
                    },
                    north_east: LatLng {
                        lat: bbox.north,
                        lng: bbox.east,
                    },
                },
                zoom,
            },
            None => RegionRequest::BoundingBox { bbox },
        }))
    }

    /// The requested socioeconomic measure, if any.
    ///
    /// # Errors
    ///
    /// * [`ParamError::UnknownMeasure`] if it is not an `EJScreen` column
    pub fn socio_measure(&self) -> Result<Option<EjMeasure>, ParamError> {
        parse_measure(self.socio.as_deref())
    }

    /// The requested environmental measure, if any.
    ///
    /// # Errors
    ///
    /// * [`ParamError::UnknownMeasure`] if it is not an `EJScreen` column
    pub fn env_measure(&self) -> Result<Option<EjMeasure>, ParamError> {
        parse_measure(self.env.as_deref())
    }
}

fn parse_measure(value: Option<&str>) -> Result<Option<EjMeasure>, ParamError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| EjMeasure::from_column(v).ok_or_else(|| ParamError::UnknownMeasure(v.to_string())))
        .transpose()
}

/// A validated region as returned by `POST /api/region`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRegion {
    pub bbox: BoundingBox,
    /// Planar area in square degrees.
    pub area: f64,
    /// `[[south, west], [north, east]]` for the map widget.
    pub fit_bounds: [[f64; 2]; 2],
}

impl From<&Region> for ApiRegion {
    fn from(region: &Region) -> Self {
        let bbox = region.bounding_box();
        Self {
            bbox,
            area: region.area(),
            fit_bounds: bbox.fit_bounds(),
        }
    }
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}
