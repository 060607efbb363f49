//! The user's selected area of interest.
//!
//! A [`Region`] is built from one of three inputs: the visible map bounds
//! (gated by zoom level), a drawn polygon (gated by area), or a circle
//! around a dropped marker. Every page filters its data against it.

use std::f64::consts::PI;

use geo::{
    Area as _, BoundingRect as _, Intersects as _, LineString, MultiPolygon, Point, Polygon,
};
use geojson::GeoJson;
use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Approximate meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Vertices in the ring produced by [`Region::around_point`].
const CIRCLE_VERTICES: u32 = 64;

/// Errors raised while building or validating a [`Region`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegionError {
    /// The drawn area exceeds the allowed size.
    #[error(
        "You've drawn a big area ({area:.4} square degrees, limit {max}). Please draw a smaller area."
    )]
    TooLarge {
        /// Planar area of the rejected region.
        area: f64,
        /// Exclusive upper bound.
        max: f64,
    },

    /// The map is zoomed out too far for its bounds to be used.
    #[error("Zoom in further to select an area (zoom {zoom}, minimum {min})")]
    ZoomTooLow {
        /// Current map zoom.
        zoom: u8,
        /// Minimum accepted zoom.
        min: u8,
    },

    /// The supplied `GeoJSON` could not be parsed.
    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    /// The supplied geometry is not a single polygon.
    #[error("Region must be a polygon")]
    NotAPolygon,

    /// The supplied `GeoJSON` contained no geometry.
    #[error("Region has no geometry")]
    Empty,

    /// A marker is off the globe.
    #[error("Invalid point ({lat}, {lng})")]
    InvalidPoint {
        /// Latitude of the rejected marker.
        lat: f64,
        /// Longitude of the rejected marker.
        lng: f64,
    },

    /// A search radius is not a positive distance.
    #[error("Invalid radius {0} m, expected a positive distance")]
    InvalidRadius(f64),
}

/// A latitude/longitude pair as sent by the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Visible map bounds as reported by the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    /// South-west corner.
    #[serde(rename = "_southWest")]
    pub south_west: LatLng,
    /// North-east corner.
    #[serde(rename = "_northEast")]
    pub north_east: LatLng,
}

impl MapBounds {
    /// Converts the bounds into a normalized [`BoundingBox`].
    #[must_use]
    pub fn to_bounding_box(&self) -> BoundingBox {
        BoundingBox::from_corners(
            self.south_west.lng,
            self.south_west.lat,
            self.north_east.lng,
            self.north_east.lat,
        )
    }
}

/// A region as described by a caller, before it is built and validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RegionRequest {
    /// A drawn rectangle.
    BoundingBox { bbox: BoundingBox },
    /// Whatever the map currently shows.
    MapBounds { bounds: MapBounds, zoom: u8 },
    /// A drawn shape as `GeoJSON` (geometry, feature, or collection).
    GeoJson { geojson: serde_json::Value },
    /// A circle around a dropped marker; the radius defaults to the
    /// configured one.
    Point {
        lat: f64,
        lng: f64,
        #[serde(default, rename = "radiusKm")]
        radius_km: Option<f64>,
    },
}

/// The area of interest that scopes every page.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    polygon: Polygon<f64>,
}

impl Region {
    /// Wraps an existing polygon.
    #[must_use]
    pub const fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self { polygon }
    }

    /// Builds a rectangular region.
    #[must_use]
    pub fn from_bbox(bbox: BoundingBox) -> Self {
        Self::from_polygon(bbox.to_polygon())
    }

    /// Builds a region from the visible map bounds.
    ///
    /// # Errors
    ///
    /// * [`RegionError::ZoomTooLow`] if `zoom` is below `min_zoom`
    pub fn from_map_bounds(bounds: &MapBounds, zoom: u8, min_zoom: u8) -> Result<Self, RegionError> {
        if zoom < min_zoom {
            return Err(RegionError::ZoomTooLow {
                zoom,
                min: min_zoom,
            });
        }
        Ok(Self::from_bbox(bounds.to_bounding_box()))
    }

    /// Builds a region from a drawn shape.
    ///
    /// Accepts a bare geometry, a `Feature`, or a `FeatureCollection`
    /// (whose first feature is used). A `MultiPolygon` holding exactly one
    /// polygon is accepted as that polygon.
    ///
    /// # Errors
    ///
    /// * [`RegionError::InvalidGeoJson`] if the input does not parse
    /// * [`RegionError::Empty`] if there is no geometry
    /// * [`RegionError::NotAPolygon`] for any other geometry type
    pub fn from_geojson(input: &str) -> Result<Self, RegionError> {
        let parsed = input
            .parse::<GeoJson>()
            .map_err(|e| RegionError::InvalidGeoJson(e.to_string()))?;

        let geometry = match parsed {
            GeoJson::Geometry(g) => Some(g),
            GeoJson::Feature(f) => f.geometry,
            GeoJson::FeatureCollection(fc) => {
                fc.features.into_iter().next().and_then(|f| f.geometry)
            }
        }
        .ok_or(RegionError::Empty)?;

        let geometry: geo::Geometry<f64> = geometry
            .try_into()
            .map_err(|e: geojson::Error| RegionError::InvalidGeoJson(e.to_string()))?;

        match geometry {
            geo::Geometry::Polygon(polygon) => Ok(Self::from_polygon(polygon)),
            geo::Geometry::Rect(rect) => Ok(Self::from_polygon(rect.to_polygon())),
            geo::Geometry::MultiPolygon(MultiPolygon(mut polygons)) if polygons.len() == 1 => {
                Ok(Self::from_polygon(polygons.remove(0)))
            }
            _ => Err(RegionError::NotAPolygon),
        }
    }

    /// Builds an approximately circular search area of `radius_m` meters
    /// around a dropped marker.
    ///
    /// # Errors
    ///
    /// * [`RegionError::InvalidPoint`] if the marker is not strictly between
    ///   the poles or its longitude is outside ±180
    /// * [`RegionError::InvalidRadius`] if `radius_m` is not positive
    pub fn around_point(lat: f64, lng: f64, radius_m: f64) -> Result<Self, RegionError> {
        if !(lat.is_finite() && lat.abs() < 90.0 && lng.is_finite() && lng.abs() <= 180.0) {
            return Err(RegionError::InvalidPoint { lat, lng });
        }
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return Err(RegionError::InvalidRadius(radius_m));
        }

        let dlat = radius_m / METERS_PER_DEGREE;
        let dlng = radius_m / (METERS_PER_DEGREE * lat.to_radians().cos());

        let ring: Vec<(f64, f64)> = (0..CIRCLE_VERTICES)
            .map(|i| {
                let theta = 2.0 * PI * f64::from(i) / f64::from(CIRCLE_VERTICES);
                (lng + dlng * theta.cos(), lat + dlat * theta.sin())
            })
            .collect();

        Ok(Self::from_polygon(Polygon::new(
            LineString::from(ring),
            vec![],
        )))
    }

    /// The box pre-drawn over northern New Jersey before the user picks
    /// anything.
    #[must_use]
    pub fn default_box() -> Self {
        Self::from_bbox(BoundingBox::from_corners(
            -74.285_276_715_057_85,
            41.002_662_478_823,
            -74.124_085_293_714_98,
            40.883_736_614_770_61,
        ))
    }

    /// Planar area in square degrees.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.polygon.unsigned_area()
    }

    /// Rejects regions whose planar area is not strictly below `max_sq_deg`.
    ///
    /// # Errors
    ///
    /// * [`RegionError::TooLarge`] if the region is too big
    pub fn validate_area(&self, max_sq_deg: f64) -> Result<(), RegionError> {
        let area = self.area();
        if area >= max_sq_deg {
            return Err(RegionError::TooLarge {
                area,
                max: max_sq_deg,
            });
        }
        Ok(())
    }

    /// The underlying polygon.
    #[must_use]
    pub const fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Bounding box of the region.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        self.polygon.bounding_rect().map_or(
            BoundingBox::new(0.0, 0.0, 0.0, 0.0),
            |rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y),
        )
    }

    /// Whether a point lies inside or on the boundary of the region.
    #[must_use]
    pub fn contains_point(&self, latitude: f64, longitude: f64) -> bool {
        self.polygon.intersects(&Point::new(longitude, latitude))
    }

    /// Whether a polygon geometry touches the region.
    #[must_use]
    pub fn intersects(&self, geometry: &MultiPolygon<f64>) -> bool {
        self.polygon.intersects(geometry)
    }

    /// Converts the region into a `GeoJSON` feature for map display.
    #[must_use]
    pub fn to_geojson_feature(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.polygon))),
            id: None,
            properties: None,
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> MapBounds {
        serde_json::from_value(serde_json::json!({
            "_southWest": { "lat": 40.8, "lng": -74.3 },
            "_northEast": { "lat": 40.9, "lng": -74.2 }
        }))
        .unwrap()
    }

    #[test]
    fn map_bounds_gated_by_zoom() {
        let b = bounds();
        assert_eq!(
            Region::from_map_bounds(&b, 10, 11),
            Err(RegionError::ZoomTooLow { zoom: 10, min: 11 })
        );
        let region = Region::from_map_bounds(&b, 11, 11).unwrap();
        let bbox = region.bounding_box();
        assert!((bbox.west - -74.3).abs() < 1e-9);
        assert!((bbox.north - 40.9).abs() < 1e-9);
    }

    #[test]
    fn region_request_tagged_by_type() {
        let request: RegionRequest = serde_json::from_value(serde_json::json!({
            "type": "point",
            "lat": 40.9,
            "lng": -74.2
        }))
        .unwrap();
        assert_eq!(
            request,
            RegionRequest::Point {
                lat: 40.9,
                lng: -74.2,
                radius_km: None
            }
        );

        let request: RegionRequest = serde_json::from_value(serde_json::json!({
            "type": "mapBounds",
            "bounds": {
                "_southWest": { "lat": 40.8, "lng": -74.3 },
                "_northEast": { "lat": 40.9, "lng": -74.2 }
            },
            "zoom": 12
        }))
        .unwrap();
        assert!(matches!(request, RegionRequest::MapBounds { zoom: 12, .. }));
    }

    #[test]
    fn default_box_is_small_enough() {
        let region = Region::default_box();
        assert!(region.validate_area(0.07).is_ok());
        assert!(region.contains_point(40.95, -74.2));
    }

    #[test]
    fn large_area_rejected() {
        let region = Region::from_bbox(BoundingBox::new(-75.0, 39.0, -74.0, 40.0));
        assert!(matches!(
            region.validate_area(0.07),
            Err(RegionError::TooLarge { .. })
        ));
        // The limit itself is exclusive.
        let unit = Region::from_bbox(BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert!(unit.validate_area(1.0).is_err());
        assert!(unit.validate_area(1.5).is_ok());
    }

    #[test]
    fn parses_feature_and_collection() {
        let feature = r#"{"type":"Feature","properties":{},"geometry":
            {"type":"Polygon","coordinates":[[[-74.3,40.8],[-74.2,40.8],[-74.2,40.9],[-74.3,40.9],[-74.3,40.8]]]}}"#;
        let region = Region::from_geojson(feature).unwrap();
        assert!(region.contains_point(40.85, -74.25));

        let collection = format!(r#"{{"type":"FeatureCollection","features":[{feature}]}}"#);
        assert_eq!(Region::from_geojson(&collection).unwrap(), region);
    }

    #[test]
    fn rejects_non_polygons() {
        assert_eq!(
            Region::from_geojson(r#"{"type":"Point","coordinates":[-74.0,40.0]}"#),
            Err(RegionError::NotAPolygon)
        );
        assert_eq!(
            Region::from_geojson(r#"{"type":"FeatureCollection","features":[]}"#),
            Err(RegionError::Empty)
        );
        assert!(matches!(
            Region::from_geojson("{"),
            Err(RegionError::InvalidGeoJson(_))
        ));
    }

    #[test]
    fn circle_around_point() {
        let region = Region::around_point(40.0, -74.0, 10_000.0).unwrap();
        assert!(region.contains_point(40.0, -74.0));
        assert!(region.contains_point(40.08, -74.0));
        assert!(!region.contains_point(40.1, -74.0));
        let bbox = region.bounding_box();
        assert!((bbox.north - 40.0 - 10_000.0 / METERS_PER_DEGREE).abs() < 1e-9);
    }

    #[test]
    fn off_globe_markers_rejected() {
        assert!(matches!(
            Region::around_point(90.0, -74.0, 1_000.0),
            Err(RegionError::InvalidPoint { .. })
        ));
        assert!(matches!(
            Region::around_point(-95.0, -74.0, 1_000.0),
            Err(RegionError::InvalidPoint { .. })
        ));
        assert!(matches!(
            Region::around_point(40.0, 200.0, 1_000.0),
            Err(RegionError::InvalidPoint { .. })
        ));
    }

    #[test]
    fn non_positive_radius_rejected() {
        for radius in [0.0, -5_000.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Region::around_point(40.0, -74.0, radius),
                Err(RegionError::InvalidRadius(_))
            ));
        }
    }

    #[test]
    fn boundary_points_count_as_inside() {
        let region = Region::from_bbox(BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert!(region.contains_point(0.0, 0.5));
        assert!(!region.contains_point(1.5, 0.5));
    }
}
