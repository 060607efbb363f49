#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Domain types for New Jersey Safe Drinking Water Act data.
//!
//! Every page of the explorer works on the same handful of record shapes:
//! public water systems and their violations from EPA ECHO, purveyor
//! service areas from NJDEP, census block groups with EJScreen indicators,
//! and HUC12 watersheds with discharge monitoring reports. The user's
//! selected [`Region`] scopes all of them.

pub mod ej;
pub mod geometry;
pub mod region;
pub mod water;
pub mod watershed;

use std::str::FromStr;

use geo::{Polygon, Rect, coord};
use serde::{Deserialize, Serialize};

pub use ej::{BlockGroup, EjKind, EjMeasure, EjScores};
pub use region::{LatLng, MapBounds, Region, RegionError, RegionRequest};
pub use water::{
    HealthBased, LeadServiceLineReport, PublicWaterSystem, PwsType, ServiceArea, SourceWater,
    SystemSize, Violation,
};
pub use watershed::{DischargeRecord, Watershed};

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Creates a bounding box from two arbitrary corners, normalizing so
    /// that `west <= east` and `south <= north`.
    #[must_use]
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            west: x1.min(x2),
            south: y1.min(y2),
            east: x1.max(x2),
            north: y1.max(y2),
        }
    }

    /// Returns the smallest box covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    /// Converts the box into a closed rectangular polygon.
    #[must_use]
    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        )
        .to_polygon()
    }

    /// Formats the box as an `ArcGIS` envelope parameter
    /// (`xmin,ymin,xmax,ymax`).
    #[must_use]
    pub fn envelope_param(&self) -> String {
        format!("{},{},{},{}", self.west, self.south, self.east, self.north)
    }

    /// Formats the box as a closed WKT polygon ring, starting at the
    /// south-west corner and walking north first.
    #[must_use]
    pub fn to_wkt(&self) -> String {
        let (w, s, e, n) = (self.west, self.south, self.east, self.north);
        format!("POLYGON(({w} {s}, {w} {n}, {e} {n}, {e} {s}, {w} {s}))")
    }

    /// Returns the box in Leaflet `fitBounds` order:
    /// `[[south, west], [north, east]]`.
    #[must_use]
    pub const fn fit_bounds(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }
}

/// Error returned when a bounding box string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid bounding box '{input}': expected 'west,south,east,north'")]
pub struct ParseBoundingBoxError {
    /// The rejected input.
    pub input: String,
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

impl FromStr for BoundingBox {
    type Err = ParseBoundingBoxError;

    /// Parses `"west,south,east,north"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| ParseBoundingBoxError {
                input: s.to_string(),
            })?;

        match parts.as_slice() {
            [west, south, east, north] if parts.iter().all(|v| v.is_finite()) => {
                Ok(Self::from_corners(*west, *south, *east, *north))
            }
            _ => Err(ParseBoundingBoxError {
                input: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bbox_string() {
        let bbox: BoundingBox = "-74.3, 40.8, -74.1, 41.0".parse().unwrap();
        assert_eq!(bbox, BoundingBox::new(-74.3, 40.8, -74.1, 41.0));
    }

    #[test]
    fn displays_in_parse_order() {
        let bbox = BoundingBox::new(-74.3, 40.8, -74.1, 41.0);
        assert_eq!(bbox.to_string(), "-74.3,40.8,-74.1,41");
    }

    #[test]
    fn parse_normalizes_swapped_corners() {
        let bbox: BoundingBox = "-74.1,41.0,-74.3,40.8".parse().unwrap();
        assert_eq!(bbox, BoundingBox::new(-74.3, 40.8, -74.1, 41.0));
    }

    #[test]
    fn rejects_malformed_bbox() {
        assert!("".parse::<BoundingBox>().is_err());
        assert!("1,2,3".parse::<BoundingBox>().is_err());
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
        assert!("1,2,3,NaN".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn wkt_ring_is_closed() {
        let wkt = BoundingBox::new(-75.0, 39.0, -74.0, 40.0).to_wkt();
        assert_eq!(
            wkt,
            "POLYGON((-75 39, -75 40, -74 40, -74 39, -75 39))"
        );
    }

    #[test]
    fn envelope_and_fit_bounds_order() {
        let bbox = BoundingBox::new(-75.0, 39.0, -74.0, 40.0);
        assert_eq!(bbox.envelope_param(), "-75,39,-74,40");
        assert_eq!(bbox.fit_bounds(), [[39.0, -75.0], [40.0, -74.0]]);
    }

    #[test]
    fn union_covers_both() {
        let a = BoundingBox::new(-75.0, 39.0, -74.5, 39.5);
        let b = BoundingBox::new(-74.8, 39.2, -74.0, 40.0);
        assert_eq!(a.union(&b), BoundingBox::new(-75.0, 39.0, -74.0, 40.0));
    }
}
