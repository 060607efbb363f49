//! Marker and polygon styles.

use nj_sdwa_models::{PublicWaterSystem, PwsType, SourceWater, SystemSize};
use serde::Serialize;

/// Style of a circle marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill_color: String,
    /// Whether the marker has an outline.
    pub stroke: bool,
    pub weight: f64,
    pub fill_opacity: f64,
}

impl MarkerStyle {
    #[must_use]
    pub fn filled(radius: f64, fill_color: impl Into<String>) -> Self {
        Self {
            radius,
            fill_color: fill_color.into(),
            stroke: true,
            weight: 1.0,
            fill_opacity: 1.0,
        }
    }
}

/// Style of a polygon feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonStyle {
    pub fill_color: Option<String>,
    pub fill_opacity: f64,
    pub weight: f64,
    pub color: Option<String>,
}

impl PolygonStyle {
    /// Black, unfilled outline used for service areas.
    #[must_use]
    pub fn outline() -> Self {
        Self {
            fill_color: None,
            fill_opacity: 0.0,
            weight: 2.0,
            color: Some("black".to_string()),
        }
    }

    /// Filled choropleth polygon with a black outline.
    #[must_use]
    pub fn choropleth(fill_color: impl Into<String>) -> Self {
        Self {
            fill_color: Some(fill_color.into()),
            fill_opacity: 0.75,
            weight: 2.0,
            color: Some("black".to_string()),
        }
    }

    /// Census block group fill with a thin white edge.
    #[must_use]
    pub fn block_group(fill_color: impl Into<String>) -> Self {
        Self {
            fill_color: Some(fill_color.into()),
            fill_opacity: 0.75,
            weight: 1.0,
            color: Some("white".to_string()),
        }
    }

    /// HUC12 watershed fill.
    #[must_use]
    pub fn watershed() -> Self {
        Self {
            fill_color: Some("#C1E2DB".to_string()),
            fill_opacity: 0.75,
            weight: 1.0,
            color: None,
        }
    }
}

/// Fill color per system type.
#[must_use]
pub const fn type_color(pws_type: PwsType) -> &'static str {
    match pws_type {
        PwsType::Community => "blue",
        PwsType::TransientNonCommunity => "yellow",
        PwsType::NonTransientNonCommunity => "green",
        PwsType::Unknown => "grey",
    }
}

/// Marker radius per system size.
#[must_use]
pub const fn size_radius(size: SystemSize) -> f64 {
    match size {
        SystemSize::VerySmall | SystemSize::Unknown => 4.0,
        SystemSize::Small => 6.0,
        SystemSize::Medium => 8.0,
        SystemSize::Large => 10.0,
        SystemSize::VeryLarge => 12.0,
    }
}

/// Only surface water systems are outlined.
#[must_use]
pub const fn source_stroke(source: SourceWater) -> bool {
    source.is_surface()
}

/// Marker for a public water system on the overview and find pages.
#[must_use]
pub fn system_marker(system: &PublicWaterSystem) -> MarkerStyle {
    MarkerStyle {
        radius: size_radius(system.system_size),
        fill_color: type_color(system.pws_type).to_string(),
        stroke: source_stroke(system.source_water),
        weight: 1.0,
        fill_opacity: 1.0,
    }
}

/// Radius of a permit marker for its report-count quartile.
#[must_use]
pub const fn quartile_radius(bin: usize) -> f64 {
    match bin {
        0 => 8.0,
        1 => 12.0,
        2 => 16.0,
        _ => 24.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(pws_type: PwsType, source: SourceWater, size: SystemSize) -> PublicWaterSystem {
        PublicWaterSystem {
            pwsid: "NJ0000001".to_string(),
            name: "Test".to_string(),
            pws_type,
            source_water: source,
            system_size: size,
            fiscal_year: Some(2021),
            latitude: Some(40.0),
            longitude: Some(-74.0),
        }
    }

    #[test]
    fn community_surface_system() {
        let style = system_marker(&system(
            PwsType::Community,
            SourceWater::SurfaceWater,
            SystemSize::VeryLarge,
        ));
        assert_eq!(style.fill_color, "blue");
        assert!(style.stroke);
        assert!((style.radius - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn groundwater_has_no_stroke() {
        let style = system_marker(&system(
            PwsType::TransientNonCommunity,
            SourceWater::Groundwater,
            SystemSize::Small,
        ));
        assert_eq!(style.fill_color, "yellow");
        assert!(!style.stroke);
    }

    #[test]
    fn radius_grows_with_size() {
        let radii: Vec<f64> = SystemSize::all().iter().map(|s| size_radius(*s)).collect();
        assert!(radii.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn quartile_radii() {
        let radii: Vec<f64> = (0..4).map(quartile_radius).collect();
        assert_eq!(radii, vec![8.0, 12.0, 16.0, 24.0]);
    }
}
