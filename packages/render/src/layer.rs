//! `GeoJSON` map layers.
//!
//! Each feature carries its drawing instructions in two properties:
//! `style` (a serialized [`MarkerStyle`] or [`PolygonStyle`]) and `popup`
//! (an HTML snippet). Remaining properties are the row's data.

use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use nj_sdwa_models::BoundingBox;
use nj_sdwa_models::geometry::to_geojson_geometry;
use serde::Serialize;

use crate::color::LinearColormap;
use crate::style::{MarkerStyle, PolygonStyle};

/// Builds a popup: the title followed by one `<b>label:</b> value` line per
/// field.
#[must_use]
pub fn popup(title: &str, fields: &[(&str, String)]) -> String {
    let mut html = title.to_string();
    for (label, value) in fields {
        html.push_str("<br><b>");
        html.push_str(label);
        html.push_str(":</b> ");
        html.push_str(value);
    }
    html
}

/// A named feature collection, optionally with the color scale its
/// features were painted with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayer {
    pub name: String,
    pub features: FeatureCollection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colormap: Option<LinearColormap>,
}

impl MapLayer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: FeatureCollection {
                bbox: None,
                features: vec![],
                foreign_members: None,
            },
            colormap: None,
        }
    }

    #[must_use]
    pub fn with_colormap(mut self, colormap: LinearColormap) -> Self {
        self.colormap = Some(colormap);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.features.is_empty()
    }

    /// Adds a circle marker at `(lat, lng)`.
    pub fn push_marker(
        &mut self,
        lat: f64,
        lng: f64,
        style: &MarkerStyle,
        popup: String,
        properties: JsonObject,
    ) {
        let geometry = Geometry::new(Value::Point(vec![lng, lat]));
        self.push(geometry, style, popup, properties);
    }

    /// Adds a polygon feature.
    pub fn push_polygon(
        &mut self,
        polygon: &MultiPolygon<f64>,
        style: &PolygonStyle,
        popup: String,
        properties: JsonObject,
    ) {
        self.push(to_geojson_geometry(polygon), style, popup, properties);
    }

    fn push<S: Serialize>(
        &mut self,
        geometry: Geometry,
        style: &S,
        popup: String,
        mut properties: JsonObject,
    ) {
        match serde_json::to_value(style) {
            Ok(style) => {
                properties.insert("style".to_string(), style);
            }
            Err(e) => log::warn!("Failed to serialize feature style: {e}"),
        }
        properties.insert("popup".to_string(), JsonValue::String(popup));

        self.features.features.push(Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }
}

/// Everything a map needs: the view extent and its layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    /// `[[south, west], [north, east]]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_bounds: Option<[[f64; 2]; 2]>,
    /// `[lat, lng]`, used when there are no bounds to fit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u8>,
    pub layers: Vec<MapLayer>,
}

impl MapView {
    #[must_use]
    pub fn new(bounds: Option<&BoundingBox>) -> Self {
        Self {
            fit_bounds: bounds.map(fit_bounds),
            center: None,
            zoom: None,
            layers: vec![],
        }
    }

    #[must_use]
    pub const fn centered(lat: f64, lng: f64, zoom: u8) -> Self {
        Self {
            fit_bounds: None,
            center: Some([lat, lng]),
            zoom: Some(zoom),
            layers: Vec::new(),
        }
    }

    /// Features across all layers.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.layers.iter().map(MapLayer::len).sum()
    }

    #[must_use]
    pub fn with_layer(mut self, layer: MapLayer) -> Self {
        self.layers.push(layer);
        self
    }
}

/// Leaflet `fitBounds` corners for a box.
#[must_use]
pub const fn fit_bounds(bbox: &BoundingBox) -> [[f64; 2]; 2] {
    bbox.fit_bounds()
}
