//! `GeoJSON` ↔ `geo` conversions shared by every polygon dataset.

use geo::{BoundingRect as _, MultiPolygon};
use geojson::GeoJson;

use crate::BoundingBox;

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
///
/// Handles both `Polygon` and `MultiPolygon` geometry types; anything
/// else yields `None`.
#[must_use]
pub fn multipolygon_from_geometry(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        geo::Geometry::Rect(r) => Some(MultiPolygon(vec![r.to_polygon()])),
        _ => None,
    }
}

/// Parses a `GeoJSON` geometry string (as returned by `ST_AsGeoJSON`)
/// into a [`MultiPolygon`].
#[must_use]
pub fn parse_multipolygon(geojson_str: &str) -> Option<MultiPolygon<f64>> {
    match geojson_str.parse::<GeoJson>().ok()? {
        GeoJson::Geometry(geom) => multipolygon_from_geometry(geom),
        GeoJson::Feature(feature) => feature.geometry.and_then(multipolygon_from_geometry),
        GeoJson::FeatureCollection(_) => None,
    }
}

/// Bounding box of a [`MultiPolygon`], or `None` if it has no coordinates.
#[must_use]
pub fn bounding_box(mp: &MultiPolygon<f64>) -> Option<BoundingBox> {
    mp.bounding_rect().map(|rect| {
        BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    })
}

/// Smallest box covering all of the given boxes.
#[must_use]
pub fn total_bounds<'a, I>(boxes: I) -> Option<BoundingBox>
where
    I: IntoIterator<Item = &'a BoundingBox>,
{
    boxes
        .into_iter()
        .fold(None, |acc: Option<BoundingBox>, b| {
            Some(acc.map_or(*b, |a| a.union(b)))
        })
}

/// Converts a [`MultiPolygon`] into a `GeoJSON` geometry.
#[must_use]
pub fn to_geojson_geometry(mp: &MultiPolygon<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(mp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_polygon_string() {
        let mp = parse_multipolygon(
            r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#,
        )
        .unwrap();
        assert_eq!(mp.0.len(), 1);
        assert_eq!(
            bounding_box(&mp),
            Some(BoundingBox::new(0.0, 0.0, 1.0, 1.0))
        );
    }

    #[test]
    fn parses_multipolygon_string() {
        let mp = parse_multipolygon(
            r#"{"type":"MultiPolygon","coordinates":[
                [[[0,0],[1,0],[1,1],[0,0]]],
                [[[2,2],[3,2],[3,3],[2,2]]]
            ]}"#,
        )
        .unwrap();
        assert_eq!(mp.0.len(), 2);
    }

    #[test]
    fn rejects_points_and_garbage() {
        assert!(parse_multipolygon(r#"{"type":"Point","coordinates":[0,0]}"#).is_none());
        assert!(parse_multipolygon("not json").is_none());
    }

    #[test]
    fn total_bounds_of_nothing_is_none() {
        let none: [BoundingBox; 0] = [];
        assert!(total_bounds(&none).is_none());
        let boxes = [
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            BoundingBox::new(-1.0, 0.5, 0.5, 2.0),
        ];
        assert_eq!(
            total_bounds(&boxes),
            Some(BoundingBox::new(-1.0, 0.0, 1.0, 2.0))
        );
    }
}
