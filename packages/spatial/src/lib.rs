#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region filtering and key joins.
//!
//! Polygon datasets are indexed in an R-tree of bounding boxes and then
//! checked exactly against the [`Region`]. Point datasets are tested
//! directly. Results always keep the input order, and every join or
//! dedupe keeps the first row for a key.

use std::collections::{BTreeMap, BTreeSet};

use geo::{BoundingRect as _, MultiPolygon};
use nj_sdwa_models::{
    BlockGroup, BoundingBox, PublicWaterSystem, Region, ServiceArea, Watershed, geometry,
};
use rstar::{AABB, RTree, RTreeObject};

/// Anything with a polygon footprint.
pub trait Footprint {
    fn footprint(&self) -> &MultiPolygon<f64>;
}

impl Footprint for ServiceArea {
    fn footprint(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}

impl Footprint for BlockGroup {
    fn footprint(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}

impl Footprint for Watershed {
    fn footprint(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}

/// Position of an item in the indexed slice, keyed by its bounding box.
struct IndexEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    mp.bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

fn bbox_envelope(bbox: &BoundingBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.west, bbox.south], [bbox.east, bbox.north])
}

/// R-tree over a borrowed slice of polygon items.
pub struct PolygonIndex<'a, T> {
    items: &'a [T],
    tree: RTree<IndexEntry>,
}

impl<'a, T: Footprint> PolygonIndex<'a, T> {
    /// Indexes every item with a non-empty footprint.
    #[must_use]
    pub fn new(items: &'a [T]) -> Self {
        let entries: Vec<IndexEntry> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                compute_envelope(item.footprint()).map(|envelope| IndexEntry { index, envelope })
            })
            .collect();

        if entries.len() < items.len() {
            log::warn!(
                "{} of {} polygons have no coordinates and were not indexed",
                items.len() - entries.len(),
                items.len()
            );
        }

        Self {
            items,
            tree: RTree::bulk_load(entries),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Items whose footprint intersects the region, in input order.
    #[must_use]
    pub fn intersecting(&self, region: &Region) -> Vec<&'a T> {
        self.intersecting_envelope(&bbox_envelope(&region.bounding_box()), |item| {
            region.intersects(item.footprint())
        })
    }

    fn intersecting_envelope(
        &self,
        envelope: &AABB<[f64; 2]>,
        exact: impl Fn(&T) -> bool,
    ) -> Vec<&'a T> {
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(envelope)
            .map(|entry| entry.index)
            .filter(|&i| exact(&self.items[i]))
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|i| &self.items[i]).collect()
    }
}

/// Polygon items intersecting the region, cloned, in input order.
#[must_use]
pub fn intersecting<T: Footprint + Clone>(region: &Region, items: &[T]) -> Vec<T> {
    PolygonIndex::new(items)
        .intersecting(region)
        .into_iter()
        .cloned()
        .collect()
}

/// Rows whose `(latitude, longitude)` lies in or on the region. Rows
/// without coordinates are dropped.
#[must_use]
pub fn filter_points<T, F>(region: &Region, rows: &[T], coordinates: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<(f64, f64)>,
{
    rows.iter()
        .filter(|row| coordinates(*row).is_some_and(|(lat, lng)| region.contains_point(lat, lng)))
        .cloned()
        .collect()
}

/// Keeps the first row for each key, preserving order.
#[must_use]
pub fn dedupe_by_key<T, K, F>(rows: Vec<T>, key: F) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut seen = BTreeSet::new();
    rows.into_iter().filter(|row| seen.insert(key(row))).collect()
}

/// Pairs each left row with the first right row sharing its key.
#[must_use]
pub fn left_join_by_key<'l, 'r, L, R, K, FL, FR>(
    left: &'l [L],
    right: &'r [R],
    left_key: FL,
    right_key: FR,
) -> Vec<(&'l L, Option<&'r R>)>
where
    K: Ord,
    FL: Fn(&L) -> K,
    FR: Fn(&R) -> K,
{
    let mut lookup: BTreeMap<K, &'r R> = BTreeMap::new();
    for row in right {
        lookup.entry(right_key(row)).or_insert(row);
    }
    left.iter()
        .map(|row| (row, lookup.get(&left_key(row)).copied()))
        .collect()
}

/// Smallest box covering every footprint, or `None` for no items.
#[must_use]
pub fn total_bounds<T: Footprint>(items: &[T]) -> Option<BoundingBox> {
    let boxes: Vec<BoundingBox> = items
        .iter()
        .filter_map(|item| geometry::bounding_box(item.footprint()))
        .collect();
    geometry::total_bounds(&boxes)
}

/// Systems and service areas selected for a region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub systems: Vec<PublicWaterSystem>,
    pub service_areas: Vec<ServiceArea>,
}

/// Selects the systems relevant to a region.
///
/// A system is selected when its facility point lies in the region or when
/// it operates a service area that intersects the region. Point matches
/// come first; each PWSID appears once.
#[must_use]
pub fn select_systems(
    region: &Region,
    systems: &[PublicWaterSystem],
    service_areas: &[ServiceArea],
) -> Selection {
    let service_areas = intersecting(region, service_areas);
    let area_ids: BTreeSet<&str> = service_areas.iter().map(|a| a.pwid.as_str()).collect();

    let mut selected = filter_points(region, systems, PublicWaterSystem::coordinates);
    selected.extend(
        systems
            .iter()
            .filter(|s| area_ids.contains(s.pwsid.as_str()))
            .cloned(),
    );
    let systems = dedupe_by_key(selected, |s| s.pwsid.clone());

    log::debug!(
        "Selected {} systems and {} service areas",
        systems.len(),
        service_areas.len()
    );

    Selection {
        systems,
        service_areas,
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Polygon};
    use nj_sdwa_models::{PwsType, SourceWater, SystemSize};

    use super::*;

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![
                (x, y),
                (x + size, y),
                (x + size, y + size),
                (x, y + size),
                (x, y),
            ]),
            vec![],
        )])
    }

    fn area(pwid: &str, x: f64, y: f64) -> ServiceArea {
        ServiceArea {
            pwid: pwid.to_string(),
            system_name: format!("{pwid} system"),
            agency_url: None,
            pwid_url: None,
            notes: None,
            geometry: square(x, y, 0.1),
        }
    }

    fn system(pwsid: &str, lat: Option<f64>, lng: Option<f64>) -> PublicWaterSystem {
        PublicWaterSystem {
            pwsid: pwsid.to_string(),
            name: pwsid.to_string(),
            pws_type: PwsType::Community,
            source_water: SourceWater::Groundwater,
            system_size: SystemSize::Small,
            fiscal_year: Some(2021),
            latitude: lat,
            longitude: lng,
        }
    }

    fn region() -> Region {
        Region::from_bbox(BoundingBox::new(0.0, 0.0, 1.0, 1.0))
    }

    #[test]
    fn index_returns_intersecting_in_input_order() {
        let areas = vec![
            area("C", 0.5, 0.5),
            area("OUT", 5.0, 5.0),
            area("A", 0.95, 0.95),
            area("B", 0.0, 0.0),
        ];
        let index = PolygonIndex::new(&areas);
        assert_eq!(index.len(), 4);
        let hits: Vec<&str> = index
            .intersecting(&region())
            .iter()
            .map(|a| a.pwid.as_str())
            .collect();
        assert_eq!(hits, ["C", "A", "B"]);
    }

    #[test]
    fn envelope_overlap_is_not_enough() {
        // The triangle's bounding box overlaps the region; the triangle
        // itself does not.
        let triangle = MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(1.5, 0.5), (2.5, 0.5), (2.5, 1.5), (1.5, 0.5)]),
            vec![],
        )]);
        let areas = vec![ServiceArea {
            geometry: triangle,
            ..area("T", 0.0, 0.0)
        }];
        let small = Region::from_bbox(BoundingBox::new(1.5, 1.2, 1.6, 1.4));
        assert!(PolygonIndex::new(&areas).intersecting(&small).is_empty());
    }

    #[test]
    fn points_without_coordinates_dropped() {
        let systems = vec![
            system("IN", Some(0.5), Some(0.5)),
            system("EDGE", Some(1.0), Some(0.5)),
            system("OUT", Some(2.0), Some(2.0)),
            system("NONE", None, None),
        ];
        let kept = filter_points(&region(), &systems, PublicWaterSystem::coordinates);
        let ids: Vec<_> = kept.iter().map(|s| s.pwsid.as_str()).collect();
        assert_eq!(ids, ["IN", "EDGE"]);
    }

    #[test]
    fn selection_adds_service_area_systems_once() {
        let systems = vec![
            system("NJ1", Some(0.5), Some(0.5)),
            system("NJ2", Some(9.0), Some(9.0)),
            system("NJ3", Some(9.0), Some(9.0)),
            system("NJ1", Some(9.0), Some(9.0)),
        ];
        let areas = vec![area("NJ2", 0.2, 0.2), area("NJ1", 0.3, 0.3), area("NJ3", 7.0, 7.0)];

        let selection = select_systems(&region(), &systems, &areas);
        let ids: Vec<_> = selection.systems.iter().map(|s| s.pwsid.as_str()).collect();
        assert_eq!(ids, ["NJ1", "NJ2"]);
        // First wins: the point match for NJ1 is kept.
        assert_eq!(selection.systems[0].latitude, Some(0.5));
        assert_eq!(selection.service_areas.len(), 2);

        // Every selected system comes from the input.
        assert!(selection.systems.iter().all(|s| systems.contains(s)));
    }

    #[test]
    fn empty_inputs_yield_empty_selection() {
        let selection = select_systems(&region(), &[], &[]);
        assert_eq!(selection, Selection::default());
    }

    #[test]
    fn dedupe_keeps_first() {
        let rows = vec![("a", 1), ("b", 2), ("a", 3)];
        assert_eq!(dedupe_by_key(rows, |r| r.0), vec![("a", 1), ("b", 2)]);
    }

    #[test]
    fn left_join_uses_first_match() {
        let left = ["x", "y", "z"];
        let right = [("x", 1), ("x", 2), ("z", 3)];
        let joined = left_join_by_key(&left, &right, |l| *l, |r| r.0);
        assert_eq!(joined[0].1, Some(&("x", 1)));
        assert_eq!(joined[1].1, None);
        assert_eq!(joined[2].1, Some(&("z", 3)));
    }

    #[test]
    fn total_bounds_of_areas() {
        let areas = vec![area("A", 0.0, 0.0), area("B", 1.0, 2.0)];
        let bounds = total_bounds(&areas).unwrap();
        assert!((bounds.east - 1.1).abs() < 1e-12);
        assert!((bounds.north - 2.1).abs() < 1e-12);
        assert!(total_bounds::<ServiceArea>(&[]).is_none());
    }
}
