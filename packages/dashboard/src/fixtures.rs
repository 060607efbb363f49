//! In-memory [`DataSource`] for page tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use geo::{LineString, MultiPolygon, Polygon};
use nj_sdwa_models::{
    BlockGroup, BoundingBox, DischargeRecord, EjMeasure, EjScores, HealthBased,
    LeadServiceLineReport, PublicWaterSystem, PwsType, Region, ServiceArea, SourceWater,
    SystemSize, Violation, Watershed,
};
use nj_sdwa_source::{DataSource, SourceError};

pub fn square(west: f64, south: f64, size: f64) -> MultiPolygon<f64> {
    MultiPolygon(vec![Polygon::new(
        LineString::from(vec![
            (west, south),
            (west + size, south),
            (west + size, south + size),
            (west, south + size),
            (west, south),
        ]),
        vec![],
    )])
}

/// The area most fixture rows fall in.
pub fn test_region() -> Region {
    Region::from_bbox(BoundingBox::new(-74.2, 40.9, -74.1, 41.0))
}

/// An area with nothing in it.
pub fn empty_region() -> Region {
    Region::from_bbox(BoundingBox::new(-70.0, 30.0, -69.9, 30.1))
}

fn system(
    pwsid: &str,
    name: &str,
    pws_type: PwsType,
    source_water: SourceWater,
    system_size: SystemSize,
    fiscal_year: i32,
    coordinates: Option<(f64, f64)>,
) -> PublicWaterSystem {
    PublicWaterSystem {
        pwsid: pwsid.to_string(),
        name: name.to_string(),
        pws_type,
        source_water,
        system_size,
        fiscal_year: Some(fiscal_year),
        latitude: coordinates.map(|c| c.0),
        longitude: coordinates.map(|c| c.1),
    }
}

fn violation(pwsid: &str, name: &str, health_based: HealthBased) -> Violation {
    Violation {
        pwsid: pwsid.to_string(),
        facility_name: name.to_string(),
        health_based,
        pws_type: PwsType::Community,
        pws_size: "Large".to_string(),
        source_water: SourceWater::SurfaceWater,
        latitude: Some(40.95),
        longitude: Some(-74.15),
        begin_date: None,
    }
}

fn discharge(
    permit: &str,
    facility: &str,
    parameter: &str,
    value: f64,
    huc12: &str,
) -> DischargeRecord {
    DischargeRecord {
        permit: permit.to_string(),
        facility_name: facility.to_string(),
        parameter: parameter.to_string(),
        unit: "kg/d".to_string(),
        value: Some(value),
        latitude: Some(40.96),
        longitude: Some(-74.12),
        sic_codes: Some("4952".to_string()),
        naics_codes: Some("221320".to_string()),
        huc12: Some(huc12.to_string()),
    }
}

fn scores(geoid: &str, values: &[(EjMeasure, Option<f64>)]) -> EjScores {
    EjScores {
        geoid: geoid.to_string(),
        values: values.iter().copied().collect::<BTreeMap<_, _>>(),
    }
}

pub struct FakeSource {
    pub systems: Vec<PublicWaterSystem>,
    pub service_areas: Vec<ServiceArea>,
    pub violations: Vec<Violation>,
    pub block_groups: Vec<BlockGroup>,
    pub scores: Vec<EjScores>,
    pub lead: Vec<LeadServiceLineReport>,
    pub watersheds: Vec<Watershed>,
    pub discharges: Vec<DischargeRecord>,
    pub fail: bool,
}

impl FakeSource {
    pub fn empty() -> Self {
        Self {
            systems: vec![],
            service_areas: vec![],
            violations: vec![],
            block_groups: vec![],
            scores: vec![],
            lead: vec![],
            watersheds: vec![],
            discharges: vec![],
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::sample()
        }
    }

    pub fn sample() -> Self {
        Self {
            systems: vec![
                system(
                    "NJ0001",
                    "Alpha Water",
                    PwsType::Community,
                    SourceWater::SurfaceWater,
                    SystemSize::Large,
                    2021,
                    Some((40.95, -74.15)),
                ),
                system(
                    "NJ0001",
                    "Alpha Water (old)",
                    PwsType::Community,
                    SourceWater::SurfaceWater,
                    SystemSize::Large,
                    2019,
                    Some((40.95, -74.15)),
                ),
                system(
                    "NJ0002",
                    "Beta Camp",
                    PwsType::TransientNonCommunity,
                    SourceWater::Groundwater,
                    SystemSize::VerySmall,
                    2021,
                    Some((40.92, -74.18)),
                ),
                system(
                    "NJ0003",
                    "Gamma Utility",
                    PwsType::Community,
                    SourceWater::Groundwater,
                    SystemSize::Medium,
                    2021,
                    Some((40.5, -74.5)),
                ),
                system(
                    "NJ0004",
                    "Delta School",
                    PwsType::NonTransientNonCommunity,
                    SourceWater::Groundwater,
                    SystemSize::Small,
                    2021,
                    Some((39.5, -75.0)),
                ),
                system(
                    "NJ0005",
                    "Epsilon Well",
                    PwsType::TransientNonCommunity,
                    SourceWater::Groundwater,
                    SystemSize::VerySmall,
                    2021,
                    None,
                ),
            ],
            service_areas: vec![
                ServiceArea {
                    pwid: "NJ0003".to_string(),
                    system_name: "Gamma Utility".to_string(),
                    agency_url: Some("https://gamma.example".to_string()),
                    pwid_url: None,
                    notes: None,
                    geometry: square(-74.15, 40.93, 0.1),
                },
                ServiceArea {
                    pwid: "NJ0099".to_string(),
                    system_name: "Far Utility".to_string(),
                    agency_url: None,
                    pwid_url: None,
                    notes: None,
                    geometry: square(-75.5, 39.0, 0.1),
                },
            ],
            violations: vec![
                violation("NJ0001", "Alpha Water", HealthBased::Yes),
                violation("NJ0001", "Alpha Water", HealthBased::Yes),
                violation("NJ0001", "Alpha Water", HealthBased::No),
                violation("NJ0003", "Gamma Utility", HealthBased::No),
                violation("NJ0004", "Delta School", HealthBased::Yes),
            ],
            block_groups: vec![
                BlockGroup {
                    geoid: "340030001001".to_string(),
                    geometry: square(-74.2, 40.9, 0.05),
                },
                BlockGroup {
                    geoid: "340030001002".to_string(),
                    geometry: square(-74.15, 40.95, 0.05),
                },
                BlockGroup {
                    geoid: "340039999999".to_string(),
                    geometry: square(-75.5, 39.0, 0.05),
                },
            ],
            scores: vec![
                scores(
                    "340030001001",
                    &[
                        (EjMeasure::PeopColorPct, Some(0.1235)),
                        (EjMeasure::Dslpm, Some(0.456)),
                    ],
                ),
                scores(
                    "340030001002",
                    &[(EjMeasure::PeopColorPct, Some(0.5)), (EjMeasure::Dslpm, None)],
                ),
            ],
            lead: vec![
                LeadServiceLineReport {
                    pwsid: "NJ0003".to_string(),
                    utility: "Gamma Utility".to_string(),
                    lead_lines: Some(120),
                    system_size: Some("Medium".to_string()),
                },
                LeadServiceLineReport {
                    pwsid: "NJ0099".to_string(),
                    utility: "Far Utility".to_string(),
                    lead_lines: Some(5),
                    system_size: None,
                },
            ],
            watersheds: vec![
                Watershed {
                    huc12: "020301030101".to_string(),
                    name: "Upper Passaic".to_string(),
                    geometry: square(-74.3, 40.8, 0.4),
                },
                Watershed {
                    huc12: "020400000000".to_string(),
                    name: "Far Creek".to_string(),
                    geometry: square(-75.6, 39.0, 0.1),
                },
            ],
            discharges: vec![
                discharge("NJP1", "Plant A", "Zinc", 1.0, "020301030101"),
                discharge("NJP1", "Plant A", "Zinc", 2.0, "020301030101"),
                discharge("NJP1", "Plant A", "Zinc", 3.0, "020301030101"),
                discharge("NJP1", "Plant A", "Lead", 0.1, "020301030101"),
                discharge("NJP2", "Plant B", "Zinc", 10.0, "020301030101"),
                discharge("NJP9", "Plant Far", "Mercury", 1.0, "020400000000"),
            ],
            fail: false,
        }
    }

    fn check(&self) -> Result<(), SourceError> {
        if self.fail {
            return Err(SourceError::Api {
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn public_water_systems(
        &self,
        _state: &str,
    ) -> Result<Arc<Vec<PublicWaterSystem>>, SourceError> {
        self.check()?;
        Ok(Arc::new(self.systems.clone()))
    }

    async fn service_areas(&self) -> Result<Arc<Vec<ServiceArea>>, SourceError> {
        self.check()?;
        Ok(Arc::new(self.service_areas.clone()))
    }

    async fn violations(&self, pwsids: &[String]) -> Result<Arc<Vec<Violation>>, SourceError> {
        self.check()?;
        Ok(Arc::new(
            self.violations
                .iter()
                .filter(|v| pwsids.contains(&v.pwsid))
                .cloned()
                .collect(),
        ))
    }

    async fn block_groups(
        &self,
        _bbox: &BoundingBox,
    ) -> Result<Arc<Vec<BlockGroup>>, SourceError> {
        self.check()?;
        Ok(Arc::new(self.block_groups.clone()))
    }

    async fn ej_scores(&self, geoids: &[String]) -> Result<Arc<Vec<EjScores>>, SourceError> {
        self.check()?;
        Ok(Arc::new(
            self.scores
                .iter()
                .filter(|s| geoids.contains(&s.geoid))
                .cloned()
                .collect(),
        ))
    }

    async fn ej_descriptions(&self) -> Result<Arc<Vec<(EjMeasure, String)>>, SourceError> {
        self.check()?;
        Ok(Arc::new(vec![
            (EjMeasure::PeopColorPct, "% people of color".to_string()),
            (EjMeasure::Dslpm, "Diesel particulate matter".to_string()),
        ]))
    }

    async fn lead_reports(&self) -> Result<Arc<Vec<LeadServiceLineReport>>, SourceError> {
        self.check()?;
        Ok(Arc::new(self.lead.clone()))
    }

    async fn watersheds(&self, _bbox: &BoundingBox) -> Result<Arc<Vec<Watershed>>, SourceError> {
        self.check()?;
        Ok(Arc::new(self.watersheds.clone()))
    }

    async fn discharges(
        &self,
        huc12s: &[String],
    ) -> Result<Arc<Vec<DischargeRecord>>, SourceError> {
        self.check()?;
        Ok(Arc::new(
            self.discharges
                .iter()
                .filter(|d| d.huc12.as_ref().is_some_and(|h| huc12s.contains(h)))
                .cloned()
                .collect(),
        ))
    }
}
