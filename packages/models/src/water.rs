//! Public water systems, their violations, service areas and lead
//! service line counts.

use chrono::NaiveDate;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// EPA public water system type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
pub enum PwsType {
    /// Community water system.
    #[strum(serialize = "CWS")]
    #[serde(rename = "CWS")]
    Community,
    /// Non-transient non-community water system (schools, offices).
    #[strum(serialize = "NTNCWS")]
    #[serde(rename = "NTNCWS")]
    NonTransientNonCommunity,
    /// Transient non-community water system (campgrounds, gas stations).
    #[strum(serialize = "TNCWS")]
    #[serde(rename = "TNCWS")]
    TransientNonCommunity,
    /// Any code not listed above.
    Unknown,
}

impl PwsType {
    /// Parses an ECHO `PWS_TYPE_CODE`.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "CWS" => Self::Community,
            "NTNCWS" => Self::NonTransientNonCommunity,
            "TNCWS" => Self::TransientNonCommunity,
            _ => Self::Unknown,
        }
    }
}

/// Where a system draws its water from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
pub enum SourceWater {
    /// Wells and purchased groundwater.
    Groundwater,
    /// Rivers, reservoirs and groundwater under surface influence.
    #[strum(serialize = "Surface water")]
    SurfaceWater,
    /// Any code not listed above.
    Unknown,
}

impl SourceWater {
    /// Parses an ECHO `SOURCE_WATER` / `PRIMARY_SOURCE_CODE` value.
    ///
    /// Purchased (`*P`) sources map to their underlying kind, and
    /// groundwater under the influence of surface water (`GU`) counts as
    /// surface water.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "GW" | "GWP" | "GROUNDWATER" => Self::Groundwater,
            "SW" | "SWP" | "GU" | "GUP" | "SURFACE WATER" => Self::SurfaceWater,
            _ => Self::Unknown,
        }
    }

    /// Whether the source is surface water.
    #[must_use]
    pub const fn is_surface(self) -> bool {
        matches!(self, Self::SurfaceWater)
    }
}

/// EPA size class by population served.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
pub enum SystemSize {
    /// 500 or fewer people.
    #[strum(serialize = "Very Small")]
    VerySmall,
    /// 501 to 3,300 people.
    Small,
    /// 3,301 to 10,000 people.
    Medium,
    /// 10,001 to 100,000 people.
    Large,
    /// More than 100,000 people.
    #[strum(serialize = "Very Large")]
    VeryLarge,
    /// Missing or unrecognized.
    Unknown,
}

impl SystemSize {
    /// Parses an ECHO size label such as `"Very Small (25-500)"`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_ascii_lowercase();
        if label.starts_with("very small") {
            Self::VerySmall
        } else if label.starts_with("very large") {
            Self::VeryLarge
        } else if label.starts_with("small") {
            Self::Small
        } else if label.starts_with("medium") {
            Self::Medium
        } else if label.starts_with("large") {
            Self::Large
        } else {
            Self::Unknown
        }
    }

    /// All known size classes, smallest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::VerySmall,
            Self::Small,
            Self::Medium,
            Self::Large,
            Self::VeryLarge,
        ]
    }
}

/// One row of `SDWA_PUBLIC_WATER_SYSTEMS_MVIEW`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicWaterSystem {
    /// Public water system id, e.g. `NJ0714001`.
    pub pwsid: String,
    /// Facility name.
    pub name: String,
    /// System type.
    pub pws_type: PwsType,
    /// Water source.
    pub source_water: SourceWater,
    /// Size class.
    pub system_size: SystemSize,
    /// Fiscal year of the record.
    pub fiscal_year: Option<i32>,
    /// Facility latitude.
    pub latitude: Option<f64>,
    /// Facility longitude.
    pub longitude: Option<f64>,
}

impl PublicWaterSystem {
    /// Facility coordinates as `(latitude, longitude)` when both are known.
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Whether a violation is health-based.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
pub enum HealthBased {
    /// `Y`
    #[strum(serialize = "Y")]
    #[serde(rename = "Y")]
    Yes,
    /// `N`
    #[strum(serialize = "N")]
    #[serde(rename = "N")]
    No,
}

impl HealthBased {
    /// Parses the `HEALTH_BASED` flag; anything but `Y` counts as `No`.
    #[must_use]
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim().eq_ignore_ascii_case("y") {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// One row of `SDWA_VIOLATIONS_MVIEW`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// System the violation was recorded against.
    pub pwsid: String,
    /// Facility name.
    pub facility_name: String,
    /// Health-based flag.
    pub health_based: HealthBased,
    /// System type.
    pub pws_type: PwsType,
    /// Size label as reported (`"N/A"` for synthesized rows).
    pub pws_size: String,
    /// Water source.
    pub source_water: SourceWater,
    /// Facility latitude.
    pub latitude: Option<f64>,
    /// Facility longitude.
    pub longitude: Option<f64>,
    /// When the compliance period began.
    pub begin_date: Option<NaiveDate>,
}

/// An NJDEP purveyor service area polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceArea {
    /// Purveyor id; matches a PWSID.
    pub pwid: String,
    /// System name.
    pub system_name: String,
    /// Agency web page.
    pub agency_url: Option<String>,
    /// Drinking Water Watch page for the system.
    pub pwid_url: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Service area footprint.
    pub geometry: MultiPolygon<f64>,
}

/// A utility's reported lead service line count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadServiceLineReport {
    /// Reporting system.
    pub pwsid: String,
    /// Utility name.
    pub utility: String,
    /// Lead service lines; `None` means no report, which is not zero.
    pub lead_lines: Option<u64>,
    /// Size label as published.
    pub system_size: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pws_type_codes() {
        assert_eq!(PwsType::from_code("CWS"), PwsType::Community);
        assert_eq!(PwsType::from_code(" tncws "), PwsType::TransientNonCommunity);
        assert_eq!(PwsType::from_code("NTNCWS"), PwsType::NonTransientNonCommunity);
        assert_eq!(PwsType::from_code("XYZ"), PwsType::Unknown);
        assert_eq!(PwsType::Community.to_string(), "CWS");
    }

    #[test]
    fn source_water_codes() {
        assert_eq!(SourceWater::from_code("GW"), SourceWater::Groundwater);
        assert_eq!(SourceWater::from_code("GWP"), SourceWater::Groundwater);
        assert_eq!(SourceWater::from_code("SWP"), SourceWater::SurfaceWater);
        assert_eq!(SourceWater::from_code("GU"), SourceWater::SurfaceWater);
        assert_eq!(SourceWater::from_code(""), SourceWater::Unknown);
        assert!(SourceWater::SurfaceWater.is_surface());
        assert_eq!(SourceWater::SurfaceWater.to_string(), "Surface water");
    }

    #[test]
    fn size_labels() {
        assert_eq!(SystemSize::from_label("Very Small (25-500)"), SystemSize::VerySmall);
        assert_eq!(SystemSize::from_label("Small (501-3,300)"), SystemSize::Small);
        assert_eq!(SystemSize::from_label("Medium"), SystemSize::Medium);
        assert_eq!(SystemSize::from_label("Large (10,001-100,000)"), SystemSize::Large);
        assert_eq!(SystemSize::from_label("Very Large (>100,000)"), SystemSize::VeryLarge);
        assert_eq!(SystemSize::from_label("N/A"), SystemSize::Unknown);
        assert_eq!(SystemSize::all().len(), 5);
    }

    #[test]
    fn health_flag() {
        assert_eq!(HealthBased::from_flag("Y"), HealthBased::Yes);
        assert_eq!(HealthBased::from_flag("N"), HealthBased::No);
        assert_eq!(HealthBased::from_flag(""), HealthBased::No);
        assert_eq!(HealthBased::Yes.to_string(), "Y");
    }

    #[test]
    fn coordinates_need_both() {
        let mut pws = PublicWaterSystem {
            pwsid: "NJ0001".to_string(),
            name: "Test".to_string(),
            pws_type: PwsType::Community,
            source_water: SourceWater::Groundwater,
            system_size: SystemSize::Small,
            fiscal_year: Some(2021),
            latitude: Some(40.0),
            longitude: None,
        };
        assert_eq!(pws.coordinates(), None);
        pws.longitude = Some(-74.0);
        assert_eq!(pws.coordinates(), Some((40.0, -74.0)));
    }
}
