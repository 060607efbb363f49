//! `EJScreen` environmental justice indicators and census block groups.

use std::collections::BTreeMap;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Whether an indicator describes people or pollution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum EjKind {
    /// Demographic share, stored as a 0-1 fraction.
    Socioeconomic,
    /// Environmental burden in its own units.
    Environmental,
}

/// An `EJScreen` state-ranking indicator.
///
/// Variants serialize as the database column name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum EjMeasure {
    PeopColorPct,
    LowIncPct,
    LessHsPct,
    LingIsoPct,
    Under5Pct,
    Over64Pct,
    UnempPct,
    Pre1960Pct,
    Dslpm,
    Ptraf,
    Pwdis,
    Pnpl,
    Prmp,
    Ptsdf,
    Ozone,
    Pm25,
    Ust,
}

impl EjMeasure {
    /// Every indicator, socioeconomic first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::PeopColorPct,
            Self::LowIncPct,
            Self::LessHsPct,
            Self::LingIsoPct,
            Self::Under5Pct,
            Self::Over64Pct,
            Self::UnempPct,
            Self::Pre1960Pct,
            Self::Dslpm,
            Self::Ptraf,
            Self::Pwdis,
            Self::Pnpl,
            Self::Prmp,
            Self::Ptsdf,
            Self::Ozone,
            Self::Pm25,
            Self::Ust,
        ]
    }

    /// Indicators of one kind, in display order.
    #[must_use]
    pub fn of_kind(kind: EjKind) -> Vec<Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|m| m.kind() == kind)
            .collect()
    }

    /// Looks a measure up by its column name (case-insensitive).
    #[must_use]
    pub fn from_column(column: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|m| m.column().eq_ignore_ascii_case(column.trim()))
    }

    /// Column name in `EJSCREEN_2024_StateRankings_NJ`.
    #[must_use]
    pub fn column(self) -> &'static str {
        self.into()
    }

    #[must_use]
    pub const fn kind(self) -> EjKind {
        match self {
            Self::PeopColorPct
            | Self::LowIncPct
            | Self::LessHsPct
            | Self::LingIsoPct
            | Self::Under5Pct
            | Self::Over64Pct
            | Self::UnempPct
            | Self::Pre1960Pct => EjKind::Socioeconomic,
            Self::Dslpm
            | Self::Ptraf
            | Self::Pwdis
            | Self::Pnpl
            | Self::Prmp
            | Self::Ptsdf
            | Self::Ozone
            | Self::Pm25
            | Self::Ust => EjKind::Environmental,
        }
    }

    /// Unit the formatted value is expressed in.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::PeopColorPct
            | Self::LowIncPct
            | Self::LessHsPct
            | Self::LingIsoPct
            | Self::Under5Pct
            | Self::Over64Pct
            | Self::UnempPct
            | Self::Pre1960Pct => "%",
            Self::Dslpm | Self::Pm25 => "µg/m³",
            Self::Ptraf => "vehicles per meter",
            Self::Pwdis => "toxicity-weighted concentration per km",
            Self::Pnpl | Self::Prmp | Self::Ptsdf => "sites per km",
            Self::Ozone => "ppb",
            Self::Ust => "weighted tank count",
        }
    }

    /// Plain-language definition shown next to the map.
    #[must_use]
    pub const fn definition(self) -> &'static str {
        match self {
            Self::PeopColorPct => {
                "Percent of individuals in a block group who list their racial status as a race \
                 other than white alone and/or list their ethnicity as Hispanic or Latino. That \
                 is, all people other than non-Hispanic white-alone individuals. The word 'alone' \
                 in this case indicates that the person is of a single race, not multiracial."
            }
            Self::LowIncPct => {
                "Percent of a block group's population in households where the household income \
                 is less than or equal to twice the federal poverty level."
            }
            Self::LessHsPct => {
                "Percent of people age 25 or older in a block group whose education is short of \
                 a high school diploma."
            }
            Self::LingIsoPct => {
                "Percent of people in a block group living in limited English speaking \
                 households. A household in which all members age 14 years and over speak a \
                 non-English language and also speak English less than 'very well' (have \
                 difficulty with English) is limited English speaking."
            }
            Self::Under5Pct => "Percent of people in a block group under the age of 5.",
            Self::Over64Pct => "Percent of people in a block group over the age of 64.",
            Self::UnempPct => {
                "Percent of a block group's population that did not have a job at all during the \
                 reporting period, made at least one specific active effort to find a job during \
                 the prior 4 weeks, and were available for work (unless temporarily ill)."
            }
            Self::Pre1960Pct => {
                "Percent of housing units built pre-1960, as indicator of potential lead paint \
                 exposure."
            }
            Self::Dslpm => "Diesel particulate matter level in air, µg/m3.",
            Self::Ptraf => {
                "Count of vehicles (AADT, avg. annual daily traffic) at major roads within 500 \
                 meters, divided by distance in meters (not km)."
            }
            Self::Pwdis => {
                "RSEI modeled toxic concentrations at stream segments within 500 meters, divided \
                 by distance in kilometers (km)."
            }
            Self::Pnpl => {
                "Count of proposed or listed NPL - also known as superfund - sites within 5 km \
                 (or nearest one beyond 5 km), each divided by distance in kilometers."
            }
            Self::Prmp => {
                "Count of RMP (potential chemical accident management plan) facilities within \
                 5 km (or nearest one beyond 5 km), each divided by distance in kilometers."
            }
            Self::Ptsdf => {
                "Count of hazardous waste facilities (TSDFs and LQGs) within 5 km (or nearest \
                 beyond 5 km), each divided by distance in kilometers."
            }
            Self::Ozone => {
                "Annual average of top ten maximum daily 8-hour ozone air concentrations in parts \
                 per billion."
            }
            Self::Pm25 => "PM2.5 levels in air, µg/m3 annual avg.",
            Self::Ust => {
                "Count of leaking underground storage tanks (multiplied by a factor of 7.7) and \
                 the number of underground storage tanks within a 1,500-foot buffered block group."
            }
        }
    }
}

/// A 2020 census block group boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGroup {
    /// 12-digit `GEOID20`, kept as text.
    pub geoid: String,
    pub geometry: MultiPolygon<f64>,
}

/// `EJScreen` values for one block group. A missing or non-numeric cell
/// is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EjScores {
    pub geoid: String,
    pub values: BTreeMap<EjMeasure, Option<f64>>,
}

impl EjScores {
    /// Raw value of a measure, if present.
    #[must_use]
    pub fn get(&self, measure: EjMeasure) -> Option<f64> {
        self.values.get(&measure).copied().flatten()
    }
}
