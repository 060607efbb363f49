#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Remote data fetching for the NJ SDWA explorer.
//!
//! Every dataset the pages use comes through the [`DataSource`] trait:
//! ECHO tables via the SQL proxy ([`echo`]), polygon layers via `ArcGIS`
//! ([`arcgis`]), the lead service line CSV ([`csv_download`]) and
//! `EJScreen` scores from the local database. [`RemoteDataSource`]
//! memoizes each distinct query for the life of the process.

pub mod arcgis;
pub mod cache;
pub mod csv_download;
pub mod echo;
pub mod parse;
pub mod remote;
pub mod table;

use std::sync::Arc;

use async_trait::async_trait;
use nj_sdwa_models::{
    BlockGroup, BoundingBox, DischargeRecord, EjMeasure, EjScores, LeadServiceLineReport,
    PublicWaterSystem, ServiceArea, Violation, Watershed,
};

pub use cache::QueryCache;
pub use echo::{EchoClient, EchoQuery};
pub use remote::{RemoteDataSource, SourceEndpoints};
pub use table::Table;

/// Errors that can occur while fetching remote data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV parsing failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a non-success status.
    #[error("Request to {url} failed with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// A configured URL is malformed.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// An `ArcGIS` service returned an error body.
    #[error("ArcGIS API error: {message}")]
    Api {
        /// Message from the service.
        message: String,
    },

    /// The `EJScreen` database failed.
    #[error(transparent)]
    Database(#[from] nj_sdwa_database::DbError),
}

/// Everything the pages read.
///
/// Results are shared behind [`Arc`] so memoized values are handed out
/// without copying.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// All public water system rows for a state, every fiscal year.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the fetch fails.
    async fn public_water_systems(
        &self,
        state: &str,
    ) -> Result<Arc<Vec<PublicWaterSystem>>, SourceError>;

    /// Every purveyor service area polygon.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the fetch fails.
    async fn service_areas(&self) -> Result<Arc<Vec<ServiceArea>>, SourceError>;

    /// Violation rows for the given systems.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the fetch fails.
    async fn violations(&self, pwsids: &[String]) -> Result<Arc<Vec<Violation>>, SourceError>;

    /// Census block groups whose envelope touches `bbox`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the fetch fails.
    async fn block_groups(&self, bbox: &BoundingBox)
    -> Result<Arc<Vec<BlockGroup>>, SourceError>;

    /// `EJScreen` values for the given block groups.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the lookup fails.
    async fn ej_scores(&self, geoids: &[String]) -> Result<Arc<Vec<EjScores>>, SourceError>;

    /// Database descriptions of each measure.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the lookup fails.
    async fn ej_descriptions(&self) -> Result<Arc<Vec<(EjMeasure, String)>>, SourceError>;

    /// Every published lead service line report.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the download fails.
    async fn lead_reports(&self) -> Result<Arc<Vec<LeadServiceLineReport>>, SourceError>;

    /// HUC12 watersheds intersecting `bbox`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the fetch fails.
    async fn watersheds(&self, bbox: &BoundingBox) -> Result<Arc<Vec<Watershed>>, SourceError>;

    /// Discharge monitoring rows for facilities in the given watersheds.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the fetch fails.
    async fn discharges(&self, huc12s: &[String])
    -> Result<Arc<Vec<DischargeRecord>>, SourceError>;
}

/// Sorts and dedupes ids so equivalent requests share a cache key.
#[must_use]
pub fn canonical_ids(ids: &[String]) -> Vec<String> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids.dedup();
    ids
}
