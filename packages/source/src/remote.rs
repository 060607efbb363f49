//! [`DataSource`] backed by the live services.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use nj_sdwa_models::{
    BlockGroup, BoundingBox, DischargeRecord, EjMeasure, EjScores, LeadServiceLineReport,
    PublicWaterSystem, ServiceArea, Violation, Watershed,
};
use serde::{Deserialize, Serialize};
use switchy_database::Database;
use tokio::sync::OnceCell;

use crate::cache::QueryCache;
use crate::echo::{EchoClient, EchoQuery};
use crate::{DataSource, SourceError, arcgis, canonical_ids, csv_download, parse};

/// ECHO table of public water systems.
pub const PWS_TABLE: &str = "SDWA_PUBLIC_WATER_SYSTEMS_MVIEW";
/// ECHO table of violations.
pub const VIOLATIONS_TABLE: &str = "SDWA_VIOLATIONS_MVIEW";
/// ECHO table of HUC12 watershed boundaries.
pub const WATERSHED_TABLE: &str = "wbdhu12";
/// SRID of the watershed geometries.
pub const WATERSHED_SRID: u32 = 4269;

/// Where each dataset lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEndpoints {
    /// ECHO SQL proxy base URL.
    pub echo_url: String,
    /// Block group `FeatureServer` base URL.
    pub block_group_url: String,
    /// Block group layer id within the service.
    pub block_group_layer: u32,
    /// Features per block group page.
    pub block_group_page_size: u32,
    /// Purveyor service area layer query URL.
    pub service_area_url: String,
    /// Features per service area page.
    pub service_area_page_size: u32,
    /// Lead service line CSV URL.
    pub lead_csv_url: String,
    /// Local `EJScreen` `SQLite` file.
    pub ej_db_path: PathBuf,
    /// Discharge monitoring report table.
    pub dmr_table: String,
}

impl SourceEndpoints {
    /// `{block_group_url}/{layer}/query`
    #[must_use]
    pub fn block_group_query_url(&self) -> String {
        format!(
            "{}/{}/query",
            self.block_group_url.trim_end_matches('/'),
            self.block_group_layer
        )
    }
}

/// Fetches from ECHO, `ArcGIS`, the lead CSV and the `EJScreen` database,
/// memoizing every distinct request.
pub struct RemoteDataSource {
    endpoints: SourceEndpoints,
    client: reqwest::Client,
    echo: EchoClient,
    ej_db: OnceCell<Box<dyn Database>>,
    systems: QueryCache<Vec<PublicWaterSystem>>,
    service_areas: QueryCache<Vec<ServiceArea>>,
    violations: QueryCache<Vec<Violation>>,
    block_groups: QueryCache<Vec<BlockGroup>>,
    ej_scores: QueryCache<Vec<EjScores>>,
    ej_descriptions: QueryCache<Vec<(EjMeasure, String)>>,
    lead: QueryCache<Vec<LeadServiceLineReport>>,
    watersheds: QueryCache<Vec<Watershed>>,
    discharges: QueryCache<Vec<DischargeRecord>>,
}

impl std::fmt::Debug for RemoteDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDataSource")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl RemoteDataSource {
    #[must_use]
    pub fn new(endpoints: SourceEndpoints) -> Self {
        let client = reqwest::Client::new();
        let echo = EchoClient::new(client.clone(), &endpoints.echo_url);
        Self {
            endpoints,
            client,
            echo,
            ej_db: OnceCell::new(),
            systems: QueryCache::new(),
            service_areas: QueryCache::new(),
            violations: QueryCache::new(),
            block_groups: QueryCache::new(),
            ej_scores: QueryCache::new(),
            ej_descriptions: QueryCache::new(),
            lead: QueryCache::new(),
            watersheds: QueryCache::new(),
            discharges: QueryCache::new(),
        }
    }

    #[must_use]
    pub const fn endpoints(&self) -> &SourceEndpoints {
        &self.endpoints
    }

    /// Opens the `EJScreen` database on first use.
    async fn ej_db(&self) -> Result<&dyn Database, SourceError> {
        let db = self
            .ej_db
            .get_or_try_init(|| async { nj_sdwa_database::open_db(&self.endpoints.ej_db_path) })
            .await?;
        Ok(db.as_ref())
    }
}

#[async_trait]
impl DataSource for RemoteDataSource {
    async fn public_water_systems(
        &self,
        state: &str,
    ) -> Result<Arc<Vec<PublicWaterSystem>>, SourceError> {
        let query = EchoQuery::select(PWS_TABLE).where_eq("STATE", state);
        self.systems
            .get_or_try_insert_with(&query.to_sql(), || async {
                Ok(parse::public_water_systems(&self.echo.query(&query).await?))
            })
            .await
    }

    async fn service_areas(&self) -> Result<Arc<Vec<ServiceArea>>, SourceError> {
        let url = &self.endpoints.service_area_url;
        self.service_areas
            .get_or_try_insert_with(url, || async {
                let features = arcgis::fetch_geojson_features(
                    &self.client,
                    url,
                    None,
                    self.endpoints.service_area_page_size,
                )
                .await?;
                Ok(parse::service_areas(features))
            })
            .await
    }

    async fn violations(&self, pwsids: &[String]) -> Result<Arc<Vec<Violation>>, SourceError> {
        let query = EchoQuery::select(VIOLATIONS_TABLE).where_in("PWSID", &canonical_ids(pwsids));
        self.violations
            .get_or_try_insert_with(&query.to_sql(), || async {
                Ok(parse::violations(&self.echo.query(&query).await?))
            })
            .await
    }

    async fn block_groups(
        &self,
        bbox: &BoundingBox,
    ) -> Result<Arc<Vec<BlockGroup>>, SourceError> {
        let url = self.endpoints.block_group_query_url();
        let key = format!("{url}#{}", bbox.envelope_param());
        self.block_groups
            .get_or_try_insert_with(&key, || async {
                let features = arcgis::fetch_geojson_features(
                    &self.client,
                    &url,
                    Some(bbox),
                    self.endpoints.block_group_page_size,
                )
                .await?;
                Ok(parse::block_groups(features))
            })
            .await
    }

    async fn ej_scores(&self, geoids: &[String]) -> Result<Arc<Vec<EjScores>>, SourceError> {
        let ids = canonical_ids(geoids);
        let key = ids.join(",");
        self.ej_scores
            .get_or_try_insert_with(&key, || async {
                let db = self.ej_db().await?;
                Ok(nj_sdwa_database::query_ej_scores(db, &ids).await?)
            })
            .await
    }

    async fn ej_descriptions(&self) -> Result<Arc<Vec<(EjMeasure, String)>>, SourceError> {
        self.ej_descriptions
            .get_or_try_insert_with(nj_sdwa_database::DESCRIPTIONS_TABLE, || async {
                let db = self.ej_db().await?;
                Ok(nj_sdwa_database::query_column_descriptions(db).await?)
            })
            .await
    }

    async fn lead_reports(&self) -> Result<Arc<Vec<LeadServiceLineReport>>, SourceError> {
        let url = &self.endpoints.lead_csv_url;
        self.lead
            .get_or_try_insert_with(url, || async {
                let table = csv_download::fetch_csv(&self.client, url).await?;
                Ok(parse::lead_reports(&table))
            })
            .await
    }

    async fn watersheds(&self, bbox: &BoundingBox) -> Result<Arc<Vec<Watershed>>, SourceError> {
        let query = EchoQuery::select(WATERSHED_TABLE)
            .columns(["huc12", "name"])
            .geojson_column("wkb_geometry", "geojson")
            .where_raw_spatial("wkb_geometry", &bbox.to_wkt(), WATERSHED_SRID);
        self.watersheds
            .get_or_try_insert_with(&query.to_sql(), || async {
                Ok(parse::watersheds(&self.echo.query(&query).await?))
            })
            .await
    }

    async fn discharges(
        &self,
        huc12s: &[String],
    ) -> Result<Arc<Vec<DischargeRecord>>, SourceError> {
        let query = EchoQuery::select(&self.endpoints.dmr_table)
            .where_in("FAC_DERIVED_WBD", &canonical_ids(huc12s));
        self.discharges
            .get_or_try_insert_with(&query.to_sql(), || async {
                Ok(parse::discharges(&self.echo.query(&query).await?))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> SourceEndpoints {
        SourceEndpoints {
            echo_url: "https://portal.gss.stonybrook.edu/echoepa/".to_string(),
            block_group_url: "https://example.com/FeatureServer/".to_string(),
            block_group_layer: 5,
            block_group_page_size: 2000,
            service_area_url: "https://example.com/MapServer/13/query".to_string(),
            service_area_page_size: 1000,
            lead_csv_url: "https://example.com/leadlines.csv".to_string(),
            ej_db_path: PathBuf::from("does/not/exist.db"),
            dmr_table: "DMR_FY2022_MVIEW".to_string(),
        }
    }

    #[test]
    fn block_group_query_url_joins_layer() {
        assert_eq!(
            endpoints().block_group_query_url(),
            "https://example.com/FeatureServer/5/query"
        );
    }

    #[tokio::test]
    async fn missing_ej_database_is_an_error_not_a_panic() {
        let source = RemoteDataSource::new(endpoints());
        let result = source.ej_scores(&["340030001001".to_string()]).await;
        assert!(matches!(result, Err(SourceError::Database(_))));
        assert!(source.ej_scores.is_empty().await);
    }
}
