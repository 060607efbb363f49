//! `ArcGIS` `FeatureServer` / `MapServer` `GeoJSON` fetcher.
//!
//! Queries with `f=geojson`, optionally restricted to an envelope, and
//! pages through results with `resultOffset` until the server stops
//! reporting `exceededTransferLimit`.

use nj_sdwa_models::BoundingBox;

use crate::SourceError;

/// Builds the URL for one page of an `ArcGIS` query.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if `query_url` does not parse.
pub fn page_url(
    query_url: &str,
    envelope: Option<&BoundingBox>,
    page_size: u32,
    offset: u64,
) -> Result<reqwest::Url, SourceError> {
    let mut url = reqwest::Url::parse(query_url).map_err(|e| SourceError::InvalidUrl {
        url: query_url.to_string(),
        message: e.to_string(),
    })?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("where", "1=1")
            .append_pair("outFields", "*")
            .append_pair("returnGeometry", "true")
            .append_pair("outSR", "4326")
            .append_pair("f", "geojson")
            .append_pair("resultRecordCount", &page_size.to_string())
            .append_pair("resultOffset", &offset.to_string());

        if let Some(bbox) = envelope {
            pairs
                .append_pair("geometry", &bbox.envelope_param())
                .append_pair("geometryType", "esriGeometryEnvelope")
                .append_pair("inSR", "4326")
                .append_pair("spatialRel", "esriSpatialRelIntersects");
        }
    }

    Ok(url)
}

/// `exceededTransferLimit` appears at the top level or under
/// `properties` depending on the server version.
fn exceeded_transfer_limit(body: &serde_json::Value) -> bool {
    body.get("exceededTransferLimit")
        .or_else(|| body.pointer("/properties/exceededTransferLimit"))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

/// Extracts the features of one page, surfacing `ArcGIS` error bodies.
///
/// Features that are not valid `GeoJSON` are logged and skipped.
///
/// # Errors
///
/// Returns [`SourceError::Api`] if the body carries an `error` object.
pub fn parse_page(body: &serde_json::Value) -> Result<Vec<geojson::Feature>, SourceError> {
    if let Some(error) = body.get("error") {
        return Err(SourceError::Api {
            message: error
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    let features = body
        .get("features")
        .and_then(serde_json::Value::as_array)
        .map(|features| {
            features
                .iter()
                .filter_map(|f| match geojson::Feature::from_json_value(f.clone()) {
                    Ok(feature) => Some(feature),
                    Err(e) => {
                        log::warn!("Skipping malformed ArcGIS feature: {e}");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(features)
}

/// Fetches every feature matching the query.
///
/// # Errors
///
/// Returns [`SourceError`] on network failure, a non-2xx status, an
/// unparseable body or an `ArcGIS` error response.
pub async fn fetch_geojson_features(
    client: &reqwest::Client,
    query_url: &str,
    envelope: Option<&BoundingBox>,
    page_size: u32,
) -> Result<Vec<geojson::Feature>, SourceError> {
    let mut all_features = Vec::new();
    let mut offset: u64 = 0;

    loop {
        let url = page_url(query_url, envelope, page_size, offset)?;
        log::debug!("ArcGIS: offset={offset}, limit={page_size}");

        let response = client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body: serde_json::Value = serde_json::from_str(&response.text().await?)?;
        let features = parse_page(&body)?;
        let count = features.len() as u64;
        all_features.extend(features);

        if count == 0 || !exceeded_transfer_limit(&body) {
            break;
        }
        offset += count;
    }

    log::info!("ArcGIS: fetched {} features from {query_url}", all_features.len());

    Ok(all_features)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn page_url_includes_envelope() {
        let bbox = BoundingBox::new(-74.3, 40.8, -74.1, 41.0);
        let url = page_url("https://example.com/FeatureServer/5/query", Some(&bbox), 2000, 4000)
            .unwrap();
        let pairs: std::collections::BTreeMap<String, String> =
            url.query_pairs().into_owned().collect();
        assert_eq!(pairs["f"], "geojson");
        assert_eq!(pairs["geometry"], "-74.3,40.8,-74.1,41");
        assert_eq!(pairs["geometryType"], "esriGeometryEnvelope");
        assert_eq!(pairs["inSR"], "4326");
        assert_eq!(pairs["spatialRel"], "esriSpatialRelIntersects");
        assert_eq!(pairs["resultRecordCount"], "2000");
        assert_eq!(pairs["resultOffset"], "4000");
    }

    #[test]
    fn page_url_without_envelope() {
        let url = page_url("https://example.com/MapServer/13/query", None, 1000, 0).unwrap();
        assert!(!url.query_pairs().any(|(k, _)| k == "geometry"));
    }

    #[test]
    fn api_error_surfaces() {
        let body = json!({ "error": { "code": 400, "message": "Invalid query" } });
        match parse_page(&body) {
            Err(SourceError::Api { message }) => assert_eq!(message, "Invalid query"),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn features_parse_and_limit_flag_read() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "GEOID20": "340030001001" },
                    "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] }
                },
                { "type": "NotAFeature" }
            ],
            "properties": { "exceededTransferLimit": true }
        });
        let features = parse_page(&body).unwrap();
        assert_eq!(features.len(), 1);
        assert!(exceeded_transfer_limit(&body));
        assert!(!exceeded_transfer_limit(&json!({ "features": [] })));
    }
}
