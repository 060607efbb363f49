//! HTTP handler functions for the NJ Safe Drinking Water API.

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use nj_sdwa_dashboard::{Page, PageError};
use nj_sdwa_models::{Region, RegionRequest};
use nj_sdwa_server_models::{ApiError, ApiHealth, ApiRegion, PageQueryParams, ParamError};

use crate::AppState;

/// Pages that take a region, in the order they appear in the dashboard.
const REGION_PAGES: &[&str] = &["systems", "violations", "ej", "lead", "watershed"];

fn bad_request(e: &ParamError) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::new(e.to_string()))
}

fn error_response(e: &PageError) -> HttpResponse {
    let body = ApiError::new(e.to_string());
    match e {
        PageError::NoData { .. } => HttpResponse::NotFound().json(body),
        e if e.is_user_error() => HttpResponse::BadRequest().json(body),
        PageError::Fetch(_) => {
            log::error!("Upstream fetch failed: {e}");
            HttpResponse::BadGateway().json(body)
        }
        _ => {
            log::error!("Failed to build page: {e}");
            HttpResponse::InternalServerError().json(body)
        }
    }
}

/// Resolves the region in `params`, or the response to send instead.
fn region(state: &AppState, params: &PageQueryParams) -> Result<Region, HttpResponse> {
    let request = params
        .region_request()
        .map_err(|e| bad_request(&e))?
        .ok_or_else(|| error_response(&PageError::RegionRequired))?;
    state
        .dashboard
        .resolve_region(&request)
        .map_err(|e| error_response(&e))
}

fn page_json<P: Page>(result: Result<P, PageError>) -> HttpResponse {
    match result {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(e) => error_response(&e),
    }
}

fn page_csv<P: Page>(result: Result<P, PageError>) -> HttpResponse {
    match result {
        Ok(page) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", P::CSV_FILENAME),
            ))
            .body(page.csv().to_owned()),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/measures`
///
/// Every `EJScreen` measure with its label, for the two pickers.
pub async fn measures(state: web::Data<AppState>) -> HttpResponse {
    match state.dashboard.ej_measures().await {
        Ok(options) => HttpResponse::Ok().json(options),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/region`
///
/// Validates a region without building a page.
pub async fn region_check(
    state: web::Data<AppState>,
    request: web::Json<RegionRequest>,
) -> HttpResponse {
    match state.dashboard.resolve_region(&request) {
        Ok(region) => HttpResponse::Ok().json(ApiRegion::from(&region)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/overview`
pub async fn overview(state: web::Data<AppState>) -> HttpResponse {
    page_json(state.dashboard.statewide_overview().await)
}

/// `GET /api/systems`
pub async fn systems(
    state: web::Data<AppState>,
    params: web::Query<PageQueryParams>,
) -> HttpResponse {
    match region(&state, &params) {
        Ok(region) => page_json(state.dashboard.find_systems(&region).await),
        Err(response) => response,
    }
}

/// `GET /api/violations`
pub async fn violations(
    state: web::Data<AppState>,
    params: web::Query<PageQueryParams>,
) -> HttpResponse {
    match region(&state, &params) {
        Ok(region) => page_json(state.dashboard.violations(&region).await),
        Err(response) => response,
    }
}

/// `GET /api/ej`
///
/// Takes `socio` and `env` column names; each defaults to the first
/// measure of its kind.
pub async fn environmental_justice(
    state: web::Data<AppState>,
    params: web::Query<PageQueryParams>,
) -> HttpResponse {
    let region = match region(&state, &params) {
        Ok(region) => region,
        Err(response) => return response,
    };
    let (socio, env) = match (params.socio_measure(), params.env_measure()) {
        (Ok(socio), Ok(env)) => (socio, env),
        (Err(e), _) | (_, Err(e)) => return bad_request(&e),
    };
    page_json(
        state
            .dashboard
            .environmental_justice(&region, socio, env)
            .await,
    )
}

/// `GET /api/lead`
pub async fn lead(state: web::Data<AppState>, params: web::Query<PageQueryParams>) -> HttpResponse {
    match region(&state, &params) {
        Ok(region) => page_json(state.dashboard.lead_service_lines(&region).await),
        Err(response) => response,
    }
}

/// `GET /api/watershed`
pub async fn watershed(
    state: web::Data<AppState>,
    params: web::Query<PageQueryParams>,
) -> HttpResponse {
    match region(&state, &params) {
        Ok(region) => page_json(
            state
                .dashboard
                .watershed_pollution(&region, params.pollutant.as_deref())
                .await,
        ),
        Err(response) => response,
    }
}

/// `GET /api/{page}/csv`
///
/// The page's table as a CSV download.
pub async fn csv(
    state: web::Data<AppState>,
    page: web::Path<String>,
    params: web::Query<PageQueryParams>,
) -> HttpResponse {
    let page = page.into_inner();
    if page == "overview" {
        return page_csv(state.dashboard.statewide_overview().await);
    }
    if !REGION_PAGES.contains(&page.as_str()) {
        return HttpResponse::NotFound().json(ApiError::new(format!("Unknown page '{page}'")));
    }

    let region = match region(&state, &params) {
        Ok(region) => region,
        Err(response) => return response,
    };
    let dashboard = &state.dashboard;

    match page.as_str() {
        "systems" => page_csv(dashboard.find_systems(&region).await),
        "violations" => page_csv(dashboard.violations(&region).await),
        "ej" => match (params.socio_measure(), params.env_measure()) {
            (Ok(socio), Ok(env)) => {
                page_csv(dashboard.environmental_justice(&region, socio, env).await)
            }
            (Err(e), _) | (_, Err(e)) => bad_request(&e),
        },
        "lead" => page_csv(dashboard.lead_service_lines(&region).await),
        _ => page_csv(
            dashboard
                .watershed_pollution(&region, params.pollutant.as_deref())
                .await,
        ),
    }
}
