//! Learner-metrics viewset.
//!
//! - `GET /api/learner-metrics/`      : paginated list, repeated `course` filters
//! - `GET /api/learner-metrics/{id}/` : single learner on the site
//!
//! Per request: authenticate (token) -> resolve site (Host) -> resolver
//! (authorize, validate filters, project) -> paginate.

use std::time::Instant;

use axum::{
    extract::{Host, Path, State},
    http::{HeaderMap, Uri},
    Json,
};
use url::{form_urlencoded, Url};

use figures_core::error::{FiguresError, Result};
use figures_core::model::{LearnerMetricRecord, Site, UserId};
use figures_core::pagination::{paginate, Page, PageParams};

use crate::api::{auth, ApiError};
use crate::app_state::AppState;
use crate::context::RequestContext;
use crate::obs::ApiMetrics;

pub const COURSE_PARAM: &str = "course";

const ROUTE_LIST: &str = "learner_metrics_list";
const ROUTE_DETAIL: &str = "learner_metrics_detail";

fn request_host(host: Option<&str>) -> Result<&str> {
    host.map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| FiguresError::BadRequest("missing Host header".into()))
}

/// Authenticate the caller and resolve the site addressed by `host`.
///
/// `host` is whatever axum's `Host` extractor found: `Forwarded`,
/// `X-Forwarded-Host`, `Host`, or the request URI authority (HTTP/2).
pub fn request_context(app: &AppState, host: Option<&str>, headers: &HeaderMap) -> Result<RequestContext> {
    let caller = auth::authenticate(app.repo(), headers)?;
    let site = app.sites().resolve_site(request_host(host)?)?;
    Ok(RequestContext { site, caller })
}

/// Decoded query pairs, repeated keys preserved in order.
pub fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

pub fn course_filters(pairs: &[(String, String)]) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, _)| k == COURSE_PARAM)
        .map(|(_, v)| v.clone())
        .collect()
}

/// Absolute URL of this request on `site` (without query), for pagination
/// links. The authority is the site's domain, never the client-sent host.
fn site_url(site: &Site, headers: &HeaderMap, uri: &Uri) -> Result<Url> {
    let scheme = match headers.get("x-forwarded-proto").and_then(|v| v.to_str().ok()) {
        Some(p) if p.trim().eq_ignore_ascii_case("https") => "https",
        _ => "http",
    };
    Url::parse(&format!("{scheme}://{}{}", site.domain, uri.path()))
        .map_err(|e| FiguresError::Internal(format!("bad link base for site {}: {e}", site.domain)))
}

/// Numeric learner id from the `{id}` path segment.
pub fn parse_user_id(raw: &str) -> Result<UserId> {
    raw.trim()
        .parse::<UserId>()
        .map_err(|_| FiguresError::NotFound(format!("no learner with id {raw:?}")))
}

pub fn list_learner_metrics(
    app: &AppState,
    host: Option<&str>,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<Page<LearnerMetricRecord>> {
    let ctx = request_context(app, host, headers)?;
    let pairs = query_pairs(uri);
    let filters = course_filters(&pairs);

    let records = app.resolver().resolve(&ctx.site, &ctx.caller, &filters)?;

    let pg = &app.cfg().pagination;
    let params = PageParams::from_query(&pairs, pg.default_limit, pg.max_limit);
    let page = paginate(records, params, &site_url(&ctx.site, headers, uri)?, &pairs);

    tracing::info!(
        site = %ctx.site_domain(),
        caller = ctx.caller_id(),
        filters = filters.len(),
        count = page.count,
        returned = page.results.len(),
        "learner metrics listed"
    );
    Ok(page)
}

pub fn retrieve_learner_metrics(
    app: &AppState,
    host: Option<&str>,
    headers: &HeaderMap,
    user_id: UserId,
) -> Result<LearnerMetricRecord> {
    let ctx = request_context(app, host, headers)?;
    let record = app.resolver().resolve_one(&ctx.site, &ctx.caller, user_id)?;
    tracing::info!(site = %ctx.site_domain(), caller = ctx.caller_id(), user_id, "learner metrics retrieved");
    Ok(record)
}

fn rejection_reason(err: &FiguresError) -> &'static str {
    match err {
        FiguresError::InvalidFilter { .. } => "invalid_filter",
        FiguresError::Forbidden(_) => "forbidden",
        FiguresError::AuthRequired | FiguresError::AuthFailed => "auth",
        FiguresError::NotFound(_) => "not_found",
        FiguresError::BadRequest(_) | FiguresError::UnsupportedVersion => "bad_request",
        FiguresError::Internal(_) => "internal",
    }
}

/// Times the call, tracks in-flight count and records the outcome.
fn observed<T>(metrics: &ApiMetrics, route: &'static str, f: impl FnOnce() -> Result<T>) -> std::result::Result<T, ApiError> {
    let labels = [("route", route)];
    metrics.in_flight.inc(&labels);
    let started = Instant::now();
    let result = f();
    metrics.resolve_duration.observe(&labels, started.elapsed());
    metrics.in_flight.dec(&labels);

    match result {
        Ok(v) => {
            metrics.requests.inc(&[("route", route), ("status", "200")]);
            Ok(v)
        }
        Err(e) => {
            let err = ApiError::from(e);
            let status = err.status();
            metrics.requests.inc(&[("route", route), ("status", status.as_str())]);
            metrics.rejections.inc(&[("reason", rejection_reason(&err.0))]);
            if status.is_server_error() {
                tracing::error!(route, error = %err.0, "request failed");
            } else {
                tracing::warn!(route, code = err.0.client_code().as_str(), error = %err.0, "request rejected");
            }
            Err(err)
        }
    }
}

pub async fn list(
    State(app): State<AppState>,
    host: Option<Host>,
    headers: HeaderMap,
    uri: Uri,
) -> std::result::Result<Json<Page<LearnerMetricRecord>>, ApiError> {
    let metrics = app.metrics();
    let host = host.map(|Host(h)| h);
    observed(&metrics, ROUTE_LIST, || {
        list_learner_metrics(&app, host.as_deref(), &headers, &uri)
    })
    .map(Json)
}

/// `{id}` is taken as text so a non-numeric id still gets the JSON error body.
pub async fn retrieve(
    State(app): State<AppState>,
    host: Option<Host>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> std::result::Result<Json<LearnerMetricRecord>, ApiError> {
    let metrics = app.metrics();
    let host = host.map(|Host(h)| h);
    observed(&metrics, ROUTE_DETAIL, || {
        let user_id = parse_user_id(&raw_id)?;
        retrieve_learner_metrics(&app, host.as_deref(), &headers, user_id)
    })
    .map(Json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn host_must_be_present() {
        assert!(request_host(None).is_err());
        assert!(request_host(Some("  ")).is_err());
        assert_eq!(request_host(Some(" us.example.com ")).unwrap(), "us.example.com");
    }

    #[test]
    fn user_id_must_be_numeric() {
        assert_eq!(parse_user_id("101").unwrap(), 101);
        let err = parse_user_id("chasecynthia").unwrap_err();
        assert_eq!(err.client_code().as_str(), "NOT_FOUND");
        assert!(parse_user_id("-1").is_err());
    }

    #[test]
    fn links_use_site_domain_and_forwarded_scheme() {
        let site = Site { id: 1, domain: "us.example.com".into(), name: "us".into() };
        let uri: Uri = "http://localhost:8080/api/learner-metrics/?limit=2".parse().unwrap();
        let url = site_url(&site, &HeaderMap::new(), &uri).unwrap();
        assert_eq!(url.as_str(), "http://us.example.com/api/learner-metrics/");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-proto", "HTTPS".parse().unwrap());
        let url = site_url(&site, &headers, &uri).unwrap();
        assert_eq!(url.scheme(), "https");
    }
}
