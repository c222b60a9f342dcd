//! Learner-metrics endpoint, exercised through the axum handlers.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashSet;

use axum::{
    body::to_bytes,
    extract::{FromRequestParts, Host, Path, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use url::form_urlencoded;

use figures_core::access::SiteResolver;
use figures_core::memory::MemoryStore;
use figures_core::repo::MetricsRepository;
use figures_core::model::LearnerMetricRecord;
use figures_core::pagination::Page;
use figures_gateway::api::learner_metrics::{list, retrieve};
use figures_gateway::api::ApiError;
use figures_gateway::app_state::AppState;
use figures_gateway::{config, router, store};

const COURSE_A: &str = "course-v1:StarFleetAcademy+SFA01+2161";
const COURSE_B: &str = "course-v1:StarFleetAcademy+SFA02+2161";
const COURSE_X: &str = "course-v1:Romulan+ROM01+2161";
const BASE_PATH: &str = "/api/learner-metrics/";

fn fixture_path() -> String {
    format!(
        "{}/../figures-core/tests/fixtures/lm_test_data.yaml",
        env!("CARGO_MANIFEST_DIR")
    )
}

fn app(cfg_yaml: &str) -> AppState {
    let cfg = config::load_from_str(cfg_yaml).unwrap();
    let dataset = store::load_dataset_from_file(&fixture_path()).unwrap();
    let store = MemoryStore::new(dataset, cfg.tenancy.multisite).unwrap();
    AppState::new(cfg, store).unwrap()
}

fn multisite_app() -> AppState {
    app("version: 1\npagination: { default_limit: 20, max_limit: 100 }\ndataset: { path: unused.yaml }\n")
}

fn headers(token: Option<&str>) -> HeaderMap {
    let mut h = HeaderMap::new();
    if let Some(t) = token {
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(&format!("Token {t}")).unwrap());
    }
    h
}

fn uri_with_courses(courses: &[&str], extra: &[(&str, &str)]) -> Uri {
    let mut q = form_urlencoded::Serializer::new(String::new());
    for c in courses {
        q.append_pair("course", c);
    }
    for (k, v) in extra {
        q.append_pair(k, v);
    }
    let q = q.finish();
    if q.is_empty() {
        BASE_PATH.parse().unwrap()
    } else {
        format!("{BASE_PATH}?{q}").parse().unwrap()
    }
}

async fn list_as(
    app: &AppState,
    host: &str,
    token: Option<&str>,
    uri: Uri,
) -> Result<Json<Page<LearnerMetricRecord>>, ApiError> {
    list(State(app.clone()), Some(Host(host.to_string())), headers(token), uri).await
}

async fn list_page(app: &AppState, host: &str, token: &str, uri: Uri) -> Page<LearnerMetricRecord> {
    list_as(app, host, Some(token), uri).await.unwrap().0
}

async fn list_ids(app: &AppState, courses: &[&str]) -> HashSet<u64> {
    let page = list_page(app, "us.example.com", "us-admin-token", uri_with_courses(courses, &[])).await;
    page.results.iter().map(|r| r.id).collect()
}

async fn list_status(app: &AppState, host: &str, token: Option<&str>, uri: Uri) -> StatusCode {
    match list_as(app, host, token, uri).await {
        Ok(resp) => resp.into_response().status(),
        Err(e) => e.into_response().status(),
    }
}

async fn json_body(resp: Response) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn list_all_returns_site_users() {
    let app = multisite_app();
    let page = list_page(&app, "us.example.com", "us-admin-token", uri_with_courses(&[], &[])).await;

    let v = serde_json::to_value(&page).unwrap();
    for key in ["count", "next", "previous", "results"] {
        assert!(v.get(key).is_some(), "missing {key}");
    }
    assert_eq!(page.count, 9);

    let ids: HashSet<u64> = page.results.iter().map(|r| r.id).collect();
    let expected: HashSet<u64> = app
        .repo()
        .users_of_site(&app.sites().resolve_site("us.example.com").unwrap())
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(ids, expected);

    let top: HashSet<&str> = v["results"][0].as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        top,
        HashSet::from(["id", "username", "email", "fullname", "is_active", "date_joined", "enrollments"])
    );
}

#[tokio::test]
async fn course_param_single() {
    let app = multisite_app();
    assert_eq!(list_ids(&app, &[COURSE_A]).await, HashSet::from([101, 102, 105, 202]));
}

#[tokio::test]
async fn course_param_multiple() {
    let app = multisite_app();
    assert_eq!(
        list_ids(&app, &[COURSE_A, COURSE_B]).await,
        HashSet::from([101, 102, 103, 105, 202])
    );
}

#[tokio::test]
async fn valid_and_course_param_from_other_site_invalid() {
    let app = multisite_app();
    let status = list_status(
        &app,
        "us.example.com",
        Some("us-admin-token"),
        uri_with_courses(&[COURSE_A, COURSE_X], &[]),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.metrics().rejections.get(&[("reason", "invalid_filter")]),
        1
    );
}

#[tokio::test]
async fn valid_and_mangled_course_param_invalid() {
    let app = multisite_app();
    let status = list_status(
        &app,
        "us.example.com",
        Some("us-admin-token"),
        uri_with_courses(&[COURSE_A, "she-sell-seashells-by-the-seashore"], &[]),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn raw_plus_in_query_still_matches() {
    // an unencoded '+' arrives as a space
    let app = multisite_app();
    let uri: Uri = format!("{BASE_PATH}?course={COURSE_A}").parse().unwrap();
    let page = list_page(&app, "us.example.com", "us-admin-token", uri).await;
    assert_eq!(page.count, 4);
}

#[tokio::test]
async fn auth_and_tenancy_failures() {
    let app = multisite_app();
    let uri = || uri_with_courses(&[], &[]);

    assert_eq!(list_status(&app, "us.example.com", None, uri()).await, StatusCode::UNAUTHORIZED);
    assert_eq!(
        list_status(&app, "us.example.com", Some("nope"), uri()).await,
        StatusCode::UNAUTHORIZED
    );
    // inactive admin
    assert_eq!(
        list_status(&app, "us.example.com", Some("gone-admin-token"), uri()).await,
        StatusCode::UNAUTHORIZED
    );
    // admin of the other site
    assert_eq!(
        list_status(&app, "us.example.com", Some("them-admin-token"), uri()).await,
        StatusCode::FORBIDDEN
    );
    // staff learner is not an org admin
    assert_eq!(
        list_status(&app, "us.example.com", Some("staff-learner-token"), uri()).await,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        list_status(&app, "nowhere.example.com", Some("us-admin-token"), uri()).await,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        list_status(&app, "them.example.com:8443", Some("root-token"), uri()).await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn pagination_links_keep_filters() {
    let app = multisite_app();
    let page = list_page(
        &app,
        "us.example.com",
        "us-admin-token",
        uri_with_courses(&[COURSE_A, COURSE_B], &[("limit", "2")]),
    )
    .await;

    assert_eq!(page.count, 5);
    assert_eq!(page.results.len(), 2);
    assert!(page.previous.is_none());

    let next = url::Url::parse(page.next.as_deref().unwrap()).unwrap();
    assert_eq!(next.host_str(), Some("us.example.com"));
    assert_eq!(next.path(), BASE_PATH);
    let pairs: Vec<(String, String)> = next.query_pairs().into_owned().collect();
    let courses: Vec<&str> = pairs
        .iter()
        .filter(|(k, _)| k == "course")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(courses, vec![COURSE_A, COURSE_B]);
    assert!(pairs.contains(&("offset".to_string(), "2".to_string())));
}

#[tokio::test]
async fn offset_past_end_is_still_paginated() {
    let app = multisite_app();
    let page = list_page(
        &app,
        "us.example.com",
        "us-admin-token",
        uri_with_courses(&[], &[("offset", "500")]),
    )
    .await;
    assert_eq!(page.count, 9);
    assert!(page.results.is_empty());
    assert!(page.next.is_none());
    assert!(page.previous.is_some());
}

#[tokio::test]
async fn retrieve_single_learner() {
    let app = multisite_app();
    let host = || Some(Host("us.example.com".to_string()));
    let rec = retrieve(
        State(app.clone()),
        host(),
        headers(Some("us-admin-token")),
        Path("101".to_string()),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(rec.username, "chasecynthia");

    let err: ApiError = retrieve(
        State(app),
        host(),
        headers(Some("us-admin-token")),
        Path("201".to_string()),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_learner_id_is_a_json_not_found() {
    let app = multisite_app();
    let err = retrieve(
        State(app.clone()),
        Some(Host("us.example.com".to_string())),
        headers(Some("us-admin-token")),
        Path("chasecynthia".to_string()),
    )
    .await
    .unwrap_err();

    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(body["detail"].as_str().unwrap().contains("chasecynthia"));
    assert_eq!(
        app.metrics().requests.get(&[("route", "learner_metrics_detail"), ("status", "404")]),
        1
    );
}

#[tokio::test]
async fn enrollee_from_other_org_is_listed_on_course_site() {
    let app = multisite_app();
    let host = || Some(Host("us.example.com".to_string()));
    // 202 is a `them` member enrolled in a `us` course
    let rec = retrieve(State(app.clone()), host(), headers(Some("us-admin-token")), Path("202".to_string()))
        .await
        .unwrap()
        .0;
    assert_eq!(rec.enrollments.len(), 1);
    assert_eq!(rec.enrollments[0].course_id.to_string(), COURSE_A);

    assert!(list_ids(&app, &[]).await.contains(&202));
    assert!(!list_ids(&app, &[COURSE_B]).await.contains(&202));
}

#[tokio::test]
async fn host_falls_back_to_uri_authority() {
    // HTTP/2 carries the authority in the request URI, not in a Host header
    let app = multisite_app();
    let req = Request::builder()
        .uri("http://us.example.com/api/learner-metrics/?limit=1")
        .header(header::AUTHORIZATION, "Token us-admin-token")
        .body(())
        .unwrap();
    let (mut parts, ()) = req.into_parts();
    assert!(parts.headers.get(header::HOST).is_none());

    let host = Host::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(host.0, "us.example.com");

    let page = list(State(app), Some(host), parts.headers, parts.uri)
        .await
        .unwrap()
        .0;
    assert_eq!(page.count, 9);
    assert_eq!(page.results.len(), 1);
}

#[tokio::test]
async fn missing_host_is_a_json_bad_request() {
    let app = multisite_app();
    let err = list(State(app), None, headers(Some("us-admin-token")), uri_with_courses(&[], &[]))
        .await
        .unwrap_err();
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn single_site_mode_uses_default_site_and_staff_rule() {
    let app = app(
        "version: 1\ntenancy: { multisite: false, default_domain: us.example.com }\ndataset: { path: unused.yaml }\n",
    );
    // any host maps to the default site; staff is enough
    let status = list_status(&app, "localhost:8080", Some("staff-learner-token"), uri_with_courses(&[], &[])).await;
    assert_eq!(status, StatusCode::OK);

    let status = list_status(&app, "localhost", Some("learner-token"), uri_with_courses(&[], &[])).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // every course is on the single site
    let page = list_page(&app, "localhost", "root-token", uri_with_courses(&[COURSE_X], &[])).await;
    let ids: HashSet<u64> = page.results.iter().map(|r| r.id).collect();
    assert_eq!(ids, HashSet::from([105, 201]));

    // links name the configured site, not the host the client sent
    let page = list_page(
        &app,
        "attacker.invalid:8080",
        "root-token",
        uri_with_courses(&[], &[("limit", "2")]),
    )
    .await;
    let next = url::Url::parse(page.next.as_deref().unwrap()).unwrap();
    assert_eq!(next.host_str(), Some("us.example.com"));
    assert_eq!(next.port(), None);
}

#[test]
fn router_builds() {
    let _ = router::build_router(multisite_app());
}

#[test]
fn unknown_default_domain_fails_startup() {
    let cfg = config::load_from_str(
        "version: 1\ntenancy: { multisite: false, default_domain: missing.example.com }\ndataset: { path: unused.yaml }\n",
    )
    .unwrap();
    let dataset = store::load_dataset_from_file(&fixture_path()).unwrap();
    let store = MemoryStore::new(dataset, false).unwrap();
    assert!(AppState::new(cfg, store).is_err());
}
