use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use hv_market_dash::{server, Dashboard, DashboardConfig};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

async fn app_with_report(report: Option<&str>) -> Router {
    let mut config = DashboardConfig::default();
    config.data.dir = format!("{}/tests/fixtures", env!("CARGO_MANIFEST_DIR"));
    config.data.report = report.map(str::to_string);
    let dashboard = Dashboard::load(config).await.unwrap();
    server::router(Arc::new(dashboard))
}

async fn app() -> Router {
    app_with_report(Some("report.pdf")).await
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get(app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_index_uses_configured_title() {
    let (status, headers, body) = get(app().await, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));

    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("<title>Hudson Valley Acupuncture Market Analysis</title>"));
    assert!(html.contains("5 Counties • 11 Municipalities"));
    assert!(!html.contains("{{TITLE}}"));
    assert!(html.contains("const esc = "));
    assert!(!html.contains("<td>${v}</td>"));
}

#[tokio::test]
async fn test_options() {
    let (status, json) = get_json(app().await, "/api/options").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["counties"].as_array().unwrap().len(), 4);
    assert_eq!(json["tiers"][0]["label"], "Tier 1 - Prime");
    assert_eq!(json["tiers"][0]["level"], 4);
}

#[tokio::test]
async fn test_summary_with_filters() {
    let (status, json) = get_json(app().await, "/api/summary?county=Westchester&type=city").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["filtered"]["municipalities"], 3);
    assert_eq!(json["top_in_selection"][0]["name"], "Yonkers");
    assert_eq!(json["top_pick"]["name"], "Yonkers");
    assert!(json["ignored"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_filter_value_is_reported() {
    let (status, json) = get_json(app().await, "/api/table?county=Nowhere%20County").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rows"].as_array().unwrap().len(), 11);
    assert_eq!(json["ignored"][0]["dimension"], "county");
    assert_eq!(json["ignored"][0]["value"], "Nowhere County");
}

#[tokio::test]
async fn test_map_layers() {
    let (status, json) = get_json(app().await, "/api/map?tier=4&color_by=score").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["showing"], 2);
    assert_eq!(json["color_by"], "score");
    assert_eq!(json["municipalities"]["features"].as_array().unwrap().len(), 2);
    assert_eq!(json["counties"]["features"].as_array().unwrap().len(), 5);
    assert_eq!(json["legend"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_charts_and_top() {
    let (status, json) = get_json(app().await, "/api/charts?county=Albany").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["filtered"]["scatter"].as_array().unwrap().len(), 2);
    assert_eq!(json["overall"]["scatter"].as_array().unwrap().len(), 11);

    let (status, json) = get_json(app().await, "/api/top?n=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 10);
    assert_eq!(json[0]["name"], "Yonkers");
}

#[tokio::test]
async fn test_export_csv_download() {
    let (status, headers, body) = get(app().await, "/api/export?county=Dutchess").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"hudson_valley_acupuncture_analysis.csv\""
    );

    let csv = String::from_utf8(body).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("Poughkeepsie,Dutchess,city,31577"));
}

#[tokio::test]
async fn test_export_rejects_unknown_format() {
    let (status, json) = get_json(app().await, "/api/export?format=xlsx").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_report_inline_and_download() {
    let (status, headers, body) = get(app().await, "/report").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert!(headers[header::CONTENT_DISPOSITION].to_str().unwrap().starts_with("inline"));
    assert!(body.starts_with(b"%PDF-"));

    let (status, headers, _) = get(app().await, "/report/download").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Hudson_Valley_Acupuncture_Market_Analysis.pdf\""
    );
}

#[tokio::test]
async fn test_missing_report_returns_not_found_with_summary_fallback() {
    let app = app_with_report(None).await;

    let (status, json) = get_json(app.clone(), "/report").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);

    let (status, json) = get_json(app, "/api/report/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["top_municipality"], "Yonkers");
    assert_eq!(json["leading_county"], "Westchester");
}

#[tokio::test]
async fn test_unparsable_n_does_not_fail_other_endpoints() {
    let (status, json) = get_json(app().await, "/api/summary?county=Westchester&n=abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["filtered"]["municipalities"], 5);
}

#[tokio::test]
async fn test_top_n_is_parsed_leniently() {
    let (status, json) = get_json(app().await, "/api/top?n=-5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 10);

    let (status, json) = get_json(app().await, "/api/top?n=abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn test_malformed_query_is_json_error() {
    let (status, headers, body) = get(app().await, "/api/summary?county=Westchester&county=Albany").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("application/json"));

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("county"));
}
