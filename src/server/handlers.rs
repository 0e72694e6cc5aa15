//! HTTP handlers. Each request carries its whole filter selection and runs
//! one filter+render cycle against the shared, read-only dashboard.

use axum::{
    extract::{FromRequestParts, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::core::charts::RankedEntry;
use crate::core::dashboard::{ChartsView, Dashboard, FilteredMap, FilteredTable, SummaryView};
use crate::core::filter::{FilterOptions, FilterRequest};
use crate::core::map::ColorBy;
use crate::core::report::ExecutiveSummary;
use crate::core::table::ExportFormat;
use crate::server::error::ApiError;
use crate::utils::format::escape_html;

const INDEX_TEMPLATE: &str = include_str!("../../assets/index.html");

/// `Query` whose rejection is rendered as a JSON [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Query parameters shared by the dashboard endpoints. Multi-valued
/// parameters are comma-separated. Every field is kept as text so a bad
/// value for one endpoint never fails the request on another.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub county: Option<String>,
    pub tier: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub color_by: Option<String>,
    pub n: Option<String>,
    pub format: Option<String>,
}

impl DashboardQuery {
    pub fn filter_request(&self) -> FilterRequest {
        FilterRequest::from_delimited(self.county.as_deref(), self.tier.as_deref(), self.kind.as_deref())
    }

    fn color_by(&self) -> ColorBy {
        match self.color_by.as_deref() {
            None => ColorBy::default(),
            Some(raw) => ColorBy::parse(raw).unwrap_or_else(|| {
                tracing::warn!("Ignoring unknown color_by '{}'", raw);
                ColorBy::default()
            }),
        }
    }

    /// Negative counts clamp to the minimum later; unparsable ones fall back to the default.
    fn top_n(&self) -> Option<usize> {
        let raw = self.n.as_deref()?;
        match raw.trim().parse::<i64>() {
            Ok(n) => Some(usize::try_from(n.max(0)).unwrap_or(usize::MAX)),
            Err(_) => {
                tracing::warn!("Ignoring unparsable n '{}'", raw);
                None
            }
        }
    }
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

pub async fn index(State(dashboard): State<Arc<Dashboard>>) -> Html<String> {
    let info = &dashboard.config().dashboard;
    let caption = format!(
        "{} • {} Counties • {} Municipalities",
        info.caption,
        dashboard.dataset().counties.len(),
        dashboard.dataset().municipalities.len()
    );
    Html(
        INDEX_TEMPLATE
            .replace("{{TITLE}}", &escape_html(&info.title))
            .replace("{{CAPTION}}", &escape_html(&caption)),
    )
}

pub async fn options(State(dashboard): State<Arc<Dashboard>>) -> Json<FilterOptions> {
    Json(dashboard.options())
}

pub async fn summary(State(dashboard): State<Arc<Dashboard>>, ApiQuery(query): ApiQuery<DashboardQuery>) -> Json<SummaryView> {
    Json(dashboard.summary(&query.filter_request()))
}

pub async fn map(State(dashboard): State<Arc<Dashboard>>, ApiQuery(query): ApiQuery<DashboardQuery>) -> Json<FilteredMap> {
    Json(dashboard.map(&query.filter_request(), query.color_by()))
}

pub async fn charts(State(dashboard): State<Arc<Dashboard>>, ApiQuery(query): ApiQuery<DashboardQuery>) -> Json<ChartsView> {
    Json(dashboard.charts(&query.filter_request()))
}

pub async fn top(State(dashboard): State<Arc<Dashboard>>, ApiQuery(query): ApiQuery<DashboardQuery>) -> Json<Vec<RankedEntry>> {
    Json(dashboard.top_opportunities(query.top_n()))
}

pub async fn table(State(dashboard): State<Arc<Dashboard>>, ApiQuery(query): ApiQuery<DashboardQuery>) -> Json<FilteredTable> {
    Json(dashboard.table(&query.filter_request()))
}

/// Filtered records as a CSV (default) or TSV download
pub async fn export(
    State(dashboard): State<Arc<Dashboard>>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        None => ExportFormat::default(),
        Some(raw) => ExportFormat::parse(raw)
            .ok_or_else(|| ApiError::InvalidRequest(format!("Unsupported export format: {}", raw)))?,
    };

    let (file_name, body) = dashboard.export(&query.filter_request(), format)?;

    Ok((
        [
            (header::CONTENT_TYPE, format!("{}; charset=utf-8", format.mime())),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        body,
    )
        .into_response())
}

fn pdf_response(dashboard: &Dashboard, disposition: &str) -> Result<Response, ApiError> {
    let report = dashboard.report().ok_or(ApiError::ReportUnavailable)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("{}; filename=\"{}\"", disposition, report.download_name),
            ),
        ],
        report.bytes().to_vec(),
    )
        .into_response())
}

/// PDF report for the embedded viewer
pub async fn report_inline(State(dashboard): State<Arc<Dashboard>>) -> Result<Response, ApiError> {
    pdf_response(&dashboard, "inline")
}

pub async fn report_download(State(dashboard): State<Arc<Dashboard>>) -> Result<Response, ApiError> {
    pdf_response(&dashboard, "attachment")
}

pub async fn report_summary(State(dashboard): State<Arc<Dashboard>>) -> Json<ExecutiveSummary> {
    Json(dashboard.executive_summary())
}
