//! Report endpoints: follow-up status and appointment (RDV) lists.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{split_csv, ApiContext};
use crate::dates::ReportWindow;
use crate::followup::{
    fetch_client_statuses, ActivityFilter, StatusQuery, StatusResult, StatusSummary,
};
use crate::models::ClinicalDomain;
use crate::rdv::{fetch_rdv_report, RdvQuery, RdvRow};

/// Raw query string of the report endpoints. Lists are comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    pub clinic_ids: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub activities: Option<String>,
}

impl ReportParams {
    fn window(&self) -> Result<ReportWindow, ApiError> {
        let start = self
            .start
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("Missing 'start' date".into()))?;
        let end = self
            .end
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("Missing 'end' date".into()))?;
        Ok(ReportWindow::parse(start, end)?)
    }
}

#[derive(Debug, Serialize)]
pub struct StatusReportResponse {
    pub warning: Option<String>,
    pub summary: StatusSummary,
    pub results: Vec<StatusResult>,
}

#[derive(Debug, Serialize)]
pub struct RdvReportResponse {
    pub domain: ClinicalDomain,
    pub warning: Option<String>,
    pub rows: Vec<RdvRow>,
}

/// `GET /api/reports/status`: one follow-up status per client.
pub async fn status(
    State(ctx): State<ApiContext>,
    Query(params): Query<ReportParams>,
) -> Result<Json<StatusReportResponse>, ApiError> {
    let window = params.window()?;
    let query = StatusQuery {
        clinic_ids: split_csv(params.clinic_ids.as_deref()),
        activity: ActivityFilter::from_tags(Some(split_csv(params.activities.as_deref()))),
        window,
    };

    let conn = ctx.open_db()?;
    let report = fetch_client_statuses(&conn, &query, &ctx.classifier)?;
    let results: Vec<StatusResult> = report.results.collect();
    let summary = StatusSummary::from_results(&results);

    tracing::info!(
        start = %window.start,
        end = %window.end,
        clients = summary.total,
        "Status report served"
    );

    Ok(Json(StatusReportResponse {
        warning: report.warning,
        summary,
        results,
    }))
}

/// `GET /api/reports/rdv/:domain`: appointments of one clinical domain
/// falling inside the window.
pub async fn rdv(
    State(ctx): State<ApiContext>,
    Path(domain): Path<String>,
    Query(params): Query<ReportParams>,
) -> Result<Json<RdvReportResponse>, ApiError> {
    let domain: ClinicalDomain = domain
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown clinical domain '{domain}'")))?;
    let query = RdvQuery {
        clinic_ids: split_csv(params.clinic_ids.as_deref()),
        window: params.window()?,
    };

    let conn = ctx.open_db()?;
    let report = fetch_rdv_report(&conn, domain, &query)?;

    tracing::info!(domain = domain.as_str(), rows = report.rows.len(), "RDV report served");

    Ok(Json(RdvReportResponse {
        domain,
        warning: report.warning,
        rows: report.rows,
    }))
}
