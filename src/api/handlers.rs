use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::FilterCriteria;
use crate::service::{assemble, ReportService};

/// Query parameters of the report endpoint: the serialized FilterCriteria
/// plus a format selector.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub format: Option<ReportFormat>,
    pub order_date_start: Option<NaiveDate>,
    pub order_date_end: Option<NaiveDate>,
    pub pickup_date_start: Option<NaiveDate>,
    pub pickup_date_end: Option<NaiveDate>,
    /// Comma-separated pickup dates (YYYY-MM-DD); unparseable entries are
    /// ignored.
    pub pickup_dates: Option<String>,
    /// Comma-separated order-type labels.
    pub order_types: Option<String>,
    /// Comma-separated product names.
    pub products: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
    Document,
    ProductDay,
}

/// Split a comma-separated query value into a trimmed, deduplicated set.
fn split_list(raw: Option<&str>) -> Option<BTreeSet<String>> {
    let set: BTreeSet<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

impl ReportQuery {
    pub fn criteria(&self) -> FilterCriteria {
        let pickup_dates = split_list(self.pickup_dates.as_deref()).and_then(|tokens| {
            let set: BTreeSet<NaiveDate> = tokens
                .iter()
                .filter_map(|t| NaiveDate::parse_from_str(t, "%Y-%m-%d").ok())
                .collect();
            if set.is_empty() {
                None
            } else {
                Some(set)
            }
        });

        FilterCriteria {
            order_date_start: self.order_date_start,
            order_date_end: self.order_date_end,
            pickup_date_start: self.pickup_date_start,
            pickup_date_end: self.pickup_date_end,
            pickup_dates,
            order_types: split_list(self.order_types.as_deref()),
            products: split_list(self.products.as_deref()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

fn error_response(err: impl std::fmt::Display) -> Response {
    let body = ErrorResponse {
        success: false,
        message: format!("Error: {err}"),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Health check, independent of the pipeline and the row source.
pub async fn health_check() -> &'static str {
    "OK"
}

/// One endpoint, four artifacts: structured JSON (default), CSV export,
/// paginated document, product-by-day document. Filter criteria come from
/// the query string.
pub async fn report(
    State(service): State<Arc<ReportService>>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let criteria = query.criteria();
    // The row source does blocking filesystem reads; keep them off the
    // async workers.
    let run = match tokio::task::spawn_blocking(move || service.run(&criteria)).await {
        Ok(Ok(run)) => run,
        Ok(Err(e)) => return error_response(e),
        Err(e) => return error_response(e),
    };

    match query.format.unwrap_or_default() {
        ReportFormat::Json => Json(assemble::structured(&run)).into_response(),
        ReportFormat::Csv => match assemble::to_csv(&run) {
            Ok(bytes) => (
                [
                    (header::CONTENT_TYPE, "text/csv"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"sales_report.csv\"",
                    ),
                ],
                bytes,
            )
                .into_response(),
            Err(e) => error_response(e),
        },
        ReportFormat::Document => (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"sales_report.txt\"",
                ),
            ],
            assemble::to_document(&run),
        )
            .into_response(),
        ReportFormat::ProductDay => (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"product_by_day.txt\"",
                ),
            ],
            assemble::to_product_day_document(&run),
        )
            .into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub success: bool,
    pub products: Vec<String>,
}

/// Distinct product names, sorted, for dashboard filter controls.
pub async fn products(State(service): State<Arc<ReportService>>) -> Response {
    match tokio::task::spawn_blocking(move || service.product_names()).await {
        Ok(Ok(products)) => Json(ProductsResponse {
            success: true,
            products,
        })
        .into_response(),
        Ok(Err(e)) => error_response(e),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Serialize)]
pub struct PickupDatesResponse {
    pub success: bool,
    pub pickup_dates: Vec<NaiveDate>,
}

/// Distinct pickup dates, newest first, for the pickup-day picker.
pub async fn pickup_dates(State(service): State<Arc<ReportService>>) -> Response {
    match tokio::task::spawn_blocking(move || service.pickup_dates()).await {
        Ok(Ok(pickup_dates)) => Json(PickupDatesResponse {
            success: true,
            pickup_dates,
        })
        .into_response(),
        Ok(Err(e)) => error_response(e),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Serialize)]
pub struct DateRangeResponse {
    pub success: bool,
    pub order_date_min: Option<NaiveDate>,
    pub order_date_max: Option<NaiveDate>,
}

/// Min/max order date across the source data.
pub async fn date_range(State(service): State<Arc<ReportService>>) -> Response {
    match tokio::task::spawn_blocking(move || service.order_date_range()).await {
        Ok(Ok(range)) => Json(DateRangeResponse {
            success: true,
            order_date_min: range.map(|(min, _)| min),
            order_date_max: range.map(|(_, max)| max),
        })
        .into_response(),
        Ok(Err(e)) => error_response(e),
        Err(e) => error_response(e),
    }
}
