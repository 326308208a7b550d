use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ListingId, ListingType, LotteryId};
use super::eligibility::ListingScope;
use super::repository::{ApplicationSource, AuditSink, ListingSource, LotteryStore};
use super::service::{LotteryRunError, LotteryService};

/// Router builder exposing HTTP endpoints for the drawing write path and
/// the results read path.
pub fn lottery_router<L, A, S, D>(service: Arc<LotteryService<L, A, S, D>>) -> Router
where
    L: ListingSource + 'static,
    A: ApplicationSource + 'static,
    S: LotteryStore + 'static,
    D: AuditSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/listings/open",
            get(open_listings_handler::<L, A, S, D>),
        )
        .route(
            "/api/v1/listings/:listing_id/lottery",
            post(run_lottery_handler::<L, A, S, D>),
        )
        .route(
            "/api/v1/lotteries/:lottery_id/results",
            get(results_handler::<L, A, S, D>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenListingsQuery {
    #[serde(default)]
    pub(crate) listing_type: Option<ListingType>,
    /// Evaluation instant override; defaults to the current time.
    #[serde(default)]
    pub(crate) as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunLotteryRequest {
    pub(crate) actor: String,
    #[serde(default)]
    pub(crate) award_cutoff: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultsQuery {
    #[serde(default)]
    pub(crate) page: Option<i64>,
    #[serde(default)]
    pub(crate) page_size: Option<i64>,
}

pub(crate) async fn open_listings_handler<L, A, S, D>(
    State(service): State<Arc<LotteryService<L, A, S, D>>>,
    Query(query): Query<OpenListingsQuery>,
) -> Response
where
    L: ListingSource + 'static,
    A: ApplicationSource + 'static,
    S: LotteryStore + 'static,
    D: AuditSink + 'static,
{
    let scope = ListingScope {
        listing_type: query.listing_type,
    };
    let now = query.as_of.unwrap_or_else(Utc::now);

    match service.eligible_listings(&scope, now) {
        Ok(listings) => (StatusCode::OK, axum::Json(listings)).into_response(),
        Err(fault) => {
            let payload = json!({ "error": fault.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn run_lottery_handler<L, A, S, D>(
    State(service): State<Arc<LotteryService<L, A, S, D>>>,
    Path(listing_id): Path<String>,
    axum::Json(request): axum::Json<RunLotteryRequest>,
) -> Response
where
    L: ListingSource + 'static,
    A: ApplicationSource + 'static,
    S: LotteryStore + 'static,
    D: AuditSink + 'static,
{
    let listing_id = ListingId(listing_id);

    match service.run(&listing_id, &request.actor, request.award_cutoff, Utc::now()) {
        Ok(lottery_id) => {
            let payload = json!({
                "lottery_id": lottery_id,
                "listing_id": listing_id,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error @ LotteryRunError::NotDrawable(_)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(error @ LotteryRunError::AlreadyDrawn(_)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(error @ LotteryRunError::SaveFailed) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(fault) => {
            let payload = json!({ "error": fault.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn results_handler<L, A, S, D>(
    State(service): State<Arc<LotteryService<L, A, S, D>>>,
    Path(lottery_id): Path<String>,
    Query(query): Query<ResultsQuery>,
) -> Response
where
    L: ListingSource + 'static,
    A: ApplicationSource + 'static,
    S: LotteryStore + 'static,
    D: AuditSink + 'static,
{
    let lottery_id = LotteryId(lottery_id);
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(0);

    match service.results(&lottery_id, page, page_size) {
        Ok(results) => (StatusCode::OK, axum::Json(results)).into_response(),
        Err(fault) => {
            let payload = json!({ "error": fault.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
