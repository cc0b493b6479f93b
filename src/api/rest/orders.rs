use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::analytics::range::{RangeSelection, filter_by_range};
use crate::analytics::search::{SearchQuery, display_order_id, suggestions};
use crate::analytics::sort::{SortDirection, SortKey, sort_records_in};
use crate::analytics::status::{StatusBucket, classify};
use crate::analytics::summary::{AggregateTotals, summarize};
use crate::backend::fanout::fetch_orders;
use crate::backend::inflight::ViewScope;
use crate::backend::session::Session;
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

const DEFAULT_SUGGESTION_MIN_CHARS: usize = 2;
const DEFAULT_SUGGESTION_LIMIT: usize = 8;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/suggestions", get(order_suggestions))
        .route("/orders/:id/status", patch(update_order_status))
}

#[derive(Deserialize)]
pub struct OrdersQuery {
    pub range: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

#[derive(Deserialize)]
pub struct SuggestionsQuery {
    pub q: Option<String>,
    pub min_chars: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct OrderRow {
    pub display_id: String,
    pub booking_id: String,
    pub tracking_id: String,
    pub consignee_name: String,
    pub destination_city: String,
    pub status: OrderStatus,
    pub bucket: StatusBucket,
    pub cod_amount: f64,
    pub service_charges: f64,
    pub created_at: Option<String>,
    pub delivered_at: Option<String>,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            display_id: display_order_id(order).to_string(),
            booking_id: order.booking_id.clone(),
            tracking_id: order.tracking_id.clone(),
            consignee_name: order.consignee_name.clone(),
            destination_city: order.destination_city.clone(),
            status: order.status.clone(),
            bucket: classify(&order.status),
            cod_amount: order.cod_amount,
            service_charges: order.service_charges,
            created_at: order.created_at.clone(),
            delivered_at: order.delivered_at.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrdersTable {
    pub range: RangeSelection,
    pub count: usize,
    pub totals: AggregateTotals,
    pub rows: Vec<OrderRow>,
}

#[derive(Debug, Serialize)]
pub struct Suggestion {
    pub display_id: String,
    pub tracking_id: String,
    pub consignee_name: String,
    pub destination_city: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    session: Session,
    view: ViewScope,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<OrdersTable>, AppError> {
    let range = RangeSelection::parse(
        query.range.as_deref(),
        query.from.as_deref(),
        query.to.as_deref(),
    )?;
    let key = SortKey::parse(query.sort.as_deref())?;
    let direction = SortDirection::parse(query.dir.as_deref())?;
    let search = SearchQuery::new(query.q.as_deref().unwrap_or_default());

    let orders = fetch_orders(&state, &session, "orders", &view)
        .await
        .inspect_err(|_| {
            state.metrics.record_request("orders", false);
        })?;
    let now = state.now();

    let visible: Vec<&Order> = filter_by_range(&orders, &range, now)
        .into_iter()
        .filter(|order| search.matches(order))
        .collect();
    let sorted = sort_records_in(&visible, key, direction, &state.utc_offset);

    let table = OrdersTable {
        count: sorted.len(),
        totals: summarize(sorted.iter().map(|order| **order), now),
        rows: sorted.iter().map(|order| OrderRow::from(**order)).collect(),
        range,
    };

    state.metrics.record_request("orders", true);
    info!(rows = table.count, fetched = orders.len(), "orders table served");

    Ok(Json(table))
}

async fn order_suggestions(
    State(state): State<Arc<AppState>>,
    session: Session,
    view: ViewScope,
    Query(query): Query<SuggestionsQuery>,
) -> Result<Json<SuggestionsResponse>, AppError> {
    let search = SearchQuery::new(query.q.as_deref().unwrap_or_default());
    let min_chars = query.min_chars.unwrap_or(DEFAULT_SUGGESTION_MIN_CHARS);
    let limit = query.limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT);

    // Below the minimum there is nothing to suggest, so skip the fetch.
    if search.is_empty() || search.len() < min_chars {
        return Ok(Json(SuggestionsResponse {
            suggestions: Vec::new(),
        }));
    }

    let orders = fetch_orders(&state, &session, "suggestions", &view)
        .await
        .inspect_err(|_| {
            state.metrics.record_request("suggestions", false);
        })?;
    let found = suggestions(&orders, &search, min_chars, limit)
        .into_iter()
        .map(|order| Suggestion {
            display_id: display_order_id(order).to_string(),
            tracking_id: order.tracking_id.clone(),
            consignee_name: order.consignee_name.clone(),
            destination_city: order.destination_city.clone(),
        })
        .collect();

    state.metrics.record_request("suggestions", true);
    Ok(Json(SuggestionsResponse { suggestions: found }))
}

async fn update_order_status(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let status = OrderStatus::from(payload.status.clone());
    if status.as_str().trim().is_empty() {
        return Err(AppError::BadRequest("status cannot be empty".to_string()));
    }

    let updated = state
        .backend
        .update_order_status(&session, &id, status.as_str())
        .await?;

    info!(order_id = %id, status = %status, "order status update forwarded");
    Ok(Json(updated))
}
