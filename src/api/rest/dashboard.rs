use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::analytics::range::{RangeSelection, filter_by_range};
use crate::analytics::status::{PendingScope, StatusCounts};
use crate::analytics::summary::{AggregateTotals, summarize, summarize_where};
use crate::backend::fanout::fetch_dashboard_sources;
use crate::backend::inflight::ViewScope;
use crate::backend::session::Session;
use crate::error::AppError;
use crate::models::order::Order;
use crate::models::user::{User, UserRole};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(dashboard))
}

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub range: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub pending: Option<String>,
}

/// One independently loaded part of a dashboard. A failed part carries its
/// error instead of pretending to be empty.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Section<T> {
    Ok { data: T },
    Error { error: String },
}

impl<T> Section<T> {
    pub fn from_result(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Section::Ok { data },
            Err(err) => Section::Error {
                error: err.public_message(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Section::Ok { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct OrdersOverview {
    pub totals: AggregateTotals,
    pub pending: AggregateTotals,
    pub status_counts: StatusCounts,
}

#[derive(Debug, Default, Serialize)]
pub struct RoleCounts {
    pub ceo: usize,
    pub manager: usize,
    pub shipper: usize,
    pub rider: usize,
    pub other: usize,
}

#[derive(Debug, Serialize)]
pub struct UsersOverview {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub by_role: RoleCounts,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub generated_at: DateTime<FixedOffset>,
    pub range: RangeSelection,
    pub orders: Section<OrdersOverview>,
    pub users: Section<UsersOverview>,
    pub finance: Section<Value>,
}

pub fn orders_overview(
    orders: &[Order],
    range: &RangeSelection,
    scope: PendingScope,
    now: DateTime<FixedOffset>,
) -> OrdersOverview {
    let in_range = filter_by_range(orders, range, now);

    OrdersOverview {
        totals: summarize(in_range.iter().copied(), now),
        pending: summarize_where(in_range.iter().copied(), now, scope.predicate()),
        status_counts: StatusCounts::tally(in_range.iter().copied()),
    }
}

pub fn users_overview(users: &[User]) -> UsersOverview {
    let mut by_role = RoleCounts::default();
    for user in users {
        let slot = match user.role {
            UserRole::Ceo => &mut by_role.ceo,
            UserRole::Manager => &mut by_role.manager,
            UserRole::Shipper => &mut by_role.shipper,
            UserRole::Rider => &mut by_role.rider,
            UserRole::Other => &mut by_role.other,
        };
        *slot += 1;
    }

    let active = users.iter().filter(|u| u.is_active()).count();

    UsersOverview {
        total: users.len(),
        active,
        inactive: users.len() - active,
        by_role,
    }
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    session: Session,
    view: ViewScope,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let range = RangeSelection::parse(
        query.range.as_deref(),
        query.from.as_deref(),
        query.to.as_deref(),
    )?;
    let scope = PendingScope::parse(query.pending.as_deref()).ok_or_else(|| {
        AppError::BadRequest("pending must be include_ofd or exclude_ofd".to_string())
    })?;

    let sources = fetch_dashboard_sources(&state, &session, &view).await;
    let now = state.now();

    let response = DashboardResponse {
        generated_at: now,
        orders: Section::from_result(
            sources
                .orders
                .map(|orders| orders_overview(&orders, &range, scope, now)),
        ),
        users: Section::from_result(sources.users.map(|users| users_overview(&users))),
        finance: Section::from_result(sources.finance),
        range,
    };

    let all_ok = response.orders.is_ok() && response.users.is_ok() && response.finance.is_ok();
    state.metrics.record_request("dashboard", all_ok);
    info!(?session, partial = !all_ok, "dashboard served");

    Ok(Json(response))
}
