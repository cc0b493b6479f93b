use serde_json::Value;
use tracing::warn;

use crate::backend::inflight::{FetchSlot, ViewScope};
use crate::backend::session::Session;
use crate::error::AppError;
use crate::models::order::Order;
use crate::models::user::User;
use crate::state::AppState;

/// Raw inputs of a dashboard. Each source resolves on its own; one failing
/// never blocks or blanks the others.
pub struct DashboardSources {
    pub orders: Result<Vec<Order>, AppError>,
    pub users: Result<Vec<User>, AppError>,
    pub finance: Result<Value, AppError>,
}

pub async fn fetch_dashboard_sources(
    state: &AppState,
    session: &Session,
    view: &ViewScope,
) -> DashboardSources {
    let (orders, users, finance) = tokio::join!(
        fetch_orders(state, session, "dashboard", view),
        fetch_users(state, session, "dashboard", view),
        fetch_finance(state, session, "dashboard", view),
    );

    for (resource, err) in [
        ("orders", orders.as_ref().err()),
        ("users", users.as_ref().err()),
        ("finance", finance.as_ref().err()),
    ] {
        if let Some(err) = err {
            warn!(resource, error = %err, "dashboard source failed");
        }
    }

    DashboardSources {
        orders,
        users,
        finance,
    }
}

pub async fn fetch_orders(
    state: &AppState,
    session: &Session,
    endpoint: &'static str,
    view: &ViewScope,
) -> Result<Vec<Order>, AppError> {
    let (guard, superseded) = state.inflight.begin(
        session,
        FetchSlot {
            endpoint,
            view,
            resource: "orders",
        },
    );
    note_superseded(state, superseded);
    state.backend.orders(session, guard.token()).await
}

pub async fn fetch_users(
    state: &AppState,
    session: &Session,
    endpoint: &'static str,
    view: &ViewScope,
) -> Result<Vec<User>, AppError> {
    let (guard, superseded) = state.inflight.begin(
        session,
        FetchSlot {
            endpoint,
            view,
            resource: "users",
        },
    );
    note_superseded(state, superseded);
    state.backend.users(session, guard.token()).await
}

pub async fn fetch_finance(
    state: &AppState,
    session: &Session,
    endpoint: &'static str,
    view: &ViewScope,
) -> Result<Value, AppError> {
    let (guard, superseded) = state.inflight.begin(
        session,
        FetchSlot {
            endpoint,
            view,
            resource: "finance",
        },
    );
    note_superseded(state, superseded);
    state.backend.finance_stats(session, guard.token()).await
}

fn note_superseded(state: &AppState, superseded: bool) {
    if superseded {
        state.metrics.inflight_superseded_total.inc();
    }
}
