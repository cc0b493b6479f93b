use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::analytics::range::{RangeSelection, filter_by_range};
use crate::backend::fanout::fetch_users;
use crate::backend::inflight::ViewScope;
use crate::backend::session::Session;
use crate::error::AppError;
use crate::models::user::{User, UserRole, UserStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/status", patch(update_user_status))
        .route("/users/:id/reset-password", post(reset_password))
}

#[derive(Deserialize)]
pub struct UsersQuery {
    pub role: Option<String>,
    pub q: Option<String>,
    pub range: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUserStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct UsersList {
    pub count: usize,
    pub users: Vec<User>,
}

fn user_matches(user: &User, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    [
        Some(user.name.as_str()),
        Some(user.email.as_str()),
        user.phone.as_deref(),
        user.company_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

pub fn select_users<'a>(
    users: &'a [User],
    role: Option<&UserRole>,
    needle: &str,
    range: &RangeSelection,
    now: chrono::DateTime<chrono::FixedOffset>,
) -> Vec<&'a User> {
    filter_by_range(users, range, now)
        .into_iter()
        .filter(|user| role.is_none_or(|r| user.role == *r))
        .filter(|user| user_matches(user, needle))
        .collect()
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    session: Session,
    view: ViewScope,
    Query(query): Query<UsersQuery>,
) -> Result<Json<UsersList>, AppError> {
    let role = match query.role.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            UserRole::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown role: {raw}")))?,
        ),
    };
    let range = RangeSelection::parse(
        query.range.as_deref(),
        query.from.as_deref(),
        query.to.as_deref(),
    )?;
    let needle = query
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .unwrap_or_default();

    let users = fetch_users(&state, &session, "users", &view)
        .await
        .inspect_err(|_| {
            state.metrics.record_request("users", false);
        })?;

    let selected: Vec<User> = select_users(&users, role.as_ref(), &needle, &range, state.now())
        .into_iter()
        .cloned()
        .collect();

    state.metrics.record_request("users", true);
    Ok(Json(UsersList {
        count: selected.len(),
        users: selected,
    }))
}

async fn update_user_status(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let status = UserStatus::parse(&payload.status).ok_or_else(|| {
        AppError::BadRequest(format!(
            "status must be ACTIVE or INACTIVE, got {}",
            payload.status
        ))
    })?;
    let status = match status {
        UserStatus::Active => "ACTIVE",
        UserStatus::Inactive => "INACTIVE",
    };

    let updated = state
        .backend
        .update_user_status(&session, &id, status)
        .await?;

    info!(user_id = %id, status, "user status update forwarded");
    Ok(Json(updated))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let result = state.backend.reset_password(&session, &id).await?;
    info!(user_id = %id, "password reset forwarded");
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use serde_json::json;

    use super::select_users;
    use crate::analytics::range::RangeSelection;
    use crate::models::user::{User, UserRole};

    fn users() -> Vec<User> {
        serde_json::from_value(json!([
            { "name": "Ahmed Raza", "email": "ahmed@example.com", "role": "RIDER", "createdAt": "2024-03-10" },
            { "name": "Bushra", "email": "b@shipco.pk", "role": "SHIPPER", "companyName": "ShipCo", "createdAt": "2024-01-01" },
            { "name": "Kamran", "email": "k@example.com", "role": "RIDER" }
        ]))
        .unwrap()
    }

    #[test]
    fn filters_by_role_and_search_term() {
        let users = users();
        let now = DateTime::parse_from_rfc3339("2024-03-15T12:00:00+05:00").unwrap();

        let riders = select_users(&users, Some(&UserRole::Rider), "", &RangeSelection::All, now);
        assert_eq!(riders.len(), 2);

        let shipco = select_users(&users, None, "shipco", &RangeSelection::All, now);
        assert_eq!(shipco.len(), 1);
        assert_eq!(shipco[0].name, "Bushra");

        let recent = select_users(&users, None, "", &RangeSelection::LastNDays { days: 30 }, now);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].name, "Ahmed Raza");
    }
}
