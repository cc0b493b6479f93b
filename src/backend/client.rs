use std::time::Instant;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::session::Session;
use crate::config::BackendConfig;
use crate::error::AppError;
use crate::models::order::Order;
use crate::models::user::User;
use crate::observability::metrics::Metrics;

const LIST_ENVELOPE_KEYS: &[&str] = &["data", "items", "orders", "users", "results"];

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    config: BackendConfig,
    metrics: Metrics,
}

impl BackendClient {
    pub fn new(config: BackendConfig, metrics: Metrics) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            config,
            metrics,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn orders(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<Vec<Order>, AppError> {
        let body = self
            .get_json::<Value>(session, "orders", &self.config.orders_path, cancel)
            .await?;
        Ok(extract_list(body, "orders"))
    }

    pub async fn users(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<Vec<User>, AppError> {
        let body = self
            .get_json::<Value>(session, "users", &self.config.users_path, cancel)
            .await?;
        Ok(extract_list(body, "users"))
    }

    /// Server-computed finance figures, passed through untouched.
    pub async fn finance_stats(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<Value, AppError> {
        self.get_json(session, "finance", &self.config.stats_path, cancel)
            .await
    }

    pub async fn update_order_status(
        &self,
        session: &Session,
        order_id: &str,
        status: &str,
    ) -> Result<Value, AppError> {
        let path = format!("{}/{}/status", self.config.orders_path, order_id);
        self.send_json(Method::PATCH, session, &path, Some(&json!({ "status": status })))
            .await
    }

    pub async fn update_user_status(
        &self,
        session: &Session,
        user_id: &str,
        status: &str,
    ) -> Result<Value, AppError> {
        let path = format!("{}/{}/status", self.config.users_path, user_id);
        self.send_json(Method::PATCH, session, &path, Some(&json!({ "status": status })))
            .await
    }

    pub async fn reset_password(&self, session: &Session, user_id: &str) -> Result<Value, AppError> {
        let path = format!("{}/{}/reset-password", self.config.users_path, user_id);
        self.send_json::<(), Value>(Method::POST, session, &path, None)
            .await
    }

    /// GET with bounded retries on transport failures. Application errors
    /// from the backend are returned as-is on the first occurrence.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        resource: &'static str,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<T, AppError> {
        let start = Instant::now();
        let url = self.url(path);
        let mut attempt: u32 = 0;

        let result = loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AppError::Superseded),
                res = self.send_once::<(), T>(Method::GET, &url, session, None) => res,
            };

            match outcome {
                Err(AppError::Transport(msg)) if attempt < self.config.max_retries => {
                    attempt += 1;
                    self.metrics
                        .backend_retries_total
                        .with_label_values(&[resource])
                        .inc();
                    warn!(resource, attempt, error = %msg, "backend fetch failed; retrying");

                    let backoff = self.config.retry_backoff * attempt;
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break Err(AppError::Superseded),
                        _ = sleep(backoff) => {}
                    }
                }
                other => break other,
            }
        };

        let outcome = if result.is_ok() { "success" } else { "error" };
        self.metrics
            .backend_fetch_latency_seconds
            .with_label_values(&[resource, outcome])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    /// Single request for state-changing actions. These are never retried.
    pub async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        session: &Session,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, AppError> {
        let url = self.url(path);
        self.send_once(method, &url, session, body).await
    }

    async fn send_once<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        session: &Session,
        body: Option<&B>,
    ) -> Result<T, AppError> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(reqwest::header::AUTHORIZATION, session.bearer());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| AppError::Transport(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| AppError::Transport(format!("failed to read backend response: {err}")))?;

        debug!(%method, url, status = status.as_u16(), "backend responded");

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(backend_message(status, &text)));
        }
        if !status.is_success() {
            return Err(AppError::Backend {
                status: status.as_u16(),
                message: backend_message(status, &text),
            });
        }

        // Some mutation endpoints answer with an empty body.
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|err| {
            AppError::Internal(format!("unexpected backend response from {url}: {err}"))
        })
    }
}

fn backend_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
    });

    from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("backend request failed")
                .to_string()
        })
}

/// Accepts a bare array or an object wrapping one. Entries that are not
/// objects are skipped rather than failing the whole list; objects with
/// `null` or mistyped fields are kept.
pub fn extract_list<T: DeserializeOwned>(body: Value, resource: &str) -> Vec<T> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => LIST_ENVELOPE_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(resource, error = %err, "skipping malformed record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::{backend_message, extract_list};
    use crate::models::order::Order;

    #[test]
    fn list_accepts_bare_arrays_and_envelopes() {
        let bare: Vec<Order> = extract_list(json!([{ "bookingId": "A" }]), "orders");
        assert_eq!(bare.len(), 1);

        let wrapped: Vec<Order> =
            extract_list(json!({ "orders": [{ "bookingId": "A" }, { "bookingId": "B" }] }), "orders");
        assert_eq!(wrapped.len(), 2);

        let nothing: Vec<Order> = extract_list(json!({ "total": 0 }), "orders");
        assert!(nothing.is_empty());
    }

    #[test]
    fn list_skips_entries_that_are_not_records() {
        let parsed: Vec<Order> = extract_list(json!([{ "bookingId": "A" }, 42, "x"]), "orders");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].booking_id, "A");
    }

    #[test]
    fn list_keeps_records_with_null_fields() {
        let parsed: Vec<Order> = extract_list(
            json!([
                { "bookingId": "A", "trackingId": null, "codAmount": 100 },
                { "bookingId": "B", "status": null, "codAmount": 200 },
                { "bookingId": "C", "shopifyOrderNumber": 1042, "codAmount": 300 },
                { "bookingId": "D", "statusHistory": null, "codAmount": 400 }
            ]),
            "orders",
        );

        assert_eq!(parsed.len(), 4);
        let total: f64 = parsed.iter().map(|o| o.cod_amount).sum();
        assert_eq!(total, 1000.0);
        assert_eq!(parsed[2].shopify_order_number.as_deref(), Some("1042"));
    }

    #[test]
    fn backend_message_prefers_json_message_field() {
        assert_eq!(
            backend_message(StatusCode::BAD_REQUEST, r#"{"message":"Invalid status"}"#),
            "Invalid status"
        );
        assert_eq!(
            backend_message(StatusCode::FORBIDDEN, r#"{"error":"Not allowed"}"#),
            "Not allowed"
        );
        assert_eq!(backend_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
    }
}
