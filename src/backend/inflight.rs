use std::sync::atomic::{AtomicU64, Ordering};

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backend::session::Session;
use crate::error::AppError;

/// Header a dashboard sends to name the view a request belongs to. Requests
/// without it never supersede anything.
pub const VIEW_HEADER: &str = "x-request-scope";

const MAX_VIEW_LEN: usize = 128;

/// Caller-chosen view a request loads data for, e.g. `orders-table` or
/// `ceo-overview`. A newer request for the same view replaces an older one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewScope(Option<String>);

impl ViewScope {
    pub fn named(view: impl Into<String>) -> Self {
        let view = view.into().trim().to_string();
        if view.is_empty() {
            return Self::anonymous();
        }
        Self(Some(view))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ViewScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(VIEW_HEADER) else {
            return Ok(ViewScope::anonymous());
        };

        let view = raw
            .to_str()
            .map_err(|_| AppError::BadRequest(format!("malformed {VIEW_HEADER} header")))?;
        if view.len() > MAX_VIEW_LEN {
            return Err(AppError::BadRequest(format!(
                "{VIEW_HEADER} must be at most {MAX_VIEW_LEN} bytes"
            )));
        }

        Ok(ViewScope::named(view))
    }
}

/// Which backend fetch a request is making: the endpoint serving it, the
/// caller's view and the backend resource.
#[derive(Debug, Clone, Copy)]
pub struct FetchSlot<'a> {
    pub endpoint: &'static str,
    pub view: &'a ViewScope,
    pub resource: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ViewKey {
    Named(String),
    /// Unnamed requests get a slot of their own.
    Unique(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct InflightKey {
    session: u64,
    endpoint: &'static str,
    view: ViewKey,
    resource: &'static str,
}

struct Entry {
    generation: u64,
    token: CancellationToken,
}

/// Tracks the latest backend fetch per session, endpoint, view and resource.
/// Starting a new fetch for the same slot cancels the older one so a stale
/// response can never overwrite fresher data. Fetches in different slots
/// never touch each other.
#[derive(Default)]
pub struct InflightRegistry {
    entries: DashMap<InflightKey, Entry>,
    next_generation: AtomicU64,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fetch. The returned flag is true when an older fetch for
    /// the same slot was cancelled.
    pub fn begin(&self, session: &Session, slot: FetchSlot<'_>) -> (InflightGuard<'_>, bool) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let view = match slot.view.name() {
            Some(name) => ViewKey::Named(name.to_string()),
            None => ViewKey::Unique(generation),
        };
        let key = InflightKey {
            session: session.fingerprint(),
            endpoint: slot.endpoint,
            view,
            resource: slot.resource,
        };
        let token = CancellationToken::new();

        let previous = self.entries.insert(
            key.clone(),
            Entry {
                generation,
                token: token.clone(),
            },
        );

        let superseded = match previous {
            Some(old) => {
                debug!(
                    endpoint = slot.endpoint,
                    view = slot.view.name(),
                    resource = slot.resource,
                    generation = old.generation,
                    "superseding in-flight fetch"
                );
                old.token.cancel();
                true
            }
            None => false,
        };

        (
            InflightGuard {
                registry: self,
                key,
                generation,
                token,
            },
            superseded,
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Live registration of one fetch. Dropping it (request finished or its
/// handler was torn down) cancels the token and frees the slot unless a
/// newer fetch already owns it.
pub struct InflightGuard<'a> {
    registry: &'a InflightRegistry,
    key: InflightKey,
    generation: u64,
    token: CancellationToken,
}

impl InflightGuard<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.token.cancel();
        self.registry
            .entries
            .remove_if(&self.key, |_, entry| entry.generation == self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchSlot, InflightRegistry, ViewScope};
    use crate::backend::session::Session;

    fn slot<'a>(endpoint: &'static str, view: &'a ViewScope, resource: &'static str) -> FetchSlot<'a> {
        FetchSlot {
            endpoint,
            view,
            resource,
        }
    }

    #[test]
    fn newer_fetch_cancels_older_for_same_view() {
        let registry = InflightRegistry::new();
        let session = Session::new("t").unwrap();
        let table = ViewScope::named("orders-table");

        let (first, superseded) = registry.begin(&session, slot("orders", &table, "orders"));
        assert!(!superseded);
        let (second, superseded) = registry.begin(&session, slot("orders", &table, "orders"));
        assert!(superseded);

        assert!(first.token().is_cancelled());
        assert!(!second.token().is_cancelled());

        drop(first);
        assert_eq!(registry.len(), 1);
        drop(second);
        assert!(registry.is_empty());
    }

    #[test]
    fn endpoints_reading_the_same_resource_are_independent() {
        let registry = InflightRegistry::new();
        let session = Session::new("t").unwrap();
        let page = ViewScope::named("orders-page");

        let (table, _) = registry.begin(&session, slot("orders", &page, "orders"));
        let (typeahead, superseded) = registry.begin(&session, slot("suggestions", &page, "orders"));
        let (overview, _) = registry.begin(&session, slot("dashboard", &page, "orders"));

        assert!(!superseded);
        assert!(!table.token().is_cancelled());
        assert!(!typeahead.token().is_cancelled());
        assert!(!overview.token().is_cancelled());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn unnamed_requests_never_supersede() {
        let registry = InflightRegistry::new();
        let session = Session::new("t").unwrap();
        let anonymous = ViewScope::anonymous();

        let (first, _) = registry.begin(&session, slot("orders", &anonymous, "orders"));
        let (second, superseded) = registry.begin(&session, slot("orders", &anonymous, "orders"));

        assert!(!superseded);
        assert!(!first.token().is_cancelled());
        assert!(!second.token().is_cancelled());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn different_views_and_sessions_do_not_interfere() {
        let registry = InflightRegistry::new();
        let alice = Session::new("alice").unwrap();
        let bob = Session::new("bob").unwrap();
        let tab_one = ViewScope::named("tab-1");
        let tab_two = ViewScope::named("tab-2");

        let (one, _) = registry.begin(&alice, slot("orders", &tab_one, "orders"));
        let (two, superseded) = registry.begin(&alice, slot("orders", &tab_two, "orders"));
        assert!(!superseded);
        let (bob_one, superseded) = registry.begin(&bob, slot("orders", &tab_one, "orders"));
        assert!(!superseded);

        assert!(!one.token().is_cancelled());
        assert!(!two.token().is_cancelled());
        assert!(!bob_one.token().is_cancelled());
    }

    #[test]
    fn dropping_guard_cancels_its_own_token() {
        let registry = InflightRegistry::new();
        let session = Session::new("t").unwrap();
        let view = ViewScope::named("finance");
        let (guard, _) = registry.begin(&session, slot("dashboard", &view, "finance"));
        let token = guard.token().clone();
        drop(guard);
        assert!(token.is_cancelled());
        assert!(registry.is_empty());
    }

    #[test]
    fn blank_view_name_is_anonymous() {
        assert_eq!(ViewScope::named("   "), ViewScope::anonymous());
        assert_eq!(ViewScope::named(" table ").name(), Some("table"));
    }
}
