use crate::models::order::Order;

/// Order id shown in tables. Integrated orders prefer the storefront number.
pub fn display_order_id(order: &Order) -> &str {
    [
        order.shopify_order_number.as_deref(),
        order.source_provider_order_number.as_deref(),
        order.external_order_id.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|id| !id.is_empty())
    .unwrap_or(order.booking_id.as_str())
}

/// A search term normalized once so matching a whole table does not redo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        Self {
            needle: raw.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Character count of the normalized term.
    pub fn len(&self) -> usize {
        self.needle.chars().count()
    }

    pub fn matches(&self, order: &Order) -> bool {
        if self.is_empty() {
            return true;
        }

        [
            display_order_id(order),
            order.tracking_id.as_str(),
            order.consignee_name.as_str(),
            order.destination_city.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&self.needle))
    }
}

pub fn matches(order: &Order, query: &str) -> bool {
    SearchQuery::new(query).matches(order)
}

/// Type-ahead candidates. Nothing is suggested until the query reaches
/// `min_chars`.
pub fn suggestions<'a>(
    records: &'a [Order],
    query: &SearchQuery,
    min_chars: usize,
    limit: usize,
) -> Vec<&'a Order> {
    if query.is_empty() || query.len() < min_chars {
        return Vec::new();
    }

    records
        .iter()
        .filter(|order| query.matches(order))
        .take(limit)
        .collect()
}
