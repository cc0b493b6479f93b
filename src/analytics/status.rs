use std::borrow::Borrow;

use serde::Serialize;

use crate::models::order::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusBucket {
    Pending,
    Delivered,
    Returned,
    OutForDelivery,
    Attempted,
    Other,
}

/// Primary bucket of a status code. Unknown codes land in `Other`.
pub fn classify(status: &OrderStatus) -> StatusBucket {
    match status {
        OrderStatus::Delivered => StatusBucket::Delivered,
        OrderStatus::Returned => StatusBucket::Returned,
        OrderStatus::OutForDelivery => StatusBucket::OutForDelivery,
        OrderStatus::FirstAttempt
        | OrderStatus::SecondAttempt
        | OrderStatus::ThirdAttempt
        | OrderStatus::Failed => StatusBucket::Attempted,
        OrderStatus::Created | OrderStatus::Assigned => StatusBucket::Pending,
        OrderStatus::Unknown(_) => StatusBucket::Other,
    }
}

/// Anything that is not DELIVERED, RETURNED or FAILED still counts as pending,
/// unknown codes included.
pub fn is_pending(status: &OrderStatus) -> bool {
    !matches!(
        status,
        OrderStatus::Delivered | OrderStatus::Returned | OrderStatus::Failed
    )
}

/// Every bucket a status contributes to. Buckets overlap: an attempted order
/// is also pending unless it FAILED, and an out-for-delivery order is both.
pub fn memberships(status: &OrderStatus) -> Vec<StatusBucket> {
    let primary = classify(status);
    let mut buckets = vec![primary];
    if primary != StatusBucket::Pending && is_pending(status) {
        buckets.push(StatusBucket::Pending);
    }
    buckets
}

/// Which non-terminal orders a widget treats as "still pending".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PendingScope {
    #[default]
    IncludeOutForDelivery,
    ExcludeOutForDelivery,
}

impl PendingScope {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("include_ofd") => Some(PendingScope::IncludeOutForDelivery),
            Some("exclude_ofd") => Some(PendingScope::ExcludeOutForDelivery),
            Some(_) => None,
        }
    }

    pub fn admits(self, order: &Order) -> bool {
        if !is_pending(&order.status) {
            return false;
        }
        match self {
            PendingScope::IncludeOutForDelivery => true,
            PendingScope::ExcludeOutForDelivery => order.status != OrderStatus::OutForDelivery,
        }
    }

    pub fn predicate(self) -> impl Fn(&Order) -> bool {
        move |order| self.admits(order)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub delivered: usize,
    pub returned: usize,
    pub out_for_delivery: usize,
    pub attempted: usize,
    pub other: usize,
}

impl StatusCounts {
    pub fn tally<I>(records: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<Order>,
    {
        let mut counts = StatusCounts::default();
        for record in records {
            let order: &Order = record.borrow();
            for bucket in memberships(&order.status) {
                counts.bump(bucket);
            }
        }
        counts
    }

    fn bump(&mut self, bucket: StatusBucket) {
        let slot = match bucket {
            StatusBucket::Pending => &mut self.pending,
            StatusBucket::Delivered => &mut self.delivered,
            StatusBucket::Returned => &mut self.returned,
            StatusBucket::OutForDelivery => &mut self.out_for_delivery,
            StatusBucket::Attempted => &mut self.attempted,
            StatusBucket::Other => &mut self.other,
        };
        *slot += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{PendingScope, StatusBucket, StatusCounts, classify, is_pending, memberships};
    use crate::models::order::{Order, OrderStatus};

    fn with_status(raw: &str) -> Order {
        Order {
            status: OrderStatus::from(raw),
            ..Order::default()
        }
    }

    #[test]
    fn failed_is_attempted_and_not_pending() {
        let failed = OrderStatus::Failed;
        assert_eq!(classify(&failed), StatusBucket::Attempted);
        assert!(!is_pending(&failed));
        assert!(!PendingScope::IncludeOutForDelivery.admits(&with_status("FAILED")));
        assert_eq!(memberships(&failed), vec![StatusBucket::Attempted]);
    }

    #[test]
    fn attempts_count_as_attempted_and_pending() {
        for raw in ["FIRST_ATTEMPT", "SECOND_ATTEMPT", "THIRD_ATTEMPT"] {
            let status = OrderStatus::from(raw);
            assert_eq!(
                memberships(&status),
                vec![StatusBucket::Attempted, StatusBucket::Pending]
            );
        }
    }

    #[test]
    fn unknown_status_is_other_but_still_pending() {
        let status = OrderStatus::from("ON_HOLD");
        assert_eq!(classify(&status), StatusBucket::Other);
        assert!(is_pending(&status));
        assert_eq!(status.to_string(), "ON_HOLD");
    }

    #[test]
    fn pending_scope_controls_out_for_delivery() {
        let ofd = with_status("OUT_FOR_DELIVERY");
        assert!(PendingScope::IncludeOutForDelivery.admits(&ofd));
        assert!(!PendingScope::ExcludeOutForDelivery.admits(&ofd));
        assert!(PendingScope::ExcludeOutForDelivery.admits(&with_status("ASSIGNED")));
        assert!(!PendingScope::ExcludeOutForDelivery.admits(&with_status("DELIVERED")));
    }

    #[test]
    fn tally_counts_overlapping_buckets() {
        let orders: Vec<Order> = [
            "CREATED",
            "DELIVERED",
            "RETURNED",
            "OUT_FOR_DELIVERY",
            "SECOND_ATTEMPT",
            "FAILED",
            "WEIRD",
        ]
        .into_iter()
        .map(with_status)
        .collect();

        let counts = StatusCounts::tally(&orders);
        assert_eq!(
            counts,
            StatusCounts {
                pending: 4,
                delivered: 1,
                returned: 1,
                out_for_delivery: 1,
                attempted: 2,
                other: 1,
            }
        );
    }

    #[test]
    fn pending_scope_parses_query_values() {
        assert_eq!(PendingScope::parse(None), Some(PendingScope::IncludeOutForDelivery));
        assert_eq!(
            PendingScope::parse(Some("exclude_ofd")),
            Some(PendingScope::ExcludeOutForDelivery)
        );
        assert_eq!(PendingScope::parse(Some("sometimes")), None);
    }
}
