//! Business counters exported next to the HTTP metrics.

use crate::models::EntityKind;

pub fn record_login(method: &'static str, outcome: &'static str) {
    metrics::counter!("directory_logins_total", "method" => method, "outcome" => outcome)
        .increment(1);
}

pub fn record_image_association(kind: EntityKind, outcome: &'static str) {
    metrics::counter!(
        "directory_image_associations_total",
        "kind" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}
