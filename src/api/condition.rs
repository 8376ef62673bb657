//! Helpers for building standard Kubernetes `Condition` entries on object status.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};

/// Build (or refresh) a `Condition`, bumping `lastTransitionTime` only when the
/// status actually changed relative to `previous`.
pub fn build(
    type_: &str,
    status: bool,
    reason: &str,
    message: impl Into<String>,
    previous: Option<&Condition>,
) -> Condition {
    let status_str = if status { "True" } else { "False" };
    let changed = previous
        .map(|p| p.status != status_str)
        .unwrap_or(true);
    let last_transition_time = match previous {
        Some(p) if !changed => p.last_transition_time.clone(),
        _ => Time(chrono::Utc::now()),
    };

    Condition {
        type_: type_.to_string(),
        status: status_str.to_string(),
        reason: reason.to_string(),
        message: message.into(),
        last_transition_time,
        observed_generation: None,
    }
}

/// Replace or append `condition` in `conditions`, matching by `type_`.
pub fn upsert(conditions: &mut Vec<Condition>, condition: Condition) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        *existing = condition;
    } else {
        conditions.push(condition);
    }
}

pub fn find<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}
