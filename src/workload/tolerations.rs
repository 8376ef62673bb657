//! Toleration merging: base GPU toleration plus user-declared tolerations,
//! deduplicated by `{key, effect}` and stably sorted for idempotent output.

use k8s_openapi::api::core::v1::Toleration;

pub const GPU_TOLERATION_KEY: &str = "nvidia.com/gpu";

fn base_gpu_toleration() -> Toleration {
    Toleration {
        key: Some(GPU_TOLERATION_KEY.to_string()),
        operator: Some("Exists".to_string()),
        effect: Some("NoSchedule".to_string()),
        ..Default::default()
    }
}

fn dedup_key(t: &Toleration) -> (String, String) {
    (
        t.key.clone().unwrap_or_default(),
        t.effect.clone().unwrap_or_default(),
    )
}

/// Merge `user` tolerations with the base GPU toleration (included only
/// when `gpu_requested`). Output is deduplicated by `{key, effect}` and
/// sorted for byte-identical output across reconciles.
pub fn merge(user: &[Toleration], gpu_requested: bool) -> Vec<Toleration> {
    let mut merged: Vec<Toleration> = Vec::with_capacity(user.len() + 1);
    if gpu_requested {
        merged.push(base_gpu_toleration());
    }
    merged.extend_from_slice(user);

    let mut seen = std::collections::BTreeSet::new();
    let mut deduped = Vec::with_capacity(merged.len());
    for t in merged {
        let key = dedup_key(&t);
        if seen.insert(key) {
            deduped.push(t);
        }
    }

    deduped.sort_by_key(dedup_key);
    deduped
}
