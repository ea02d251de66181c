use metrics_exporter_prometheus::PrometheusHandle;
use placement::workflows::allocation::CapacityConfig;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Parses a `label=fraction` CLI argument.
pub(crate) fn parse_quota_arg(raw: &str) -> Result<(String, f64), String> {
    let (label, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected label=fraction, got '{raw}'"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("quota '{raw}' is missing a channel label"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("failed to parse quota value in '{raw}' ({err})"))?;
    Ok((label.to_string(), value))
}

pub(crate) fn parse_capacities(raw: &str) -> Result<BTreeMap<String, i64>, String> {
    serde_json::from_str(raw)
        .map_err(|err| format!("capacities must be a JSON object of seat counts ({err})"))
}

pub(crate) fn capacity_config(
    total: Option<i64>,
    capacities: Option<BTreeMap<String, i64>>,
) -> CapacityConfig {
    match (total, capacities) {
        (_, Some(capacities)) => CapacityConfig::Manual {
            capacities: Some(capacities),
        },
        (total, None) => CapacityConfig::Equal { total },
    }
}
