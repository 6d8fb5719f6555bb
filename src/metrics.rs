use std::sync::LazyLock;

use prometheus::*;

use crate::error::RetrievalError;

static METRIC_QUERY_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "imsimilar_query_count",
        "count of similarity queries",
        &["kind", "status"]
    )
    .unwrap()
});

static METRIC_QUERY_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "imsimilar_query_duration",
        "duration of the per-query retrieval in seconds",
        &["kind"]
    )
    .unwrap()
});

/// 记录一次检索
pub fn observe_query(kind: &str, error: Option<&RetrievalError>, duration: f64) {
    let status = error.map(RetrievalError::kind).unwrap_or("ok");
    METRIC_QUERY_COUNT.with_label_values(&[kind, status]).inc();
    METRIC_QUERY_DURATION.with_label_values(&[kind]).observe(duration);
}

/// 以文本格式导出所有指标
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    encoder.encode_to_string(&prometheus::gather()).unwrap_or_else(|e| format!("# {e}\n"))
}
