use std::sync::LazyLock;
use std::time::Duration;

use prometheus::*;

static METRIC_BATCH_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "imtag_batch_count",
        "count of the classifier batches by result",
        &["result"]
    )
    .unwrap()
});

static METRIC_BATCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "imtag_batch_duration",
        "duration of the per-batch classifier request in seconds",
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap()
});

static METRIC_ANNOTATION_COUNT: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!("imtag_annotation_count", "count of the annotations inserted").unwrap()
});

static METRIC_QUERY_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("imtag_query_count", "count of the queries by hit", &["hit"]).unwrap()
});

/// 记录一个批次的结果，`result` 为 `ok`、`rejected` 或错误类型
pub fn inc_batch(result: &str) {
    METRIC_BATCH_COUNT.with_label_values(&[result]).inc();
}

pub fn observe_batch_duration(duration: Duration) {
    METRIC_BATCH_DURATION.observe(duration.as_secs_f64());
}

pub fn inc_annotations(n: usize) {
    METRIC_ANNOTATION_COUNT.inc_by(n as u64);
}

pub fn inc_query(hit: bool) {
    METRIC_QUERY_COUNT.with_label_values(&[if hit { "true" } else { "false" }]).inc();
}

/// 以文本格式导出所有指标
pub fn gather_text() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    Ok(encoder.encode_to_string(&prometheus::gather())?)
}
