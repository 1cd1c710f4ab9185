use thiserror::Error;

/// 配置/输入错误，扫描开始前即失败
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("sequence_length must be at least 1")]
    InvalidSequenceLength,
    #[error("no quality metric is active")]
    NoMetrics,
    #[error("metric name must not be empty")]
    EmptyMetricName,
    #[error("metric `{metric}` has invalid threshold {threshold}")]
    InvalidThreshold { metric: String, threshold: f64 },
    #[error("min_frame_variance must be a finite non-negative number, got {0}")]
    InvalidMinVariance(f64),
    #[error("max_parallel_scenes must be at least 1")]
    InvalidParallelism,
    #[error("metric `{0}` is not configured")]
    UnknownMetric(String),
    #[error("no scorer registered for metric `{0}`")]
    MissingScorer(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

/// 单帧打分失败，按拒绝处理，不重试
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoreError {
    #[error("scoring backend failed: {0}")]
    Backend(String),
    #[error("metric `{metric}` returned non-finite score {score}")]
    NonFinite { metric: String, score: f64 },
    #[error("frame {0} has no usable pixel data")]
    InvalidFrame(u64),
}
