//! 场景选帧器 - 为每个镜头挑出第一段满足感知质量门限的连续帧
//!
//! 核心流程：
//! 1. 方差预筛 - 跳过空白/黑帧，不调用打分模型
//! 2. 指标判定 - 每个配置的指标按方向和阈值比较
//! 3. 连续段跟踪 - 任一帧不合格即清空，达到目标长度立即停止
//! 4. 场景隔离 - 单个场景的故障不影响其他场景

pub mod cancel;
pub mod classifier;
pub mod config;
pub mod error;
pub mod frame;
pub mod metric;
pub mod orchestrator;
pub mod report;
pub mod result;
pub mod scanner;
pub mod scene;
pub mod tracker;

pub use cancel::CancellationToken;
pub use classifier::{FrameQualityClassifier, QualityVerdict, RejectReason};
pub use config::{MetricMode, SelectionConfig};
pub use error::{ScoreError, SelectionError};
pub use frame::{pixel_std_dev, Frame, YuvFrame};
pub use metric::{Direction, FnScorer, MetricPredicate, MockScorer, QualityScorer, ScoringDevice};
pub use orchestrator::{SelectionOutput, SelectionStats, SequenceSelector};
pub use report::{
    annotate_scenes, export_file_name, export_index, to_json_pretty, SceneSelection,
    SelectedRange, SelectionSummary,
};
pub use result::SequenceResult;
pub use scanner::{ScanAction, ScanControl, ScanOutcome, ScanReport, ScanState, SceneWindowScanner};
pub use scene::{scenes_from_boundaries, Scene};
pub use tracker::RunTracker;
