//! 场景连续帧选择器

use std::path::Path;
use std::sync::{Arc, Mutex};

use log::info;

use crate::core::selection::{
    Frame, QualityScorer, Scene, SelectionConfig, SelectionError, SelectionOutput,
    SelectionStats, SequenceResult, SequenceSelector,
};

/// 累计统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorStats {
    pub processed_scenes: u64,
    pub sequences_found: u64,
    pub frames_examined: u64,
    pub faulted_scenes: u64,
}

/// 场景选帧入口 - 绑定打分模型，逐批处理场景
///
/// ```no_run
/// use std::sync::Arc;
/// use scene_frame_lib::api::SceneSequenceSelector;
/// use scene_frame_lib::core::selection::{MockScorer, QualityScorer, SelectionConfig};
///
/// let scorers: Vec<Arc<dyn QualityScorer>> = vec![
///     Arc::new(MockScorer::constant("musiq", 50.0)),
///     Arc::new(MockScorer::constant("niqe", 4.0)),
/// ];
/// let selector = SceneSequenceSelector::create(SelectionConfig::default(), &scorers)?;
/// let results = selector.process(&[], &[]);
/// assert!(results.is_empty());
/// # Ok::<(), scene_frame_lib::core::selection::SelectionError>(())
/// ```
pub struct SceneSequenceSelector {
    selector: SequenceSelector,
    stats: Mutex<SelectorStats>,
}

impl SceneSequenceSelector {
    pub fn create(
        config: SelectionConfig,
        scorers: &[Arc<dyn QualityScorer>],
    ) -> Result<Self, SelectionError> {
        crate::init_logging();
        let selector = SequenceSelector::new(config, scorers)?;
        info!("🎬 SceneSequenceSelector: created");
        Ok(Self {
            selector,
            stats: Mutex::new(SelectorStats::default()),
        })
    }

    /// 从 JSON5 配置文件创建
    pub fn from_config_file(
        path: impl AsRef<Path>,
        scorers: &[Arc<dyn QualityScorer>],
    ) -> Result<Self, SelectionError> {
        let path = path.as_ref();
        info!("📄 Loading selection config from {:?}", path);
        Self::create(SelectionConfig::from_file(path)?, scorers)
    }

    /// 逐场景顺序处理
    pub fn process(&self, frames: &[Frame], scenes: &[Scene]) -> Vec<SequenceResult> {
        let output = self.selector.select_with_stats(frames, scenes);
        self.record(&output.stats);
        output.results
    }

    /// 场景级并行处理，结果顺序与输入一致
    pub fn process_parallel(
        &self,
        frames: &[Frame],
        scenes: &[Scene],
    ) -> Result<Vec<SequenceResult>, SelectionError> {
        let SelectionOutput { results, stats } = self.selector.select_parallel(frames, scenes)?;
        self.record(&stats);
        Ok(results)
    }

    /// 取消正在进行的扫描
    pub fn cancel(&self) {
        info!("🛑 SceneSequenceSelector: cancellation requested");
        self.selector.cancellation_token().cancel();
    }

    pub fn config(&self) -> &SelectionConfig {
        self.selector.config()
    }

    pub fn stats(&self) -> SelectorStats {
        self.stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// 清空统计并撤销之前的取消请求
    pub fn reset(&self) {
        self.selector.reset_cancellation();
        if let Ok(mut stats) = self.stats.lock() {
            *stats = SelectorStats::default();
        }
    }

    fn record(&self, run: &SelectionStats) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.processed_scenes += run.scenes as u64;
            stats.sequences_found += run.sequences_found as u64;
            stats.frames_examined += run.frames_examined;
            stats.faulted_scenes += run.faulted_scenes as u64;
        }
    }
}

impl Drop for SceneSequenceSelector {
    fn drop(&mut self) {
        info!("🗑️ SceneSequenceSelector: released");
    }
}
