use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::{error, info};
use rayon::prelude::*;
use serde::Serialize;

use super::cancel::CancellationToken;
use super::classifier::FrameQualityClassifier;
use super::config::SelectionConfig;
use super::error::SelectionError;
use super::frame::Frame;
use super::metric::QualityScorer;
use super::result::SequenceResult;
use super::scanner::{ScanControl, ScanOutcome, ScanReport, SceneWindowScanner};
use super::scene::Scene;

/// 选帧统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStats {
    pub scenes: usize,
    pub sequences_found: usize,
    pub frames_examined: u64,
    pub faulted_scenes: usize,
    pub timed_out_scenes: usize,
    pub cancelled_scenes: usize,
}

impl SelectionStats {
    fn from_reports(reports: &[ScanReport]) -> Self {
        let count = |outcome: ScanOutcome| reports.iter().filter(|r| r.outcome == outcome).count();
        Self {
            scenes: reports.len(),
            sequences_found: count(ScanOutcome::Found),
            frames_examined: reports.iter().map(|r| r.frames_examined).sum(),
            faulted_scenes: count(ScanOutcome::Faulted),
            timed_out_scenes: count(ScanOutcome::TimedOut),
            cancelled_scenes: count(ScanOutcome::Cancelled),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectionOutput {
    pub results: Vec<SequenceResult>,
    pub stats: SelectionStats,
}

/// 逐场景选出第一段满足质量门限的连续帧
pub struct SequenceSelector {
    config: SelectionConfig,
    sequence_length: NonZeroUsize,
    classifier: FrameQualityClassifier,
    cancel: CancellationToken,
}

impl SequenceSelector {
    /// Validate `config` and bind its metrics to `scorers`. Nothing is scanned on failure.
    pub fn new(
        config: SelectionConfig,
        scorers: &[Arc<dyn QualityScorer>],
    ) -> Result<Self, SelectionError> {
        let classifier = FrameQualityClassifier::bind(&config, scorers)?;
        let sequence_length = NonZeroUsize::new(config.sequence_length)
            .ok_or(SelectionError::InvalidSequenceLength)?;
        let gates: Vec<String> = classifier.predicates().map(|p| p.to_string()).collect();
        info!(
            "🎬 SequenceSelector: sequence_length={}, min_variance={}, gates=[{}]",
            config.sequence_length,
            config.min_frame_variance,
            gates.join(", ")
        );
        Ok(Self {
            config,
            sequence_length,
            classifier,
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Token that stops scans in flight; already finished scenes keep their results.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Clear a previous cancellation so the selector can run again.
    pub fn reset_cancellation(&self) {
        self.cancel.reset();
    }

    pub fn select(&self, frames: &[Frame], scenes: &[Scene]) -> Vec<SequenceResult> {
        self.select_with_stats(frames, scenes).results
    }

    pub fn select_with_stats(&self, frames: &[Frame], scenes: &[Scene]) -> SelectionOutput {
        let reports: Vec<ScanReport> = scenes
            .iter()
            .map(|scene| self.scan_scene(scene, frames))
            .collect();
        self.collect(reports)
    }

    /// Scan scenes concurrently on a pool of `max_parallel_scenes` threads.
    ///
    /// Results come back in input order. Scorers backed by a single device
    /// should be wrapped with [`ScoringDevice::exclusive`](super::metric::ScoringDevice::exclusive).
    pub fn select_parallel(
        &self,
        frames: &[Frame],
        scenes: &[Scene],
    ) -> Result<SelectionOutput, SelectionError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_parallel_scenes)
            .build()
            .map_err(|e| SelectionError::ThreadPool(e.to_string()))?;

        let reports: Vec<ScanReport> = pool.install(|| {
            scenes
                .par_iter()
                .map(|scene| self.scan_scene(scene, frames))
                .collect()
        });
        Ok(self.collect(reports))
    }

    fn scan_scene(&self, scene: &Scene, frames: &[Frame]) -> ScanReport {
        let control = ScanControl {
            cancel: self.cancel.clone(),
            timeout: self.config.scene_timeout(),
        };
        let mut scanner = SceneWindowScanner::with_length(self.sequence_length);

        panic::catch_unwind(AssertUnwindSafe(|| {
            scanner.run(scene, frames, &self.classifier, &control)
        }))
        .unwrap_or_else(|payload| {
            error!(
                "❌ Scene {}: processing fault, reporting no sequence: {}",
                scene.scene_id,
                panic_message(payload.as_ref())
            );
            ScanReport::faulted(scene.scene_id, scanner.frames_examined())
        })
    }

    fn collect(&self, reports: Vec<ScanReport>) -> SelectionOutput {
        let stats = SelectionStats::from_reports(&reports);
        info!(
            "📊 Found sequences in {}/{} scenes ({} frames examined)",
            stats.sequences_found, stats.scenes, stats.frames_examined
        );
        SelectionOutput {
            results: reports.into_iter().map(|r| r.result).collect(),
            stats,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
