use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::cancel::CancellationToken;
use super::classifier::{FrameQualityClassifier, QualityVerdict};
use super::error::SelectionError;
use super::frame::Frame;
use super::result::SequenceResult;
use super::scene::Scene;
use super::tracker::RunTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAction {
    /// 合格帧已加入当前连续段
    Extend,
    /// 不合格/打分失败，连续段清空
    Reset,
    /// 连续段达到目标长度，停止扫描
    Complete,
}

/// 场景扫描结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Found,
    Exhausted,
    TimedOut,
    Cancelled,
    /// 打分后端 panic，在场景边界被捕获
    Faulted,
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub result: SequenceResult,
    pub outcome: ScanOutcome,
    pub frames_examined: u64,
}

impl ScanReport {
    /// `frames_examined` counts frames whose verdict was reached before the fault.
    pub fn faulted(scene_id: u32, frames_examined: u64) -> Self {
        Self {
            result: SequenceResult::not_found(scene_id),
            outcome: ScanOutcome::Faulted,
            frames_examined,
        }
    }
}

/// Per-scan limits: a shared cancellation token and an optional wall-clock budget.
#[derive(Debug, Clone, Default)]
pub struct ScanControl {
    pub cancel: CancellationToken,
    pub timeout: Option<Duration>,
}

/// 单个场景的连续帧扫描器，每个场景新建一个，不跨场景共享状态
pub struct SceneWindowScanner {
    state: ScanState,
    tracker: RunTracker,
    frames_examined: u64,
}

impl SceneWindowScanner {
    pub fn new(sequence_length: usize) -> Result<Self, SelectionError> {
        NonZeroUsize::new(sequence_length)
            .map(Self::with_length)
            .ok_or(SelectionError::InvalidSequenceLength)
    }

    pub fn with_length(sequence_length: NonZeroUsize) -> Self {
        Self {
            state: ScanState::Scanning,
            tracker: RunTracker::new(sequence_length),
            frames_examined: 0,
        }
    }

    pub fn frames_examined(&self) -> u64 {
        self.frames_examined
    }

    pub fn current_state(&self) -> ScanState {
        self.state
    }

    pub fn run_len(&self) -> usize {
        self.tracker.len()
    }

    /// Feed one classified frame. Frames arriving after completion are ignored.
    pub fn process_verdict(&mut self, frame_number: u64, verdict: &QualityVerdict) -> ScanAction {
        if self.state == ScanState::Completed {
            return ScanAction::Complete;
        }
        self.frames_examined += 1;

        match verdict {
            QualityVerdict::Accept => {
                if self.tracker.push(frame_number) {
                    self.state = ScanState::Completed;
                    ScanAction::Complete
                } else {
                    ScanAction::Extend
                }
            }
            QualityVerdict::Reject(reason) => {
                if !self.tracker.is_empty() {
                    debug!(
                        "Frame {}: {}, dropping run of {}",
                        frame_number,
                        reason,
                        self.tracker.len()
                    );
                }
                self.tracker.clear();
                ScanAction::Reset
            }
            QualityVerdict::Error(err) => {
                debug!("Frame {}: scoring error treated as reject: {}", frame_number, err);
                self.tracker.clear();
                ScanAction::Reset
            }
        }
    }

    pub fn scan(
        mut self,
        scene: &Scene,
        frames: &[Frame],
        classifier: &FrameQualityClassifier,
        control: &ScanControl,
    ) -> ScanReport {
        self.run(scene, frames, classifier, control)
    }

    /// Scan in place so the caller still owns the scanner if a scorer panics.
    pub(super) fn run(
        &mut self,
        scene: &Scene,
        frames: &[Frame],
        classifier: &FrameQualityClassifier,
        control: &ScanControl,
    ) -> ScanReport {
        let available = frames.len() as u64;
        let target = self.tracker.capacity();
        info!(
            "🔍 Scene {} (frames {}-{})",
            scene.scene_id, scene.start_frame, scene.end_frame
        );

        let Some(range) = scene.clipped_range(available) else {
            debug!("Scene {}: no frames available", scene.scene_id);
            return self.finish(scene, ScanOutcome::Exhausted);
        };
        if scene.clipped_len(available) < target as u64 {
            debug!(
                "Scene {}: {} frames cannot hold a run of {}",
                scene.scene_id,
                scene.clipped_len(available),
                target
            );
            return self.finish(scene, ScanOutcome::Exhausted);
        }

        let started = Instant::now();
        for frame_number in range {
            if control.cancel.is_cancelled() {
                return self.finish(scene, ScanOutcome::Cancelled);
            }
            if control.timeout.is_some_and(|limit| started.elapsed() >= limit) {
                warn!("⏱️ Scene {}: timed out at frame {}", scene.scene_id, frame_number);
                return self.finish(scene, ScanOutcome::TimedOut);
            }

            let frame = &frames[(frame_number - 1) as usize];
            debug_assert_eq!(
                frame.number, frame_number,
                "frame store must be densely numbered from 1"
            );
            let verdict = classifier.classify(frame);
            if self.process_verdict(frame_number, &verdict) == ScanAction::Complete {
                return self.finish(scene, ScanOutcome::Found);
            }
        }

        self.finish(scene, ScanOutcome::Exhausted)
    }

    fn finish(&mut self, scene: &Scene, outcome: ScanOutcome) -> ScanReport {
        let result = if outcome == ScanOutcome::Found {
            let run = self.tracker.take();
            info!(
                "✅ Scene {}: found {} consecutive frames ({}-{})",
                scene.scene_id,
                run.len(),
                run.first().copied().unwrap_or_default(),
                run.last().copied().unwrap_or_default()
            );
            SequenceResult::found(scene.scene_id, run)
        } else {
            info!(
                "⚠️ Scene {}: no sequence ({:?}, partial run of {} discarded)",
                scene.scene_id,
                outcome,
                self.tracker.len()
            );
            SequenceResult::not_found(scene.scene_id)
        };
        self.state = ScanState::Completed;

        ScanReport {
            result,
            outcome,
            frames_examined: self.frames_examined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::classifier::RejectReason;
    use crate::core::selection::config::SelectionConfig;
    use crate::core::selection::error::ScoreError;
    use crate::core::selection::metric::{MockScorer, QualityScorer};
    use std::sync::Arc;

    const GOOD: f64 = 2.0;
    const BAD: f64 = 9.0;

    fn textured_frames(count: u64) -> Vec<Frame> {
        (1..=count)
            .map(|n| {
                let data = (0..48u32).map(|i| (i * 5) as u8).collect();
                Frame::from_rgb(4, 4, data, n)
            })
            .collect()
    }

    fn classifier_for(scorer: Arc<MockScorer>, sequence_length: usize) -> FrameQualityClassifier {
        let config = SelectionConfig {
            sequence_length,
            ..SelectionConfig::niqe_only()
        };
        let scorers: Vec<Arc<dyn QualityScorer>> = vec![scorer];
        FrameQualityClassifier::bind(&config, &scorers).unwrap()
    }

    fn scan(scene: Scene, frames: &[Frame], scorer: Arc<MockScorer>, len: usize) -> ScanReport {
        let classifier = classifier_for(scorer, len);
        SceneWindowScanner::new(len).unwrap().scan(&scene, frames, &classifier, &ScanControl::default())
    }

    fn reject() -> QualityVerdict {
        QualityVerdict::Reject(RejectReason::BelowThreshold {
            metric: "niqe".into(),
            score: BAD,
        })
    }

    #[test]
    fn test_scanning_to_completed() {
        let mut scanner = SceneWindowScanner::new(2).unwrap();
        assert_eq!(scanner.current_state(), ScanState::Scanning);

        assert_eq!(scanner.process_verdict(1, &QualityVerdict::Accept), ScanAction::Extend);
        assert_eq!(scanner.process_verdict(2, &QualityVerdict::Accept), ScanAction::Complete);
        assert_eq!(scanner.current_state(), ScanState::Completed);
    }

    #[test]
    fn test_reject_and_error_reset_run() {
        let mut scanner = SceneWindowScanner::new(5).unwrap();
        scanner.process_verdict(1, &QualityVerdict::Accept);
        scanner.process_verdict(2, &QualityVerdict::Accept);
        assert_eq!(scanner.process_verdict(3, &reject()), ScanAction::Reset);
        assert_eq!(scanner.run_len(), 0);

        scanner.process_verdict(4, &QualityVerdict::Accept);
        let err = QualityVerdict::Error(ScoreError::Backend("boom".into()));
        assert_eq!(scanner.process_verdict(5, &err), ScanAction::Reset);
        assert_eq!(scanner.run_len(), 0);
        assert_eq!(scanner.current_state(), ScanState::Scanning);
    }

    #[test]
    fn test_first_qualifying_run_wins() {
        // A,A,R,A,A,A,R,... → [4,5,6]
        let scorer = Arc::new(MockScorer::with_fixed_frames(
            "niqe",
            vec![1, 2, 4, 5, 6, 8, 9, 10, 11],
            GOOD,
            BAD,
        ));
        let frames = textured_frames(20);
        let report = scan(Scene::new(1, 1, 20), &frames, scorer.clone(), 3);

        assert!(report.result.found);
        assert_eq!(report.result.selected_frames, vec![4, 5, 6]);
        assert_eq!(report.outcome, ScanOutcome::Found);
        // 找到后不再检查后续帧
        assert_eq!(scorer.call_count(), 6);
        assert_eq!(report.frames_examined, 6);
    }

    #[test]
    fn test_partial_run_is_never_reported() {
        let scorer = Arc::new(MockScorer::with_pattern("niqe", |n| {
            Ok(if n == 3 { BAD } else { GOOD })
        }));
        let frames = textured_frames(6);
        let report = scan(Scene::new(1, 1, 6), &frames, scorer, 4);

        assert!(!report.result.found);
        assert!(report.result.selected_frames.is_empty());
        assert_eq!(report.outcome, ScanOutcome::Exhausted);
    }

    #[test]
    fn test_scoring_fault_restarts_run_after_fault() {
        let scorer = Arc::new(MockScorer::with_pattern("niqe", |n| {
            if n == 3 {
                Err(ScoreError::Backend("transient".into()))
            } else {
                Ok(GOOD)
            }
        }));
        let frames = textured_frames(10);
        let report = scan(Scene::new(1, 1, 10), &frames, scorer, 3);
        assert_eq!(report.result.selected_frames, vec![4, 5, 6]);
    }

    #[test]
    fn test_low_variance_scene_never_scores() {
        let scorer = Arc::new(MockScorer::constant("niqe", GOOD));
        let frames: Vec<Frame> = (1..=10)
            .map(|n| Frame::from_rgb(4, 4, vec![3u8; 48], n))
            .collect();
        let report = scan(Scene::new(1, 1, 10), &frames, scorer.clone(), 3);

        assert!(!report.result.found);
        assert!(report.result.selected_frames.is_empty());
        assert_eq!(scorer.call_count(), 0);
    }

    #[test]
    fn test_end_frame_clipped_to_available() {
        let scorer = Arc::new(MockScorer::constant("niqe", GOOD));
        let frames = textured_frames(8);
        let report = scan(Scene::new(1, 5, 40), &frames, scorer.clone(), 4);

        assert_eq!(report.result.selected_frames, vec![5, 6, 7, 8]);
        assert_eq!(scorer.call_count(), 4);
    }

    #[test]
    fn test_sequence_longer_than_scene_not_found() {
        let scorer = Arc::new(MockScorer::constant("niqe", GOOD));
        let frames = textured_frames(30);
        let report = scan(Scene::new(1, 1, 5), &frames, scorer, 6);
        assert!(!report.result.found);
        assert!(report.result.selected_frames.is_empty());
    }

    #[test]
    fn test_scene_beyond_available_frames() {
        let scorer = Arc::new(MockScorer::constant("niqe", GOOD));
        let frames = textured_frames(10);
        let report = scan(Scene::new(2, 20, 30), &frames, scorer.clone(), 1);
        assert!(!report.result.found);
        assert_eq!(scorer.call_count(), 0);
    }

    #[test]
    fn test_cancelled_scan_reports_not_found() {
        let scorer = Arc::new(MockScorer::constant("niqe", GOOD));
        let classifier = classifier_for(scorer, 3);
        let control = ScanControl::default();
        control.cancel.cancel();

        let frames = textured_frames(10);
        let scanner = SceneWindowScanner::new(3).unwrap();
        let report = scanner.scan(&Scene::new(1, 1, 10), &frames, &classifier, &control);
        assert_eq!(report.outcome, ScanOutcome::Cancelled);
        assert!(!report.result.found);
    }

    #[test]
    fn test_timed_out_scan_reports_not_found() {
        let scorer = Arc::new(MockScorer::with_pattern("niqe", |_| {
            std::thread::sleep(Duration::from_millis(5));
            Ok(BAD)
        }));
        let classifier = classifier_for(scorer, 3);
        let control = ScanControl {
            timeout: Some(Duration::from_millis(1)),
            ..Default::default()
        };

        let frames = textured_frames(50);
        let scanner = SceneWindowScanner::new(3).unwrap();
        let report = scanner.scan(&Scene::new(1, 1, 50), &frames, &classifier, &control);
        assert_eq!(report.outcome, ScanOutcome::TimedOut);
        assert!(report.frames_examined < 50);
    }

    #[test]
    fn test_zero_sequence_length_rejected() {
        assert!(matches!(
            SceneWindowScanner::new(0),
            Err(SelectionError::InvalidSequenceLength)
        ));
    }

    #[test]
    fn test_single_frame_run_is_not_empty() {
        let scorer = Arc::new(MockScorer::constant("niqe", GOOD));
        let frames = textured_frames(5);
        let report = scan(Scene::new(1, 1, 5), &frames, scorer, 1);
        assert!(report.result.found);
        assert_eq!(report.result.selected_frames, vec![1]);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "densely numbered")]
    fn test_sparse_frame_store_detected() {
        let scorer = Arc::new(MockScorer::constant("niqe", GOOD));
        let mut frames = textured_frames(5);
        frames[2].number = 30;
        scan(Scene::new(1, 1, 5), &frames, scorer, 5);
    }
}
