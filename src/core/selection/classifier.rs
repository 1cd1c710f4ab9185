use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use super::config::SelectionConfig;
use super::error::{ScoreError, SelectionError};
use super::frame::Frame;
use super::metric::{MetricPredicate, QualityScorer};

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// 方差低于门限（空白/黑帧），未调用打分模型
    LowVariance { variance: f64 },
    BelowThreshold { metric: String, score: f64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::LowVariance { variance } => write!(f, "low variance {variance:.2}"),
            RejectReason::BelowThreshold { metric, score } => {
                write!(f, "{metric} score {score:.3} fails threshold")
            }
        }
    }
}

/// 单帧判定结果
#[derive(Debug, Clone, PartialEq)]
pub enum QualityVerdict {
    Accept,
    Reject(RejectReason),
    /// 打分失败，调用方按 Reject 处理
    Error(ScoreError),
}

impl QualityVerdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, QualityVerdict::Accept)
    }
}

/// 方差预筛 + 指标阈值判定
pub struct FrameQualityClassifier {
    gates: Vec<(MetricPredicate, Arc<dyn QualityScorer>)>,
    min_variance: f64,
}

impl FrameQualityClassifier {
    /// Bind each active predicate of `config` to the scorer of the same name.
    pub fn bind(
        config: &SelectionConfig,
        scorers: &[Arc<dyn QualityScorer>],
    ) -> Result<Self, SelectionError> {
        config.validate()?;
        let gates = config
            .active_predicates()?
            .into_iter()
            .map(|predicate| {
                scorers
                    .iter()
                    .find(|s| s.name() == predicate.name)
                    .map(|s| (predicate.clone(), Arc::clone(s)))
                    .ok_or(SelectionError::MissingScorer(predicate.name))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            gates,
            min_variance: config.min_frame_variance,
        })
    }

    pub fn predicates(&self) -> impl Iterator<Item = &MetricPredicate> {
        self.gates.iter().map(|(p, _)| p)
    }

    pub fn classify(&self, frame: &Frame) -> QualityVerdict {
        if frame.variance < self.min_variance {
            return QualityVerdict::Reject(RejectReason::LowVariance {
                variance: frame.variance,
            });
        }

        let mut first_failure = None;
        for (predicate, scorer) in &self.gates {
            let score = match scorer.score(frame) {
                Ok(score) if score.is_finite() => score,
                Ok(score) => {
                    let err = ScoreError::NonFinite {
                        metric: predicate.name.clone(),
                        score,
                    };
                    warn!("⚠️ Frame {}: {}", frame.number, err);
                    return QualityVerdict::Error(err);
                }
                Err(err) => {
                    warn!("⚠️ Frame {}: {} failed: {}", frame.number, predicate.name, err);
                    return QualityVerdict::Error(err);
                }
            };

            debug!("Frame {}: {} = {:.3}", frame.number, predicate.name, score);
            if first_failure.is_none() && !predicate.holds(score) {
                first_failure = Some(RejectReason::BelowThreshold {
                    metric: predicate.name.clone(),
                    score,
                });
            }
        }

        match first_failure {
            Some(reason) => QualityVerdict::Reject(reason),
            None => QualityVerdict::Accept,
        }
    }
}
