use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::error::{ScoreError, SelectionError};
use super::frame::Frame;

/// 阈值比较方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// score >= threshold（如 MUSIQ，越高越好）
    #[serde(alias = ">=")]
    AtLeast,
    /// score <= threshold（如 NIQE，越低越好）
    #[serde(alias = "<=")]
    AtMost,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::AtLeast => write!(f, ">="),
            Direction::AtMost => write!(f, "<="),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPredicate {
    pub name: String,
    pub direction: Direction,
    pub threshold: f64,
}

impl MetricPredicate {
    pub fn at_least(name: impl Into<String>, threshold: f64) -> Self {
        Self {
            name: name.into(),
            direction: Direction::AtLeast,
            threshold,
        }
    }

    pub fn at_most(name: impl Into<String>, threshold: f64) -> Self {
        Self {
            name: name.into(),
            direction: Direction::AtMost,
            threshold,
        }
    }

    pub fn holds(&self, score: f64) -> bool {
        match self.direction {
            Direction::AtLeast => score >= self.threshold,
            Direction::AtMost => score <= self.threshold,
        }
    }

    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.name.trim().is_empty() {
            return Err(SelectionError::EmptyMetricName);
        }
        if !self.threshold.is_finite() {
            return Err(SelectionError::InvalidThreshold {
                metric: self.name.clone(),
                threshold: self.threshold,
            });
        }
        Ok(())
    }
}

impl fmt::Display for MetricPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.direction, self.threshold)
    }
}

/// 外部感知质量打分器（无参考 IQA 模型等），对核心而言是黑盒
pub trait QualityScorer: Send + Sync {
    /// Metric name this scorer answers for; matched against `MetricPredicate::name`.
    fn name(&self) -> &str;

    fn score(&self, frame: &Frame) -> Result<f64, ScoreError>;
}

/// Adapts a plain closure into a scorer.
pub struct FnScorer<F> {
    name: String,
    func: F,
}

impl<F> FnScorer<F>
where
    F: Fn(&Frame) -> Result<f64, ScoreError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> QualityScorer for FnScorer<F>
where
    F: Fn(&Frame) -> Result<f64, ScoreError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, frame: &Frame) -> Result<f64, ScoreError> {
        (self.func)(frame)
    }
}

type ScorePattern = Box<dyn Fn(u64) -> Result<f64, ScoreError> + Send + Sync>;

pub struct MockScorer {
    name: String,
    // 按帧号返回模拟分数
    pattern: ScorePattern,
    calls: AtomicUsize,
}

impl MockScorer {
    pub fn constant(name: impl Into<String>, score: f64) -> Self {
        Self::with_pattern(name, move |_| Ok(score))
    }

    pub fn with_pattern<F>(name: impl Into<String>, pattern: F) -> Self
    where
        F: Fn(u64) -> Result<f64, ScoreError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            pattern: Box::new(pattern),
            calls: AtomicUsize::new(0),
        }
    }

    /// Scores `good` on the listed frames and `bad` everywhere else.
    pub fn with_fixed_frames(name: impl Into<String>, frames: Vec<u64>, good: f64, bad: f64) -> Self {
        Self::with_pattern(name, move |n| Ok(if frames.contains(&n) { good } else { bad }))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QualityScorer for MockScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, frame: &Frame) -> Result<f64, ScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.pattern)(frame.number)
    }
}

/// 单一加速器上的模型：所有打分调用经同一把锁串行执行
#[derive(Clone, Default)]
pub struct ScoringDevice {
    lock: Arc<Mutex<()>>,
}

impl ScoringDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `scorer` so its calls queue behind every other scorer on this device.
    pub fn exclusive(&self, scorer: Arc<dyn QualityScorer>) -> Arc<dyn QualityScorer> {
        Arc::new(ExclusiveScorer {
            inner: scorer,
            lock: Arc::clone(&self.lock),
        })
    }
}

struct ExclusiveScorer {
    inner: Arc<dyn QualityScorer>,
    lock: Arc<Mutex<()>>,
}

impl QualityScorer for ExclusiveScorer {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn score(&self, frame: &Frame) -> Result<f64, ScoreError> {
        // 前一次调用 panic 导致锁中毒时，设备本身仍可用
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.inner.score(frame)
    }
}
