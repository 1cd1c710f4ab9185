use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::SelectionError;
use super::metric::MetricPredicate;

/// 启用哪些指标
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricMode {
    /// 所有配置的指标都必须满足
    #[default]
    All,
    /// 只使用一个指标（如 NIQE-only）
    Only(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub sequence_length: usize,
    pub min_frame_variance: f64,
    pub metrics: Vec<MetricPredicate>,
    pub mode: MetricMode,
    pub max_parallel_scenes: usize,
    pub scene_timeout_ms: Option<u64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            sequence_length: 15,
            min_frame_variance: 10.0,
            metrics: vec![
                MetricPredicate::at_least("musiq", 35.0),
                MetricPredicate::at_most("niqe", 6.0),
            ],
            mode: MetricMode::All,
            max_parallel_scenes: num_cpus::get().clamp(1, 4),
            scene_timeout_ms: None,
        }
    }
}

impl SelectionConfig {
    pub fn niqe_only() -> Self {
        Self {
            mode: MetricMode::Only("niqe".to_string()),
            ..Default::default()
        }
    }

    pub fn strict() -> Self {
        Self {
            sequence_length: 24,
            min_frame_variance: 15.0,
            metrics: vec![
                MetricPredicate::at_least("musiq", 45.0),
                MetricPredicate::at_most("niqe", 5.0),
            ],
            ..Default::default()
        }
    }

    /// Parse JSON5 text; fields left out keep their defaults.
    pub fn from_json5_str(text: &str) -> Result<Self, SelectionError> {
        let config: Self =
            json5::from_str(text).map_err(|e| SelectionError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SelectionError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json5_str(&text)
    }

    pub fn scene_timeout(&self) -> Option<Duration> {
        self.scene_timeout_ms.map(Duration::from_millis)
    }

    /// Predicates in effect for the configured mode.
    pub fn active_predicates(&self) -> Result<Vec<MetricPredicate>, SelectionError> {
        match &self.mode {
            MetricMode::All => Ok(self.metrics.clone()),
            MetricMode::Only(name) => self
                .metrics
                .iter()
                .find(|p| &p.name == name)
                .cloned()
                .map(|p| vec![p])
                .ok_or_else(|| SelectionError::UnknownMetric(name.clone())),
        }
    }

    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.sequence_length == 0 {
            return Err(SelectionError::InvalidSequenceLength);
        }
        if !self.min_frame_variance.is_finite() || self.min_frame_variance < 0.0 {
            return Err(SelectionError::InvalidMinVariance(self.min_frame_variance));
        }
        if self.max_parallel_scenes == 0 {
            return Err(SelectionError::InvalidParallelism);
        }
        for predicate in &self.metrics {
            predicate.validate()?;
        }
        if self.active_predicates()?.is_empty() {
            return Err(SelectionError::NoMetrics);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::metric::Direction;

    #[test]
    fn test_default_config_is_valid() {
        let config = SelectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sequence_length, 15);
        assert_eq!(config.active_predicates().unwrap().len(), 2);
    }

    #[test]
    fn test_niqe_only_selects_one_predicate() {
        let predicates = SelectionConfig::niqe_only().active_predicates().unwrap();
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].name, "niqe");
        assert_eq!(predicates[0].direction, Direction::AtMost);
    }

    #[test]
    fn test_zero_sequence_length_rejected() {
        let config = SelectionConfig {
            sequence_length: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SelectionError::InvalidSequenceLength)
        ));
    }

    #[test]
    fn test_empty_metrics_rejected() {
        let config = SelectionConfig {
            metrics: vec![],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SelectionError::NoMetrics)));
    }

    #[test]
    fn test_unknown_only_metric_rejected() {
        let config = SelectionConfig {
            mode: MetricMode::Only("brisque".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SelectionError::UnknownMetric(name)) if name == "brisque"
        ));
    }

    #[test]
    fn test_negative_variance_rejected() {
        let config = SelectionConfig {
            min_frame_variance: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SelectionError::InvalidMinVariance(_))
        ));
    }

    #[test]
    fn test_json5_partial_config() {
        let text = r#"{
            // 只覆盖部分字段
            sequence_length: 5,
            mode: { only: "niqe" },
            scene_timeout_ms: 2000,
        }"#;
        let config = SelectionConfig::from_json5_str(text).unwrap();
        assert_eq!(config.sequence_length, 5);
        assert_eq!(config.min_frame_variance, 10.0);
        assert_eq!(config.mode, MetricMode::Only("niqe".to_string()));
        assert_eq!(config.scene_timeout(), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn test_json5_invalid_config_fails_fast() {
        let result = SelectionConfig::from_json5_str("{ sequence_length: 0 }");
        assert!(matches!(result, Err(SelectionError::InvalidSequenceLength)));

        let result = SelectionConfig::from_json5_str("{ sequence_length: ");
        assert!(matches!(result, Err(SelectionError::ConfigParse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = SelectionConfig::from_file("/nonexistent/selection.json5");
        assert!(matches!(result, Err(SelectionError::Io(_))));
    }
}
