use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// 场景：外部镜头切分器给出的连续帧区间（1-based，闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub scene_id: u32,
    /// 切分器给出的时间边界（秒，保留两位小数）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_seconds: Option<f64>,
    pub start_frame: u64,
    pub end_frame: u64,
    pub frame_count: u64,
}

impl Scene {
    pub fn new(scene_id: u32, start_frame: u64, end_frame: u64) -> Self {
        Self {
            scene_id,
            start_time_seconds: None,
            end_time_seconds: None,
            start_frame,
            end_frame,
            frame_count: (end_frame + 1).saturating_sub(start_frame),
        }
    }

    /// Convert detector time boundaries into frame numbers (truncating `seconds * fps`).
    pub fn from_seconds(scene_id: u32, start_secs: f64, end_secs: f64, fps: f64) -> Self {
        let to_frame = |secs: f64| (secs * fps).max(0.0) as u64;
        let round2 = |secs: f64| (secs * 100.0).round() / 100.0;
        Self {
            start_time_seconds: Some(round2(start_secs)),
            end_time_seconds: Some(round2(end_secs)),
            ..Self::new(scene_id, to_frame(start_secs), to_frame(end_secs))
        }
    }

    /// Frames that actually exist for this scene, given `available` decoded frames.
    ///
    /// The end is clipped silently; a start of 0 counts as frame 1.
    pub fn clipped_range(&self, available: u64) -> Option<RangeInclusive<u64>> {
        let start = self.start_frame.max(1);
        let end = self.end_frame.min(available);
        (start <= end).then_some(start..=end)
    }

    pub fn clipped_len(&self, available: u64) -> u64 {
        self.clipped_range(available)
            .map(|r| r.end() - r.start() + 1)
            .unwrap_or(0)
    }
}

/// 把 (start, end) 秒数边界列表编号为场景，scene_id 从 1 开始
pub fn scenes_from_boundaries(boundaries: &[(f64, f64)], fps: f64) -> Vec<Scene> {
    boundaries
        .iter()
        .enumerate()
        .map(|(i, &(start, end))| Scene::from_seconds(i as u32 + 1, start, end, fps))
        .collect()
}
