use serde::{Deserialize, Serialize};

/// 单个场景的选帧结果：要么找到整段连续帧，要么为空，从不返回部分结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceResult {
    pub scene_id: u32,
    #[serde(rename = "sequence_found")]
    pub found: bool,
    pub selected_frames: Vec<u64>,
    #[serde(rename = "total_frames_selected")]
    pub total_selected: usize,
}

impl SequenceResult {
    pub fn found(scene_id: u32, selected_frames: Vec<u64>) -> Self {
        debug_assert!(!selected_frames.is_empty());
        Self {
            scene_id,
            found: true,
            total_selected: selected_frames.len(),
            selected_frames,
        }
    }

    pub fn not_found(scene_id: u32) -> Self {
        Self {
            scene_id,
            found: false,
            selected_frames: Vec::new(),
            total_selected: 0,
        }
    }

    /// First and last selected frame, when a run was found.
    pub fn selected_range(&self) -> Option<(u64, u64)> {
        match (self.selected_frames.first(), self.selected_frames.last()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        }
    }
}
