//! 结果汇总：供报告组装和帧导出等下游组件使用，本模块不写文件

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::error::SelectionError;
use super::result::SequenceResult;
use super::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectedRange {
    pub start_frame: u64,
    pub end_frame: u64,
    pub total_selected: usize,
}

/// 场景元数据 + 选帧标记
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSelection {
    #[serde(flatten)]
    pub scene: Scene,
    pub frames_selected: bool,
    pub selected_frame_range: Option<SelectedRange>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionSummary {
    pub total_scenes: usize,
    pub total_scenes_with_sequences: usize,
    pub total_frames_selected: usize,
}

impl SelectionSummary {
    pub fn from_results(results: &[SequenceResult]) -> Self {
        Self {
            total_scenes: results.len(),
            total_scenes_with_sequences: results.iter().filter(|r| r.found).count(),
            total_frames_selected: results.iter().map(|r| r.total_selected).sum(),
        }
    }
}

/// Attach each scene's selection by `scene_id`. Scenes without a result are marked unselected.
pub fn annotate_scenes(scenes: &[Scene], results: &[SequenceResult]) -> Vec<SceneSelection> {
    scenes
        .iter()
        .map(|scene| {
            let range = results
                .iter()
                .find(|r| r.scene_id == scene.scene_id)
                .and_then(|r| {
                    r.selected_range().map(|(start_frame, end_frame)| SelectedRange {
                        start_frame,
                        end_frame,
                        total_selected: r.total_selected,
                    })
                });
            SceneSelection {
                scene: *scene,
                frames_selected: range.is_some(),
                selected_frame_range: range,
            }
        })
        .collect()
}

/// Selected frame number → owning scene, so an exporter can decode the video in one pass.
pub fn export_index(results: &[SequenceResult]) -> BTreeMap<u64, u32> {
    results
        .iter()
        .flat_map(|r| r.selected_frames.iter().map(move |&frame| (frame, r.scene_id)))
        .collect()
}

/// Relative output path for an exported frame: `scene_07/frame_000123.png`.
pub fn export_file_name(scene_id: u32, frame_number: u64) -> PathBuf {
    PathBuf::from(format!("scene_{scene_id:02}")).join(format!("frame_{frame_number:06}.png"))
}

pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, SelectionError> {
    Ok(serde_json::to_string_pretty(value)?)
}
