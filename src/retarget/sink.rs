use indexmap::IndexMap;

use crate::clip::{Clip, Curve, clip_from_curves};

/// Destination for rewritten curves.
///
/// A sink owns at most one curve per `(channel_path, component_index)` and
/// hands out that curve, creating an empty one when it does not exist yet.
pub trait CurveSink {
    fn curve_mut(&mut self, channel_path: &str, component_index: i32) -> &mut Curve;
}

/// In-memory action produced by retargeting.
///
/// Curves are kept in creation order and keyed by channel path and component.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetAction {
    pub name: String,
    pub frame_start: f64,
    pub frame_end: f64,
    curves: IndexMap<(String, i32), Curve>,
}

impl TargetAction {
    pub fn new(name: impl Into<String>, frame_start: f64, frame_end: f64) -> Self {
        Self {
            name: name.into(),
            frame_start,
            frame_end,
            curves: IndexMap::new(),
        }
    }

    pub fn curve(&self, channel_path: &str, component_index: i32) -> Option<&Curve> {
        self.curves.get(&(channel_path.to_string(), component_index))
    }

    pub fn curves(&self) -> impl Iterator<Item = &Curve> {
        self.curves.values()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Packs the action into a clip recorded against `target_skeleton_name`.
    pub fn into_clip(self, target_skeleton_name: &str) -> Clip {
        let name = self.name.clone();
        clip_from_curves(
            name.clone(),
            target_skeleton_name,
            name,
            (self.frame_start, self.frame_end),
            self.curves.into_values(),
        )
    }
}

impl CurveSink for TargetAction {
    fn curve_mut(&mut self, channel_path: &str, component_index: i32) -> &mut Curve {
        self.curves
            .entry((channel_path.to_string(), component_index))
            .or_insert_with(|| Curve::new(channel_path, component_index))
    }
}
