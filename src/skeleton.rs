use std::path::Path;

use gltf::Gltf;
use tracing::debug;

use crate::error::{Error, FormatError, Result};

/// Anything that can report the ordered bone names of a skeleton.
pub trait SkeletonProvider {
    fn skeleton_name(&self) -> &str;

    fn bone_names(&self) -> Vec<&str>;
}

// ─── Plain bone lists ─────────────────────────────────────────────────────────

/// A named, flat list of bones with no hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoneList {
    pub name: String,
    pub bones: Vec<String>,
}

impl BoneList {
    pub fn new<S: AsRef<str>>(name: impl Into<String>, bones: &[S]) -> Self {
        Self {
            name: name.into(),
            bones: bones.iter().map(|bone| bone.as_ref().to_string()).collect(),
        }
    }

    /// Parses `"Hips, Spine,LeftArm"`, dropping blank entries.
    pub fn parse(name: impl Into<String>, comma_separated: &str) -> Self {
        Self {
            name: name.into(),
            bones: comma_separated
                .split(',')
                .map(str::trim)
                .filter(|bone| !bone.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
        }
    }
}

impl SkeletonProvider for BoneList {
    fn skeleton_name(&self) -> &str {
        &self.name
    }

    fn bone_names(&self) -> Vec<&str> {
        self.bones.iter().map(String::as_str).collect()
    }
}

// ─── Hierarchical skeleton ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
}

/// Bone hierarchy stored as an arena with parent indices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Skeleton {
    name: String,
    bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bones: Vec::new(),
        }
    }

    /// Appends a bone and returns its index. A parent index that does not
    /// refer to an already added bone makes the new bone a root.
    pub fn add_bone(&mut self, name: impl Into<String>, parent: Option<usize>) -> usize {
        let parent = parent.filter(|index| *index < self.bones.len());
        self.bones.push(Bone {
            name: name.into(),
            parent,
        });
        self.bones.len() - 1
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name == name)
    }

    pub fn roots(&self) -> Vec<usize> {
        (0..self.bones.len())
            .filter(|index| self.bones[*index].parent.is_none())
            .collect()
    }

    pub fn children(&self, index: usize) -> Vec<usize> {
        (0..self.bones.len())
            .filter(|child| self.bones[*child].parent == Some(index))
            .collect()
    }

    /// Every bone below `index` in depth-first pre-order, without `index`.
    pub fn descendants(&self, index: usize) -> Vec<usize> {
        let mut visited = vec![false; self.bones.len()];
        let mut result = Vec::new();
        let mut stack: Vec<usize> = self.children(index).into_iter().rev().collect();
        if let Some(seen) = visited.get_mut(index) {
            *seen = true;
        }

        while let Some(current) = stack.pop() {
            if std::mem::replace(&mut visited[current], true) {
                continue;
            }
            result.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }

        result
    }

    /// Reads a skeleton from a `.gltf` or `.glb` file.
    ///
    /// Uses the joints of the first skin. Files without a skin fall back to
    /// every named node. Parents are the nearest ancestor that is also part of
    /// the skeleton.
    pub fn from_gltf(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound {
                kind: "skeleton file",
                name: path.display().to_string(),
            });
        }

        let gltf = Gltf::open(path).map_err(FormatError::from)?;
        let document = &gltf.document;

        let node_count = document.nodes().count();
        let mut node_parent: Vec<Option<usize>> = vec![None; node_count];
        for node in document.nodes() {
            for child in node.children() {
                node_parent[child.index()] = Some(node.index());
            }
        }

        let fallback_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (name, members): (String, Vec<(usize, String)>) = match document.skins().next() {
            Some(skin) => (
                skin.name().map(ToOwned::to_owned).unwrap_or(fallback_name),
                skin.joints()
                    .map(|joint| {
                        let name = joint
                            .name()
                            .map(ToOwned::to_owned)
                            .unwrap_or_else(|| format!("joint_{}", joint.index()));
                        (joint.index(), name)
                    })
                    .collect(),
            ),
            None => (
                fallback_name,
                document
                    .nodes()
                    .filter_map(|node| node.name().map(|name| (node.index(), name.to_string())))
                    .collect(),
            ),
        };

        let mut arena_index: Vec<Option<usize>> = vec![None; node_count];
        for (position, (node_index, _)) in members.iter().enumerate() {
            arena_index[*node_index] = Some(position);
        }

        let bones = members
            .into_iter()
            .map(|(node_index, name)| {
                let mut ancestor = node_parent[node_index];
                let mut steps = 0;
                while let Some(candidate) = ancestor {
                    if arena_index[candidate].is_some() || steps > node_count {
                        break;
                    }
                    ancestor = node_parent[candidate];
                    steps += 1;
                }
                Bone {
                    name,
                    parent: ancestor.and_then(|candidate| arena_index[candidate]),
                }
            })
            .collect::<Vec<_>>();

        debug!(
            path = %path.display(),
            skeleton = %name,
            bones = bones.len(),
            "loaded glTF skeleton"
        );

        Ok(Self { name, bones })
    }
}

impl SkeletonProvider for Skeleton {
    fn skeleton_name(&self) -> &str {
        &self.name
    }

    fn bone_names(&self) -> Vec<&str> {
        self.bones.iter().map(|bone| bone.name.as_str()).collect()
    }
}
