//! Skeleton conversion.
//!
//! Legacy skeletons list every bone, including transparency groups that are
//! not part of the hierarchy. Trinity skeletons drop those, number the
//! skin-deforming bones densely (`rig_idx`), and record where the rig starts
//! relative to the reserved root nodes.

use thiserror::Error;
use tracing::{debug, warn};
use variantly::Variantly;

use crate::convert::ConversionOptions;
use crate::models::gfb::{GfbBone, GfbBoneType};
use crate::models::trinity::{NodeType, Skeleton, Transform, TransformNode};

#[derive(Debug, Error, PartialEq)]
pub enum SkeletonError {
    #[error("skeleton has no visible bone, so nothing can be skinned")]
    NotRigged,
}

/// How parent references are written after transparency groups are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Variantly)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParentIndexPolicy {
    /// Keep the legacy indices as-is. They keep pointing into the unfiltered
    /// bone list.
    #[default]
    Preserve,
    /// Rewrite indices into the filtered node list. References to a dropped
    /// bone move up to its nearest kept ancestor.
    Renumber,
}

fn node_type(bone_type: GfbBoneType) -> NodeType {
    match bone_type {
        GfbBoneType::HasSkinning => NodeType::Joint,
        GfbBoneType::NoSkinning | GfbBoneType::TransparencyGroup => NodeType::Transform,
    }
}

/// Index each legacy bone ends up at, or `None` if it is dropped.
fn kept_indices(bones: &[GfbBone]) -> Vec<Option<i32>> {
    let mut next = 0i32;
    bones
        .iter()
        .map(|bone| {
            if bone.bone_type == GfbBoneType::TransparencyGroup {
                None
            } else {
                next += 1;
                Some(next - 1)
            }
        })
        .collect()
}

/// Walk up from `parent` until a kept bone is found.
fn renumbered_parent(bones: &[GfbBone], new_index: &[Option<i32>], mut parent: i32) -> i32 {
    // Bounded by the bone count so a cyclic hierarchy cannot loop forever.
    for _ in 0..bones.len() {
        let Ok(idx) = usize::try_from(parent) else {
            return -1;
        };
        match new_index.get(idx) {
            Some(Some(kept)) => return *kept,
            Some(None) => parent = bones[idx].parent_idx,
            None => return -1,
        }
    }
    -1
}

pub fn convert_skeleton(
    bones: &[GfbBone],
    options: &ConversionOptions,
) -> Result<Skeleton, SkeletonError> {
    let new_index = kept_indices(bones);
    let mut nodes = Vec::with_capacity(bones.len());
    let mut rig_idx = 0i32;
    let mut rig_start: Option<usize> = None;

    for (idx, bone) in bones.iter().enumerate() {
        if bone.bone_type == GfbBoneType::TransparencyGroup {
            continue;
        }

        let parent_idx = match options.parent_policy() {
            ParentIndexPolicy::Preserve => {
                let dangling = usize::try_from(bone.parent_idx)
                    .ok()
                    .is_some_and(|p| new_index.get(p).is_none_or(Option::is_none));
                if dangling {
                    warn!(
                        "bone {} keeps parent index {} which does not name a kept node",
                        bone.name, bone.parent_idx
                    );
                }
                bone.parent_idx
            }
            ParentIndexPolicy::Renumber => renumbered_parent(bones, &new_index, bone.parent_idx),
        };

        let node_rig_idx = if bone.is_visible {
            if rig_start.is_none() {
                rig_start = Some(idx);
            }
            rig_idx += 1;
            rig_idx - 1
        } else {
            -1
        };

        nodes.push(TransformNode {
            name: bone.name.clone(),
            transform: Transform {
                scale: bone.scale,
                rotate: bone.rotation,
                translate: bone.translation.map(|c| c / options.unit_scale()),
            },
            scale_pivot: bone.scale_pivot,
            rotate_pivot: bone.rotate_pivot,
            parent_idx,
            rig_idx: node_rig_idx,
            locator_bone: String::new(),
            node_type: node_type(bone.bone_type),
        });
    }

    let rig_start = rig_start.ok_or(SkeletonError::NotRigged)?;
    let rig_offset = rig_start as i32 - options.reserved_root_nodes() as i32;
    debug!(
        "skeleton: {} nodes, {rig_idx} rigged, rig offset {rig_offset}",
        nodes.len()
    );

    Ok(Skeleton { rig_offset, nodes })
}
