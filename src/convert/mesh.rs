//! Mesh restructuring: legacy mesh entries to Trinity mesh shapes and buffers.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::debug;

use crate::convert::attribute::{ColorPalettes, IdentityMapper, legacy_layout};
use crate::convert::vertex_buffer::{TranscodeError, transcode};
use crate::convert::{ConversionOptions, ModelNames};
use crate::models::Sphere;
use crate::models::gfb::{GfbMaterial, GfbModel, GfbPolygon, LegacyDataType};
use crate::models::trinity::{IndexFormat, Mesh, MeshBuffer, MeshBufferTable, MeshShape, SubMesh};
use crate::models::vertex_format::LayoutError;

static SKIN_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new("skin")
        .case_insensitive(true)
        .build()
        .expect("static pattern")
});

#[derive(Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("polygon {polygon} uses material {material_id}, but only {count} materials exist")]
    MaterialOutOfRange {
        polygon: usize,
        material_id: u32,
        count: usize,
    },
    #[error("mesh {mesh} references shape {shape_id}, which does not exist")]
    ShapeOutOfRange { mesh: usize, shape_id: u32 },
    #[error("mesh {mesh} references bone {bone_id}, which does not exist")]
    BoneOutOfRange { mesh: usize, bone_id: u32 },
    #[error("polygon {polygon} brings the index count to {count}, past what a u32 offset can address")]
    TooManyIndices { polygon: usize, count: usize },
    #[error("shape {shape}, element {element}: no vertex format for {count} x {data_type:?}")]
    FormatUnsupported {
        shape: u32,
        element: usize,
        data_type: LegacyDataType,
        count: u32,
    },
    #[error("shape {shape}: {source}")]
    Layout {
        shape: u32,
        #[source]
        source: LayoutError,
    },
    #[error("shape {shape}: {source}")]
    Transcode {
        shape: u32,
        #[source]
        source: TranscodeError,
    },
}

/// The shared index buffer of one shape and its per-material ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restructured {
    pub index_buffer: Vec<u8>,
    pub sub_meshes: Vec<SubMesh>,
}

/// Turn polygons into contiguous sub-meshes over one u16 index buffer.
pub fn restructure(
    polygons: &[GfbPolygon],
    materials: &[GfbMaterial],
) -> Result<Restructured, MeshError> {
    let mut sub_meshes = Vec::with_capacity(polygons.len());
    let mut index_buffer = Vec::new();
    let mut offset = 0u32;

    for (polygon_idx, polygon) in polygons.iter().enumerate() {
        let material = materials.get(polygon.material_id as usize).ok_or(
            MeshError::MaterialOutOfRange {
                polygon: polygon_idx,
                material_id: polygon.material_id,
                count: materials.len(),
            },
        )?;

        let index_count =
            u32::try_from(polygon.indices.len()).map_err(|_| MeshError::TooManyIndices {
                polygon: polygon_idx,
                count: polygon.indices.len(),
            })?;
        sub_meshes.push(SubMesh {
            index_count,
            index_offset: offset,
            material: material.name.clone(),
        });
        offset = offset
            .checked_add(index_count)
            .ok_or(MeshError::TooManyIndices {
                polygon: polygon_idx,
                count: offset as usize + polygon.indices.len(),
            })?;

        index_buffer.extend(polygon.indices.iter().flat_map(|idx| idx.to_le_bytes()));
    }

    Ok(Restructured {
        index_buffer,
        sub_meshes,
    })
}

/// Sub-mesh name derived from the owning bone's name.
pub fn sub_mesh_name(bone_name: &str, source_name: &str) -> String {
    let prefix = RegexBuilder::new(&format!("{}_", regex::escape(source_name)))
        .case_insensitive(true)
        .build();
    let name = match prefix {
        Ok(prefix) => prefix.replace_all(bone_name, "").into_owned(),
        Err(_) => bone_name.to_string(),
    };
    SKIN_MARKER.replace_all(&name, "").to_lowercase()
}

/// Output of the mesh stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertedMeshes {
    pub mesh: Mesh,
    pub buffers: MeshBufferTable,
    /// Vertex color palettes, parallel to `mesh.shapes`.
    pub palettes: Vec<ColorPalettes>,
}

/// Convert every legacy mesh entry into one Trinity mesh file.
pub fn convert_meshes(
    model: &GfbModel,
    names: &ModelNames,
    options: &ConversionOptions,
) -> Result<ConvertedMeshes, MeshError> {
    let mut out = ConvertedMeshes {
        mesh: Mesh {
            buffer_file_name: format!("{}.trmbf", names.result),
            shapes: Vec::with_capacity(model.meshes.len()),
        },
        ..Default::default()
    };

    for (mesh_idx, entry) in model.meshes.iter().enumerate() {
        let shape = model
            .shapes
            .get(entry.shape_id as usize)
            .ok_or(MeshError::ShapeOutOfRange {
                mesh: mesh_idx,
                shape_id: entry.shape_id,
            })?;
        let bone = model
            .bones
            .get(entry.bone_id as usize)
            .ok_or(MeshError::BoneOutOfRange {
                mesh: mesh_idx,
                bone_id: entry.bone_id,
            })?;

        let sub_name = sub_mesh_name(&bone.name, &names.source);

        let layout = legacy_layout(&shape.attributes).map_err(|source| match source {
            LayoutError::LegacyFormatUnsupported {
                element,
                data_type,
                count,
            } => MeshError::FormatUnsupported {
                shape: entry.shape_id,
                element,
                data_type,
                count,
            },
            source => MeshError::Layout {
                shape: entry.shape_id,
                source,
            },
        })?;
        let vertices = transcode(&shape.vertices, &layout, &IdentityMapper, options).map_err(
            |source| MeshError::Transcode {
                shape: entry.shape_id,
                source,
            },
        )?;
        let restructured = restructure(&shape.polygons, &model.materials)?;

        let bounds = entry.bounds.scaled(options.unit_scale());
        debug!(
            "mesh {mesh_idx} ({sub_name}): {} vertices, {} sub-meshes",
            vertices.vertex_count(),
            restructured.sub_meshes.len()
        );

        out.mesh.shapes.push(MeshShape {
            shape_name: format!("{}_{sub_name}_mesh_shape", names.result),
            mesh_name: format!("{}_{sub_name}_mesh", names.result),
            layout: vertices.layout,
            bounds,
            sphere: Sphere::from_bounds(&bounds),
            index_format: IndexFormat::U16,
            sub_meshes: restructured.sub_meshes,
        });
        out.buffers.buffers.push(MeshBuffer {
            index_buffer: restructured.index_buffer,
            vertex_buffer: vertices.data,
        });
        out.palettes.push(vertices.palettes);
    }

    Ok(out)
}
