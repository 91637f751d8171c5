//! Trinity model description: the output side of a conversion.
//!
//! A converted model is split over several files (`.trpokecfg`, `.trmdl`,
//! `.trmsh`, `.trmbf`, `.trskl`, `.trmtr`, `.trmmt`). [`ModelBundle`] holds all
//! of them for one species; serialization to disk is left to a
//! [`BundleWriter`](crate::convert::bundle::BundleWriter).

use variantly::Variantly;

use crate::models::vertex_format::VertexLayout;
use crate::models::{BoundingBox, Sphere};

/// Per-species presentation settings (`.trpokecfg`).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PokeConfig {
    pub field_01: f32,
    pub field_02: f32,
    pub field_03: f32,
    pub field_10_y_offset: f32,
    pub field_11_y_offset: f32,
    pub field_12_y_offset: f32,
    pub size_index: u8,
    pub inframe_vertical_rot_y_origin: f32,
    pub inframe_bottom_y_offset: f32,
    pub inframe_center_y_offset: f32,
    pub inframe_left_rotation: [f32; 3],
    pub inframe_right_rotation: [f32; 3],
}

/// Model header (`.trmdl`): references to the other parts.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrModel {
    pub meshes: Vec<String>,
    pub skeleton: String,
    pub materials: Vec<String>,
    pub lods: Vec<Lod>,
    pub bounds: BoundingBox,
    pub sphere: Sphere,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lod {
    pub lod_type: String,
    /// Indices into [`TrModel::meshes`].
    pub entries: Vec<u32>,
}

/// Mesh description (`.trmsh`).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mesh {
    pub buffer_file_name: String,
    pub shapes: Vec<MeshShape>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexFormat {
    #[default]
    U16,
}

impl IndexFormat {
    pub fn size(self) -> usize {
        match self {
            IndexFormat::U16 => 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshShape {
    pub shape_name: String,
    pub mesh_name: String,
    pub layout: VertexLayout,
    pub bounds: BoundingBox,
    pub sphere: Sphere,
    pub index_format: IndexFormat,
    pub sub_meshes: Vec<SubMesh>,
}

/// A contiguous index range drawn with one material.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubMesh {
    pub index_count: u32,
    pub index_offset: u32,
    pub material: String,
}

/// Mesh buffers (`.trmbf`), parallel to [`Mesh::shapes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshBufferTable {
    pub buffers: Vec<MeshBuffer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshBuffer {
    pub index_buffer: Vec<u8>,
    pub vertex_buffer: Vec<u8>,
}

/// Skeleton (`.trskl`).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Skeleton {
    pub rig_offset: i32,
    pub nodes: Vec<TransformNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransformNode {
    pub name: String,
    pub transform: Transform,
    pub scale_pivot: [f32; 3],
    pub rotate_pivot: [f32; 3],
    pub parent_idx: i32,
    /// Dense index among skin-deforming nodes, -1 otherwise.
    pub rig_idx: i32,
    pub locator_bone: String,
    pub node_type: NodeType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub scale: [f32; 3],
    pub rotate: [f32; 3],
    pub translate: [f32; 3],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Variantly)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeType {
    #[default]
    Transform,
    Joint,
    Locator,
}

/// Material file (`.trmtr`).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    pub passes: Vec<MaterialPass>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialPass {
    pub name: String,
    pub shader_name: String,
    pub parameters: ShaderParameterSet,
    pub int_parameters: Vec<IntParameter>,
    pub alpha_type: String,
}

/// Named shader bindings for one material pass.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShaderParameterSet {
    pub flags: Vec<StringParameter>,
    pub floats: Vec<FloatParameter>,
    pub colors: Vec<Float4Parameter>,
    pub textures: Vec<TextureParameter>,
    pub samplers: Vec<SamplerState>,
}

impl ShaderParameterSet {
    pub fn flag(&self, name: &str) -> Option<&str> {
        self.flags
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.iter().find(|p| p.name == name).map(|p| p.value)
    }

    pub fn color(&self, name: &str) -> Option<[f32; 4]> {
        self.colors.iter().find(|p| p.name == name).map(|p| p.value)
    }

    pub fn texture(&self, name: &str) -> Option<&TextureParameter> {
        self.textures.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StringParameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloatParameter {
    pub name: String,
    pub value: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Float4Parameter {
    pub name: String,
    pub value: [f32; 4],
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntParameter {
    pub name: String,
    pub value: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureParameter {
    pub name: String,
    pub file: String,
    pub slot: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplerState {
    pub repeat_u: WrapMode,
    pub repeat_v: WrapMode,
    pub repeat_w: WrapMode,
    pub border_color: [f32; 4],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
    Mirror,
    Border,
}

/// Materials behind one [`MaterialTable`], parallel to its `file_names`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshMaterialSet {
    pub name: String,
    pub materials: Vec<Material>,
}

/// Material switch table (`.trmmt`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiMaterialTable {
    pub materials: Vec<MaterialTable>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialTable {
    pub name: String,
    pub file_names: Vec<String>,
    pub switches: Vec<MaterialSwitch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialSwitch {
    pub name: String,
    pub flags: u32,
}

/// Every output part of one converted model.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelBundle {
    pub species_id: u16,
    /// Result name, e.g. `pm0025_00_00`.
    pub name: String,
    pub config: PokeConfig,
    pub model: TrModel,
    pub material_table: MultiMaterialTable,
    pub meshes: Vec<Mesh>,
    /// Parallel to `meshes`.
    pub mesh_buffers: Vec<MeshBufferTable>,
    pub default_materials: Vec<Material>,
    pub mesh_materials: Vec<MeshMaterialSet>,
    pub skeleton: Skeleton,
}
