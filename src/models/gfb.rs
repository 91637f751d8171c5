//! Legacy GFB model description: the input side of a conversion.
//!
//! These types mirror what a legacy `.gfbmdl` / `.gfbpokecfg` pair holds once
//! the flatbuffer layer has been stripped away. Vertex data stays raw; its
//! layout is described by [`LegacyVertexAttribute`] entries in storage order.

use crate::models::BoundingBox;

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GfbModel {
    pub config: GfbConfig,
    pub texture_files: Vec<String>,
    pub materials: Vec<GfbMaterial>,
    pub meshes: Vec<GfbMesh>,
    pub shapes: Vec<GfbShape>,
    pub bones: Vec<GfbBone>,
    pub bounds: BoundingBox,
}

/// Per-species presentation settings.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GfbConfig {
    pub species_id: u16,
    pub size_index: u8,
    pub inframe_vertical_rot_y_origin: f32,
    pub inframe_bottom_y_offset: f32,
    pub inframe_center_y_offset: f32,
    pub inframe_left_rotation: [f32; 3],
    pub inframe_right_rotation: [f32; 3],
}

/// Binds one shape to the bone it hangs off.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GfbMesh {
    pub shape_id: u32,
    pub bone_id: u32,
    pub bounds: BoundingBox,
    pub sort_priority: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GfbShape {
    /// Interleaved vertex records, `stride` bytes each.
    pub vertices: Vec<u8>,
    pub attributes: Vec<LegacyVertexAttribute>,
    pub polygons: Vec<GfbPolygon>,
}

/// A run of triangle-list indices drawn with one material.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GfbPolygon {
    pub material_id: u32,
    pub indices: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LegacyAttributeType {
    Position,
    Normal,
    Tangent,
    Binormal,
    Texcoord0,
    Texcoord1,
    Texcoord2,
    Texcoord3,
    Color0,
    Color1,
    Color2,
    Color3,
    GroupIdx,
    GroupWeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LegacyDataType {
    Float,
    HalfFloat,
    UByte,
    Byte,
    UShort,
    Short,
    FixedPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegacyVertexAttribute {
    pub attribute_type: LegacyAttributeType,
    pub data_type: LegacyDataType,
    /// Component count.
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GfbBoneType {
    #[default]
    NoSkinning,
    HasSkinning,
    /// Groups meshes for transparency sorting; not part of the skeleton.
    TransparencyGroup,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GfbBone {
    pub name: String,
    pub bone_type: GfbBoneType,
    /// Index into the full bone list, -1 for roots.
    pub parent_idx: i32,
    pub is_visible: bool,
    pub scale: [f32; 3],
    pub rotation: [f32; 3],
    pub translation: [f32; 3],
    pub scale_pivot: [f32; 3],
    pub rotate_pivot: [f32; 3],
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GfbMaterial {
    pub name: String,
    pub shader_name: String,
    pub flags: Vec<GfbFlag>,
    pub values: Vec<GfbFloatParam>,
    pub colors: Vec<GfbColorParam>,
    pub textures: Vec<GfbTexture>,
    pub cast_shadow: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GfbFlag {
    pub name: String,
    pub enable: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GfbFloatParam {
    pub name: String,
    pub value: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GfbColorParam {
    pub name: String,
    /// Absent in some assets.
    #[cfg_attr(feature = "serde", serde(default))]
    pub color: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GfbTexture {
    pub sampler_name: String,
    /// Index into [`GfbModel::texture_files`].
    pub texture_index: u32,
    pub settings: GfbSamplerSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GfbSamplerSettings {
    pub repeat_u: LegacyWrapMode,
    pub repeat_v: LegacyWrapMode,
    pub repeat_w: LegacyWrapMode,
    pub border_color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LegacyWrapMode {
    #[default]
    Wrap,
    Clamp,
    Mirror,
    Border,
}

impl GfbModel {
    pub fn texture_file(&self, index: u32) -> Option<&str> {
        self.texture_files.get(index as usize).map(String::as_str)
    }
}

impl GfbShape {
    /// Total size in bytes of one vertex record, assuming the natural
    /// component widths of each attribute.
    pub fn legacy_stride(&self) -> usize {
        self.attributes
            .iter()
            .map(|attr| attr.data_type.width() * attr.count as usize)
            .sum()
    }
}

impl LegacyDataType {
    /// Width of a single component in bytes.
    pub fn width(self) -> usize {
        match self {
            LegacyDataType::Float => 4,
            LegacyDataType::HalfFloat | LegacyDataType::UShort | LegacyDataType::Short => 2,
            LegacyDataType::UByte | LegacyDataType::Byte | LegacyDataType::FixedPoint => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(
        attribute_type: LegacyAttributeType,
        data_type: LegacyDataType,
        count: u32,
    ) -> LegacyVertexAttribute {
        LegacyVertexAttribute {
            attribute_type,
            data_type,
            count,
        }
    }

    #[test]
    fn test_legacy_stride() {
        let shape = GfbShape {
            attributes: vec![
                attr(LegacyAttributeType::Position, LegacyDataType::Float, 3),
                attr(LegacyAttributeType::Normal, LegacyDataType::HalfFloat, 4),
                attr(LegacyAttributeType::Color0, LegacyDataType::FixedPoint, 4),
                attr(LegacyAttributeType::GroupWeight, LegacyDataType::UShort, 4),
            ],
            ..Default::default()
        };
        assert_eq!(shape.legacy_stride(), 12 + 8 + 4 + 8);
    }

    #[test]
    fn test_texture_file_lookup() {
        let model = GfbModel {
            texture_files: vec!["pm0001_00_col".to_string()],
            ..Default::default()
        };
        assert_eq!(model.texture_file(0), Some("pm0001_00_col"));
        assert_eq!(model.texture_file(1), None);
    }
}
