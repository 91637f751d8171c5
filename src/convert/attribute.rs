//! Attribute mapping between legacy and Trinity vertex layouts.
//!
//! Three pieces live here:
//! - translation of legacy attribute descriptors into a [`VertexLayout`],
//! - the [`AttributeMapper`] seam choosing the destination semantic/format of
//!   each source element,
//! - the per-value semantic transform applied while transcoding (position
//!   scaling, color palette collection).

use tracing::warn;

use crate::models::codec::VertexValue;
use crate::models::gfb::{LegacyAttributeType, LegacyDataType, LegacyVertexAttribute};
use crate::models::vertex_format::{
    InputLayoutElement, InputLayoutFormat, LayoutError, SemanticName, VertexLayout,
};

/// Destination semantic and format for one source element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeTarget {
    pub semantic: SemanticName,
    pub semantic_index: u32,
    pub format: InputLayoutFormat,
}

impl From<&InputLayoutElement> for AttributeTarget {
    fn from(element: &InputLayoutElement) -> Self {
        AttributeTarget {
            semantic: element.semantic,
            semantic_index: element.semantic_index,
            format: element.format,
        }
    }
}

/// Chooses where each source element ends up in the destination layout.
///
/// Returning `None` drops the element from the destination.
pub trait AttributeMapper {
    fn map(&self, element: &InputLayoutElement) -> Option<AttributeTarget>;
}

impl<F> AttributeMapper for F
where
    F: Fn(&InputLayoutElement) -> Option<AttributeTarget>,
{
    fn map(&self, element: &InputLayoutElement) -> Option<AttributeTarget> {
        self(element)
    }
}

/// Keeps every element with its source semantic and format.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl AttributeMapper for IdentityMapper {
    fn map(&self, element: &InputLayoutElement) -> Option<AttributeTarget> {
        Some(element.into())
    }
}

/// Layout format for a legacy `(data type, component count)` pair.
pub fn legacy_format(data_type: LegacyDataType, count: u32) -> Option<InputLayoutFormat> {
    let format = match (data_type, count) {
        (LegacyDataType::UByte, 4) => InputLayoutFormat::Rgba8Unsigned,
        (LegacyDataType::HalfFloat, 4) => InputLayoutFormat::Rgba16Float,
        (LegacyDataType::UShort, 4) => InputLayoutFormat::Rgba16Unorm,
        (LegacyDataType::Float, 4) => InputLayoutFormat::Rgba32Float,
        (LegacyDataType::FixedPoint, 4) => InputLayoutFormat::Rgba8Unorm,
        (LegacyDataType::Float, 2) => InputLayoutFormat::Rg32Float,
        (LegacyDataType::Float, 3) => InputLayoutFormat::Rgb32Float,
        _ => return None,
    };
    Some(format)
}

/// Semantic name and index for a legacy attribute type.
pub fn legacy_semantic(attribute_type: LegacyAttributeType) -> (SemanticName, u32) {
    match attribute_type {
        LegacyAttributeType::Position => (SemanticName::Position, 0),
        LegacyAttributeType::Normal => (SemanticName::Normal, 0),
        LegacyAttributeType::Tangent => (SemanticName::Tangent, 0),
        LegacyAttributeType::Texcoord0 => (SemanticName::TexCoord, 0),
        LegacyAttributeType::Texcoord1 => (SemanticName::TexCoord, 1),
        LegacyAttributeType::Texcoord2 => (SemanticName::TexCoord, 2),
        LegacyAttributeType::Texcoord3 => (SemanticName::TexCoord, 3),
        LegacyAttributeType::Color0 => (SemanticName::Color, 0),
        LegacyAttributeType::Color1 => (SemanticName::Color, 1),
        LegacyAttributeType::Color2 => (SemanticName::Color, 2),
        LegacyAttributeType::Color3 => (SemanticName::Color, 3),
        LegacyAttributeType::GroupIdx => (SemanticName::BlendIndices, 0),
        LegacyAttributeType::GroupWeight => (SemanticName::BlendWeights, 0),
        other => {
            warn!("legacy attribute {other:?} has no semantic, keeping it untyped");
            (SemanticName::None, 0)
        }
    }
}

/// Describe a legacy shape's vertex records as a packed layout.
pub fn legacy_layout(attributes: &[LegacyVertexAttribute]) -> Result<VertexLayout, LayoutError> {
    let elements = attributes
        .iter()
        .enumerate()
        .map(|(element, attr)| {
            let format = legacy_format(attr.data_type, attr.count).ok_or(
                LayoutError::LegacyFormatUnsupported {
                    element,
                    data_type: attr.data_type,
                    count: attr.count,
                },
            )?;
            let (semantic, semantic_index) = legacy_semantic(attr.attribute_type);
            Ok((semantic, semantic_index, format))
        })
        .collect::<Result<Vec<_>, LayoutError>>()?;

    VertexLayout::pack(elements)
}

/// Distinct vertex colors in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorPalette {
    colors: Vec<[f32; 4]>,
}

impl ColorPalette {
    pub fn record(&mut self, value: &VertexValue) {
        let color = match *value {
            VertexValue::Vec4i(c) => c.map(|channel| channel as f32 / u8::MAX as f32),
            VertexValue::Vec4(c) => c,
            other => {
                warn!("ignoring {} value in a color channel", other.shape());
                return;
            }
        };
        if !self.colors.contains(&color) {
            self.colors.push(color);
        }
    }

    pub fn colors(&self) -> &[[f32; 4]] {
        &self.colors
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Palettes for the two color channels that carry layer information.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorPalettes {
    pub channel0: ColorPalette,
    pub channel1: ColorPalette,
}

/// Apply the semantic-specific adjustment to one decoded value.
pub fn apply_transform(
    element: &InputLayoutElement,
    value: VertexValue,
    unit_scale: f32,
    palettes: &mut ColorPalettes,
) -> VertexValue {
    match (element.semantic, element.semantic_index) {
        (SemanticName::Position, _) => value.scaled(unit_scale),
        (SemanticName::Color, 0) => {
            palettes.channel0.record(&value);
            value
        }
        (SemanticName::Color, 1) => {
            palettes.channel1.record(&value);
            value
        }
        (SemanticName::Color, index) => {
            warn!("color channel {index} is passed through untouched");
            value
        }
        // Blend indices refer to rig indices, which stay dense and in order.
        _ => value,
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
    fn test_legacy_layout_offsets() {
        let layout = legacy_layout(&[
            attr(LegacyAttributeType::Position, LegacyDataType::Float, 3),
            attr(LegacyAttributeType::Normal, LegacyDataType::HalfFloat, 4),
            attr(LegacyAttributeType::Texcoord1, LegacyDataType::Float, 2),
            attr(LegacyAttributeType::Color0, LegacyDataType::UByte, 4),
            attr(LegacyAttributeType::GroupWeight, LegacyDataType::UShort, 4),
        ])
        .unwrap();

        let offsets: Vec<_> = layout.elements.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0, 12, 20, 28, 32]);
        assert_eq!(layout.stride, 40);
        assert_eq!(layout.elements[2].semantic, SemanticName::TexCoord);
        assert_eq!(layout.elements[2].semantic_index, 1);
        assert_eq!(layout.elements[3].format, InputLayoutFormat::Rgba8Unsigned);
        assert_eq!(layout.elements[4].semantic, SemanticName::BlendWeights);
    }

    #[test]
    fn test_legacy_layout_rejects_unknown_combination() {
        let err = legacy_layout(&[
            attr(LegacyAttributeType::Position, LegacyDataType::Float, 3),
            attr(LegacyAttributeType::Normal, LegacyDataType::Short, 3),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            LayoutError::LegacyFormatUnsupported {
                element: 1,
                data_type: LegacyDataType::Short,
                count: 3
            }
        );
    }

    #[test]
    fn test_binormal_has_no_semantic() {
        assert_eq!(
            legacy_semantic(LegacyAttributeType::Binormal),
            (SemanticName::None, 0)
        );
    }

    #[test]
    fn test_closure_mapper_drops_elements() {
        let color = InputLayoutElement {
            semantic: SemanticName::Color,
            semantic_index: 0,
            format: InputLayoutFormat::Rgba8Unorm,
            offset: 12,
        };
        let drop_colors =
            |e: &InputLayoutElement| (!e.semantic.is_color()).then(|| AttributeTarget::from(e));
        assert_eq!(drop_colors.map(&color), None);
        assert_eq!(
            IdentityMapper.map(&color),
            Some(AttributeTarget {
                semantic: SemanticName::Color,
                semantic_index: 0,
                format: InputLayoutFormat::Rgba8Unorm,
            })
        );
    }

    #[test]
    fn test_transform_scales_position_and_collects_colors() {
        let mut palettes = ColorPalettes::default();
        let position = InputLayoutElement {
            semantic: SemanticName::Position,
            semantic_index: 0,
            format: InputLayoutFormat::Rgb32Float,
            offset: 0,
        };
        let color0 = InputLayoutElement {
            semantic: SemanticName::Color,
            semantic_index: 0,
            format: InputLayoutFormat::Rgba8Unsigned,
            offset: 12,
        };

        let scaled = apply_transform(
            &position,
            VertexValue::Vec3([100.0, -250.0, 50.0]),
            100.0,
            &mut palettes,
        );
        assert_eq!(scaled, VertexValue::Vec3([1.0, -2.5, 0.5]));

        for c in [[255, 0, 255, 255], [0, 0, 0, 255], [255, 0, 255, 255]] {
            let value = VertexValue::Vec4i(c);
            assert_eq!(
                apply_transform(&color0, value, 100.0, &mut palettes),
                value
            );
        }
        assert_eq!(
            palettes.channel0.colors(),
            &[[1.0, 0.0, 1.0, 1.0], [0.0, 0.0, 0.0, 1.0]]
        );
        assert!(palettes.channel1.is_empty());
    }
}
