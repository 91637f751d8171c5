//! Vertex layout descriptors for Trinity mesh buffers.
//!
//! A layout is an ordered list of elements, each a `(semantic, semantic index,
//! numeric format, byte offset)` tuple. Vertices are always tightly packed: each
//! element starts where the previous one ended and the stride is the sum of the
//! element widths.

use thiserror::Error;
use variantly::Variantly;

use crate::models::gfb::LegacyDataType;

/// Semantic meaning of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Variantly)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SemanticName {
    #[default]
    None,
    Position,
    Normal,
    Tangent,
    TexCoord,
    Color,
    BlendIndices,
    BlendWeights,
}

/// How an attribute is stored in the vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputLayoutFormat {
    /// No encoding. Never valid inside a packed layout.
    #[default]
    None,
    /// 4 x u8, normalized to `[0, 1]`
    Rgba8Unorm,
    /// 4 x u8, raw integers (blend indices)
    Rgba8Unsigned,
    /// 4 x u16, normalized to `[0, 1]`
    Rgba16Unorm,
    /// 4 x f16
    Rgba16Float,
    /// 2 x f32
    Rg32Float,
    /// 3 x f32
    Rgb32Float,
    /// 4 x f32
    Rgba32Float,
}

impl InputLayoutFormat {
    /// Width of one encoded element in bytes. `None` has no width.
    pub fn size(self) -> Option<usize> {
        match self {
            InputLayoutFormat::None => None,
            InputLayoutFormat::Rgba8Unorm | InputLayoutFormat::Rgba8Unsigned => Some(4),
            InputLayoutFormat::Rgba16Unorm | InputLayoutFormat::Rgba16Float => Some(8),
            InputLayoutFormat::Rg32Float => Some(8),
            InputLayoutFormat::Rgb32Float => Some(12),
            InputLayoutFormat::Rgba32Float => Some(16),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("element {element} uses format {format:?}, which has no encoding")]
    FormatUnsupported {
        element: usize,
        format: InputLayoutFormat,
    },
    #[error("element {element}: no layout format for {count} x {data_type:?}")]
    LegacyFormatUnsupported {
        element: usize,
        data_type: LegacyDataType,
        count: u32,
    },
    #[error("element {element} is at offset {offset}, expected {expected}")]
    Misaligned {
        element: usize,
        offset: usize,
        expected: usize,
    },
    #[error("layout stride is {stride} but its elements pack to {packed} bytes")]
    StrideMismatch { stride: usize, packed: usize },
}

/// A single vertex element descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputLayoutElement {
    pub semantic: SemanticName,
    pub semantic_index: u32,
    pub format: InputLayoutFormat,
    pub offset: usize,
}

/// Ordered vertex elements with the computed stride.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexLayout {
    pub elements: Vec<InputLayoutElement>,
    pub stride: usize,
}

impl VertexLayout {
    /// Build a layout by packing elements in the given order, accumulating
    /// widths with no extra alignment.
    pub fn pack<I>(elements: I) -> Result<VertexLayout, LayoutError>
    where
        I: IntoIterator<Item = (SemanticName, u32, InputLayoutFormat)>,
    {
        let mut packed = Vec::new();
        let mut offset = 0usize;
        for (element, (semantic, semantic_index, format)) in elements.into_iter().enumerate() {
            let size = format
                .size()
                .ok_or(LayoutError::FormatUnsupported { element, format })?;
            packed.push(InputLayoutElement {
                semantic,
                semantic_index,
                format,
                offset,
            });
            offset += size;
        }

        Ok(VertexLayout {
            elements: packed,
            stride: offset,
        })
    }

    /// Check that offsets follow the natural packing and add up to the stride.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut expected = 0usize;
        for (element, elem) in self.elements.iter().enumerate() {
            if elem.offset != expected {
                return Err(LayoutError::Misaligned {
                    element,
                    offset: elem.offset,
                    expected,
                });
            }
            expected += elem.format.size().ok_or(LayoutError::FormatUnsupported {
                element,
                format: elem.format,
            })?;
        }

        if expected != self.stride {
            return Err(LayoutError::StrideMismatch {
                stride: self.stride,
                packed: expected,
            });
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
