//! Vertex buffer transcoding.
//!
//! Every source vertex is decoded element by element into a [`VertexRecord`],
//! run through the semantic transform, and re-encoded into the destination
//! layout. Destination offsets come from packing the kept elements in source
//! order.

use thiserror::Error;
use tracing::debug;

use crate::convert::ConversionOptions;
use crate::convert::attribute::{AttributeMapper, AttributeTarget, ColorPalettes, apply_transform};
use crate::models::codec::{self, CodecError, VertexValue};
use crate::models::vertex_format::{LayoutError, VertexLayout};

#[derive(Debug, Error, PartialEq)]
pub enum TranscodeError {
    /// `vertex` is `None` when the format was rejected while laying out
    /// buffers, before any vertex was read.
    #[error("element {element}{}: {source}", at_vertex(.vertex))]
    FormatUnsupported {
        element: usize,
        vertex: Option<usize>,
        #[source]
        source: CodecError,
    },
    #[error("source layout is invalid: {0}")]
    InvalidLayout(#[from] LayoutError),
    #[error("buffer of {len} bytes is not a whole number of {stride}-byte vertices")]
    TruncatedBuffer { len: usize, stride: usize },
}

fn at_vertex(vertex: &Option<usize>) -> String {
    vertex.map(|v| format!(" of vertex {v}")).unwrap_or_default()
}

/// One decoded element of a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedAttribute {
    /// Index into the source layout.
    pub element: usize,
    pub value: VertexValue,
}

/// All decoded elements of one vertex, in source layout order.
pub type VertexRecord = Vec<DecodedAttribute>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscodedBuffer {
    pub data: Vec<u8>,
    pub layout: VertexLayout,
    pub palettes: ColorPalettes,
}

impl TranscodedBuffer {
    pub fn vertex_count(&self) -> usize {
        if self.layout.stride == 0 {
            0
        } else {
            self.data.len() / self.layout.stride
        }
    }
}

/// Decode every element of the vertex starting at `base`.
fn decode_vertex(
    source: &[u8],
    layout: &VertexLayout,
    base: usize,
    vertex: usize,
) -> Result<VertexRecord, TranscodeError> {
    layout
        .elements
        .iter()
        .enumerate()
        .map(|(element, elem)| {
            codec::decode(elem.format, source, base + elem.offset)
                .map(|value| DecodedAttribute { element, value })
                .map_err(|source| TranscodeError::FormatUnsupported {
                    element,
                    vertex: Some(vertex),
                    source,
                })
        })
        .collect()
}

/// Layout errors that name a format without an encoding become
/// [`TranscodeError::FormatUnsupported`]. `element` maps a layout position back
/// to its source element.
fn layout_error(err: LayoutError, element: impl Fn(usize) -> usize) -> TranscodeError {
    match err {
        LayoutError::FormatUnsupported {
            element: index,
            format,
        } => TranscodeError::FormatUnsupported {
            element: element(index),
            vertex: None,
            source: CodecError::FormatUnsupported { format },
        },
        other => TranscodeError::InvalidLayout(other),
    }
}

/// Re-encode `source` (laid out as `layout`) into the layout chosen by `mapper`.
pub fn transcode<M: AttributeMapper + ?Sized>(
    source: &[u8],
    layout: &VertexLayout,
    mapper: &M,
    options: &ConversionOptions,
) -> Result<TranscodedBuffer, TranscodeError> {
    layout.validate().map_err(|err| layout_error(err, |index| index))?;

    let stride = layout.stride;
    if stride == 0 || source.len() % stride != 0 {
        return Err(TranscodeError::TruncatedBuffer {
            len: source.len(),
            stride,
        });
    }

    // (source element, destination element) for every kept element.
    let mut kept: Vec<(usize, AttributeTarget)> = Vec::new();
    for (element, elem) in layout.elements.iter().enumerate() {
        if let Some(target) = mapper.map(elem) {
            kept.push((element, target));
        }
    }

    let dest_layout = VertexLayout::pack(
        kept.iter()
            .map(|(_, t)| (t.semantic, t.semantic_index, t.format)),
    )
    .map_err(|err| layout_error(err, |index| kept[index].0))?;

    let vertex_count = source.len() / stride;
    let mut palettes = ColorPalettes::default();
    let mut data = vec![0u8; vertex_count * dest_layout.stride];

    for vertex in 0..vertex_count {
        let mut record = decode_vertex(source, layout, vertex * stride, vertex)?;
        for attr in record.iter_mut() {
            attr.value = apply_transform(
                &layout.elements[attr.element],
                attr.value,
                options.unit_scale(),
                &mut palettes,
            );
        }

        let base = vertex * dest_layout.stride;
        for (dest, (element, target)) in dest_layout.elements.iter().zip(&kept) {
            codec::encode(
                target.format,
                &record[*element].value,
                &mut data,
                base + dest.offset,
            )
            .map_err(|source| TranscodeError::FormatUnsupported {
                element: *element,
                vertex: Some(vertex),
                source,
            })?;
        }
    }

    debug!(
        "transcoded {vertex_count} vertices: stride {stride} -> {}",
        dest_layout.stride
    );

    Ok(TranscodedBuffer {
        data,
        layout: dest_layout,
        palettes,
    })
}
