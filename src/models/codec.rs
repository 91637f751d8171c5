//! Numeric codec for individual vertex elements.
//!
//! Decoding turns the raw bytes of one element into a format-independent
//! [`VertexValue`]; encoding writes such a value back out in a (possibly
//! different) [`InputLayoutFormat`]. All multi-byte values are little-endian.

use half::f16;
use thiserror::Error;
use winnow::binary::{le_f32, le_u16, le_u8};

use crate::data::parser_utils::{WResult, components, slice_at};
use crate::models::vertex_format::InputLayoutFormat;

/// A decoded vertex element value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VertexValue {
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Vec4i([u32; 4]),
}

impl VertexValue {
    pub fn shape(&self) -> &'static str {
        match self {
            VertexValue::Vec2(_) => "vec2",
            VertexValue::Vec3(_) => "vec3",
            VertexValue::Vec4(_) => "vec4",
            VertexValue::Vec4i(_) => "vec4i",
        }
    }

    /// Divide a spatial value by `divisor`.
    ///
    /// The `w` component of a 4-vector is left alone, and integer vectors
    /// are returned unchanged.
    pub fn scaled(self, divisor: f32) -> VertexValue {
        match self {
            VertexValue::Vec2(v) => VertexValue::Vec2(v.map(|c| c / divisor)),
            VertexValue::Vec3(v) => VertexValue::Vec3(v.map(|c| c / divisor)),
            VertexValue::Vec4([x, y, z, w]) => {
                VertexValue::Vec4([x / divisor, y / divisor, z / divisor, w])
            }
            VertexValue::Vec4i(v) => VertexValue::Vec4i(v),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("format {format:?} has no defined encoding")]
    FormatUnsupported { format: InputLayoutFormat },
    #[error("cannot encode a {value} value as {format:?}")]
    ValueMismatch {
        format: InputLayoutFormat,
        value: &'static str,
    },
    #[error("element at offset 0x{offset:X} needs {need} bytes, have {have}")]
    OutOfBounds {
        offset: usize,
        need: usize,
        have: usize,
    },
}

fn unorm8(input: &mut &[u8]) -> WResult<f32> {
    le_u8(input).map(|v| v as f32 / u8::MAX as f32)
}

fn unorm16(input: &mut &[u8]) -> WResult<f32> {
    le_u16(input).map(|v| v as f32 / u16::MAX as f32)
}

fn half_float(input: &mut &[u8]) -> WResult<f32> {
    le_u16(input).map(|bits| f16::from_bits(bits).to_f32())
}

fn uint8(input: &mut &[u8]) -> WResult<u32> {
    le_u8(input).map(u32::from)
}

fn parse_value(format: InputLayoutFormat, input: &mut &[u8]) -> WResult<VertexValue> {
    // Callers only reach this with a sized format.
    let value = match format {
        InputLayoutFormat::Rgba8Unorm => VertexValue::Vec4(components(input, unorm8)?),
        InputLayoutFormat::Rgba8Unsigned => VertexValue::Vec4i(components(input, uint8)?),
        InputLayoutFormat::Rgba16Unorm => VertexValue::Vec4(components(input, unorm16)?),
        InputLayoutFormat::Rgba16Float => VertexValue::Vec4(components(input, half_float)?),
        InputLayoutFormat::Rg32Float => VertexValue::Vec2(components(input, le_f32)?),
        InputLayoutFormat::Rgb32Float => VertexValue::Vec3(components(input, le_f32)?),
        InputLayoutFormat::Rgba32Float | InputLayoutFormat::None => {
            VertexValue::Vec4(components(input, le_f32)?)
        }
    };
    Ok(value)
}

/// Decode one element of `format` starting at `offset` in `bytes`.
pub fn decode(
    format: InputLayoutFormat,
    bytes: &[u8],
    offset: usize,
) -> Result<VertexValue, CodecError> {
    let size = format
        .size()
        .ok_or(CodecError::FormatUnsupported { format })?;
    let element = slice_at(bytes, offset, size).map_err(|_| CodecError::OutOfBounds {
        offset,
        need: size,
        have: bytes.len().saturating_sub(offset),
    })?;

    // The slice is exactly `size` bytes, so the parse cannot run short.
    parse_value(format, &mut &element[..]).map_err(|_| CodecError::OutOfBounds {
        offset,
        need: size,
        have: element.len(),
    })
}

fn quantize(v: f32, max: f32) -> f32 {
    (v.clamp(0.0, 1.0) * max).round()
}

/// Encode `value` as `format` into `bytes` at `offset`.
pub fn encode(
    format: InputLayoutFormat,
    value: &VertexValue,
    bytes: &mut [u8],
    offset: usize,
) -> Result<(), CodecError> {
    let size = format
        .size()
        .ok_or(CodecError::FormatUnsupported { format })?;
    let have = bytes.len().saturating_sub(offset);
    let out = offset
        .checked_add(size)
        .and_then(|end| bytes.get_mut(offset..end))
        .ok_or(CodecError::OutOfBounds {
            offset,
            need: size,
            have,
        })?;

    let mismatch = || CodecError::ValueMismatch {
        format,
        value: value.shape(),
    };

    match (format, value) {
        (InputLayoutFormat::Rgba8Unorm, VertexValue::Vec4(v)) => {
            for (dst, c) in out.iter_mut().zip(v) {
                *dst = quantize(*c, u8::MAX as f32) as u8;
            }
        }
        (InputLayoutFormat::Rgba8Unsigned, VertexValue::Vec4i(v)) => {
            for (dst, c) in out.iter_mut().zip(v) {
                *dst = *c as u8;
            }
        }
        (InputLayoutFormat::Rgba16Unorm, VertexValue::Vec4(v)) => {
            for (dst, c) in out.chunks_exact_mut(2).zip(v) {
                let q = quantize(*c, u16::MAX as f32) as u16;
                dst.copy_from_slice(&q.to_le_bytes());
            }
        }
        (InputLayoutFormat::Rgba16Float, VertexValue::Vec4(v)) => {
            for (dst, c) in out.chunks_exact_mut(2).zip(v) {
                dst.copy_from_slice(&f16::from_f32(*c).to_bits().to_le_bytes());
            }
        }
        (InputLayoutFormat::Rg32Float, VertexValue::Vec2(v)) => write_floats(out, v),
        (InputLayoutFormat::Rgb32Float, VertexValue::Vec3(v)) => write_floats(out, v),
        (InputLayoutFormat::Rgba32Float, VertexValue::Vec4(v)) => write_floats(out, v),
        _ => return Err(mismatch()),
    }

    Ok(())
}

fn write_floats(out: &mut [u8], values: &[f32]) {
    for (dst, c) in out.chunks_exact_mut(4).zip(values) {
        dst.copy_from_slice(&c.to_le_bytes());
    }
}
