//! Mini containers: a handful of blobs behind a two-byte identifier and an
//! offset table.
//!
//! Layout (little endian):
//!
//! ```text
//! [id0, id1] [count: u16] [offset: u32; count + 1] [blob data...]
//! ```
//!
//! Each offset is the absolute position where a blob begins; the final one is
//! the total file length. Blobs are zero-padded to a 4-byte boundary, and the
//! padding stays attached to the blob when unpacking.

use thiserror::Error;
use tracing::debug;
use winnow::Parser;
use winnow::binary::{le_u8, le_u16, le_u32};
use winnow::combinator::repeat;
use winnow::error::ContextError;

use crate::data::parser_utils::{ParseError, WResult, align4, components, slice_at};

const HEADER_SIZE: usize = 4;
/// Header plus the offset table of an empty container.
const MIN_SNIFF_SIZE: usize = 12;

#[derive(Debug, Error)]
pub enum MiniError {
    /// The data is not a mini container, or not one with the expected identifier.
    #[error("data is not a recognized mini container")]
    NotRecognized,
    #[error("{count} entries do not fit in a mini container")]
    TooManyEntries { count: usize },
    #[error("packed size {len} does not fit in a 32-bit offset")]
    TooLarge { len: usize },
    #[error("entry {index} ends at 0x{end:X}, before it starts at 0x{start:X}")]
    EntryOutOfOrder { index: usize, start: usize, end: usize },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// An unpacked container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mini {
    pub identifier: [u8; 2],
    pub entries: Vec<Vec<u8>>,
}

impl Mini {
    /// Sniff the identifier and unpack.
    pub fn parse(data: &[u8]) -> Result<Self, MiniError> {
        let identifier = identify(data).ok_or(MiniError::NotRecognized)?;
        unpack(data, Some(identifier))
    }

    pub fn pack(&self) -> Result<Vec<u8>, MiniError> {
        pack(&self.entries, self.identifier)
    }

    /// The identifier as text, e.g. `"BL"`.
    pub fn identifier_str(&self) -> String {
        self.identifier.iter().map(|b| char::from(*b)).collect()
    }
}

/// Pack `blobs` behind `identifier`.
pub fn pack<B: AsRef<[u8]>>(blobs: &[B], identifier: [u8; 2]) -> Result<Vec<u8>, MiniError> {
    let count = u16::try_from(blobs.len()).map_err(|_| MiniError::TooManyEntries {
        count: blobs.len(),
    })?;

    let data_offset = HEADER_SIZE + 4 * (blobs.len() + 1);
    let data_len: usize = blobs.iter().map(|blob| align4(blob.as_ref().len())).sum();
    let total = data_offset + data_len;
    if u32::try_from(total).is_err() {
        return Err(MiniError::TooLarge { len: total });
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&identifier);
    out.extend_from_slice(&count.to_le_bytes());

    let mut offset = data_offset;
    for blob in blobs {
        out.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += align4(blob.as_ref().len());
    }
    out.extend_from_slice(&(offset as u32).to_le_bytes());

    for blob in blobs {
        let blob = blob.as_ref();
        out.extend_from_slice(blob);
        out.resize(out.len() + align4(blob.len()) - blob.len(), 0);
    }

    debug!("packed {count} entries into {} bytes", out.len());
    Ok(out)
}

fn header(input: &mut &[u8]) -> WResult<([u8; 2], u16)> {
    let identifier = components::<2, u8, _>(input, le_u8)?;
    let count = le_u16.parse_next(input)?;
    Ok((identifier, count))
}

fn offset_table(input: &mut &[u8], len: usize) -> WResult<Vec<u32>> {
    repeat(len, le_u32).parse_next(input)
}

/// Unpack a container, checking its identifier when one is expected.
///
/// The offset table only records where each blob starts, so every entry comes
/// back at its padded length: the packed bytes followed by up to three zero
/// bytes. Blobs of 5, 0 and 7 bytes unpack as 8, 0 and 8 bytes.
pub fn unpack(data: &[u8], expected: Option<[u8; 2]>) -> Result<Mini, MiniError> {
    let input = &mut &data[..];
    let (identifier, count) = header(input).map_err(|_| MiniError::NotRecognized)?;
    if expected.is_some_and(|expected| expected != identifier) {
        return Err(MiniError::NotRecognized);
    }

    let offsets =
        offset_table(input, usize::from(count) + 1).map_err(|e| ParseError::WinnowError {
            offset: data.len() - input.len(),
            detail: format!("{e}"),
        })?;

    if offsets.last().map(|end| *end as usize) != Some(data.len()) {
        return Err(MiniError::NotRecognized);
    }

    let entries = offsets
        .windows(2)
        .enumerate()
        .map(|(index, pair)| {
            let (start, end) = (pair[0] as usize, pair[1] as usize);
            let len = end
                .checked_sub(start)
                .ok_or(MiniError::EntryOutOfOrder { index, start, end })?;
            Ok(slice_at(data, start, len)?.to_vec())
        })
        .collect::<Result<Vec<_>, MiniError>>()?;

    Ok(Mini {
        identifier,
        entries,
    })
}

/// Return the identifier of `data` if it looks like a mini container.
pub fn identify(data: &[u8]) -> Option<[u8; 2]> {
    if data.len() < MIN_SNIFF_SIZE {
        return None;
    }
    let input = &mut &data[..];
    let (identifier, count) = header(input).ok()?;

    let final_offset = HEADER_SIZE + 4 * usize::from(count);
    let mut tail = data.get(final_offset..)?;
    let len = le_u32::<_, ContextError>.parse_next(&mut tail).ok()?;

    (len as usize == data.len()).then_some(identifier)
}
