//! Shared winnow-based parsing utilities used by the vertex codec and the mini container parser.

use thiserror::Error;
use winnow::Parser;
use winnow::error::ContextError;

/// Common result type for winnow parsers.
pub type WResult<T> = Result<T, winnow::error::ErrMode<ContextError>>;

/// Errors that can occur during shared parsing operations.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("data too short: need {need} bytes at offset 0x{offset:X}, have {have}")]
    OutOfBounds {
        offset: usize,
        need: usize,
        have: usize,
    },
    #[error("winnow parse error at 0x{offset:X}: {detail}")]
    WinnowError { offset: usize, detail: String },
}

/// Parse `N` consecutive values with the same element parser.
pub fn components<'i, const N: usize, T, P>(
    input: &mut &'i [u8],
    mut parser: P,
) -> WResult<[T; N]>
where
    T: Copy + Default,
    P: FnMut(&mut &'i [u8]) -> WResult<T>,
{
    let mut out = [T::default(); N];
    for slot in out.iter_mut() {
        *slot = parser.parse_next(input)?;
    }
    Ok(out)
}

/// Borrow `len` bytes starting at `offset`, or report how short the data is.
pub fn slice_at(data: &[u8], offset: usize, len: usize) -> Result<&[u8], ParseError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(ParseError::OutOfBounds {
            offset,
            need: len,
            have: data.len().saturating_sub(offset),
        })
}

/// Round `len` up to the next 4-byte boundary.
pub fn align4(len: usize) -> usize {
    len.next_multiple_of(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use winnow::binary::le_u16;

    #[test]
    fn components_reads_in_order() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0xFF];
        let input = &mut &data[..];
        let values: [u16; 3] = components(input, le_u16).unwrap();
        assert_eq!(values, [1, 2, 3]);
        assert_eq!(*input, &[0xFF][..]);
    }

    #[test]
    fn components_fails_when_short() {
        let data = [0x01, 0x00, 0x02];
        let input = &mut &data[..];
        assert!(components::<2, u16, _>(input, le_u16).is_err());
    }

    #[test]
    fn slice_at_reports_shortfall() {
        let data = [0u8; 6];
        assert_eq!(slice_at(&data, 2, 4).unwrap().len(), 4);
        match slice_at(&data, 4, 4) {
            Err(ParseError::OutOfBounds { offset, need, have }) => {
                assert_eq!((offset, need, have), (4, 4, 2));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(slice_at(&data, usize::MAX, 2).is_err());
    }

    #[test]
    fn align4_rounds_up() {
        assert_eq!(align4(0), 0);
        assert_eq!(align4(5), 8);
        assert_eq!(align4(8), 8);
    }
}
