//! Buffer integrity helpers

use core::mem::size_of;

/// Buffer shorter than one machine word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferTooSmall;

/// Check whether a buffer is entirely zeroed
///
/// The buffer must be at least one `usize` long. The first word is checked
/// directly, then the rest of the buffer is compared against its own start,
/// which is zero if the first check passed.
pub fn is_zeroed(buf: &[u8]) -> Result<bool, BufferTooSmall> {
    const WORD: usize = size_of::<usize>();

    if buf.len() < WORD {
        return Err(BufferTooSmall);
    }

    if buf[..WORD].iter().any(|&b| b != 0) {
        return Ok(false);
    }

    // Overlapping windows: buf[WORD..] == buf[..len - WORD] holds only if
    // every byte equals the one a word before it, i.e. all zero
    Ok(buf[WORD..] == buf[..buf.len() - WORD])
}
