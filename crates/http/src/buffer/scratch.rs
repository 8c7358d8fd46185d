//! Per-request scratch memory with two regions growing toward each other.
//!
//! The text region starts at offset 0 and grows upward; it holds the decoded
//! path, the query and captured header values as NUL-terminated strings. Byte 0
//! is a permanent NUL so that offset 0 always reads as the empty string. The
//! metadata region starts at the end of the block and grows downward in 4-byte
//! native-endian integers; the parser stores `(header code, text offset)` pairs
//! there.

use crate::protocol::RequestHeader;
use thiserror::Error;

/// The text and metadata regions would overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("scratch store exhausted")]
pub struct ScratchFull;

/// Handle to a NUL-terminated string in a [`ScratchStore`]. Offset 0 means absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextOffset(u32);

impl TextOffset {
    pub const ABSENT: TextOffset = TextOffset(0);

    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn is_absent(self) -> bool {
        self.0 == 0
    }
}

const INT_SIZE: u32 = 4;

#[derive(Debug)]
pub struct ScratchStore {
    data: Box<[u8]>,
    text_end: u32,
    meta_start: u32,
}

impl ScratchStore {
    /// Creates an empty store.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or does not fit an `i32`.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0 && i32::try_from(capacity).is_ok(), "invalid scratch capacity {capacity}");
        let capacity = capacity as u32;
        Self { data: vec![0; capacity as usize].into_boxed_slice(), text_end: 1, meta_start: capacity }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Forgets everything stored since creation.
    pub fn clear(&mut self) {
        self.data[0] = 0;
        self.text_end = 1;
        self.meta_start = self.data.len() as u32;
    }

    /// Offset the next `put_char` writes to.
    pub fn text_offset(&self) -> TextOffset {
        TextOffset(self.text_end)
    }

    /// Bytes left between the two regions.
    pub fn free(&self) -> usize {
        (self.meta_start - self.text_end) as usize
    }

    pub fn put_char(&mut self, byte: u8) -> Result<(), ScratchFull> {
        if self.text_end >= self.meta_start {
            return Err(ScratchFull);
        }
        self.data[self.text_end as usize] = byte;
        self.text_end += 1;
        Ok(())
    }

    pub fn put_int(&mut self, value: i32) -> Result<(), ScratchFull> {
        if self.meta_start - self.text_end < INT_SIZE {
            return Err(ScratchFull);
        }
        self.meta_start -= INT_SIZE;
        let start = self.meta_start as usize;
        self.data[start..start + INT_SIZE as usize].copy_from_slice(&value.to_ne_bytes());
        Ok(())
    }

    /// Number of integers in the metadata region.
    pub fn int_count(&self) -> usize {
        (self.data.len() - self.meta_start as usize) / INT_SIZE as usize
    }

    fn int_position(&self, index: i32) -> Option<usize> {
        let count = self.int_count();
        let nth = if index >= 0 {
            usize::try_from(index).ok()?
        } else {
            count.checked_sub(index.unsigned_abs() as usize)?
        };
        (nth < count).then(|| self.data.len() - (nth + 1) * INT_SIZE as usize)
    }

    /// Reads a stored integer: `0` is the first one stored, `-1` the most recent.
    pub fn get_int(&self, index: i32) -> Option<i32> {
        let start = self.int_position(index)?;
        let mut raw = [0u8; INT_SIZE as usize];
        raw.copy_from_slice(&self.data[start..start + INT_SIZE as usize]);
        Some(i32::from_ne_bytes(raw))
    }

    /// Reads the string whose text offset is stored as integer `index`.
    pub fn get_string(&self, index: i32) -> Option<&[u8]> {
        let offset = u32::try_from(self.get_int(index)?).ok()?;
        Some(self.text(TextOffset(offset)))
    }

    /// The NUL-terminated string at `offset`, without its terminator.
    pub fn text(&self, offset: TextOffset) -> &[u8] {
        if offset.is_absent() || offset.0 >= self.text_end {
            return b"";
        }
        let region = &self.data[offset.0 as usize..self.text_end as usize];
        let end = region.iter().position(|&b| b == 0).unwrap_or(region.len());
        &region[..end]
    }

    /// Overwrites one text byte. Negative offsets count back from the end of the
    /// text region (`-1` is the last byte written), others are absolute.
    pub fn replace_char(&mut self, offset: i32, byte: u8) -> bool {
        let position = if offset < 0 {
            self.text_end.checked_sub(offset.unsigned_abs())
        } else {
            Some(offset.unsigned_abs())
        };
        match position {
            Some(position) if position >= 1 && position < self.text_end => {
                self.data[position as usize] = byte;
                true
            }
            _ => false,
        }
    }

    /// Captured request headers in arrival order.
    pub fn headers(&self) -> Headers<'_> {
        Headers { store: self, next: 0 }
    }

    /// The first captured value of `header`.
    pub fn header(&self, header: RequestHeader) -> Option<&[u8]> {
        self.headers().find(|(h, _)| *h == header).map(|(_, value)| value)
    }
}

/// Iterator over the `(code, offset)` pairs of a [`ScratchStore`].
#[derive(Debug, Clone)]
pub struct Headers<'a> {
    store: &'a ScratchStore,
    next: i32,
}

impl<'a> Iterator for Headers<'a> {
    type Item = (RequestHeader, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let code = self.store.get_int(self.next)?;
            let value = self.store.get_string(self.next + 1)?;
            self.next += 2;
            if let Some(header) = u8::try_from(code).ok().and_then(RequestHeader::from_code) {
                return Some((header, value));
            }
        }
    }
}
