//! A fixed-size circular byte buffer addressed by absolute cursors.
//!
//! Both cursors only ever grow; the storage slot of an absolute position is
//! `position & (capacity - 1)`, which is why the capacity has to be a power of
//! two. The buffer is the only I/O primitive of a session: socket reads land in
//! [`RingBuffer::spare_mut`] and outgoing bytes are drained through the
//! [`Buf`] implementation, which yields both spans for a vectored write.

use bytes::Buf;
use std::io::IoSlice;
use thiserror::Error;

/// Returned by [`RingBuffer::write_bytes`] when the bytes do not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ring buffer full, need {needed} bytes but only {free} are free")]
pub struct BufferFull {
    pub needed: usize,
    pub free: usize,
}

#[derive(Debug)]
pub struct RingBuffer {
    data: Box<[u8]>,
    mask: u64,
    read: u64,
    write: u64,
    eof: bool,
}

impl RingBuffer {
    /// Creates an empty buffer.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or not a power of two. [`SessionConfig`](crate::config::SessionConfig)
    /// validates its capacities before any buffer is created.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two(), "ring buffer capacity must be a power of two, got {capacity}");
        Self { data: vec![0; capacity].into_boxed_slice(), mask: capacity as u64 - 1, read: 0, write: 0, eof: false }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of unread bytes.
    #[inline]
    pub fn used(&self) -> usize {
        (self.write - self.read) as usize
    }

    #[inline]
    pub fn free(&self) -> usize {
        self.capacity() - self.used()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.used() == self.capacity()
    }

    #[inline]
    pub fn read_cursor(&self) -> u64 {
        self.read
    }

    #[inline]
    pub fn write_cursor(&self) -> u64 {
        self.write
    }

    #[inline]
    fn index(&self, position: u64) -> usize {
        (position & self.mask) as usize
    }

    /// Appends one byte, returning `false` when the buffer is full.
    pub fn put(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        let index = self.index(self.write);
        self.data[index] = byte;
        self.write += 1;
        true
    }

    /// Removes and returns the oldest unread byte.
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.data[self.index(self.read)];
        self.read += 1;
        Some(byte)
    }

    /// Returns the byte stored at the absolute position `position`, if it is unread.
    pub fn byte_at(&self, position: u64) -> Option<u8> {
        (position >= self.read && position < self.write).then(|| self.data[self.index(position)])
    }

    /// Appends the whole of `src` or nothing at all.
    pub fn write_bytes(&mut self, src: &[u8]) -> Result<usize, BufferFull> {
        let free = self.free();
        if src.len() > free {
            return Err(BufferFull { needed: src.len(), free });
        }

        let start = self.index(self.write);
        let first = src.len().min(self.capacity() - start);
        self.data[start..start + first].copy_from_slice(&src[..first]);
        self.data[..src.len() - first].copy_from_slice(&src[first..]);
        self.write += src.len() as u64;
        Ok(src.len())
    }

    /// Copies up to `dst.len()` unread bytes into `dst`, consuming them.
    pub fn read_bytes(&mut self, dst: &mut [u8]) -> usize {
        let (head, tail) = self.gather();
        let first = head.len().min(dst.len());
        dst[..first].copy_from_slice(&head[..first]);
        let second = tail.len().min(dst.len() - first);
        dst[first..first + second].copy_from_slice(&tail[..second]);

        let n = first + second;
        self.read += n as u64;
        n
    }

    /// Overwrites one already stored byte.
    ///
    /// A negative `offset` counts back from the write cursor (`-1` is the last byte
    /// written), a non-negative one counts forward from the read cursor. Returns
    /// `false` when the offset does not address an unread byte.
    pub fn replace(&mut self, offset: isize, byte: u8) -> bool {
        let position = if offset < 0 {
            self.write.checked_sub(offset.unsigned_abs() as u64)
        } else {
            self.read.checked_add(offset as u64)
        };

        match position {
            Some(position) if position >= self.read && position < self.write => {
                let index = self.index(position);
                self.data[index] = byte;
                true
            }
            _ => false,
        }
    }

    /// The unread bytes as at most two contiguous spans, oldest first.
    pub fn gather(&self) -> (&[u8], &[u8]) {
        let used = self.used();
        let start = self.index(self.read);
        let first = used.min(self.capacity() - start);
        (&self.data[start..start + first], &self.data[..used - first])
    }

    /// The contiguous free span starting at the write cursor.
    ///
    /// After filling a prefix of it call [`RingBuffer::grow_write_cursor`].
    pub fn spare_mut(&mut self) -> &mut [u8] {
        let free = self.free();
        let start = self.index(self.write);
        let len = free.min(self.capacity() - start);
        &mut self.data[start..start + len]
    }

    /// Marks `n` bytes written through [`RingBuffer::spare_mut`] as readable.
    pub fn grow_write_cursor(&mut self, n: usize) {
        debug_assert!(n <= self.free(), "grow {n} exceeds free space {}", self.free());
        self.write += n.min(self.free()) as u64;
    }

    /// Consumes `n` unread bytes without copying them.
    pub fn advance_read_cursor(&mut self, n: usize) {
        debug_assert!(n <= self.used(), "advance {n} exceeds unread bytes {}", self.used());
        self.read += n.min(self.used()) as u64;
    }

    pub fn set_eof(&mut self) {
        self.eof = true;
    }

    /// Whether the producer side has signalled end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Drops all unread bytes and the EOF mark.
    pub fn clear(&mut self) {
        self.read = self.write;
        self.eof = false;
    }
}

impl Buf for RingBuffer {
    fn remaining(&self) -> usize {
        self.used()
    }

    fn chunk(&self) -> &[u8] {
        self.gather().0
    }

    fn advance(&mut self, cnt: usize) {
        assert!(cnt <= self.used(), "cannot advance past the write cursor");
        self.advance_read_cursor(cnt);
    }

    fn chunks_vectored<'a>(&'a self, dst: &mut [IoSlice<'a>]) -> usize {
        let (head, tail) = self.gather();
        let mut filled = 0;
        for span in [head, tail] {
            if span.is_empty() || filled == dst.len() {
                break;
            }
            dst[filled] = IoSlice::new(span);
            filled += 1;
        }
        filled
    }
}
