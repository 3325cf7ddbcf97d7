//! Output buffer for the serializer.

use crate::error::{Error, ErrorKind, Result};

/// A growable byte buffer with support for reserving fixed-width regions
/// and patching them once their contents are known.
///
/// Document and string lengths prefix the bytes they describe, so the
/// serializer reserves each length slot up front and back-patches it after
/// the payload has been written. Allocation failures surface as
/// [`ErrorKind::OutOfMemory`]; the storage itself is released whenever the
/// buffer is dropped, on success and failure paths alike.
pub(crate) struct ByteBuffer {
    bytes: Vec<u8>,
}

impl ByteBuffer {
    pub(crate) fn new() -> ByteBuffer {
        ByteBuffer { bytes: Vec::new() }
    }

    fn grow(&mut self, additional: usize) -> Result<()> {
        self.bytes
            .try_reserve(additional)
            .map_err(|_| Error::from(ErrorKind::OutOfMemory))
    }

    /// Appends `data` at the current write position.
    pub(crate) fn append(&mut self, data: &[u8]) -> Result<()> {
        self.grow(data.len())?;
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    /// Appends a single byte.
    pub(crate) fn push(&mut self, byte: u8) -> Result<()> {
        self.grow(1)?;
        self.bytes.push(byte);
        Ok(())
    }

    /// Appends `len` zero bytes and returns the offset of the first,
    /// for later back-patching.
    pub(crate) fn reserve_len(&mut self, len: usize) -> Result<usize> {
        let offset = self.bytes.len();
        self.grow(len)?;
        self.bytes.resize(offset + len, 0);
        Ok(offset)
    }

    /// Overwrites previously written bytes starting at `offset`.
    ///
    /// The region must lie entirely within the written prefix; offsets come
    /// from [`reserve_len`](Self::reserve_len), so an out-of-range patch is
    /// a bug in the serializer.
    pub(crate) fn patch(&mut self, offset: usize, data: &[u8]) {
        assert!(
            offset + data.len() <= self.bytes.len(),
            "patch of {} bytes at offset {} exceeds buffer length {}",
            data.len(),
            offset,
            self.bytes.len()
        );
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    /// The current write position.
    pub(crate) fn position(&self) -> usize {
        self.bytes.len()
    }

    /// Consumes the buffer, yielding the written bytes.
    pub(crate) fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}
