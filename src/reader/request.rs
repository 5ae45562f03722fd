//! Output buffer with a delivery cursor.

/// A caller-owned output buffer being filled by one read.
///
/// The cursor counts bytes already delivered and never exceeds the
/// buffer length.
pub struct ReadRequest<'a> {
    buf: &'a mut [u8],
    cursor: usize,
}

impl<'a> ReadRequest<'a> {
    /// Creates an empty request over `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    /// Returns the requested length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if zero bytes were requested.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the number of bytes delivered so far.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the number of bytes still to deliver.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// Returns true once every requested byte has been delivered.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.cursor == self.buf.len()
    }

    /// Returns the delivered prefix of the buffer.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.cursor]
    }

    /// Copies as much of `bytes` as fits and advances the cursor.
    ///
    /// Returns the number of bytes copied.
    pub(crate) fn put(&mut self, bytes: &[u8]) -> usize {
        let chunk = self.remaining().min(bytes.len());
        self.buf[self.cursor..self.cursor + chunk].copy_from_slice(&bytes[..chunk]);
        self.cursor += chunk;
        chunk
    }

    /// Zeroes the bytes delivered since `start` and moves the cursor back.
    pub(crate) fn rewind_to(&mut self, start: usize) {
        let start = start.min(self.cursor);
        self.buf[start..self.cursor].fill(0);
        self.cursor = start;
    }
}

impl std::fmt::Debug for ReadRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadRequest")
            .field("len", &self.buf.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}
