//! Fixed-capacity transfer buffer.
//!
//! One [`ChunkBuffer`] is allocated per transfer call and reused for every
//! read/write round of that call. It never grows, which bounds the memory a
//! transfer holds regardless of file size. Dropping it releases the
//! allocation on every exit path.

/// Fixed-capacity byte buffer for streaming a file in chunks.
#[derive(Debug)]
pub struct ChunkBuffer {
    data: Box<[u8]>,
}

impl ChunkBuffer {
    /// Allocate a buffer of `capacity` bytes.
    ///
    /// A zero capacity is bumped to 1 so the read loop always makes progress.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity.max(1)].into_boxed_slice(),
        }
    }

    /// Buffer size in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The whole buffer, for a reader to fill.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The first `len` bytes, i.e. what the last read produced.
    ///
    /// `len` is clamped to the capacity.
    pub fn filled(&self, len: usize) -> &[u8] {
        &self.data[..len.min(self.data.len())]
    }
}
