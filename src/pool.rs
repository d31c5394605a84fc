//! Fixed-chunk memory pool (C1).
//!
//! Every chunk vended by a given pool has the same size; that size is bound
//! lazily, on the first allocation, and enforced on every call after. This
//! lets the reader and writer sides of the pipeline each use their own pool
//! with a shape fixed by the first frame they construct, without a
//! configuration pass up front.

use std::sync::{Mutex, OnceLock};

use crate::error::SignatureError;

/// Number of allocation attempts tried before giving up with [`SignatureError::Alloc`].
/// Chunks are reused from the free list first; this bound only gates the path
/// where a brand new chunk has to be allocated from the allocator.
const MAX_ALLOC_ATTEMPTS: usize = 10_000;

pub struct MemoryPool {
    chunk_size: OnceLock<usize>,
    free: Mutex<Vec<Box<[u8]>>>,
}

impl MemoryPool {
    pub fn new() -> Self {
        MemoryPool {
            chunk_size: OnceLock::new(),
            free: Mutex::new(Vec::new()),
        }
    }

    /// Binds the pool's chunk size on first call; every subsequent call must
    /// request the same size, or a [`SignatureError::Programming`] is raised —
    /// this is a caller bug (mixed frame shapes sharing one pool), not a
    /// recoverable runtime condition.
    pub fn allocate(&self, n: usize) -> Result<Box<[u8]>, SignatureError> {
        let bound = *self.chunk_size.get_or_init(|| n);
        if bound != n {
            return Err(SignatureError::Programming(format!(
                "memory pool chunk size mismatch: bound to {bound}, requested {n}"
            )));
        }

        if let Some(chunk) = self.free.lock().unwrap().pop() {
            return Ok(chunk);
        }

        for _ in 0..MAX_ALLOC_ATTEMPTS {
            let mut buf: Vec<u8> = Vec::new();
            if buf.try_reserve_exact(n).is_ok() {
                buf.resize(n, 0);
                return Ok(buf.into_boxed_slice());
            }
        }
        Err(SignatureError::Alloc(format!(
            "failed to allocate a {n}-byte chunk after {MAX_ALLOC_ATTEMPTS} attempts"
        )))
    }

    /// Returns a chunk to the pool for reuse. The chunk is expected to have
    /// been produced by this pool's `allocate`; size is not re-checked here
    /// since a well-formed [`crate::buffer::ZeroFilledBuffer`] never mixes pools.
    pub fn deallocate(&self, chunk: Box<[u8]>) {
        self.free.lock().unwrap().push(chunk);
    }
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}
