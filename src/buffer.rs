//! Zero-filled memory buffer (C2).
//!
//! RAII owner of one chunk of bytes, always zero-initialised. Backed by a
//! [`MemoryPool`] when one is supplied, or the heap otherwise; either way the
//! chunk is returned to its source on drop.

use std::sync::Arc;

use crate::error::SignatureError;
use crate::pool::MemoryPool;

pub struct ZeroFilledBuffer {
    data: Box<[u8]>,
    pool: Option<Arc<MemoryPool>>,
}

impl ZeroFilledBuffer {
    /// Allocates `n` zero-filled bytes, from `pool` if given, else the heap.
    pub fn new(n: usize, pool: Option<Arc<MemoryPool>>) -> Result<Self, SignatureError> {
        let mut data = match &pool {
            Some(p) => p.allocate(n)?,
            None => {
                let mut v: Vec<u8> = Vec::new();
                v.try_reserve_exact(n)
                    .map_err(|_| SignatureError::Alloc(format!("failed to allocate {n} bytes")))?;
                v.resize(n, 0);
                v.into_boxed_slice()
            }
        };
        for b in data.iter_mut() {
            *b = 0;
        }
        Ok(ZeroFilledBuffer { data, pool })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Produces a fresh buffer from the same source with identical contents.
    pub fn try_clone(&self) -> Result<Self, SignatureError> {
        let mut clone = ZeroFilledBuffer::new(self.data.len(), self.pool.clone())?;
        clone.data.copy_from_slice(&self.data);
        Ok(clone)
    }
}

impl Drop for ZeroFilledBuffer {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            let empty: Box<[u8]> = Box::new([]);
            let taken = std::mem::replace(&mut self.data, empty);
            pool.deallocate(taken);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_backed_buffer_is_zeroed() {
        let buf = ZeroFilledBuffer::new(32, None).unwrap();
        assert_eq!(buf.len(), 32);
        assert!(buf.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn pool_backed_buffer_is_zeroed_even_after_reuse() {
        let pool = Arc::new(MemoryPool::new());
        {
            let mut buf = ZeroFilledBuffer::new(16, Some(Arc::clone(&pool))).unwrap();
            buf.as_mut_slice().fill(0xAB);
        }
        let buf2 = ZeroFilledBuffer::new(16, Some(pool)).unwrap();
        assert!(buf2.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn try_clone_copies_contents() {
        let mut buf = ZeroFilledBuffer::new(4, None).unwrap();
        buf.as_mut_slice().copy_from_slice(&[1, 2, 3, 4]);
        let clone = buf.try_clone().unwrap();
        assert_eq!(clone.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn empty_buffer_is_valid() {
        let buf = ZeroFilledBuffer::new(0, None).unwrap();
        assert!(buf.is_empty());
    }
}
