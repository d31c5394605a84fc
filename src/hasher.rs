//! CRC-8 hasher (C5): the byte-level CRC-8 (polynomial 0x31, init 0x00, no
//! input/output reflection, no final XOR) required by the acceptance
//! vectors, a frame-level hash built on top of it, and the parallel driver
//! that turns an input-frame queue into an output-frame queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::SignatureError;
use crate::frame::{DataFrame, FrameConfig};
use crate::pool::MemoryPool;
use crate::queue::BoundedQueue;
use crate::threadpool::TPool;

const POP_TIMEOUT: Duration = Duration::from_millis(100);

/// Precomputed CRC-8 table: polynomial 0x31, MSB-first (no input/output
/// reflection), so the table is indexed directly on `crc ^ byte`.
fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-8 (polynomial 0x31, initial value 0x00, no input/output reflection,
/// no final XOR) of a byte slice.
pub fn crc8(data: &[u8]) -> u8 {
    thread_local! {
        static TABLE: [u8; 256] = build_table();
    }
    TABLE.with(|table| {
        let mut crc: u8 = 0x00;
        for &byte in data {
            crc = table[(crc ^ byte) as usize];
        }
        crc
    })
}

/// Hashes every block of `frame` into a new frame with `blockSize = 1`,
/// carrying the same `firstBlockIdx`. The output frame is constructed with
/// capacity `full_blocks_per_frame` (the run-wide constant every input frame
/// config also shares) so the output pool's chunk size stays fixed across a
/// short last frame too; the true count is trimmed afterwards with
/// `set_blocks_count`, matching how the reader shrinks input frames.
pub fn calculate_crc8_of_frame(
    frame: &DataFrame,
    full_blocks_per_frame: usize,
    dest_pool: Option<Arc<MemoryPool>>,
) -> Result<DataFrame, SignatureError> {
    let out_config = FrameConfig {
        first_block_idx: frame.first_block_index(),
        block_size: 1,
        blocks_count: full_blocks_per_frame,
        pool: dest_pool,
    };
    let mut out = DataFrame::new(&out_config)?;
    if frame.blocks_count() != full_blocks_per_frame {
        out.set_blocks_count(frame.blocks_count())?;
    }
    for i in 0..frame.blocks_count() {
        out.data_mut()[i] = crc8(frame.block_as_range(i));
    }
    Ok(out)
}

/// Parameters for [`calculate_for_whole_queue`].
pub struct CalculateForWholeQueueParams {
    pub src: Arc<BoundedQueue<DataFrame>>,
    pub dest: Arc<BoundedQueue<DataFrame>>,
    pub has_producer_finished: Arc<AtomicBool>,
    pub tasks_count: usize,
    pub dest_pool: Arc<MemoryPool>,
    pub full_blocks_per_frame: usize,
}

/// Submits `tasks_count` hasher tasks to `pool`, each draining `src` into
/// `dest` until the producer side is finished and the queue is empty.
/// Returns a handle per task; join them with [`join_and_rethrow`].
pub fn calculate_for_whole_queue(
    pool: &TPool,
    params: CalculateForWholeQueueParams,
) -> Vec<crate::threadpool::TaskHandle<Result<(), SignatureError>>> {
    (0..params.tasks_count)
        .map(|_| {
            let src = Arc::clone(&params.src);
            let dest = Arc::clone(&params.dest);
            let finished = Arc::clone(&params.has_producer_finished);
            let dest_pool = Arc::clone(&params.dest_pool);
            let full_blocks_per_frame = params.full_blocks_per_frame;
            pool.submit_task(move || -> Result<(), SignatureError> {
                let mut frames_hashed: u64 = 0;
                loop {
                    match src.pop_timeout(POP_TIMEOUT) {
                        Some(frame) => {
                            let out = calculate_crc8_of_frame(
                                &frame,
                                full_blocks_per_frame,
                                Some(Arc::clone(&dest_pool)),
                            )?;
                            dest.push_blocking(out);
                            frames_hashed += 1;
                            crate::displaylevel!(4, "hasher: {frames_hashed} frame(s) hashed\n");
                        }
                        None => {
                            if finished.load(Ordering::Acquire) && src.is_empty() {
                                break;
                            }
                        }
                    }
                }
                while let Some(frame) = src.try_pop() {
                    let out = calculate_crc8_of_frame(
                        &frame,
                        full_blocks_per_frame,
                        Some(Arc::clone(&dest_pool)),
                    )?;
                    dest.push_blocking(out);
                }
                Ok(())
            })
        })
        .collect()
}

/// Joins every handle, returning the first error encountered, if any.
pub fn join_and_rethrow(
    handles: Vec<crate::threadpool::TaskHandle<Result<(), SignatureError>>>,
) -> Result<(), SignatureError> {
    let mut first_err = None;
    for handle in handles {
        if let Err(e) = handle.join() {
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
