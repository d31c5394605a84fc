//! Parallel file reader (C6).
//!
//! Splits a file into frame configs sized around a 1 MiB target, then runs
//! `tasks_count` reader tasks that each open an independent handle and claim
//! configs from a shared counter, pushing completed frames onto the input
//! queue.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{IoOrigin, SignatureError};
use crate::frame::{DataFrame, FrameConfig};
use crate::pool::MemoryPool;
use crate::queue::BoundedQueue;
use crate::threadpool::{TPool, TaskHandle};
use crate::util::ceil_div;

/// Target bytes per frame; keeps individual frames from being so small that
/// queue/lock overhead dominates, and so large that RAM budgeting gets coarse.
pub const OPTIMAL_FRAME_BYTES: u64 = 1024 * 1024;

/// Blocks-per-frame for a given file size and block size: as many blocks as
/// fit in one `OPTIMAL_FRAME_BYTES` frame, but never more than the file has.
/// This is the one constant every frame config in a run shares, so every
/// frame (including a short last one) asks its memory pool for the same
/// chunk size — the last frame's true size is only trimmed afterwards via
/// `DataFrame::set_blocks_count`, never by requesting a smaller allocation.
pub fn blocks_per_frame(file_size: u64, block_size: u64) -> u64 {
    let blocks_in_file = ceil_div(file_size.max(1), block_size);
    ceil_div(OPTIMAL_FRAME_BYTES, block_size).min(blocks_in_file)
}

/// Computes the list of frame configs covering a file of `file_size` bytes
/// split into `block_size`-byte blocks, all sharing `pool`. Every config
/// (including the last) requests the same `blocks_count`; a short final read
/// is handled by [`DataFrame::set_blocks_count`], not by a smaller config.
pub fn make_frame_configs(
    file_size: u64,
    block_size: u64,
    pool: Arc<MemoryPool>,
) -> Result<Vec<FrameConfig>, SignatureError> {
    if block_size == 0 {
        return Err(SignatureError::Programming("block size must be non-zero".into()));
    }
    if file_size == 0 {
        return Ok(Vec::new());
    }

    let blocks_in_file = ceil_div(file_size, block_size);
    let blocks_per_frame = blocks_per_frame(file_size, block_size);
    let frames_in_file = ceil_div(blocks_in_file, blocks_per_frame);

    let mut configs = Vec::with_capacity(frames_in_file as usize);
    for i in 0..frames_in_file {
        let first_block_idx = i * blocks_per_frame;
        configs.push(FrameConfig {
            first_block_idx,
            block_size: block_size as usize,
            blocks_count: blocks_per_frame as usize,
            pool: Some(Arc::clone(&pool)),
        });
    }
    Ok(configs)
}

/// Reads one config's worth of blocks from `path`, returning a frame whose
/// `blocks_count` reflects a short final read. A clean EOF mid-read is not an
/// error; any other I/O failure is.
fn read_one_frame(path: &Path, config: &FrameConfig) -> Result<DataFrame, SignatureError> {
    let mut file = File::open(path).map_err(|e| SignatureError::io(IoOrigin::Input, path, e))?;
    let block_size = config.block_size as u64;
    let offset = config.first_block_idx * block_size;
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| SignatureError::io(IoOrigin::Input, path, e))?;

    let mut frame = DataFrame::new(config)?;
    let want = frame.total_size_of_all_blocks();
    let mut read_total = 0usize;
    {
        let buf = frame.data_mut();
        while read_total < want {
            match file.read(&mut buf[read_total..want]) {
                Ok(0) => break,
                Ok(n) => read_total += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(SignatureError::io(IoOrigin::Input, path, e)),
            }
        }
    }
    if read_total < want {
        let full_blocks = ceil_div(read_total as u64, block_size) as usize;
        frame.set_blocks_count(full_blocks)?;
    }
    Ok(frame)
}

/// Submits `tasks_count` reader tasks to `pool`. Each claims the next config
/// from a shared atomic index until the list is exhausted, pushing frames
/// onto `dest`.
pub fn spawn_readers(
    pool: &TPool,
    path: PathBuf,
    configs: Arc<Vec<FrameConfig>>,
    dest: Arc<BoundedQueue<DataFrame>>,
    tasks_count: usize,
) -> Vec<TaskHandle<Result<(), SignatureError>>> {
    let next_index = Arc::new(AtomicU64::new(0));
    (0..tasks_count)
        .map(|_| {
            let path = path.clone();
            let configs = Arc::clone(&configs);
            let dest = Arc::clone(&dest);
            let next_index = Arc::clone(&next_index);
            pool.submit_task(move || -> Result<(), SignatureError> {
                loop {
                    let idx = next_index.fetch_add(1, Ordering::Relaxed) as usize;
                    if idx >= configs.len() {
                        break;
                    }
                    let frame = read_one_frame(&path, &configs[idx])?;
                    dest.push_blocking(frame);
                    crate::displaylevel!(4, "reader: frame {idx} of {} read\n", configs.len());
                }
                Ok(())
            })
        })
        .collect()
}

pub use crate::hasher::join_and_rethrow as join_reader_handles;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn make_frame_configs_empty_file_has_no_configs() {
        let pool = Arc::new(MemoryPool::new());
        let configs = make_frame_configs(0, 4, pool).unwrap();
        assert!(configs.is_empty());
    }

    #[test]
    fn make_frame_configs_covers_whole_file() {
        let pool = Arc::new(MemoryPool::new());
        let configs = make_frame_configs(10, 3, Arc::clone(&pool)).unwrap();
        // Every config shares the same blocks_count (pool chunk-size invariant);
        // the true last-frame size is trimmed later via set_blocks_count.
        let per_frame = configs[0].blocks_count;
        assert!(configs.iter().all(|c| c.blocks_count == per_frame));
        let last_start = configs.last().unwrap().first_block_idx;
        assert!(last_start < ceil_div(10, 3));
    }

    #[test]
    fn make_frame_configs_zero_block_size_errors() {
        let pool = Arc::new(MemoryPool::new());
        assert!(make_frame_configs(10, 0, pool).is_err());
    }

    #[test]
    fn read_one_frame_short_final_block_is_zero_padded() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&[1, 2, 3]).unwrap();
        f.flush().unwrap();

        let config = FrameConfig {
            first_block_idx: 0,
            block_size: 4,
            blocks_count: 1,
            pool: None,
        };
        let frame = read_one_frame(f.path(), &config).unwrap();
        assert_eq!(frame.blocks_count(), 1);
        assert_eq!(frame.data(), &[1, 2, 3, 0]);
    }

    #[test]
    fn spawn_readers_collects_all_frames_across_tasks() {
        let mut f = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..40u8).collect();
        f.write_all(&data).unwrap();
        f.flush().unwrap();

        let pool = Arc::new(MemoryPool::new());
        let configs = Arc::new(
            (0..10u64)
                .map(|i| FrameConfig {
                    first_block_idx: i,
                    block_size: 4,
                    blocks_count: 1,
                    pool: Some(Arc::clone(&pool)),
                })
                .collect::<Vec<_>>(),
        );
        let tpool = TPool::new(4, 16).unwrap();
        let dest = Arc::new(BoundedQueue::new(0));
        let handles = spawn_readers(&tpool, f.path().to_path_buf(), configs, Arc::clone(&dest), 3);
        join_reader_handles(handles).unwrap();

        let mut got = Vec::new();
        while let Some(frame) = dest.try_pop() {
            got.push((frame.first_block_index(), frame.data().to_vec()));
        }
        got.sort_by_key(|(idx, _)| *idx);
        for (i, (idx, bytes)) in got.iter().enumerate() {
            assert_eq!(*idx, i as u64);
            assert_eq!(bytes, &data[i * 4..i * 4 + 4]);
        }
    }
}
