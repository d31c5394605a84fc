//! Parallel file writer (C7).
//!
//! A single writing task drains the output queue and seeks+writes each frame
//! at its block offset, shifted by `writing_pos_shift` bytes (the length of
//! any pre-existing output file, so new signature bytes are appended rather
//! than overwriting it).

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{IoOrigin, SignatureError};
use crate::frame::DataFrame;
use crate::queue::BoundedQueue;
use crate::threadpool::{TPool, TaskHandle};

const POP_TIMEOUT: Duration = Duration::from_millis(100);

/// Submits the single writer task. Returns its handle; join it with
/// `handle.join()` after setting `has_producer_finished`.
pub fn spawn_writer(
    pool: &TPool,
    path: PathBuf,
    src: Arc<BoundedQueue<DataFrame>>,
    has_producer_finished: Arc<AtomicBool>,
    writing_pos_shift: u64,
) -> TaskHandle<Result<(), SignatureError>> {
    pool.submit_task(move || -> Result<(), SignatureError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| SignatureError::io(IoOrigin::Output, &path, e))?;

        let mut frames_written: u64 = 0;
        let write_frame = |file: &mut std::fs::File, frame: &DataFrame| -> Result<(), SignatureError> {
            let offset = writing_pos_shift + frame.first_block_index() * frame.block_size() as u64;
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| SignatureError::io(IoOrigin::Output, &path, e))?;
            file.write_all(frame.data())
                .map_err(|e| SignatureError::io(IoOrigin::Output, &path, e))
        };

        loop {
            match src.pop_timeout(POP_TIMEOUT) {
                Some(frame) => {
                    write_frame(&mut file, &frame)?;
                    frames_written += 1;
                    crate::displaylevel!(4, "writer: {frames_written} frame(s) written\n");
                }
                None => {
                    if has_producer_finished.load(Ordering::Acquire) && src.is_empty() {
                        break;
                    }
                }
            }
        }
        while let Some(frame) = src.try_pop() {
            write_frame(&mut file, &frame)?;
        }
        file.flush()
            .map_err(|e| SignatureError::io(IoOrigin::Output, &path, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameConfig;
    use tempfile::NamedTempFile;

    fn frame_with_byte(idx: u64, byte: u8) -> DataFrame {
        let config = FrameConfig {
            first_block_idx: idx,
            block_size: 1,
            blocks_count: 1,
            pool: None,
        };
        let mut frame = DataFrame::new(&config).unwrap();
        frame.data_mut()[0] = byte;
        frame
    }

    #[test]
    fn writer_writes_frames_at_correct_offsets() {
        let out = NamedTempFile::new().unwrap();
        let path = out.path().to_path_buf();
        let pool = TPool::new(2, 8).unwrap();
        let src = Arc::new(BoundedQueue::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        for (i, byte) in [0x11u8, 0x22, 0x33].into_iter().enumerate() {
            src.push_blocking(frame_with_byte(i as u64, byte));
        }

        let handle = spawn_writer(&pool, path.clone(), Arc::clone(&src), Arc::clone(&finished), 0);
        finished.store(true, Ordering::Release);
        handle.join().unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, vec![0x11, 0x22, 0x33]);
    }

    #[test]
    fn writer_appends_after_writing_pos_shift() {
        let out = NamedTempFile::new().unwrap();
        std::fs::write(out.path(), [0xAA, 0xBB]).unwrap();
        let path = out.path().to_path_buf();
        let pool = TPool::new(2, 8).unwrap();
        let src = Arc::new(BoundedQueue::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        src.push_blocking(frame_with_byte(0, 0xCC));

        let handle = spawn_writer(&pool, path.clone(), Arc::clone(&src), Arc::clone(&finished), 2);
        finished.store(true, Ordering::Release);
        handle.join().unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, vec![0xAA, 0xBB, 0xCC]);
    }
}
