//! Pipeline controller (C8).
//!
//! Owns the thread pool, both queues, and the reader/hasher/writer stages;
//! sizes everything from [`Options`]; joins the stages in the order that
//! avoids a thread-pool deadlock; and restores the output file on failure.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::SignatureError;
use crate::frame::DataFrame;
use crate::hasher::{self, CalculateForWholeQueueParams};
use crate::pool::MemoryPool;
use crate::queue::BoundedQueue;
use crate::reader;
use crate::threadpool::TPool;
use crate::util::{ceil_div, count_cores, existing_file_len};
use crate::writer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskType {
    Hdd,
    Ssd,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub block_size: u64,
    pub disk_type: DiskType,
    pub max_ram_size: u64,
}

/// Derived sizing, split out from [`Options`] so it can be unit-tested
/// without touching the filesystem.
struct PlanSizing {
    reader_tasks: usize,
    hasher_tasks: usize,
    max_queue_elems: usize,
}

fn plan_sizing(disk_type: DiskType, block_size: u64, max_ram_size: u64) -> Result<PlanSizing, SignatureError> {
    let hardware_threads = count_cores();
    let t = hardware_threads.saturating_sub(1).max(3);

    let reader_tasks = match disk_type {
        DiskType::Ssd => ceil_div(t as u64, 4) as usize,
        DiskType::Hdd => 1,
    };
    let writer_tasks = 1usize;
    let hasher_tasks = ceil_div(t as u64 * 3, 4) as usize;

    if reader_tasks + writer_tasks >= t {
        return Err(SignatureError::Programming(format!(
            "reader_tasks ({reader_tasks}) + writer_tasks ({writer_tasks}) must be < T ({t})"
        )));
    }

    let per_elem = block_size + 1;
    let max_queue_elems = (max_ram_size / per_elem) as usize;
    if max_queue_elems == 0 {
        return Err(SignatureError::Config(format!(
            "Max RAM size is too small to hold even a single {block_size}-byte block"
        )));
    }

    Ok(PlanSizing {
        reader_tasks,
        hasher_tasks,
        max_queue_elems,
    })
}

/// Restores the output file to its pre-run state: truncates to
/// `original_len` if it existed, or removes it if it did not. Filesystem
/// errors here are logged, not propagated — the original failure must be
/// the one the caller sees.
fn rollback(path: &std::path::Path, original_len: Option<u64>) {
    let result = match original_len {
        Some(len) => std::fs::OpenOptions::new()
            .write(true)
            .open(path)
            .and_then(|f| f.set_len(len)),
        None => std::fs::remove_file(path).or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(e)
            }
        }),
    };
    if let Err(e) = result {
        crate::displaylevel!(1, "warning: failed to roll back output file {:?}: {}\n", path, e);
    }
}

/// Runs the full read → hash → write pipeline described by `options`.
///
/// On success the output file has grown by one byte per input block. On
/// failure the output file is restored to its pre-run state before the error
/// is returned.
pub fn run(options: &Options) -> Result<(), SignatureError> {
    let sizing = plan_sizing(options.disk_type, options.block_size, options.max_ram_size)?;

    let original_output_len = existing_file_len(&options.output_file);
    let writing_pos_shift = original_output_len.unwrap_or(0);

    let input_len = std::fs::metadata(&options.input_file)
        .map_err(|e| SignatureError::io(crate::error::IoOrigin::Input, &options.input_file, e))?
        .len();

    let blocks_per_frame = reader::blocks_per_frame(input_len, options.block_size);

    let input_pool = Arc::new(MemoryPool::new());
    let output_pool = Arc::new(MemoryPool::new());

    let configs = Arc::new(reader::make_frame_configs(
        input_len,
        options.block_size,
        Arc::clone(&input_pool),
    )?);

    crate::displaylevel!(
        3,
        "signing {:?}: {} block(s) across {} frame(s), {} reader task(s), {} hasher task(s)\n",
        options.input_file,
        ceil_div(input_len.max(1), options.block_size),
        configs.len(),
        sizing.reader_tasks,
        sizing.hasher_tasks
    );

    let input_queue = Arc::new(BoundedQueue::<DataFrame>::new(sizing.max_queue_elems));
    let output_queue = Arc::new(BoundedQueue::<DataFrame>::new(sizing.max_queue_elems));

    let reading_finished = Arc::new(AtomicBool::new(false));
    let hashing_finished = Arc::new(AtomicBool::new(false));

    // T includes every long-lived task the controller submits; the pool's own
    // internal queue absorbs any momentary oversubscription, so this need not
    // be a hard upper bound on concurrently-running tasks.
    let hardware_threads = count_cores();
    let t = hardware_threads.saturating_sub(1).max(3);
    let pool = TPool::new(t, sizing.max_queue_elems.max(1))
        .ok_or_else(|| SignatureError::Programming("failed to construct thread pool".into()))?;

    let run_result = (|| -> Result<(), SignatureError> {
        // Reader started first, then writer (before the hasher) — submitting
        // the writer ahead of the hasher tasks guarantees it gets a pool slot
        // even if reader + hasher tasks would otherwise fill every thread.
        let reader_handles = reader::spawn_readers(
            &pool,
            options.input_file.clone(),
            Arc::clone(&configs),
            Arc::clone(&input_queue),
            sizing.reader_tasks,
        );

        let writer_handle = writer::spawn_writer(
            &pool,
            options.output_file.clone(),
            Arc::clone(&output_queue),
            Arc::clone(&hashing_finished),
            writing_pos_shift,
        );

        let hasher_handles = hasher::calculate_for_whole_queue(
            &pool,
            CalculateForWholeQueueParams {
                src: Arc::clone(&input_queue),
                dest: Arc::clone(&output_queue),
                has_producer_finished: Arc::clone(&reading_finished),
                tasks_count: sizing.hasher_tasks,
                dest_pool: output_pool,
                full_blocks_per_frame: blocks_per_frame as usize,
            },
        );

        hasher::join_and_rethrow(reader_handles)?;
        reading_finished.store(true, Ordering::Release);

        hasher::join_and_rethrow(hasher_handles)?;
        hashing_finished.store(true, Ordering::Release);

        writer_handle.join()?;
        Ok(())
    })();

    if run_result.is_err() {
        reading_finished.store(true, Ordering::Release);
        hashing_finished.store(true, Ordering::Release);
        drop(pool); // waits for any still-running tasks before touching the file
        rollback(&options.output_file, original_output_len);
    }

    run_result
}
