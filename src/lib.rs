//! Bounded-memory parallel CRC-8 (Dallas/Maxim) file-signature pipeline.
//!
//! Computes one signature byte per fixed-size block of an input file by
//! running independent read, hash, and write stages concurrently across a
//! shared thread pool, backpressured by RAM-budgeted bounded queues. See
//! [`pipeline::run`] for the entry point.

pub mod buffer;
pub mod cli;
pub mod error;
pub mod frame;
pub mod hasher;
pub mod log;
pub mod memsize;
pub mod pipeline;
pub mod pool;
pub mod queue;
pub mod reader;
pub mod threadpool;
pub mod util;
pub mod writer;

pub use error::SignatureError;
pub use pipeline::{DiskType, Options};
