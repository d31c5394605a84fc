//! Command-line front-end (C10).
//!
//! A small `clap`-derived surface: input/output paths, block size, storage
//! medium hint, and a RAM budget, each accepting the project's memory-size
//! literal grammar where relevant.

use std::path::PathBuf;

use clap::Parser;

use crate::error::SignatureError;
use crate::memsize::parse_memory_size;
use crate::pipeline::{DiskType, Options};

#[derive(Parser, Debug)]
#[command(name = "crc8sig", version, about = "Computes a per-block CRC-8 (Dallas/Maxim) signature of a file")]
pub struct Cli {
    /// Input file to sign.
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input_file: PathBuf,

    /// Output file the signature bytes are (appended and) written to.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output_file: PathBuf,

    /// Block size, e.g. "512", "64KB", "1MB". Defaults to 1MB.
    #[arg(short = 's', long = "block-size", value_name = "SIZE", default_value = "1MB")]
    pub block_size: String,

    /// Storage medium hint, "HDD" or "SSD". Defaults to HDD.
    #[arg(short = 't', long = "disk-type", value_name = "HDD|SSD", default_value = "HDD")]
    pub disk_type: String,

    /// Maximum RAM budget for in-flight frames, e.g. "3GB". Defaults to 3GB.
    #[arg(short = 'm', long = "max-ram", value_name = "SIZE", default_value = "3GB")]
    pub max_ram_size: String,

    /// Increase progress-reporting verbosity; may be repeated.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parses the raw `clap` CLI into pipeline-ready [`Options`], validating the
/// memory-size literals and the disk-type literal along the way.
pub fn to_options(cli: &Cli) -> Result<Options, SignatureError> {
    let block_size = parse_memory_size(&cli.block_size)?;
    if block_size == 0 {
        return Err(SignatureError::Config("block size must be non-zero".into()));
    }
    let max_ram_size = parse_memory_size(&cli.max_ram_size)?;
    let disk_type = match cli.disk_type.as_str() {
        "HDD" => DiskType::Hdd,
        "SSD" => DiskType::Ssd,
        other => {
            return Err(SignatureError::Config(format!(
                "invalid disk type {other:?}: expected \"HDD\" or \"SSD\""
            )))
        }
    };

    Ok(Options {
        input_file: cli.input_file.clone(),
        output_file: cli.output_file.clone(),
        block_size,
        disk_type,
        max_ram_size,
    })
}
