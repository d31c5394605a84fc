//! Binary entry point: parses the CLI, runs the pipeline, and maps the
//! result onto the project's exit-code taxonomy.

use anyhow::Context;
use clap::Parser;

use crc8sig::cli::{to_options, Cli};
use crc8sig::error::{exit_code, ExitCode, SignatureError};

/// Runs the pipeline under `anyhow`, attaching a one-line "what was being
/// attempted" context on top of the typed [`SignatureError`] that the lower
/// layers raise, without inventing any new error variants of its own.
fn run(cli: Cli) -> anyhow::Result<()> {
    crc8sig::log::set_display_level(2 + cli.verbose as u32);
    let options = to_options(&cli)?;
    crc8sig::pipeline::run(&options)
        .with_context(|| format!("signing {:?} into {:?}", options.input_file, options.output_file))
}

fn main() {
    // `clap`'s own exit codes (2 for a usage error, 0 for --help/--version)
    // don't match this project's taxonomy, so parsing is handled here rather
    // than via `Cli::parse()`: a genuine parse failure becomes `BadUsage`
    // (exit 1), while `-h`/`--version` still print and exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            eprint!("{e}");
            std::process::exit(ExitCode::BadUsage as i32);
        }
        Err(e) => {
            print!("{e}");
            std::process::exit(ExitCode::Success as i32);
        }
    };

    let code = match run(cli) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("crc8sig: {e:#}");
            // The context wrapper is informational only; the exit code still
            // comes from the typed error at the root of the chain.
            e.downcast_ref::<SignatureError>()
                .map(exit_code)
                .unwrap_or(ExitCode::Unknown)
        }
    };
    std::process::exit(code as i32);
}
