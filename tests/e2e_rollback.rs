// Crash-safety coverage: an induced failure mid-run must leave the output
// file exactly as it was before the run started (same bytes, or still
// absent), never partially signed.

use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

fn crc8sig_bin() -> PathBuf {
    if let Ok(p) = std::env::var("CARGO_BIN_EXE_crc8sig") {
        return PathBuf::from(p);
    }
    let mut p = std::env::current_exe().unwrap();
    p.pop();
    if p.ends_with("deps") {
        p.pop();
    }
    p.push("crc8sig");
    p
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(crc8sig_bin())
        .args(args)
        .output()
        .expect("failed to run crc8sig")
}

#[test]
fn e6_rollback_restores_pre_existing_output_on_mid_run_read_failure() {
    let dir = TempDir::new().unwrap();
    // A directory in place of the input file: `File::open` on it succeeds
    // (Unix permits opening a directory for reading), but the reader task's
    // subsequent `read()` call fails with EISDIR once it actually runs —
    // a genuine I/O failure that fires only after the pipeline is underway,
    // independent of file permissions or the invoking user's privileges.
    let input = dir.path().join("not_a_file");
    std::fs::create_dir(&input).unwrap();
    // A few entries so the directory's reported size is unambiguously
    // non-zero across filesystems, guaranteeing at least one block is read.
    for i in 0..8 {
        std::fs::write(input.join(format!("entry{i}")), []).unwrap();
    }
    let output = dir.path().join("out.sig");
    std::fs::write(&output, [0x01, 0x02, 0x30]).unwrap();

    let out = run(&[
        "-i", input.to_str().unwrap(),
        "-o", output.to_str().unwrap(),
        "-s", "16",
    ]);

    assert!(!out.status.success());
    assert_eq!(std::fs::read(&output).unwrap(), vec![0x01, 0x02, 0x30]);
}

#[test]
fn rollback_removes_output_that_did_not_exist_before_the_run() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.bin");
    let output = dir.path().join("out.sig");
    std::fs::write(&input, vec![0u8; 4096]).unwrap();

    // RAM budget too small for even one queue slot: the run fails before the
    // output file is ever created.
    let out = run(&[
        "-i", input.to_str().unwrap(),
        "-o", output.to_str().unwrap(),
        "-s", "3MB",
        "-m", "1KB",
    ]);

    assert!(!out.status.success());
    assert!(!output.exists());
}

#[test]
fn failed_run_never_leaves_a_partial_signature_visible() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("missing_input.bin");
    let output = dir.path().join("out.sig");
    // Input file does not exist: metadata() fails before any stage starts.

    let out = run(&[
        "-i", input.to_str().unwrap(),
        "-o", output.to_str().unwrap(),
        "-s", "64",
    ]);

    assert!(!out.status.success());
    assert!(!output.exists());
}
