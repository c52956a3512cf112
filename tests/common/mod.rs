//! Shared test infrastructure for integration tests.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub const ONEDRIVE_REQUEST: &str = "Migrate file shares to OneDrive";

pub fn manifest_dir() -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()))
}

/// Recorded collaborator answers for the OneDrive assessment.
pub fn onedrive_responses() -> PathBuf {
    manifest_dir().join("tests/fixtures/onedrive")
}

/// Copy the recorded answers into `dest`, leaving out the named phases.
pub fn copy_responses_without(dest: &Path, skip: &[&str]) -> PathBuf {
    fs::create_dir_all(dest).expect("create responses dir");
    for entry in fs::read_dir(onedrive_responses()).expect("read fixtures") {
        let entry = entry.expect("fixture entry");
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let phase = name.trim_end_matches(".json");
        if skip.contains(&phase) {
            continue;
        }
        fs::copy(entry.path(), dest.join(name.as_ref())).expect("copy fixture");
    }
    dest.to_path_buf()
}

/// Run `euca` with a clean environment for config discovery and logging.
pub fn euca(args: &[&str], home: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_euca"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("EUCA_LM_COMMAND")
        .env("RUST_LOG", "warn")
        .output()
        .expect("spawn euca")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
