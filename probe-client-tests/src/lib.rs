use anyhow::{Context, Error};
use probe_runtime::{library_file_name, CandidatePaths};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

pub const TEST_LIBRARY_PACKAGE: &str = "probe-test-library";
pub const TEST_LIBRARY_NAME: &str = "probe_test_library";

static TEST_LIBRARY: OnceLock<PathBuf> = OnceLock::new();

fn workspace_manifest() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("the tests crate lives inside the workspace")
        .join("Cargo.toml")
}

/// Builds the test library in debug mode into `target_dir` and returns the path
/// to the produced dynamic library.
pub fn build_test_library(target_dir: &Path) -> Result<PathBuf, Error> {
    let output = Command::new(env!("CARGO"))
        .arg("build")
        .arg("--manifest-path")
        .arg(workspace_manifest())
        .arg("--package")
        .arg(TEST_LIBRARY_PACKAGE)
        .arg("--target-dir")
        .arg(target_dir)
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .stdout(Stdio::inherit())
        .output()
        .context("Unable to run cargo")?;

    if !output.status.success() {
        anyhow::bail!(
            "Command failed with exit code: {:?}",
            output.status.code(),
        );
    }

    let library = debug_library_path(target_dir);
    if !library.exists() {
        anyhow::bail!(
            "Unable to find the compiled library at \"{}\"",
            library.display()
        );
    }
    Ok(library)
}

/// Where cargo puts the debug build of the test library within `target_dir`.
pub fn debug_library_path(target_dir: &Path) -> PathBuf {
    target_dir
        .join("debug")
        .join(library_file_name(TEST_LIBRARY_NAME))
}

/// Candidates that cargo would produce for the test library within `target_dir`.
pub fn test_library_candidates(target_dir: &Path) -> CandidatePaths {
    CandidatePaths::for_library(target_dir, TEST_LIBRARY_NAME)
}

/// Builds the test library once per test binary.
pub fn test_library(target_dir: &Path) -> &'static Path {
    TEST_LIBRARY
        .get_or_init(|| {
            build_test_library(&target_dir.join("probe-test-library"))
                .expect("Failed to build the test library")
        })
        .as_path()
}

/// Writes the smallest PNG prefix that carries an `IHDR` chunk with the given size.
pub fn write_png_header(path: &Path, width: u32, height: u32) -> Result<(), Error> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    // bit depth, color type, compression, filter, interlace
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);

    std::fs::write(path, bytes)
        .with_context(|| format!("Couldn't write \"{}\"", path.display()))
}
