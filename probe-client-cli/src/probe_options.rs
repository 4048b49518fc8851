use clap::Parser;
use probe_runtime::{CandidatePaths, Probe, DEFAULT_LIBRARY_NAME, DEFAULT_TARGET_DIR};
use std::path::{Path, PathBuf};

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct ProbeOptions {
    /// Paths of the native library to try, most preferred first.
    /// When omitted, the debug and then the release build inside the target directory are tried.
    #[clap(value_name = "LIBRARY")]
    libraries: Vec<PathBuf>,
    /// Cargo target directory that contains the default candidates
    #[clap(long, value_name = "DIR", default_value = DEFAULT_TARGET_DIR)]
    target_dir: PathBuf,
    /// Name of the native library without the platform prefix and extension
    #[clap(long, value_name = "NAME", default_value = DEFAULT_LIBRARY_NAME)]
    library_name: String,
    /// First operand of the `add` probe
    #[clap(long, default_value_t = 2, allow_negative_numbers = true)]
    lhs: i32,
    /// Second operand of the `add` probe
    #[clap(long, default_value_t = 3, allow_negative_numbers = true)]
    rhs: i32,
    /// Input file passed to the `decode` probe
    #[clap(long, value_name = "PATH", default_value = "test.png")]
    input: PathBuf,
}

impl ProbeOptions {
    pub fn candidates(&self) -> CandidatePaths {
        if self.libraries.is_empty() {
            CandidatePaths::for_library(&self.target_dir, &self.library_name)
        } else {
            CandidatePaths::new(self.libraries.iter().cloned())
        }
    }

    pub fn input(&self) -> &Path {
        self.input.as_path()
    }

    pub fn probes(&self) -> Vec<Probe> {
        vec![Probe::add(self.lhs, self.rhs), Probe::decode(self.input())]
    }
}
