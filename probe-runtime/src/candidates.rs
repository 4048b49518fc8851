use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};

/// Cargo target directory searched by default.
pub const DEFAULT_TARGET_DIR: &str = "target";
/// Name of the native library crate, without platform prefix and suffix.
pub const DEFAULT_LIBRARY_NAME: &str = "zxing_rust";
/// Build profiles in the order their artifacts are preferred.
pub const DEFAULT_PROFILES: [&str; 2] = ["debug", "release"];

/// Returns the platform specific file name of a dynamic library,
/// for example `libzxing_rust.so`, `libzxing_rust.dylib` or `zxing_rust.dll`.
pub fn library_file_name(library_name: &str) -> String {
    format!("{}{}{}", DLL_PREFIX, library_name, DLL_SUFFIX)
}

/// An ordered list of locations where the native library may be found,
/// most preferred first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePaths {
    paths: Vec<PathBuf>,
}

impl CandidatePaths {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Candidates for a library built by cargo: the debug artifact first, then the release one.
    pub fn for_library(target_dir: impl AsRef<Path>, library_name: &str) -> Self {
        let file_name = library_file_name(library_name);
        Self::new(
            DEFAULT_PROFILES
                .iter()
                .map(|profile| target_dir.as_ref().join(profile).join(&file_name)),
        )
    }

    pub fn with_candidate(mut self, path: impl Into<PathBuf>) -> Self {
        self.push(path);
        self
    }

    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for CandidatePaths {
    fn default() -> Self {
        Self::for_library(DEFAULT_TARGET_DIR, DEFAULT_LIBRARY_NAME)
    }
}

impl FromIterator<PathBuf> for CandidatePaths {
    fn from_iter<T: IntoIterator<Item = PathBuf>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a CandidatePaths {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}
