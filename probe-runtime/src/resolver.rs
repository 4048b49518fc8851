use crate::{
    CandidateFailure, CandidateFailureReason, CandidateFailures, CandidatePaths, ProbeError,
    Result, Signature, SymbolBinding,
};
use libloading::Library;
use std::path::{Path, PathBuf};

/// Loads exactly one native library from a fixed, ordered list of candidates.
///
/// Candidates are tried one at a time in order and the first one that loads wins.
/// Nothing outside of the list is searched: every candidate is canonicalized before
/// it is handed to the system loader, so a bare file name never falls back to the
/// loader's own search path.
#[derive(Debug, Clone)]
pub struct LibraryResolver {
    candidates: CandidatePaths,
}

impl LibraryResolver {
    pub fn new(candidates: CandidatePaths) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &CandidatePaths {
        &self.candidates
    }

    pub fn resolve(&self) -> Result<LibraryHandle> {
        if self.candidates.is_empty() {
            return ProbeError::NoCandidates.into();
        }

        let mut failures = CandidateFailures::new();
        for candidate in self.candidates.iter() {
            debug!("Trying to load {}", candidate.display());
            match LibraryHandle::load(candidate) {
                Ok(handle) => {
                    info!(
                        "Loaded {} ({})",
                        handle.source_path().display(),
                        handle.loaded_path().display()
                    );
                    return Ok(handle);
                }
                Err(reason) => {
                    warn!("Could not load {}: {}", candidate.display(), reason);
                    failures.push(CandidateFailure::new(candidate, reason));
                }
            }
        }

        Err(ProbeError::LibraryNotFound(failures))
    }
}

/// An owned, loaded native library.
///
/// The library stays mapped until the handle is closed or dropped. Symbol bindings
/// borrow the handle, so none of them can outlive it.
#[derive(Debug)]
pub struct LibraryHandle {
    source_path: PathBuf,
    loaded_path: PathBuf,
    library: Library,
}

impl LibraryHandle {
    fn load(candidate: &Path) -> std::result::Result<Self, CandidateFailureReason> {
        if !candidate.exists() {
            return Err(CandidateFailureReason::Missing);
        }

        let loaded_path = to_absolute::canonicalize(candidate)
            .map_err(CandidateFailureReason::Canonicalization)?;

        // loading runs the library's initialisers
        let library = unsafe { Library::new(&loaded_path) }
            .map_err(CandidateFailureReason::LoadFailed)?;

        Ok(Self {
            source_path: candidate.to_path_buf(),
            loaded_path,
            library,
        })
    }

    /// The candidate path, as given to the resolver, that produced this handle.
    pub fn source_path(&self) -> &Path {
        self.source_path.as_path()
    }

    /// The canonical path that was handed to the system loader.
    pub fn loaded_path(&self) -> &Path {
        self.loaded_path.as_path()
    }

    /// Binds an exported function with an explicitly declared signature.
    ///
    /// The declaration is trusted: if it differs from the native function's
    /// actual C signature, calling the binding is undefined behaviour.
    pub fn bind(&self, symbol: &str, signature: Signature) -> Result<SymbolBinding<'_>> {
        SymbolBinding::new(self, symbol, signature)
    }

    pub(crate) fn library(&self) -> &Library {
        &self.library
    }

    /// Unloads the library, reporting whether the system loader released it.
    pub fn close(self) -> Result<()> {
        debug!("Unloading {}", self.loaded_path.display());
        self.library.close().map_err(ProbeError::LibraryRelease)
    }
}
