use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = core::result::Result<T, ProbeError>;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("No candidate paths were given for the native library")]
    NoCandidates,
    #[error("Could not load the native library from any of {count} candidate(s):\n{0}", count = .0.len())]
    LibraryNotFound(CandidateFailures),
    #[error("Symbol `{symbol}` is not exported by the library")]
    SymbolNotFound {
        symbol: String,
        #[source]
        source: Option<libloading::Error>,
    },
    #[error("Signature of `{symbol}` does not match: {reason}")]
    SignatureMismatch { symbol: String, reason: String },
    #[error("Invocation of `{symbol}` failed: {reason}")]
    InvocationFailure { symbol: String, reason: String },
    #[error("Failed to release the library")]
    LibraryRelease(#[source] libloading::Error),
    #[error("The library was already unloaded")]
    LibraryUnloaded,
}

impl ProbeError {
    pub fn kind(&self) -> ProbeErrorKind {
        match self {
            ProbeError::NoCandidates => ProbeErrorKind::NoCandidates,
            ProbeError::LibraryNotFound(_) => ProbeErrorKind::LibraryNotFound,
            ProbeError::SymbolNotFound { .. } => ProbeErrorKind::SymbolNotFound,
            ProbeError::SignatureMismatch { .. } => ProbeErrorKind::SignatureMismatch,
            ProbeError::InvocationFailure { .. } => ProbeErrorKind::InvocationFailure,
            ProbeError::LibraryRelease(_) => ProbeErrorKind::LibraryRelease,
            ProbeError::LibraryUnloaded => ProbeErrorKind::LibraryUnloaded,
        }
    }
}

impl<T> From<ProbeError> for std::result::Result<T, ProbeError> {
    fn from(error: ProbeError) -> Self {
        Err(error)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProbeErrorKind {
    NoCandidates,
    LibraryNotFound,
    SymbolNotFound,
    SignatureMismatch,
    InvocationFailure,
    LibraryRelease,
    LibraryUnloaded,
}

impl Display for ProbeErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProbeErrorKind::NoCandidates => "no candidates",
            ProbeErrorKind::LibraryNotFound => "library not found",
            ProbeErrorKind::SymbolNotFound => "symbol not found",
            ProbeErrorKind::SignatureMismatch => "signature mismatch",
            ProbeErrorKind::InvocationFailure => "invocation failure",
            ProbeErrorKind::LibraryRelease => "library release",
            ProbeErrorKind::LibraryUnloaded => "library unloaded",
        };
        f.write_str(name)
    }
}

/// Why a single candidate path could not be loaded.
#[derive(Error, Debug)]
pub enum CandidateFailureReason {
    #[error("file does not exist")]
    Missing,
    #[error("failed to canonicalize the path: {0}")]
    Canonicalization(#[source] to_absolute::Error),
    #[error("failed to load the library: {0}")]
    LoadFailed(#[source] libloading::Error),
}

#[derive(Debug)]
pub struct CandidateFailure {
    path: PathBuf,
    reason: CandidateFailureReason,
}

impl CandidateFailure {
    pub fn new(path: impl Into<PathBuf>, reason: CandidateFailureReason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn reason(&self) -> &CandidateFailureReason {
        &self.reason
    }
}

impl Display for CandidateFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Per-candidate failures in the order the candidates were tried.
#[derive(Debug, Default)]
pub struct CandidateFailures {
    failures: Vec<CandidateFailure>,
}

impl CandidateFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: CandidateFailure) {
        self.failures.push(failure);
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateFailure> {
        self.failures.iter()
    }
}

impl Display for CandidateFailures {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, failure) in self.failures.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}. {}", index + 1, failure)?;
        }
        Ok(())
    }
}
