#[macro_use]
extern crate log;

mod candidates;
mod error;
mod ffi;
mod probe;
mod resolver;
mod shared_library;

pub use candidates::*;
pub use error::{
    CandidateFailure, CandidateFailureReason, CandidateFailures, ProbeError, ProbeErrorKind,
    Result,
};
pub use ffi::*;
pub use probe::*;
pub use resolver::{LibraryHandle, LibraryResolver};
pub use shared_library::SharedLibrary;
