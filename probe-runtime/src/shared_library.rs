use crate::{LibraryHandle, ProbeError, Result};
use parking_lot::RwLock;
use std::sync::Arc;

/// A library handle shared between threads.
///
/// Any number of threads may use the library at the same time, while unloading
/// waits for all of them to finish and makes every later use fail with
/// [`ProbeError::LibraryUnloaded`].
#[derive(Debug, Clone)]
pub struct SharedLibrary {
    handle: Arc<RwLock<Option<LibraryHandle>>>,
}

impl SharedLibrary {
    pub fn new(handle: LibraryHandle) -> Self {
        Self {
            handle: Arc::new(RwLock::new(Some(handle))),
        }
    }

    pub fn with_library<R>(&self, f: impl FnOnce(&LibraryHandle) -> R) -> Result<R> {
        let handle = self.handle.read();
        match handle.as_ref() {
            Some(library) => Ok(f(library)),
            None => ProbeError::LibraryUnloaded.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.read().is_some()
    }

    pub fn unload(&self) -> Result<()> {
        let handle = self.handle.write().take();
        match handle {
            Some(library) => library.close(),
            None => ProbeError::LibraryUnloaded.into(),
        }
    }
}

impl From<LibraryHandle> for SharedLibrary {
    fn from(handle: LibraryHandle) -> Self {
        Self::new(handle)
    }
}
