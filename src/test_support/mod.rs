//! Test utilities and mocks for versioner unit tests.
//!
//! [`MockFrontend`] stands in for clang so the compile driver can be tested
//! without a toolchain; the fixtures build declarations and on-disk header
//! trees.
//!
//! # Example
//!
//! ```rust,ignore
//! use versioner::test_support::{unit, HeaderTree, MockFrontend};
//!
//! #[test]
//! fn test_example() {
//!     let tree = HeaderTree::new().header("stdio.h", "");
//!     let frontend = MockFrontend::new(|inv| {
//!         Ok(unit(&inv.source, &[("fopen", 3, false, &["introduced_in=9"])]))
//!     });
//!
//!     // Compile `tree.headers()` with `frontend`...
//! }
//! ```

pub mod fixtures;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;

use crate::core::CompilationType;
use crate::frontend::{CompileInvocation, Frontend, TranslationUnit};

// Re-export fixtures for convenience
pub use fixtures::*;

type Handler = dyn Fn(&CompileInvocation) -> Result<TranslationUnit> + Send + Sync;

/// Scripted front end.
///
/// Every call is answered by the handler and recorded, along with how many
/// calls were in flight at once.
pub struct MockFrontend {
    handler: Box<Handler>,
    calls: Mutex<Vec<(CompilationType, PathBuf)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFrontend {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&CompileInvocation) -> Result<TranslationUnit> + Send + Sync + 'static,
    {
        MockFrontend {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every `(configuration, source)` parsed so far, sorted.
    pub fn calls(&self) -> Vec<(CompilationType, PathBuf)> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }

    /// Highest number of concurrent `parse` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Frontend for MockFrontend {
    fn parse(&self, invocation: &CompileInvocation) -> Result<TranslationUnit> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.calls
            .lock()
            .unwrap()
            .push((invocation.compilation_type, invocation.source.clone()));
        let result = (self.handler)(invocation);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Arch;

    #[test]
    fn test_mock_frontend_records_calls() {
        let frontend = MockFrontend::new(|inv| Ok(unit(&inv.source, &[("foo", 1, false, &[])])));
        let ty = CompilationType::new(Arch::Arm, 21, 32);
        let inv = CompileInvocation::new(ty, "/h/foo.h", "/h", Vec::new());

        let unit = frontend.parse(&inv).unwrap();

        assert_eq!(unit.declarations[0].name, "foo");
        assert_eq!(frontend.calls(), [(ty, PathBuf::from("/h/foo.h"))]);
        assert_eq!(frontend.max_in_flight(), 1);
    }
}
