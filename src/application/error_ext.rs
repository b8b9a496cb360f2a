//! Error conversion helpers for source I/O
//!
//! Provides extension traits for cleaner error handling with source context.

use std::io;

use crate::application::error::SourceKind;
use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// store.replace(&cache).with_context("replace facet cache")?;
    /// ```
    fn with_context(self, action: &str) -> ApplicationResult<T>;

    /// Map an I/O error to `MissingSource` for the given source.
    fn or_missing(self, source: SourceKind) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: action.to_string(),
            source: Box::new(e),
        })
    }

    fn or_missing(self, source: SourceKind) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::missing(source, e.to_string()))
    }
}
