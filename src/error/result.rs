//! Result type alias for sift operations.

use super::context::ErrorContext;
use super::sift_error::SiftError;

/// Type alias for Results using SiftError.
pub type SiftResult<T> = Result<T, SiftError>;

/// Extension trait for Result types to add context to errors.
pub trait ResultExt<T> {
    /// Add context to an error if the result is Err.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use sift::error::{ErrorContext, ResultExt};
    ///
    /// let expr = sift::filter::compile(text)
    ///     .context(ErrorContext::new("compile_filter").with_component("store"))?;
    /// ```
    fn context(self, ctx: ErrorContext) -> SiftResult<T>;

    /// Add context using a closure (only called on error).
    fn with_context<F>(self, f: F) -> SiftResult<T>
    where
        F: FnOnce() -> ErrorContext;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<SiftError>,
{
    fn context(self, ctx: ErrorContext) -> SiftResult<T> {
        self.map_err(|e| e.into().with_context(ctx))
    }

    fn with_context<F>(self, f: F) -> SiftResult<T>
    where
        F: FnOnce() -> ErrorContext,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
