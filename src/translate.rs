//! Translation of collaborator failures into [`crate::Error::Native`].
//!
//! Every call into an external collaborator (file system, memory map, XMP toolkit) goes
//! through [`native`]. Failures come back as a single error kind carrying a stable
//! [`ErrorCode`] and a message naming the operation, and are logged at debug level.

use crate::{
    diagnostics::{self, DiagnosticCategory},
    Error, ErrorCode, Result,
};

/// Runs a collaborator call and translates its failure.
///
/// Errors that already carry a code of their own ([`Error::Native`], [`Error::Parse`])
/// pass through unchanged. Everything else is rewrapped as
/// `Error::Native { code, message: "<op>: <cause>" }`.
///
/// # Errors
///
/// Returns the translated failure of `f`.
///
/// # Examples
///
/// ```rust
/// use metabind::{translate::native, Error, ErrorCode};
///
/// let result: metabind::Result<Vec<u8>> = native("read", ErrorCode::DataSourceOpenFailed, || {
///     Ok(std::fs::read("/does/not/exist")?)
/// });
///
/// match result {
///     Err(Error::Native { code, message }) => {
///         assert_eq!(code, ErrorCode::DataSourceOpenFailed);
///         assert!(message.starts_with("read: "));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn native<T, F>(op: &str, code: ErrorCode, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f().map_err(|err| {
        let translated = match err {
            Error::Native { .. } | Error::Parse { .. } => err,
            other => Error::Native {
                code,
                message: format!("{op}: {other}"),
            },
        };

        diagnostics::debug(
            DiagnosticCategory::Image,
            format!("{op} failed ({}): {translated}", translated.code() as i32),
        );
        translated
    })
}
