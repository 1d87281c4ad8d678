//! Diagnostics collection and log routing.
//!
//! Conditions that are worth reporting but must not interrupt control flow (an unknown
//! comment charset, deleting an absent key, a collaborator call that failed and was
//! translated into an error) are emitted as [`Diagnostic`] records. Each record is
//!
//! - filtered against the process-wide [`LogMsg`] level,
//! - forwarded to the [`log`] facade under the `metabind` target at the matching level,
//! - appended to the innermost active [`Capture`] on the current thread, if any.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - Thread-safe container for diagnostic entries
//! - [`Diagnostic`] - Individual diagnostic entry with severity and context
//! - [`DiagnosticSeverity`] - Severity level (Debug, Info, Warning, Error)
//! - [`DiagnosticCategory`] - Category of the diagnostic source
//! - [`LogMsg`] / [`LogLevel`] - Process-wide level configuration
//!
//! # Usage Examples
//!
//! ```rust
//! use metabind::diagnostics::{DiagnosticCategory, LogLevel, LogMsg};
//! use metabind::{CharsetId, Value};
//!
//! let capture = LogMsg::capture();
//! let mut comment = Value::comment(CharsetId::Undefined, "");
//! comment.read_str("charset=Invalid Hello")?;
//!
//! if LogMsg::level() <= LogLevel::Warn {
//!     assert_eq!(capture.by_category(DiagnosticCategory::Value).len(), 1);
//! }
//! # Ok::<(), metabind::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`Diagnostics`] uses `boxcar::Vec` internally, which provides lock-free concurrent
//! append operations. The level is stored in an atomic; captures are per thread.

use std::{
    cell::RefCell,
    fmt::{self, Write},
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
};

use strum::{Display, EnumString, FromRepr};

use crate::ErrorCode;

/// The `log` target every record is emitted under.
pub const LOG_TARGET: &str = "metabind";

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    /// Tracing detail, e.g. a translated collaborator failure.
    Debug,

    /// Informational message, not indicating a problem.
    Info,

    /// Input was accepted with a fallback, e.g. an unknown charset read as `Undefined`.
    Warning,

    /// An operation failed in a way the caller may not observe directly.
    Error,
}

impl DiagnosticSeverity {
    fn log_level(self) -> log::Level {
        match self {
            DiagnosticSeverity::Debug => log::Level::Debug,
            DiagnosticSeverity::Info => log::Level::Info,
            DiagnosticSeverity::Warning => log::Level::Warn,
            DiagnosticSeverity::Error => log::Level::Error,
        }
    }

    fn passes(self, level: LogLevel) -> bool {
        let rank = match self {
            DiagnosticSeverity::Debug => LogLevel::Debug,
            DiagnosticSeverity::Info => LogLevel::Info,
            DiagnosticSeverity::Warning => LogLevel::Warn,
            DiagnosticSeverity::Error => LogLevel::Error,
        };
        level != LogLevel::Mute && rank >= level
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Debug => write!(f, "DEBUG"),
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category indicating the source of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DiagnosticCategory {
    /// Value parsing and encoding.
    Value,

    /// Container operations (lookup, erase, indexed access).
    Container,

    /// Buffers and views.
    Buffer,

    /// XMP packet handling and the parser context.
    Xmp,

    /// Image collaborators.
    Image,

    /// Everything else.
    General,
}

/// A single diagnostic entry with context information.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// Optional error code the condition corresponds to.
    pub code: Option<ErrorCode>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            code: None,
        }
    }

    /// Adds error code information to the diagnostic.
    #[must_use]
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(code) = self.code {
            write!(f, " (code: {} {})", code as i32, code)?;
        }

        Ok(())
    }
}

/// Thread-safe container for collecting diagnostic entries.
///
/// Uses `boxcar::Vec` internally for lock-free concurrent append operations.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds a diagnostic entry.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any warning-level diagnostics have been collected.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of diagnostics with the given severity.
    pub fn count_of(&self, severity: DiagnosticSeverity) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == severity)
            .count()
    }

    /// Returns an iterator over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.category == category)
            .map(|(_, d)| d)
            .collect()
    }

    /// Returns diagnostics carrying the given error code.
    pub fn by_code(&self, code: ErrorCode) -> Vec<&Diagnostic> {
        self.entries
            .iter()
            .filter(|(_, d)| d.code == Some(code))
            .map(|(_, d)| d)
            .collect()
    }

    /// Formats a summary of all diagnostics for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "Diagnostics: {} error(s), {} warning(s), {} info(s), {} debug",
            self.count_of(DiagnosticSeverity::Error),
            self.count_of(DiagnosticSeverity::Warning),
            self.count_of(DiagnosticSeverity::Info),
            self.count_of(DiagnosticSeverity::Debug),
        );

        for diag in self.iter() {
            let _ = writeln!(output, "  {diag}");
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Minimum severity the library reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, FromRepr,
)]
#[repr(u8)]
pub enum LogLevel {
    /// Report everything
    Debug = 0,
    /// Report informational messages and above
    Info = 1,
    /// Report warnings and errors
    Warn = 2,
    /// Report errors only
    Error = 3,
    /// Report nothing
    Mute = 4,
}

static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);

thread_local! {
    static CAPTURES: RefCell<Vec<Arc<Diagnostics>>> = const { RefCell::new(Vec::new()) };
}

/// Process-wide log configuration.
///
/// The level defaults to [`LogLevel::Warn`]. It filters records before they reach the
/// `log` facade or a [`Capture`]; the facade's own filtering applies on top.
pub struct LogMsg;

impl LogMsg {
    /// Returns the current level.
    #[must_use]
    pub fn level() -> LogLevel {
        LogLevel::from_repr(LEVEL.load(Ordering::Relaxed)).unwrap_or(LogLevel::Warn)
    }

    /// Sets the level for the whole process.
    pub fn set_level(level: LogLevel) {
        LEVEL.store(level as u8, Ordering::Relaxed);
    }

    /// Starts capturing diagnostics emitted on the current thread.
    ///
    /// Records are delivered to the innermost live capture only. The capture ends when the
    /// returned guard is dropped.
    #[must_use]
    pub fn capture() -> Capture {
        let diagnostics = Arc::new(Diagnostics::new());
        CAPTURES.with(|stack| stack.borrow_mut().push(Arc::clone(&diagnostics)));
        Capture { diagnostics }
    }
}

/// Scope guard returned by [`LogMsg::capture`]; dereferences to the collected
/// [`Diagnostics`].
#[derive(Debug)]
pub struct Capture {
    diagnostics: Arc<Diagnostics>,
}

impl Capture {
    /// Returns a shared handle to the collected records that outlives the guard.
    #[must_use]
    pub fn diagnostics(&self) -> Arc<Diagnostics> {
        Arc::clone(&self.diagnostics)
    }
}

impl std::ops::Deref for Capture {
    type Target = Diagnostics;

    fn deref(&self) -> &Self::Target {
        &self.diagnostics
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        let _ = CAPTURES.try_with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack
                .iter()
                .rposition(|entry| Arc::ptr_eq(entry, &self.diagnostics))
            {
                stack.remove(pos);
            }
        });
    }
}

/// Emits a diagnostic record.
pub(crate) fn emit(diagnostic: Diagnostic) {
    if !diagnostic.severity.passes(LogMsg::level()) {
        return;
    }

    log::log!(
        target: LOG_TARGET,
        diagnostic.severity.log_level(),
        "{}",
        diagnostic.message
    );

    let _ = CAPTURES.try_with(|stack| {
        if let Some(capture) = stack.borrow().last() {
            capture.push(diagnostic);
        }
    });
}

pub(crate) fn debug(category: DiagnosticCategory, message: impl Into<String>) {
    emit(Diagnostic::new(DiagnosticSeverity::Debug, category, message));
}

pub(crate) fn warning(category: DiagnosticCategory, code: ErrorCode, message: impl Into<String>) {
    emit(Diagnostic::new(DiagnosticSeverity::Warning, category, message).with_code(code));
}
