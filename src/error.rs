use strum::{Display, EnumString, FromRepr, IntoStaticStr};
use thiserror::Error;

macro_rules! parse_error {
    // Explicit error code
    (code: $code:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::Parse {
            code: $code,
            message: format!($fmt $(, $arg)*),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::Parse {
            code: crate::ErrorCode::InvalidTypeValue,
            message: format!($fmt $(, $arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! range_error {
    ($value:expr, $type_name:expr) => {
        crate::Error::Range {
            value: $value.to_string(),
            type_name: $type_name,
        }
    };
}

macro_rules! native_error {
    ($code:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::Native {
            code: $code,
            message: format!($fmt $(, $arg)*),
        }
    };
}

/// Stable, machine readable classification of every error this crate raises.
///
/// The numeric values of the engine codes (`0..=62`) follow the metadata engine's own
/// error numbering so that codes reported by an image collaborator can be passed through
/// unchanged. Codes from `1000` upwards belong to the binding layer itself.
///
/// # Examples
///
/// ```rust
/// use metabind::ErrorCode;
///
/// assert_eq!(ErrorCode::InvalidKey as i32, 7);
/// assert_eq!(ErrorCode::from_repr(7), Some(ErrorCode::InvalidKey));
/// assert_eq!(ErrorCode::InvalidKey.to_string(), "InvalidKey");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, FromRepr, IntoStaticStr,
)]
#[repr(i32)]
pub enum ErrorCode {
    /// No error
    Success = 0,
    /// Unspecified failure
    GeneralError = 1,
    /// Free-form message from a collaborator
    ErrorMessage = 2,
    /// A collaborator call failed
    CallFailed = 3,
    /// The input is not an image
    NotAnImage = 4,
    /// Unknown IPTC dataset
    InvalidDataset = 5,
    /// Unknown IPTC record
    InvalidRecord = 6,
    /// Malformed or unknown key
    InvalidKey = 7,
    /// Unknown tag name
    InvalidTag = 8,
    /// A value was read before it was set
    ValueNotSet = 9,
    /// The data source could not be opened
    DataSourceOpenFailed = 10,
    /// A file could not be opened
    FileOpenFailed = 11,
    /// The file content is not a supported image type
    FileContainsUnknownImageType = 12,
    /// The memory block is not a supported image type
    MemoryContainsUnknownImageType = 13,
    /// Image type recognised but not supported
    UnsupportedImageType = 14,
    /// Image data could not be read
    FailedToReadImageData = 15,
    /// Writing the image failed
    ImageWriteFailed = 22,
    /// A value does not fit its storage width
    ValueTooLarge = 25,
    /// An offset points outside the data
    OffsetOutOfRange = 27,
    /// Unknown comment charset
    InvalidCharset = 29,
    /// Date text could not be parsed
    UnsupportedDateFormat = 30,
    /// Time text could not be parsed
    UnsupportedTimeFormat = 31,
    /// The operation is not supported for this object
    FunctionNotSupported = 35,
    /// The XMP prefix has no registered namespace
    NoNamespaceInfoForXmpPrefix = 36,
    /// The XMP toolkit failed or was not initialised
    XMPToolkitError = 41,
    /// A language alternative property could not be decoded
    DecodeLangAltPropertyFailed = 42,
    /// Malformed XMP text value
    InvalidXmpText = 49,
    /// Malformed XMP packet
    InvalidXMP = 55,
    /// A value has the wrong type for the requested operation
    InvalidTypeValue = 57,
    /// Malformed language alternative text
    InvalidLangAltValue = 58,
    /// Metadata is corrupted
    CorruptedMetadata = 60,
    /// Arithmetic overflow while decoding
    ArithmeticOverflow = 61,
    /// A key-addressed lookup found nothing
    KeyNotFound = 1000,
    /// A handle refers to data that changed or went away
    InvalidHandle = 1001,
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every variant maps to a stable [`ErrorCode`] through [`Error::code`], and its `Display`
/// implementation yields the human readable message. Soft failures (numeric coercions,
/// lookups of absent keys) are not reported through this type; they surface as `Option`
/// values and the [`crate::Value::ok`] flag instead.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Parse`] - Malformed textual or binary encoding
/// - [`Error::Range`] - Numeric value outside the storage width of a value type
/// - [`Error::UnsupportedType`] - Type identifier that cannot be instantiated
///
/// ## Access Errors
/// - [`Error::AccessDenied`] - Mutation through a read-only view
/// - [`Error::KeyNotFound`] - Strict lookup of an absent key
/// - [`Error::InvalidHandle`] - Stale cursor, reference or view
///
/// ## Collaborator Errors
/// - [`Error::Native`] - Failure reported by an image or XMP collaborator
/// - [`Error::Io`] - Filesystem I/O errors
///
/// # Examples
///
/// ```rust
/// use metabind::{Error, ErrorCode, Key};
///
/// match Key::parse("Exif.Nowhere.Model") {
///     Err(Error::Native { code, message }) => {
///         assert_eq!(code, ErrorCode::InvalidKey);
///         println!("rejected: {message}");
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The textual or binary encoding of a value could not be parsed.
    ///
    /// The value being read is left unchanged. The error records where in this crate
    /// the malformation was detected.
    #[error("Parse error - {file}:{line}: {message}")]
    Parse {
        /// Classification of the failure
        code: ErrorCode,
        /// Description of what was malformed
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A numeric value does not fit the storage width of the value type.
    ///
    /// Construction fails rather than truncating, e.g. `65536` for an unsigned short.
    #[error("Value {value} is out of range for {type_name}")]
    Range {
        /// The rejected value, as text
        value: String,
        /// Name of the value type that rejected it
        type_name: &'static str,
    },

    /// A mutating operation was attempted through a read-only view.
    #[error("Access denied - {0}")]
    AccessDenied(String),

    /// A key-addressed lookup found no entry.
    #[error("Key not found - {0}")]
    KeyNotFound(String),

    /// The requested type identifier cannot be turned into a value.
    #[error("Unsupported value type - {0}")]
    UnsupportedType(String),

    /// A cursor, datum reference or view is stale.
    ///
    /// Handles record the generation of their container or buffer; a structural change
    /// performed through another handle invalidates them.
    #[error("Invalid handle - {0}")]
    InvalidHandle(String),

    /// Failure signalled by a collaborator (image codec, XMP toolkit, key dictionary).
    #[error("{message}")]
    Native {
        /// Machine readable error code
        code: ErrorCode,
        /// Human readable message
        message: String,
    },

    /// File I/O error.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the stable error code of this error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metabind::{Error, ErrorCode};
    ///
    /// let err = Error::AccessDenied("read-only view".to_string());
    /// assert_eq!(err.code(), ErrorCode::FunctionNotSupported);
    /// ```
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Parse { code, .. } | Error::Native { code, .. } => *code,
            Error::Range { .. } => ErrorCode::ValueTooLarge,
            Error::AccessDenied(_) => ErrorCode::FunctionNotSupported,
            Error::KeyNotFound(_) => ErrorCode::KeyNotFound,
            Error::UnsupportedType(_) => ErrorCode::InvalidTypeValue,
            Error::InvalidHandle(_) => ErrorCode::InvalidHandle,
            Error::Io(err) => match err.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    ErrorCode::DataSourceOpenFailed
                }
                _ => ErrorCode::CallFailed,
            },
        }
    }

    /// Returns `true` for errors that indicate a stale handle.
    #[must_use]
    pub fn is_invalid_handle(&self) -> bool {
        matches!(self, Error::InvalidHandle(_))
    }
}
