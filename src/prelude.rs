//! # metabind Prelude
//!
//! Re-exports of the types most programs working with metadata need.
//!
//! ```rust
//! use metabind::prelude::*;
//!
//! let mut xmp = XmpData::new();
//! xmp.add(Key::parse("Xmp.dc.format")?, Value::xmp_text("image/png"))?;
//! assert_eq!(xmp.len(), 1);
//! # Ok::<(), metabind::Error>(())
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all metabind operations
pub use crate::{Error, ErrorCode};

/// The result type used throughout metabind
pub use crate::Result;

// ================================================================================================
// Keys and Values
// ================================================================================================

/// Structured metadata keys
pub use crate::key::{Key, KeyFamily};

/// The value model
pub use crate::value::{CharsetId, Scalar, TypeId, Value, ValueData, XmpArrayType, XmpStruct};

/// Byte order of binary encodings
pub use crate::io::ByteOrder;

// ================================================================================================
// Containers
// ================================================================================================

/// Metadata containers and their handles
pub use crate::metadata::{
    Cursor, Datum, DatumRef, ExifData, IptcData, Position, ValueRef, XmpData,
};

/// Buffers and views
pub use crate::buffer::{DataBuf, View};

// ================================================================================================
// Images and XMP
// ================================================================================================

/// Opening images
pub use crate::image::{Image, ImageFactory, ImageType};

/// XMP packet codec
pub use crate::xmp::{XmpFormatFlags, XmpParser};
