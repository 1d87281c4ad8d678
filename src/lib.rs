// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]
//#![deny(unsafe_code)]
// - 'image/physical.rs' uses mmap to map a file into memory

//! # metabind
//!
//! Typed, ownership-safe access to Exif, IPTC and XMP image metadata.
//!
//! `metabind` models metadata the way image-metadata engines store it: ordered multimaps
//! of `Family.Group.Tag` keys to polymorphic values. It adds what a host needs on top of
//! such an engine: cursors and references that notice when the container changed under
//! them, byte views that cannot outlive or resize their owner, an explicit record of which
//! object keeps which other object alive, and a single error type with stable codes.
//!
//! ## Features
//!
//! - **Value model** - Numeric arrays, text, comments with charsets, dates, times, XMP
//!   text, arrays and language alternatives, with textual and binary codecs
//! - **Containers** - [`ExifData`], [`IptcData`] and [`XmpData`] with key lookup,
//!   auto-vivifying indexing, forward cursors and family-aware erasure
//! - **Buffers and views** - [`DataBuf`] and generation-checked [`View`]s
//! - **Ownership tracking** - Every derived handle registers with a [`ownership::Tracker`]
//! - **XMP packets** - RDF/XML encoding and decoding behind [`xmp::XmpParser`]
//! - **Sidecar images** - [`image::ImageFactory`] reads and writes `.xmp` files
//!
//! ## Quick Start
//!
//! ```rust
//! use metabind::prelude::*;
//!
//! let mut exif = ExifData::new();
//! exif.add(Key::parse("Exif.Image.Make")?, Value::ascii("Acme"))?;
//! exif.add(Key::parse("Exif.Image.Model")?, Value::ascii("X100"))?;
//!
//! let pos = exif.find_key(&Key::parse("Exif.Image.Model")?);
//! exif.erase(&pos)?;
//!
//! assert_eq!(exif.len(), 1);
//! assert!(exif.find_key(&Key::parse("Exif.Image.Model")?).is_end());
//! # Ok::<(), metabind::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`value`] - The value model and its codecs
//! - [`key`] - Structured metadata keys
//! - [`tags`] - Tag, dataset and XMP property dictionaries
//! - [`metadata`] - Containers, cursors, datum and value references
//! - [`buffer`] - Owning buffers and borrowed views
//! - [`ownership`] - Dependency tracking between handles
//! - [`xmp`] - XMP packet codec
//! - [`image`] - Image backends and the image factory
//! - [`io`] - Byte-order aware primitives
//! - [`diagnostics`] - Log level and diagnostic capture
//! - [`translate`] - Translation of collaborator failures
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]. Soft failures such as a numeric coercion
//! of non-numeric text return `None` and clear the [`Value::ok`] flag instead.

#[macro_use]
mod error;
#[macro_use]
mod macros;

pub mod buffer;
pub mod diagnostics;
pub mod image;
pub mod io;
pub mod key;
pub mod metadata;
pub mod ownership;
pub mod prelude;
pub mod tags;
pub mod translate;
pub mod value;
pub mod xmp;

pub use buffer::{DataBuf, View};
pub use error::{Error, ErrorCode};
pub use image::{Image, ImageFactory, ImageType};
pub use io::ByteOrder;
pub use key::{Key, KeyFamily};
pub use metadata::{
    Cursor, Datum, DatumRef, ExifData, IptcData, Metadata, Position, ValueRef, XmpData,
};
pub use value::{CharsetId, Scalar, TypeId, TypeInfo, Value, ValueData};
pub use xmp::{XmpFormatFlags, XmpParser};

/// `metabind` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
