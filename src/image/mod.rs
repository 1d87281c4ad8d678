//! Opening images and moving their metadata in and out of containers.
//!
//! An [`Image`] couples a byte source ([`BasicIo`]) with the three metadata containers.
//! [`ImageFactory`] detects the image type from the leading bytes and builds the image.
//! Only XMP sidecar files are understood; any other format is rejected with
//! [`ErrorCode::FileContainsUnknownImageType`] or
//! [`ErrorCode::MemoryContainsUnknownImageType`].
//!
//! # Key Components
//!
//! - [`Backend`] - Trait for the raw data of an image (memory buffer or mapped file)
//! - [`BasicIo`] - Shared, generation-checked access to the backend
//! - [`Image`] - The opened image and its containers
//! - [`ImageFactory`] - Entry points for opening images
//!
//! # Examples
//!
//! ```rust
//! use metabind::{image::ImageFactory, Key, Value};
//!
//! let sidecar = br#"<?xml version="1.0" encoding="UTF-8"?>
//! <x:xmpmeta xmlns:x="adobe:ns:meta/">
//!  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
//!   <rdf:Description rdf:about="" xmlns:dc="http://purl.org/dc/elements/1.1/"
//!     dc:format="image/jpeg"/>
//!  </rdf:RDF>
//! </x:xmpmeta>"#;
//!
//! let mut image = ImageFactory::open_bytes(sidecar.to_vec())?;
//! image.read_metadata()?;
//!
//! let key = Key::parse("Xmp.dc.format")?;
//! assert_eq!(image.xmp_data().get(&key).unwrap().text()?, "image/jpeg");
//!
//! image.xmp_data_mut().set(&Key::parse("Xmp.dc.source")?, Value::xmp_text("scan"))?;
//! image.write_metadata()?;
//! # Ok::<(), metabind::Error>(())
//! ```

mod memory;
mod physical;

pub use memory::Memory;
pub use physical::Physical;

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    buffer::{stale, ByteSource, View},
    diagnostics::{self, DiagnosticCategory},
    metadata::{ExifData, IptcData, Metadata, XmpData},
    ownership::{Anchor, ObjectId, Tracker},
    translate,
    xmp::{XmpFormatFlags, XmpParser},
    Error, ErrorCode, Result,
};

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Backend for image data.
///
/// The trait provides a common interface for image data regardless of whether it was read
/// from a file on disk or handed over as a memory buffer. All implementations must be
/// thread-safe.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Parse`] with [`ErrorCode::OffsetOutOfRange`] if the
    /// requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the backend holds no data.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn out_of_bounds(offset: usize, len: usize, total: usize) -> Error {
    parse_error!(
        code: ErrorCode::OffsetOutOfRange,
        "Range {}+{} exceeds image data of {} bytes",
        offset,
        len,
        total
    )
}

/// Image formats this crate can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[non_exhaustive]
pub enum ImageType {
    /// Stand-alone XMP packet (`.xmp` sidecar)
    Xmp,
}

impl ImageType {
    /// Detects the image type from the leading bytes of `data`.
    #[must_use]
    pub fn detect(data: &[u8]) -> Option<ImageType> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        let start = data
            .iter()
            .position(|byte| !byte.is_ascii_whitespace())
            .unwrap_or(data.len());
        let data = &data[start..];

        [&b"<?xml"[..], b"<?xpacket", b"<x:xmpmeta", b"<x:xapmeta"]
            .iter()
            .any(|marker| data.starts_with(marker))
            .then_some(ImageType::Xmp)
    }

    /// Returns the MIME type of the format.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageType::Xmp => "application/rdf+xml",
        }
    }
}

#[derive(Debug)]
struct IoState {
    backend: Box<dyn Backend>,
    generation: u64,
}

#[derive(Debug)]
struct IoStorage(RwLock<IoState>);

impl ByteSource for IoStorage {
    fn read_bytes(&self, generation: u64, f: &mut dyn FnMut(&[u8])) -> Result<()> {
        let state = read_lock!(self.0);
        if state.generation != generation {
            return Err(stale("Image data"));
        }
        f(state.backend.data());
        Ok(())
    }

    fn write_bytes(&self, _generation: u64, _f: &mut dyn FnMut(&mut [u8])) -> Result<()> {
        Err(Error::AccessDenied(
            "image data can only be replaced by writing metadata".to_string(),
        ))
    }
}

/// Shared access to the raw data of an image.
///
/// Views taken with [`BasicIo::view`] are read-only and turn stale when
/// [`Image::write_metadata`] replaces the data.
pub struct BasicIo {
    storage: Arc<IoStorage>,
    path: Option<PathBuf>,
    anchor: Arc<Anchor>,
}

impl BasicIo {
    fn new(backend: Box<dyn Backend>, path: Option<PathBuf>, owner: &Arc<Anchor>) -> Self {
        BasicIo {
            storage: Arc::new(IoStorage(RwLock::new(IoState {
                backend,
                generation: 0,
            }))),
            path,
            anchor: Anchor::derive(owner),
        }
    }

    /// Returns the path the image was opened from, `None` for memory images.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the size of the image data in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock!(self.storage.0).backend.len()
    }

    /// Returns `true` if the image holds no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read_lock!(self.storage.0).backend.is_empty()
    }

    /// Copies `len` bytes at `offset`.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] with [`ErrorCode::OffsetOutOfRange`] if the range is out
    /// of bounds.
    pub fn read(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let state = read_lock!(self.storage.0);
        Ok(state.backend.data_slice(offset, len)?.to_vec())
    }

    /// Copies the whole image data.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        read_lock!(self.storage.0).backend.data().to_vec()
    }

    /// Returns a read-only view of the image data.
    #[must_use]
    pub fn view(&self) -> View {
        let (len, generation) = {
            let state = read_lock!(self.storage.0);
            (state.backend.len(), state.generation)
        };
        View::new(
            Arc::clone(&self.storage) as Arc<dyn ByteSource>,
            len,
            false,
            generation,
            Anchor::derive(&self.anchor),
        )
    }

    /// Replaces the image data, on disk for file images.
    ///
    /// On failure the previous data and generation stay in place, so views taken before
    /// the call remain valid.
    fn replace(&self, bytes: Vec<u8>) -> Result<()> {
        let mut state = write_lock!(self.storage.0);

        let Some(path) = &self.path else {
            state.backend = Box::new(Memory::new(bytes));
            state.generation += 1;
            return Ok(());
        };

        // The mapping must be gone before the file is truncated, and a failed write may
        // have truncated it, so the previous data is kept as a copy.
        let previous = state.backend.data().to_vec();
        state.backend = Box::new(Memory::new(bytes));
        let written = translate::native(
            &format!("write {}", path.display()),
            ErrorCode::ImageWriteFailed,
            || Ok(fs::write(path, state.backend.data())?),
        );
        if let Err(err) = written {
            state.backend = Box::new(Memory::new(previous));
            return Err(err);
        }
        state.generation += 1;

        match Physical::new(path) {
            Ok(physical) => state.backend = Box::new(physical),
            Err(err) => diagnostics::warning(
                DiagnosticCategory::Image,
                ErrorCode::DataSourceOpenFailed,
                format!("Keeping {} in memory after remapping failed: {err}", path.display()),
            ),
        }
        Ok(())
    }

    /// Returns the identity of this byte source.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.anchor.id()
    }

    /// Returns the registry tracking this image's dependents.
    #[must_use]
    pub fn tracker(&self) -> Tracker {
        self.anchor.tracker().clone()
    }
}

impl fmt::Debug for BasicIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicIo")
            .field("path", &self.path)
            .field("id", &self.anchor.id())
            .finish_non_exhaustive()
    }
}

/// An opened image and its metadata containers.
///
/// The containers start empty; [`Image::read_metadata`] fills them from the image data and
/// [`Image::write_metadata`] writes them back. Containers, their cursors and views of the
/// image data are registered as dependents of the image.
#[derive(Debug)]
pub struct Image {
    image_type: ImageType,
    io: BasicIo,
    exif: ExifData,
    iptc: IptcData,
    xmp: XmpData,
    anchor: Arc<Anchor>,
}

impl Image {
    fn new(backend: Box<dyn Backend>, path: Option<PathBuf>, image_type: ImageType) -> Image {
        let anchor = Anchor::root();
        Image {
            image_type,
            io: BasicIo::new(backend, path, &anchor),
            exif: Metadata::with_anchor(Anchor::derive(&anchor)),
            iptc: Metadata::with_anchor(Anchor::derive(&anchor)),
            xmp: Metadata::with_anchor(Anchor::derive(&anchor)),
            anchor,
        }
    }

    /// Returns the detected image type.
    #[must_use]
    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    /// Returns the byte source of the image.
    #[must_use]
    pub fn io(&self) -> &BasicIo {
        &self.io
    }

    /// Returns the Exif container.
    #[must_use]
    pub fn exif_data(&self) -> &ExifData {
        &self.exif
    }

    /// Returns the Exif container for modification.
    pub fn exif_data_mut(&mut self) -> &mut ExifData {
        &mut self.exif
    }

    /// Returns the IPTC container.
    #[must_use]
    pub fn iptc_data(&self) -> &IptcData {
        &self.iptc
    }

    /// Returns the IPTC container for modification.
    pub fn iptc_data_mut(&mut self) -> &mut IptcData {
        &mut self.iptc
    }

    /// Returns the XMP container.
    #[must_use]
    pub fn xmp_data(&self) -> &XmpData {
        &self.xmp
    }

    /// Returns the XMP container for modification.
    pub fn xmp_data_mut(&mut self) -> &mut XmpData {
        &mut self.xmp
    }

    /// Reads the metadata of the image into its containers, replacing their contents.
    ///
    /// Cursors and references into the containers taken before the call become stale.
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`ErrorCode::FailedToReadImageData`] if the data is
    /// not UTF-8 and with [`ErrorCode::InvalidXMP`] for a malformed packet.
    pub fn read_metadata(&mut self) -> Result<()> {
        let bytes = self.io.to_vec();
        let packet = std::str::from_utf8(&bytes).map_err(|err| {
            native_error!(
                ErrorCode::FailedToReadImageData,
                "Failed to read image data: {}",
                err
            )
        })?;
        let packet = packet.trim_start_matches('\u{feff}');

        let parser = XmpParser::initialize()?;
        let decoded = translate::native("decode XMP packet", ErrorCode::FailedToReadImageData, || {
            parser.decode(packet)
        })?;

        self.exif.clear();
        self.iptc.clear();
        self.xmp.clear();
        for datum in decoded.to_vec() {
            self.xmp.add_datum(datum)?;
        }
        self.xmp.set_packet(packet);

        diagnostics::debug(
            DiagnosticCategory::Image,
            format!("Read {} XMP properties", self.xmp.len()),
        );
        Ok(())
    }

    /// Writes the containers back to the image.
    ///
    /// With [`XmpData::use_packet`] set, the stored packet is written verbatim; otherwise
    /// the container is serialised and the result stored as the new packet.
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`ErrorCode::ImageWriteFailed`] if a file image
    /// cannot be rewritten, or the serialisation errors of [`XmpParser::encode`].
    pub fn write_metadata(&mut self) -> Result<()> {
        if !self.exif.is_empty() || !self.iptc.is_empty() {
            diagnostics::warning(
                DiagnosticCategory::Image,
                ErrorCode::FunctionNotSupported,
                "Exif and IPTC metadata are not written to XMP sidecars",
            );
        }

        let use_packet = self.xmp.use_packet();
        let packet = if use_packet {
            self.xmp.xmp_packet().to_string()
        } else {
            let parser = XmpParser::initialize()?;
            parser.encode(
                &self.xmp,
                XmpFormatFlags::OMIT_PACKET_WRAPPER | XmpFormatFlags::USE_COMPACT_FORMAT,
            )?
        };

        let mut bytes = Vec::with_capacity(XML_HEADER.len() + packet.len());
        if !packet.is_empty() && !packet.starts_with("<?xml") {
            bytes.extend_from_slice(XML_HEADER.as_bytes());
        }
        bytes.extend_from_slice(packet.as_bytes());
        self.io.replace(bytes)?;

        if !use_packet {
            self.xmp.set_packet(packet);
        }
        Ok(())
    }

    /// Returns the identity of this image.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.anchor.id()
    }

    /// Returns the registry tracking this image's dependents.
    #[must_use]
    pub fn tracker(&self) -> Tracker {
        self.anchor.tracker().clone()
    }
}

/// Entry points for opening images.
pub struct ImageFactory;

impl ImageFactory {
    /// Opens the image file at `path`.
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`ErrorCode::DataSourceOpenFailed`] if the file
    /// cannot be opened and [`ErrorCode::FileContainsUnknownImageType`] if it is not a
    /// supported format.
    pub fn open(path: impl AsRef<Path>) -> Result<Image> {
        let path = path.as_ref();
        let backend = translate::native(
            &format!("open {}", path.display()),
            ErrorCode::DataSourceOpenFailed,
            || Physical::new(path),
        )?;

        let Some(image_type) = ImageType::detect(backend.data()) else {
            return Err(native_error!(
                ErrorCode::FileContainsUnknownImageType,
                "{}: The file contains data of an unknown image type",
                path.display()
            ));
        };

        diagnostics::debug(
            DiagnosticCategory::Image,
            format!("Opened {} as {image_type}", path.display()),
        );
        Ok(Image::new(
            Box::new(backend),
            Some(path.to_path_buf()),
            image_type,
        ))
    }

    /// Opens an image held in memory.
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`ErrorCode::MemoryContainsUnknownImageType`] if
    /// the data is not a supported format.
    pub fn open_bytes(data: Vec<u8>) -> Result<Image> {
        let Some(image_type) = ImageType::detect(&data) else {
            return Err(native_error!(
                ErrorCode::MemoryContainsUnknownImageType,
                "The memory contains data of an unknown image type"
            ));
        };

        Ok(Image::new(Box::new(Memory::new(data)), None, image_type))
    }

    /// Returns the type of the image in `data`, if supported.
    #[must_use]
    pub fn image_type(data: &[u8]) -> Option<ImageType> {
        ImageType::detect(data)
    }
}
