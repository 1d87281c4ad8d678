//! XMP packet serialisation and parsing.
//!
//! Packets are RDF/XML documents. Encoding and decoding happen inside a process-wide
//! parser context that callers open with [`XmpParser::initialize`]. The context is
//! reference counted: every [`XmpParser`] handle keeps it alive, and it terminates when the
//! last handle is dropped.
//!
//! # Packet mapping
//!
//! - Simple properties become property elements, or attributes of `rdf:Description` with
//!   [`XmpFormatFlags::USE_COMPACT_FORMAT`]
//! - [`crate::value::XmpArrayValue`]s become `rdf:Bag`, `rdf:Seq` or `rdf:Alt` containers
//! - Language alternatives become an `rdf:Alt` of `xml:lang` items
//! - Text placeholders carrying an array or struct form open a container that keys with
//!   `[n]` or `/ns:field` paths fill
//!
//! # Examples
//!
//! ```rust
//! use metabind::{xmp::{XmpFormatFlags, XmpParser}, Key, Value, XmpData};
//!
//! let parser = XmpParser::initialize()?;
//!
//! let mut data = XmpData::new();
//! data.add(Key::parse("Xmp.dc.format")?, Value::xmp_text("image/jpeg"))?;
//! let packet = parser.encode(&data, XmpFormatFlags::OMIT_PACKET_WRAPPER)?;
//! assert!(packet.contains("<dc:format>image/jpeg</dc:format>"));
//!
//! let decoded = parser.decode(&packet)?;
//! assert_eq!(decoded.len(), 1);
//! # Ok::<(), metabind::Error>(())
//! ```

mod decode;
mod encode;
mod path;

use std::sync::atomic::{AtomicUsize, Ordering};

use bitflags::bitflags;

use crate::{
    diagnostics::{self, DiagnosticCategory},
    metadata::XmpData,
    tags::XmpProperties,
    ErrorCode, Result,
};

pub(crate) const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub(crate) const XMP_META_NS: &str = "adobe:ns:meta/";
pub(crate) const XMP_TOOLKIT: &str = concat!("metabind ", env!("CARGO_PKG_VERSION"));
pub(crate) const PACKET_ID: &str = "W5M0MpCehiHzreSzNTczkc9d";

static CONTEXT: AtomicUsize = AtomicUsize::new(0);

bitflags! {
    #[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
    /// Options for serialising an XMP packet
    pub struct XmpFormatFlags: u32 {
        /// Write the bare `x:xmpmeta` element without `<?xpacket?>` processing instructions
        const OMIT_PACKET_WRAPPER = 0x0010;
        /// Mark the packet read-only in the trailer
        const READ_ONLY_PACKET = 0x0020;
        /// Write simple properties as attributes of `rdf:Description`
        const USE_COMPACT_FORMAT = 0x0040;
        /// Reserve room for a thumbnail in the padding
        const INCLUDE_THUMBNAIL_PAD = 0x0100;
        /// Pad the packet to exactly the requested length
        const EXACT_PACKET_LENGTH = 0x0200;
        /// Accepted, no effect
        const WRITE_ALIAS_COMMENTS = 0x0400;
        /// Write the packet on a single line without indentation
        const OMIT_ALL_FORMATTING = 0x0800;
    }
}

/// A handle on the process-wide XMP parser context.
#[derive(Debug)]
pub struct XmpParser {
    _private: (),
}

impl XmpParser {
    /// Opens the parser context, or joins it if another handle already holds it open.
    ///
    /// # Errors
    /// Infallible today; the signature leaves room for contexts that can fail to start.
    pub fn initialize() -> Result<XmpParser> {
        if CONTEXT.fetch_add(1, Ordering::AcqRel) == 0 {
            diagnostics::debug(DiagnosticCategory::Xmp, "XMP parser context initialised");
        }
        Ok(XmpParser { _private: () })
    }

    /// Returns `true` while at least one [`XmpParser`] handle is alive.
    #[must_use]
    pub fn is_initialized() -> bool {
        CONTEXT.load(Ordering::Acquire) > 0
    }

    /// Releases this handle. The context terminates with the last handle.
    pub fn terminate(self) {}

    /// Serialises `data` to a packet.
    ///
    /// # Errors
    /// Returns [`crate::Error::Native`] with [`ErrorCode::NoNamespaceInfoForXmpPrefix`] for
    /// keys in unregistered namespaces and [`ErrorCode::InvalidKey`] for malformed paths.
    pub fn encode(&self, data: &XmpData, flags: XmpFormatFlags) -> Result<String> {
        self.encode_with_padding(data, flags, 0)
    }

    /// Serialises `data` to a packet, adding `padding` bytes of whitespace before the
    /// trailer. With [`XmpFormatFlags::EXACT_PACKET_LENGTH`], `padding` is the total length
    /// of the packet instead.
    ///
    /// # Errors
    /// As [`XmpParser::encode`], plus [`ErrorCode::XMPToolkitError`] if the packet does
    /// not fit into an exact length.
    pub fn encode_with_padding(
        &self,
        data: &XmpData,
        flags: XmpFormatFlags,
        padding: usize,
    ) -> Result<String> {
        encode::encode_packet(data, flags, padding)
    }

    /// Parses a packet into a new container.
    ///
    /// # Errors
    /// Returns [`crate::Error::Native`] with [`ErrorCode::InvalidXMP`] for malformed
    /// packets.
    pub fn decode(&self, packet: &str) -> Result<XmpData> {
        decode::decode_packet(packet)
    }

    /// Registers a custom namespace for encoding and decoding.
    ///
    /// # Errors
    /// See [`XmpProperties::register_ns`].
    pub fn register_ns(&self, uri: &str, prefix: &str) -> Result<()> {
        XmpProperties::register_ns(uri, prefix)
    }
}

impl Drop for XmpParser {
    fn drop(&mut self) {
        if CONTEXT.fetch_sub(1, Ordering::AcqRel) == 1 {
            diagnostics::debug(DiagnosticCategory::Xmp, "XMP parser context terminated");
        }
    }
}

fn require_context(op: &str) -> Result<()> {
    if XmpParser::is_initialized() {
        Ok(())
    } else {
        Err(native_error!(
            ErrorCode::XMPToolkitError,
            "XMP {} called without an initialised XMP parser",
            op
        ))
    }
}

/// Serialises `data` inside an already open parser context.
///
/// # Errors
/// Returns [`crate::Error::Native`] with [`ErrorCode::XMPToolkitError`] if no
/// [`XmpParser`] is alive, otherwise as [`XmpParser::encode`].
pub fn encode(data: &XmpData, flags: XmpFormatFlags) -> Result<String> {
    require_context("encode")?;
    encode::encode_packet(data, flags, 0)
}

/// Parses `packet` inside an already open parser context.
///
/// # Errors
/// Returns [`crate::Error::Native`] with [`ErrorCode::XMPToolkitError`] if no
/// [`XmpParser`] is alive, otherwise as [`XmpParser::decode`].
pub fn decode(packet: &str) -> Result<XmpData> {
    require_context("decode")?;
    decode::decode_packet(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        key::Key,
        value::{TypeId, Value, XmpArrayType, XmpStruct},
    };

    fn key(text: &str) -> Key {
        Key::parse(text).unwrap()
    }

    fn sample() -> XmpData {
        let mut data = XmpData::new();
        data.add(key("Xmp.dc.format"), Value::xmp_text("image/jpeg"))
            .unwrap();
        data.add(
            key("Xmp.dc.subject"),
            Value::xmp_array(XmpArrayType::Bag, ["sky", "sea & sand"]),
        )
        .unwrap();
        data.add(
            key("Xmp.dc.title"),
            Value::lang_alt([("x-default", "Harbour"), ("de-DE", "Hafen")]),
        )
        .unwrap();
        data
    }

    fn text(data: &XmpData, name: &str) -> String {
        data.get(&key(name)).unwrap().value().unwrap().to_string()
    }

    #[test]
    fn round_trip() {
        let parser = XmpParser::initialize().unwrap();
        let packet = parser.encode(&sample(), XmpFormatFlags::empty()).unwrap();
        assert!(packet.starts_with("<?xpacket begin="));
        assert!(packet.ends_with("<?xpacket end=\"w\"?>"));
        assert!(packet.contains("<rdf:Bag>"));
        assert!(packet.contains("xml:lang=\"de-DE\""));
        assert!(packet.contains("sea &amp; sand"));

        let decoded = parser.decode(&packet).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(text(&decoded, "Xmp.dc.format"), "image/jpeg");

        let subject = decoded.get(&key("Xmp.dc.subject")).unwrap().value().unwrap();
        let subject = subject.as_xmp_array().unwrap();
        assert_eq!(subject.kind(), XmpArrayType::Bag);
        assert_eq!(subject.get(1).unwrap(), "sea & sand");

        let title = decoded.get(&key("Xmp.dc.title")).unwrap().value().unwrap();
        assert_eq!(title.type_id(), TypeId::LangAlt);
        assert_eq!(title.as_lang_alt().unwrap().get("de-DE"), Some("Hafen"));
    }

    #[test]
    fn empty_packets() {
        let parser = XmpParser::initialize().unwrap();
        assert_eq!(
            parser.encode(&XmpData::new(), XmpFormatFlags::empty()).unwrap(),
            ""
        );
        assert!(parser.decode("").unwrap().is_empty());
        assert!(parser.decode("  \n\0").unwrap().is_empty());
    }

    #[test]
    fn malformed_packets() {
        let parser = XmpParser::initialize().unwrap();
        let err = parser.decode("<x:xmpmeta xmlns:x=\"adobe:ns:meta/\">").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidXMP);

        let err = parser.decode("<root/>").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidXMP);
    }

    #[test]
    fn compact_and_flags() {
        let parser = XmpParser::initialize().unwrap();
        let data = sample();

        let packet = parser
            .encode(
                &data,
                XmpFormatFlags::USE_COMPACT_FORMAT
                    | XmpFormatFlags::OMIT_PACKET_WRAPPER
                    | XmpFormatFlags::OMIT_ALL_FORMATTING,
            )
            .unwrap();
        assert!(packet.starts_with("<x:xmpmeta"));
        assert!(!packet.contains('\n'));
        assert!(packet.contains("dc:format=\"image/jpeg\""));
        assert_eq!(text(&parser.decode(&packet).unwrap(), "Xmp.dc.format"), "image/jpeg");

        let packet = parser
            .encode(&data, XmpFormatFlags::READ_ONLY_PACKET)
            .unwrap();
        assert!(packet.ends_with("<?xpacket end=\"r\"?>"));

        let bare = parser.encode(&data, XmpFormatFlags::empty()).unwrap();
        let padded = parser
            .encode(&data, XmpFormatFlags::INCLUDE_THUMBNAIL_PAD)
            .unwrap();
        assert_eq!(padded.len(), bare.len() + 10_000);

        let exact = parser
            .encode_with_padding(&data, XmpFormatFlags::EXACT_PACKET_LENGTH, 20_000)
            .unwrap();
        assert_eq!(exact.len(), 20_000);

        let err = parser
            .encode_with_padding(&data, XmpFormatFlags::EXACT_PACKET_LENGTH, 16)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::XMPToolkitError);
    }

    #[test]
    fn surrounding_whitespace_survives() {
        let parser = XmpParser::initialize().unwrap();
        let mut data = XmpData::new();
        data.add(key("Xmp.dc.source"), Value::xmp_text("  padded  "))
            .unwrap();
        data.add(
            key("Xmp.dc.subject"),
            Value::xmp_array(XmpArrayType::Bag, [" lead", "trail "]),
        )
        .unwrap();
        data.add(
            key("Xmp.dc.title"),
            Value::lang_alt([("x-default", "\tTabbed\n")]),
        )
        .unwrap();

        for flags in [XmpFormatFlags::empty(), XmpFormatFlags::USE_COMPACT_FORMAT] {
            let packet = parser.encode(&data, flags).unwrap();
            let decoded = parser.decode(&packet).unwrap();
            assert_eq!(decoded.len(), 3);
            assert_eq!(text(&decoded, "Xmp.dc.source"), "  padded  ");

            let subject = decoded.get(&key("Xmp.dc.subject")).unwrap().value().unwrap();
            let subject = subject.as_xmp_array().unwrap();
            assert_eq!(subject.get(0).unwrap(), " lead");
            assert_eq!(subject.get(1).unwrap(), "trail ");

            let title = decoded.get(&key("Xmp.dc.title")).unwrap().value().unwrap();
            assert_eq!(title.as_lang_alt().unwrap().get("x-default"), Some("\tTabbed\n"));
        }
    }

    #[test]
    fn array_items_keep_separators() {
        let parser = XmpParser::initialize().unwrap();
        let mut data = XmpData::new();
        data.add(
            key("Xmp.dc.creator"),
            Value::xmp_array(XmpArrayType::Seq, ["Smith, John", "Doe, Jane"]),
        )
        .unwrap();

        let packet = parser.encode(&data, XmpFormatFlags::empty()).unwrap();
        let decoded = parser.decode(&packet).unwrap();
        let creator = decoded.get(&key("Xmp.dc.creator")).unwrap().value().unwrap();
        let creator = creator.as_xmp_array().unwrap();
        assert_eq!(creator.len(), 2);
        assert_eq!(creator.get(0).unwrap(), "Smith, John");
        assert_eq!(creator.get(1).unwrap(), "Doe, Jane");
    }

    #[test]
    fn nested_structures() {
        let parser = XmpParser::initialize().unwrap();
        let mut data = XmpData::new();

        let mut locations = Value::xmp_text("");
        locations.set_xmp_array_type(XmpArrayType::Bag).unwrap();
        data.add(key("Xmp.iptcExt.LocationCreated"), locations)
            .unwrap();
        data.add(
            key("Xmp.iptcExt.LocationCreated[1]/Iptc4xmpExt:City"),
            Value::xmp_text("Oslo"),
        )
        .unwrap();
        data.add(
            key("Xmp.iptcExt.LocationCreated[2]/Iptc4xmpExt:City"),
            Value::xmp_text("Bergen"),
        )
        .unwrap();

        let mut contact = Value::xmp_text("");
        contact.set_xmp_struct(XmpStruct::Struct).unwrap();
        data.add(key("Xmp.iptc.CreatorContactInfo"), contact).unwrap();
        data.add(
            key("Xmp.iptc.CreatorContactInfo/Iptc4xmpCore:CiAdrCity"),
            Value::xmp_text("Tromsø"),
        )
        .unwrap();

        let packet = parser.encode(&data, XmpFormatFlags::empty()).unwrap();
        assert!(packet.contains("rdf:parseType=\"Resource\""));
        assert!(packet.contains("xmlns:Iptc4xmpExt="));

        let decoded = parser.decode(&packet).unwrap();
        assert_eq!(decoded.len(), data.len());
        assert_eq!(
            text(&decoded, "Xmp.iptcExt.LocationCreated[2]/Iptc4xmpExt:City"),
            "Bergen"
        );
        assert_eq!(
            text(&decoded, "Xmp.iptc.CreatorContactInfo/Iptc4xmpCore:CiAdrCity"),
            "Tromsø"
        );

        let placeholder = decoded
            .get(&key("Xmp.iptcExt.LocationCreated"))
            .unwrap()
            .value()
            .unwrap();
        assert_eq!(placeholder.xmp_array_type(), Some(XmpArrayType::Bag));
        let placeholder = decoded
            .get(&key("Xmp.iptc.CreatorContactInfo"))
            .unwrap()
            .value()
            .unwrap();
        assert_eq!(placeholder.xmp_struct(), Some(XmpStruct::Struct));
    }

    #[test]
    fn unknown_namespaces_register() {
        let parser = XmpParser::initialize().unwrap();
        let packet = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about="" xmlns:mbtest="http://example.com/mbtest/1.0/"
     mbtest:Mood="calm">
   <mbtest:Rating>4</mbtest:Rating>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>"#;

        let decoded = parser.decode(packet).unwrap();
        assert_eq!(text(&decoded, "Xmp.mbtest.Mood"), "calm");
        assert_eq!(text(&decoded, "Xmp.mbtest.Rating"), "4");
        assert_eq!(
            XmpProperties::ns("mbtest").as_deref(),
            Some("http://example.com/mbtest/1.0/")
        );
        assert!(XmpProperties::unregister_ns("mbtest"));
    }

    #[test]
    fn explicit_namespace_registration() {
        let parser = XmpParser::initialize().unwrap();
        parser
            .register_ns("http://example.com/mbcustom/", "mbcustom")
            .unwrap();

        let mut data = XmpData::new();
        data.add(key("Xmp.mbcustom.Note"), Value::xmp_text("hello"))
            .unwrap();
        let packet = parser.encode(&data, XmpFormatFlags::empty()).unwrap();
        assert!(packet.contains("xmlns:mbcustom=\"http://example.com/mbcustom/\""));
        assert_eq!(text(&parser.decode(&packet).unwrap(), "Xmp.mbcustom.Note"), "hello");
        assert!(XmpProperties::unregister_ns("mbcustom"));
    }

    #[test]
    fn context_counts_handles() {
        let first = XmpParser::initialize().unwrap();
        let second = XmpParser::initialize().unwrap();
        assert!(XmpParser::is_initialized());
        second.terminate();
        assert!(XmpParser::is_initialized());
        assert!(encode(&sample(), XmpFormatFlags::empty()).is_ok());
        assert!(decode("").is_ok());
        drop(first);
    }
}
