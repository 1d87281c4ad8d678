//! Serialisation of an [`XmpData`] container to an RDF/XML packet.

use std::fmt;

use indexmap::IndexMap;
use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use crate::{
    metadata::XmpData,
    tags::XmpProperties,
    value::{Value, ValueData, XmpArrayType, XmpStruct},
    xmp::{
        path::{parse_path, Node, Step},
        XmpFormatFlags, PACKET_ID, RDF_NS, XMP_META_NS, XMP_TOOLKIT,
    },
    Error, ErrorCode, Result,
};

const THUMBNAIL_PAD: usize = 10_000;

fn xml_error(err: impl fmt::Display) -> Error {
    native_error!(ErrorCode::XMPToolkitError, "XMP serialisation failed: {}", err)
}

fn xml_prefix_uri(xml_prefix: &str) -> Result<String> {
    XmpProperties::namespaces()
        .into_iter()
        .find(|ns| ns.xml_prefix == xml_prefix || ns.prefix == xml_prefix)
        .map(|ns| ns.uri)
        .ok_or_else(|| {
            native_error!(
                ErrorCode::NoNamespaceInfoForXmpPrefix,
                "No namespace info available for XMP prefix '{}'",
                xml_prefix
            )
        })
}

/// Top-level properties grouped in key order, plus the namespaces they use.
struct Tree {
    roots: IndexMap<String, Node>,
    namespaces: IndexMap<String, String>,
}

impl Tree {
    fn build(data: &XmpData) -> Result<Tree> {
        let mut tree = Tree {
            roots: IndexMap::new(),
            namespaces: IndexMap::new(),
        };

        for datum in data.to_vec() {
            let (key, value) = datum.into_parts();
            let ns = XmpProperties::namespace(key.group_name()).ok_or_else(|| {
                native_error!(
                    ErrorCode::NoNamespaceInfoForXmpPrefix,
                    "No namespace info available for XMP prefix '{}'",
                    key.group_name()
                )
            })?;
            let (name, steps) = parse_path(key.tag_name())?;

            for step in &steps {
                if let Step::Field(field) = step {
                    let prefix = field.split(':').next().unwrap_or_default();
                    if !tree.namespaces.contains_key(prefix) {
                        let uri = xml_prefix_uri(prefix)?;
                        tree.namespaces.insert(prefix.to_string(), uri);
                    }
                }
            }

            let element = format!("{}:{name}", ns.xml_prefix);
            tree.namespaces.entry(ns.xml_prefix).or_insert(ns.uri);
            tree.roots
                .entry(element)
                .or_default()
                .descend(&steps)
                .value = Some(value);
        }

        Ok(tree)
    }
}

fn is_simple(node: &Node) -> bool {
    node.items.is_empty()
        && node.fields.is_empty()
        && match &node.value {
            Some(value) => match value.data() {
                ValueData::XmpArray(_) | ValueData::LangAlt(_) => false,
                _ => {
                    value.xmp_array_type().unwrap_or_default() == XmpArrayType::None
                        && value.xmp_struct().unwrap_or_default() == XmpStruct::None
                }
            },
            None => false,
        }
}

fn array_kind(name: &str, node: &Node) -> XmpArrayType {
    match node.value.as_ref().and_then(Value::xmp_array_type) {
        Some(XmpArrayType::None) | None => {
            let property = name.split_once(':').map_or(name, |(_, local)| local);
            XmpProperties::namespaces()
                .into_iter()
                .find(|ns| name.starts_with(&format!("{}:", ns.xml_prefix)))
                .and_then(|ns| XmpProperties::property_info(&ns.prefix, property))
                .map_or(XmpArrayType::Bag, |info| match info.type_id {
                    crate::TypeId::XmpSeq => XmpArrayType::Seq,
                    crate::TypeId::XmpAlt => XmpArrayType::Alt,
                    _ => XmpArrayType::Bag,
                })
        }
        Some(kind) => kind,
    }
}

struct Serializer {
    writer: Writer<Vec<u8>>,
}

impl Serializer {
    fn start(&mut self, start: BytesStart<'_>) -> Result<()> {
        self.writer.write_event(Event::Start(start)).map_err(xml_error)
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    fn empty(&mut self, start: BytesStart<'_>) -> Result<()> {
        self.writer.write_event(Event::Empty(start)).map_err(xml_error)
    }

    fn text_element(&mut self, start: BytesStart<'_>, text: &str) -> Result<()> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        if text.is_empty() {
            return self.empty(start);
        }
        self.start(start)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
        self.end(&name)
    }

    fn items<'a>(
        &mut self,
        kind: XmpArrayType,
        items: impl Iterator<Item = (Option<&'a str>, &'a str)>,
    ) -> Result<()> {
        let container = kind.rdf_name().unwrap_or("rdf:Bag");
        self.start(BytesStart::new(container))?;
        for (lang, text) in items {
            let mut li = BytesStart::new("rdf:li");
            if let Some(lang) = lang {
                li.push_attribute(("xml:lang", lang));
            }
            self.text_element(li, text)?;
        }
        self.end(container)
    }

    fn value(&mut self, start: BytesStart<'_>, value: &Value) -> Result<()> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        match value.data() {
            ValueData::LangAlt(alt) => {
                self.start(start)?;
                self.items(XmpArrayType::Alt, alt.items().map(|(l, t)| (Some(l), t)))?;
                self.end(&name)
            }
            ValueData::XmpArray(array) => {
                self.start(start)?;
                self.items(array.kind(), array.items.iter().map(|t| (None, t.as_str())))?;
                self.end(&name)
            }
            _ => self.text_element(start, &value.to_string()),
        }
    }

    fn node(&mut self, name: &str, node: &Node) -> Result<()> {
        let placeholder = node.value.as_ref();
        let array = placeholder
            .and_then(Value::xmp_array_type)
            .is_some_and(|kind| kind != XmpArrayType::None);
        let structure = placeholder
            .and_then(Value::xmp_struct)
            .is_some_and(|form| form == XmpStruct::Struct);

        let placeholder_array =
            array && matches!(placeholder.map(Value::data), Some(ValueData::XmpText(_)));
        if !node.items.is_empty() || placeholder_array {
            let kind = array_kind(name, node);
            let container = kind.rdf_name().unwrap_or("rdf:Bag");
            self.start(BytesStart::new(name))?;
            if node.items.is_empty() {
                self.empty(BytesStart::new(container))?;
            } else {
                self.start(BytesStart::new(container))?;
                for item in &node.items {
                    self.node("rdf:li", item)?;
                }
                self.end(container)?;
            }
            return self.end(name);
        }

        if !node.fields.is_empty() || structure {
            let mut start = BytesStart::new(name);
            start.push_attribute(("rdf:parseType", "Resource"));
            if node.fields.is_empty() {
                return self.empty(start);
            }
            self.start(start)?;
            for (field, child) in &node.fields {
                self.node(field, child)?;
            }
            return self.end(name);
        }

        match placeholder {
            Some(value) => self.value(BytesStart::new(name), value),
            None => self.empty(BytesStart::new(name)),
        }
    }
}

/// Serialises `data` to an RDF/XML packet.
///
/// An empty container yields an empty packet. `padding` is the number of whitespace
/// bytes written before the packet trailer, or with [`XmpFormatFlags::EXACT_PACKET_LENGTH`]
/// the total packet length.
pub(crate) fn encode_packet(
    data: &XmpData,
    flags: XmpFormatFlags,
    padding: usize,
) -> Result<String> {
    if data.is_empty() {
        return Ok(String::new());
    }

    let tree = Tree::build(data)?;
    let pretty = !flags.contains(XmpFormatFlags::OMIT_ALL_FORMATTING);
    let writer = if pretty {
        Writer::new_with_indent(Vec::new(), b' ', 1)
    } else {
        Writer::new(Vec::new())
    };
    let mut out = Serializer { writer };

    let mut meta = BytesStart::new("x:xmpmeta");
    meta.push_attribute(("xmlns:x", XMP_META_NS));
    meta.push_attribute(("x:xmptk", XMP_TOOLKIT));
    out.start(meta)?;

    let mut rdf = BytesStart::new("rdf:RDF");
    rdf.push_attribute(("xmlns:rdf", RDF_NS));
    out.start(rdf)?;

    let mut description = BytesStart::new("rdf:Description");
    description.push_attribute(("rdf:about", ""));
    for (prefix, uri) in &tree.namespaces {
        description.push_attribute((format!("xmlns:{prefix}").as_str(), uri.as_str()));
    }

    let compact = flags.contains(XmpFormatFlags::USE_COMPACT_FORMAT);
    let mut elements = Vec::new();
    for (name, node) in &tree.roots {
        match (&node.value, compact && is_simple(node)) {
            (Some(value), true) => {
                description.push_attribute((name.as_str(), value.to_string().as_str()));
            }
            _ => elements.push((name, node)),
        }
    }

    if elements.is_empty() {
        out.empty(description)?;
    } else {
        out.start(description)?;
        for (name, node) in elements {
            out.node(name, node)?;
        }
        out.end("rdf:Description")?;
    }
    out.end("rdf:RDF")?;
    out.end("x:xmpmeta")?;

    let body = String::from_utf8(out.writer.into_inner()).map_err(xml_error)?;
    if flags.contains(XmpFormatFlags::OMIT_PACKET_WRAPPER) {
        return Ok(body);
    }

    let newline = if pretty { "\n" } else { "" };
    let header = format!("<?xpacket begin=\"\u{feff}\" id=\"{PACKET_ID}\"?>{newline}");
    let trailer = format!(
        "<?xpacket end=\"{}\"?>",
        if flags.contains(XmpFormatFlags::READ_ONLY_PACKET) { 'r' } else { 'w' }
    );

    let mut pad = if flags.contains(XmpFormatFlags::INCLUDE_THUMBNAIL_PAD) {
        THUMBNAIL_PAD
    } else {
        0
    };
    if flags.contains(XmpFormatFlags::EXACT_PACKET_LENGTH) {
        let used = header.len() + body.len() + newline.len() + pad + trailer.len();
        pad += padding.checked_sub(used).ok_or_else(|| {
            native_error!(
                ErrorCode::XMPToolkitError,
                "XMP packet of {} bytes exceeds the exact length {}",
                used,
                padding
            )
        })?;
    } else {
        pad += padding;
    }

    Ok(format!(
        "{header}{body}{newline}{}{trailer}",
        " ".repeat(pad)
    ))
}
