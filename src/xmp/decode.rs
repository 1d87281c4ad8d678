//! Parsing of RDF/XML packets into an [`XmpData`] container.

use std::fmt;

use quick_xml::{events::Event, name::ResolveResult, NsReader};

use crate::{
    key::Key,
    metadata::XmpData,
    tags::XmpProperties,
    value::{Value, XmpArrayType, XmpStruct},
    xmp::RDF_NS,
    Error, ErrorCode, Result,
};

fn xml_error(err: impl fmt::Display) -> Error {
    native_error!(ErrorCode::InvalidXMP, "Failed to parse XMP packet: {}", err)
}

fn namespace(result: ResolveResult<'_>) -> String {
    match result {
        ResolveResult::Bound(ns) => String::from_utf8_lossy(ns.into_inner()).into_owned(),
        _ => String::new(),
    }
}

#[derive(Debug)]
struct Attr {
    ns: String,
    qname: String,
    name: String,
    value: String,
}

#[derive(Debug, Default)]
struct Element {
    ns: String,
    prefix: String,
    name: String,
    attrs: Vec<Attr>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn is_rdf(&self, name: &str) -> bool {
        self.ns == RDF_NS && self.name == name
    }

    fn attr(&self, qname: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.qname == qname)
            .map(|attr| attr.value.as_str())
    }

    /// Attributes that are properties rather than RDF or XML syntax.
    fn property_attrs(&self) -> impl Iterator<Item = &Attr> {
        self.attrs.iter().filter(|attr| {
            !attr.ns.is_empty() && attr.ns != RDF_NS && !attr.qname.starts_with("xml:")
        })
    }

    fn array(&self) -> Option<(XmpArrayType, &Element)> {
        self.children.iter().find_map(|child| {
            let kind = match child.name.as_str() {
                "Bag" => XmpArrayType::Bag,
                "Seq" => XmpArrayType::Seq,
                "Alt" => XmpArrayType::Alt,
                _ => return None,
            };
            (child.ns == RDF_NS).then_some((kind, child))
        })
    }

    fn is_simple(&self) -> bool {
        self.children.is_empty()
            && self.property_attrs().next().is_none()
            && self.attr("rdf:parseType").is_none()
    }

    fn descriptions<'a>(&'a self, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.is_rdf("Description") {
                found.push(child);
            } else {
                child.descriptions(found);
            }
        }
    }

    fn contains_rdf(&self) -> bool {
        self.is_rdf("RDF") || self.children.iter().any(Element::contains_rdf)
    }
}

fn parse_document(packet: &str) -> Result<Element> {
    let mut reader = NsReader::from_str(packet);
    reader.config_mut().expand_empty_elements = true;

    let mut stack = vec![Element::default()];
    loop {
        let (ns, event) = reader.read_resolved_event().map_err(xml_error)?;
        let ns = namespace(ns);
        match event {
            Event::Start(start) => {
                let name = start.name();
                let mut element = Element {
                    ns,
                    prefix: name
                        .prefix()
                        .map(|prefix| String::from_utf8_lossy(prefix.into_inner()).into_owned())
                        .unwrap_or_default(),
                    name: String::from_utf8_lossy(start.local_name().into_inner()).into_owned(),
                    ..Element::default()
                };

                for attr in start.attributes() {
                    let attr = attr.map_err(xml_error)?;
                    if attr.key.as_namespace_binding().is_some() {
                        continue;
                    }
                    let (attr_ns, local) = reader.resolve_attribute(attr.key);
                    element.attrs.push(Attr {
                        ns: namespace(attr_ns),
                        qname: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                        name: String::from_utf8_lossy(local.into_inner()).into_owned(),
                        value: attr.unescape_value().map_err(xml_error)?.into_owned(),
                    });
                }
                stack.push(element);
            }
            Event::End(_) => {
                let mut element = stack.pop().ok_or_else(|| xml_error("unbalanced end tag"))?;
                // Text between child elements is layout; only leaves carry values.
                if !element.children.is_empty() {
                    element.text.clear();
                }
                stack
                    .last_mut()
                    .ok_or_else(|| xml_error("unbalanced end tag"))?
                    .children
                    .push(element);
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(document), true) => Ok(document),
        _ => Err(xml_error("unexpected end of packet")),
    }
}

/// Returns the key prefix of `uri`, registering it under `xml_prefix` if unknown.
fn key_prefix(uri: &str, xml_prefix: &str) -> Result<String> {
    if let Some(prefix) = XmpProperties::prefix(uri) {
        return Ok(prefix);
    }
    if xml_prefix.is_empty() {
        return Err(native_error!(
            ErrorCode::InvalidXMP,
            "Property in namespace '{}' has no prefix",
            uri
        ));
    }
    XmpProperties::register_ns(uri, xml_prefix)?;
    Ok(xml_prefix.to_string())
}

/// Returns the prefix struct fields of `uri` are spelt with in key paths.
fn field_prefix(uri: &str, xml_prefix: &str) -> Result<String> {
    key_prefix(uri, xml_prefix)?;
    XmpProperties::namespace_by_uri(uri)
        .map(|ns| ns.xml_prefix)
        .ok_or_else(|| {
            native_error!(
                ErrorCode::InvalidXMP,
                "No namespace info available for '{}'",
                uri
            )
        })
}

struct Decoder {
    data: XmpData,
}

impl Decoder {
    fn add(&mut self, prefix: &str, path: &str, value: Value) -> Result<()> {
        self.data.add(Key::xmp(prefix, path)?, value)
    }

    fn property(&mut self, prefix: &str, path: &str, element: &Element, item: bool) -> Result<()> {
        if let Some((kind, container)) = element.array() {
            let items: Vec<&Element> = container
                .children
                .iter()
                .filter(|child| child.is_rdf("li"))
                .collect();

            if kind == XmpArrayType::Alt
                && !items.is_empty()
                && items
                    .iter()
                    .all(|li| li.is_simple() && li.attr("xml:lang").is_some())
            {
                let entries = items
                    .iter()
                    .map(|li| (li.attr("xml:lang").unwrap_or_default(), li.text.clone()));
                return self.add(prefix, path, Value::lang_alt(entries));
            }

            if items.iter().all(|li| li.is_simple()) {
                let texts = items.iter().map(|li| li.text.clone());
                return self.add(prefix, path, Value::xmp_array(kind, texts));
            }

            let mut placeholder = Value::xmp_text("");
            placeholder.set_xmp_array_type(kind)?;
            self.add(prefix, path, placeholder)?;
            for (index, li) in items.into_iter().enumerate() {
                self.property(prefix, &format!("{path}[{}]", index + 1), li, true)?;
            }
            return Ok(());
        }

        let description = element
            .children
            .iter()
            .find(|child| child.is_rdf("Description"));
        let is_struct = element.attr("rdf:parseType") == Some("Resource")
            || description.is_some()
            || element.property_attrs().next().is_some()
            || !element.children.is_empty();

        if is_struct {
            if !item {
                let mut placeholder = Value::xmp_text("");
                placeholder.set_xmp_struct(XmpStruct::Struct)?;
                self.add(prefix, path, placeholder)?;
            }

            let holder = description.unwrap_or(element);
            for attr in holder.property_attrs() {
                let (xml_prefix, _) = attr.qname.split_once(':').unwrap_or_default();
                let field = field_prefix(&attr.ns, xml_prefix)?;
                self.add(
                    prefix,
                    &format!("{path}/{field}:{}", attr.name),
                    Value::xmp_text(attr.value.clone()),
                )?;
            }
            for child in &holder.children {
                let field = field_prefix(&child.ns, &child.prefix)?;
                self.property(prefix, &format!("{path}/{field}:{}", child.name), child, false)?;
            }
            return Ok(());
        }

        let text = element
            .attr("rdf:resource")
            .map_or_else(|| element.text.clone(), str::to_string);
        self.add(prefix, path, Value::xmp_text(text))
    }
}

/// Parses an RDF/XML packet.
///
/// An empty packet yields an empty container.
pub(crate) fn decode_packet(packet: &str) -> Result<XmpData> {
    let mut decoder = Decoder {
        data: XmpData::new(),
    };
    let packet = packet.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if packet.is_empty() {
        return Ok(decoder.data);
    }

    let document = parse_document(packet)?;
    if !document.contains_rdf() {
        return Err(native_error!(
            ErrorCode::InvalidXMP,
            "XMP packet has no rdf:RDF element"
        ));
    }

    let mut descriptions = Vec::new();
    document.descriptions(&mut descriptions);
    for description in descriptions {
        for attr in description.property_attrs() {
            let (xml_prefix, _) = attr.qname.split_once(':').unwrap_or_default();
            let prefix = key_prefix(&attr.ns, xml_prefix)?;
            decoder.add(&prefix, &attr.name, Value::xmp_text(attr.value.clone()))?;
        }
        for child in &description.children {
            let prefix = key_prefix(&child.ns, &child.prefix)?;
            decoder.property(&prefix, &child.name, child, false)?;
        }
    }

    Ok(decoder.data)
}
