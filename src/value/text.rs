//! Text values and charset-tagged comments.

use std::fmt;

use strum::{Display, EnumString};
use widestring::U16String;

use super::{TypeId, ValueCodec};
use crate::{
    diagnostics::{self, DiagnosticCategory},
    io::{ByteOrder, Parser},
    ErrorCode, Result,
};

/// Storage flavour of a [`TextValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum TextKind {
    /// Exif `Ascii`: NUL terminated in binary form
    Ascii,
    /// Engine `String`: raw bytes verbatim
    String,
    /// Windows `XP*` text: UTF-16 in the value's byte order, stored as `Byte`
    Unicode,
}

/// A text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextValue {
    /// Storage flavour
    pub kind: TextKind,
    /// The text
    pub text: String,
}

impl TextValue {
    /// Creates a text value.
    pub fn new(kind: TextKind, text: impl Into<String>) -> Self {
        TextValue {
            kind,
            text: text.into(),
        }
    }
}

pub(crate) fn encode_utf16(text: &str, order: ByteOrder) -> Vec<u8> {
    let units = U16String::from_str(text).into_vec();
    let mut out = Vec::with_capacity(units.len() * 2);
    for unit in units {
        out.extend_from_slice(&crate::io::to_bytes(unit, order));
    }
    out
}

fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl ValueCodec for TextValue {
    fn type_id(&self) -> TypeId {
        match self.kind {
            TextKind::Ascii => TypeId::Ascii,
            TextKind::String => TypeId::String,
            TextKind::Unicode => TypeId::Byte,
        }
    }

    fn count(&self) -> usize {
        self.size()
    }

    fn read_str(&mut self, text: &str) -> Result<()> {
        self.text = text.to_string();
        Ok(())
    }

    fn read_bytes(&mut self, bytes: &[u8], order: ByteOrder) -> Result<()> {
        self.text = match self.kind {
            TextKind::Ascii => {
                let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
                decode_text(&bytes[..end])
            }
            TextKind::String => decode_text(bytes),
            TextKind::Unicode => Parser::new(bytes, order).read_utf16_rest()?,
        };
        Ok(())
    }

    fn encode(&self, order: ByteOrder) -> Vec<u8> {
        match self.kind {
            TextKind::Ascii | TextKind::String => self.text.as_bytes().to_vec(),
            TextKind::Unicode => encode_utf16(&self.text, order),
        }
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }

    fn element_text(&self, _index: usize) -> Option<String> {
        Some(self.text.clone())
    }
}

/// Character set of a [`CommentValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
pub enum CharsetId {
    /// ITU-T T.50 IA5
    Ascii,
    /// JIS X 0208-1990
    Jis,
    /// Unicode, UTF-16 in binary form
    Unicode,
    /// Unspecified
    #[default]
    Undefined,
}

impl CharsetId {
    /// Returns the 8-byte code that prefixes the binary encoding.
    #[must_use]
    pub fn code(self) -> &'static [u8; 8] {
        match self {
            CharsetId::Ascii => b"ASCII\0\0\0",
            CharsetId::Jis => b"JIS\0\0\0\0\0",
            CharsetId::Unicode => b"UNICODE\0",
            CharsetId::Undefined => b"\0\0\0\0\0\0\0\0",
        }
    }

    /// Looks up a charset by its 8-byte code.
    #[must_use]
    pub fn from_code(code: &[u8]) -> Option<Self> {
        [
            CharsetId::Ascii,
            CharsetId::Jis,
            CharsetId::Unicode,
            CharsetId::Undefined,
        ]
        .into_iter()
        .find(|charset| charset.code().as_slice() == code)
    }
}

/// An Exif user comment: text tagged with its character set.
///
/// The text form is `charset=Name text`, with the prefix omitted for
/// [`CharsetId::Undefined`]. An unknown charset name or code is read as `Undefined` and
/// reported as a warning diagnostic; it never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentValue {
    /// Character set
    pub charset: CharsetId,
    /// The comment text, without the charset prefix
    pub comment: String,
    /// Byte order the comment was last decoded with
    pub byte_order: ByteOrder,
}

impl Default for CommentValue {
    fn default() -> Self {
        CommentValue {
            charset: CharsetId::Undefined,
            comment: String::new(),
            byte_order: ByteOrder::Little,
        }
    }
}

impl CommentValue {
    /// Creates a comment with an explicit charset.
    pub fn new(charset: CharsetId, comment: impl Into<String>) -> Self {
        CommentValue {
            charset,
            comment: comment.into(),
            byte_order: ByteOrder::Little,
        }
    }

    fn unknown_charset(name: &str) {
        diagnostics::warning(
            DiagnosticCategory::Value,
            ErrorCode::InvalidCharset,
            format!("Invalid charset: '{name}'"),
        );
    }
}

impl ValueCodec for CommentValue {
    fn type_id(&self) -> TypeId {
        TypeId::Comment
    }

    fn count(&self) -> usize {
        self.size()
    }

    fn read_str(&mut self, text: &str) -> Result<()> {
        let Some(charset) = text.strip_prefix("charset=") else {
            self.charset = CharsetId::Undefined;
            self.comment = text.to_string();
            return Ok(());
        };

        let (name, rest) = match charset.strip_prefix('"') {
            Some(quoted) => quoted.split_once('"').unwrap_or((quoted, "")),
            None => charset.split_once(' ').unwrap_or((charset, "")),
        };
        let rest = rest.strip_prefix(' ').unwrap_or(rest);

        self.charset = name.parse::<CharsetId>().unwrap_or_else(|_| {
            Self::unknown_charset(name);
            CharsetId::Undefined
        });
        self.comment = rest.to_string();
        Ok(())
    }

    fn read_bytes(&mut self, bytes: &[u8], order: ByteOrder) -> Result<()> {
        if bytes.len() < 8 {
            self.charset = CharsetId::Undefined;
            self.comment = decode_text(bytes);
            self.byte_order = order;
            return Ok(());
        }

        let mut parser = Parser::new(bytes, order);
        let code = parser.read_bytes(8)?;
        let charset = CharsetId::from_code(code).unwrap_or_else(|| {
            Self::unknown_charset(&String::from_utf8_lossy(code).replace('\0', ""));
            CharsetId::Undefined
        });

        let comment = if charset == CharsetId::Unicode {
            parser.read_utf16_rest()?
        } else {
            let payload = parser.read_rest();
            let end = payload
                .iter()
                .rposition(|b| *b != 0)
                .map_or(0, |last| last + 1);
            decode_text(&payload[..end])
        };

        self.charset = charset;
        self.comment = comment;
        self.byte_order = order;
        Ok(())
    }

    fn encode(&self, order: ByteOrder) -> Vec<u8> {
        let mut out = self.charset.code().to_vec();
        match self.charset {
            CharsetId::Unicode => out.extend(encode_utf16(&self.comment, order)),
            _ => out.extend_from_slice(self.comment.as_bytes()),
        }
        out
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.charset != CharsetId::Undefined {
            write!(f, "charset={} ", self.charset)?;
        }
        f.write_str(&self.comment)
    }

    fn element_text(&self, _index: usize) -> Option<String> {
        Some(super::TextForm(self).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::LogMsg;

    const RAW: &str = "The quick brown fox jumps over the lazy dog. àéīöûç";

    #[test]
    fn ascii_binary() {
        let mut value = TextValue::new(TextKind::Ascii, "");
        value.read_bytes(b"Canon\0\0", ByteOrder::Little).unwrap();
        assert_eq!(value.text, "Canon");
        assert_eq!(value.encode(ByteOrder::Big), b"Canon");
        assert_eq!(value.count(), 5);
        assert_eq!(value.type_id(), TypeId::Ascii);
    }

    #[test]
    fn unicode_text() {
        let value = TextValue::new(TextKind::Unicode, "Hé");
        assert_eq!(value.encode(ByteOrder::Little), vec![0x48, 0x00, 0xE9, 0x00]);
        assert_eq!(value.encode(ByteOrder::Big), vec![0x00, 0x48, 0x00, 0xE9]);
        assert_eq!(value.type_id(), TypeId::Byte);

        let mut decoded = TextValue::new(TextKind::Unicode, "");
        decoded
            .read_bytes(&[0x00, 0x48, 0x00, 0xE9, 0x00, 0x00], ByteOrder::Big)
            .unwrap();
        assert_eq!(decoded.text, "Hé");
    }

    #[test]
    fn comment_text_forms() {
        let mut value = CommentValue::default();
        value.read_str(&format!("charset=Unicode {RAW}")).unwrap();
        assert_eq!(value.charset, CharsetId::Unicode);
        assert_eq!(value.comment, RAW);

        value.read_str("charset=\"Ascii\" plain").unwrap();
        assert_eq!(value.charset, CharsetId::Ascii);
        assert_eq!(value.comment, "plain");

        value.read_str("no prefix").unwrap();
        assert_eq!(value.charset, CharsetId::Undefined);
        assert_eq!(value.comment, "no prefix");
    }

    #[test]
    fn comment_binary() {
        let mut data = b"UNICODE\0".to_vec();
        for unit in RAW.encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }

        let mut value = CommentValue::default();
        value.read_bytes(&data, ByteOrder::Little).unwrap();
        assert_eq!(value.charset, CharsetId::Unicode);
        assert_eq!(value.comment, RAW);
        assert_eq!(value.encode(ByteOrder::Little), data);
        assert_eq!(value.count(), data.len());

        let ascii = CommentValue::new(CharsetId::Ascii, "abc");
        assert_eq!(ascii.encode(ByteOrder::Little), b"ASCII\0\0\0abc");
        let undefined = CommentValue::new(CharsetId::Undefined, "x");
        assert_eq!(undefined.encode(ByteOrder::Little), b"\0\0\0\0\0\0\0\0x");
    }

    #[test]
    fn invalid_charset_warns() {
        let capture = LogMsg::capture();
        let mut value = CommentValue::default();
        value.read_str("charset=Klingon qapla").unwrap();
        assert_eq!(value.charset, CharsetId::Undefined);
        assert_eq!(value.comment, "qapla");
        assert_eq!(capture.by_code(ErrorCode::InvalidCharset).len(), 1);

        value.read_bytes(b"EBCDIC\0\0abc", ByteOrder::Little).unwrap();
        assert_eq!(value.charset, CharsetId::Undefined);
        assert_eq!(value.comment, "abc");
        assert_eq!(capture.by_code(ErrorCode::InvalidCharset).len(), 2);
    }

    #[test]
    fn charset_codes() {
        assert_eq!(CharsetId::from_code(b"JIS\0\0\0\0\0"), Some(CharsetId::Jis));
        assert_eq!(CharsetId::from_code(b"nope\0\0\0\0"), None);
        assert_eq!(CharsetId::Unicode.to_string(), "Unicode");
    }
}
