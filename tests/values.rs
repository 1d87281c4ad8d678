//! Integration tests for the value model: text and binary round trips, range enforcement
//! and language alternatives.

use metabind::{
    diagnostics::LogMsg, value::XmpArrayType, ByteOrder, CharsetId, ErrorCode, Scalar,
    TypeId, Value,
};

fn text_round_trip(type_id: TypeId, text: &str) {
    let value = Value::parse(type_id, text).unwrap();
    let printed = value.to_string();

    let mut reread = Value::create(type_id).unwrap();
    reread.read_str(&printed).unwrap();
    assert_eq!(reread.to_string(), printed, "{type_id}");
    assert_eq!(reread, value, "{type_id}");
}

#[test]
fn text_round_trips() {
    text_round_trip(TypeId::Byte, "1 2 255");
    text_round_trip(TypeId::Short, "65535 0 7");
    text_round_trip(TypeId::Long, "4294967295");
    text_round_trip(TypeId::SShort, "-32768 12");
    text_round_trip(TypeId::SLong, "-5");
    text_round_trip(TypeId::Rational, "1/250 28/10");
    text_round_trip(TypeId::SRational, "-1/3");
    text_round_trip(TypeId::Float, "1.5 -0.25");
    text_round_trip(TypeId::Double, "3.125");
    text_round_trip(TypeId::Undefined, "0 1 2 3");
    text_round_trip(TypeId::Ascii, "Acme Corp");
    text_round_trip(TypeId::String, "Harbour at dawn");
    text_round_trip(TypeId::Comment, "charset=Ascii Hello");
    text_round_trip(TypeId::Comment, "charset=Unicode Grüße");
    text_round_trip(TypeId::Date, "2024-02-29");
    text_round_trip(TypeId::Time, "10:15:30+01:00");
    text_round_trip(TypeId::XmpText, "image/jpeg");
    text_round_trip(TypeId::XmpBag, "sky, sea");
    text_round_trip(TypeId::LangAlt, "lang=\"x-default\" Boat, lang=\"de-DE\" Boot");
}

fn binary_round_trip(type_id: TypeId, bytes: &[u8], order: ByteOrder) {
    let mut value = Value::create(type_id).unwrap();
    value.read_bytes(bytes, order).unwrap();
    assert_eq!(value.size(), bytes.len(), "{type_id}");

    let mut buf = vec![0u8; bytes.len()];
    assert_eq!(value.copy(&mut buf, order), bytes.len());
    assert_eq!(buf, bytes, "{type_id}");
}

#[test]
fn binary_round_trips() {
    binary_round_trip(TypeId::Short, &[0x00, 0x01, 0xFF, 0xFE], ByteOrder::Big);
    binary_round_trip(TypeId::Long, &[0x78, 0x56, 0x34, 0x12], ByteOrder::Little);
    binary_round_trip(
        TypeId::Rational,
        &[0, 0, 0, 1, 0, 0, 0, 250],
        ByteOrder::Big,
    );
    binary_round_trip(TypeId::Undefined, &[0x30, 0x32, 0x33, 0x30], ByteOrder::Little);
    binary_round_trip(TypeId::Date, b"20240229", ByteOrder::Little);
    binary_round_trip(TypeId::Time, b"101530+0100", ByteOrder::Little);
    binary_round_trip(TypeId::Comment, b"ASCII\0\0\0Hello", ByteOrder::Little);
    binary_round_trip(
        TypeId::Comment,
        b"UNICODE\0H\0i\0",
        ByteOrder::Little,
    );
}

#[test]
fn unsigned_ranges() {
    assert!(Value::from_scalars(TypeId::Short, &[Scalar::Int(65535)]).is_ok());

    let err = Value::from_scalars(TypeId::Short, &[Scalar::Int(65536)]).unwrap_err();
    assert!(matches!(err, metabind::Error::Range { .. }));

    let err = Value::parse(TypeId::Short, "65536").unwrap_err();
    assert!(matches!(err, metabind::Error::Range { .. }));

    assert!(Value::from_scalars(TypeId::Rational, &[Scalar::Rational(-1, 2)]).is_err());
    assert!(Value::from_scalars(TypeId::SRational, &[Scalar::Rational(-1, 2)]).is_ok());
}

#[test]
fn coercion_sets_ok_flag() {
    let value = Value::parse(TypeId::Rational, "1/2 3/4").unwrap();
    assert_eq!(value.to_float(1), Some(0.75));
    assert!(value.ok());
    assert_eq!(value.to_rational(0), Some((1, 2)));

    assert_eq!(value.to_int(5), None);
    assert!(!value.ok());

    let text = Value::ascii("not a number");
    assert_eq!(text.to_int(0), Some(i64::from(b'n')));
    assert!(text.ok());
    assert_eq!(text.to_float(100), None);
    assert!(!text.ok());
}

#[test]
fn lang_alt_semantics() {
    let mut value = Value::lang_alt([("x-default", "A"), ("en-GB", "A")]);
    assert_eq!(value.to_string(), "lang=\"x-default\" A, lang=\"en-GB\" A");

    let alt = value.as_lang_alt_mut().unwrap();
    assert_eq!(alt.remove("en-GB").as_deref(), Some("A"));
    assert!(!alt.contains("en-GB"));
    alt.insert("en-GB", "A");
    assert!(alt.contains("en-GB"));
    assert_eq!(alt.len(), 2);
    assert_eq!(alt.keys().filter(|lang| *lang == "x-default").count(), 1);

    assert_eq!(value.to_string(), "lang=\"x-default\" A, lang=\"en-GB\" A");
}

#[test]
fn xmp_arrays() {
    let mut value = Value::xmp_array(XmpArrayType::Seq, ["one", "two"]);
    assert_eq!(value.type_id(), TypeId::XmpSeq);
    assert_eq!(value.count(), 2);

    let array = value.as_xmp_array_mut().unwrap();
    array.push("three");
    assert_eq!(array.get(-1).unwrap(), "three");
    assert_eq!(array.remove(0).unwrap(), "one");
    assert_eq!(value.to_string(), "two, three");
}

#[test]
fn unknown_charset_warns() {
    let capture = LogMsg::capture();

    let value = Value::parse(TypeId::Comment, "charset=Klingon Qapla'").unwrap();
    assert_eq!(value.as_comment().unwrap().charset, CharsetId::Undefined);

    assert_eq!(capture.by_code(ErrorCode::InvalidCharset).len(), 1);
}
