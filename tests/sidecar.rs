//! Integration tests for XMP sidecar images: packets round trip through an image opened
//! from memory.

use metabind::{
    image::ImageFactory,
    value::{XmpArrayType, XmpStruct},
    ErrorCode, ImageType, Key, Value, XmpData, XmpFormatFlags, XmpParser,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn key(text: &str) -> Key {
    Key::parse(text).unwrap()
}

fn sample() -> XmpData {
    let mut xmp = XmpData::new();
    xmp.add(key("Xmp.dc.format"), Value::xmp_text("image/jpeg"))
        .unwrap();
    xmp.add(
        key("Xmp.dc.creator"),
        Value::xmp_array(XmpArrayType::Seq, ["Ann Example"]),
    )
    .unwrap();
    xmp.add(
        key("Xmp.dc.description"),
        Value::lang_alt([("x-default", "Boats at dawn"), ("fr-FR", "Bateaux à l'aube")]),
    )
    .unwrap();
    xmp.add(key("Xmp.xmp.Rating"), Value::xmp_text("4"))
        .unwrap();

    let mut location = Value::xmp_text("");
    location.set_xmp_struct(XmpStruct::Struct).unwrap();
    xmp.add(key("Xmp.iptc.CreatorContactInfo"), location)
        .unwrap();
    xmp.add(
        key("Xmp.iptc.CreatorContactInfo/Iptc4xmpCore:CiEmailWork"),
        Value::xmp_text("ann@example.com"),
    )
    .unwrap();
    xmp
}

#[test]
fn packet_round_trip_through_memory_image() {
    init();
    let parser = XmpParser::initialize().unwrap();
    let original = sample();
    let packet = parser.encode(&original, XmpFormatFlags::empty()).unwrap();

    let mut image = ImageFactory::open_bytes(packet.clone().into_bytes()).unwrap();
    assert_eq!(image.image_type(), ImageType::Xmp);
    image.read_metadata().unwrap();

    let xmp = image.xmp_data();
    assert_eq!(xmp.len(), original.len());
    assert_eq!(xmp.xmp_packet(), packet);
    for datum in original.to_vec() {
        let read = xmp.get(datum.key()).unwrap().to_owned().unwrap();
        assert_eq!(read.value(), datum.value(), "{}", datum.key());
    }

    let creator = xmp.get(&key("Xmp.dc.creator")).unwrap().value().unwrap();
    assert_eq!(creator.type_id(), metabind::TypeId::XmpSeq);
}

#[test]
fn edits_are_written_back() {
    init();
    let parser = XmpParser::initialize().unwrap();
    let packet = parser.encode(&sample(), XmpFormatFlags::empty()).unwrap();

    let mut image = ImageFactory::open_bytes(packet.into_bytes()).unwrap();
    image.read_metadata().unwrap();

    let rating = key("Xmp.xmp.Rating");
    assert!(image.xmp_data_mut().remove(&rating));
    image
        .xmp_data_mut()
        .set(&key("Xmp.dc.source"), Value::xmp_text("film scan"))
        .unwrap();
    image.write_metadata().unwrap();

    let mut reopened = ImageFactory::open_bytes(image.io().to_vec()).unwrap();
    reopened.read_metadata().unwrap();
    let xmp = reopened.xmp_data();
    assert!(!xmp.contains(&rating));
    assert_eq!(
        xmp.get(&key("Xmp.dc.source")).unwrap().text().unwrap(),
        "film scan"
    );
    assert_eq!(xmp.len(), sample().len());
}

#[test]
fn other_formats_are_rejected() {
    init();
    let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x10, b'E', b'x', b'i', b'f'];
    let err = ImageFactory::open_bytes(jpeg).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemoryContainsUnknownImageType);
}

#[test]
fn malformed_sidecar_fails_to_read() {
    init();
    let mut image =
        ImageFactory::open_bytes(b"<?xml version=\"1.0\"?><x:xmpmeta".to_vec()).unwrap();
    let err = image.read_metadata().unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidXMP);
    assert!(image.xmp_data().is_empty());
}
