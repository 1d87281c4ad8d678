//! The free XMP codec functions require an initialised parser context.
//!
//! Kept in its own test binary: other tests hold parser handles concurrently.

use metabind::{xmp, ErrorCode, XmpData, XmpFormatFlags, XmpParser};

#[test]
fn free_functions_need_a_context() {
    assert!(!XmpParser::is_initialized());

    let err = xmp::encode(&XmpData::new(), XmpFormatFlags::empty()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::XMPToolkitError);
    let err = xmp::decode("").unwrap_err();
    assert_eq!(err.code(), ErrorCode::XMPToolkitError);

    let parser = XmpParser::initialize().unwrap();
    assert!(XmpParser::is_initialized());
    assert_eq!(xmp::encode(&XmpData::new(), XmpFormatFlags::empty()).unwrap(), "");
    assert!(xmp::decode("").unwrap().is_empty());

    parser.terminate();
    assert!(!XmpParser::is_initialized());
    assert!(xmp::decode("").is_err());
}
