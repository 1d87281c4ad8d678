//! Static tag dictionaries for Exif, IPTC and XMP keys.
//!
//! The tables cover the commonly used tags of each family. Keys outside the tables remain
//! usable: Exif tags and IPTC datasets can be named by hex number (`Exif.Image.0x9abc`),
//! and any property of a registered XMP namespace is accepted with a default type of
//! [`TypeId::XmpText`].
//!
//! XMP namespaces beyond the built-in ones are added with [`XmpProperties::register_ns`].

use std::sync::OnceLock;

use dashmap::DashMap;
use strum::{Display, EnumString, IntoStaticStr};

use crate::{value::TypeId, Result};

/// Section an Exif tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum SectionId {
    /// Image data structure
    ImageStructure,
    /// Recording offset
    RecordingOffset,
    /// Image data characteristics
    ImageCharacteristics,
    /// Other tags
    OtherTags,
    /// Exif format
    ExifFormat,
    /// Exif version
    ExifVersion,
    /// Image configuration
    ImageConfig,
    /// User information
    UserInfo,
    /// Related file
    RelatedFile,
    /// Date and time
    DateTime,
    /// Picture taking conditions
    CaptureConditions,
    /// GPS information
    #[strum(serialize = "GPS")]
    Gps,
    /// Interoperability information
    Interoperability,
}

/// Dictionary entry of an Exif tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagInfo {
    /// Tag number
    pub tag: u16,
    /// Tag name as used in keys
    pub name: &'static str,
    /// Human readable label
    pub title: &'static str,
    /// Description
    pub desc: &'static str,
    /// Section
    pub section: SectionId,
    /// Default value type
    pub type_id: TypeId,
    /// Default element count, `0` for any
    pub count: u32,
}

/// Dictionary entry of an Exif group (IFD).
#[derive(Debug, Clone, Copy)]
pub struct GroupInfo {
    /// Group name as used in keys
    pub name: &'static str,
    /// Name of the IFD the group lives in
    pub ifd_name: &'static str,
    /// Tags of the group, ordered by tag number
    pub tags: &'static [TagInfo],
}

macro_rules! tag {
    ($tag:expr, $name:literal, $title:literal, $section:ident, $ty:ident, $count:expr, $desc:literal) => {
        TagInfo {
            tag: $tag,
            name: $name,
            title: $title,
            desc: $desc,
            section: SectionId::$section,
            type_id: TypeId::$ty,
            count: $count,
        }
    };
}

const IFD_TAGS: &[TagInfo] = &[
    tag!(0x000b, "ProcessingSoftware", "Processing Software", OtherTags, Ascii, 0,
        "The name and version of the software used to post-process the picture."),
    tag!(0x0100, "ImageWidth", "Image Width", ImageStructure, Long, 1,
        "The number of columns of image data, equal to the number of pixels per row."),
    tag!(0x0101, "ImageLength", "Image Length", ImageStructure, Long, 1,
        "The number of rows of image data."),
    tag!(0x0102, "BitsPerSample", "Bits per Sample", ImageStructure, Short, 3,
        "The number of bits per image component."),
    tag!(0x0103, "Compression", "Compression", ImageStructure, Short, 1,
        "The compression scheme used for the image data."),
    tag!(0x010e, "ImageDescription", "Image Description", OtherTags, Ascii, 0,
        "A character string giving the title of the image."),
    tag!(0x010f, "Make", "Manufacturer", OtherTags, Ascii, 0,
        "The manufacturer of the recording equipment."),
    tag!(0x0110, "Model", "Model", OtherTags, Ascii, 0,
        "The model name or model number of the equipment."),
    tag!(0x0111, "StripOffsets", "Strip Offsets", RecordingOffset, Long, 0,
        "For each strip, the byte offset of that strip."),
    tag!(0x0112, "Orientation", "Orientation", ImageStructure, Short, 1,
        "The image orientation viewed in terms of rows and columns."),
    tag!(0x011a, "XResolution", "X-Resolution", ImageStructure, Rational, 1,
        "The number of pixels per resolution unit in the image width direction."),
    tag!(0x011b, "YResolution", "Y-Resolution", ImageStructure, Rational, 1,
        "The number of pixels per resolution unit in the image height direction."),
    tag!(0x0128, "ResolutionUnit", "Resolution Unit", ImageStructure, Short, 1,
        "The unit for measuring the resolutions."),
    tag!(0x0131, "Software", "Software", OtherTags, Ascii, 0,
        "The name and version of the software or firmware used to generate the image."),
    tag!(0x0132, "DateTime", "Date and Time", OtherTags, Ascii, 20,
        "The date and time of image creation."),
    tag!(0x013b, "Artist", "Artist", OtherTags, Ascii, 0,
        "The name of the camera owner, photographer or image creator."),
    tag!(0x0201, "JPEGInterchangeFormat", "JPEG Interchange Format", RecordingOffset, Long, 1,
        "The offset to the start byte of compressed JPEG data."),
    tag!(0x0202, "JPEGInterchangeFormatLength", "JPEG Interchange Format Length", RecordingOffset, Long, 1,
        "The number of bytes of JPEG compressed thumbnail data."),
    tag!(0x8298, "Copyright", "Copyright", OtherTags, Ascii, 0,
        "Copyright information."),
    tag!(0x8769, "ExifTag", "Exif IFD Pointer", ExifFormat, Long, 1,
        "A pointer to the Exif IFD."),
    tag!(0x8825, "GPSTag", "GPS Info IFD Pointer", ExifFormat, Long, 1,
        "A pointer to the GPS Info IFD."),
    tag!(0x9c9b, "XPTitle", "Windows Title", OtherTags, Byte, 0,
        "Title tag used by Windows, encoded in UCS2."),
    tag!(0x9c9c, "XPComment", "Windows Comment", OtherTags, Byte, 0,
        "Comment tag used by Windows, encoded in UCS2."),
    tag!(0x9c9d, "XPAuthor", "Windows Author", OtherTags, Byte, 0,
        "Author tag used by Windows, encoded in UCS2."),
    tag!(0x9c9e, "XPKeywords", "Windows Keywords", OtherTags, Byte, 0,
        "Keywords tag used by Windows, encoded in UCS2."),
    tag!(0x9c9f, "XPSubject", "Windows Subject", OtherTags, Byte, 0,
        "Subject tag used by Windows, encoded in UCS2."),
];

const EXIF_TAGS: &[TagInfo] = &[
    tag!(0x829a, "ExposureTime", "Exposure Time", CaptureConditions, Rational, 1,
        "Exposure time, given in seconds."),
    tag!(0x829d, "FNumber", "FNumber", CaptureConditions, Rational, 1,
        "The F number."),
    tag!(0x8827, "ISOSpeedRatings", "ISO Speed Ratings", CaptureConditions, Short, 0,
        "The ISO speed and ISO latitude of the camera."),
    tag!(0x9000, "ExifVersion", "Exif Version", ExifVersion, Undefined, 4,
        "The version of the Exif standard supported."),
    tag!(0x9003, "DateTimeOriginal", "Date and Time (original)", DateTime, Ascii, 20,
        "The date and time when the original image data was generated."),
    tag!(0x9004, "DateTimeDigitized", "Date and Time (digitized)", DateTime, Ascii, 20,
        "The date and time when the image was stored as digital data."),
    tag!(0x9201, "ShutterSpeedValue", "Shutter speed", CaptureConditions, SRational, 1,
        "Shutter speed, in APEX units."),
    tag!(0x9202, "ApertureValue", "Aperture", CaptureConditions, Rational, 1,
        "The lens aperture, in APEX units."),
    tag!(0x9204, "ExposureBiasValue", "Exposure Bias", CaptureConditions, SRational, 1,
        "The exposure bias, in APEX units."),
    tag!(0x9209, "Flash", "Flash", CaptureConditions, Short, 1,
        "The status of flash when the image was shot."),
    tag!(0x920a, "FocalLength", "Focal Length", CaptureConditions, Rational, 1,
        "The actual focal length of the lens, in mm."),
    tag!(0x927c, "MakerNote", "Maker Note", UserInfo, Undefined, 0,
        "Manufacturer specific information."),
    tag!(0x9286, "UserComment", "User Comment", UserInfo, Comment, 0,
        "Keywords or comments on the image."),
    tag!(0x9290, "SubSecTime", "Sub-seconds Time", DateTime, Ascii, 0,
        "Fractions of seconds for the DateTime tag."),
    tag!(0x9291, "SubSecTimeOriginal", "Sub-seconds Time Original", DateTime, Ascii, 0,
        "Fractions of seconds for the DateTimeOriginal tag."),
    tag!(0x9292, "SubSecTimeDigitized", "Sub-seconds Time Digitized", DateTime, Ascii, 0,
        "Fractions of seconds for the DateTimeDigitized tag."),
    tag!(0xa001, "ColorSpace", "Color Space", ImageCharacteristics, Short, 1,
        "The color space information tag."),
    tag!(0xa002, "PixelXDimension", "Pixel X Dimension", ImageConfig, Long, 1,
        "The valid width of the meaningful image."),
    tag!(0xa003, "PixelYDimension", "Pixel Y Dimension", ImageConfig, Long, 1,
        "The valid height of the meaningful image."),
    tag!(0xa005, "InteroperabilityTag", "Interoperability IFD Pointer", ExifFormat, Long, 1,
        "A pointer to the Interoperability IFD."),
    tag!(0xa434, "LensModel", "Lens Model", CaptureConditions, Ascii, 0,
        "The lens model name and model number."),
];

const GPS_TAGS: &[TagInfo] = &[
    tag!(0x0000, "GPSVersionID", "GPS Version ID", Gps, Byte, 4,
        "The version of the GPS Info IFD."),
    tag!(0x0001, "GPSLatitudeRef", "GPS Latitude Reference", Gps, Ascii, 2,
        "Whether the latitude is north or south."),
    tag!(0x0002, "GPSLatitude", "GPS Latitude", Gps, Rational, 3,
        "The latitude as degrees, minutes and seconds."),
    tag!(0x0003, "GPSLongitudeRef", "GPS Longitude Reference", Gps, Ascii, 2,
        "Whether the longitude is east or west."),
    tag!(0x0004, "GPSLongitude", "GPS Longitude", Gps, Rational, 3,
        "The longitude as degrees, minutes and seconds."),
    tag!(0x0005, "GPSAltitudeRef", "GPS Altitude Reference", Gps, Byte, 1,
        "The altitude reference, above or below sea level."),
    tag!(0x0006, "GPSAltitude", "GPS Altitude", Gps, Rational, 1,
        "The altitude in meters."),
    tag!(0x0007, "GPSTimeStamp", "GPS Time Stamp", Gps, Rational, 3,
        "The time as UTC, as hour, minute and second."),
    tag!(0x001d, "GPSDateStamp", "GPS Date Stamp", Gps, Ascii, 11,
        "The UTC date as YYYY:MM:DD."),
];

const IOP_TAGS: &[TagInfo] = &[
    tag!(0x0001, "InteroperabilityIndex", "Interoperability Index", Interoperability, Ascii, 0,
        "The identification of the interoperability rule."),
    tag!(0x0002, "InteroperabilityVersion", "Interoperability Version", Interoperability, Undefined, 4,
        "The interoperability version."),
];

static GROUPS: &[GroupInfo] = &[
    GroupInfo { name: "Image", ifd_name: "IFD0", tags: IFD_TAGS },
    GroupInfo { name: "Photo", ifd_name: "Exif", tags: EXIF_TAGS },
    GroupInfo { name: "GPSInfo", ifd_name: "GPSInfo", tags: GPS_TAGS },
    GroupInfo { name: "Iop", ifd_name: "Iop", tags: IOP_TAGS },
    GroupInfo { name: "Thumbnail", ifd_name: "IFD1", tags: IFD_TAGS },
];

/// Lookups in the Exif tag dictionary.
pub struct ExifTags;

impl ExifTags {
    /// Returns every known group.
    #[must_use]
    pub fn group_list() -> &'static [GroupInfo] {
        GROUPS
    }

    /// Returns the group named `name`.
    #[must_use]
    pub fn group(name: &str) -> Option<&'static GroupInfo> {
        GROUPS.iter().find(|group| group.name == name)
    }

    /// Returns `true` if `name` is a known Exif group.
    #[must_use]
    pub fn is_exif_group(name: &str) -> bool {
        Self::group(name).is_some()
    }

    /// Returns the IFD name of group `name`.
    #[must_use]
    pub fn ifd_name(name: &str) -> Option<&'static str> {
        Self::group(name).map(|group| group.ifd_name)
    }

    /// Returns the tags of group `name`.
    #[must_use]
    pub fn tag_list(name: &str) -> Option<&'static [TagInfo]> {
        Self::group(name).map(|group| group.tags)
    }

    /// Looks up a tag of `group` by name.
    #[must_use]
    pub fn tag_by_name(group: &str, name: &str) -> Option<&'static TagInfo> {
        Self::tag_list(group)?.iter().find(|info| info.name == name)
    }

    /// Looks up a tag of `group` by number.
    #[must_use]
    pub fn tag_by_id(group: &str, tag: u16) -> Option<&'static TagInfo> {
        Self::tag_list(group)?.iter().find(|info| info.tag == tag)
    }
}

/// Record number of the IPTC envelope record.
pub const ENVELOPE: u16 = 1;
/// Record number of the IPTC application record.
pub const APPLICATION2: u16 = 2;

/// Dictionary entry of an IPTC dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSet {
    /// Dataset number
    pub number: u16,
    /// Dataset name as used in keys
    pub name: &'static str,
    /// Human readable label
    pub title: &'static str,
    /// Description
    pub desc: &'static str,
    /// Whether the dataset must be present
    pub mandatory: bool,
    /// Whether the dataset may repeat
    pub repeatable: bool,
    /// Minimum size in bytes
    pub min_bytes: u32,
    /// Maximum size in bytes
    pub max_bytes: u32,
    /// Default value type
    pub type_id: TypeId,
    /// Record number
    pub record: u16,
    /// Photoshop name
    pub photoshop: &'static str,
}

macro_rules! dataset {
    ($record:expr, $number:expr, $name:literal, $title:literal, $mandatory:expr, $repeatable:expr,
     $min:expr, $max:expr, $ty:ident, $ps:literal, $desc:literal) => {
        DataSet {
            number: $number,
            name: $name,
            title: $title,
            desc: $desc,
            mandatory: $mandatory,
            repeatable: $repeatable,
            min_bytes: $min,
            max_bytes: $max,
            type_id: TypeId::$ty,
            record: $record,
            photoshop: $ps,
        }
    };
}

static ENVELOPE_DATASETS: &[DataSet] = &[
    dataset!(ENVELOPE, 0, "ModelVersion", "Model Version", true, false, 2, 2, Short, "",
        "A binary number identifying the version of the Information Interchange Model."),
    dataset!(ENVELOPE, 5, "Destination", "Destination", false, true, 0, 1024, String, "",
        "Routing information for the object."),
    dataset!(ENVELOPE, 20, "FileFormat", "File Format", true, false, 2, 2, Short, "",
        "A binary number representing the file format."),
    dataset!(ENVELOPE, 30, "ServiceId", "Service ID", true, false, 0, 10, String, "",
        "Identifies the provider and product."),
    dataset!(ENVELOPE, 40, "EnvelopeNumber", "Envelope Number", true, false, 8, 8, String, "",
        "A number unique for the date and service."),
    dataset!(ENVELOPE, 70, "DateSent", "Date Sent", true, false, 8, 8, Date, "",
        "The date the service sent the material."),
    dataset!(ENVELOPE, 80, "TimeSent", "Time Sent", false, false, 11, 11, Time, "",
        "The time the service sent the material."),
    dataset!(ENVELOPE, 90, "CharacterSet", "Character Set", false, false, 0, 32, String, "",
        "The control functions used for the announcement, invocation or designation of coded character sets."),
];

static APPLICATION2_DATASETS: &[DataSet] = &[
    dataset!(APPLICATION2, 0, "RecordVersion", "Record Version", true, false, 2, 2, Short, "",
        "A binary number identifying the version of the Information Interchange Model, Part II."),
    dataset!(APPLICATION2, 5, "ObjectName", "Object Name", false, false, 0, 64, String, "Document Title",
        "A shorthand reference for the object."),
    dataset!(APPLICATION2, 10, "Urgency", "Urgency", false, false, 1, 1, String, "Urgency",
        "The editorial urgency of content."),
    dataset!(APPLICATION2, 15, "Category", "Category", false, false, 0, 3, String, "Category",
        "The subject of the object data in the opinion of the provider."),
    dataset!(APPLICATION2, 20, "SuppCategory", "Supplemental Category", false, true, 0, 32, String, "Supplemental Categories",
        "Supplemental categories further refining the subject."),
    dataset!(APPLICATION2, 25, "Keywords", "Keywords", false, true, 0, 64, String, "Keywords",
        "Keywords used to express the subject of the content."),
    dataset!(APPLICATION2, 26, "LocationCode", "Location Code", false, true, 3, 3, String, "",
        "The ISO code of a country, region or location."),
    dataset!(APPLICATION2, 27, "LocationName", "Location Name", false, true, 0, 64, String, "",
        "The name of a country, region or location."),
    dataset!(APPLICATION2, 40, "SpecialInstructions", "Special Instructions", false, false, 0, 256, String, "Instructions",
        "Other editorial instructions concerning the use of the object data."),
    dataset!(APPLICATION2, 55, "DateCreated", "Date Created", false, false, 8, 8, Date, "Date Created",
        "The date the intellectual content of the object data was created."),
    dataset!(APPLICATION2, 60, "TimeCreated", "Time Created", false, false, 11, 11, Time, "",
        "The time the intellectual content of the object data was created."),
    dataset!(APPLICATION2, 62, "DigitizationDate", "Digital Creation Date", false, false, 8, 8, Date, "",
        "The date the digital representation of the object data was created."),
    dataset!(APPLICATION2, 63, "DigitizationTime", "Digital Creation Time", false, false, 11, 11, Time, "",
        "The time the digital representation of the object data was created."),
    dataset!(APPLICATION2, 65, "Program", "Program", false, false, 0, 32, String, "",
        "The type of program used to originate the object data."),
    dataset!(APPLICATION2, 70, "ProgramVersion", "Program Version", false, false, 0, 10, String, "",
        "The version of the program."),
    dataset!(APPLICATION2, 80, "Byline", "By-line", false, true, 0, 32, String, "Author",
        "The name of the creator of the object."),
    dataset!(APPLICATION2, 85, "BylineTitle", "By-line Title", false, true, 0, 32, String, "Authors Position",
        "The title of the creator or creators of the object."),
    dataset!(APPLICATION2, 90, "City", "City", false, false, 0, 32, String, "City",
        "The name of the city of the object origin."),
    dataset!(APPLICATION2, 92, "SubLocation", "Sub Location", false, false, 0, 32, String, "",
        "The location within a city of the object origin."),
    dataset!(APPLICATION2, 95, "ProvinceState", "Province State", false, false, 0, 32, String, "State/Province",
        "The province or state of the object origin."),
    dataset!(APPLICATION2, 100, "CountryCode", "Country Code", false, false, 3, 3, String, "",
        "The code of the country of the object origin."),
    dataset!(APPLICATION2, 101, "CountryName", "Country Name", false, false, 0, 64, String, "Country",
        "The name of the country of the object origin."),
    dataset!(APPLICATION2, 105, "Headline", "Headline", false, false, 0, 256, String, "Headline",
        "A publishable entry providing a synopsis of the contents of the object data."),
    dataset!(APPLICATION2, 110, "Credit", "Credit", false, false, 0, 32, String, "Credit",
        "The provider of the object data."),
    dataset!(APPLICATION2, 115, "Source", "Source", false, false, 0, 32, String, "Source",
        "The original owner of the intellectual content of the object data."),
    dataset!(APPLICATION2, 116, "Copyright", "Copyright", false, false, 0, 128, String, "Copyright Notice",
        "Any necessary copyright notice."),
    dataset!(APPLICATION2, 118, "Contact", "Contact", false, true, 0, 128, String, "",
        "The person or organisation which can provide further background information."),
    dataset!(APPLICATION2, 120, "Caption", "Caption", false, false, 0, 2000, String, "Description",
        "A textual description of the object data."),
    dataset!(APPLICATION2, 122, "Writer", "Writer", false, true, 0, 32, String, "Description Writer",
        "The name of the person involved in the writing of the description."),
];

/// Lookups in the IPTC dataset dictionary.
pub struct IptcDataSets;

impl IptcDataSets {
    /// Returns the datasets of the envelope record.
    #[must_use]
    pub fn envelope_record_list() -> &'static [DataSet] {
        ENVELOPE_DATASETS
    }

    /// Returns the datasets of the application record.
    #[must_use]
    pub fn application2_record_list() -> &'static [DataSet] {
        APPLICATION2_DATASETS
    }

    fn record_list(record: u16) -> &'static [DataSet] {
        match record {
            ENVELOPE => ENVELOPE_DATASETS,
            APPLICATION2 => APPLICATION2_DATASETS,
            _ => &[],
        }
    }

    /// Returns the number of the record named `name`.
    #[must_use]
    pub fn record_id(name: &str) -> Option<u16> {
        match name {
            "Envelope" => Some(ENVELOPE),
            "Application2" => Some(APPLICATION2),
            _ => None,
        }
    }

    /// Returns the name of record `record`.
    #[must_use]
    pub fn record_name(record: u16) -> Option<&'static str> {
        match record {
            ENVELOPE => Some("Envelope"),
            APPLICATION2 => Some("Application2"),
            _ => None,
        }
    }

    /// Returns the description of record `record`.
    #[must_use]
    pub fn record_desc(record: u16) -> Option<&'static str> {
        match record {
            ENVELOPE => Some("IIM envelope record"),
            APPLICATION2 => Some("IIM application record 2"),
            _ => None,
        }
    }

    /// Returns the dictionary entry of dataset `number` in `record`.
    #[must_use]
    pub fn data_set_info(number: u16, record: u16) -> Option<&'static DataSet> {
        Self::record_list(record)
            .iter()
            .find(|dataset| dataset.number == number)
    }

    /// Returns the number of the dataset named `name` in `record`.
    #[must_use]
    pub fn data_set(name: &str, record: u16) -> Option<u16> {
        Self::record_list(record)
            .iter()
            .find(|dataset| dataset.name == name)
            .map(|dataset| dataset.number)
    }

    /// Returns `true` if dataset `number` in `record` may repeat. Unknown datasets may.
    #[must_use]
    pub fn data_set_repeatable(number: u16, record: u16) -> bool {
        Self::data_set_info(number, record).map_or(true, |dataset| dataset.repeatable)
    }
}

/// A registered XMP namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmpNamespace {
    /// Prefix as used in keys
    pub prefix: String,
    /// Namespace URI
    pub uri: String,
    /// Prefix written in RDF/XML packets
    pub xml_prefix: String,
}

/// Dictionary entry of an XMP property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmpPropertyInfo {
    /// Property name
    pub name: &'static str,
    /// Human readable label
    pub title: &'static str,
    /// Description
    pub desc: &'static str,
    /// Default value type
    pub type_id: TypeId,
}

/// `(key prefix, uri, xml prefix)` of the built-in namespaces.
static NAMESPACES: &[(&str, &str, &str)] = &[
    ("dc", "http://purl.org/dc/elements/1.1/", "dc"),
    ("xmp", "http://ns.adobe.com/xap/1.0/", "xmp"),
    ("xmpRights", "http://ns.adobe.com/xap/1.0/rights/", "xmpRights"),
    ("xmpMM", "http://ns.adobe.com/xap/1.0/mm/", "xmpMM"),
    ("photoshop", "http://ns.adobe.com/photoshop/1.0/", "photoshop"),
    ("tiff", "http://ns.adobe.com/tiff/1.0/", "tiff"),
    ("exif", "http://ns.adobe.com/exif/1.0/", "exif"),
    ("exifEX", "http://cipa.jp/exif/1.0/", "exifEX"),
    ("aux", "http://ns.adobe.com/exif/1.0/aux/", "aux"),
    ("crs", "http://ns.adobe.com/camera-raw-settings/1.0/", "crs"),
    ("lr", "http://ns.adobe.com/lightroom/1.0/", "lr"),
    ("iptc", "http://iptc.org/std/Iptc4xmpCore/1.0/xmlns/", "Iptc4xmpCore"),
    ("iptcExt", "http://iptc.org/std/Iptc4xmpExt/2008-02-29/", "Iptc4xmpExt"),
    ("plus", "http://ns.useplus.org/ldf/xmp/1.0/", "plus"),
    ("xmpDM", "http://ns.adobe.com/xmp/1.0/DynamicMedia/", "xmpDM"),
];

macro_rules! property {
    ($name:literal, $title:literal, $ty:ident, $desc:literal) => {
        XmpPropertyInfo {
            name: $name,
            title: $title,
            desc: $desc,
            type_id: TypeId::$ty,
        }
    };
}

static DC_PROPERTIES: &[XmpPropertyInfo] = &[
    property!("creator", "Creator", XmpSeq, "The entities primarily responsible for making the resource."),
    property!("description", "Description", LangAlt, "A textual description of the content of the resource."),
    property!("rights", "Rights", LangAlt, "Informal rights statement."),
    property!("subject", "Subject", XmpBag, "Descriptive phrases or keywords about the resource."),
    property!("title", "Title", LangAlt, "The title of the document, or the name given to the resource."),
    property!("format", "Format", XmpText, "The file format used when saving the resource."),
];

static XMP_PROPERTIES: &[XmpPropertyInfo] = &[
    property!("CreateDate", "Create Date", XmpText, "The date and time the resource was originally created."),
    property!("CreatorTool", "Creator Tool", XmpText, "The name of the first known tool used to create the resource."),
    property!("ModifyDate", "Modify Date", XmpText, "The date and time the resource was last modified."),
    property!("MetadataDate", "Metadata Date", XmpText, "The date and time that any metadata for this resource was last changed."),
    property!("Nickname", "Nickname", XmpText, "A short informal name for the resource."),
    property!("Rating", "Rating", XmpText, "A number that indicates a document's status relative to other documents."),
];

static PHOTOSHOP_PROPERTIES: &[XmpPropertyInfo] = &[
    property!("City", "City", XmpText, "Name of the city of the location shown in the image."),
    property!("Country", "Country", XmpText, "Name of the country of the location shown in the image."),
    property!("DateCreated", "Date Created", XmpText, "The date the intellectual content of the document was created."),
    property!("Headline", "Headline", XmpText, "A publishable entry providing a synopsis of the contents of the item."),
];

static TIFF_PROPERTIES: &[XmpPropertyInfo] = &[
    property!("Make", "Make", XmpText, "Manufacturer of recording equipment."),
    property!("Model", "Model", XmpText, "Model name or number of equipment."),
    property!("Orientation", "Orientation", XmpText, "The orientation of the image."),
];

static IPTC_PROPERTIES: &[XmpPropertyInfo] = &[
    property!("CountryCode", "Country Code", XmpText, "Code of the country the content is focussing on."),
    property!("CreatorContactInfo", "Creator's Contact Info", XmpText, "The creator's contact information."),
    property!("Location", "Location", XmpText, "Name of a location the content is focussing on."),
];

static IPTC_EXT_PROPERTIES: &[XmpPropertyInfo] = &[
    property!("LocationCreated", "Location Created", XmpBag, "The location the photo was taken."),
    property!("LocationShown", "Location Shown", XmpBag, "A location shown in the image."),
    property!("PersonInImage", "Person In Image", XmpBag, "Name of a person shown in the image."),
];

static CUSTOM_NAMESPACES: OnceLock<DashMap<String, XmpNamespace>> = OnceLock::new();

fn custom_namespaces() -> &'static DashMap<String, XmpNamespace> {
    CUSTOM_NAMESPACES.get_or_init(DashMap::new)
}

/// Lookups in the XMP namespace and property dictionary.
pub struct XmpProperties;

impl XmpProperties {
    /// Returns the namespace registered for key prefix `prefix`.
    #[must_use]
    pub fn namespace(prefix: &str) -> Option<XmpNamespace> {
        if let Some((prefix, uri, xml_prefix)) = NAMESPACES.iter().find(|ns| ns.0 == prefix) {
            return Some(XmpNamespace {
                prefix: (*prefix).to_string(),
                uri: (*uri).to_string(),
                xml_prefix: (*xml_prefix).to_string(),
            });
        }
        custom_namespaces()
            .get(prefix)
            .map(|ns| ns.value().clone())
    }

    /// Returns the namespace URI of `prefix`.
    #[must_use]
    pub fn ns(prefix: &str) -> Option<String> {
        Self::namespace(prefix).map(|ns| ns.uri)
    }

    /// Returns the namespace whose URI is `uri`.
    #[must_use]
    pub fn namespace_by_uri(uri: &str) -> Option<XmpNamespace> {
        if let Some((prefix, _, _)) = NAMESPACES.iter().find(|ns| ns.1 == uri) {
            return Self::namespace(prefix);
        }
        custom_namespaces()
            .iter()
            .find(|ns| ns.uri == uri)
            .map(|ns| ns.value().clone())
    }

    /// Returns the key prefix registered for `uri`.
    #[must_use]
    pub fn prefix(uri: &str) -> Option<String> {
        Self::namespace_by_uri(uri).map(|ns| ns.prefix)
    }

    /// Returns every registered namespace, built-in ones first.
    #[must_use]
    pub fn namespaces() -> Vec<XmpNamespace> {
        let mut all: Vec<XmpNamespace> = NAMESPACES
            .iter()
            .filter_map(|ns| Self::namespace(ns.0))
            .collect();
        let mut custom: Vec<XmpNamespace> = custom_namespaces()
            .iter()
            .map(|ns| ns.value().clone())
            .collect();
        custom.sort_by(|a, b| a.prefix.cmp(&b.prefix));
        all.extend(custom);
        all
    }

    /// Registers a custom namespace. Re-registering a prefix replaces its URI.
    ///
    /// # Errors
    /// Returns [`crate::Error::Native`] with [`crate::ErrorCode::InvalidKey`] for an empty
    /// or dotted prefix, and with [`crate::ErrorCode::XMPToolkitError`] when `prefix`
    /// names a built-in namespace.
    pub fn register_ns(uri: &str, prefix: &str) -> Result<()> {
        if prefix.is_empty() || prefix.contains(['.', ':', '/']) {
            return Err(native_error!(
                crate::ErrorCode::InvalidKey,
                "Invalid XMP prefix '{}'",
                prefix
            ));
        }
        if NAMESPACES.iter().any(|ns| ns.0 == prefix) {
            return Err(native_error!(
                crate::ErrorCode::XMPToolkitError,
                "Cannot re-register built-in XMP prefix '{}'",
                prefix
            ));
        }

        custom_namespaces().insert(
            prefix.to_string(),
            XmpNamespace {
                prefix: prefix.to_string(),
                uri: uri.to_string(),
                xml_prefix: prefix.to_string(),
            },
        );
        Ok(())
    }

    /// Removes a custom namespace. Returns `true` if it was registered.
    pub fn unregister_ns(prefix: &str) -> bool {
        custom_namespaces().remove(prefix).is_some()
    }

    /// Returns the dictionary entries of namespace `prefix`.
    #[must_use]
    pub fn property_list(prefix: &str) -> &'static [XmpPropertyInfo] {
        match prefix {
            "dc" => DC_PROPERTIES,
            "xmp" => XMP_PROPERTIES,
            "photoshop" => PHOTOSHOP_PROPERTIES,
            "tiff" => TIFF_PROPERTIES,
            "iptc" => IPTC_PROPERTIES,
            "iptcExt" => IPTC_EXT_PROPERTIES,
            _ => &[],
        }
    }

    /// Returns the dictionary entry of property `name` in namespace `prefix`.
    #[must_use]
    pub fn property_info(prefix: &str, name: &str) -> Option<&'static XmpPropertyInfo> {
        Self::property_list(prefix)
            .iter()
            .find(|info| info.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exif_lookups() {
        let info = ExifTags::tag_by_name("Image", "ImageDescription").unwrap();
        assert_eq!(info.tag, 270);
        assert_eq!(info.title, "Image Description");
        assert_eq!(info.section.to_string(), "OtherTags");
        assert_eq!(info.type_id, TypeId::Ascii);
        assert!(info.desc.starts_with("A character string giving the title"));

        assert_eq!(ExifTags::ifd_name("Image"), Some("IFD0"));
        assert!(ExifTags::is_exif_group("GPSInfo"));
        assert!(!ExifTags::is_exif_group("Nowhere"));
        assert_eq!(ExifTags::group_list()[0].name, "Image");
        assert_eq!(ExifTags::tag_list("Image").unwrap()[0].name, "ProcessingSoftware");
        assert_eq!(ExifTags::tag_by_id("Photo", 0x920a).unwrap().name, "FocalLength");
    }

    #[test]
    fn tables_are_sorted() {
        for group in ExifTags::group_list() {
            assert!(group.tags.windows(2).all(|w| w[0].tag < w[1].tag), "{}", group.name);
        }
        for record in [ENVELOPE, APPLICATION2] {
            let list = IptcDataSets::record_list(record);
            assert!(list.windows(2).all(|w| w[0].number < w[1].number));
        }
    }

    #[test]
    fn iptc_lookups() {
        let record = IptcDataSets::record_id("Application2").unwrap();
        let number = IptcDataSets::data_set("Caption", record).unwrap();
        let info = IptcDataSets::data_set_info(number, record).unwrap();
        assert_eq!(info.photoshop, "Description");
        assert_eq!(info.type_id, TypeId::String);
        assert!(!info.repeatable);
        assert!(IptcDataSets::data_set_repeatable(25, record));
        assert_eq!(IptcDataSets::record_desc(record), Some("IIM application record 2"));

        let first = &IptcDataSets::application2_record_list()[0];
        assert_eq!(first.name, "RecordVersion");
        assert_eq!((first.min_bytes, first.max_bytes), (2, 2));
        assert!(first.mandatory);
    }

    #[test]
    fn xmp_namespaces() {
        assert_eq!(
            XmpProperties::ns("dc").as_deref(),
            Some("http://purl.org/dc/elements/1.1/")
        );
        assert_eq!(
            XmpProperties::prefix("http://iptc.org/std/Iptc4xmpExt/2008-02-29/").as_deref(),
            Some("iptcExt")
        );
        assert_eq!(
            XmpProperties::property_info("dc", "description").unwrap().type_id,
            TypeId::LangAlt
        );
        assert!(XmpProperties::ns("nope").is_none());
    }

    #[test]
    fn custom_namespace() {
        XmpProperties::register_ns("http://example.com/tagsTest/", "tagsTest").unwrap();
        assert_eq!(
            XmpProperties::ns("tagsTest").as_deref(),
            Some("http://example.com/tagsTest/")
        );
        assert!(XmpProperties::namespaces().iter().any(|ns| ns.prefix == "tagsTest"));
        assert!(XmpProperties::register_ns("http://example.com/", "dc").is_err());
        assert!(XmpProperties::register_ns("http://example.com/", "a.b").is_err());
        assert!(XmpProperties::unregister_ns("tagsTest"));
        assert!(XmpProperties::ns("tagsTest").is_none());
    }
}
