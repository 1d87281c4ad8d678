//! IPTC date and time values.
//!
//! Text forms follow ISO 8601 (`2024-03-09`, `13:05:00+01:30`); binary forms are the
//! IPTC digit strings (`20240309`, `130500+0130`).

use std::fmt;

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike};

use super::{Scalar, TypeId, ValueCodec};
use crate::{io::ByteOrder, ErrorCode, Result};

/// A calendar date.
///
/// The default, all-zero date is the unset date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DateValue {
    /// Year
    pub year: i32,
    /// Month, 1-based
    pub month: u32,
    /// Day of month, 1-based
    pub day: u32,
}

fn date_error(text: &str) -> crate::Error {
    parse_error!(
        code: ErrorCode::UnsupportedDateFormat,
        "Unsupported date format '{}'",
        text
    )
}

fn time_error(text: &str) -> crate::Error {
    parse_error!(
        code: ErrorCode::UnsupportedTimeFormat,
        "Unsupported time format '{}'",
        text
    )
}

impl DateValue {
    /// Creates a date, validating it against the calendar.
    ///
    /// # Errors
    /// Returns [`crate::Error::Parse`] with [`ErrorCode::UnsupportedDateFormat`] for dates
    /// that do not exist and for years outside `0..=9999`, which the four digit year field
    /// cannot hold.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| date_error(&format!("{year:04}-{month:02}-{day:02}")))
            .and_then(Self::try_from)
    }

    /// Replaces the date, validating it against the calendar.
    ///
    /// # Errors
    /// See [`DateValue::new`]; the value is unchanged on failure.
    pub fn set_date(&mut self, year: i32, month: u32, day: u32) -> Result<()> {
        *self = Self::new(year, month, day)?;
        Ok(())
    }

    /// Returns the date as a [`NaiveDate`], or `None` for the unset date.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// Returns `(field, value)` pairs in declaration order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, i64); 3] {
        [
            ("year", i64::from(self.year)),
            ("month", i64::from(self.month)),
            ("day", i64::from(self.day)),
        ]
    }

    fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let digits: String = match text.len() {
            8 => text.to_string(),
            10 if text.as_bytes()[4] == b'-' && text.as_bytes()[7] == b'-' => {
                text.split('-').collect()
            }
            _ => return Err(date_error(text)),
        };
        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(date_error(text));
        }

        let field = |range: std::ops::Range<usize>| digits[range].parse::<u32>().ok();
        let (Some(year), Some(month), Some(day)) = (field(0..4), field(4..6), field(6..8)) else {
            return Err(date_error(text));
        };

        // All zeroes is the unset date.
        if year == 0 && month == 0 && day == 0 {
            return Ok(Self::default());
        }

        let year = i32::try_from(year).map_err(|_| date_error(text))?;
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| date_error(text))
            .and_then(Self::try_from)
    }

    fn seconds(&self) -> Option<i64> {
        self.to_naive()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc().timestamp())
    }
}

impl TryFrom<NaiveDate> for DateValue {
    type Error = crate::Error;

    fn try_from(date: NaiveDate) -> Result<Self> {
        if !(0..=9999).contains(&date.year()) {
            return Err(date_error(&date.to_string()));
        }
        Ok(DateValue {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        })
    }
}

impl ValueCodec for DateValue {
    fn type_id(&self) -> TypeId {
        TypeId::Date
    }

    fn count(&self) -> usize {
        self.size()
    }

    fn read_str(&mut self, text: &str) -> Result<()> {
        *self = Self::parse(text)?;
        Ok(())
    }

    fn read_bytes(&mut self, bytes: &[u8], _order: ByteOrder) -> Result<()> {
        let text = bytes
            .get(..8)
            .and_then(|digits| std::str::from_utf8(digits).ok())
            .ok_or_else(|| date_error(&String::from_utf8_lossy(bytes)))?;
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(date_error(text));
        }
        *self = Self::parse(text)?;
        Ok(())
    }

    fn encode(&self, _order: ByteOrder) -> Vec<u8> {
        format!("{:04}{:02}{:02}", self.year, self.month, self.day).into_bytes()
    }

    fn size(&self) -> usize {
        8
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    fn element_text(&self, _index: usize) -> Option<String> {
        Some(super::TextForm(self).to_string())
    }

    fn element_scalar(&self, _index: usize) -> Option<Scalar> {
        self.seconds().map(Scalar::Int)
    }
}

/// A time of day with a zone offset.
///
/// Negative zones carry the sign on both offset fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimeValue {
    /// Hour, 0-23
    pub hour: u32,
    /// Minute, 0-59
    pub minute: u32,
    /// Second, 0-59
    pub second: u32,
    /// Zone offset hours, -23..=23
    pub tz_hour: i32,
    /// Zone offset minutes, -59..=59
    pub tz_minute: i32,
}

impl TimeValue {
    /// Creates a time, validating every field.
    ///
    /// # Errors
    /// Returns [`crate::Error::Parse`] with [`ErrorCode::UnsupportedTimeFormat`] if a field
    /// is out of range.
    pub fn new(hour: u32, minute: u32, second: u32, tz_hour: i32, tz_minute: i32) -> Result<Self> {
        let time = TimeValue {
            hour,
            minute,
            second,
            tz_hour,
            tz_minute,
        };
        if hour > 23
            || minute > 59
            || second > 59
            || tz_hour.abs() > 23
            || tz_minute.abs() > 59
            || (tz_hour < 0 && tz_minute > 0)
            || (tz_hour > 0 && tz_minute < 0)
        {
            return Err(time_error(&super::TextForm(&time).to_string()));
        }
        Ok(time)
    }

    /// Replaces the time, validating every field.
    ///
    /// # Errors
    /// See [`TimeValue::new`]; the value is unchanged on failure.
    pub fn set_time(
        &mut self,
        hour: u32,
        minute: u32,
        second: u32,
        tz_hour: i32,
        tz_minute: i32,
    ) -> Result<()> {
        *self = Self::new(hour, minute, second, tz_hour, tz_minute)?;
        Ok(())
    }

    /// Creates a time from chrono parts.
    #[must_use]
    pub fn from_chrono(time: NaiveTime, offset: FixedOffset) -> Self {
        let total = offset.local_minus_utc() / 60;
        TimeValue {
            hour: time.hour(),
            minute: time.minute(),
            second: time.second().min(59),
            tz_hour: total / 60,
            tz_minute: total % 60,
        }
    }

    /// Returns the local time of day.
    #[must_use]
    pub fn to_naive(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, self.second)
    }

    /// Returns the zone offset.
    #[must_use]
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.offset_seconds())
    }

    /// Returns `(field, value)` pairs in declaration order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, i64); 5] {
        [
            ("hour", i64::from(self.hour)),
            ("minute", i64::from(self.minute)),
            ("second", i64::from(self.second)),
            ("tzHour", i64::from(self.tz_hour)),
            ("tzMinute", i64::from(self.tz_minute)),
        ]
    }

    fn offset_seconds(&self) -> i32 {
        self.tz_hour * 3600 + self.tz_minute * 60
    }

    fn sign(&self) -> char {
        if self.tz_hour < 0 || self.tz_minute < 0 {
            '-'
        } else {
            '+'
        }
    }

    /// Parses `HH:MM[:SS][Z|±HH[:MM]]` or the compact `HHMMSS±HHMM`.
    fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let (clock, zone) = match trimmed.find(['+', '-', 'Z']) {
            Some(pos) => trimmed.split_at(pos),
            None => (trimmed, ""),
        };

        let fields = split_digits(clock).ok_or_else(|| time_error(text))?;
        let (hour, minute, second) = match fields.as_slice() {
            [h, m] => (*h, *m, 0),
            [h, m, s] => (*h, *m, *s),
            _ => return Err(time_error(text)),
        };

        let (tz_hour, tz_minute) = match zone {
            "" | "Z" => (0, 0),
            _ => {
                let negative = zone.starts_with('-');
                let parts = split_digits(&zone[1..]).ok_or_else(|| time_error(text))?;
                let (h, m) = match parts.as_slice() {
                    [h] => (*h, 0),
                    [h, m] => (*h, *m),
                    _ => return Err(time_error(text)),
                };
                let (h, m) = (
                    i32::try_from(h).map_err(|_| time_error(text))?,
                    i32::try_from(m).map_err(|_| time_error(text))?,
                );
                if negative {
                    (-h, -m)
                } else {
                    (h, m)
                }
            }
        };

        Self::new(hour, minute, second, tz_hour, tz_minute).map_err(|_| time_error(text))
    }
}

/// Splits `HH:MM:SS` or `HHMMSS` into numeric two-digit fields.
fn split_digits(text: &str) -> Option<Vec<u32>> {
    let parts: Vec<&str> = if text.contains(':') {
        text.split(':').collect()
    } else {
        if text.len() % 2 != 0 || !text.is_ascii() {
            return None;
        }
        (0..text.len())
            .step_by(2)
            .map(|i| &text[i..i + 2])
            .collect()
    };

    parts
        .into_iter()
        .map(|part| {
            if part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit()) {
                part.parse().ok()
            } else {
                None
            }
        })
        .collect()
}

impl ValueCodec for TimeValue {
    fn type_id(&self) -> TypeId {
        TypeId::Time
    }

    fn count(&self) -> usize {
        self.size()
    }

    fn read_str(&mut self, text: &str) -> Result<()> {
        *self = Self::parse(text)?;
        Ok(())
    }

    fn read_bytes(&mut self, bytes: &[u8], _order: ByteOrder) -> Result<()> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| time_error(&String::from_utf8_lossy(bytes)))?
            .trim_end_matches('\0');
        if text.contains(':') {
            return Err(time_error(text));
        }
        *self = Self::parse(text)?;
        Ok(())
    }

    fn encode(&self, _order: ByteOrder) -> Vec<u8> {
        format!(
            "{:02}{:02}{:02}{}{:02}{:02}",
            self.hour,
            self.minute,
            self.second,
            self.sign(),
            self.tz_hour.abs(),
            self.tz_minute.abs()
        )
        .into_bytes()
    }

    fn size(&self) -> usize {
        11
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}:{:02}",
            self.hour,
            self.minute,
            self.second,
            self.sign(),
            self.tz_hour.abs(),
            self.tz_minute.abs()
        )
    }

    fn element_text(&self, _index: usize) -> Option<String> {
        Some(super::TextForm(self).to_string())
    }

    fn element_scalar(&self, _index: usize) -> Option<Scalar> {
        let local = i64::from(self.hour) * 3600 + i64::from(self.minute) * 60 + i64::from(self.second);
        Some(Scalar::Int(local - i64::from(self.offset_seconds())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_forms() {
        let mut date = DateValue::default();
        date.read_str("2024-03-09").unwrap();
        assert_eq!(date, DateValue::new(2024, 3, 9).unwrap());
        assert_eq!(super::super::TextForm(&date).to_string(), "2024-03-09");
        assert_eq!(date.encode(ByteOrder::Little), b"20240309");

        let mut compact = DateValue::default();
        compact.read_bytes(b"20240309", ByteOrder::Big).unwrap();
        assert_eq!(compact, date);
        compact.read_str("19991231").unwrap();
        assert_eq!(compact.year, 1999);
    }

    #[test]
    fn date_rejects_malformed() {
        let mut date = DateValue::new(2020, 1, 2).unwrap();
        let err = date.read_str("2020-13-45").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedDateFormat);
        assert!(date.read_str("yesterday").is_err());
        assert!(date.read_bytes(b"2020", ByteOrder::Little).is_err());
        assert_eq!(date, DateValue::new(2020, 1, 2).unwrap());
        assert!(DateValue::new(2023, 2, 29).is_err());
    }

    #[test]
    fn date_years_fit_four_digits() {
        let err = DateValue::new(10000, 1, 1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedDateFormat);
        assert!(DateValue::new(-1, 1, 1).is_err());

        let mut date = DateValue::new(2020, 1, 2).unwrap();
        assert!(date.set_date(10000, 1, 1).is_err());
        assert_eq!(date, DateValue::new(2020, 1, 2).unwrap());

        let far = NaiveDate::from_ymd_opt(12_345, 6, 7).unwrap();
        assert!(DateValue::try_from(far).is_err());

        let last = DateValue::new(9999, 12, 31).unwrap();
        assert_eq!(last.encode(ByteOrder::Little).len(), last.size());
        let mut reread = DateValue::default();
        reread.read_str(&super::super::TextForm(&last).to_string()).unwrap();
        assert_eq!(reread, last);
    }

    #[test]
    fn date_seconds() {
        let date = DateValue::new(1970, 1, 2).unwrap();
        assert_eq!(date.element_scalar(0), Some(Scalar::Int(86_400)));
        assert_eq!(DateValue::default().element_scalar(0), None);
        assert_eq!(
            date.to_naive(),
            NaiveDate::from_ymd_opt(1970, 1, 2)
        );
        assert_eq!(date.fields()[1], ("month", 1));
    }

    #[test]
    fn time_forms() {
        let mut time = TimeValue::default();
        time.read_str("13:05:09+01:30").unwrap();
        assert_eq!(time, TimeValue::new(13, 5, 9, 1, 30).unwrap());
        assert_eq!(super::super::TextForm(&time).to_string(), "13:05:09+01:30");
        assert_eq!(time.encode(ByteOrder::Little), b"130509+0130");

        let mut compact = TimeValue::default();
        compact.read_bytes(b"130509+0130", ByteOrder::Little).unwrap();
        assert_eq!(compact, time);

        compact.read_str("07:15").unwrap();
        assert_eq!(compact, TimeValue::new(7, 15, 0, 0, 0).unwrap());
        compact.read_str("23:59:59Z").unwrap();
        assert_eq!(compact.tz_hour, 0);

        compact.read_str("10:00:00-05:30").unwrap();
        assert_eq!((compact.tz_hour, compact.tz_minute), (-5, -30));
        assert_eq!(super::super::TextForm(&compact).to_string(), "10:00:00-05:30");
    }

    #[test]
    fn time_rejects_malformed() {
        let mut time = TimeValue::new(1, 2, 3, 0, 0).unwrap();
        let err = time.read_str("25:00:00").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedTimeFormat);
        assert!(time.read_str("noon").is_err());
        assert!(time.read_str("12:3").is_err());
        assert!(time.read_str("12:30:00+1:00").is_err());
        assert_eq!(time, TimeValue::new(1, 2, 3, 0, 0).unwrap());
    }

    #[test]
    fn time_seconds_and_chrono() {
        let time = TimeValue::new(2, 0, 0, 1, 30).unwrap();
        assert_eq!(time.element_scalar(0), Some(Scalar::Int(7200 - 5400)));

        let offset = FixedOffset::west_opt(3600 + 1800).unwrap();
        let naive = NaiveTime::from_hms_opt(8, 9, 10).unwrap();
        let converted = TimeValue::from_chrono(naive, offset);
        assert_eq!((converted.tz_hour, converted.tz_minute), (-1, -30));
        assert_eq!(converted.to_naive(), Some(naive));
        assert_eq!(converted.offset(), Some(offset));
    }
}
