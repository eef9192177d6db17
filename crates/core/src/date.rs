// ABOUTME: ISO-8601 and lenient RFC-822 timestamp parsing for feeds and page metadata.
// ABOUTME: RFC-822 uses a fixed day-counting formula so legacy timestamps stay bit-compatible.

//! Date parsing.
//!
//! Two grammars are supported:
//! - ISO-8601 "date with optional time": `2002-10-02`, `2002-10-02T10:00`,
//!   `2002-10-02T10:00:00.123+05:00`. A missing offset means UTC.
//! - RFC-822 as found in RSS feeds, parsed leniently: the day of week is
//!   skipped, time fields are optional, and zones may be numeric offsets,
//!   `Z`, a legacy US/military abbreviation or an IANA zone name (`CET`,
//!   `Europe/Paris`). Unknown names are read as UTC.
//!
//! Numeric RFC-822 fields are 32-bit; larger values are format errors.
//!
//! RFC-822 epoch conversion counts leap days with `year % 4 == 0` only. This
//! is not Gregorian-exact for 1900 or 2100 and is kept that way so stored
//! timestamps keep matching previously parsed values.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FormatError;

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Cumulative days before each month in a non-leap year.
const DAYS_BEFORE_MONTH: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Legacy zone abbreviations. Values are added to the local time to get UTC.
const ZONE_OFFSETS: &[(&str, i64)] = &[
    ("UT", 0),
    ("UTC", 0),
    ("GMT", 0),
    ("EST", 5 * MILLIS_PER_HOUR),
    ("EDT", 4 * MILLIS_PER_HOUR),
    ("CST", 6 * MILLIS_PER_HOUR),
    ("CDT", 5 * MILLIS_PER_HOUR),
    ("MST", 7 * MILLIS_PER_HOUR),
    ("MDT", 6 * MILLIS_PER_HOUR),
    ("PST", 8 * MILLIS_PER_HOUR),
    ("PDT", 7 * MILLIS_PER_HOUR),
    ("A", -MILLIS_PER_HOUR),
    ("M", -MILLIS_PER_HOUR),
    ("N", MILLIS_PER_HOUR),
    ("Y", 12 * MILLIS_PER_HOUR),
];

static ISO8601_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?(?:T(\d{2})(?::?(\d{2})(?::?(\d{2})(?:[.,](\d+))?)?)?(Z|[+-]\d{2}(?::?\d{2})?)?)?$",
    )
    .expect("static ISO-8601 pattern")
});

/// Parses an ISO-8601 date with an optional time part.
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, FormatError> {
    let trimmed = s.trim();
    let invalid = || FormatError::new(format!("Invalid ISO-8601 format: \"{}\"", trimmed), trimmed, 0);
    let caps = ISO8601_RE.captures(trimmed).ok_or_else(invalid)?;

    let num = |i: usize, default: u32| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(default)
    };

    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let date = NaiveDate::from_ymd_opt(year, num(2, 1), num(3, 1)).ok_or_else(invalid)?;

    let nanos = caps
        .get(7)
        .map(|m| {
            let digits: String = m.as_str().chars().take(9).collect();
            format!("{:0<9}", digits).parse::<u32>().unwrap_or(0)
        })
        .unwrap_or(0);
    let time = NaiveTime::from_hms_nano_opt(num(4, 0), num(5, 0), num(6, 0), nanos)
        .ok_or_else(invalid)?;
    let local = NaiveDateTime::new(date, time);

    let offset = match caps.get(8).map(|m| m.as_str()) {
        None | Some("Z") => FixedOffset::east_opt(0),
        Some(zone) => {
            let sign = if zone.starts_with('-') { -1 } else { 1 };
            let digits: String = zone[1..].chars().filter(|c| *c != ':').collect();
            let hours: i32 = digits.get(0..2).and_then(|h| h.parse().ok()).unwrap_or(0);
            let minutes: i32 = digits.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
            FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        }
    }
    .ok_or_else(invalid)?;

    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(invalid)
}

/// Parses an ISO-8601 timestamp, returning `None` on failure.
pub fn try_parse_iso8601(s: &str) -> Option<DateTime<Utc>> {
    parse_iso8601(s).ok()
}

/// Parses a lenient RFC-822 timestamp.
///
/// Fields are read in fixed order: day, month name, year, then optional
/// hour, minute, second and zone. Fields left off the end default to zero.
pub fn parse_rfc822(s: &str) -> Result<DateTime<Utc>, FormatError> {
    let mut cursor = Cursor::new(s);

    cursor.skip_to_digit();
    if cursor.at_end() {
        return Err(FormatError::new("Not an RFC822 timestamp", s, 0));
    }

    let token = cursor.read_to_space();
    let day: i32 = token
        .parse()
        .map_err(|_| cursor.error("Unable to parse day", token))?;

    cursor.skip_spaces();
    let token = cursor.read_to_space();
    let month = month_number(token).ok_or_else(|| cursor.error("Invalid month", token))?;

    cursor.skip_spaces();
    let token = cursor.read_to_space();
    let year: i32 = token
        .parse()
        .map_err(|_| cursor.error("Unable to parse year", token))?;

    cursor.skip_spaces();
    if cursor.at_end() {
        return to_utc(timestamp_millis(year, month, day, 0, 0, 0), s);
    }

    let token = cursor.read_to_time_delim();
    let hour: i32 = token
        .parse()
        .map_err(|_| cursor.error("Unable to parse hour", token))?;
    cursor.skip_spaces();
    if cursor.at_end() {
        return to_utc(timestamp_millis(year, month, day, hour, 0, 0), s);
    }

    let token = cursor.read_to_time_delim();
    let minute: i32 = token
        .parse()
        .map_err(|_| cursor.error("Unable to parse minutes", token))?;
    cursor.skip_spaces();
    if cursor.at_end() {
        return to_utc(timestamp_millis(year, month, day, hour, minute, 0), s);
    }

    let token = cursor.read_to_space();
    let second = token
        .parse::<f64>()
        .ok()
        .map(f64::trunc)
        .filter(|v| v.is_finite() && v.abs() <= f64::from(i32::MAX))
        .map(|v| v as i32)
        .ok_or_else(|| cursor.error("Unable to parse seconds", token))?;
    cursor.skip_spaces();

    let local_millis = timestamp_millis(year, month, day, hour, minute, second);
    if cursor.at_end() {
        return to_utc(local_millis, s);
    }

    let zone = cursor.read_to_space();
    let Some(local_millis) = local_millis else {
        return to_utc(None, s);
    };
    let offset = zone_offset_millis(zone, local_millis).map_err(|msg| cursor.error(msg, zone))?;
    to_utc(local_millis.checked_add(offset), s)
}

/// Parses an RFC-822 timestamp, returning `None` on failure.
pub fn try_parse_rfc822(s: &str) -> Option<DateTime<Utc>> {
    parse_rfc822(s).ok()
}

/// Tries ISO-8601 first, then RFC-822.
pub fn parse_date_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    try_parse_iso8601(s).or_else(|| try_parse_rfc822(s))
}

/// Tries RFC-822 first, then ISO-8601. Feed dates are usually RFC-822.
pub fn parse_feed_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    try_parse_rfc822(s).or_else(|| try_parse_iso8601(s))
}

/// Milliseconds since the epoch using the legacy day-counting formula.
///
/// `month` is 1-based. The leap day for the current year is added only when
/// `year % 4 == 0` and the month is past February. `None` when the result
/// does not fit in an `i64`.
pub fn timestamp_millis(year: i32, month: u32, day: i32, hour: i32, min: i32, sec: i32) -> Option<i64> {
    let (year, day) = (i64::from(year), i64::from(day));
    let month_index = (month.clamp(1, 12) - 1) as usize;
    let mut days = 365 * (year - 1970) + DAYS_BEFORE_MONTH[month_index] + (day - 1);
    days += (year - 1969) / 4;
    if month > 2 && year % 4 == 0 {
        days += 1;
    }
    let hours = days.checked_mul(24)?.checked_add(i64::from(hour))?;
    let minutes = hours.checked_mul(60)?.checked_add(i64::from(min))?;
    let seconds = minutes.checked_mul(60)?.checked_add(i64::from(sec))?;
    seconds.checked_mul(1000)
}

fn to_utc(millis: Option<i64>, source: &str) -> Result<DateTime<Utc>, FormatError> {
    millis
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| FormatError::new("Timestamp out of range", source, source.len()))
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

/// Offset in millis to add to a local time to get UTC. `local_millis` is
/// the wall-clock time read as if it were UTC; named zones use the offset in
/// force at that time.
fn zone_offset_millis(zone: &str, local_millis: i64) -> Result<i64, &'static str> {
    let first = zone.chars().next().unwrap_or('Z');
    match first {
        'Z' | 'z' => Ok(0),
        '+' | '-' | '0'..='9' => {
            let digits = zone.strip_prefix(['+', '-']).unwrap_or(zone);
            let chars: Vec<char> = digits.chars().collect();
            let hour_end = chars.len().min(2);
            let hours: i64 = chars[..hour_end]
                .iter()
                .collect::<String>()
                .parse()
                .map_err(|_| "Invalid offset hours")?;
            let mut offset = hours * MILLIS_PER_HOUR;

            let mut start = hour_end;
            if chars.get(start) == Some(&':') {
                start += 1;
            }
            if start < chars.len() {
                let end = chars.len().min(start + 2);
                let minutes: i64 = chars[start..end]
                    .iter()
                    .collect::<String>()
                    .parse()
                    .map_err(|_| "Invalid offset minutes")?;
                offset += minutes * 60_000;
            }
            Ok(if first == '-' { offset } else { -offset })
        }
        _ => Ok(ZONE_OFFSETS
            .iter()
            .find(|(name, _)| *name == zone)
            .map(|(_, offset)| *offset)
            .or_else(|| named_zone_offset_millis(zone, local_millis))
            .unwrap_or_else(|| {
                tracing::debug!(zone, "unknown timezone name, assuming UTC");
                0
            })),
    }
}

fn named_zone_offset_millis(zone: &str, local_millis: i64) -> Option<i64> {
    let tz: Tz = zone.parse().ok()?;
    let local = DateTime::from_timestamp_millis(local_millis)?.naive_utc();
    let offset = tz
        .offset_from_local_datetime(&local)
        .earliest()
        .unwrap_or_else(|| tz.offset_from_utc_datetime(&local));
    Some(-i64::from(offset.fix().local_minus_utc()) * 1000)
}

/// Byte cursor over the input. Delimiters are ASCII, so every slice lands on
/// a char boundary.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn skip_to_digit(&mut self) {
        while !self.at_end() && !self.bytes()[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
    }

    fn skip_spaces(&mut self) {
        while !self.at_end() && self.bytes()[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn read_to_space(&mut self) -> &'a str {
        let start = self.pos;
        while !self.at_end() && !self.bytes()[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Reads up to ':' or ' ', consuming the delimiter.
    fn read_to_time_delim(&mut self) -> &'a str {
        let start = self.pos;
        while !self.at_end() {
            let b = self.bytes()[self.pos];
            if b == b':' || b == b' ' {
                let token = &self.src[start..self.pos];
                self.pos += 1;
                return token;
            }
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn error(&self, message: &str, fragment: &str) -> FormatError {
        FormatError::new(
            format!("{}: {} ({})", message, fragment, self.src),
            fragment,
            self.pos,
        )
    }
}
