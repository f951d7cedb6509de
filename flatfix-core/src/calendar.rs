/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Byte-exact FIX calendar codecs.
//!
//! This module provides:
//! - [`Date`]: `YYYYMMDD`
//! - [`TimeOnly`]: `HH:MM:SS` with an optional fractional part
//! - [`Timestamp`]: `YYYYMMDD-HH:MM:SS` with an optional fractional part
//! - [`Precision`]: fractional-second precision (0/3/6/9 digits)
//!
//! Values are parsed from and formatted to exact byte widths; for every
//! valid encoding, `format(parse(bytes)) == bytes`. Calendar bounds are
//! checked against the Gregorian leap rule. Second 60 is accepted to absorb
//! a leap second and is rolled into the next minute when converting to
//! epoch time.

use crate::error::{CalendarShape, FormatError};
use chrono::{Datelike, Timelike, Utc};

/// Fractional-second precision of a FIX time value.
///
/// FIX permits fractional seconds of exactly 3 (milli), 6 (micro), or
/// 9 (nano) digits, or none at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Precision {
    /// No fractional part.
    #[default]
    Second,
    /// Exactly 3 fractional digits.
    Milli,
    /// Exactly 6 fractional digits.
    Micro,
    /// Exactly 9 fractional digits.
    Nano,
}

impl Precision {
    /// Number of fractional digits for this precision.
    #[inline]
    #[must_use]
    pub const fn fraction_digits(self) -> usize {
        match self {
            Self::Second => 0,
            Self::Milli => 3,
            Self::Micro => 6,
            Self::Nano => 9,
        }
    }

    /// Width the fraction adds to a formatted time, including the dot.
    #[inline]
    #[must_use]
    pub const fn fraction_width(self) -> usize {
        match self {
            Self::Second => 0,
            Self::Milli => 4,
            Self::Micro => 7,
            Self::Nano => 10,
        }
    }

    /// Maps a fractional digit count to a precision. Only 0/3/6/9 are valid.
    #[inline]
    #[must_use]
    pub const fn from_fraction_digits(digits: usize) -> Option<Self> {
        match digits {
            0 => Some(Self::Second),
            3 => Some(Self::Milli),
            6 => Some(Self::Micro),
            9 => Some(Self::Nano),
            _ => None,
        }
    }
}

/// A FIX date, wire format `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    year: u16,
    month: u8,
    day: u8,
}

/// Cumulative day counts per month in a non-leap year, for epoch math.
const DAYS_BEFORE_MONTH: [u32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Gregorian leap rule: divisible by 4 and (not by 100 or by 400).
#[inline]
#[must_use]
pub const fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in a month, honoring leap years.
#[inline]
#[must_use]
pub const fn days_in_month(year: u16, month: u8) -> u8 {
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS_IN_MONTH[(month - 1) as usize]
    }
}

impl Date {
    /// Wire width of a formatted date.
    pub const WIRE_LEN: usize = 8;

    /// Creates a date from components.
    ///
    /// # Errors
    /// [`FormatError::InvalidCalendar`] if the components are out of
    /// calendar bounds.
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self, FormatError> {
        if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
            return Err(FormatError::InvalidCalendar(CalendarShape::Date));
        }
        Ok(Self { year, month, day })
    }

    /// Parses a `YYYYMMDD` value. Width, digits, and calendar bounds are all
    /// checked.
    ///
    /// # Errors
    /// [`FormatError::InvalidCalendar`] on any violation.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let err = FormatError::InvalidCalendar(CalendarShape::Date);
        if bytes.len() != Self::WIRE_LEN {
            return Err(err);
        }
        let year = parse_digits(&bytes[0..4]).ok_or(err)? as u16;
        let month = parse_digits(&bytes[4..6]).ok_or(err)? as u8;
        let day = parse_digits(&bytes[6..8]).ok_or(err)? as u8;
        Self::new(year, month, day)
    }

    /// Appends the `YYYYMMDD` encoding to `out`.
    pub fn format(&self, out: &mut Vec<u8>) {
        push_padded(out, u32::from(self.year), 4);
        push_padded(out, u32::from(self.month), 2);
        push_padded(out, u32::from(self.day), 2);
    }

    /// The year component.
    #[inline]
    #[must_use]
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// The month component (1-12).
    #[inline]
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// The day component (1-31).
    #[inline]
    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Days since the Unix epoch (1970-01-01).
    #[must_use]
    pub fn days_since_epoch(&self) -> i64 {
        let year = i64::from(self.year);
        // Whole years since 1970, with leap days up to (not including) this year.
        let leap_days = |y: i64| y / 4 - y / 100 + y / 400;
        let days_to_year = (year - 1970) * 365 + leap_days(year - 1) - leap_days(1969);
        let mut days = days_to_year + i64::from(DAYS_BEFORE_MONTH[(self.month - 1) as usize]);
        if self.month > 2 && is_leap_year(self.year) {
            days += 1;
        }
        days + i64::from(self.day) - 1
    }
}

/// Returns true if `bytes` is a valid `YYYYMMDD` encoding.
#[must_use]
pub fn is_valid_date(bytes: &[u8]) -> bool {
    Date::parse(bytes).is_ok()
}

/// A FIX time-of-day, wire format `HH:MM:SS` plus an optional fraction.
///
/// Seconds range 0-60; the 60 absorbs a leap second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOnly {
    hour: u8,
    minute: u8,
    second: u8,
    /// Fractional part in nanoseconds, regardless of precision.
    nanos: u32,
    precision: Precision,
}

impl TimeOnly {
    /// Wire width of the `HH:MM:SS` stem.
    pub const STEM_LEN: usize = 8;

    /// Creates a time from components.
    ///
    /// # Errors
    /// [`FormatError::InvalidCalendar`] if a component is out of bounds.
    pub fn new(
        hour: u8,
        minute: u8,
        second: u8,
        nanos: u32,
        precision: Precision,
    ) -> Result<Self, FormatError> {
        if hour > 23 || minute > 59 || second > 60 || nanos >= 1_000_000_000 {
            return Err(FormatError::InvalidCalendar(CalendarShape::TimeOnly));
        }
        Ok(Self {
            hour,
            minute,
            second,
            nanos,
            precision,
        })
    }

    /// Parses `HH:MM:SS[.fff[fff[fff]]]`. The fraction must have exactly
    /// 3, 6, or 9 digits when present.
    ///
    /// # Errors
    /// [`FormatError::InvalidCalendar`] on any violation.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let err = FormatError::InvalidCalendar(CalendarShape::TimeOnly);
        if bytes.len() < Self::STEM_LEN {
            return Err(err);
        }
        if bytes[2] != b':' || bytes[5] != b':' {
            return Err(err);
        }
        let hour = parse_digits(&bytes[0..2]).ok_or(err)? as u8;
        let minute = parse_digits(&bytes[3..5]).ok_or(err)? as u8;
        let second = parse_digits(&bytes[6..8]).ok_or(err)? as u8;

        let (nanos, precision) = parse_fraction(&bytes[Self::STEM_LEN..]).ok_or(err)?;
        Self::new(hour, minute, second, nanos, precision)
    }

    /// Appends the wire encoding to `out`, honoring the stored precision.
    pub fn format(&self, out: &mut Vec<u8>) {
        push_padded(out, u32::from(self.hour), 2);
        out.push(b':');
        push_padded(out, u32::from(self.minute), 2);
        out.push(b':');
        push_padded(out, u32::from(self.second), 2);
        format_fraction(self.nanos, self.precision, out);
    }

    /// Wire width of this value as formatted.
    #[inline]
    #[must_use]
    pub const fn wire_len(&self) -> usize {
        Self::STEM_LEN + self.precision.fraction_width()
    }

    /// The hour component (0-23).
    #[inline]
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// The minute component (0-59).
    #[inline]
    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// The second component (0-60, 60 being a leap second).
    #[inline]
    #[must_use]
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// The fractional part in nanoseconds.
    #[inline]
    #[must_use]
    pub const fn nanos(&self) -> u32 {
        self.nanos
    }

    /// The fractional-second precision this value was parsed/built with.
    #[inline]
    #[must_use]
    pub const fn precision(&self) -> Precision {
        self.precision
    }

    /// Nanoseconds since midnight. A leap second (second == 60) rolls
    /// forward into the next minute.
    #[must_use]
    pub fn nanos_since_midnight(&self) -> u64 {
        let seconds = u64::from(self.hour) * 3600 + u64::from(self.minute) * 60
            + u64::from(self.second);
        seconds * 1_000_000_000 + u64::from(self.nanos)
    }
}

/// Returns true if `bytes` is a valid FIX time-only encoding.
#[must_use]
pub fn is_valid_time(bytes: &[u8]) -> bool {
    TimeOnly::parse(bytes).is_ok()
}

/// A FIX timestamp, wire format `YYYYMMDD-HH:MM:SS` plus an optional
/// fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    date: Date,
    time: TimeOnly,
}

impl Timestamp {
    /// Creates a timestamp from parts.
    #[inline]
    #[must_use]
    pub const fn from_parts(date: Date, time: TimeOnly) -> Self {
        Self { date, time }
    }

    /// Parses `YYYYMMDD-HH:MM:SS[.fff[fff[fff]]]`.
    ///
    /// # Errors
    /// [`FormatError::InvalidCalendar`] on any violation.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let err = FormatError::InvalidCalendar(CalendarShape::Timestamp);
        if bytes.len() < Date::WIRE_LEN + 1 + TimeOnly::STEM_LEN || bytes[Date::WIRE_LEN] != b'-' {
            return Err(err);
        }
        let date = Date::parse(&bytes[..Date::WIRE_LEN]).map_err(|_| err)?;
        let time = TimeOnly::parse(&bytes[Date::WIRE_LEN + 1..]).map_err(|_| err)?;
        Ok(Self { date, time })
    }

    /// Appends the wire encoding to `out`.
    pub fn format(&self, out: &mut Vec<u8>) {
        self.date.format(out);
        out.push(b'-');
        self.time.format(out);
    }

    /// Wire width of this value as formatted.
    #[inline]
    #[must_use]
    pub const fn wire_len(&self) -> usize {
        Date::WIRE_LEN + 1 + self.time.wire_len()
    }

    /// The date part.
    #[inline]
    #[must_use]
    pub const fn date(&self) -> Date {
        self.date
    }

    /// The time part.
    #[inline]
    #[must_use]
    pub const fn time(&self) -> TimeOnly {
        self.time
    }

    /// Nanoseconds since the Unix epoch. A leap second rolls forward into
    /// the next minute.
    #[must_use]
    pub fn epoch_nanos(&self) -> i64 {
        self.date.days_since_epoch() * 86_400_000_000_000
            + self.time.nanos_since_midnight() as i64
    }

    /// The current UTC time at the requested precision.
    ///
    /// # Panics
    /// Never in practice; the current date is always within calendar bounds.
    #[must_use]
    pub fn now(precision: Precision) -> Self {
        let now = Utc::now();
        let nanos = match precision {
            Precision::Second => 0,
            Precision::Milli => now.nanosecond() / 1_000_000 * 1_000_000,
            Precision::Micro => now.nanosecond() / 1_000 * 1_000,
            Precision::Nano => now.nanosecond(),
        };
        let date = Date::new(now.year() as u16, now.month() as u8, now.day() as u8)
            .unwrap_or(Date {
                year: 1970,
                month: 1,
                day: 1,
            });
        let time = TimeOnly::new(
            now.hour() as u8,
            now.minute() as u8,
            now.second() as u8,
            nanos.min(999_999_999),
            precision,
        )
        .unwrap_or(TimeOnly {
            hour: 0,
            minute: 0,
            second: 0,
            nanos: 0,
            precision,
        });
        Self { date, time }
    }
}

/// Returns true if `bytes` is a valid FIX timestamp encoding.
#[must_use]
pub fn is_valid_timestamp(bytes: &[u8]) -> bool {
    Timestamp::parse(bytes).is_ok()
}

/// Parses an all-digit slice into a u32, or `None` on any non-digit.
#[inline]
pub(crate) fn parse_digits(bytes: &[u8]) -> Option<u32> {
    let mut value: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u32::from(b - b'0');
    }
    Some(value)
}

/// Parses a `.fff[fff[fff]]` suffix (possibly empty) into nanoseconds and a
/// precision. Digit counts other than 3/6/9 are invalid.
pub(crate) fn parse_fraction(bytes: &[u8]) -> Option<(u32, Precision)> {
    if bytes.is_empty() {
        return Some((0, Precision::Second));
    }
    let (dot, digits) = bytes.split_first()?;
    if *dot != b'.' {
        return None;
    }
    let precision = Precision::from_fraction_digits(digits.len())?;
    if precision == Precision::Second {
        return None;
    }
    let value = parse_digits(digits)?;
    let nanos = match precision {
        Precision::Milli => value * 1_000_000,
        Precision::Micro => value * 1_000,
        Precision::Nano => value,
        Precision::Second => unreachable!(),
    };
    Some((nanos, precision))
}

/// Appends the fractional suffix for `nanos` at `precision` to `out`.
pub(crate) fn format_fraction(nanos: u32, precision: Precision, out: &mut Vec<u8>) {
    let digits = precision.fraction_digits();
    if digits == 0 {
        return;
    }
    out.push(b'.');
    let value = match precision {
        Precision::Milli => nanos / 1_000_000,
        Precision::Micro => nanos / 1_000,
        _ => nanos,
    };
    push_padded(out, value, digits);
}

/// Appends `value` as exactly `width` zero-padded ASCII digits.
pub(crate) fn push_padded(out: &mut Vec<u8>, value: u32, width: usize) {
    let start = out.len();
    out.resize(start + width, b'0');
    let mut v = value;
    for i in (0..width).rev() {
        out[start + i] = b'0' + (v % 10) as u8;
        v /= 10;
    }
}
