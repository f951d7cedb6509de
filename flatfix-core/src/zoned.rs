/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Timezone-qualified FIX calendar codecs.
//!
//! This module provides:
//! - [`TzOffset`]: a timezone offset in one of the three FIX shapes
//!   (`Z`, `+hh`/`-hh`, `+hh:mm`/`-hh:mm`)
//! - [`ZonedTime`]: `HH:MM[:SS[.fff...]]` plus an offset
//! - [`ZonedTimestamp`]: `YYYYMMDD-HH:MM[:SS[.fff...]]` plus an offset
//!
//! The offset shape is preserved by parsing, so `format(parse(b)) == b`
//! holds for every shape and precision. Fractions follow the same exact
//! 3/6/9-digit rule as [`crate::calendar`], down to nanosecond resolution.

use crate::calendar::{Date, Precision, TimeOnly, parse_digits, push_padded};
use crate::error::{CalendarShape, FormatError};

/// A timezone offset as it appeared on the wire.
///
/// FIX allows three shapes; the shape is part of the value so that
/// serialization reproduces the received bytes. The sign is an explicit
/// field rather than carried on the hours: `-00:30` has zero hours but
/// must keep its sign through a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TzOffset {
    /// `Z` - UTC.
    Utc,
    /// `+hh` or `-hh`.
    Hours {
        /// True for a `-` sign (west of UTC).
        negative: bool,
        /// Hours 0-23.
        hours: u8,
    },
    /// `+hh:mm` or `-hh:mm`.
    HoursMinutes {
        /// True for a `-` sign (west of UTC).
        negative: bool,
        /// Hours 0-23.
        hours: u8,
        /// Minutes 0-59.
        minutes: u8,
    },
}

impl TzOffset {
    /// Wire width of this offset shape.
    #[inline]
    #[must_use]
    pub const fn wire_len(self) -> usize {
        match self {
            Self::Utc => 1,
            Self::Hours { .. } => 3,
            Self::HoursMinutes { .. } => 6,
        }
    }

    /// Total offset from UTC in minutes (negative for western offsets).
    #[must_use]
    pub const fn total_minutes(self) -> i32 {
        let (negative, magnitude) = match self {
            Self::Utc => (false, 0),
            Self::Hours { negative, hours } => (negative, hours as i32 * 60),
            Self::HoursMinutes {
                negative,
                hours,
                minutes,
            } => (negative, hours as i32 * 60 + minutes as i32),
        };
        if negative { -magnitude } else { magnitude }
    }

    /// Parses an offset from the tail of a zoned value.
    ///
    /// # Errors
    /// [`FormatError::InvalidCalendar`] unless the bytes are exactly one of
    /// the three shapes with hours 0-23 and minutes 0-59.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let err = FormatError::InvalidCalendar(CalendarShape::ZonedTime);
        match bytes {
            [b'Z'] => Ok(Self::Utc),
            [sign @ (b'+' | b'-'), h @ ..] if h.len() == 2 => {
                let hours = parse_digits(h).ok_or(err)? as u8;
                if hours > 23 {
                    return Err(err);
                }
                Ok(Self::Hours {
                    negative: *sign == b'-',
                    hours,
                })
            }
            [sign @ (b'+' | b'-'), rest @ ..] if rest.len() == 5 && rest[2] == b':' => {
                let hours = parse_digits(&rest[0..2]).ok_or(err)? as u8;
                let minutes = parse_digits(&rest[3..5]).ok_or(err)? as u8;
                if hours > 23 || minutes > 59 {
                    return Err(err);
                }
                Ok(Self::HoursMinutes {
                    negative: *sign == b'-',
                    hours,
                    minutes,
                })
            }
            _ => Err(err),
        }
    }

    /// Appends the wire encoding to `out`.
    pub fn format(self, out: &mut Vec<u8>) {
        match self {
            Self::Utc => out.push(b'Z'),
            Self::Hours { negative, hours } => {
                out.push(if negative { b'-' } else { b'+' });
                push_padded(out, u32::from(hours), 2);
            }
            Self::HoursMinutes {
                negative,
                hours,
                minutes,
            } => {
                out.push(if negative { b'-' } else { b'+' });
                push_padded(out, u32::from(hours), 2);
                out.push(b':');
                push_padded(out, u32::from(minutes), 2);
            }
        }
    }

    /// Locates the offset at the tail of `bytes`, returning the split point.
    ///
    /// The search is purely positional: `Z` as the last byte, or a sign byte
    /// 3 or 6 bytes from the end.
    #[must_use]
    pub fn split_point(bytes: &[u8]) -> Option<usize> {
        let n = bytes.len();
        if n >= 1 && bytes[n - 1] == b'Z' {
            Some(n - 1)
        } else if n >= 3 && matches!(bytes[n - 3], b'+' | b'-') {
            Some(n - 3)
        } else if n >= 6 && matches!(bytes[n - 6], b'+' | b'-') && bytes[n - 3] == b':' {
            Some(n - 6)
        } else {
            None
        }
    }
}

/// Parses the `HH:MM[:SS[.fff...]]` stem of a zoned value.
///
/// Unlike plain [`TimeOnly`], FIX zoned times allow seconds to be omitted.
fn parse_zoned_stem(bytes: &[u8]) -> Result<(TimeOnly, bool), FormatError> {
    let err = FormatError::InvalidCalendar(CalendarShape::ZonedTime);
    if bytes.len() == 5 {
        // HH:MM
        if bytes[2] != b':' {
            return Err(err);
        }
        let hour = parse_digits(&bytes[0..2]).ok_or(err)? as u8;
        let minute = parse_digits(&bytes[3..5]).ok_or(err)? as u8;
        let time = TimeOnly::new(hour, minute, 0, 0, Precision::Second).map_err(|_| err)?;
        return Ok((time, false));
    }
    let time = TimeOnly::parse(bytes).map_err(|_| err)?;
    Ok((time, true))
}

/// A FIX `TZTimeOnly`: time-of-day qualified by a timezone offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZonedTime {
    time: TimeOnly,
    offset: TzOffset,
    /// Whether the `:SS` part was present on the wire.
    with_seconds: bool,
}

impl ZonedTime {
    /// Creates a zoned time carrying explicit seconds.
    #[must_use]
    pub const fn new(time: TimeOnly, offset: TzOffset) -> Self {
        Self {
            time,
            offset,
            with_seconds: true,
        }
    }

    /// Parses `HH:MM[:SS[.fff...]]` followed by an offset.
    ///
    /// # Errors
    /// [`FormatError::InvalidCalendar`] on any violation.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let err = FormatError::InvalidCalendar(CalendarShape::ZonedTime);
        let split = TzOffset::split_point(bytes).ok_or(err)?;
        let offset = TzOffset::parse(&bytes[split..])?;
        let (time, with_seconds) = parse_zoned_stem(&bytes[..split])?;
        Ok(Self {
            time,
            offset,
            with_seconds,
        })
    }

    /// Appends the wire encoding to `out`.
    pub fn format(&self, out: &mut Vec<u8>) {
        if self.with_seconds {
            self.time.format(out);
        } else {
            push_padded(out, u32::from(self.time.hour()), 2);
            out.push(b':');
            push_padded(out, u32::from(self.time.minute()), 2);
        }
        self.offset.format(out);
    }

    /// The local time-of-day part.
    #[inline]
    #[must_use]
    pub const fn time(&self) -> TimeOnly {
        self.time
    }

    /// The timezone offset.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> TzOffset {
        self.offset
    }
}

/// A FIX `TZTimestamp`: date-time qualified by a timezone offset, with
/// fractional seconds down to nanosecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZonedTimestamp {
    date: Date,
    time: TimeOnly,
    offset: TzOffset,
    with_seconds: bool,
}

impl ZonedTimestamp {
    /// Creates a zoned timestamp carrying explicit seconds.
    #[must_use]
    pub const fn new(date: Date, time: TimeOnly, offset: TzOffset) -> Self {
        Self {
            date,
            time,
            offset,
            with_seconds: true,
        }
    }

    /// Parses `YYYYMMDD-HH:MM[:SS[.fff...]]` followed by an offset.
    ///
    /// # Errors
    /// [`FormatError::InvalidCalendar`] on any violation.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let err = FormatError::InvalidCalendar(CalendarShape::ZonedTimestamp);
        if bytes.len() < Date::WIRE_LEN + 1 || bytes[Date::WIRE_LEN] != b'-' {
            return Err(err);
        }
        let date = Date::parse(&bytes[..Date::WIRE_LEN]).map_err(|_| err)?;
        let tail = &bytes[Date::WIRE_LEN + 1..];
        let split = TzOffset::split_point(tail).ok_or(err)?;
        let offset = TzOffset::parse(&tail[split..]).map_err(|_| err)?;
        let (time, with_seconds) = parse_zoned_stem(&tail[..split]).map_err(|_| err)?;
        Ok(Self {
            date,
            time,
            offset,
            with_seconds,
        })
    }

    /// Appends the wire encoding to `out`.
    pub fn format(&self, out: &mut Vec<u8>) {
        self.date.format(out);
        out.push(b'-');
        if self.with_seconds {
            self.time.format(out);
        } else {
            push_padded(out, u32::from(self.time.hour()), 2);
            out.push(b':');
            push_padded(out, u32::from(self.time.minute()), 2);
        }
        self.offset.format(out);
    }

    /// The date part.
    #[inline]
    #[must_use]
    pub const fn date(&self) -> Date {
        self.date
    }

    /// The local time part.
    #[inline]
    #[must_use]
    pub const fn time(&self) -> TimeOnly {
        self.time
    }

    /// The timezone offset.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> TzOffset {
        self.offset
    }

    /// Nanoseconds since the Unix epoch in UTC, the offset applied.
    #[must_use]
    pub fn epoch_nanos(&self) -> i64 {
        let local = self.date.days_since_epoch() * 86_400_000_000_000
            + self.time.nanos_since_midnight() as i64;
        local - i64::from(self.offset.total_minutes()) * 60_000_000_000
    }
}

/// Returns true if `bytes` is a valid zoned time-only encoding.
#[must_use]
pub fn is_valid_zoned_time(bytes: &[u8]) -> bool {
    ZonedTime::parse(bytes).is_ok()
}

/// Returns true if `bytes` is a valid zoned timestamp encoding.
#[must_use]
pub fn is_valid_zoned_timestamp(bytes: &[u8]) -> bool {
    ZonedTimestamp::parse(bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip_zoned_time(input: &[u8]) {
        let parsed = ZonedTime::parse(input).unwrap();
        let mut out = Vec::new();
        parsed.format(&mut out);
        assert_eq!(out, input);
    }

    fn round_trip_zoned_timestamp(input: &[u8]) {
        let parsed = ZonedTimestamp::parse(input).unwrap();
        let mut out = Vec::new();
        parsed.format(&mut out);
        assert_eq!(out, input);
    }

    #[test]
    fn test_offset_shapes() {
        assert_eq!(TzOffset::parse(b"Z"), Ok(TzOffset::Utc));
        assert_eq!(
            TzOffset::parse(b"+05"),
            Ok(TzOffset::Hours {
                negative: false,
                hours: 5
            })
        );
        assert_eq!(
            TzOffset::parse(b"-11"),
            Ok(TzOffset::Hours {
                negative: true,
                hours: 11
            })
        );
        assert_eq!(
            TzOffset::parse(b"+05:30"),
            Ok(TzOffset::HoursMinutes {
                negative: false,
                hours: 5,
                minutes: 30
            })
        );
        assert_eq!(
            TzOffset::parse(b"-03:45"),
            Ok(TzOffset::HoursMinutes {
                negative: true,
                hours: 3,
                minutes: 45
            })
        );
        assert_eq!(
            TzOffset::parse(b"-00"),
            Ok(TzOffset::Hours {
                negative: true,
                hours: 0
            })
        );
        assert_eq!(
            TzOffset::parse(b"-00:30"),
            Ok(TzOffset::HoursMinutes {
                negative: true,
                hours: 0,
                minutes: 30
            })
        );
        assert!(TzOffset::parse(b"+24").is_err());
        assert!(TzOffset::parse(b"+05:60").is_err());
        assert!(TzOffset::parse(b"05:30").is_err());
        assert!(TzOffset::parse(b"").is_err());
    }

    #[test]
    fn test_offset_minutes() {
        assert_eq!(TzOffset::Utc.total_minutes(), 0);
        assert_eq!(
            TzOffset::Hours {
                negative: true,
                hours: 5
            }
            .total_minutes(),
            -300
        );
        assert_eq!(
            TzOffset::HoursMinutes {
                negative: false,
                hours: 5,
                minutes: 30
            }
            .total_minutes(),
            330
        );
        assert_eq!(
            TzOffset::HoursMinutes {
                negative: true,
                hours: 5,
                minutes: 30
            }
            .total_minutes(),
            -330
        );
        assert_eq!(
            TzOffset::HoursMinutes {
                negative: true,
                hours: 0,
                minutes: 30
            }
            .total_minutes(),
            -30
        );
    }

    #[test]
    fn test_zoned_time_round_trips() {
        round_trip_zoned_time(b"12:34Z");
        round_trip_zoned_time(b"12:34:56Z");
        round_trip_zoned_time(b"12:34:56+05");
        round_trip_zoned_time(b"12:34:56-11");
        round_trip_zoned_time(b"12:34:56+05:30");
        round_trip_zoned_time(b"12:34:56.789-03:45");
        round_trip_zoned_time(b"12:34:56.789012Z");
        round_trip_zoned_time(b"12:34:56.789012345+02");
        // A zero-hour western offset keeps its sign through the round trip.
        round_trip_zoned_time(b"12:34:56-00");
        round_trip_zoned_time(b"12:34-00:30");
    }

    #[test]
    fn test_zoned_time_invalid() {
        assert!(ZonedTime::parse(b"12:34:56").is_err());
        assert!(ZonedTime::parse(b"25:00:00Z").is_err());
        assert!(ZonedTime::parse(b"12:34:56.78Z").is_err());
        assert!(ZonedTime::parse(b"Z").is_err());
    }

    #[test]
    fn test_zoned_timestamp_round_trips() {
        round_trip_zoned_timestamp(b"20240229-12:34Z");
        round_trip_zoned_timestamp(b"20240229-12:34:56+05:30");
        round_trip_zoned_timestamp(b"20240229-12:34:56.789Z");
        round_trip_zoned_timestamp(b"20240229-12:34:56.789012345-06");
        round_trip_zoned_timestamp(b"20240229-00:00:00-00:30");
    }

    #[test]
    fn test_zoned_timestamp_epoch() {
        // 1970-01-01 01:00 at +01 is exactly the epoch.
        let ts = ZonedTimestamp::parse(b"19700101-01:00:00+01").unwrap();
        assert_eq!(ts.epoch_nanos(), 0);
        let ts = ZonedTimestamp::parse(b"19700101-00:00:00-00:30").unwrap();
        assert_eq!(ts.epoch_nanos(), 30 * 60 * 1_000_000_000);
    }

    #[test]
    fn test_validators() {
        assert!(is_valid_zoned_time(b"07:39Z"));
        assert!(!is_valid_zoned_time(b"07:39"));
        assert!(is_valid_zoned_timestamp(b"20240101-07:39:00.000000001Z"));
        assert!(!is_valid_zoned_timestamp(b"20240101 07:39Z"));
    }
}
