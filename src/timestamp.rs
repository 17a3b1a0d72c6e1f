use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

use crate::Error;

// get a character from the bytes as as a decimal
macro_rules! get_digit {
    ($bytes:ident, $index:expr, $reason:expr) => {
        match $bytes.get($index) {
            Some(c) if c.is_ascii_digit() => (c - b'0') as u32,
            _ => return Err(Error::InvalidTimestamp($reason)),
        }
    };
}

macro_rules! expect_sep {
    ($bytes:ident, $index:expr, $sep:expr) => {
        if $bytes.get($index).copied() != Some($sep) {
            return Err(Error::InvalidTimestamp("unexpected separator"));
        }
    };
}

/// Parse an RFC 3339 timestamp, the whole of `buf` must be consumed.
///
/// ```text
/// TIMESTAMP = FULL-DATE "T" FULL-TIME
/// FULL-TIME = PARTIAL-TIME TIME-OFFSET
/// ```
///
/// https://datatracker.ietf.org/doc/html/rfc3339#section-5.6
pub fn parse_timestamp(buf: &[u8]) -> Result<DateTime<FixedOffset>, Error> {
    let (year, month, day) = parse_date(buf)?;

    match buf.get(10) {
        Some(b'T') | Some(b't') => {}
        _ => return Err(Error::InvalidTimestamp("missing date-time separator")),
    }

    let (hour, minute, second, nanos, position) = parse_time(buf, 11)?;
    let (offset, position) = parse_offset(buf, position)?;

    if buf.len() > position {
        return Err(Error::InvalidTimestamp("extra characters"));
    }

    to_datetime(year, month, day, hour, minute, second, nanos, offset)
}

#[allow(clippy::too_many_arguments)]
#[inline]
fn to_datetime(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    nanos: u32,
    offset: i32,
) -> Result<DateTime<FixedOffset>, Error> {
    let offset = FixedOffset::east_opt(offset)
        .ok_or(Error::InvalidTimestamp("utc offset out of range"))?;

    // chrono keeps a leap second as second 59 with an extra second of nanos
    let (second, nanos) = if second == 60 {
        (59, nanos + 1_000_000_000)
    } else {
        (second, nanos)
    };

    let datetime = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(Error::InvalidTimestamp("date out of range"))?
        .and_hms_nano_opt(hour, minute, second, nanos)
        .ok_or(Error::InvalidTimestamp("time out of range"))?;

    offset
        .from_local_datetime(&datetime)
        .single()
        .ok_or(Error::InvalidTimestamp("time out of range"))
}

fn parse_date(buf: &[u8]) -> Result<(i32, u32, u32), Error> {
    let year = get_digit!(buf, 0, "invalid year") * 1000
        + get_digit!(buf, 1, "invalid year") * 100
        + get_digit!(buf, 2, "invalid year") * 10
        + get_digit!(buf, 3, "invalid year");
    expect_sep!(buf, 4, b'-');

    let month = get_digit!(buf, 5, "invalid month") * 10 + get_digit!(buf, 6, "invalid month");
    expect_sep!(buf, 7, b'-');

    let day = get_digit!(buf, 8, "invalid day") * 10 + get_digit!(buf, 9, "invalid day");

    let year = year as i32;

    // calculate the maximum number of days in the month, accounting for leap years in the
    // gregorian calendar
    let max_days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) {
                29
            } else {
                28
            }
        }
        _ => return Err(Error::InvalidTimestamp("month out of range")),
    };

    if day < 1 || day > max_days {
        return Err(Error::InvalidTimestamp("day out of range"));
    }

    Ok((year, month, day))
}

/// Parse `HH:MM:SS[.frac]`, returns the fields and the position after them
///     * Hour: 0 to 23
///     * Minute: 0 to 59
///     * Second: 0 to 60, 60 being a leap second
///     * NanoSecond: 0 to 999999999
fn parse_time(buf: &[u8], offset: usize) -> Result<(u32, u32, u32, u32, usize), Error> {
    let hour = get_digit!(buf, offset, "invalid hour") * 10
        + get_digit!(buf, offset + 1, "invalid hour");
    if hour > 23 {
        return Err(Error::InvalidTimestamp("hour out of range"));
    }
    expect_sep!(buf, offset + 2, b':');

    let minute = get_digit!(buf, offset + 3, "invalid minute") * 10
        + get_digit!(buf, offset + 4, "invalid minute");
    if minute > 59 {
        return Err(Error::InvalidTimestamp("minute out of range"));
    }
    expect_sep!(buf, offset + 5, b':');

    let second = get_digit!(buf, offset + 6, "invalid second") * 10
        + get_digit!(buf, offset + 7, "invalid second");
    if second > 60 {
        return Err(Error::InvalidTimestamp("second out of range"));
    }

    let mut position = offset + 8;
    let mut nanos = 0;
    if buf.get(position) == Some(&b'.') {
        position += 1;

        let mut count = 0;
        while let Some(ch) = buf.get(position + count).filter(|ch| ch.is_ascii_digit()) {
            if count == 9 {
                return Err(Error::InvalidTimestamp("second fraction too long"));
            }

            nanos = nanos * 10 + (ch - b'0') as u32;
            count += 1;
        }

        if count == 0 {
            return Err(Error::InvalidTimestamp("second fraction missing"));
        }

        nanos *= 10u32.pow(9 - count as u32);
        position += count;
    }

    Ok((hour, minute, second, nanos, position))
}

/// Parse `Z` or `(+|-)HH:MM`, returns the offset east of UTC in seconds
fn parse_offset(buf: &[u8], position: usize) -> Result<(i32, usize), Error> {
    let sign = match buf.get(position) {
        Some(b'Z') | Some(b'z') => return Ok((0, position + 1)),
        Some(b'+') => 1,
        Some(b'-') => -1,
        _ => return Err(Error::InvalidTimestamp("missing utc offset")),
    };

    let position = position + 1;
    let hours = get_digit!(buf, position, "invalid utc offset") * 10
        + get_digit!(buf, position + 1, "invalid utc offset");
    expect_sep!(buf, position + 2, b':');
    let minutes = get_digit!(buf, position + 3, "invalid utc offset") * 10
        + get_digit!(buf, position + 4, "invalid utc offset");

    if hours > 23 || minutes > 59 {
        return Err(Error::InvalidTimestamp("utc offset out of range"));
    }

    Ok((sign * (hours * 3600 + minutes * 60) as i32, position + 5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Utc};

    #[test]
    fn timestamp() {
        let ts = parse_timestamp(b"2015-02-18T23:16:09Z").unwrap();
        assert_eq!(
            FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2015, 2, 18, 23, 16, 9)
                .unwrap(),
            ts
        );

        let edt = FixedOffset::east_opt(5 * 60 * 60).unwrap();
        let ts = parse_timestamp(b"2015-02-18T23:59:59.234567+05:00").unwrap();
        assert_eq!(
            edt.from_local_datetime(
                &NaiveDate::from_ymd_opt(2015, 2, 18)
                    .unwrap()
                    .and_hms_micro_opt(23, 59, 59, 234_567)
                    .unwrap()
            )
            .unwrap(),
            ts
        )
    }

    #[test]
    fn compare() {
        // https://datatracker.ietf.org/doc/html/rfc3339#section-5.8
        for input in [
            "1985-04-12T23:20:50.52Z",
            "1985-04-12T23:20:50.123456789Z",
            "1996-12-19T16:39:57-08:00",
            "1990-12-31T23:59:59Z",
            "1990-12-31T15:59:59-08:00",
            "1937-01-01T12:00:27.87+00:20",
            "2003-08-24T05:14:15.000003-07:00",
            "2019-01-20T00:46:39+05:45",
        ] {
            let got = parse_timestamp(input.as_bytes()).unwrap();
            let want = DateTime::parse_from_rfc3339(input).unwrap();
            assert_eq!(got, want, "input: {input}, want: {}", want.to_rfc3339());
            assert_eq!(got.offset(), want.offset());
        }
    }

    #[test]
    fn leap_second() {
        let ts = parse_timestamp(b"1990-12-31T23:59:60Z").unwrap();
        assert_eq!(ts.second(), 59);
        assert_eq!(ts.nanosecond(), 1_000_000_000);
        assert_eq!(ts.with_timezone(&Utc).timestamp(), 662_687_999);
    }

    #[test]
    fn invalid() {
        for input in [
            "",
            "-",
            "2003-10-11",
            "2003-10-11T22:14:15",
            "2003-10-11 22:14:15Z",
            "2003-13-11T22:14:15Z",
            "2003-02-29T22:14:15Z",
            "2003-10-11T24:14:15Z",
            "2003-10-11T22:14:15.Z",
            "2003-10-11T22:14:15.0000000001Z",
            "2003-10-11T22:14:15+0700",
            "2003-10-11T22:14:15Zjunk",
            "2003-1x-11T22:14:15Z",
            "Oct 11 22:14:15",
        ] {
            let err = parse_timestamp(input.as_bytes()).unwrap_err();
            assert!(
                matches!(err, Error::InvalidTimestamp(_)),
                "input: {input}, got: {err}"
            );
        }
    }
}
