//! HEADER fields after PRI, RFC 5424 section 6.2. Every parser consumes one
//! token and the SP behind it.

use std::io::BufRead;

use chrono::{DateTime, FixedOffset};

use crate::scanner::{parse_decimal, Scanner, NIL};
use crate::timestamp::parse_timestamp;
use crate::Error;

// https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.2
pub(crate) fn version<R: BufRead>(
    scanner: &mut Scanner<R>,
    scratch: &mut Vec<u8>,
) -> Result<u32, Error> {
    scanner.read_token(scratch)?;

    parse_decimal(scratch)
        .and_then(|version| u32::try_from(version).ok())
        .filter(|version| *version > 0)
        .ok_or(Error::InvalidProtocolVersion)
}

// https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.3
pub(crate) fn timestamp<R: BufRead>(
    scanner: &mut Scanner<R>,
    scratch: &mut Vec<u8>,
) -> Result<Option<DateTime<FixedOffset>>, Error> {
    scanner.read_token(scratch)?;

    match scratch.as_slice() {
        [NIL] => Ok(None),
        token => parse_timestamp(token).map(Some),
    }
}

// https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.4
#[inline]
pub(crate) fn hostname<R: BufRead>(
    scanner: &mut Scanner<R>,
    scratch: &mut Vec<u8>,
) -> Result<Option<String>, Error> {
    scanner.read_field(scratch, "HOSTNAME")
}

// https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.5
#[inline]
pub(crate) fn appname<R: BufRead>(
    scanner: &mut Scanner<R>,
    scratch: &mut Vec<u8>,
) -> Result<Option<String>, Error> {
    scanner.read_field(scratch, "APP-NAME")
}

// https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.6
#[inline]
pub(crate) fn procid<R: BufRead>(
    scanner: &mut Scanner<R>,
    scratch: &mut Vec<u8>,
) -> Result<Option<String>, Error> {
    scanner.read_field(scratch, "PROCID")
}

// https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.7
#[inline]
pub(crate) fn msgid<R: BufRead>(
    scanner: &mut Scanner<R>,
    scratch: &mut Vec<u8>,
) -> Result<Option<String>, Error> {
    scanner.read_field(scratch, "MSGID")
}
