use std::fmt;
use std::io::BufRead;

use crate::scanner::{parse_decimal, Scanner};
use crate::{Error, Facility, Severity};

/// PRIVAL is 1 to 3 digits, RFC 5424 section 6.2.1
const MAX_DIGITS: usize = 3;

/// The `PRI` of a message: `facility * 8 + severity`, always within 0..=191.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Priority {
    facility: Facility,
    severity: Severity,
}

impl Priority {
    pub const MAX: u8 = 191;

    pub fn new(value: u8) -> Result<Self, Error> {
        let facility = Facility::from_code(value >> 3).ok_or(Error::InvalidPriority)?;
        let severity = Severity::from_code(value & 0x7).ok_or(Error::InvalidPriority)?;

        Ok(Self { facility, severity })
    }

    pub fn from_parts(facility: Facility, severity: Severity) -> Self {
        Self { facility, severity }
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.facility.code() * 8 + self.severity.code()
    }

    #[inline]
    pub fn facility(self) -> Facility {
        self.facility
    }

    #[inline]
    pub fn severity(self) -> Severity {
        self.severity
    }
}

impl TryFrom<u8> for Priority {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Priority {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

// https://datatracker.ietf.org/doc/html/rfc5424#section-6.2.1
pub(crate) fn parse_priority<R: BufRead>(scanner: &mut Scanner<R>) -> Result<Priority, Error> {
    if scanner.require_byte()? != b'<' {
        return Err(Error::ExpectedChar('<'));
    }

    let mut digits = [0u8; MAX_DIGITS];
    let mut len = 0;
    loop {
        let ch = scanner.require_byte()?;
        if ch == b'>' {
            break;
        }

        if len == MAX_DIGITS {
            return Err(Error::InvalidPriority);
        }
        digits[len] = ch;
        len += 1;
    }

    let value = parse_decimal(&digits[..len])
        .and_then(|value| u8::try_from(value).ok())
        .ok_or(Error::InvalidPriority)?;

    Priority::new(value)
}
