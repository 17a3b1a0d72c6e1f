//! Octet-counting framing, RFC 6587 section 3.4.1 / RFC 5425 section 4.3:
//!
//! ```text
//! SYSLOG-FRAME = MSG-LEN SP SYSLOG-MSG
//! ```

use std::io::BufRead;

use crate::scanner::{parse_decimal, read_byte, SP};
use crate::Error;

// usize::MAX has 20 digits on 64 bit targets
const MAX_DIGITS: usize = 20;

/// Read the `MSG-LEN SP` prefix of a frame and return `MSG-LEN`.
pub fn read_octet_count<R: BufRead>(reader: &mut R) -> Result<usize, Error> {
    let mut digits = [0u8; MAX_DIGITS];
    let mut len = 0;

    loop {
        let ch = read_byte(reader)?.ok_or(Error::Framing("stream ended before the octet count"))?;
        if ch == SP {
            break;
        }

        if !ch.is_ascii_digit() {
            return Err(Error::Framing("non-digit in octet count"));
        }

        if len == MAX_DIGITS {
            return Err(Error::Framing("octet count overflow"));
        }

        digits[len] = ch;
        len += 1;
    }

    if len == 0 {
        return Err(Error::Framing("missing octet count"));
    }

    match parse_decimal(&digits[..len]) {
        Some(0) => Err(Error::Framing("zero octet count")),
        Some(count) => Ok(count),
        None => Err(Error::Framing("octet count overflow")),
    }
}
