//! Byte-level primitives shared by every field parser.

use std::io::{self, BufRead};

use crate::Error;

pub(crate) const SP: u8 = b' ';
pub(crate) const NIL: u8 = b'-';
pub(crate) const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Read a single byte, `None` at end of stream.
pub(crate) fn read_byte<R: BufRead>(reader: &mut R) -> Result<Option<u8>, Error> {
    loop {
        let byte = match reader.fill_buf() {
            Ok(buf) => buf.first().copied(),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(Error::from_read(err)),
        };

        if byte.is_some() {
            reader.consume(1);
        }

        return Ok(byte);
    }
}

/// Decode a run of ASCII digits. Empty input, any non-digit and overflow
/// all yield `None`.
pub(crate) fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }

    digits.iter().try_fold(0usize, |acc, ch| {
        if !ch.is_ascii_digit() {
            return None;
        }

        acc.checked_mul(10)?.checked_add((ch - b'0') as usize)
    })
}

/// Sequential reader over one frame. Bytes that were looked at but not
/// consumed sit in `pushback` (top of the stack is the next byte).
pub(crate) struct Scanner<R> {
    inner: R,
    pushback: Vec<u8>,
}

impl<R: BufRead> Scanner<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            pushback: Vec::with_capacity(BOM.len()),
        }
    }

    #[inline]
    pub(crate) fn next_byte(&mut self) -> Result<Option<u8>, Error> {
        match self.pushback.pop() {
            Some(byte) => Ok(Some(byte)),
            None => read_byte(&mut self.inner),
        }
    }

    /// Like `next_byte`, but the end of the frame is an error.
    #[inline]
    pub(crate) fn require_byte(&mut self) -> Result<u8, Error> {
        self.next_byte()?.ok_or(Error::PrematureEndOfStream)
    }

    /// Whether the upcoming bytes equal `prefix`. Nothing is consumed, and
    /// running out of input simply answers `false`.
    pub(crate) fn peek_matches(&mut self, prefix: &[u8]) -> Result<bool, Error> {
        let mut seen = Vec::with_capacity(prefix.len());
        while seen.len() < prefix.len() {
            match self.next_byte()? {
                Some(byte) => seen.push(byte),
                None => break,
            }
        }

        let matched = seen == prefix;
        self.pushback.extend(seen.into_iter().rev());

        Ok(matched)
    }

    /// Fill `scratch` with every byte up to the next space. The space is
    /// consumed but not stored.
    pub(crate) fn read_token(&mut self, scratch: &mut Vec<u8>) -> Result<(), Error> {
        scratch.clear();

        loop {
            match self.require_byte()? {
                SP => return Ok(()),
                byte => scratch.push(byte),
            }
        }
    }

    /// Read one nil-able header field. A solitary `-` is the nil value.
    pub(crate) fn read_field(
        &mut self,
        scratch: &mut Vec<u8>,
        name: &'static str,
    ) -> Result<Option<String>, Error> {
        self.read_token(scratch)?;

        match scratch.as_slice() {
            [] => Err(Error::EmptyField(name)),
            [NIL] => Ok(None),
            token => Ok(Some(String::from_utf8(token.to_vec())?)),
        }
    }

    /// Append everything left in the frame to `out`, returns the number of
    /// bytes appended.
    pub(crate) fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize, Error> {
        let start = out.len();
        while let Some(byte) = self.pushback.pop() {
            out.push(byte);
        }

        self.inner.read_to_end(out).map_err(Error::from_read)?;

        Ok(out.len() - start)
    }
}
