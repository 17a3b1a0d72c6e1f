//! Decoding of whole messages.
//!
//! ```text
//! SYSLOG-MSG = HEADER SP STRUCTURED-DATA [SP MSG]
//! HEADER     = PRI VERSION SP TIMESTAMP SP HOSTNAME SP APP-NAME SP PROCID SP MSGID
//! ```
//!
//! Fields are decoded strictly in wire order, each sub-parser consuming one
//! field. Decoding stops at the first malformed field.

use std::io::{self, BufRead, Read, Take};

use tracing::{debug, trace, warn};

use crate::framing::read_octet_count;
use crate::header;
use crate::message::{Format, LogMessage, PartialMessage};
use crate::priority::parse_priority;
use crate::scanner::{Scanner, BOM};
use crate::structured_data::parse_structured_data;
use crate::{Error, ParseError, ParserOptions};

// Evaluate a field parser, bailing out with everything decoded so far.
macro_rules! take_field {
    ($e:expr, $partial:ident) => {
        match $e {
            Ok(value) => value,
            Err(err) => return Err(reject(err, $partial)),
        }
    };
}

fn reject(error: Error, partial: PartialMessage) -> ParseError {
    debug!(
        error = %error,
        priority = ?partial.priority.map(|pri| pri.value()),
        version = ?partial.version,
        "rejecting syslog message"
    );

    ParseError::new(error, partial)
}

/// A reusable RFC 5424 decoder.
///
/// The parser owns a scratch buffer that every field parser borrows while
/// it accumulates a token, so one parser decoding many messages allocates
/// little beyond the decoded strings. It holds no other state between
/// messages. Use one parser per thread.
#[derive(Debug, Default)]
pub struct Parser {
    options: ParserOptions,
    scratch: Vec<u8>,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            scratch: Vec::with_capacity(256),
        }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse one octet-counted message, `MSG-LEN SP SYSLOG-MSG`. On success
    /// the reader is left at the start of the next frame.
    pub fn parse_framed<R: BufRead>(&mut self, reader: &mut R) -> Result<LogMessage, ParseError> {
        let length = self.read_frame_length(reader)?;
        let mut frame = Read::take(reader, length as u64);
        self.parse_frame(&mut frame)
    }

    /// Parse a message that fills the whole of `reader`, like a UDP
    /// datagram. Input longer than `max_frame_length` is rejected.
    pub fn parse_unframed<R: BufRead>(
        &mut self,
        reader: &mut R,
    ) -> Result<LogMessage, ParseError> {
        let limit = self.options.max_frame_length;
        let mut frame = Read::take(reader, (limit as u64).saturating_add(1));

        let message = self.decode(&mut Scanner::new(&mut frame))?;
        if frame.limit() == 0 {
            return Err(Error::FrameTooLarge {
                length: limit.saturating_add(1),
                limit,
            }
            .into());
        }

        Ok(message)
    }

    /// Iterate over consecutive octet-counted messages.
    pub fn messages<R: BufRead>(&mut self, reader: R) -> Messages<'_, R> {
        Messages {
            parser: self,
            reader,
            done: false,
        }
    }

    fn read_frame_length<R: BufRead>(&self, reader: &mut R) -> Result<usize, Error> {
        let length = read_octet_count(reader)?;
        if length > self.options.max_frame_length {
            return Err(Error::FrameTooLarge {
                length,
                limit: self.options.max_frame_length,
            });
        }

        trace!(length, "read frame header");

        Ok(length)
    }

    fn parse_frame<R: BufRead>(&mut self, frame: &mut Take<R>) -> Result<LogMessage, ParseError> {
        let message = self.decode(&mut Scanner::new(&mut *frame))?;

        if frame.limit() > 0 {
            warn!(
                missing = frame.limit(),
                msg_len = message.msg_len,
                "stream ended inside a frame, message body is short"
            );
        }

        Ok(message)
    }

    fn decode<R: BufRead>(&mut self, scanner: &mut Scanner<R>) -> Result<LogMessage, ParseError> {
        let scratch = &mut self.scratch;
        let mut partial = PartialMessage::default();

        let priority = take_field!(parse_priority(scanner), partial);
        partial.priority = Some(priority);

        let version = take_field!(header::version(scanner, scratch), partial);
        partial.version = Some(version);

        let timestamp = take_field!(header::timestamp(scanner, scratch), partial);
        partial.timestamp = Some(timestamp);

        let hostname = take_field!(header::hostname(scanner, scratch), partial);
        partial.hostname = Some(hostname.clone());

        let appname = take_field!(header::appname(scanner, scratch), partial);
        partial.appname = Some(appname.clone());

        let procid = take_field!(header::procid(scanner, scratch), partial);
        partial.procid = Some(procid.clone());

        let msgid = take_field!(header::msgid(scanner, scratch), partial);
        partial.msgid = Some(msgid.clone());

        let structured_data = take_field!(parse_structured_data(scanner, scratch), partial);

        // Only I/O failures are possible from here on
        let body = scanner.peek_matches(&BOM).and_then(|has_bom| {
            let mut msg = Vec::new();
            scanner.read_to_end(&mut msg)?;
            Ok((has_bom, msg))
        });
        let (has_bom, msg) = match body {
            Ok(body) => body,
            Err(err) => {
                partial.structured_data = Some(structured_data);
                return Err(reject(err, partial));
            }
        };

        trace!(
            priority = priority.value(),
            elements = structured_data.len(),
            has_bom,
            msg_len = msg.len(),
            "decoded syslog message"
        );

        Ok(LogMessage {
            format: Format::RFC5424,
            priority,
            version,
            timestamp,
            hostname,
            appname,
            procid,
            msgid,
            structured_data,
            has_bom,
            msg_len: msg.len(),
            msg,
        })
    }
}

/// Iterator over the octet-counted messages of a stream, see
/// [`Parser::messages`].
///
/// A rejected message is yielded as an error and the rest of its frame is
/// skipped, so the next item starts at the following frame. An unreadable
/// octet count loses the frame boundary; it is yielded once and ends the
/// iteration. A clean end of stream between frames ends the iteration too.
pub struct Messages<'p, R> {
    parser: &'p mut Parser,
    reader: R,
    done: bool,
}

impl<R> Messages<'_, R> {
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> Messages<'_, R> {
    fn at_end(&mut self) -> io::Result<bool> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.is_empty()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn skip(&mut self, length: u64) -> io::Result<u64> {
        io::copy(&mut Read::take(&mut self.reader, length), &mut io::sink())
    }
}

impl<R: BufRead> Iterator for Messages<'_, R> {
    type Item = Result<LogMessage, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.at_end() {
            Ok(true) => {
                self.done = true;
                return None;
            }
            Ok(false) => {}
            Err(err) => {
                self.done = true;
                return Some(Err(Error::Io(err).into()));
            }
        }

        let length = match self.parser.read_frame_length(&mut self.reader) {
            Ok(length) => length,
            Err(err) => {
                match err {
                    Error::FrameTooLarge { length, .. } => {
                        if let Err(skip_err) = self.skip(length as u64) {
                            warn!(error = %skip_err, "could not skip oversized frame");
                            self.done = true;
                        }
                    }
                    _ => {
                        warn!(error = %err, "lost frame boundary");
                        self.done = true;
                    }
                }

                return Some(Err(err.into()));
            }
        };

        let mut frame = Read::take(&mut self.reader, length as u64);
        let result = self.parser.parse_frame(&mut frame);

        if result.is_err() {
            match io::copy(&mut frame, &mut io::sink()) {
                Ok(skipped) => debug!(skipped, "skipped rest of rejected frame"),
                Err(err) => {
                    warn!(error = %err, "could not skip rejected frame");
                    self.done = true;
                }
            }
        }

        Some(result)
    }
}

/// Parse one unframed message held in memory.
///
/// # Example
///
/// ```
/// use syslog_stream::rfc5424::parse_message;
///
/// let message = parse_message(b"<78>1 2016-01-15T00:04:01+00:00 host1 CROND 10391 - [meta sequenceId=\"29\"] some_message").unwrap();
///
/// assert_eq!(message.hostname.as_deref(), Some("host1"));
/// assert_eq!(message.structured_data[0].param("sequenceId"), Some("29"));
/// ```
pub fn parse_message(buf: &[u8]) -> Result<LogMessage, ParseError> {
    let mut reader = buf;
    Parser::new(ParserOptions::default().with_max_frame_length(buf.len()))
        .parse_unframed(&mut reader)
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::{ErrorKind, Facility, Severity, StructuredDataElement};

    #[test]
    fn rfc5424_examples() {
        // https://datatracker.ietf.org/doc/html/rfc5424#section-6.5
        for input in [
            &b"<34>1 2003-10-11T22:14:15.003Z mymachine.example.com su - ID47 - \xEF\xBB\xBF'su root' failed for lonvick on /dev/pts/8"[..],
            b"<165>1 2003-08-24T05:14:15.000003-07:00 192.0.2.1 myproc 8710 - - %% It's time to make the do-nuts.",
            br#"<165>1 2003-10-11T22:14:15.003Z mymachine.example.com evntslog - ID47 [exampleSDID@32473 iut="3" eventSource="Application" eventID="1011"] BOMAn application event log entry..."#,
            br#"<165>1 2003-10-11T22:14:15.003Z mymachine.example.com evntslog - ID47 [exampleSDID@32473 iut="3" eventSource="Application" eventID="1011"][examplePriority@32473 class="high"]"#,
        ] {
            let _msg = parse_message(input).unwrap();
        }
    }

    #[test]
    fn test_simple() {
        let msg = parse_message(b"<1>1 - - - - - -").expect("Should parse empty message");
        assert_eq!(msg.facility(), Facility::KERN);
        assert_eq!(msg.severity(), Severity::ALERT);
        assert!(msg.timestamp.is_none());
        assert!(msg.hostname.is_none());
        assert!(msg.appname.is_none());
        assert!(msg.procid.is_none());
        assert!(msg.msgid.is_none());
        assert!(msg.structured_data.is_empty());
        assert!(msg.msg.is_empty());
        assert_eq!(msg.msg_len, 0);
        assert!(!msg.has_bom);
    }

    #[test]
    fn framed_scenario() {
        let body = b"<34>1 2003-10-11T22:14:15.003Z mymachine su - ID47 - BOM'su root' failed";
        let mut input = format!("{} ", body.len()).into_bytes();
        input.extend_from_slice(body);

        let mut reader = &input[..];
        let msg = Parser::default().parse_framed(&mut reader).unwrap();
        assert!(reader.is_empty());

        assert_eq!(msg.priority.value(), 34);
        assert_eq!(msg.facility(), Facility::AUTH);
        assert_eq!(msg.severity(), Severity::CRIT);
        assert_eq!(msg.version, 1);
        assert_eq!(
            msg.timestamp,
            Some(DateTime::parse_from_rfc3339("2003-10-11T22:14:15.003Z").unwrap())
        );
        assert_eq!(msg.hostname.as_deref(), Some("mymachine"));
        assert_eq!(msg.appname.as_deref(), Some("su"));
        assert_eq!(msg.procid, None);
        assert_eq!(msg.msgid.as_deref(), Some("ID47"));
        assert!(msg.structured_data.is_empty());
        assert_eq!(msg.msg, b"BOM'su root' failed");
        assert_eq!(msg.msg_len, 19);
    }

    #[test]
    fn frame_bounds_the_message() {
        let mut reader = &b"20 <13>1 - - - - - - hi21 <13>1 - - - - - - bye"[..];
        let mut parser = Parser::default();

        let msg = parser.parse_framed(&mut reader).unwrap();
        assert_eq!(msg.msg, b"hi");

        let msg = parser.parse_framed(&mut reader).unwrap();
        assert_eq!(msg.msg, b"bye");
        assert!(reader.is_empty());
    }

    #[test]
    fn truncated() {
        let err = parse_message(b"<34>1 ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PrematureEndOfStream);
        assert_eq!(err.partial.priority.map(|pri| pri.value()), Some(34));
        assert_eq!(err.partial.version, Some(1));
        assert_eq!(err.partial.timestamp, None);

        let err = parse_message(b"<39>1 2018-05-15T20:56:58+00:00 -web1west -").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PrematureEndOfStream);
        assert_eq!(err.partial.hostname, Some(Some("-web1west".to_string())));

        // the frame announces more than the stream holds
        let mut reader = &b"100 <34>1 2003-10-11T22:14:15.003Z"[..];
        let err = Parser::default().parse_framed(&mut reader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PrematureEndOfStream);
    }

    #[test]
    fn bad_priority_has_no_facility() {
        let err = parse_message(b"<3x>1 - - - - - -").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPriority);
        assert_eq!(err.partial.priority, None);
        assert_eq!(err.partial.facility(), None);
        assert_eq!(err.partial.severity(), None);

        let err = parse_message(b"<4096>1 - - - - - -").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPriority);
    }

    #[test]
    fn bad_timestamp_keeps_priority_and_version() {
        let err = parse_message(b"<13>1 yesterday host - - - -").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTimestamp);
        assert_eq!(err.partial.facility(), Some(Facility::USER));
        assert_eq!(err.partial.version, Some(1));
        assert_eq!(err.partial.hostname, None);
    }

    #[test]
    fn bad_match() {
        // we shouldn't be able to parse RFC3164 messages
        let err = parse_message(b"<134>Feb 18 20:53:31 haproxy[376]: I am a message").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidProtocolVersion);
    }

    #[test]
    fn bom() {
        let msg = parse_message(b"<13>1 - - - - - - \xEF\xBB\xBFhello").unwrap();
        assert!(msg.has_bom);
        assert_eq!(msg.msg, b"\xEF\xBB\xBFhello");
        assert_eq!(msg.msg_len, 8);
        assert_eq!(msg.text(), "hello");

        // too short to hold a BOM is not an error
        let msg = parse_message(b"<13>1 - - - - - - \xEF\xBB").unwrap();
        assert!(!msg.has_bom);
        assert_eq!(msg.msg, b"\xEF\xBB");
    }

    #[test]
    fn structured_data_only() {
        let msg = parse_message(br#"<29>1 2018-05-14T08:23:01.520Z leyal_test4 mgd 13894 UI_CHILD_EXITED [junos@2636.1.1.1.2.57 pid="14374" return-value="5" core-dump-status="" command="/usr/sbin/mustd"]"#).expect("must parse");
        assert_eq!(msg.facility(), Facility::DAEMON);
        assert_eq!(msg.severity(), Severity::NOTICE);
        assert!(msg.msg.is_empty());

        let want = StructuredDataElement::new("junos@2636.1.1.1.2.57")
            .with_param("pid", "14374")
            .with_param("return-value", "5")
            .with_param("core-dump-status", "")
            .with_param("command", "/usr/sbin/mustd");
        assert_eq!(msg.structured_data, vec![want]);
    }

    #[test]
    fn unframed_limit() {
        let mut reader = &b"<13>1 - - - - - - 0123456789"[..];
        let mut parser = Parser::new(ParserOptions::default().with_max_frame_length(20));
        let err = parser.parse_unframed(&mut reader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);

        let mut reader = &b"<13>1 - - - - - - 0123456789"[..];
        let mut parser = Parser::new(ParserOptions::default().with_max_frame_length(28));
        let msg = parser.parse_unframed(&mut reader).unwrap();
        assert_eq!(msg.msg, b"0123456789");
    }

    #[test]
    fn framed_limit() {
        let mut reader = &b"29 <13>1 - - - - - - 0123456789"[..];
        let mut parser = Parser::new(ParserOptions::default().with_max_frame_length(28));
        let err = parser.parse_framed(&mut reader).unwrap_err();
        assert!(matches!(
            err.error,
            Error::FrameTooLarge {
                length: 29,
                limit: 28
            }
        ));
    }

    #[test]
    fn messages_resynchronize() {
        let input = b"20 <13>1 - - - - - - hi20 <3x>1 - - - - - - hi21 <13>1 - - - - - - bye";
        let mut parser = Parser::default();
        let results: Vec<_> = parser.messages(&input[..]).collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().msg, b"hi");
        assert_eq!(
            results[1].as_ref().unwrap_err().kind(),
            ErrorKind::InvalidPriority
        );
        assert_eq!(results[2].as_ref().unwrap().msg, b"bye");
    }

    #[test]
    fn messages_skip_oversized_frames() {
        let input = b"26 <13>1 - - - - - - too long20 <13>1 - - - - - - ok";
        let mut parser = Parser::new(ParserOptions::default().with_max_frame_length(20));
        let results: Vec<_> = parser.messages(&input[..]).collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap_err().kind(), ErrorKind::Framing);
        assert_eq!(results[1].as_ref().unwrap().msg, b"ok");
    }

    #[test]
    fn messages_stop_at_lost_boundary() {
        let input = b"20 <13>1 - - - - - - hi<13>1 - - - - - - lost";
        let mut parser = Parser::default();
        let mut messages = parser.messages(&input[..]);

        assert!(messages.next().unwrap().is_ok());
        assert_eq!(
            messages.next().unwrap().unwrap_err().kind(),
            ErrorKind::Framing
        );
        assert!(messages.next().is_none());
    }
}
