//! In-memory representation of a single Syslog message.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset};

use crate::scanner::BOM;
use crate::{Facility, Priority, Severity, StructuredDataElement};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[non_exhaustive]
pub enum Format {
    RFC5424,
}

/// A RFC5424-protocol syslog message
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LogMessage {
    pub format: Format,
    pub priority: Priority,
    pub version: u32,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub hostname: Option<String>,
    pub appname: Option<String>,
    pub procid: Option<String>,
    pub msgid: Option<String>,
    pub structured_data: Vec<StructuredDataElement>,
    /// MSG starts with a UTF-8 BOM, which is still part of `msg`.
    pub has_bom: bool,
    pub msg: Vec<u8>,
    pub msg_len: usize,
}

impl LogMessage {
    #[inline]
    pub fn facility(&self) -> Facility {
        self.priority.facility()
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.priority.severity()
    }

    /// MSG as text, without the BOM. Invalid UTF-8 is replaced.
    pub fn text(&self) -> Cow<'_, str> {
        let body = match self.msg.strip_prefix(&BOM[..]) {
            Some(rest) if self.has_bom => rest,
            _ => &self.msg[..],
        };

        String::from_utf8_lossy(body)
    }
}

/// Fields decoded so far. The outer `Option` of a nil-able field tells
/// whether the field was reached, the inner one is the nil value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PartialMessage {
    pub priority: Option<Priority>,
    pub version: Option<u32>,
    pub timestamp: Option<Option<DateTime<FixedOffset>>>,
    pub hostname: Option<Option<String>>,
    pub appname: Option<Option<String>>,
    pub procid: Option<Option<String>>,
    pub msgid: Option<Option<String>>,
    pub structured_data: Option<Vec<StructuredDataElement>>,
}

impl PartialMessage {
    #[inline]
    pub fn facility(&self) -> Option<Facility> {
        self.priority.map(Priority::facility)
    }

    #[inline]
    pub fn severity(&self) -> Option<Severity> {
        self.priority.map(Priority::severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(has_bom: bool, msg: &[u8]) -> LogMessage {
        LogMessage {
            format: Format::RFC5424,
            priority: Priority::new(0).unwrap(),
            version: 1,
            timestamp: None,
            hostname: None,
            appname: None,
            procid: None,
            msgid: None,
            structured_data: Vec::new(),
            has_bom,
            msg: msg.to_vec(),
            msg_len: msg.len(),
        }
    }

    #[test]
    fn partial_priority() {
        let partial = PartialMessage {
            priority: Some(Priority::new(13).unwrap()),
            version: Some(1),
            ..Default::default()
        };
        assert_eq!(partial.facility(), Some(Facility::USER));
        assert_eq!(partial.severity(), Some(Severity::NOTICE));

        let partial = PartialMessage::default();
        assert_eq!(partial.facility(), None);
        assert_eq!(partial.severity(), None);
    }

    #[test]
    fn text_skips_bom() {
        assert_eq!(message(true, b"\xEF\xBB\xBFhello").text(), "hello");
        assert_eq!(message(false, b"hi").text(), "hi");
        assert_eq!(message(false, b"\xFFhi").text(), "\u{FFFD}hi");
    }
}
