//! Serialization of a [`LogMessage`] back to the wire format.
//!
//! Header fields are written as they are, nothing is validated. A field
//! holding a space or an empty string produces a message that does not
//! parse back.

use std::io::{self, Write};

use chrono::SecondsFormat;

use crate::scanner::NIL;
use crate::LogMessage;

fn write_field<W: Write>(w: &mut W, field: Option<&str>) -> io::Result<()> {
    match field {
        Some(value) => w.write_all(value.as_bytes())?,
        None => w.write_all(&[NIL])?,
    }

    w.write_all(b" ")
}

impl LogMessage {
    /// Write `SYSLOG-MSG` without framing.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "<{}>{} ", self.priority.value(), self.version)?;

        match &self.timestamp {
            Some(ts) => {
                w.write_all(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true).as_bytes())?;
                w.write_all(b" ")?;
            }
            None => w.write_all(b"- ")?,
        }

        write_field(w, self.hostname.as_deref())?;
        write_field(w, self.appname.as_deref())?;
        write_field(w, self.procid.as_deref())?;
        write_field(w, self.msgid.as_deref())?;

        if self.structured_data.is_empty() {
            w.write_all(&[NIL])?;
        }
        for element in &self.structured_data {
            write!(w, "[{}", element.id)?;
            for param in &element.params {
                write!(w, " {}=\"{}\"", param.name, param.value)?;
            }
            w.write_all(b"]")?;
        }

        if !self.msg.is_empty() {
            w.write_all(b" ")?;
            w.write_all(&self.msg)?;
        }

        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64 + self.msg.len());
        self.write_to(&mut buf).expect("writing to a Vec cannot fail");
        buf
    }

    /// `MSG-LEN SP SYSLOG-MSG`, for octet-counting transports.
    pub fn to_framed_bytes(&self) -> Vec<u8> {
        let msg = self.to_bytes();
        let mut buf = format!("{} ", msg.len()).into_bytes();
        buf.extend_from_slice(&msg);
        buf
    }
}
