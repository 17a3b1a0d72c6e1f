//! STRUCTURED-DATA, RFC 5424 section 6.3:
//!
//! ```text
//! STRUCTURED-DATA = NILVALUE / 1*SD-ELEMENT
//! SD-ELEMENT      = "[" SD-ID *(SP SD-PARAM) "]"
//! SD-PARAM        = PARAM-NAME "=" %d34 PARAM-VALUE %d34
//! ```
//!
//! Parsed byte by byte with a small state machine, see `State`.

use std::borrow::Cow;
use std::io::BufRead;

use crate::scanner::{Scanner, NIL, SP};
use crate::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StructuredDataParam {
    pub name: String,
    /// Raw bytes between the quotes. A backslash is an ordinary byte, the
    /// first `"` always ends the value.
    pub value: String,
}

impl StructuredDataParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The value with `\"`, `\\` and `\]` resolved. Any other backslash is
    /// kept, as RFC 5424 section 6.3.3 asks.
    pub fn unescaped(&self) -> Cow<'_, str> {
        if !self.value.contains('\\') {
            return Cow::Borrowed(&self.value);
        }

        let mut out = String::with_capacity(self.value.len());
        let mut chars = self.value.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                if let Some(&next) = chars.peek() {
                    if matches!(next, '"' | '\\' | ']') {
                        out.push(next);
                        chars.next();
                        continue;
                    }
                }
            }

            out.push(ch);
        }

        Cow::Owned(out)
    }
}

/// One `[SD-ID param="value" ...]` element. Params keep the order they had
/// on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StructuredDataElement {
    pub id: String,
    pub params: Vec<StructuredDataParam>,
}

impl StructuredDataElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(StructuredDataParam::new(name, value));
        self
    }

    /// Value of the first param called `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|param| param.name == name)
            .map(|param| param.value.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum State {
    /// Between elements. `[` opens the next one, SP ends the field.
    Outside,
    Id,
    ParamName,
    /// Just saw `=`, the opening quote must follow.
    ValueStart { name: String },
    Value { name: String },
    /// Just saw the closing quote.
    ValueEnd,
}

#[derive(Debug, PartialEq, Eq)]
enum Event {
    Id(String),
    Element(StructuredDataElement),
    Param(StructuredDataParam),
    ElementEnd,
    /// SP after an element, the message body comes next.
    FieldEnd,
}

fn take_string(scratch: &mut Vec<u8>) -> Result<String, Error> {
    let token = String::from_utf8(scratch.to_vec())?;
    scratch.clear();
    Ok(token)
}

/// Feed one byte to the machine.
fn transition(
    state: State,
    byte: u8,
    scratch: &mut Vec<u8>,
) -> Result<(State, Option<Event>), Error> {
    let next = match (state, byte) {
        (State::Outside, b'[') => {
            scratch.clear();
            (State::Id, None)
        }
        (State::Outside, SP) => (State::Outside, Some(Event::FieldEnd)),
        (State::Outside, _) => {
            return Err(Error::InvalidStructuredData("expected '[' or ' ' after element"))
        }

        (State::Id, SP | b']') if scratch.is_empty() => {
            return Err(Error::InvalidStructuredData("empty SD-ID"))
        }
        (State::Id, SP) => (State::ParamName, Some(Event::Id(take_string(scratch)?))),
        // `[id]`, an element without params
        (State::Id, b']') => (
            State::Outside,
            Some(Event::Element(StructuredDataElement::new(take_string(scratch)?))),
        ),
        (State::Id, b'=' | b'"') => {
            return Err(Error::InvalidStructuredData("unexpected character in SD-ID"))
        }
        (State::Id, byte) => {
            scratch.push(byte);
            (State::Id, None)
        }

        (State::ParamName, SP) if scratch.is_empty() => (State::ParamName, None),
        (State::ParamName, b']') if scratch.is_empty() => (State::Outside, Some(Event::ElementEnd)),
        (State::ParamName, b'=') if scratch.is_empty() => {
            return Err(Error::InvalidStructuredData("empty PARAM-NAME"))
        }
        (State::ParamName, b'=') => (
            State::ValueStart {
                name: take_string(scratch)?,
            },
            None,
        ),
        (State::ParamName, SP | b']' | b'"') => {
            return Err(Error::InvalidStructuredData("PARAM-NAME without value"))
        }
        (State::ParamName, byte) => {
            scratch.push(byte);
            (State::ParamName, None)
        }

        (State::ValueStart { name }, b'"') => {
            scratch.clear();
            (State::Value { name }, None)
        }
        (State::ValueStart { .. }, _) => {
            return Err(Error::InvalidStructuredData("expected '\"' after '='"))
        }

        (State::Value { name }, b'"') => {
            let value = take_string(scratch)?;
            (
                State::ValueEnd,
                Some(Event::Param(StructuredDataParam { name, value })),
            )
        }
        (State::Value { name }, byte) => {
            scratch.push(byte);
            (State::Value { name }, None)
        }

        (State::ValueEnd, SP) => (State::ParamName, None),
        (State::ValueEnd, b']') => (State::Outside, Some(Event::ElementEnd)),
        (State::ValueEnd, _) => {
            return Err(Error::InvalidStructuredData("expected ' ' or ']' after PARAM-VALUE"))
        }
    };

    Ok(next)
}

/// Parse the STRUCTURED-DATA field and the SP that follows it. The scanner
/// is left at the first byte of MSG.
pub(crate) fn parse_structured_data<R: BufRead>(
    scanner: &mut Scanner<R>,
    scratch: &mut Vec<u8>,
) -> Result<Vec<StructuredDataElement>, Error> {
    scratch.clear();

    match scanner.require_byte()? {
        NIL => {
            return match scanner.next_byte()? {
                Some(SP) | None => Ok(Vec::new()),
                Some(_) => Err(Error::ExpectedChar(' ')),
            }
        }
        b'[' => {}
        _ => return Err(Error::ExpectedChar('[')),
    }

    let mut elements = Vec::with_capacity(4);
    let mut current: Option<StructuredDataElement> = None;
    let mut state = State::Id;

    loop {
        let byte = match scanner.next_byte()? {
            Some(byte) => byte,
            // STRUCTURED-DATA without MSG
            None if state == State::Outside => break,
            None => return Err(Error::PrematureEndOfStream),
        };

        let (next, event) = transition(state, byte, scratch)?;
        state = next;

        match event {
            None => {}
            Some(Event::Id(id)) => current = Some(StructuredDataElement::new(id)),
            Some(Event::Element(element)) => elements.push(element),
            Some(Event::Param(param)) => {
                if let Some(element) = current.as_mut() {
                    element.params.push(param);
                }
            }
            Some(Event::ElementEnd) => elements.extend(current.take()),
            Some(Event::FieldEnd) => break,
        }
    }

    Ok(elements)
}
