//! Streaming decoder for [RFC 5424](https://tools.ietf.org/html/rfc5424) Syslog messages. Not to
//! be confused with the older [RFC 3164](https://tools.ietf.org/html/rfc3164) BSD Syslog
//! protocol, which is not supported.
//!
//! Messages are read from any [`std::io::BufRead`], either octet-counted as on RFC 5425/6587
//! stream transports (`MSG-LEN SP SYSLOG-MSG`) or unframed, one message per buffer, as on UDP.
//! The Structured Data fields are supported, and the message body is kept as raw bytes.
//!
//! # Example
//!
//! Reading octet-counted messages off a TCP connection
//!
//! ```no_run
//! use std::io::BufReader;
//! use std::net::TcpListener;
//!
//! use syslog_stream::Parser;
//!
//! let listener = TcpListener::bind("127.0.0.1:10601").unwrap();
//! for stream in listener.incoming() {
//!     let mut parser = Parser::default();
//!     for message in parser.messages(BufReader::new(stream.unwrap())) {
//!         match message {
//!             Ok(msg) => println!("{} {} {:?} {}", msg.facility(), msg.severity(), msg.hostname, msg.text()),
//!             Err(err) => eprintln!("rejected: {err}"),
//!         }
//!     }
//! }
//! ```

mod config;
mod encode;
mod error;
mod facility;
pub mod framing;
mod header;
mod message;
mod priority;
pub mod rfc5424;
mod scanner;
mod severity;
mod structured_data;
mod timestamp;

pub use config::{ParserOptions, DEFAULT_MAX_FRAME_LENGTH};
pub use error::{Error, ErrorKind, ParseError};
pub use facility::Facility;
pub use message::{Format, LogMessage, PartialMessage};
pub use priority::Priority;
pub use rfc5424::{parse_message, Messages, Parser};
pub use severity::Severity;
pub use structured_data::{StructuredDataElement, StructuredDataParam};
pub use timestamp::parse_timestamp;
