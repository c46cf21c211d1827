//! csv-scout: streaming delimited-text tokenizer, writer and dialect sniffer
//!
//! Three pieces that work on raw bytes:
//!
//! - a pull-based [`Tokenizer`] that splits a stream into fields under a
//!   configurable separator, quote, escape and comment prefix, handling
//!   quoted fields spanning lines and recovering silently from an input
//!   that ends inside a quoted field;
//! - a [`Writer`] that emits fields, rows and comments back with the
//!   quoting needed to read them again unchanged;
//! - a [`Sniffer`] that guesses those parameters from a sample and checks
//!   the guess by tokenizing the sample.
//!
//! # Quick Start
//!
//! ```
//! use csv_scout::Sniffer;
//!
//! let data = b"# exported\nid|name\n1|\"Smith | J.\"\n2|Doe\n";
//! let metadata = Sniffer::new().sniff_bytes(data).unwrap();
//! assert_eq!(metadata.dialect.separator, Some(b'|'));
//! assert_eq!(metadata.dialect.comment, b"#");
//!
//! let mut tok = metadata.tokenizer(&data[metadata.preamble_len..]).unwrap();
//! let mut rows: Vec<Vec<String>> = Vec::new();
//! while tok.advance() {
//!     let field = tok.field();
//!     if field.is_comment() || field.is_empty_line() {
//!         continue;
//!     }
//!     if field.at_row_start() {
//!         rows.push(Vec::new());
//!     }
//!     if let Some(row) = rows.last_mut() {
//!         row.push(String::from_utf8_lossy(field.bytes()).into_owned());
//!     }
//! }
//! assert!(tok.error().is_none());
//! assert_eq!(rows[1], ["1", "Smith | J."]);
//! ```
//!
//! # Dialect inference
//!
//! A single scan of the sample scores every separator and quote candidate,
//! rewarding quotes found next to separators and counting separators.
//! Combinations are ranked by their summed scores, the comment prefix and
//! escape byte are guessed on their own, and the first combination that
//! splits the sample into rows of a consistent width is kept. See
//! [`Sniffer`] for the strict and lenient fallbacks.

mod dialect;
mod encoding;
mod error;
mod heuristics;
mod metadata;
mod preamble;
mod sample;
mod scanner;
mod sniffer;
mod writer;

#[cfg(feature = "http")]
pub mod http;

pub use dialect::{DialectParameters, Quote, QuoteMode};
pub use error::{Error, Result};
pub use metadata::{Guess, Metadata, SepQuoteScore};
pub use preamble::preamble_len;
pub use sample::SampleSize;
pub use scanner::{Field, FieldBuf, FieldFlags, Fields, Tokenizer, TokenizerBuilder};
pub use sniffer::{EscapeCandidate, Sniffer};
pub use writer::{EnquotePolicy, Writer, WriterBuilder};

// Re-export for advanced usage
pub use encoding::{EncodingInfo, UTF8_BOM, bom_len, detect_encoding, has_utf8_bom, is_utf8, skip_bom};
