//! Streaming tokenizer: splits a byte stream into fields under a dialect.

mod collector;
mod field;
mod splitter;

use std::io::Read;

use crate::dialect::{DialectParameters, Quote, QuoteMode};
use crate::error::{Error, Result};
use collector::{Collector, End, trim_terminator, unescape_quotes};
use splitter::Splitter;

pub use field::{Field, FieldBuf, FieldFlags};

/// Builds a [`Tokenizer`] from dialect settings.
///
/// # Example
///
/// ```
/// use csv_scout::{Quote, TokenizerBuilder};
///
/// let mut tok = TokenizerBuilder::new()
///     .separator(b';')
///     .quote(Quote::Some(b'\''))
///     .from_reader(&b"a;'b;c'\n"[..])
///     .unwrap();
///
/// let mut fields = Vec::new();
/// while tok.advance() {
///     fields.push(tok.field().bytes().to_vec());
/// }
/// assert_eq!(fields, vec![b"a".to_vec(), b"b;c".to_vec()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokenizerBuilder {
    dialect: DialectParameters,
    quote_mode: QuoteMode,
}

impl TokenizerBuilder {
    /// Defaults: `,` separator, fuzzy `"` quoting, `"` escape, `#` comments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing dialect parameters.
    pub fn from_dialect(dialect: DialectParameters) -> Self {
        Self {
            dialect,
            quote_mode: QuoteMode::default(),
        }
    }

    /// Set the separator. A line feed means one column per line.
    pub fn separator(&mut self, separator: u8) -> &mut Self {
        self.dialect.separator = Some(separator);
        self
    }

    /// Read one column per line.
    pub fn no_separator(&mut self) -> &mut Self {
        self.dialect.separator = None;
        self
    }

    /// Set the quote character. The escape is reset to the same byte.
    pub fn quote(&mut self, quote: Quote) -> &mut Self {
        self.dialect.quote = quote;
        self.dialect.escape = quote.char();
        self
    }

    /// Set the escape byte. Call after [`quote`](Self::quote).
    pub fn escape(&mut self, escape: Option<u8>) -> &mut Self {
        self.dialect.escape = escape;
        self
    }

    /// Set the comment prefix. Empty disables comments.
    pub fn comment(&mut self, prefix: &[u8]) -> &mut Self {
        self.dialect.comment = prefix.to_vec();
        self
    }

    /// Choose strict or fuzzy quote recognition.
    pub fn quote_mode(&mut self, mode: QuoteMode) -> &mut Self {
        self.quote_mode = mode;
        self
    }

    /// Validate the dialect and build a tokenizer over `reader`.
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Tokenizer<R>> {
        self.dialect.validate()?;
        let separator = self.dialect.effective_separator();

        Ok(Tokenizer {
            splitter: Splitter::new(reader, separator),
            dialect: DialectParameters {
                separator,
                ..self.dialect.clone()
            },
            comment_collector: Collector::comment(&self.dialect.comment),
            quote_collector: Collector::quote(
                self.dialect.quote.char(),
                self.dialect.escape,
                self.quote_mode,
            ),
            value: Vec::new(),
            raw: Vec::new(),
            raw_len: 0,
            offset: 0,
            // the first advance turns this into a row start
            flags: FieldFlags::ROW_END,
            error: None,
        })
    }
}

/// Pull-based field tokenizer.
///
/// Call [`advance`](Tokenizer::advance) until it returns false, then check
/// [`error`](Tokenizer::error) to tell the end of input from a failed read.
#[derive(Debug)]
pub struct Tokenizer<R> {
    splitter: Splitter<R>,
    dialect: DialectParameters,
    comment_collector: Option<Collector>,
    quote_collector: Option<Collector>,
    value: Vec<u8>,
    /// Raw pieces of the current quoted field, kept for stray-quote recovery.
    raw: Vec<u8>,
    raw_len: usize,
    offset: usize,
    flags: FieldFlags,
    error: Option<Error>,
}

impl<R: Read> Tokenizer<R> {
    /// Tokenize `reader` with the default dialect.
    pub fn new(reader: R) -> Result<Self> {
        TokenizerBuilder::new().from_reader(reader)
    }

    /// Move to the next field.
    ///
    /// Returns false at the end of the input or after a read error. A read
    /// error is sticky: every later call returns false.
    pub fn advance(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }
        let row_start = self.flags.contains(FieldFlags::ROW_END);
        self.offset += self.raw_len;
        self.raw_len = 0;
        self.value.clear();
        self.raw.clear();
        self.flags = if row_start {
            FieldFlags::ROW_START
        } else {
            FieldFlags::empty()
        };

        let mut active: Option<&Collector> = None;
        let mut ready = false;
        loop {
            let piece = match self.splitter.next_piece() {
                Ok(Some(piece)) => piece,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(offset = self.offset, error = %err, "read failed");
                    self.error = Some(Error::from(err));
                    return false;
                }
            };
            self.raw_len += piece.len();
            self.flags
                .set(FieldFlags::ROW_END, piece.last() == Some(&b'\n'));

            let opening = active.is_none();
            let (collector, body) = match active {
                Some(collector) => (collector, piece),
                None => match open_special(
                    self.comment_collector.as_ref(),
                    self.quote_collector.as_ref(),
                    piece,
                    row_start,
                ) {
                    Some((collector, rest, kind)) => {
                        self.flags.insert(kind);
                        (collector, rest)
                    }
                    None => {
                        self.value.extend_from_slice(trim_terminator(piece));
                        ready = true;
                        break;
                    }
                },
            };
            if self.flags.contains(FieldFlags::QUOTED) {
                self.raw.extend_from_slice(piece);
            }

            match collector.end(body, opening) {
                End::Closed(rest) => {
                    self.value.extend_from_slice(rest);
                    ready = true;
                    break;
                }
                End::Open(rest) => {
                    self.value.extend_from_slice(rest);
                    active = Some(collector);
                }
                End::Stray => {
                    tracing::trace!(offset = self.offset, "stray quote, field taken literally");
                    self.value.clear();
                    self.value.extend_from_slice(trim_terminator(&self.raw));
                    self.flags.remove(FieldFlags::QUOTED);
                    ready = true;
                    break;
                }
            }
        }

        if !ready {
            if active.is_none() {
                return false;
            }
            // the input ended inside a quoted field or a comment
            if self.splitter.synthetic_tail() && self.value.last() == Some(&b'\n') {
                self.value.pop();
            }
            self.flags.insert(FieldFlags::ROW_END);
            tracing::debug!(offset = self.offset, "unterminated field closed at end of input");
        }

        if self.flags.contains(FieldFlags::QUOTED)
            && let (Some(escape), Quote::Some(quote)) = (self.dialect.escape, self.dialect.quote)
        {
            unescape_quotes(&mut self.value, escape, quote);
        }
        if self.flags.contains(FieldFlags::ROW_START | FieldFlags::ROW_END)
            && is_blank(self.dialect.separator, &self.value)
        {
            self.flags.insert(FieldFlags::EMPTY_LINE);
        }
        true
    }

    /// The current field. Valid until the next call to `advance`.
    pub fn field(&self) -> Field<'_> {
        Field::new(&self.value, self.offset, self.flags)
    }

    /// The read error that stopped the tokenizer, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// The dialect in use.
    pub fn dialect(&self) -> &DialectParameters {
        &self.dialect
    }

    /// Turn the tokenizer into an iterator of owned fields.
    pub fn into_fields(self) -> Fields<R> {
        Fields {
            tokenizer: self,
            done: false,
        }
    }
}

/// Iterator over owned fields, created by [`Tokenizer::into_fields`].
///
/// A read error is yielded once, then the iterator ends.
#[derive(Debug)]
pub struct Fields<R> {
    tokenizer: Tokenizer<R>,
    done: bool,
}

impl<R: Read> Iterator for Fields<R> {
    type Item = Result<FieldBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.tokenizer.advance() {
            return Some(Ok(self.tokenizer.field().into_owned()));
        }
        self.done = true;
        self.tokenizer.error().cloned().map(Err)
    }
}

/// Tries the comment collector (at row start) then the quote collector.
fn open_special<'c, 'p>(
    comment: Option<&'c Collector>,
    quote: Option<&'c Collector>,
    piece: &'p [u8],
    row_start: bool,
) -> Option<(&'c Collector, &'p [u8], FieldFlags)> {
    if row_start
        && let Some(collector) = comment
        && let Some(rest) = collector.start(piece)
    {
        return Some((collector, rest, FieldFlags::COMMENT));
    }
    let collector = quote?;
    collector
        .start(piece)
        .map(|rest| (collector, rest, FieldFlags::QUOTED))
}

/// Emptiness of a single-field row depends on what the separator can be.
fn is_blank(separator: Option<u8>, value: &[u8]) -> bool {
    match separator {
        Some(b' ') => value.is_empty(),
        Some(b'\t') => value.iter().all(|&b| b == b' '),
        _ => value.iter().all(|&b| b == b' ' || b == b'\t'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// (bytes, flags) for every field.
    fn scan(builder: &TokenizerBuilder, data: &[u8]) -> Vec<(Vec<u8>, FieldFlags)> {
        let mut tok = builder.from_reader(data).unwrap();
        let mut out = Vec::new();
        while tok.advance() {
            let f = tok.field();
            out.push((f.bytes().to_vec(), f.flags()));
        }
        assert!(tok.error().is_none());
        out
    }

    fn values(builder: &TokenizerBuilder, data: &[u8]) -> Vec<String> {
        scan(builder, data)
            .into_iter()
            .map(|(b, _)| String::from_utf8(b).unwrap())
            .collect()
    }

    const START: FieldFlags = FieldFlags::ROW_START;
    const END: FieldFlags = FieldFlags::ROW_END;

    #[test]
    fn test_simple_rows() {
        let got = scan(&TokenizerBuilder::new(), b"a,b\nc,d\n");
        assert_eq!(
            got,
            vec![
                (b"a".to_vec(), START),
                (b"b".to_vec(), END),
                (b"c".to_vec(), START),
                (b"d".to_vec(), END),
            ]
        );
    }

    #[test]
    fn test_mixed_document() {
        let data = "# This, is a comment\n foo ,  bar  ,  baz, # This is not a comment\n\n\", foo \",  \"b'ar,\",\" b\"\",az \" ,\n";
        let got = scan(&TokenizerBuilder::new(), data.as_bytes());
        let expected: Vec<(&str, FieldFlags)> = vec![
            (" This, is a comment", START | END | FieldFlags::COMMENT),
            (" foo ", START),
            ("  bar  ", FieldFlags::empty()),
            ("  baz", FieldFlags::empty()),
            (" # This is not a comment", END),
            ("", START | END | FieldFlags::EMPTY_LINE),
            (", foo ", START | FieldFlags::QUOTED),
            ("b'ar,", FieldFlags::QUOTED),
            (" b\",az ", FieldFlags::QUOTED),
            ("", END),
        ];
        assert_eq!(got.len(), expected.len());
        for ((bytes, flags), (want, want_flags)) in got.iter().zip(expected) {
            assert_eq!(String::from_utf8_lossy(bytes), want);
            assert_eq!(*flags, want_flags, "flags of {want:?}");
        }
    }

    #[test]
    fn test_offsets() {
        let mut tok = Tokenizer::new(&b"ab,\"c\"\r\nd"[..]).unwrap();
        let mut offsets = Vec::new();
        while tok.advance() {
            offsets.push(tok.field().offset());
        }
        assert_eq!(offsets, vec![0, 3, 8]);
    }

    #[test]
    fn test_crlf_is_stripped() {
        assert_eq!(
            values(&TokenizerBuilder::new(), b"a,b\r\nc\r\n"),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_last_row_without_newline_is_closed() {
        let got = scan(&TokenizerBuilder::new(), b"a,b\nc,d");
        assert_eq!(got.last().unwrap(), &(b"d".to_vec(), END));

        let got = scan(&TokenizerBuilder::new(), b"a,b,");
        assert_eq!(got.last().unwrap(), &(b"".to_vec(), END));
    }

    #[test]
    fn test_quoted_field_spanning_lines() {
        let got = values(&TokenizerBuilder::new(), b"\"a\nb,c\",d\n");
        assert_eq!(got, vec!["a\nb,c", "d"]);
    }

    #[test]
    fn test_escaped_quotes() {
        let got = values(&TokenizerBuilder::new(), b"\"a\"\"b\",\"\"\"\"\n");
        assert_eq!(got, vec!["a\"b", "\""]);

        let mut builder = TokenizerBuilder::new();
        builder.escape(Some(b'\\'));
        let got = values(&builder, b"\"a\\\"b\",\"c\\\",d\"\n");
        assert_eq!(got, vec!["a\"b", "c\",d"]);
    }

    #[test]
    fn test_strict_vs_fuzzy() {
        let data = b"\"x\" ,\"y\"";

        let mut strict = TokenizerBuilder::new();
        strict.quote_mode(QuoteMode::Strict);
        let got = scan(&strict, data);
        assert_eq!(got[0], (b"\"x\" ".to_vec(), START));
        assert_eq!(got[1], (b"y".to_vec(), END | FieldFlags::QUOTED));

        let got = scan(&TokenizerBuilder::new(), data);
        assert_eq!(got[0], (b"x".to_vec(), START | FieldFlags::QUOTED));
        assert_eq!(got[1], (b"y".to_vec(), END | FieldFlags::QUOTED));
    }

    #[test]
    fn test_strict_closing_quote_before_separator() {
        let mut strict = TokenizerBuilder::new();
        strict.quote_mode(QuoteMode::Strict);
        let got = scan(&strict, b"\"a\"b\",z\n");
        assert_eq!(
            got,
            vec![
                (b"a\"b".to_vec(), START | FieldFlags::QUOTED),
                (b"z".to_vec(), END),
            ]
        );
    }

    #[test]
    fn test_strict_quote_spanning_pieces_keeps_collecting() {
        let mut strict = TokenizerBuilder::new();
        strict.quote_mode(QuoteMode::Strict);

        let got = scan(&strict, b"\"a,b\"c,d\n");
        assert_eq!(
            got,
            vec![(b"a,b\"c,d\n".to_vec(), START | END | FieldFlags::QUOTED)]
        );

        let got = scan(&strict, b"\"a,b\"c,d");
        assert_eq!(
            got,
            vec![(b"a,b\"c,d".to_vec(), START | END | FieldFlags::QUOTED)]
        );
    }

    #[test]
    fn test_strict_rejects_leading_space() {
        let mut strict = TokenizerBuilder::new();
        strict.quote_mode(QuoteMode::Strict);
        assert_eq!(values(&strict, b" \"x\",y\n"), vec![" \"x\"", "y"]);
    }

    #[test]
    fn test_unterminated_quote_at_eof() {
        let got = scan(&TokenizerBuilder::new(), b"a,\"bc\nd");
        assert_eq!(got.len(), 2);
        assert_eq!(got[1], (b"bc\nd".to_vec(), END | FieldFlags::QUOTED));

        let got = scan(&TokenizerBuilder::new(), b"\"a,");
        assert_eq!(got, vec![(b"a,".to_vec(), START | END | FieldFlags::QUOTED)]);
    }

    #[test]
    fn test_comment_only_at_row_start() {
        let got = values(&TokenizerBuilder::new(), b"a,#b\n#c,d\n");
        assert_eq!(got, vec!["a", "#b", "c,d"]);
    }

    #[test]
    fn test_comment_without_trailing_newline() {
        let got = scan(&TokenizerBuilder::new(), b"a\n# tail");
        assert_eq!(
            got[1],
            (b" tail".to_vec(), START | END | FieldFlags::COMMENT)
        );
    }

    #[test]
    fn test_comment_disabled() {
        let mut builder = TokenizerBuilder::new();
        builder.comment(b"");
        assert_eq!(values(&builder, b"#a,b\n"), vec!["#a", "b"]);
    }

    #[test]
    fn test_quote_disabled() {
        let mut builder = TokenizerBuilder::new();
        builder.quote(Quote::None);
        let got = scan(&builder, b"\"a,b\"\n");
        assert_eq!(got[0], (b"\"a".to_vec(), START));
        assert_eq!(got[1], (b"b\"".to_vec(), END));
    }

    #[test]
    fn test_no_separator() {
        let mut builder = TokenizerBuilder::new();
        builder.no_separator();
        assert_eq!(values(&builder, b"a,b\nc;d\n"), vec!["a,b", "c;d"]);
    }

    #[test]
    fn test_empty_line_depends_on_separator() {
        let is_empty = |sep: u8, data: &[u8]| {
            let mut builder = TokenizerBuilder::new();
            builder.separator(sep);
            scan(&builder, data)[0].1.contains(FieldFlags::EMPTY_LINE)
        };
        assert!(is_empty(b' ', b"\n"));
        assert!(!is_empty(b' ', b"\t\n"));
        assert!(is_empty(b'\t', b"   \n"));
        assert!(!is_empty(b'\t', b" a\n"));
        assert!(is_empty(b',', b" \t \n"));
        assert!(!is_empty(b',', b",\n"));
    }

    #[test]
    fn test_invalid_config_before_read() {
        let mut builder = TokenizerBuilder::new();
        builder.separator(b'"');
        assert!(matches!(
            builder.from_reader(&b""[..]),
            Err(Error::InvalidConfig(_))
        ));
    }

    struct FailAfter<'a> {
        data: &'a [u8],
    }

    impl Read for FailAfter<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::other("boom"));
            }
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_read_error_is_sticky() {
        let mut tok = Tokenizer::new(FailAfter { data: b"a,b\nc" }).unwrap();
        let mut got = Vec::new();
        while tok.advance() {
            got.push(tok.field().bytes().to_vec());
        }
        assert_eq!(got, vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(tok.error().and_then(Error::io_kind), Some(io::ErrorKind::Other));
        assert!(!tok.advance());
        assert!(tok.error().is_some());
    }

    #[test]
    fn test_into_fields_reports_error_once() {
        let tok = Tokenizer::new(FailAfter { data: b"a\n" }).unwrap();
        let items: Vec<_> = tok.into_fields().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().bytes(), b"a");
        assert!(items[1].is_err());
    }
}
