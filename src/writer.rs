//! Field serializer: the inverse of the tokenizer.

use std::io::{self, BufWriter, Write};

use crate::dialect::Quote;
use crate::error::{Error, Result};

/// When a field gets enclosed in quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnquotePolicy {
    /// Quote every field.
    Always,
    /// Quote only fields that would not read back unchanged otherwise.
    #[default]
    Minimal,
}

/// Builds a [`Writer`].
#[derive(Debug, Clone)]
pub struct WriterBuilder {
    separator: u8,
    quote: Quote,
    escape: Option<u8>,
    comment: Vec<u8>,
    enquote: EnquotePolicy,
}

impl Default for WriterBuilder {
    fn default() -> Self {
        Self {
            separator: b',',
            quote: Quote::Some(b'"'),
            escape: Some(b'"'),
            comment: b"# ".to_vec(),
            enquote: EnquotePolicy::Minimal,
        }
    }
}

impl WriterBuilder {
    /// Defaults: `,` separator, `"` quote and escape, `# ` comment prefix,
    /// minimal quoting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field separator. It cannot be a line break.
    pub fn separator(&mut self, separator: u8) -> &mut Self {
        self.separator = separator;
        self
    }

    /// Set the quote character. The escape is reset to the same byte.
    pub fn quote(&mut self, quote: Quote) -> &mut Self {
        self.quote = quote;
        self.escape = quote.char();
        self
    }

    /// Set the byte written before each embedded quote. `None` means the
    /// quote itself.
    pub fn escape(&mut self, escape: Option<u8>) -> &mut Self {
        self.escape = escape;
        self
    }

    /// Prefix written before every comment line.
    pub fn comment(&mut self, prefix: &[u8]) -> &mut Self {
        self.comment = prefix.to_vec();
        self
    }

    /// Choose when fields are enclosed in quotes.
    pub fn enquote(&mut self, policy: EnquotePolicy) -> &mut Self {
        self.enquote = policy;
        self
    }

    fn validate(&self) -> Result<()> {
        let sep = self.separator;
        if sep == b'\n' || sep == b'\r' {
            return Err(Error::InvalidConfig(
                "separator cannot be a line break".to_string(),
            ));
        }
        let conflicts = |b: u8| b == b'\n' || b == b'\r' || b == sep;
        if let Some(q) = self.quote.char()
            && conflicts(q)
        {
            return Err(Error::InvalidConfig(format!(
                "quote {:?} cannot be a line break or the separator",
                q as char
            )));
        }
        if let Some(e) = self.escape
            && conflicts(e)
        {
            return Err(Error::InvalidConfig(format!(
                "escape {:?} cannot be a line break or the separator",
                e as char
            )));
        }
        if self
            .comment
            .iter()
            .any(|&b| conflicts(b) || Some(b) == self.quote.char())
        {
            return Err(Error::InvalidConfig(format!(
                "comment prefix {:?} cannot contain a line break, the separator or the quote",
                String::from_utf8_lossy(&self.comment)
            )));
        }
        Ok(())
    }

    /// Validate the settings and wrap `writer` in a buffered field writer.
    pub fn from_writer<W: Write>(&self, writer: W) -> Result<Writer<W>> {
        self.validate()?;
        let quote = self.quote.char();
        // a row-start field beginning with this would read back as a comment
        let comment_trigger = trim_trailing_spaces(&self.comment).to_vec();
        Ok(Writer {
            inner: BufWriter::new(writer),
            separator: self.separator,
            quote,
            escape: self.escape.or(quote),
            comment: self.comment.clone(),
            comment_trigger,
            enquote: self.enquote,
            at_row_start: true,
            error: None,
        })
    }
}

/// Buffered writer of fields, rows and comments.
///
/// The first IO failure is kept: every later call returns it again without
/// touching the sink.
///
/// # Example
///
/// ```
/// use csv_scout::WriterBuilder;
///
/// let mut out = Vec::new();
/// {
///     let mut w = WriterBuilder::new().separator(b';').from_writer(&mut out).unwrap();
///     w.write_field(b"a").unwrap();
///     w.write_field(b"b;c").unwrap();
///     w.new_row().unwrap();
///     w.flush().unwrap();
/// }
/// assert_eq!(out, b"a;\"b;c\"\n");
/// ```
#[derive(Debug)]
pub struct Writer<W: Write> {
    inner: BufWriter<W>,
    separator: u8,
    quote: Option<u8>,
    escape: Option<u8>,
    comment: Vec<u8>,
    comment_trigger: Vec<u8>,
    enquote: EnquotePolicy,
    at_row_start: bool,
    error: Option<Error>,
}

impl<W: Write> Writer<W> {
    /// Write to `writer` with the default settings.
    pub fn new(writer: W) -> Result<Self> {
        WriterBuilder::new().from_writer(writer)
    }

    /// Write one field, preceded by a separator unless it opens a row.
    pub fn write_field(&mut self, field: &[u8]) -> Result<()> {
        self.check()?;
        if !self.at_row_start {
            let sep = self.separator;
            self.put(&[sep])?;
        }
        let enquote = self.needs_quotes(field);
        self.at_row_start = false;
        match self.quote {
            Some(quote) if enquote => {
                self.put(&[quote])?;
                self.put_escaped(field, quote)?;
                self.put(&[quote])
            }
            _ => self.put(field),
        }
    }

    /// Close the current row. Does nothing at the start of a row.
    pub fn new_row(&mut self) -> Result<()> {
        self.check()?;
        if !self.at_row_start {
            self.put(b"\n")?;
        }
        self.at_row_start = true;
        Ok(())
    }

    /// Write a possibly multi-line comment, each line prefixed.
    ///
    /// Trailing blanks and line breaks are dropped first, as is the carriage
    /// return of each line.
    pub fn write_comment(&mut self, comment: &[u8]) -> Result<()> {
        self.check()?;
        if self.comment.is_empty() {
            return Err(Error::InvalidConfig(
                "no comment prefix configured".to_string(),
            ));
        }
        let prefix = self.comment.clone();
        let comment = trim_trailing(comment, b"\r\n\t ");
        for line in comment.split(|&b| b == b'\n') {
            let line = trim_trailing(line, b"\r");
            if !self.at_row_start {
                self.put(b"\n")?;
            }
            self.put(&prefix)?;
            self.put(line)?;
            self.put(b"\n")?;
            self.at_row_start = true;
        }
        Ok(())
    }

    /// Close the current row if any, then write an empty one.
    pub fn empty_row(&mut self) -> Result<()> {
        self.check()?;
        if !self.at_row_start {
            self.put(b"\n")?;
        }
        self.put(b"\n")?;
        self.at_row_start = true;
        Ok(())
    }

    /// Push buffered bytes to the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.check()?;
        let res = self.inner.flush();
        self.record(res)
    }

    /// The first error met, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// True when nothing was written on the current row.
    pub fn at_row_start(&self) -> bool {
        self.at_row_start
    }

    /// Flush and return the sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        self.inner
            .into_inner()
            .map_err(|e| Error::from(e.into_error()))
    }

    fn needs_quotes(&self, field: &[u8]) -> bool {
        match self.enquote {
            EnquotePolicy::Always => true,
            EnquotePolicy::Minimal => {
                let special = field.iter().any(|&b| {
                    b == self.separator || b == b'\n' || b == b'\r' || Some(b) == self.quote
                });
                special
                    || (self.at_row_start
                        && !self.comment_trigger.is_empty()
                        && field.starts_with(&self.comment_trigger))
            }
        }
    }

    fn put_escaped(&mut self, mut field: &[u8], quote: u8) -> Result<()> {
        let escape = self.escape.unwrap_or(quote);
        while let Some(i) = memchr::memchr(quote, field) {
            self.put(&field[..i])?;
            self.put(&[escape, quote])?;
            field = &field[i + 1..];
        }
        self.put(field)
    }

    fn put(&mut self, data: &[u8]) -> Result<()> {
        let res = self.inner.write_all(data);
        self.record(res)
    }

    fn record(&mut self, res: io::Result<()>) -> Result<()> {
        res.map_err(|err| {
            let err = Error::from(err);
            self.error = Some(err.clone());
            err
        })
    }

    fn check(&self) -> Result<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn trim_trailing<'a>(data: &'a [u8], set: &[u8]) -> &'a [u8] {
    let n = data.iter().rev().take_while(|b| set.contains(b)).count();
    &data[..data.len() - n]
}

fn trim_trailing_spaces(data: &[u8]) -> &[u8] {
    trim_trailing(data, b" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(builder: &WriterBuilder, f: impl FnOnce(&mut Writer<&mut Vec<u8>>) -> Result<()>) -> String {
        let mut out = Vec::new();
        {
            let mut w = builder.from_writer(&mut out).unwrap();
            f(&mut w).unwrap();
            w.flush().unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_rows_comment_and_empty_row() {
        let mut builder = WriterBuilder::new();
        builder.separator(b';');
        let got = render(&builder, |w| {
            w.write_comment(b"This is a coment line")?;
            for field in [&b"a"[..], b"b", b"c"] {
                w.write_field(field)?;
            }
            w.empty_row()?;
            for field in [&b"d\ne"[..], b"f\"g", b"h;i"] {
                w.write_field(field)?;
            }
            Ok(())
        });
        assert_eq!(
            got,
            "# This is a coment line\na;b;c\n\n\"d\ne\";\"f\"\"g\";\"h;i\""
        );
    }

    #[test]
    fn test_minimal_quoting() {
        let got = render(&WriterBuilder::new(), |w| {
            for field in [&b"plain"[..], b"", b"a\rb", b"with space", b"x,y"] {
                w.write_field(field)?;
            }
            w.new_row()
        });
        assert_eq!(got, "plain,,\"a\rb\",with space,\"x,y\"\n");
    }

    #[test]
    fn test_always_quoting() {
        let mut builder = WriterBuilder::new();
        builder.enquote(EnquotePolicy::Always);
        let got = render(&builder, |w| {
            w.write_field(b"a")?;
            w.write_field(b"")?;
            w.new_row()
        });
        assert_eq!(got, "\"a\",\"\"\n");
    }

    #[test]
    fn test_escape_distinct_from_quote() {
        let mut builder = WriterBuilder::new();
        builder.quote(Quote::Some(b'\'')).escape(Some(b'\\'));
        let got = render(&builder, |w| w.write_field(b"it's"));
        assert_eq!(got, "'it\\'s'");
    }

    #[test]
    fn test_field_looking_like_comment_is_quoted() {
        let got = render(&WriterBuilder::new(), |w| {
            w.write_field(b"#tag")?;
            w.write_field(b"#not-first")?;
            w.new_row()
        });
        assert_eq!(got, "\"#tag\",#not-first\n");
    }

    #[test]
    fn test_multi_line_comment() {
        let got = render(&WriterBuilder::new(), |w| {
            w.write_field(b"a")?;
            w.write_comment(b"one\r\ntwo\n\n")
        });
        assert_eq!(got, "a\n# one\n# two\n");
    }

    #[test]
    fn test_new_row_is_idempotent_at_row_start() {
        let got = render(&WriterBuilder::new(), |w| {
            w.new_row()?;
            w.write_field(b"a")?;
            w.new_row()?;
            w.new_row()
        });
        assert_eq!(got, "a\n");
    }

    #[test]
    fn test_no_quote_writes_raw() {
        let mut builder = WriterBuilder::new();
        builder.quote(Quote::None);
        let got = render(&builder, |w| w.write_field(b"a\"b"));
        assert_eq!(got, "a\"b");
    }

    #[test]
    fn test_invalid_settings() {
        let mut builder = WriterBuilder::new();
        builder.separator(b'\n');
        assert!(matches!(builder.from_writer(Vec::new()), Err(Error::InvalidConfig(_))));

        let mut builder = WriterBuilder::new();
        builder.comment(b"#,");
        assert!(matches!(builder.from_writer(Vec::new()), Err(Error::InvalidConfig(_))));

        let mut builder = WriterBuilder::new();
        builder.quote(Quote::Some(b','));
        assert!(matches!(builder.from_writer(Vec::new()), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_comment_needs_prefix() {
        let mut builder = WriterBuilder::new();
        builder.comment(b"");
        let mut w = builder.from_writer(Vec::new()).unwrap();
        assert!(matches!(w.write_comment(b"x"), Err(Error::InvalidConfig(_))));
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_error_is_sticky() {
        let mut w = Writer::new(Broken).unwrap();
        w.write_field(b"a").unwrap();
        let err = w.flush().unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::BrokenPipe));
        assert!(w.error().is_some());
        assert!(w.write_field(b"b").is_err());
        assert!(w.new_row().is_err());
    }
}
