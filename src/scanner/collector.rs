//! Collectors gather the pieces of fields that may span several pieces:
//! comments and quoted fields.

use crate::dialect::QuoteMode;

/// Outcome of feeding a piece to an open collector.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum End<'p> {
    /// The field is complete; the slice is its last bit of content.
    Closed(&'p [u8]),
    /// More pieces are needed; the slice is appended verbatim.
    Open(&'p [u8]),
    /// A quote closed the field too early. The field is not a well-formed
    /// quoted field and must be taken literally.
    Stray,
}

/// A field-kind matcher chosen once from the dialect.
#[derive(Debug, Clone)]
pub(crate) enum Collector {
    Comment {
        prefix: Vec<u8>,
    },
    StrictQuote {
        quote: u8,
        escape: Option<u8>,
    },
    FuzzyQuote {
        quote: u8,
        escape: Option<u8>,
    },
}

impl Collector {
    pub(crate) fn comment(prefix: &[u8]) -> Option<Self> {
        (!prefix.is_empty()).then(|| Collector::Comment {
            prefix: prefix.to_vec(),
        })
    }

    pub(crate) fn quote(quote: Option<u8>, escape: Option<u8>, mode: QuoteMode) -> Option<Self> {
        let quote = quote?;
        Some(match mode {
            QuoteMode::Strict => Collector::StrictQuote { quote, escape },
            QuoteMode::Fuzzy => Collector::FuzzyQuote { quote, escape },
        })
    }

    /// If the piece opens this kind of field, returns the piece without its
    /// opening marker.
    pub(crate) fn start<'p>(&self, piece: &'p [u8]) -> Option<&'p [u8]> {
        match self {
            Collector::Comment { prefix } => piece.strip_prefix(prefix.as_slice()),
            Collector::StrictQuote { quote, .. } => match piece.split_first() {
                Some((first, rest)) if first == quote => Some(rest),
                _ => None,
            },
            Collector::FuzzyQuote { quote, .. } => {
                let rest = trim_leading_blanks(piece);
                match rest.split_first() {
                    Some((first, rest)) if first == quote => Some(rest),
                    _ => None,
                }
            }
        }
    }

    /// Checks whether the piece closes the field.
    ///
    /// `opening` is true for the piece the field started in. Only there can a
    /// strict quote be found stray; later pieces keep collecting until a
    /// closing quote.
    pub(crate) fn end<'p>(&self, piece: &'p [u8], opening: bool) -> End<'p> {
        match self {
            Collector::Comment { .. } => {
                if piece.last() == Some(&b'\n') {
                    End::Closed(trim_terminator(piece))
                } else {
                    End::Open(piece)
                }
            }
            Collector::StrictQuote { quote, escape } => {
                let body = trim_terminator(piece);
                match close_quote(body, *quote, *escape) {
                    Some(inner) => End::Closed(inner),
                    None if opening && has_stray_quote(body, *quote, *escape) => End::Stray,
                    None => End::Open(piece),
                }
            }
            Collector::FuzzyQuote { quote, escape } => {
                let body = trim_trailing_blanks(trim_terminator(piece));
                match close_quote(body, *quote, *escape) {
                    Some(inner) => End::Closed(inner),
                    None => End::Open(piece),
                }
            }
        }
    }
}

/// Removes the trailing terminator, and a carriage return before a line feed.
pub(crate) fn trim_terminator(piece: &[u8]) -> &[u8] {
    match piece {
        [rest @ .., b'\r', b'\n'] => rest,
        [rest @ .., _] => rest,
        [] => piece,
    }
}

fn trim_leading_blanks(data: &[u8]) -> &[u8] {
    let n = data.iter().take_while(|&&b| b == b' ' || b == b'\t').count();
    &data[n..]
}

fn trim_trailing_blanks(data: &[u8]) -> &[u8] {
    let n = data
        .iter()
        .rev()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();
    &data[..data.len() - n]
}

/// If `body` ends with an unescaped quote, returns `body` without it.
///
/// The quote is unescaped when it is preceded by an even number of
/// consecutive escape bytes.
fn close_quote(body: &[u8], quote: u8, escape: Option<u8>) -> Option<&[u8]> {
    let (&last, rest) = body.split_last()?;
    if last != quote {
        return None;
    }
    if let Some(esc) = escape {
        let run = rest.iter().rev().take_while(|&&b| b == esc).count();
        if run % 2 == 1 {
            return None;
        }
    }
    Some(rest)
}

/// Looks for a quote that would end a quoted field inside `body`.
fn has_stray_quote(body: &[u8], quote: u8, escape: Option<u8>) -> bool {
    let mut i = 0;
    while i < body.len() {
        let b = body[i];
        let escapes_next = Some(b) == escape && (b != quote || body.get(i + 1) == Some(&quote));
        if escapes_next {
            i += 2;
        } else if b == quote {
            return true;
        } else {
            i += 1;
        }
    }
    false
}

/// Replaces each `<escape><quote>` pair with a single quote, left to right.
pub(crate) fn unescape_quotes(value: &mut Vec<u8>, escape: u8, quote: u8) {
    let len = value.len();
    let mut read = 0;
    let mut write = 0;
    while read < len {
        if value[read] == escape && read + 1 < len && value[read + 1] == quote {
            value[write] = quote;
            read += 2;
        } else {
            value[write] = value[read];
            read += 1;
        }
        write += 1;
    }
    value.truncate(write);
}
