use crate::error::{Error, Result};
use std::fmt;

/// Quote character configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quote {
    /// No quoting.
    None,
    /// Quote with the specified character.
    Some(u8),
}

impl Default for Quote {
    fn default() -> Self {
        Quote::Some(b'"')
    }
}

impl Quote {
    /// Returns the quote character if set.
    pub fn char(&self) -> Option<u8> {
        match self {
            Quote::None => None,
            Quote::Some(c) => Some(*c),
        }
    }
}

impl From<Option<u8>> for Quote {
    fn from(quote: Option<u8>) -> Self {
        quote.map_or(Quote::None, Quote::Some)
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quote::None => write!(f, "none"),
            Quote::Some(c) => write!(f, "{}", *c as char),
        }
    }
}

/// How strictly quoted fields are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteMode {
    /// The opening quote must be the first byte of the field and the closing
    /// quote the byte right before the separator or line break.
    Strict,
    /// Spaces and tabs are allowed (and dropped) before the opening quote and
    /// after the closing quote.
    #[default]
    Fuzzy,
}

/// The separator/quote/escape/comment tuple describing a delimited format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectParameters {
    /// Field separator. `None` means a single column: only line breaks end
    /// a field.
    pub separator: Option<u8>,
    /// Quote character.
    pub quote: Quote,
    /// Byte that escapes a quote inside a quoted field. `None` disables
    /// unescaping.
    pub escape: Option<u8>,
    /// Comment line prefix. Empty disables comments.
    pub comment: Vec<u8>,
}

impl Default for DialectParameters {
    fn default() -> Self {
        Self {
            separator: Some(b','),
            quote: Quote::Some(b'"'),
            escape: Some(b'"'),
            comment: b"#".to_vec(),
        }
    }
}

impl DialectParameters {
    /// Create parameters with the escape set to the quote and no comment.
    pub fn new(separator: Option<u8>, quote: Quote) -> Self {
        Self {
            separator: normalize_separator(separator),
            quote,
            escape: quote.char(),
            comment: Vec::new(),
        }
    }

    /// Set the escape byte.
    #[must_use]
    pub fn with_escape(mut self, escape: Option<u8>) -> Self {
        self.escape = escape;
        self
    }

    /// Set the comment prefix.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<Vec<u8>>) -> Self {
        self.comment = comment.into();
        self
    }

    /// The separator with a line-feed separator folded into `None`.
    pub(crate) fn effective_separator(&self) -> Option<u8> {
        normalize_separator(self.separator)
    }

    /// Check that the quote, escape and comment bytes can't be confused with
    /// the separator or a line break.
    pub fn validate(&self) -> Result<()> {
        let sep = self.effective_separator();
        if sep == Some(b'\r') {
            return Err(Error::InvalidConfig(
                "separator cannot be a carriage return".to_string(),
            ));
        }
        let conflicts = |b: u8| b == b'\n' || b == b'\r' || Some(b) == sep;

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
        if self.comment.iter().any(|&b| conflicts(b)) {
            return Err(Error::InvalidConfig(format!(
                "comment prefix {:?} cannot contain a line break or the separator",
                String::from_utf8_lossy(&self.comment)
            )));
        }
        Ok(())
    }
}

fn normalize_separator(separator: Option<u8>) -> Option<u8> {
    separator.filter(|&b| b != b'\n')
}

impl fmt::Display for DialectParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.separator {
            Some(sep) => write!(f, "separator={:?}", sep as char)?,
            None => write!(f, "separator=none")?,
        }
        write!(f, " quote={}", self.quote)?;
        match self.escape {
            Some(esc) => write!(f, " escape={:?}", esc as char)?,
            None => write!(f, " escape=none")?,
        }
        write!(f, " comment={:?}", String::from_utf8_lossy(&self.comment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DialectParameters::default().validate().is_ok());
    }

    #[test]
    fn test_new_sets_escape_to_quote() {
        let p = DialectParameters::new(Some(b';'), Quote::Some(b'\''));
        assert_eq!(p.escape, Some(b'\''));
        assert!(p.comment.is_empty());

        let p = DialectParameters::new(Some(b'\n'), Quote::None);
        assert_eq!(p.separator, None);
        assert_eq!(p.escape, None);
    }

    #[test]
    fn test_conflicting_bytes() {
        let bad = [
            DialectParameters::new(Some(b','), Quote::Some(b',')),
            DialectParameters::new(Some(b','), Quote::Some(b'\n')),
            DialectParameters::new(Some(b'\r'), Quote::Some(b'"')),
            DialectParameters::new(Some(b';'), Quote::Some(b'"')).with_escape(Some(b';')),
            DialectParameters::new(Some(b','), Quote::Some(b'"')).with_comment("#,"),
            DialectParameters::new(None, Quote::Some(b'"')).with_comment("\r#"),
        ];
        for p in bad {
            assert!(
                matches!(p.validate(), Err(Error::InvalidConfig(_))),
                "{p} should be rejected"
            );
        }
    }

    #[test]
    fn test_no_quote_no_escape_is_valid() {
        let p = DialectParameters::new(Some(b'\t'), Quote::None);
        assert!(p.validate().is_ok());
    }
}
