//! Single-pass statistics on separator and quote candidates.

use foldhash::{HashMap, HashMapExt};

/// Bonus when the sample starts with a quote.
const VERY_FIRST_QUOTE_BONUS: usize = 8;
/// Bonus for the first separator, and for the first quote after a separator.
const FIRST_BONUS: usize = 4;
/// Bonus when a separator and a quote are next to each other.
const BESIDE_BONUS: usize = 2;
/// Bonus when a separator and a quote are separated only by spaces.
const SPACE_BONUS: usize = 1;

/// Scores of separators, quotes and (separator, quote) pairs for one sample.
#[derive(Debug, Clone, Default)]
pub(crate) struct TempStats {
    pub(crate) seps: HashMap<u8, usize>,
    pub(crate) quotes: HashMap<u8, usize>,
    pub(crate) pairs: HashMap<(u8, u8), usize>,
}

/// What the scan remembers about a previous byte.
#[derive(Debug, Clone, Copy)]
struct Prev {
    byte: u8,
    is_sep: bool,
    is_quote: bool,
}

impl Prev {
    const LINE_START: Prev = Prev {
        byte: b'\n',
        is_sep: true,
        is_quote: false,
    };

    fn other(byte: u8) -> Self {
        Prev {
            byte,
            // a line feed bounds fields like a separator
            is_sep: byte == b'\n',
            is_quote: false,
        }
    }
}

impl TempStats {
    /// Zeroed statistics for the given candidates.
    pub(crate) fn new(separators: &[u8], quotes: &[u8]) -> Self {
        let mut stats = TempStats {
            seps: HashMap::with_capacity(separators.len()),
            quotes: HashMap::with_capacity(quotes.len()),
            pairs: HashMap::new(),
        };
        stats.seps.extend(separators.iter().map(|&s| (s, 0)));
        stats.quotes.extend(quotes.iter().map(|&q| (q, 0)));
        stats
    }

    /// Collect and clean the statistics of `data`.
    pub(crate) fn from_sample(data: &[u8], separators: &[u8], quotes: &[u8]) -> Self {
        let mut stats = Self::new(separators, quotes);
        stats.collect(data);
        stats.clean();
        stats
    }

    pub(crate) fn is_separator(&self, b: u8) -> bool {
        self.seps.contains_key(&b)
    }

    pub(crate) fn is_quote(&self, b: u8) -> bool {
        self.quotes.contains_key(&b)
    }

    /// Score every candidate occurrence against the bytes before it.
    ///
    /// A byte that is both a quote and a separator candidate counts as a
    /// quote.
    pub(crate) fn collect(&mut self, data: &[u8]) {
        let Some(&first) = data.first() else {
            return;
        };
        if let Some(score) = self.quotes.get_mut(&first) {
            *score += VERY_FIRST_QUOTE_BONUS;
        }

        let mut first_sep = true;
        let mut first_quote = true;
        let mut prev = Prev::LINE_START;
        let mut prev_non_space = Prev::LINE_START;

        for &c in data {
            if self.is_quote(c) {
                let mut gain = 0;
                if first_quote && (prev.is_sep || prev_non_space.is_sep) {
                    gain += FIRST_BONUS;
                    first_quote = false;
                }
                if prev.is_sep {
                    gain += BESIDE_BONUS;
                    if prev.byte != b'\n' {
                        *self.pairs.entry((prev.byte, c)).or_insert(0) += BESIDE_BONUS;
                    }
                }
                if prev_non_space.is_sep {
                    gain += SPACE_BONUS;
                    if prev_non_space.byte != b'\n' {
                        *self.pairs.entry((prev_non_space.byte, c)).or_insert(0) += SPACE_BONUS;
                    }
                }
                self.bump_quote(c, gain);
                prev = Prev {
                    byte: c,
                    is_sep: false,
                    is_quote: true,
                };
                prev_non_space = prev;
                continue;
            }

            if self.is_separator(c) {
                let mut gain = 1;
                if first_sep {
                    gain += FIRST_BONUS;
                    first_sep = false;
                }
                if prev.is_quote {
                    gain += BESIDE_BONUS;
                    *self.pairs.entry((c, prev.byte)).or_insert(0) += BESIDE_BONUS;
                }
                if prev_non_space.is_quote {
                    gain += SPACE_BONUS;
                    *self.pairs.entry((c, prev_non_space.byte)).or_insert(0) += SPACE_BONUS;
                }
                self.bump_separator(c, gain);
                prev = Prev {
                    byte: c,
                    is_sep: true,
                    is_quote: false,
                };
                prev_non_space = prev;
                continue;
            }

            prev = Prev::other(c);
            if c != b' ' {
                prev_non_space = prev;
            }
        }
    }

    /// Drop every candidate and pair that scored nothing.
    pub(crate) fn clean(&mut self) {
        self.seps.retain(|_, score| *score > 0);
        self.quotes.retain(|_, score| *score > 0);
        self.pairs.retain(|_, score| *score > 0);
    }

    fn bump_quote(&mut self, c: u8, gain: usize) {
        if let Some(score) = self.quotes.get_mut(&c) {
            *score += gain;
        }
    }

    fn bump_separator(&mut self, c: u8, gain: usize) {
        if let Some(score) = self.seps.get_mut(&c) {
            *score += gain;
        }
    }
}
