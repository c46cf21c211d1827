//! Splits a forward-only byte source into pieces ending at the separator or
//! a line break.

use std::io::{self, Read};

const INITIAL_CAPACITY: usize = 8 * 1024;

/// Pulls pieces out of a reader.
///
/// Every piece ends with its terminator. When the source ends without one, a
/// line feed is appended to the final piece so that the last field of the
/// last row is always closed.
#[derive(Debug)]
pub(crate) struct Splitter<R> {
    reader: R,
    separator: Option<u8>,
    buf: Vec<u8>,
    /// Start of the bytes not yet handed out.
    start: usize,
    /// End of the valid bytes in `buf`.
    end: usize,
    /// Bytes after `start` already searched without finding a terminator.
    searched: usize,
    eof: bool,
    synthetic: bool,
    /// The last piece handed out ended with the separator.
    open_row: bool,
}

impl<R: Read> Splitter<R> {
    pub(crate) fn new(reader: R, separator: Option<u8>) -> Self {
        Self {
            reader,
            separator,
            buf: Vec::new(),
            start: 0,
            end: 0,
            searched: 0,
            eof: false,
            synthetic: false,
            open_row: false,
        }
    }

    /// Returns the next piece, or `None` once the source is exhausted.
    ///
    /// A source ending right after a separator yields a final empty piece
    /// holding only the appended line feed.
    pub(crate) fn next_piece(&mut self) -> io::Result<Option<&[u8]>> {
        loop {
            let pending = &self.buf[self.start + self.searched..self.end];
            if let Some(i) = find_terminator(self.separator, pending) {
                let piece_start = self.start;
                self.start += self.searched + i + 1;
                self.searched = 0;
                self.open_row = self.buf[self.start - 1] != b'\n';
                return Ok(Some(&self.buf[piece_start..self.start]));
            }
            self.searched = self.end - self.start;

            if self.eof {
                if self.start == self.end && !self.open_row {
                    return Ok(None);
                }
                self.buf.truncate(self.end);
                self.buf.push(b'\n');
                let piece_start = self.start;
                self.end += 1;
                self.start = self.end;
                self.searched = 0;
                self.synthetic = true;
                self.open_row = false;
                return Ok(Some(&self.buf[piece_start..self.end]));
            }
            self.fill()?;
        }
    }

    /// True once the final piece was terminated by an appended line feed.
    pub(crate) fn synthetic_tail(&self) -> bool {
        self.synthetic
    }

    fn fill(&mut self) -> io::Result<()> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        if self.end == self.buf.len() {
            let grown = (self.buf.len() * 2).max(INITIAL_CAPACITY);
            self.buf.resize(grown, 0);
        }
        loop {
            match self.reader.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.end += n;
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

fn find_terminator(separator: Option<u8>, data: &[u8]) -> Option<usize> {
    match separator {
        Some(sep) => memchr::memchr2(sep, b'\n', data),
        None => memchr::memchr(b'\n', data),
    }
}
