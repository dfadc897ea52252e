use std::io::{self, BufRead, BufReader, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeforeFirstByte,
    MidStream,
    /// A `]` was read and is withheld until more input shows up.
    CachedTrailingByte,
}

/// Wraps one page of a paginated JSON array response so that reading the
/// pages back to back yields a single JSON array.
///
/// Pages after the first have their opening `[` rewritten to `,` (or to a
/// space when the page is `[]`). Pages before the last never emit their
/// closing `]`. Leading whitespace before `[` is not recognised, and an empty
/// first page followed by non-empty pages yields `[,`; list endpoints never
/// paginate past an empty page.
pub struct PaginatedArrayReader<R> {
    inner: BufReader<R>,
    is_first_page: bool,
    is_last_page: bool,
    state: State,
}

impl<R: Read> PaginatedArrayReader<R> {
    pub fn new(inner: R, is_first_page: bool, is_last_page: bool) -> Self {
        Self {
            inner: BufReader::new(inner),
            is_first_page,
            is_last_page,
            state: State::BeforeFirstByte,
        }
    }

    fn peek(&mut self) -> io::Result<Option<u8>> {
        Ok(self.inner.fill_buf()?.first().copied())
    }

    fn take(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.inner.consume(1);
        }
        Ok(byte)
    }
}

impl<R: Read> Read for PaginatedArrayReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;

        while written < buf.len() {
            match self.state {
                State::BeforeFirstByte => {
                    self.state = State::MidStream;
                    if !self.is_first_page && self.peek()? == Some(b'[') {
                        self.inner.consume(1);
                        buf[written] = if self.peek()? == Some(b']') { b' ' } else { b',' };
                        written += 1;
                    }
                }
                State::CachedTrailingByte => match self.peek()? {
                    Some(_) => {
                        buf[written] = b']';
                        written += 1;
                        self.state = State::MidStream;
                    }
                    None => break,
                },
                State::MidStream => match self.take()? {
                    Some(b']') if !self.is_last_page => self.state = State::CachedTrailingByte,
                    Some(byte) => {
                        buf[written] = byte;
                        written += 1;
                    }
                    None => break,
                },
            }
        }

        Ok(written)
    }
}
