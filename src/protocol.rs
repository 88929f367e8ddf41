//! Line framing for the text protocol. Commands and responses are single lines terminated by a
//! delimiter: `\r\n` on the network, `\n` in the interactive shell.
use std::io::{BufRead, Write};

use tracing::debug;

use crate::Result;

/// the delimiter terminating commands and responses on the network
pub const DELIMITER: &[u8] = b"\r\n";

/// the delimiter terminating commands typed into the shell
pub const SHELL_DELIMITER: &[u8] = b"\n";

/// Reads delimiter-terminated lines from a buffered reader.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    delimiter: &'static [u8],
}

impl<R: BufRead> LineReader<R> {
    /// wraps `inner`, splitting its contents on `delimiter`. `delimiter` must not be empty.
    pub fn new(inner: R, delimiter: &'static [u8]) -> Self {
        LineReader { inner, delimiter }
    }

    /// Reads the next line, with the delimiter stripped.
    ///
    /// Returns `Ok(None)` at end of stream. Bytes received after the last delimiter, before the
    /// stream ended, are not a complete command and are discarded.
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let last = match self.delimiter.last() {
            Some(last) => *last,
            None => return Ok(None),
        };

        let mut line = Vec::new();
        loop {
            if self.inner.read_until(last, &mut line)? == 0 {
                if !line.is_empty() {
                    debug!(bytes = line.len(), "discarding unterminated line");
                }
                return Ok(None);
            }
            if line.ends_with(self.delimiter) {
                line.truncate(line.len() - self.delimiter.len());
                return Ok(Some(line));
            }
        }
    }
}

/// writes `line` followed by `delimiter` and flushes the writer
pub fn write_line<W: Write>(writer: &mut W, line: &[u8], delimiter: &[u8]) -> Result<()> {
    writer.write_all(line)?;
    writer.write_all(delimiter)?;
    writer.flush()?;
    Ok(())
}
