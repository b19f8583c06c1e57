//! Incremental text decoding of a byte stream, line by line.

use std::io::{self, Read};

use encoding_rs::{CoderResult, Decoder, Encoding};

const READ_CHUNK: usize = 8 * 1024;

/// Reads `reader` in chunks, decodes them with `encoding` and yields lines.
///
/// Line terminators (`\n` or `\r\n`) are stripped. A leading byte order mark is
/// removed; malformed sequences decode to U+FFFD.
pub struct DecodedLines<'a> {
    reader: &'a mut dyn Read,
    decoder: Decoder,
    buf: Box<[u8]>,
    text: String,
    pos: usize,
    eof: bool,
    line_no: usize,
}

impl<'a> DecodedLines<'a> {
    pub fn new(reader: &'a mut dyn Read, encoding: &'static Encoding) -> Self {
        Self {
            reader,
            decoder: encoding.new_decoder_with_bom_removal(),
            buf: vec![0; READ_CHUNK].into_boxed_slice(),
            text: String::new(),
            pos: 0,
            eof: false,
            line_no: 0,
        }
    }

    /// Number of the line most recently returned, starting at 1.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(i) = self.text[self.pos..].find('\n') {
                let end = self.pos + i;
                let line = self.text[self.pos..end].trim_end_matches('\r').to_string();
                self.pos = end + 1;
                self.line_no += 1;
                return Ok(Some(line));
            }
            if self.eof {
                if self.pos == self.text.len() {
                    return Ok(None);
                }
                let line = self.text[self.pos..].trim_end_matches('\r').to_string();
                self.pos = self.text.len();
                self.line_no += 1;
                return Ok(Some(line));
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        self.text.drain(..self.pos);
        self.pos = 0;

        let n = loop {
            match self.reader.read(&mut self.buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        let last = n == 0;

        let mut input = &self.buf[..n];
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len() * 3 + 16);
            self.text.reserve(needed);
            let (result, read, _) = self.decoder.decode_to_string(input, &mut self.text, last);
            input = &input[read..];
            if let CoderResult::InputEmpty = result {
                break;
            }
        }
        self.eof = last;
        Ok(())
    }
}

impl Iterator for DecodedLines<'_> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}
