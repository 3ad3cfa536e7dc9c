// text.rs — Line-oriented decoding of word-vector files.
//
// Word-vector dumps are large (GBs), so the file is decoded chunk by chunk
// into a small text buffer and handed out one line at a time. Decoding goes
// through encoding_rs, so any WHATWG label works, UTF-16 included. Malformed
// input is an error, never a replacement character.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use encoding_rs::{Decoder, DecoderResult, Encoding};

use super::error::{Result, VectorError};

/// Text encodings accepted for the embedding file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Any encoding encoding_rs knows by label.
    Whatwg(&'static Encoding),
    /// Byte-exact ISO-8859-1. WHATWG folds this label into windows-1252.
    Latin1,
    /// Strict 7-bit US-ASCII. WHATWG folds this label into windows-1252 too.
    Ascii,
}

impl TextEncoding {
    pub const UTF8: Self = Self::Whatwg(encoding_rs::UTF_8);

    /// Resolve an encoding label (case-insensitive).
    pub fn from_label(label: &str) -> Result<Self> {
        let label = label.trim().to_ascii_lowercase();
        match label.as_str() {
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "l1" => return Ok(Self::Latin1),
            "us-ascii" | "ascii" => return Ok(Self::Ascii),
            _ => {}
        }
        match Encoding::for_label(label.as_bytes()) {
            // The "replacement" encoding decodes every input to U+FFFD.
            Some(encoding) if encoding != encoding_rs::REPLACEMENT => Ok(Self::Whatwg(encoding)),
            _ => Err(VectorError::configuration(format!("unsupported text encoding: {label:?}"))),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Whatwg(encoding) => encoding.name(),
            Self::Latin1 => "ISO-8859-1",
            Self::Ascii => "US-ASCII",
        }
    }
}

/// Sequential line reader over an embedding file.
pub struct LineReader {
    path: PathBuf,
    reader: BufReader<File>,
    encoding: TextEncoding,
    /// `None` for the byte-per-char encodings handled here.
    decoder: Option<Decoder>,
    /// Decoded text not yet handed out; lines start at `start`.
    pending: String,
    start: usize,
    eof: bool,
    line_number: usize,
}

impl LineReader {
    pub fn open(path: &Path, encoding: TextEncoding) -> Result<Self> {
        let file = File::open(path).map_err(|e| VectorError::io(path, e))?;
        let decoder = match encoding {
            // new_decoder sniffs and strips a UTF-8 or UTF-16 BOM.
            TextEncoding::Whatwg(encoding) => Some(encoding.new_decoder()),
            TextEncoding::Latin1 | TextEncoding::Ascii => None,
        };
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            encoding,
            decoder,
            pending: String::new(),
            start: 0,
            eof: false,
            line_number: 0,
        })
    }

    /// Read the next line into `out` with its line terminator removed.
    ///
    /// Returns the 1-based line number, or `None` at end of file.
    pub fn read_line(&mut self, out: &mut String) -> Result<Option<usize>> {
        out.clear();
        loop {
            let rest = &self.pending[self.start..];
            if let Some(pos) = rest.find('\n') {
                out.push_str(rest[..pos].strip_suffix('\r').unwrap_or(&rest[..pos]));
                self.start += pos + 1;
                break;
            }
            if self.eof {
                if rest.is_empty() {
                    return Ok(None);
                }
                out.push_str(rest.strip_suffix('\r').unwrap_or(rest));
                self.pending.clear();
                self.start = 0;
                break;
            }
            self.fill()?;
        }
        self.line_number += 1;
        Ok(Some(self.line_number))
    }

    /// Decode the next chunk of the file onto the end of `pending`.
    fn fill(&mut self) -> Result<()> {
        self.pending.drain(..self.start);
        self.start = 0;

        let chunk = self.reader.fill_buf().map_err(|e| VectorError::io(&self.path, e))?;
        let last = chunk.is_empty();
        let (consumed, malformed) = match (&mut self.decoder, self.encoding) {
            (Some(decoder), _) => {
                let needed = decoder
                    .max_utf8_buffer_length_without_replacement(chunk.len())
                    .unwrap_or(chunk.len() * 3);
                self.pending.reserve(needed);
                let (result, read) = decoder.decode_to_string_without_replacement(chunk, &mut self.pending, last);
                match result {
                    DecoderResult::InputEmpty | DecoderResult::OutputFull => (read, None),
                    DecoderResult::Malformed(..) => (read, Some(format!("invalid {} byte sequence", self.encoding.label()))),
                }
            }
            (None, TextEncoding::Ascii) => match chunk.iter().position(|b| !b.is_ascii()) {
                Some(pos) => {
                    self.pending.extend(chunk[..pos].iter().map(|&b| char::from(b)));
                    (pos, Some(format!("non-ascii byte 0x{:02x}", chunk[pos])))
                }
                None => {
                    self.pending.extend(chunk.iter().map(|&b| char::from(b)));
                    (chunk.len(), None)
                }
            },
            // ISO-8859-1 maps every byte to the code point of the same value.
            (None, _) => {
                self.pending.extend(chunk.iter().map(|&b| char::from(b)));
                (chunk.len(), None)
            }
        };
        self.reader.consume(consumed);

        if let Some(message) = malformed {
            let line = self.line_number + 1 + self.pending.matches('\n').count();
            return Err(VectorError::format(&self.path, line, message));
        }
        if last {
            self.eof = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_bytes(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn read_all(file: &tempfile::NamedTempFile, encoding: TextEncoding) -> Result<Vec<(usize, String)>> {
        let mut reader = LineReader::open(file.path(), encoding)?;
        let mut text = String::new();
        let mut lines = Vec::new();
        while let Some(n) = reader.read_line(&mut text)? {
            lines.push((n, text.clone()));
        }
        Ok(lines)
    }

    #[test]
    fn test_encoding_labels() {
        assert_eq!(TextEncoding::from_label("UTF-8").unwrap(), TextEncoding::UTF8);
        assert_eq!(TextEncoding::from_label(" latin1 ").unwrap(), TextEncoding::Latin1);
        assert_eq!(TextEncoding::from_label("us-ascii").unwrap(), TextEncoding::Ascii);
        assert_eq!(
            TextEncoding::from_label("shift_jis").unwrap(),
            TextEncoding::Whatwg(encoding_rs::SHIFT_JIS)
        );
        assert_eq!(TextEncoding::from_label("utf-16").unwrap().label(), "UTF-16LE");
        assert!(matches!(
            TextEncoding::from_label("klingon"),
            Err(VectorError::Configuration(_))
        ));
        assert!(matches!(
            TextEncoding::from_label("iso-2022-kr"),
            Err(VectorError::Configuration(_))
        ));
    }

    #[test]
    fn test_strips_bom_and_crlf() {
        let file = write_bytes(b"\xEF\xBB\xBFcat 1 2\r\ndog 3 4\nlast 5 6");
        let lines = read_all(&file, TextEncoding::UTF8).unwrap();
        assert_eq!(
            lines,
            vec![
                (1, "cat 1 2".to_string()),
                (2, "dog 3 4".to_string()),
                (3, "last 5 6".to_string()),
            ]
        );
    }

    #[test]
    fn test_latin1_decodes_high_bytes() {
        let file = write_bytes(b"caf\xe9 1 2\n\x80x 3 4\n");
        let lines = read_all(&file, TextEncoding::Latin1).unwrap();
        assert_eq!(lines[0].1, "café 1 2");
        // True ISO-8859-1: 0x80 is a C1 control, not the euro sign.
        assert_eq!(lines[1].1, "\u{80}x 3 4");
    }

    #[test]
    fn test_windows_1252_code_page() {
        let file = write_bytes(b"caf\xe9 1 2\n\x80uro 3 4\n");
        let encoding = TextEncoding::from_label("windows-1252").unwrap();
        let lines = read_all(&file, encoding).unwrap();
        assert_eq!(lines[0].1, "café 1 2");
        assert_eq!(lines[1].1, "€uro 3 4");
    }

    #[test]
    fn test_utf16le_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("chat 1 2\r\nété 3 4\n".encode_utf16().flat_map(|u| u.to_le_bytes()));
        let file = write_bytes(&bytes);
        let encoding = TextEncoding::from_label("utf-16le").unwrap();
        let lines = read_all(&file, encoding).unwrap();
        assert_eq!(
            lines,
            vec![(1, "chat 1 2".to_string()), (2, "été 3 4".to_string())]
        );
    }

    #[test]
    fn test_multibyte_chars_across_buffer_refills() {
        let text: String = (0..3000).map(|i| format!("wörd{i} 1 2\n")).collect();
        let file = write_bytes(text.as_bytes());
        let lines = read_all(&file, TextEncoding::UTF8).unwrap();
        assert_eq!(lines.len(), 3000);
        assert_eq!(lines[2999], (3000, "wörd2999 1 2".to_string()));
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let file = write_bytes(b"ok 1 2\ncaf\xe9 1 2\n");
        match read_all(&file, TextEncoding::UTF8) {
            Err(VectorError::Format { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        let file = write_bytes(b"caf\xc3\xa9 1 2\n");
        assert!(matches!(
            read_all(&file, TextEncoding::Ascii),
            Err(VectorError::Format { line: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(matches!(
            LineReader::open(&missing, TextEncoding::UTF8),
            Err(VectorError::Io { .. })
        ));
    }
}
