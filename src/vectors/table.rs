// table.rs — Word-vector table: word → row index map plus a row-major matrix.
//
// Two load strategies:
// - Known vocabulary size: allocate all rows up front, read the file once.
// - Unknown vocabulary size: first pass maps words and counts rows without
//   storing vectors, second pass fills a matrix allocated at the exact size.
// Either way the matrix is allocated once and never copied or grown, so a
// multi-GB model is never held in memory twice.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use super::error::{Result, VectorError};
use super::line;
use super::settings::{LoadSettings, VocabularySize};
use super::text::LineReader;
use crate::config;

/// Which load strategy built a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadMode {
    SinglePass,
    TwoPass,
}

/// Summary reported to the front end after a load.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStats {
    pub dimension: usize,
    pub rows: usize,
    pub words: usize,
    pub duplicate_lines: usize,
    pub mode: LoadMode,
    pub approx_bytes: usize,
}

/// Returned by `EmbeddingTable::release`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseStats {
    pub rows: usize,
    pub words: usize,
    pub freed_bytes: usize,
}

/// Pretrained word embeddings, immutable once loaded.
///
/// Row `i` holds the vector of the word mapped to `i`. When a word appears on
/// several lines the first line wins; later lines still take up a row (left
/// zero-filled) so row indices follow data-line order.
#[derive(Debug)]
pub struct EmbeddingTable {
    dimension: usize,
    rows: Vec<f64>,
    row_count: usize,
    word_index: HashMap<String, usize>,
    duplicate_lines: usize,
    mode: LoadMode,
}

impl EmbeddingTable {
    /// Load a table, choosing the strategy from `settings.vocab_size`.
    pub fn load(settings: &LoadSettings) -> Result<Self> {
        if settings.dimension == 0 {
            return Err(VectorError::configuration("dimension must be positive"));
        }

        let started = Instant::now();
        log::info!(
            "Loading word vectors from {} (encoding={}, dims={}, vocab={:?})",
            settings.path.display(),
            settings.encoding.label(),
            settings.dimension,
            settings.vocab_size,
        );

        let table = match settings.vocab_size {
            VocabularySize::Known(capacity) => Self::load_single_pass(settings, capacity)?,
            VocabularySize::Unknown => Self::load_two_pass(settings)?,
        };

        log::info!(
            "Loaded {} words into {} rows ({:?}, {} duplicate lines, ~{} MiB) in {:.2?}",
            table.word_count(),
            table.len(),
            table.mode(),
            table.duplicate_lines(),
            table.approx_bytes() / (1024 * 1024),
            started.elapsed(),
        );
        if table.is_empty() {
            log::warn!("No word vectors found in {}", settings.path.display());
        }
        Ok(table)
    }

    fn load_single_pass(settings: &LoadSettings, capacity: usize) -> Result<Self> {
        let path = settings.path.as_path();
        let dimension = settings.dimension;

        let mut rows = allocate_rows(capacity, dimension)?;
        let mut word_index: HashMap<String, usize> = HashMap::new();
        word_index.try_reserve(capacity).map_err(|_| VectorError::OutOfMemory {
            rows: capacity,
            dimension,
        })?;

        let mut reader = LineReader::open(path, settings.encoding)?;
        let mut text = String::new();
        let mut cursor = 0;
        let mut duplicate_lines = 0;

        while let Some(line_no) = reader.read_line(&mut text)? {
            let line = text.trim_end();
            if line_no == 1 && settings.header.skips(line) {
                note_header(line, settings);
                continue;
            }
            if line.is_empty() {
                continue;
            }
            if cursor >= capacity {
                return Err(VectorError::format(
                    path,
                    line_no,
                    format!("more data lines than the declared vocabulary size of {capacity}"),
                ));
            }

            let row = &mut rows[cursor * dimension..(cursor + 1) * dimension];
            let word = line::parse_row(line, row).map_err(|msg| VectorError::format(path, line_no, msg))?;
            if word_index.contains_key(word) {
                row.fill(0.0);
                duplicate_lines += 1;
                log::debug!("Duplicate word {:?} at line {} ignored", word, line_no);
            } else {
                word_index.insert(word.to_owned(), cursor);
            }

            cursor += 1;
            log_progress(cursor);
        }

        if cursor < capacity {
            log::info!(
                "File holds {} data lines, fewer than the declared {}; unused rows dropped",
                cursor,
                capacity
            );
        }
        // Truncate only: shrinking would reallocate and copy the matrix.
        rows.truncate(cursor * dimension);

        Ok(Self {
            dimension,
            rows,
            row_count: cursor,
            word_index,
            duplicate_lines,
            mode: LoadMode::SinglePass,
        })
    }

    fn load_two_pass(settings: &LoadSettings) -> Result<Self> {
        let words = index_words(settings)?;
        log::info!(
            "Pass 1 complete: {} data lines, {} distinct words",
            words.row_count,
            words.index.len()
        );

        let rows = fill_rows(settings, &words.index, words.row_count)?;
        log::info!("Pass 2 complete: {} rows filled", words.row_count);

        Ok(Self {
            dimension: settings.dimension,
            rows,
            row_count: words.row_count,
            word_index: words.index,
            duplicate_lines: words.duplicate_lines,
            mode: LoadMode::TwoPass,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of rows, including rows taken by duplicate lines.
    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Number of distinct words.
    pub fn word_count(&self) -> usize {
        self.word_index.len()
    }

    pub fn duplicate_lines(&self) -> usize {
        self.duplicate_lines
    }

    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    /// Row index of `word` (exact, case-sensitive).
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.word_index.get(word).copied()
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.row_count {
            return None;
        }
        Some(&self.rows[index * self.dimension..(index + 1) * self.dimension])
    }

    /// Vector of `word` (exact, case-sensitive).
    pub fn lookup(&self, word: &str) -> Option<&[f64]> {
        self.index_of(word).and_then(|i| self.row(i))
    }

    pub fn approx_bytes(&self) -> usize {
        let matrix = self.rows.capacity() * std::mem::size_of::<f64>();
        let index: usize = self
            .word_index
            .keys()
            .map(|k| k.capacity() + std::mem::size_of::<(String, usize)>())
            .sum();
        matrix + index
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            dimension: self.dimension,
            rows: self.row_count,
            words: self.word_index.len(),
            duplicate_lines: self.duplicate_lines,
            mode: self.mode,
            approx_bytes: self.approx_bytes(),
        }
    }

    /// Tear the table down and hand its memory back to the allocator.
    pub fn release(self) -> ReleaseStats {
        let stats = ReleaseStats {
            rows: self.row_count,
            words: self.word_index.len(),
            freed_bytes: self.approx_bytes(),
        };
        drop(self);
        log::info!(
            "Released embedding table ({} rows, ~{} MiB)",
            stats.rows,
            stats.freed_bytes / (1024 * 1024)
        );
        stats
    }
}

/// Pass 1 of a two-pass load: word → row map, no vectors.
struct WordIndex {
    index: HashMap<String, usize>,
    row_count: usize,
    duplicate_lines: usize,
}

fn index_words(settings: &LoadSettings) -> Result<WordIndex> {
    let path = settings.path.as_path();
    let mut words = WordIndex {
        index: HashMap::new(),
        row_count: 0,
        duplicate_lines: 0,
    };

    let mut reader = LineReader::open(path, settings.encoding)?;
    let mut text = String::new();
    while let Some(line_no) = reader.read_line(&mut text)? {
        let line = text.trim_end();
        if line.is_empty() {
            continue;
        }
        let word = line::parse_word(line, settings.dimension).map_err(|msg| VectorError::format(path, line_no, msg))?;
        if words.index.contains_key(word) {
            words.duplicate_lines += 1;
        } else {
            words.index.insert(word.to_owned(), words.row_count);
        }
        words.row_count += 1;
        log_progress(words.row_count);
    }
    Ok(words)
}

/// Pass 2 of a two-pass load: fill an exactly-sized matrix for the words
/// mapped by pass 1. The file must still hold the same data lines.
fn fill_rows(settings: &LoadSettings, word_index: &HashMap<String, usize>, row_count: usize) -> Result<Vec<f64>> {
    let path = settings.path.as_path();
    let dimension = settings.dimension;
    let mut rows = allocate_rows(row_count, dimension)?;

    let mut reader = LineReader::open(path, settings.encoding)?;
    let mut text = String::new();
    let mut cursor = 0;
    let mut last_line = 0;

    while let Some(line_no) = reader.read_line(&mut text)? {
        last_line = line_no;
        let line = text.trim_end();
        if line.is_empty() {
            continue;
        }
        if cursor >= row_count {
            return Err(changed_between_passes(path, line_no));
        }

        let row = &mut rows[cursor * dimension..(cursor + 1) * dimension];
        let word = line::parse_row(line, row).map_err(|msg| VectorError::format(path, line_no, msg))?;
        match word_index.get(word) {
            Some(&index) if index == cursor => {}
            // A later duplicate: the first occurrence owns the word.
            Some(_) => row.fill(0.0),
            None => return Err(changed_between_passes(path, line_no)),
        }
        cursor += 1;
    }

    if cursor != row_count {
        return Err(changed_between_passes(path, last_line));
    }
    Ok(rows)
}

/// Zero-filled `rows x dimension` matrix, or `OutOfMemory` if it can't be reserved.
fn allocate_rows(rows: usize, dimension: usize) -> Result<Vec<f64>> {
    let oom = || VectorError::OutOfMemory { rows, dimension };
    let len = rows.checked_mul(dimension).ok_or_else(oom)?;
    let mut matrix = Vec::new();
    matrix.try_reserve_exact(len).map_err(|_| oom())?;
    matrix.resize(len, 0.0);
    Ok(matrix)
}

fn note_header(line: &str, settings: &LoadSettings) {
    match line::parse_header(line) {
        Some((vocab, dimension)) => {
            log::info!("Skipping header line: vocab={}, dims={}", vocab, dimension);
            if dimension != settings.dimension {
                log::warn!(
                    "Header declares {} dimensions but {} were configured",
                    dimension,
                    settings.dimension
                );
            }
            if settings.vocab_size != VocabularySize::Known(vocab) {
                log::warn!(
                    "Header declares {} words but the configured vocabulary size is {:?}",
                    vocab,
                    settings.vocab_size
                );
            }
        }
        None => log::warn!("First line skipped as a header but is not one: {:?}", line),
    }
}

fn changed_between_passes(path: &Path, line_no: usize) -> VectorError {
    VectorError::format(path, line_no, "file changed between load passes")
}

fn log_progress(lines: usize) {
    if lines % config::vectors::PROGRESS_LOG_INTERVAL_LINES == 0 {
        log::debug!("... {} data lines read", lines);
    }
}
