// averager.rs — Per-document mean of the word vectors found in the table.

use serde::Serialize;

use super::error::{Result, VectorError};
use super::math;
use super::table::EmbeddingTable;
use crate::config;

/// Averaged vector of one document plus match counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVector {
    pub token_count: usize,
    pub matched_count: usize,
    pub vector: Vec<f64>,
}

impl DocumentVector {
    /// Output row: token count, matched count, then each component, as text.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = Vec::with_capacity(self.vector.len() + config::output::COUNTER_FIELDS);
        record.push(self.token_count.to_string());
        record.push(self.matched_count.to_string());
        record.extend(self.vector.iter().map(|v| v.to_string()));
        record
    }
}

/// Column names matching `DocumentVector::to_record`.
///
/// Component columns are numbered from 1 and zero-padded to the width of
/// `dimension`, so 300 dimensions give `v001` .. `v300`.
pub fn output_header(dimension: usize) -> Vec<String> {
    let width = dimension.to_string().len();
    let mut header = Vec::with_capacity(dimension + config::output::COUNTER_FIELDS);
    header.push(config::output::TOKENS_HEADER.to_string());
    header.push(config::output::TOKENS_CAPTURED_HEADER.to_string());
    header.extend(
        (1..=dimension).map(|i| format!("{}{:0width$}", config::output::COMPONENT_HEADER_PREFIX, i)),
    );
    header
}

/// Averages documents against a table of the expected dimension.
///
/// Holds no reference to the table, so one averager can serve any number of
/// threads sharing the same read-only table.
#[derive(Debug, Clone, Copy)]
pub struct DocumentAverager {
    dimension: usize,
}

impl DocumentAverager {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn for_table(table: &EmbeddingTable) -> Self {
        Self::new(table.dimension())
    }

    /// Mean vector of the tokens found in `table`.
    ///
    /// Lookup is exact and case-sensitive; unknown tokens are skipped. A
    /// document with no known tokens yields a zero vector.
    pub fn average<S: AsRef<str>>(&self, document: &[S], table: &EmbeddingTable) -> Result<DocumentVector> {
        if table.dimension() != self.dimension {
            return Err(VectorError::configuration(format!(
                "table has {} dimensions but {} were expected",
                table.dimension(),
                self.dimension
            )));
        }

        let mut acc = vec![0.0f64; self.dimension];
        let mut matched_count = 0;
        for token in document {
            if let Some(row) = table.lookup(token.as_ref()) {
                math::accumulate(&mut acc, row);
                matched_count += 1;
            }
        }

        Ok(DocumentVector {
            token_count: document.len(),
            matched_count,
            vector: math::mean(&acc, matched_count),
        })
    }
}
