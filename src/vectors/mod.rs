// vectors/ — Pretrained word-vector table and per-document averaging.
//
// Provides:
// - Word-vector text file loading (single pass or two pass)
// - Exact-match document averaging with match counters
// - Output records and column names for the front end

pub mod averager;
pub mod error;
pub mod line;
pub mod math;
pub mod settings;
pub mod table;
pub mod text;

pub use averager::{output_header, DocumentAverager};
pub use error::VectorError;
pub use settings::{LoadSettings, SettingsParams};
pub use table::EmbeddingTable;
