
// IMPORTANT:
// Keep ALL numeric values centralized here (repo rule: no hardcoded numeric values scattered around).

// NOTE: HOST_VERSION must stay in sync with the `version` field in Cargo.toml.
pub const HOST_VERSION: &str = "1.0.0";

pub const PLUGIN_NAME: &str = "Average Word Vector";

pub mod logging {
    pub const LOG_DIR_REL: &str = ".avg-word-vector/logs";
    pub const LOG_FILE_NAME: &str = "avg_word_vector";

    pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    pub const LOG_ROTATE_KEEP_FILES: usize = 5;
}

pub mod native_messaging {
    pub const MAX_MESSAGE_SIZE_BYTES: u32 = 128 * 1024 * 1024;
}

pub mod vectors {
    pub const DEFAULT_ENCODING: &str = "utf-8";

    /// Vocabulary size hint meaning "not known ahead of time" (two-pass load).
    pub const UNKNOWN_VOCAB_SIZE: i64 = -1;

    /// A word2vec-style header line is exactly `vocabSize dimension`.
    pub const HEADER_FIELD_COUNT: usize = 2;

    // Log loader progress every N data lines.
    pub const PROGRESS_LOG_INTERVAL_LINES: usize = 100_000;
}

pub mod output {
    pub const TOKENS_HEADER: &str = "Tokens";
    pub const TOKENS_CAPTURED_HEADER: &str = "TokensCaptured";
    pub const COMPONENT_HEADER_PREFIX: &str = "v";

    /// Leading fields before the vector components (tokenCount, matchedCount).
    pub const COUNTER_FIELDS: usize = 2;
}
