// error.rs — Error types for table loading and averaging.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the embedding table and the averager.
///
/// None of these are retried: loading is a deterministic parse of the file,
/// so the caller has to change the input or the settings first.
#[derive(Debug, Error)]
pub enum VectorError {
    /// The file could not be opened or read
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line of the file is malformed
    #[error("{}:{line}: {message}", .path.display())]
    Format {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Row storage could not be allocated
    #[error(
        "out of memory while allocating {rows} rows x {dimension} dimensions; \
         there is not enough RAM to hold this model, consider a model with a \
         smaller vocabulary or fewer dimensions"
    )]
    OutOfMemory { rows: usize, dimension: usize },

    /// Settings or call arguments do not fit together
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl VectorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, VectorError>;
