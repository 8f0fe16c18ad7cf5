//src/error.rs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading a k-mer table or collecting reads.
///
/// Table-load and input-open failures are fatal and abort a run before any
/// worker starts. `MalformedRecord` is record-level: the run skips and counts
/// it unless corruption becomes pervasive, at which point the scheduler
/// promotes it to a fatal error for the whole run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{}:{}: malformed k-mer table entry: {}", .path.display(), .line, .reason)]
    MalformedTable {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("{}:{}: k-mer contains a base outside A/C/G/T: {:?}", .path.display(), .line, .kmer)]
    UnencodableKmer {
        path: PathBuf,
        line: u64,
        kmer: String,
    },

    #[error("{}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: record {}: {}", .path.display(), .record, .reason)]
    MalformedRecord {
        path: PathBuf,
        record: u64,
        reason: String,
    },

    #[error("{}: {}", .path.display(), .source)]
    Bam {
        path: PathBuf,
        #[source]
        source: rust_htslib::errors::Error,
    },

    #[error("mate streams out of sync at pair {pair}: {reason}")]
    PairDesync { pair: u64, reason: String },
}

impl CollectError {
    /// Attach a path to a raw I/O error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CollectError::Io {
            path: path.into(),
            source,
        }
    }

    /// Record-level errors may be skipped and counted; everything else is
    /// fatal for the run.
    pub fn is_record_level(&self) -> bool {
        matches!(self, CollectError::MalformedRecord { .. })
    }
}
