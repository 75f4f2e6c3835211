//! Error type of the crate. Every failure is either a fatal configuration
//! problem reported immediately or a propagated external failure, there is no
//! retry logic anywhere.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MutSimError {
    /// a parameter outside its domain, fatal for the instance being configured
    #[error("configuration error: {0}")]
    Config(String),
    /// a sequence containing a non ACGT character. The whole process call is
    /// rejected before any histogram or counter is touched.
    #[error("input error: non ACGT character in sequence at position {position}")]
    Input { position: usize },
    #[error("failed to load/read/write file: {0:?}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse the fasta/fastq file: {0}")]
    Needletail(#[from] needletail::errors::ParseError),
    #[error("json error: {0:?}")]
    Json(#[from] serde_json::Error),
}

pub type MutSimResult<T> = std::result::Result<T, MutSimError>;
