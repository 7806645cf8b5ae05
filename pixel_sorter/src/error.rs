// THEORY:
// Every fallible operation in the crate reports through one error type. The
// variants mirror the three failure classes of the engine: configuration
// mistakes (caught before any pixel moves), image decode/encode problems
// (recoverable per input), and I/O or worker-pool failures (fatal for the
// current invocation).

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the pixel sorting and congregation engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A sort policy name that is not one of `random semirandom h h2 v s`.
    #[error("unknown sort policy: {0:?}")]
    UnknownPolicy(String),

    /// The input bytes are not a decodable image.
    #[error("cannot decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The grid could not be encoded into the output format.
    #[error("cannot encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Reading or writing a file failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A numeric parameter outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A sort worker died or one of the pool channels closed early.
    #[error("worker pool failure: {0}")]
    WorkerPool(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
