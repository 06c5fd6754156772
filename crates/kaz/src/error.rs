//! Error and Result types for the codec and the bundle format.

use std::io;
use thiserror::Error;

/// A convenience `Result` type for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;

/// The error type for series compression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The sample count does not fit the 32-bit count field of the block header.
    #[error("Too many samples for one block: {count} (max {max})", max = u32::MAX)]
    TooManySamples {
        /// Number of samples in the rejected series.
        count: usize,
    },

    /// A delta-of-delta does not fit the 32-bit raw timestamp field.
    #[error("Delta-of-delta {delta_of_delta} at sample {sample} exceeds the 32-bit field")]
    DeltaOutOfRange {
        /// Zero-based index of the offending sample.
        sample: usize,
        /// The unrepresentable delta-of-delta.
        delta_of_delta: i64,
    },
}

/// The error type for series decompression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// One of the fixed header fields could not be read.
    #[error("Invalid header")]
    InvalidHeader,

    /// The bit stream ran out while decoding a sample.
    #[error("Unexpected end of data at sample {sample}")]
    UnexpectedEnd {
        /// Zero-based index of the sample being decoded.
        sample: usize,
    },

    /// A delta-of-delta selector outside the known set.
    #[error("Invalid delta-of-delta selector: {selector}")]
    InvalidSelector {
        /// The raw selector value.
        selector: u64,
    },

    /// A compact XOR field describes more bits than the value width holds.
    #[error("Invalid value encoding: {leading} leading zeros + {meaningful} meaningful bits")]
    InvalidValueEncoding {
        /// Decoded leading-zero count.
        leading: u32,
        /// Decoded meaningful-bit count.
        meaningful: u32,
    },

    /// The text form was not valid base64.
    #[error("Base64 decode error: {0}")]
    Text(#[from] base64::DecodeError),
}

/// The error type for bundle file operations.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Nothing to write.
    #[error("No series data to write")]
    EmptySeriesList,

    /// Requested series was not found in the metadata file.
    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    /// A block carries a codec identifier this crate does not know.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(u16),

    /// A series name the metadata table cannot store.
    #[error("Invalid series name {0:?}: quotes and control characters are not allowed")]
    InvalidSeriesName(String),

    /// A block frame points past the end of the binary file.
    #[error("Block for series '{series}' ends at byte {end}, past the end of the file ({file_len} bytes)")]
    BlockOutOfBounds {
        /// Name of the series being read.
        series: String,
        /// Byte offset just past the block as declared.
        end: u64,
        /// Actual length of the binary file.
        file_len: u64,
    },

    /// A compressed block does not fit the 32-bit length field.
    #[error("Compressed block for series '{series}' is too large: {len} bytes")]
    BlockTooLarge {
        /// Name of the offending series.
        series: String,
        /// Compressed length in bytes.
        len: usize,
    },

    /// Malformed metadata file.
    #[error("Metadata error at line {line}: {message}")]
    Metadata {
        /// 1-based line number in the metadata file.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// Compression of a series failed.
    #[error("Compression error: {0}")]
    Encode(#[from] EncodeError),

    /// Decompression of a stored series failed.
    #[error("Decompression error in series '{series}': {source}")]
    Decode {
        /// Name of the series being read.
        series: String,
        /// The underlying decode error.
        #[source]
        source: DecodeError,
    },

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
