//! Two-file bundle format for collections of compressed series.
//!
//! A bundle written to base path `P` consists of:
//!
//! - `P.kaz`: compressed blocks, back to back, each framed as
//!   `codec_id: u16 BE | length: u32 BE | payload`
//! - `P.kai`: a comma separated metadata table with one row per series
//!   (index, byte offset of the block, start/end time, nominal step, point
//!   count, name)
//!
//! The metadata table is enough to seek straight to any one series.
//!
//! # Example
//!
//! ```rust,ignore
//! use kaz::bundle::{write_bundle, BundleConfig, BundleReader, Precision, TimeSeries};
//!
//! let flow = TimeSeries::from_points("flow", &[(1_577_836_800, 1.0), (1_577_923_200, 2.5)]);
//! let config = BundleConfig::default().with_precision(Precision::Double);
//! write_bundle("/data/run1", &[flow], &config)?;
//!
//! let reader = BundleReader::open("/data/run1", &config)?;
//! let flow = reader.read_series("flow")?;
//! ```

pub mod metadata;
pub mod reader;
pub mod writer;

pub use metadata::{
    format_timestamp, parse_metadata, parse_timestamp, read_metadata, write_metadata, SeriesInfo,
    SeriesMetadata,
};
pub use reader::{read_all_series, read_series, series_info, BundleReader};
pub use writer::{detect_timestep, write_bundle, write_series};

use crate::codec::{CodecId, Sample, Timestamp};
use std::path::{Path, PathBuf};

/// Default extension of the binary block file.
pub const BINARY_EXTENSION: &str = "kaz";

/// Default extension of the metadata table.
pub const METADATA_EXTENSION: &str = "kai";

/// Size of the `codec_id | length` frame in front of every block.
pub const BLOCK_FRAME_SIZE: u64 = 6;

/// Value precision used when writing a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// Store values as `f64` (codec 0), lossless.
    Double,
    /// Store values as `f32` (codec 1).
    #[default]
    Float,
}

impl Precision {
    /// Returns the codec identifier written for this precision.
    pub fn codec(self) -> CodecId {
        match self {
            Self::Double => CodecId::Double,
            Self::Float => CodecId::Float,
        }
    }
}

/// Configuration for bundle reading and writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleConfig {
    /// Extension appended to the base path for the binary file.
    pub binary_extension: String,
    /// Extension appended to the base path for the metadata file.
    pub metadata_extension: String,
    /// Precision used for writing.
    pub precision: Precision,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            binary_extension: BINARY_EXTENSION.to_string(),
            metadata_extension: METADATA_EXTENSION.to_string(),
            precision: Precision::default(),
        }
    }
}

impl BundleConfig {
    /// Creates a new configuration with custom extensions.
    pub fn new(
        binary_extension: impl Into<String>,
        metadata_extension: impl Into<String>,
        precision: Precision,
    ) -> Self {
        Self {
            binary_extension: binary_extension.into(),
            metadata_extension: metadata_extension.into(),
            precision,
        }
    }

    /// Sets the write precision.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Path of the binary file for `base_path`.
    pub fn binary_path(&self, base_path: impl AsRef<Path>) -> PathBuf {
        append_extension(base_path.as_ref(), &self.binary_extension)
    }

    /// Path of the metadata file for `base_path`.
    pub fn metadata_path(&self, base_path: impl AsRef<Path>) -> PathBuf {
        append_extension(base_path.as_ref(), &self.metadata_extension)
    }
}

/// Appends `.ext` without replacing an existing extension, so `run.v2` becomes
/// `run.v2.kaz`.
fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}

/// A named series as stored in a bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// Series name, written as the last metadata column.
    pub name: String,
    /// Samples in time order.
    pub samples: Vec<Sample<f64>>,
    /// Declared regular interval in seconds, if known.
    pub interval: Option<u64>,
}

impl TimeSeries {
    /// Creates a series with no declared interval.
    pub fn new(name: impl Into<String>, samples: Vec<Sample<f64>>) -> Self {
        Self {
            name: name.into(),
            samples,
            interval: None,
        }
    }

    /// Creates a series from `(timestamp, value)` pairs.
    pub fn from_points(name: impl Into<String>, points: &[(Timestamp, f64)]) -> Self {
        Self::new(name, points.iter().map(|&p| Sample::from(p)).collect())
    }

    /// Declares the regular sampling interval.
    pub fn with_interval(mut self, seconds: u64) -> Self {
        self.interval = Some(seconds);
        self
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the series has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// First timestamp, or 0 for an empty series.
    pub fn start_time(&self) -> Timestamp {
        self.samples.first().map_or(0, |s| s.timestamp)
    }

    /// Last timestamp, or 0 for an empty series.
    pub fn end_time(&self) -> Timestamp {
        self.samples.last().map_or(0, |s| s.timestamp)
    }
}
