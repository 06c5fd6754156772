//! Kaz - compressed time series bundles
//!
//! This crate provides a Gorilla-style codec for `(timestamp, value)` series
//! and a two-file bundle format for storing many named series together.
//!
//! # Components
//!
//! - [`codec`]: delta-of-delta timestamps and XOR values, for `f64` and `f32`
//! - [`bundle`]: `.kaz` block file plus `.kai` metadata table, with random
//!   access by series name
//!
//! # Example
//!
//! ```rust,ignore
//! use kaz::bundle::{read_series, write_series, TimeSeries};
//!
//! let flow = TimeSeries::from_points("flow", &[(1_577_836_800, 1.0), (1_577_923_200, 2.5)])
//!     .with_interval(86_400);
//! write_series("/data/run1", &[flow])?;
//!
//! let flow = read_series("/data/run1", "flow")?;
//! assert_eq!(flow.len(), 2);
//! ```

#![deny(missing_docs)]

pub mod bundle;
pub mod codec;
pub mod error;

pub use bundle::{BundleConfig, BundleReader, Precision, SeriesInfo, SeriesMetadata, TimeSeries};
pub use codec::{compress, decompress, CodecId, Sample, Timestamp, ValueWidth};
pub use error::{BundleError, DecodeError, EncodeError, Result};
