//! Bundle reader.
//!
//! The metadata table is loaded once on open; blocks are read on demand by
//! seeking to the offset recorded for the series. Every block read opens its
//! own file handle, so a reader can be shared between threads.

use super::metadata::{read_metadata, SeriesInfo, SeriesMetadata};
use super::{BundleConfig, TimeSeries, BLOCK_FRAME_SIZE};
use crate::codec::{decompress_with_step, CodecId, Sample, ValueWidth};
use crate::error::{BundleError, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reader over an existing bundle.
#[derive(Debug)]
pub struct BundleReader {
    binary_path: PathBuf,
    rows: Vec<SeriesMetadata>,
}

impl BundleReader {
    /// Opens the bundle at `base_path`.
    ///
    /// # Errors
    ///
    /// Returns `BundleError::Io` if either file cannot be opened and
    /// `BundleError::Metadata` if the metadata table is malformed.
    pub fn open(base_path: impl AsRef<Path>, config: &BundleConfig) -> Result<Self> {
        let base_path = base_path.as_ref();
        let rows = read_metadata(config.metadata_path(base_path))?;
        let binary_path = config.binary_path(base_path);
        let file_len = File::open(&binary_path)?.metadata()?.len();

        debug!(
            "Opened bundle {} ({} bytes) with {} series",
            binary_path.display(),
            file_len,
            rows.len()
        );

        Ok(Self { binary_path, rows })
    }

    /// Path of the binary block file.
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Metadata rows, sorted by index.
    pub fn metadata(&self) -> &[SeriesMetadata] {
        &self.rows
    }

    /// Summaries of all series, from the metadata table alone.
    pub fn series_info(&self) -> Vec<SeriesInfo> {
        self.rows.iter().map(SeriesMetadata::info).collect()
    }

    /// Reads one series by name. With duplicate names the lowest index wins.
    ///
    /// # Errors
    ///
    /// Returns `BundleError::SeriesNotFound` if no row has this name, otherwise
    /// see [`BundleReader::read_all`].
    pub fn read_series(&self, name: &str) -> Result<TimeSeries> {
        let row = self
            .rows
            .iter()
            .find(|row| row.series_name == name)
            .ok_or_else(|| BundleError::SeriesNotFound(name.to_string()))?;
        self.read_block(row)
    }

    /// Reads every series in index order.
    ///
    /// # Errors
    ///
    /// Returns `BundleError::UnsupportedCodec` for an unknown codec identifier,
    /// `BundleError::BlockOutOfBounds` if a frame reaches past the end of the
    /// binary file, `BundleError::Decode` for a corrupt block and
    /// `BundleError::Io` if the file cannot be read.
    pub fn read_all(&self) -> Result<Vec<TimeSeries>> {
        self.rows.iter().map(|row| self.read_block(row)).collect()
    }

    fn read_block(&self, row: &SeriesMetadata) -> Result<TimeSeries> {
        let mut file = File::open(&self.binary_path)?;
        let file_len = file.metadata()?.len();
        let out_of_bounds = |end: u64| BundleError::BlockOutOfBounds {
            series: row.series_name.clone(),
            end,
            file_len,
        };

        let frame_end = row.offset.saturating_add(BLOCK_FRAME_SIZE);
        if frame_end > file_len {
            return Err(out_of_bounds(frame_end));
        }
        file.seek(SeekFrom::Start(row.offset))?;

        let mut frame = [0u8; BLOCK_FRAME_SIZE as usize];
        file.read_exact(&mut frame)?;
        let codec_id = u16::from_be_bytes([frame[0], frame[1]]);
        let len = u32::from_be_bytes([frame[2], frame[3], frame[4], frame[5]]);

        let codec = CodecId::from_u16(codec_id).ok_or(BundleError::UnsupportedCodec(codec_id))?;
        let block_end = frame_end + u64::from(len);
        if block_end > file_len {
            return Err(out_of_bounds(block_end));
        }
        let mut payload = vec![0u8; len as usize];
        file.read_exact(&mut payload)?;

        let samples = match codec {
            CodecId::Double => decode_block::<f64>(&payload, row)?,
            CodecId::Float => decode_block::<f32>(&payload, row)?
                .into_iter()
                .map(|s| Sample::new(s.timestamp, f64::from(s.value)))
                .collect(),
        };

        if samples.len() != row.length {
            warn!(
                "Series '{}' has {} samples, metadata says {}",
                row.series_name,
                samples.len(),
                row.length
            );
        }

        Ok(TimeSeries {
            name: row.series_name.clone(),
            samples,
            interval: Some(row.timestep),
        })
    }
}

fn decode_block<F: ValueWidth>(payload: &[u8], row: &SeriesMetadata) -> Result<Vec<Sample<F>>> {
    let decoded = decompress_with_step::<F>(payload).map_err(|source| BundleError::Decode {
        series: row.series_name.clone(),
        source,
    })?;
    if !payload.is_empty() && decoded.step != row.timestep {
        warn!(
            "Series '{}' block step {} differs from metadata timestep {}",
            row.series_name, decoded.step, row.timestep
        );
    }
    Ok(decoded.samples)
}

/// Reads every series of the bundle at `base_path` with the default
/// configuration.
///
/// # Errors
///
/// See [`BundleReader::open`] and [`BundleReader::read_all`].
pub fn read_all_series(base_path: impl AsRef<Path>) -> Result<Vec<TimeSeries>> {
    BundleReader::open(base_path, &BundleConfig::default())?.read_all()
}

/// Reads one series by name from the bundle at `base_path` with the default
/// configuration.
///
/// # Errors
///
/// See [`BundleReader::open`] and [`BundleReader::read_series`].
pub fn read_series(base_path: impl AsRef<Path>, name: &str) -> Result<TimeSeries> {
    BundleReader::open(base_path, &BundleConfig::default())?.read_series(name)
}

/// Lists the series of the bundle at `base_path` without decoding any block.
///
/// Only the metadata file is opened.
///
/// # Errors
///
/// See [`read_metadata`].
pub fn series_info(base_path: impl AsRef<Path>) -> Result<Vec<SeriesInfo>> {
    let path = BundleConfig::default().metadata_path(base_path);
    Ok(read_metadata(path)?.iter().map(SeriesMetadata::info).collect())
}
