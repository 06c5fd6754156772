//! Bundle writer.
//!
//! All series are compressed in memory before either file is created, so an
//! encoding failure leaves nothing on disk.

use super::metadata::{write_metadata, SeriesMetadata};
use super::{BundleConfig, Precision, TimeSeries, BLOCK_FRAME_SIZE};
use crate::codec::{compress, CodecId, Sample};
use crate::error::{BundleError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// A compressed block ready to be framed.
struct EncodedBlock {
    codec: CodecId,
    payload: Vec<u8>,
}

impl EncodedBlock {
    fn framed_len(&self) -> u64 {
        BLOCK_FRAME_SIZE + self.payload.len() as u64
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.codec.as_u16().to_be_bytes())?;
        writer.write_all(&(self.payload.len() as u32).to_be_bytes())?;
        writer.write_all(&self.payload)
    }
}

/// Chooses the nominal step for a series.
///
/// Uses the declared interval when present and non-zero, otherwise the average spacing
/// `(last - first) / (n - 1)`. Series with fewer than two samples, or whose
/// average spacing is not positive, get a step of 1.
pub fn detect_timestep(series: &TimeSeries) -> u64 {
    if let Some(interval) = series.interval.filter(|&i| i > 0) {
        return interval;
    }
    if series.len() < 2 {
        return 1;
    }

    let span = i128::from(series.end_time()) - i128::from(series.start_time());
    let average = span / (series.len() as i128 - 1);
    u64::try_from(average).ok().filter(|&step| step > 0).unwrap_or(1)
}

fn encode_series(series: &TimeSeries, step: u64, precision: Precision) -> Result<EncodedBlock> {
    let payload = match precision {
        Precision::Double => compress(&series.samples, step)?,
        Precision::Float => {
            let narrowed: Vec<Sample<f32>> = series
                .samples
                .iter()
                .map(|s| Sample::new(s.timestamp, s.value as f32))
                .collect();
            compress(&narrowed, step)?
        }
    };

    if u32::try_from(payload.len()).is_err() {
        return Err(BundleError::BlockTooLarge {
            series: series.name.clone(),
            len: payload.len(),
        });
    }

    Ok(EncodedBlock {
        codec: precision.codec(),
        payload,
    })
}

/// Names end up as the last metadata column; quotes and line breaks would not
/// survive a read back.
fn is_storable_name(name: &str) -> bool {
    !name.chars().any(|c| c == '"' || c.is_control())
}

/// Writes `series` as a bundle at `base_path`.
///
/// Creates `base_path.<binary_extension>` with one framed block per series and
/// `base_path.<metadata_extension>` with the metadata table. Existing files are
/// replaced.
///
/// # Arguments
///
/// * `base_path` - Path the configured extensions are appended to
/// * `series` - Series to store, in index order
/// * `config` - Extensions and value precision
///
/// # Returns
///
/// The metadata rows written to the metadata file.
///
/// # Errors
///
/// Returns `BundleError::EmptySeriesList` for an empty slice,
/// `BundleError::InvalidSeriesName` for a name containing `"` or a control
/// character, an encode or `BlockTooLarge` error if a series cannot be
/// compressed, and `Io` if either file cannot be written. None of the checks
/// before the `Io` stage touch the filesystem.
pub fn write_bundle(
    base_path: impl AsRef<Path>,
    series: &[TimeSeries],
    config: &BundleConfig,
) -> Result<Vec<SeriesMetadata>> {
    if series.is_empty() {
        return Err(BundleError::EmptySeriesList);
    }
    if let Some(bad) = series.iter().find(|ts| !is_storable_name(&ts.name)) {
        return Err(BundleError::InvalidSeriesName(bad.name.clone()));
    }
    let base_path = base_path.as_ref();

    let mut blocks = Vec::with_capacity(series.len());
    let mut rows = Vec::with_capacity(series.len());
    let mut offset = 0u64;

    for (i, ts) in series.iter().enumerate() {
        let step = detect_timestep(ts);
        let block = encode_series(ts, step, config.precision)?;
        debug!(
            "Compressed series '{}': {} samples, step {}s, {} bytes",
            ts.name,
            ts.len(),
            step,
            block.payload.len()
        );

        rows.push(SeriesMetadata {
            index: i + 1,
            offset,
            start_time: ts.start_time(),
            end_time: ts.end_time(),
            timestep: step,
            length: ts.len(),
            series_name: ts.name.clone(),
        });
        offset += block.framed_len();
        blocks.push(block);
    }

    let binary_path = config.binary_path(base_path);
    let mut writer = BufWriter::new(File::create(&binary_path)?);
    for block in &blocks {
        block.write_to(&mut writer)?;
    }
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    let metadata_path = config.metadata_path(base_path);
    let mut writer = BufWriter::new(File::create(&metadata_path)?);
    write_metadata(&mut writer, &rows)?;
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    debug!(
        "Wrote {} series to {} ({} bytes) and {}",
        rows.len(),
        binary_path.display(),
        offset,
        metadata_path.display()
    );

    Ok(rows)
}

/// Writes `series` with the default configuration (`.kaz` / `.kai`, `f32`
/// values).
///
/// # Errors
///
/// See [`write_bundle`].
pub fn write_series(
    base_path: impl AsRef<Path>,
    series: &[TimeSeries],
) -> Result<Vec<SeriesMetadata>> {
    write_bundle(base_path, series, &BundleConfig::default())
}
