//! Whole-series compression and decompression.

use super::bits::{BitReader, BitWriter};
use super::timestamp::{TimestampDecoder, TimestampEncoder};
use super::value::{ValueDecoder, ValueEncoder};
use super::{Sample, Timestamp, ValueWidth};
use crate::error::{DecodeError, EncodeError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Width of the nominal step header field.
const STEP_BITS: u32 = 64;
/// Width of the sample count header field.
const COUNT_BITS: u32 = 32;
/// Width of the first timestamp header field.
const TIMESTAMP_BITS: u32 = 64;

/// A decoded series together with the nominal step stored in its header.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSeries<F> {
    /// Nominal step in seconds.
    pub step: u64,
    /// Decoded samples in stored order.
    pub samples: Vec<Sample<F>>,
}

/// Compresses a series using `step` as the nominal sampling interval.
///
/// An empty series compresses to an empty byte vector.
///
/// # Example
///
/// ```
/// use kaz::codec::{compress, decompress, Sample};
///
/// let series = vec![Sample::new(1000, 1.0_f64), Sample::new(2000, 2.0)];
/// let bytes = compress(&series, 1000).unwrap();
/// let decoded: Vec<Sample<f64>> = decompress(&bytes).unwrap();
/// assert_eq!(decoded, series);
/// ```
///
/// # Errors
///
/// Returns `EncodeError::TooManySamples` if the series has more than
/// `u32::MAX` samples and `EncodeError::DeltaOutOfRange` if two consecutive
/// deltas differ by more than the 32-bit delta-of-delta field holds.
pub fn compress<F: ValueWidth>(series: &[Sample<F>], step: u64) -> Result<Vec<u8>, EncodeError> {
    let Some(first) = series.first() else {
        return Ok(Vec::new());
    };
    let count = u32::try_from(series.len()).map_err(|_| EncodeError::TooManySamples {
        count: series.len(),
    })?;

    let header_bits = (STEP_BITS + COUNT_BITS + TIMESTAMP_BITS + F::BITS) as usize;
    let mut out = BitWriter::with_capacity(header_bits + series.len() * 2);

    out.write_bits(step, STEP_BITS);
    out.write_bits(u64::from(count), COUNT_BITS);
    out.write_bits(first.timestamp as u64, TIMESTAMP_BITS);
    out.write_bits(first.value.to_raw(), F::BITS);

    let mut timestamps = TimestampEncoder::new(step, first.timestamp);
    let mut values = ValueEncoder::new(first.value);
    for sample in &series[1..] {
        timestamps.encode(sample.timestamp, &mut out)?;
        values.encode(sample.value, &mut out);
    }

    Ok(out.finish())
}

/// Decompresses a block produced by [`compress`] with the same value width.
///
/// # Errors
///
/// Returns `DecodeError::InvalidHeader` if the fixed header is truncated or
/// declares zero samples, and `DecodeError::UnexpectedEnd` if the body ends
/// before all samples are read.
pub fn decompress<F: ValueWidth>(data: &[u8]) -> Result<Vec<Sample<F>>, DecodeError> {
    decompress_with_step(data).map(|decoded| decoded.samples)
}

/// Like [`decompress`], also returning the nominal step stored in the header.
///
/// An empty input decodes to an empty series with a step of 0.
///
/// # Errors
///
/// See [`decompress`].
pub fn decompress_with_step<F: ValueWidth>(data: &[u8]) -> Result<DecodedSeries<F>, DecodeError> {
    if data.is_empty() {
        return Ok(DecodedSeries {
            step: 0,
            samples: Vec::new(),
        });
    }

    let mut reader = BitReader::new(data);
    let mut header = |bits| reader.read_bits(bits).ok_or(DecodeError::InvalidHeader);
    let step = header(STEP_BITS)?;
    let count = header(COUNT_BITS)? as usize;
    if count == 0 {
        return Err(DecodeError::InvalidHeader);
    }
    let first_ts = header(TIMESTAMP_BITS)? as Timestamp;
    let first_bits = header(F::BITS)?;

    // Every sample after the first costs at least two bits.
    let capacity = count.min(reader.remaining() / 2 + 1);
    let mut samples = Vec::with_capacity(capacity);
    samples.push(Sample::new(first_ts, F::from_raw(first_bits)));

    let mut timestamps = TimestampDecoder::new(step, first_ts);
    let mut values = ValueDecoder::<F>::new(first_bits);
    for _ in 1..count {
        let timestamp = timestamps.decode(&mut reader)?;
        let value = values.decode(&mut reader)?;
        samples.push(Sample::new(timestamp, value));
    }

    Ok(DecodedSeries { step, samples })
}

/// Compresses a series and encodes the block as standard padded base64.
///
/// # Errors
///
/// See [`compress`].
pub fn compress_to_text<F: ValueWidth>(
    series: &[Sample<F>],
    step: u64,
) -> Result<String, EncodeError> {
    compress(series, step).map(|bytes| STANDARD.encode(bytes))
}

/// Decodes base64 text produced by [`compress_to_text`] and decompresses it.
///
/// # Errors
///
/// Returns `DecodeError::Text` for invalid base64, otherwise see [`decompress`].
pub fn decompress_from_text<F: ValueWidth>(text: &str) -> Result<Vec<Sample<F>>, DecodeError> {
    let bytes = STANDARD.decode(text.trim())?;
    decompress(&bytes)
}
