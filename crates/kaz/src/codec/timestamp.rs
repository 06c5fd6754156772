//! Delta-of-delta timestamp encoding relative to a nominal step.
//!
//! Control codes written after the block header, per sample:
//!
//! - `delta == step`: `'0'` (1 bit)
//! - `delta == previous delta`: `'10'` (2 bits)
//! - otherwise `'11'` + 2-bit selector + biased delta-of-delta:
//!   - `00`: `[-63, 64]` in 7 bits (bias 63)
//!   - `01`: `[-255, 256]` in 9 bits (bias 255)
//!   - `10`: `[-2047, 2048]` in 12 bits (bias 2047)
//!   - `11`: 32-bit two's complement, sign-extended on decode
//!
//! Delta-of-deltas outside the `i32` range are rejected by the encoder.
//!
//! The regular `'0'` path does not touch the carried previous delta; only the
//! explicit delta-of-delta path replaces it.

use super::bits::{BitReader, BitWriter};
use super::Timestamp;
use crate::error::{DecodeError, EncodeError};

/// Biased delta-of-delta fields as `(selector, width, bias)`, each covering
/// `[-bias, bias + 1]`.
const DOD_RANGES: [(u64, u32, i64); 3] = [(0b00, 7, 63), (0b01, 9, 255), (0b10, 12, 2047)];

/// Selector for the 32-bit raw delta-of-delta field.
const DOD_RAW_SELECTOR: u64 = 0b11;

/// Width of the raw delta-of-delta field.
const DOD_RAW_BITS: u32 = 32;

/// Encoder for the timestamps of one series.
#[derive(Debug, Clone)]
pub struct TimestampEncoder {
    step: i64,
    prev_ts: Timestamp,
    prev_delta: i64,
    sample: usize,
}

impl TimestampEncoder {
    /// Creates an encoder seeded with the first timestamp of the series.
    pub fn new(step: u64, first: Timestamp) -> Self {
        Self {
            step: step as i64,
            prev_ts: first,
            prev_delta: 0,
            sample: 1,
        }
    }

    /// Encodes the next timestamp.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::DeltaOutOfRange` if the delta-of-delta does not fit
    /// the 32-bit raw field. Nothing is written in that case.
    pub fn encode(
        &mut self,
        timestamp: Timestamp,
        out: &mut BitWriter,
    ) -> Result<(), EncodeError> {
        let delta = timestamp.wrapping_sub(self.prev_ts);

        if delta == self.step {
            out.write_bit(false);
        } else if delta == self.prev_delta {
            out.write_bit(true);
            out.write_bit(false);
        } else {
            let dod = delta.wrapping_sub(self.prev_delta);
            let raw = i32::try_from(dod).map_err(|_| EncodeError::DeltaOutOfRange {
                sample: self.sample,
                delta_of_delta: dod,
            })?;
            out.write_bit(true);
            out.write_bit(true);
            write_delta_of_delta(raw, out);
            self.prev_delta = delta;
        }

        self.prev_ts = timestamp;
        self.sample += 1;
        Ok(())
    }
}

fn write_delta_of_delta(dod: i32, out: &mut BitWriter) {
    let wide = i64::from(dod);
    for (selector, width, bias) in DOD_RANGES {
        if (-bias..=bias + 1).contains(&wide) {
            out.write_bits(selector, 2);
            out.write_bits((wide + bias) as u64, width);
            return;
        }
    }
    out.write_bits(DOD_RAW_SELECTOR, 2);
    out.write_bits(u64::from(dod as u32), DOD_RAW_BITS);
}

/// Decoder mirroring [`TimestampEncoder`].
#[derive(Debug, Clone)]
pub struct TimestampDecoder {
    step: i64,
    prev_ts: Timestamp,
    prev_delta: i64,
    sample: usize,
}

impl TimestampDecoder {
    /// Creates a decoder seeded with the first timestamp of the series.
    pub fn new(step: u64, first: Timestamp) -> Self {
        Self {
            step: step as i64,
            prev_ts: first,
            prev_delta: 0,
            sample: 1,
        }
    }

    /// Decodes the next timestamp from the reader.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::UnexpectedEnd` if the stream runs out mid-sample.
    pub fn decode(&mut self, reader: &mut BitReader<'_>) -> Result<Timestamp, DecodeError> {
        let end = DecodeError::UnexpectedEnd {
            sample: self.sample,
        };

        let delta = if !reader.read_bit().ok_or(end.clone())? {
            self.step
        } else if !reader.read_bit().ok_or(end.clone())? {
            self.prev_delta
        } else {
            let dod = read_delta_of_delta(reader).ok_or(end)??;
            self.prev_delta = self.prev_delta.wrapping_add(dod);
            self.prev_delta
        };

        self.prev_ts = self.prev_ts.wrapping_add(delta);
        self.sample += 1;
        Ok(self.prev_ts)
    }
}

/// Reads a selector and its field; `None` when the stream is exhausted.
fn read_delta_of_delta(reader: &mut BitReader<'_>) -> Option<Result<i64, DecodeError>> {
    let selector = reader.read_bits(2)?;

    if selector == DOD_RAW_SELECTOR {
        let raw = reader.read_bits(DOD_RAW_BITS)?;
        return Some(Ok(i64::from(raw as u32 as i32)));
    }

    match DOD_RANGES.iter().find(|(s, _, _)| *s == selector) {
        Some(&(_, width, bias)) => {
            let raw = reader.read_bits(width)?;
            Some(Ok(raw as i64 - bias))
        }
        None => Some(Err(DecodeError::InvalidSelector { selector })),
    }
}
