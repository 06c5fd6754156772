//! XOR value encoding, generic over the value width.
//!
//! Each value after the first is compared with the previous one by raw bit
//! pattern:
//!
//! - identical: `'0'` (1 bit)
//! - small XOR: `'10'` + 5 bits leading zeros + 6 bits length + meaningful bits
//! - otherwise: `'11'` + the full raw pattern
//!
//! The compact form is used only when the XOR has between 5 and 31 leading
//! zeros and at most 6 meaningful bits. The upper bound keeps the leading-zero
//! count inside its 5-bit field, so 64-bit XORs confined to the low half fall
//! back to the raw form instead of being truncated.

use super::bits::{BitReader, BitWriter};
use super::ValueWidth;
use crate::error::DecodeError;
use std::marker::PhantomData;

/// Fewest leading zeros that qualify for the compact form.
const MIN_COMPACT_LEADING: u32 = 5;

/// Most leading zeros the 5-bit field can carry.
const MAX_COMPACT_LEADING: u32 = 31;

/// Most meaningful bits the compact form may carry.
const MAX_COMPACT_MEANINGFUL: u32 = 6;

const LEADING_FIELD_BITS: u32 = 5;
const MEANINGFUL_FIELD_BITS: u32 = 6;

/// Encoder for the values of one series.
#[derive(Debug, Clone)]
pub struct ValueEncoder<F> {
    prev_bits: u64,
    _width: PhantomData<F>,
}

impl<F: ValueWidth> ValueEncoder<F> {
    /// Creates an encoder seeded with the first value of the series.
    pub fn new(first: F) -> Self {
        Self {
            prev_bits: first.to_raw(),
            _width: PhantomData,
        }
    }

    /// Encodes the next value.
    pub fn encode(&mut self, value: F, out: &mut BitWriter) {
        let bits = value.to_raw();

        if bits == self.prev_bits {
            out.write_bit(false);
            return;
        }

        out.write_bit(true);
        let xor = bits ^ self.prev_bits;
        let leading = xor.leading_zeros() - (64 - F::BITS);
        let trailing = xor.trailing_zeros();
        let meaningful = F::BITS - leading - trailing;

        if (MIN_COMPACT_LEADING..=MAX_COMPACT_LEADING).contains(&leading)
            && meaningful <= MAX_COMPACT_MEANINGFUL
        {
            out.write_bit(false);
            out.write_bits(u64::from(leading), LEADING_FIELD_BITS);
            out.write_bits(u64::from(meaningful), MEANINGFUL_FIELD_BITS);
            if meaningful > 0 {
                out.write_bits(xor >> trailing, meaningful);
            }
        } else {
            out.write_bit(true);
            out.write_bits(bits, F::BITS);
        }

        self.prev_bits = bits;
    }
}

/// Decoder mirroring [`ValueEncoder`].
#[derive(Debug, Clone)]
pub struct ValueDecoder<F> {
    prev_bits: u64,
    sample: usize,
    _width: PhantomData<F>,
}

impl<F: ValueWidth> ValueDecoder<F> {
    /// Creates a decoder seeded with the raw bits of the first value.
    pub fn new(first_bits: u64) -> Self {
        Self {
            prev_bits: first_bits,
            sample: 1,
            _width: PhantomData,
        }
    }

    /// Decodes the next value from the reader.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::UnexpectedEnd` if the stream runs out mid-sample and
    /// `DecodeError::InvalidValueEncoding` if a compact field overflows the width.
    pub fn decode(&mut self, reader: &mut BitReader<'_>) -> Result<F, DecodeError> {
        let end = || DecodeError::UnexpectedEnd {
            sample: self.sample,
        };

        if reader.read_bit().ok_or_else(end)? {
            self.prev_bits = if !reader.read_bit().ok_or_else(end)? {
                let leading = reader.read_bits(LEADING_FIELD_BITS).ok_or_else(end)? as u32;
                let meaningful = reader.read_bits(MEANINGFUL_FIELD_BITS).ok_or_else(end)? as u32;
                if leading + meaningful > F::BITS {
                    return Err(DecodeError::InvalidValueEncoding {
                        leading,
                        meaningful,
                    });
                }
                if meaningful == 0 {
                    self.prev_bits
                } else {
                    let slice = reader.read_bits(meaningful).ok_or_else(end)?;
                    let trailing = F::BITS - leading - meaningful;
                    self.prev_bits ^ (slice << trailing)
                }
            } else {
                reader.read_bits(F::BITS).ok_or_else(end)?
            };
        }

        self.sample += 1;
        Ok(F::from_raw(self.prev_bits))
    }
}
