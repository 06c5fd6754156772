//! Gorilla-style series codec.
//!
//! A compressed block is laid out as:
//!
//! ```text
//! nominal_step     64 bits
//! sample_count     32 bits
//! first_timestamp  64 bits
//! first_value      32 or 64 bits (raw IEEE-754 pattern)
//! per sample:      timestamp bits (see `timestamp`) then value bits (see `value`)
//! padding          0-7 zero bits up to the next byte boundary
//! ```
//!
//! Both value widths share one implementation, selected by the [`ValueWidth`]
//! trait implemented for `f32` and `f64`.

pub mod bits;
pub mod series;
pub mod timestamp;
pub mod value;

pub use bits::{BitReader, BitWriter};
pub use series::{
    compress, compress_to_text, decompress, decompress_from_text, decompress_with_step,
    DecodedSeries,
};
pub use timestamp::{TimestampDecoder, TimestampEncoder};
pub use value::{ValueDecoder, ValueEncoder};

/// Timestamp in seconds since the Unix epoch.
pub type Timestamp = i64;

/// A single `(timestamp, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<F> {
    /// Sample time in seconds.
    pub timestamp: Timestamp,
    /// Sample value.
    pub value: F,
}

impl<F> Sample<F> {
    /// Creates a new sample.
    pub fn new(timestamp: Timestamp, value: F) -> Self {
        Self { timestamp, value }
    }
}

impl<F: ValueWidth> Sample<F> {
    /// Compares timestamps exactly and values by raw bit pattern, so NaN payloads
    /// and signed zeros must match too.
    pub fn bitwise_eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp && self.value.to_raw() == other.value.to_raw()
    }
}

impl<F> From<(Timestamp, F)> for Sample<F> {
    fn from((timestamp, value): (Timestamp, F)) -> Self {
        Self { timestamp, value }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A floating point type the codec can store, viewed as its raw bit pattern.
///
/// The pattern is carried zero-extended in a `u64`; only the low `BITS` bits
/// are meaningful.
pub trait ValueWidth: Copy + sealed::Sealed {
    /// Width of the raw pattern in bits.
    const BITS: u32;
    /// Codec identifier written in front of blocks of this width.
    const CODEC: CodecId;

    /// Reinterprets the value as its raw bits.
    fn to_raw(self) -> u64;
    /// Reinterprets the low `BITS` bits as a value.
    fn from_raw(raw: u64) -> Self;
}

impl ValueWidth for f64 {
    const BITS: u32 = 64;
    const CODEC: CodecId = CodecId::Double;

    #[inline]
    fn to_raw(self) -> u64 {
        self.to_bits()
    }

    #[inline]
    fn from_raw(raw: u64) -> Self {
        f64::from_bits(raw)
    }
}

impl ValueWidth for f32 {
    const BITS: u32 = 32;
    const CODEC: CodecId = CodecId::Float;

    #[inline]
    fn to_raw(self) -> u64 {
        u64::from(self.to_bits())
    }

    #[inline]
    fn from_raw(raw: u64) -> Self {
        f32::from_bits(raw as u32)
    }
}

/// Codec identifier stored as a big-endian `u16` before each bundle block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CodecId {
    /// 64-bit (`f64`) value codec.
    Double = 0,
    /// 32-bit (`f32`) value codec.
    Float = 1,
}

impl CodecId {
    /// Creates a CodecId from its wire value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Double),
            1 => Some(Self::Float),
            _ => None,
        }
    }

    /// Returns the wire value.
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}
