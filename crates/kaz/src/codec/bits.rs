//! MSB-first bit streams used by the series codec.
//!
//! [`BitWriter`] accumulates bits into a `BitVec<u8, Msb0>` and pads the final
//! byte with zeros on [`BitWriter::finish`]. [`BitReader`] walks a byte slice in
//! the same order and reports exhaustion as `None` rather than panicking, so
//! callers can map it to the decode error that fits the stage they are in.

use bitvec::prelude::*;

/// Bit stream writer.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bits: BitVec<u8, Msb0>,
}

impl BitWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: BitVec::with_capacity(bits),
        }
    }

    /// Appends one bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Appends the low `n` bits of `value`, most significant first.
    ///
    /// # Panics
    ///
    /// Panics if `n > 64`.
    #[inline]
    pub fn write_bits(&mut self, value: u64, n: u32) {
        assert!(n <= 64, "cannot write {n} bits from a u64");
        let n = n as usize;
        self.bits
            .extend_from_bitslice(&value.view_bits::<Msb0>()[64 - n..]);
    }

    /// Number of bits written so far.
    pub fn len_bits(&self) -> usize {
        self.bits.len()
    }

    /// Flushes the trailing partial byte (zero padded) and returns the bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.bits.set_uninitialized(false);
        self.bits.into_vec()
    }
}

/// Bit stream reader over a borrowed byte buffer.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: &'a BitSlice<u8, Msb0>,
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a reader positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            bits: data.view_bits::<Msb0>(),
            pos: 0,
        }
    }

    /// Reads the next bit, or `None` once the buffer is consumed.
    #[inline]
    pub fn read_bit(&mut self) -> Option<bool> {
        let bit = *self.bits.get(self.pos)?;
        self.pos += 1;
        Some(bit)
    }

    /// Reads `n` bits MSB-first into the low bits of a `u64`.
    ///
    /// Returns `None` without consuming anything if fewer than `n` bits remain.
    ///
    /// # Panics
    ///
    /// Panics if `n > 64`.
    #[inline]
    pub fn read_bits(&mut self, n: u32) -> Option<u64> {
        assert!(n <= 64, "cannot read {n} bits into a u64");
        let n = n as usize;
        let end = self.pos.checked_add(n)?;
        let src = self.bits.get(self.pos..end)?;

        let mut value = 0u64;
        value.view_bits_mut::<Msb0>()[64 - n..].clone_from_bitslice(src);
        self.pos = end;
        Some(value)
    }

    /// Bits left to read, including any tail padding.
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    /// Current position as `(byte_index, bit_index)`, with `bit_index` in `0..8`.
    pub fn position(&self) -> (usize, u8) {
        (self.pos / 8, (self.pos % 8) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bits_msb_first() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b011, 3);
        writer.write_bits(0xA, 4);
        assert_eq!(writer.len_bits(), 8);
        assert_eq!(writer.finish(), vec![0b1011_1010]);
    }

    #[test]
    fn test_finish_pads_partial_byte_with_zeros() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b111, 3);
        assert_eq!(writer.finish(), vec![0b1110_0000]);

        assert!(BitWriter::new().finish().is_empty());
    }

    #[test]
    fn test_write_bits_ignores_high_bits() {
        let mut writer = BitWriter::new();
        writer.write_bits(0xFF, 4);
        writer.write_bits(0, 4);
        assert_eq!(writer.finish(), vec![0xF0]);
    }

    #[test]
    fn test_full_width_values() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(u64::MAX - 1, 64);
        writer.write_bits(0x1234_5678, 32);
        writer.write_bits(0, 0);
        let bytes = writer.finish();
        assert_eq!(bytes.len(), 13);

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bit(), Some(true));
        assert_eq!(reader.read_bits(64), Some(u64::MAX - 1));
        assert_eq!(reader.read_bits(32), Some(0x1234_5678));
        assert_eq!(reader.read_bits(0), Some(0));
        assert_eq!(reader.remaining(), 7);
    }

    #[test]
    fn test_reader_exhaustion() {
        let data = [0b1010_0000u8];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_bits(9), None);
        assert_eq!(reader.position(), (0, 0));

        assert_eq!(reader.read_bits(3), Some(0b101));
        assert_eq!(reader.position(), (0, 3));
        assert_eq!(reader.read_bits(5), Some(0));
        assert_eq!(reader.position(), (1, 0));
        assert_eq!(reader.read_bit(), None);
        assert_eq!(reader.read_bits(1), None);
    }

    #[test]
    fn test_empty_reader() {
        let mut reader = BitReader::new(&[]);
        assert_eq!(reader.read_bit(), None);
        assert_eq!(reader.read_bits(0), Some(0));
        assert_eq!(reader.remaining(), 0);
    }
}
