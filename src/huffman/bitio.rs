//! Single-bit reads and writes over byte streams, MSB first within each byte.

use std::io::{ErrorKind, Read, Write};

use bit_vec::BitVec;
use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use super::HuffmanError;

/// Packs bits into bytes, handing each completed byte to the wrapped writer.
pub struct BitSink<W: Write> {
  inner: BitWriter<W, BigEndian>,
  written: u64,
}

impl<W: Write> BitSink<W> {
  pub fn new(sink: W) -> Self {
    Self {
      inner: BitWriter::new(sink),
      written: 0,
    }
  }

  pub fn write_bit(&mut self, bit: bool) -> std::io::Result<()> {
    self.inner.write_bit(bit)?;
    self.written += 1;
    Ok(())
  }

  /// Append every bit of `code`, first bit first.
  pub fn write_code(&mut self, code: &BitVec) -> std::io::Result<()> {
    for bit in code.iter() {
      self.write_bit(bit)?;
    }
    Ok(())
  }

  /// Number of bits written so far, not counting padding.
  pub fn bits_written(&self) -> u64 {
    self.written
  }

  /// Zero-pad the trailing partial byte, write it, and return the writer.
  pub fn flush(mut self) -> std::io::Result<W> {
    self.inner.byte_align()?;
    let mut sink = self.inner.into_writer();
    sink.flush()?;
    Ok(sink)
  }
}

/// Pulls bits out of a byte stream one at a time.
pub struct BitSource<R: Read> {
  inner: BitReader<R, BigEndian>,
  read: u64,
}

impl<R: Read> BitSource<R> {
  pub fn new(src: R) -> Self {
    Self {
      inner: BitReader::new(src),
      read: 0,
    }
  }

  /// Fails with `UnexpectedEndOfStream` once the underlying reader runs dry.
  pub fn read_bit(&mut self) -> Result<bool, HuffmanError> {
    match self.inner.read_bit() {
      Ok(bit) => {
        self.read += 1;
        Ok(bit)
      }
      Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(HuffmanError::UnexpectedEndOfStream),
      Err(e) => Err(HuffmanError::IOError(e)),
    }
  }

  pub fn bits_read(&self) -> u64 {
    self.read
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_byte_is_zero_padded() {
    let mut sink = BitSink::new(Vec::new());
    for bit in [true, false, true].iter() {
      sink.write_bit(*bit).unwrap();
    }
    assert_eq!(sink.bits_written(), 3);
    let out = sink.flush().unwrap();
    assert_eq!(out, vec![0b1010_0000]);
  }

  #[test]
  fn full_bytes_are_emitted_in_order() {
    let mut sink = BitSink::new(Vec::new());
    let mut code = BitVec::from_bytes(&[0xde, 0xad]);
    code.push(true);
    sink.write_code(&code).unwrap();
    let out = sink.flush().unwrap();
    assert_eq!(out, vec![0xde, 0xad, 0x80]);
  }

  #[test]
  fn aligned_flush_adds_nothing() {
    let mut sink = BitSink::new(Vec::new());
    sink.write_code(&BitVec::from_bytes(&[0x5a])).unwrap();
    assert_eq!(sink.flush().unwrap(), vec![0x5a]);
  }

  #[test]
  fn reads_back_written_bits() {
    let data = [0b1100_1010u8, 0b0000_0001];
    let mut src = BitSource::new(&data[..]);
    let mut bits = Vec::new();
    for _ in 0..16 {
      bits.push(src.read_bit().unwrap() as u8);
    }
    assert_eq!(bits, vec![1, 1, 0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    assert_eq!(src.bits_read(), 16);
  }

  #[test]
  fn running_dry_is_unexpected_end() {
    let data = [0xffu8];
    let mut src = BitSource::new(&data[..]);
    for _ in 0..8 {
      assert!(src.read_bit().unwrap());
    }
    assert!(matches!(
      src.read_bit(),
      Err(HuffmanError::UnexpectedEndOfStream)
    ));
  }

  #[test]
  fn empty_source_is_unexpected_end() {
    let mut src = BitSource::new(&[0u8; 0][..]);
    assert!(matches!(
      src.read_bit(),
      Err(HuffmanError::UnexpectedEndOfStream)
    ));
  }
}
