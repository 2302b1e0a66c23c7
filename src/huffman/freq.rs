use std::collections::BTreeMap;
use std::io::{Read, Write};

use bitstream_io::{ByteRead, ByteReader, ByteWrite, ByteWriter, LittleEndian};

use super::{header_field, HuffmanError};

const READ_CHUNK: usize = 8192;

/// Occurrence counts of every byte value seen in an input. Absent symbols
/// have an implicit count of zero and are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
  counts: BTreeMap<u8, u32>,
}

impl FrequencyTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Count the symbols of an entire stream.
  pub fn compute<R: Read>(mut src: R) -> Result<Self, HuffmanError> {
    let mut table = Self::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
      let n = match src.read(&mut buf) {
        Ok(0) => break,
        Ok(n) => n,
        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
        Err(e) => return Err(e.into()),
      };
      table.add_bytes(&buf[..n])?;
    }
    Ok(table)
  }

  pub fn from_bytes(data: &[u8]) -> Result<Self, HuffmanError> {
    let mut table = Self::new();
    table.add_bytes(data)?;
    Ok(table)
  }

  /// Build a table from explicit (symbol, count) pairs. Zero counts are
  /// dropped; repeated symbols keep the last count.
  pub fn from_counts<I: IntoIterator<Item = (u8, u32)>>(pairs: I) -> Self {
    let counts = pairs.into_iter().filter(|(_, ct)| *ct > 0).collect();
    Self { counts }
  }

  fn add_bytes(&mut self, data: &[u8]) -> Result<(), HuffmanError> {
    for &b in data {
      let ct = self.counts.entry(b).or_insert(0);
      *ct = ct
        .checked_add(1)
        .ok_or(HuffmanError::SymbolCountOverflow(b))?;
    }
    Ok(())
  }

  pub fn get(&self, sym: u8) -> u32 {
    self.counts.get(&sym).copied().unwrap_or(0)
  }

  /// Number of distinct symbols present.
  pub fn len(&self) -> usize {
    self.counts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.counts.is_empty()
  }

  /// Sum of all counts, i.e. the length of the counted input.
  pub fn total(&self) -> u64 {
    self.counts.values().map(|&ct| ct as u64).sum()
  }

  /// Present symbols with their counts, in ascending symbol order.
  pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
    self.counts.iter().map(|(&sym, &ct)| (sym, ct))
  }

  /// Size of the serialized table in bytes.
  pub fn serialized_len(&self) -> u64 {
    2 + 5 * self.len() as u64
  }

  /// Write the symbol count, the symbols, then their counts.
  pub fn serialize<W: Write>(&self, sink: W) -> std::io::Result<()> {
    let mut bytesout: ByteWriter<W, LittleEndian> = ByteWriter::new(sink);
    bytesout.write(self.len() as u16)?;
    let syms: Vec<u8> = self.counts.keys().copied().collect();
    bytesout.write_bytes(&syms[..])?;
    for ct in self.counts.values() {
      bytesout.write(*ct)?;
    }
    Ok(())
  }

  pub fn deserialize<R: Read>(src: R) -> Result<Self, HuffmanError> {
    let mut bytesin: ByteReader<R, LittleEndian> = ByteReader::new(src);
    let nsyms = header_field(bytesin.read::<u16>(), "symbol count")? as usize;
    if nsyms > 256 {
      return Err(HuffmanError::MalformedHeader(format!(
        "{} distinct symbols declared, at most 256 exist",
        nsyms
      )));
    }

    let mut syms = vec![0u8; nsyms];
    header_field(bytesin.read_bytes(&mut syms), "symbols")?;

    let mut counts = BTreeMap::new();
    for sym in syms {
      let ct = header_field(bytesin.read::<u32>(), "symbol counts")?;
      if ct == 0 {
        return Err(HuffmanError::MalformedHeader(format!(
          "symbol {:#04x} listed with a zero count",
          sym
        )));
      }
      if counts.insert(sym, ct).is_some() {
        return Err(HuffmanError::MalformedHeader(format!(
          "symbol {:#04x} listed twice",
          sym
        )));
      }
    }
    Ok(Self { counts })
  }
}
