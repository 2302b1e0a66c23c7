use std::io::{BufWriter, Read, Write};

use bitstream_io::{ByteWrite, ByteWriter, LittleEndian};

use super::bitio::BitSink;
use super::{
  build_tree, CodeTable, FrequencyTable, HuffmanError, Method, FIXED_HEADER_LEN, MAGIC,
  STORED_HEADER_LEN,
};

/// Knobs controlling how a stream is compressed.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct HuffRules {
  allow_stored: bool,
}

impl HuffRules {
  pub fn new(allow_stored: bool) -> Self {
    Self { allow_stored }
  }

  /// Rules that store the input verbatim whenever coding would not shrink it.
  pub fn stored_fallback() -> Self {
    Self::new(true)
  }

  pub fn allow_stored(&self) -> bool {
    self.allow_stored
  }
}

/// Compress everything in `src` into `sink` using Huffman coding.
pub fn compress<R: Read, W: Write>(src: R, sink: W) -> Result<(), HuffmanError> {
  compress_with_rules(src, sink, &HuffRules::default())
}

pub fn compress_with_rules<R: Read, W: Write>(
  mut src: R,
  sink: W,
  rules: &HuffRules,
) -> Result<(), HuffmanError> {
  // Codes only exist after a full pass, so hold the input for the second one.
  let mut data = Vec::new();
  src.read_to_end(&mut data)?;

  let freqs = FrequencyTable::compute(&data[..])?;
  let codes = build_tree(&freqs).map(|root| CodeTable::derive(&root));
  let payload_bits = codes.as_ref().map_or(0, |c| c.payload_bits(&freqs));
  log::debug!(
    "{} input bytes, {} distinct symbols, {} payload bits",
    data.len(),
    freqs.len(),
    payload_bits
  );
  if let Some(ref c) = codes {
    for (sym, code) in c.iter() {
      log::trace!("{:#04x} -> {:?}", sym, code);
    }
  }

  let coded_len = FIXED_HEADER_LEN + 5 * freqs.len() as u64 + (payload_bits + 7) / 8;
  let stored_len = STORED_HEADER_LEN + data.len() as u64;
  let method = if rules.allow_stored && coded_len >= stored_len {
    Method::Stored
  } else {
    Method::Huffman
  };
  log::debug!(
    "Coded size {} bytes, stored size {} bytes, writing {:?}",
    coded_len,
    stored_len,
    method
  );

  let mut sink = BufWriter::new(sink);
  {
    let mut bytesout: ByteWriter<&mut BufWriter<W>, LittleEndian> = ByteWriter::new(&mut sink);
    bytesout.write_bytes(&MAGIC)?;
    bytesout.write(u8::from(method))?;
  }

  match method {
    Method::Stored => {
      ByteWriter::<_, LittleEndian>::new(&mut sink).write(data.len() as u64)?;
      sink.write_all(&data)?;
    }
    Method::Huffman => {
      freqs.serialize(&mut sink)?;
      ByteWriter::<_, LittleEndian>::new(&mut sink).write(freqs.total())?;
      if let Some(codes) = codes {
        write_payload(&data, &codes, &mut sink)?;
      }
    }
  }
  sink.flush()?;
  Ok(())
}

/// Emit the code of every byte of `data`, in order, padded to a whole byte.
fn write_payload<W: Write>(data: &[u8], codes: &CodeTable, sink: W) -> Result<(), HuffmanError> {
  let mut bit_sink = BitSink::new(sink);
  for &b in data {
    let code = codes.get(b).ok_or(HuffmanError::MissingCode(b))?;
    bit_sink.write_code(code)?;
  }
  log::debug!("Wrote {} payload bits", bit_sink.bits_written());
  bit_sink.flush()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::huffman::decompress;

  fn compress_to_vec(data: &[u8], rules: &HuffRules) -> Vec<u8> {
    let mut out = Vec::new();
    compress_with_rules(data, &mut out, rules).unwrap();
    out
  }

  #[test]
  fn default_rules_never_store() {
    assert!(!HuffRules::default().allow_stored());
    let encoded = compress_to_vec(b"BCAADDDCCACACAC", &HuffRules::default());
    assert_eq!(encoded[2], u8::from(Method::Huffman));
  }

  #[test]
  fn small_inputs_fall_back_to_stored() {
    let data = b"BCAADDDCCACACAC";
    let encoded = compress_to_vec(data, &HuffRules::stored_fallback());
    assert_eq!(encoded[2], u8::from(Method::Stored));
    assert_eq!(encoded.len() as u64, STORED_HEADER_LEN + data.len() as u64);
    assert_eq!(&encoded[(STORED_HEADER_LEN as usize)..], &data[..]);

    let mut decoded = Vec::new();
    decompress(&encoded[..], &mut decoded).unwrap();
    assert_eq!(decoded, data.to_vec());
  }

  #[test]
  fn skewed_inputs_stay_coded() {
    let mut data = vec![b'a'; 4000];
    data.extend(b"bcd");
    let encoded = compress_to_vec(&data, &HuffRules::stored_fallback());
    assert_eq!(encoded[2], u8::from(Method::Huffman));
    assert!(encoded.len() < data.len());
  }

  #[test]
  fn missing_code_is_reported() {
    let codes = CodeTable::derive(&build_tree(&FrequencyTable::from_bytes(b"ab").unwrap()).unwrap());
    let mut out = Vec::new();
    assert!(matches!(
      write_payload(b"abc", &codes, &mut out),
      Err(HuffmanError::MissingCode(b'c'))
    ));
  }
}
