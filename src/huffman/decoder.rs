use std::convert::TryFrom;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};

use bitstream_io::{ByteRead, ByteReader, LittleEndian, Numeric};
use serde::Serialize;

use super::bitio::BitSource;
use super::codes::{code_string, decode_symbol};
use super::{build_tree, header_field, CodeTable, FrequencyTable, HuffmanError, Method, MAGIC};

const OUT_CHUNK: usize = 8192;

/// Everything in front of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
  pub method: Method,
  /// Present for Huffman streams only.
  pub frequencies: Option<FrequencyTable>,
  pub total_len: u64,
}

/// Parse and validate the header of a `tcmpr2` stream, leaving `src`
/// positioned at the first payload byte.
pub fn read_header<R: Read>(src: &mut R) -> Result<StreamHeader, HuffmanError> {
  let mut magic = [0u8; 2];
  match src.read_exact(&mut magic) {
    Ok(()) => {}
    Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Err(HuffmanError::NotTcmprStream),
    Err(e) => return Err(e.into()),
  }
  if magic != MAGIC {
    return Err(HuffmanError::NotTcmprStream);
  }

  let raw_method = header_field(read_le::<_, u8>(src), "method")?;
  let method = Method::try_from(raw_method).map_err(|_| {
    HuffmanError::MalformedHeader(format!("unknown method byte {:#04x}", raw_method))
  })?;

  let frequencies = match method {
    Method::Stored => None,
    Method::Huffman => Some(FrequencyTable::deserialize(&mut *src)?),
  };
  let total_len = header_field(read_le::<_, u64>(src), "total length")?;

  if let Some(ref freqs) = frequencies {
    if freqs.total() != total_len {
      return Err(HuffmanError::MalformedHeader(format!(
        "symbol counts add up to {} but the stream declares {} bytes",
        freqs.total(),
        total_len
      )));
    }
  }

  Ok(StreamHeader {
    method,
    frequencies,
    total_len,
  })
}

fn read_le<R: Read, N: Numeric>(src: &mut R) -> std::io::Result<N> {
  ByteReader::<_, LittleEndian>::new(src).read::<N>()
}

/// Decompress a `tcmpr2` stream from `src` into `sink`.
pub fn decompress<R: Read, W: Write>(src: R, sink: W) -> Result<(), HuffmanError> {
  let mut src = BufReader::new(src);
  let header = read_header(&mut src)?;
  log::debug!(
    "{:?} stream holding {} bytes",
    header.method,
    header.total_len
  );

  let mut sink = BufWriter::new(sink);
  match header.frequencies {
    None => copy_stored(&mut src, &mut sink, header.total_len)?,
    Some(freqs) => decode_payload(&freqs, header.total_len, &mut src, &mut sink)?,
  }
  sink.flush()?;
  Ok(())
}

fn copy_stored<R: Read, W: Write>(src: R, mut sink: W, total_len: u64) -> Result<(), HuffmanError> {
  let mut limited = src.take(total_len);
  let copied = std::io::copy(&mut limited, &mut sink)?;
  if copied != total_len {
    return Err(HuffmanError::UnexpectedEndOfStream);
  }
  Ok(())
}

/// Walk the rebuilt tree once per output byte. The declared length, not the
/// end of input, ends decoding, which drops the padding bits.
fn decode_payload<R: Read, W: Write>(
  freqs: &FrequencyTable,
  total_len: u64,
  src: R,
  mut sink: W,
) -> Result<(), HuffmanError> {
  let root = match build_tree(freqs) {
    Some(root) => root,
    None => return Ok(()),
  };

  let mut bit_src = BitSource::new(src);
  let mut chunk = Vec::with_capacity(OUT_CHUNK);
  for _ in 0..total_len {
    chunk.push(decode_symbol(&root, &mut bit_src)?);
    if chunk.len() == OUT_CHUNK {
      sink.write_all(&chunk)?;
      chunk.clear();
    }
  }
  sink.write_all(&chunk)?;
  log::debug!("Read {} payload bits", bit_src.bits_read());
  Ok(())
}

/// One row of a header dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolInfo {
  pub symbol: u8,
  pub count: u32,
  pub code: String,
}

/// A serializable summary of a stream header and the codes it implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamInfo {
  pub method: Method,
  pub total_len: u64,
  pub payload_bits: u64,
  pub symbols: Vec<SymbolInfo>,
}

impl StreamInfo {
  pub fn from_header(header: &StreamHeader) -> Self {
    let (payload_bits, symbols) = match &header.frequencies {
      Some(freqs) => match build_tree(freqs) {
        Some(root) => {
          let codes = CodeTable::derive(&root);
          let symbols = freqs
            .iter()
            .map(|(symbol, count)| SymbolInfo {
              symbol,
              count,
              code: codes.get(symbol).map(code_string).unwrap_or_default(),
            })
            .collect();
          (codes.payload_bits(freqs), symbols)
        }
        None => (0, Vec::new()),
      },
      None => (header.total_len.saturating_mul(8), Vec::new()),
    };
    Self {
      method: header.method,
      total_len: header.total_len,
      payload_bits,
      symbols,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::huffman::{compress, compress_with_rules, HuffRules};

  fn encoded(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    compress(data, &mut out).unwrap();
    out
  }

  #[test]
  fn header_reads_back_frequencies() {
    let stream = encoded(b"BCAADDDCCACACAC");
    let mut src = &stream[..];
    let header = read_header(&mut src).unwrap();
    assert_eq!(header.method, Method::Huffman);
    assert_eq!(header.total_len, 15);
    let freqs = header.frequencies.unwrap();
    assert_eq!(freqs, FrequencyTable::from_counts(vec![(b'A', 5), (b'B', 1), (b'C', 6), (b'D', 3)]));
    // only the four payload bytes remain
    assert_eq!(src.len(), 4);
  }

  #[test]
  fn trailing_bytes_are_ignored() {
    let mut stream = encoded(b"hello");
    stream.extend_from_slice(&[0xff, 0xff]);
    let mut out = Vec::new();
    decompress(&stream[..], &mut out).unwrap();
    assert_eq!(out, b"hello".to_vec());
  }

  #[test]
  fn short_stored_body_is_unexpected_end() {
    let mut stream = Vec::new();
    compress_with_rules(&b"abc"[..], &mut stream, &HuffRules::stored_fallback()).unwrap();
    stream.pop();
    let mut out = Vec::new();
    assert!(matches!(
      decompress(&stream[..], &mut out),
      Err(HuffmanError::UnexpectedEndOfStream)
    ));
  }

  #[test]
  fn header_with_empty_table_but_length_is_rejected() {
    let mut stream = MAGIC.to_vec();
    stream.push(u8::from(Method::Huffman));
    stream.extend_from_slice(&[0, 0]);
    stream.extend_from_slice(&3u64.to_le_bytes());
    let mut out = Vec::new();
    assert!(matches!(
      decompress(&stream[..], &mut out),
      Err(HuffmanError::MalformedHeader(_))
    ));
  }

  #[test]
  fn info_lists_codes() {
    let stream = encoded(b"BCAADDDCCACACAC");
    let header = read_header(&mut &stream[..]).unwrap();
    let info = StreamInfo::from_header(&header);
    assert_eq!(info.total_len, 15);
    assert_eq!(info.payload_bits, 28);
    let codes: Vec<(u8, &str)> = info
      .symbols
      .iter()
      .map(|s| (s.symbol, s.code.as_str()))
      .collect();
    assert_eq!(
      codes,
      vec![(b'A', "11"), (b'B', "100"), (b'C', "0"), (b'D', "101")]
    );

    let json = serde_json::to_string(&info).unwrap();
    assert!(json.contains("\"method\":\"Huffman\""));
    assert!(json.contains("\"total_len\":15"));
  }

  #[test]
  fn info_for_huge_stored_length_saturates() {
    let mut stream = MAGIC.to_vec();
    stream.push(u8::from(Method::Stored));
    stream.extend_from_slice(&u64::MAX.to_le_bytes());
    let header = read_header(&mut &stream[..]).unwrap();
    assert_eq!(header.total_len, u64::MAX);

    let info = StreamInfo::from_header(&header);
    assert_eq!(info.method, Method::Stored);
    assert_eq!(info.payload_bits, u64::MAX);
    assert!(info.symbols.is_empty());
  }
}
