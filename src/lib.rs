/*! Lossless byte-stream compression with two independent codecs: a
run-length coder (`tcmpr1`) and a Huffman coder (`tcmpr2`). Each stream opens
with its codec's magic marker, so compressed files identify themselves. */

pub mod huffman;
pub mod rle;

use std::io::{BufRead, Read, Write};

use thiserror::Error;

use huffman::{HuffRules, HuffmanError};
use rle::RleError;

#[derive(Error, Debug)]
pub enum CodecError {
  #[error("Huffman codec: {0}")]
  Huffman(#[from] HuffmanError),
  #[error("Run-length codec: {0}")]
  RunLength(#[from] RleError),
  #[error("Input does not start with a known tcmpr magic marker")]
  UnknownFormat,
  #[error("File IO error: {0}")]
  IOError(#[from] std::io::Error),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Codec {
  RunLength,
  Huffman,
}

impl Codec {
  /// File extension appended to compressed output.
  pub fn extension(&self) -> &'static str {
    match self {
      Codec::RunLength => ".tv1",
      Codec::Huffman => ".tv2",
    }
  }

  pub fn magic(&self) -> &'static [u8] {
    match self {
      Codec::RunLength => &rle::MAGIC,
      Codec::Huffman => &huffman::MAGIC,
    }
  }

  /// Identify the codec that produced a stream from its first bytes.
  pub fn detect(prefix: &[u8]) -> Option<Codec> {
    [Codec::RunLength, Codec::Huffman]
      .iter()
      .copied()
      .find(|c| prefix.starts_with(c.magic()))
  }
}

pub fn compress<R: Read, W: Write>(codec: Codec, src: R, sink: W) -> Result<(), CodecError> {
  compress_with_rules(codec, src, sink, &HuffRules::default())
}

/// Compress with `codec`; `rules` only affect the Huffman codec.
pub fn compress_with_rules<R: Read, W: Write>(
  codec: Codec,
  src: R,
  sink: W,
  rules: &HuffRules,
) -> Result<(), CodecError> {
  match codec {
    Codec::RunLength => rle::compress(src, sink)?,
    Codec::Huffman => huffman::compress_with_rules(src, sink, rules)?,
  }
  Ok(())
}

pub fn decompress<R: Read, W: Write>(codec: Codec, src: R, sink: W) -> Result<(), CodecError> {
  match codec {
    Codec::RunLength => rle::decompress(src, sink)?,
    Codec::Huffman => huffman::decompress(src, sink)?,
  }
  Ok(())
}

/// Decompress a stream, picking the codec from its magic marker. The marker
/// is peeked from the buffer, so nothing is consumed before dispatch.
pub fn decompress_detected<R: BufRead, W: Write>(mut src: R, sink: W) -> Result<Codec, CodecError> {
  let codec = Codec::detect(src.fill_buf()?).ok_or(CodecError::UnknownFormat)?;
  decompress(codec, src, sink)?;
  Ok(codec)
}
