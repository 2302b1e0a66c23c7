/*! Frequency-based prefix coding (Huffman) of whole byte streams.

The tree itself is never written out: only the symbol frequencies are, and the
decoder rebuilds the identical tree from them. Ties in the merge queue are
broken by creation order, so every conforming implementation produces the same
codes from the same table.

Stream layout (integers little-endian):

   +---+---+---+=====+=======+==========+-------+=========+
   | 0x74 0 |MTH| NSYM| SYMS  |  COUNTS  | TOTAL | PAYLOAD |
   +---+---+---+=====+=======+==========+-------+=========+
     magic   u8  u16  NSYM*u8  NSYM*u32    u64   MSB-first bits,
                                                 zero padded

A stored stream (MTH = 1) carries TOTAL followed by the raw bytes instead.
*/

pub mod bitio;

mod codes;
mod decoder;
mod encoder;
mod freq;
mod tree;

pub use codes::CodeTable;
pub use decoder::{decompress, read_header, StreamHeader, StreamInfo, SymbolInfo};
pub use encoder::{compress, compress_with_rules, HuffRules};
pub use freq::FrequencyTable;
pub use tree::{build_tree, Node};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;
use thiserror::Error;

/// Marks a stream as `tcmpr2` output.
pub const MAGIC: [u8; 2] = [0x74, 0x00];

/// Bytes in a Huffman header besides the per-symbol entries: magic, method,
/// symbol count, and total length.
const FIXED_HEADER_LEN: u64 = 2 + 1 + 2 + 8;
/// Bytes in a stored header: magic, method, and total length.
const STORED_HEADER_LEN: u64 = 2 + 1 + 8;

#[derive(Error, Debug)]
pub enum HuffmanError {
  #[error("Input is not a tcmpr Huffman stream")]
  NotTcmprStream,
  #[error("Malformed stream header: {0}")]
  MalformedHeader(String),
  #[error("Encoded payload ended before all symbols were decoded")]
  UnexpectedEndOfStream,
  #[error("Symbol {0:#04x} occurs more often than a u32 count can hold")]
  SymbolCountOverflow(u8),
  #[error("No code was derived for symbol {0:#04x}")]
  MissingCode(u8),
  #[error("Other IO error: {0}")]
  IOError(#[from] std::io::Error),
}

/// How the body following the magic marker is encoded.
#[derive(Debug, Eq, PartialEq, TryFromPrimitive, IntoPrimitive, Copy, Clone, Serialize)]
#[repr(u8)]
pub enum Method {
  Huffman = 0,
  Stored = 1,
}

/// Run a header read, turning a premature end of input into a header error.
fn header_field<T>(res: std::io::Result<T>, field: &str) -> Result<T, HuffmanError> {
  res.map_err(|e| match e.kind() {
    std::io::ErrorKind::UnexpectedEof => {
      HuffmanError::MalformedHeader(format!("header ended while reading {}", field))
    }
    _ => HuffmanError::IOError(e),
  })
}
