use std::io::Read;

use bit_vec::BitVec;

use super::bitio::BitSource;
use super::{FrequencyTable, HuffmanError, Node};

/// Bit sequences assigned to each symbol of a tree, in root-to-leaf order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
  codes: Vec<Option<BitVec>>,
}

impl CodeTable {
  /// Walk the tree depth-first, appending 0 for every left edge and 1 for
  /// every right edge. A tree that is a single leaf gets the code `0`.
  pub fn derive(root: &Node) -> Self {
    let mut codes = vec![None; 256];
    match root {
      Node::Leaf { symbol, .. } => codes[*symbol as usize] = Some(BitVec::from_elem(1, false)),
      Node::Internal { .. } => Self::gen_mapping(root, BitVec::new(), &mut codes),
    }
    Self { codes }
  }

  fn gen_mapping(node: &Node, repr: BitVec, codes: &mut Vec<Option<BitVec>>) {
    match node {
      Node::Leaf { symbol, .. } => codes[*symbol as usize] = Some(repr),
      Node::Internal { left, right, .. } => {
        let mut leftrepr = repr.clone();
        leftrepr.push(false);
        Self::gen_mapping(left, leftrepr, codes);

        let mut rightrepr = repr;
        rightrepr.push(true);
        Self::gen_mapping(right, rightrepr, codes);
      }
    }
  }

  pub fn get(&self, sym: u8) -> Option<&BitVec> {
    self.codes[sym as usize].as_ref()
  }

  /// Number of symbols with a code.
  pub fn len(&self) -> usize {
    self.codes.iter().filter(|c| c.is_some()).count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn iter(&self) -> impl Iterator<Item = (u8, &BitVec)> + '_ {
    self
      .codes
      .iter()
      .enumerate()
      .filter_map(|(sym, code)| code.as_ref().map(|c| (sym as u8, c)))
  }

  /// Payload length in bits when every counted symbol is encoded with this
  /// table.
  pub fn payload_bits(&self, freqs: &FrequencyTable) -> u64 {
    freqs
      .iter()
      .map(|(sym, ct)| ct as u64 * self.get(sym).map_or(0, |c| c.len() as u64))
      .sum()
  }
}

/// Render a code as a string of `0`s and `1`s.
pub fn code_string(code: &BitVec) -> String {
  code.iter().map(|b| if b { '1' } else { '0' }).collect()
}

/// Decode one symbol by walking from `root` to a leaf, one bit per edge.
pub fn decode_symbol<R: Read>(root: &Node, bit_src: &mut BitSource<R>) -> Result<u8, HuffmanError> {
  if let Node::Leaf { symbol, .. } = root {
    bit_src.read_bit()?;
    return Ok(*symbol);
  }

  let mut node = root;
  loop {
    match node {
      Node::Leaf { symbol, .. } => return Ok(*symbol),
      Node::Internal { left, right, .. } => {
        node = if bit_src.read_bit()? { &**right } else { &**left };
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::huffman::build_tree;
  use quickcheck_macros::quickcheck;
  use std::collections::HashMap;

  fn bits(s: &str) -> BitVec {
    s.chars().map(|c| c == '1').collect()
  }

  fn codes_for(data: &[u8]) -> CodeTable {
    let freqs = FrequencyTable::from_bytes(data).unwrap();
    CodeTable::derive(&build_tree(&freqs).unwrap())
  }

  #[test]
  fn example_codes() {
    let codes = codes_for(b"BCAADDDCCACACAC");
    let answer: HashMap<u8, BitVec> = vec![
      (b'C', bits("0")),
      (b'B', bits("100")),
      (b'D', bits("101")),
      (b'A', bits("11")),
    ]
    .into_iter()
    .collect();
    assert_eq!(codes.len(), 4);
    for (sym, code) in codes.iter() {
      assert_eq!(&answer[&sym], code);
    }
    let freqs = FrequencyTable::from_bytes(b"BCAADDDCCACACAC").unwrap();
    assert_eq!(codes.payload_bits(&freqs), 28);
  }

  #[test]
  fn singleton_gets_zero_bit() {
    let codes = codes_for(b"AAAA");
    assert_eq!(codes.len(), 1);
    assert_eq!(codes.get(b'A'), Some(&bits("0")));
    assert_eq!(codes.get(b'B'), None);
  }

  #[test]
  fn renders_code_strings() {
    assert_eq!(code_string(&bits("1001")), "1001");
    assert_eq!(code_string(&BitVec::new()), "");
  }

  #[test]
  fn decodes_by_walking_tree() {
    let freqs = FrequencyTable::from_bytes(b"BCAADDDCCACACAC").unwrap();
    let root = build_tree(&freqs).unwrap();
    // A=11 B=100 C=0 D=101
    let data = [0b1110_0010u8, 0b1000_0000];
    let mut src = BitSource::new(&data[..]);
    let mut decoded = Vec::new();
    for _ in 0..4 {
      decoded.push(decode_symbol(&root, &mut src).unwrap());
    }
    assert_eq!(decoded, b"ABCD".to_vec());
    assert_eq!(src.bits_read(), 11);
  }

  #[test]
  fn decoding_past_the_end_fails() {
    let root = build_tree(&FrequencyTable::from_bytes(b"aab").unwrap()).unwrap();
    let mut src = BitSource::new(&[0u8; 0][..]);
    assert!(matches!(
      decode_symbol(&root, &mut src),
      Err(HuffmanError::UnexpectedEndOfStream)
    ));
  }

  #[quickcheck]
  fn codes_are_prefix_free(data: Vec<u8>) -> bool {
    let freqs = FrequencyTable::from_bytes(&data).unwrap();
    if freqs.len() < 2 {
      return true;
    }
    let codes = CodeTable::derive(&build_tree(&freqs).unwrap());
    let all: Vec<&BitVec> = codes.iter().map(|(_, c)| c).collect();
    for (i, a) in all.iter().enumerate() {
      for (j, b) in all.iter().enumerate() {
        if i != j && a.len() <= b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y) {
          return false;
        }
      }
    }
    codes.len() == freqs.len()
  }
}
