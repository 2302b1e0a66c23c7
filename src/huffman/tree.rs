use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::FrequencyTable;

/// A node of a Huffman tree. Internal nodes always own exactly two children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
  Leaf {
    symbol: u8,
    weight: u64,
  },
  Internal {
    weight: u64,
    left: Box<Node>,
    right: Box<Node>,
  },
}

impl Node {
  pub fn leaf(symbol: u8, weight: u64) -> Self {
    Node::Leaf { symbol, weight }
  }

  /// Join two subtrees under a new node carrying their combined weight.
  pub fn join(left: Node, right: Node) -> Self {
    Node::Internal {
      weight: left.weight() + right.weight(),
      left: Box::new(left),
      right: Box::new(right),
    }
  }

  pub fn weight(&self) -> u64 {
    match self {
      Node::Leaf { weight, .. } | Node::Internal { weight, .. } => *weight,
    }
  }

  pub fn is_leaf(&self) -> bool {
    matches!(self, Node::Leaf { .. })
  }

  /// Number of leaves below (and including) this node.
  pub fn num_leaves(&self) -> usize {
    match self {
      Node::Leaf { .. } => 1,
      Node::Internal { left, right, .. } => left.num_leaves() + right.num_leaves(),
    }
  }
}

/// Queue entry ordered by weight, then by the order it was created in.
#[derive(Debug)]
struct Pending {
  weight: u64,
  created: usize,
  node: Node,
}

impl PartialEq for Pending {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Pending {
  fn cmp(&self, other: &Self) -> Ordering {
    (self.weight, self.created).cmp(&(other.weight, other.created))
  }
}

/// Build the Huffman tree for a frequency table, or `None` if it is empty.
///
/// Leaves are queued in ascending symbol order. Each round removes the two
/// lightest nodes (the earlier-created one first on equal weight), makes the
/// first the left child and the second the right child of a new node, and
/// queues that. A table with a single symbol yields a lone leaf.
pub fn build_tree(freqs: &FrequencyTable) -> Option<Node> {
  let mut queue = BinaryHeap::with_capacity(freqs.len());
  let mut created = 0usize;
  for (sym, ct) in freqs.iter() {
    queue.push(Reverse(Pending {
      weight: ct as u64,
      created,
      node: Node::leaf(sym, ct as u64),
    }));
    created += 1;
  }

  loop {
    let Reverse(first) = queue.pop()?;
    let Reverse(second) = match queue.pop() {
      Some(x) => x,
      None => return Some(first.node),
    };

    let joined = Node::join(first.node, second.node);
    queue.push(Reverse(Pending {
      weight: joined.weight(),
      created,
      node: joined,
    }));
    created += 1;
  }
}
