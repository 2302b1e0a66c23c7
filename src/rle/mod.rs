/*! Run-length coding (`tcmpr1`).

After the magic marker the body is a sequence of `(count, value)` byte pairs.
Runs longer than 255 are split across several pairs, so 614 `c`s become
`255 c 255 c 104 c`. A pair never carries a zero count.
*/

use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};

use thiserror::Error;

/// Marks a stream as `tcmpr1` output ("tcmpr1\n").
pub const MAGIC: [u8; 7] = [0x74, 0x63, 0x6d, 0x70, 0x72, 0x31, 0x0A];

const MAX_RUN: usize = u8::MAX as usize;

#[derive(Error, Debug)]
pub enum RleError {
  #[error("Input is not a tcmpr run-length stream")]
  NotRleStream,
  #[error("Stream ended between a run count and its value")]
  TruncatedPair,
  #[error("Other IO error: {0}")]
  IOError(#[from] std::io::Error),
}

fn write_run<W: Write>(sink: &mut W, mut count: usize, value: u8) -> std::io::Result<()> {
  while count > 0 {
    let chunk = count.min(MAX_RUN);
    sink.write_all(&[chunk as u8, value])?;
    count -= chunk;
  }
  Ok(())
}

/// Compress everything in `src` into `sink`.
pub fn compress<R: Read, W: Write>(src: R, sink: W) -> Result<(), RleError> {
  let mut sink = BufWriter::new(sink);
  sink.write_all(&MAGIC)?;

  let mut current: Option<(u8, usize)> = None;
  let mut nbytes = 0usize;
  for b in BufReader::new(src).bytes() {
    let b = b?;
    nbytes += 1;
    current = match current {
      Some((value, count)) if value == b => Some((value, count + 1)),
      Some((value, count)) => {
        write_run(&mut sink, count, value)?;
        Some((b, 1))
      }
      None => Some((b, 1)),
    };
  }
  if let Some((value, count)) = current {
    write_run(&mut sink, count, value)?;
  }
  log::debug!("Run-length coded {} input bytes", nbytes);

  sink.flush()?;
  Ok(())
}

/// Decompress a `tcmpr1` stream from `src` into `sink`.
pub fn decompress<R: Read, W: Write>(src: R, sink: W) -> Result<(), RleError> {
  let mut src = BufReader::new(src);
  let mut magic = [0u8; 7];
  match src.read_exact(&mut magic) {
    Ok(()) => {}
    Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Err(RleError::NotRleStream),
    Err(e) => return Err(e.into()),
  }
  if magic != MAGIC {
    return Err(RleError::NotRleStream);
  }

  let mut sink = BufWriter::new(sink);
  let mut bytes = src.bytes();
  while let Some(count) = bytes.next() {
    let count = count?;
    let value = match bytes.next() {
      Some(v) => v?,
      None => return Err(RleError::TruncatedPair),
    };
    sink.write_all(&vec![value; count as usize])?;
  }
  sink.flush()?;
  Ok(())
}
