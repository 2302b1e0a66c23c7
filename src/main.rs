use std::env;
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process;

use ansi_term::Colour::Red;

use tcmpr::huffman::HuffRules;
use tcmpr::{Codec, CodecError};

#[derive(Debug)]
struct Opts {
  infile: PathBuf,
  codec: Codec,
  decompress: bool,
  rules: HuffRules,
}

fn print_usage(prog_name: &str) {
  println!("Usage: {} [-v1] [-s] [-d] <infilename>", prog_name);
  println!(
    r#"    Compresses <infilename> into <infilename>.tv2 (Huffman coding)
    -v1   use run-length coding instead, writing <infilename>.tv1
    -s    store the input verbatim when Huffman coding would not shrink it
    -d    decompress; the codec is detected from the file contents and the
          output name drops the .tv1/.tv2 extension (or gains .out)"#
  );
}

fn try_parse_args(args: &[String]) -> Option<Opts> {
  let mut codec = Codec::Huffman;
  let mut decompress = false;
  let mut allow_stored = false;
  let mut infile = None;

  for arg in args.iter().skip(1) {
    match arg.as_str() {
      "-v1" => codec = Codec::RunLength,
      "-d" => decompress = true,
      "-s" => allow_stored = true,
      x if x.starts_with('-') => return None,
      x => {
        if infile.replace(PathBuf::from(x)).is_some() {
          return None;
        }
      }
    }
  }

  Some(Opts {
    infile: infile?,
    codec,
    decompress,
    rules: HuffRules::new(allow_stored),
  })
}

/// Output name for a decompressed file: strip a known extension, otherwise
/// append `.out`.
fn decompressed_name(infile: &Path) -> PathBuf {
  let name = infile.to_string_lossy();
  for codec in [Codec::RunLength, Codec::Huffman].iter() {
    if let Some(stem) = name.strip_suffix(codec.extension()) {
      if !stem.is_empty() {
        return PathBuf::from(stem);
      }
    }
  }
  PathBuf::from(format!("{}.out", name))
}

fn run(opts: &Opts) -> Result<PathBuf, CodecError> {
  if opts.decompress {
    let infile = BufReader::new(fs::File::open(&opts.infile)?);
    let outname = decompressed_name(&opts.infile);
    let outfile = create_output(&outname, false)?;
    let codec = with_cleanup(&outname, tcmpr::decompress_detected(infile, outfile))?;
    log::info!("Decompressed {:?} stream into {}", codec, outname.display());
    Ok(outname)
  } else {
    let infile = fs::File::open(&opts.infile)?;
    let outname = PathBuf::from(format!(
      "{}{}",
      opts.infile.to_string_lossy(),
      opts.codec.extension()
    ));
    let outfile = create_output(&outname, true)?;
    with_cleanup(
      &outname,
      tcmpr::compress_with_rules(opts.codec, infile, outfile, &opts.rules),
    )?;
    log::info!("Compressed with {:?} into {}", opts.codec, outname.display());
    Ok(outname)
  }
}

/// Open the output file. Without `overwrite` an existing file is an error,
/// so decompressing never clobbers a file that is still around.
fn create_output(outname: &Path, overwrite: bool) -> Result<fs::File, CodecError> {
  let mut opts = fs::OpenOptions::new();
  opts.write(true);
  if overwrite {
    opts.create(true).truncate(true);
  } else {
    opts.create_new(true);
  }
  opts.open(outname).map_err(|e| match e.kind() {
    io::ErrorKind::AlreadyExists => CodecError::from(io::Error::new(
      e.kind(),
      format!("{} already exists, not overwriting it", outname.display()),
    )),
    _ => CodecError::from(e),
  })
}

/// Remove a half-written output file if the codec failed.
fn with_cleanup<T>(outname: &Path, res: Result<T, CodecError>) -> Result<T, CodecError> {
  if res.is_err() {
    if let Err(e) = fs::remove_file(outname) {
      log::warn!("Could not remove partial output {}: {}", outname.display(), e);
    }
  }
  res
}

fn main() {
  let args: Vec<String> = env::args().collect();

  let opts = match try_parse_args(&args) {
    Some(opts) => opts,
    None => {
      print_usage(&args[0]);
      process::exit(1);
    }
  };

  pretty_env_logger::init();
  log::debug!("Running with {:?}", opts);

  match run(&opts) {
    Ok(outname) => {
      let insize = fs::metadata(&opts.infile).map(|m| m.len()).unwrap_or(0);
      let outsize = fs::metadata(&outname).map(|m| m.len()).unwrap_or(0);
      println!("{} bytes -> {} bytes", insize, outsize);
    }
    Err(e) => {
      eprintln!("{} {}", Red.bold().paint("error:"), e);
      process::exit(1);
    }
  }
}
