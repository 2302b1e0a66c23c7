use std::{env, io::BufReader, io::Write, process};

use tcmpr::huffman::{read_header, StreamInfo};

fn main() -> Result<(), std::io::Error> {
  let args: Vec<String> = env::args().collect();

  if args.len() != 3 {
    println!("Usage: {} <compressed-in> <json-out>", &args[0]);
    println!("\tDumps the header of a Huffman-compressed (.tv2) file as JSON, listing");
    println!("\tevery symbol with its count and the code rebuilt from the counts");
    process::exit(1);
  }

  pretty_env_logger::init();

  let infile = std::fs::File::open(&args[1])
    .unwrap_or_else(|_| panic!("Could not open input file {}", args[1]));
  let mut outfile = std::fs::OpenOptions::new()
    .write(true)
    .create(true)
    .truncate(true)
    .open(&args[2])
    .unwrap_or_else(|_| panic!("Could not open output file {}", args[2]));

  let header = match read_header(&mut BufReader::new(infile)) {
    Ok(h) => h,
    Err(e) => {
      println!("{}", e);
      process::exit(1);
    }
  };
  log::info!(
    "{:?} stream of {} bytes",
    header.method,
    header.total_len
  );

  let info = StreamInfo::from_header(&header);
  let json_string = serde_json::to_string(&info)?;
  outfile.write_all(json_string.as_bytes())?;
  println!("Output written to {}", args[2]);

  Ok(())
}
