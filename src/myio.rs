use crate::error::{GrnError, GrnResult};
use flate2::read;
use flate2::write;
use flate2::Compression;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Write normal or compressed files seamlessly.
/// Uses the presence of a `.gz` extension to decide, `-` is stdout.
pub fn writer(filename: &str) -> GrnResult<Box<dyn Write>> {
    if filename == "-" {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let path = Path::new(filename);
    let file = File::create(path).map_err(|e| GrnError::io(filename, e))?;

    if path.extension() == Some(OsStr::new("gz")) {
        Ok(Box::new(BufWriter::with_capacity(
            128 * 1024,
            write::GzEncoder::new(file, Compression::default()),
        )))
    } else {
        Ok(Box::new(BufWriter::with_capacity(128 * 1024, file)))
    }
}

/// Read normal or compressed files seamlessly.
/// Uses the presence of a `.gz` extension to decide, `-` is stdin.
/// ```
/// use std::io::BufRead;
/// let lines = grnkit::myio::reader(".test/net_small.tsv.gz")
///     .unwrap()
///     .lines()
///     .count();
/// assert_eq!(lines, 6);
/// assert!(grnkit::myio::reader(".test/does_not_exist.tsv").is_err());
/// ```
pub fn reader(filename: &str) -> GrnResult<Box<dyn BufRead>> {
    if filename == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let path = Path::new(filename);
    let file = File::open(path).map_err(|e| GrnError::io(filename, e))?;

    if path.extension() == Some(OsStr::new("gz")) {
        Ok(Box::new(BufReader::with_capacity(
            128 * 1024,
            read::GzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(128 * 1024, file)))
    }
}

/// Read every line of a file, tagging I/O failures with the file name.
pub fn read_lines(filename: &str) -> GrnResult<Vec<String>> {
    reader(filename)?
        .lines()
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| GrnError::io(filename, e))
}
