//! Record Source: sequential FASTA/FASTQ records from a plain or compressed
//! file. Compression is sniffed by niffler, records are parsed by seq_io.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use log::debug;
use seq_io::fasta::{self, Record as _};
use seq_io::fastq::{self, Record as _};

use crate::error::{Error, IoContext, Result};

/// niffler reads this many bytes to recognise a compression format.
const SNIFF_WINDOW: u64 = 5;

/// One sequence entry. Owned, so it outlives the parser's internal buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub name: Vec<u8>,
    pub comment: Option<Vec<u8>>,
    pub sequence: Vec<u8>,
    pub quality: Option<Vec<u8>>,
}

impl SeqRecord {
    /// Build a record from a raw header line (without the `>`/`@` marker).
    /// The header is split at its first whitespace byte; an empty remainder
    /// means there is no comment.
    pub fn from_header(header: &[u8], sequence: Vec<u8>, quality: Option<Vec<u8>>) -> Self {
        let (name, comment) = match header.iter().position(|b| b.is_ascii_whitespace()) {
            Some(idx) => {
                let rest = &header[idx + 1..];
                (
                    header[..idx].to_vec(),
                    (!rest.is_empty()).then(|| rest.to_vec()),
                )
            }
            None => (header.to_vec(), None),
        };
        Self {
            name,
            comment,
            sequence,
            quality,
        }
    }
}

enum Records {
    Fasta(fasta::Reader<Box<dyn Read>>),
    Fastq(fastq::Reader<Box<dyn Read>>),
    Empty,
}

impl Records {
    fn next_record(&mut self) -> Option<std::result::Result<SeqRecord, String>> {
        match self {
            Records::Fasta(reader) => reader.next().map(|res| {
                res.map(|rec| SeqRecord::from_header(rec.head(), rec.full_seq().into_owned(), None))
                    .map_err(|e| e.to_string())
            }),
            Records::Fastq(reader) => reader.next().map(|res| {
                res.map(|rec| {
                    SeqRecord::from_header(rec.head(), rec.seq().to_vec(), Some(rec.qual().to_vec()))
                })
                .map_err(|e| e.to_string())
            }),
            Records::Empty => None,
        }
    }
}

/// Single-pass stream of records. Not restartable; dropping it closes the
/// underlying file.
pub struct RecordSource {
    path: PathBuf,
    records: Records,
    records_read: u64,
}

impl RecordSource {
    /// Open `path`, which must be a regular file.
    pub fn open(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).with_path("could not read file", path)?;
        if !meta.is_file() {
            return Err(Error::NotAFile(path.to_path_buf()));
        }
        let file = File::open(path).with_path("could not open for reading", path)?;
        // Too short to carry a compression header.
        if meta.len() < SNIFF_WINDOW {
            return Self::from_reader(path, file);
        }
        let (reader, compression) = niffler::get_reader(Box::new(file))
            .map_err(|e| Error::record_format(path, e))?;
        debug!("{} compression: {:?}", path.display(), compression);
        Self::from_reader(path, reader)
    }

    /// Wrap an already decompressed byte stream. The format is picked from
    /// the first non-blank byte: `>` for FASTA, `@` for FASTQ. `label` is
    /// only used in error messages.
    pub fn from_reader<R: Read + 'static>(label: &Path, reader: R) -> Result<Self> {
        let mut buffered = BufReader::new(reader);
        // Skip leading blank bytes, however many buffer refills that takes.
        let first = loop {
            let buf = buffered
                .fill_buf()
                .with_path("could not read from", label)?;
            if buf.is_empty() {
                break None;
            }
            match buf.iter().position(|b| !b.is_ascii_whitespace()) {
                Some(idx) => {
                    let byte = buf[idx];
                    buffered.consume(idx);
                    break Some(byte);
                }
                None => {
                    let n = buf.len();
                    buffered.consume(n);
                }
            }
        };
        let reader: Box<dyn Read> = Box::new(buffered);
        let records = match first {
            Some(b'>') => Records::Fasta(fasta::Reader::new(reader)),
            Some(b'@') => Records::Fastq(fastq::Reader::new(reader)),
            None => Records::Empty,
            Some(other) => {
                return Err(Error::record_format(
                    label,
                    format!(
                        "expected '>' or '@' at start of input, found '{}'",
                        char::from(other).escape_default()
                    ),
                ))
            }
        };
        Ok(Self {
            path: label.to_path_buf(),
            records,
            records_read: 0,
        })
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }
}

impl Iterator for RecordSource {
    type Item = Result<SeqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.records.next_record()? {
            Ok(record) => {
                self.records_read += 1;
                Some(Ok(record))
            }
            Err(msg) => {
                // A malformed record ends the stream for good.
                self.records = Records::Empty;
                Some(Err(Error::record_format(
                    &self.path,
                    format!("record {}: {msg}", self.records_read + 1),
                )))
            }
        }
    }
}
