//! Run counters, the name map and the final stats report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};

use crate::error::{IoContext, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub total_seen: u64,
    pub total_kept: u64,
}

impl RunCounters {
    pub fn total_dropped(&self) -> u64 {
        self.total_seen - self.total_kept
    }

    /// The three-line, tab separated stats report.
    pub fn stats_text(&self) -> String {
        format!(
            "total_seqs\t{}\nlong_seqs\t{}\nshort_seqs\t{}\n",
            self.total_seen,
            self.total_kept,
            self.total_dropped()
        )
    }
}

/// `synthetic_header<TAB>original_header` lines, one per kept record.
pub struct NameMap {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl NameMap {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_path("could not open for writing", path)?;
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .has_headers(false)
            .from_writer(file);
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn append(&mut self, synthetic: &str, original: &[u8]) -> Result<()> {
        self.writer
            .write_record([synthetic.as_bytes(), original])?;
        Ok(())
    }

    fn finish(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .with_path("could not flush", &self.path)?;
        Ok(self.path)
    }
}

/// Owns the counters and the bookkeeping sinks. The stats sink is opened
/// up front with every other sink but only written once, in `finalize`.
pub struct Bookkeeper {
    counters: RunCounters,
    stats: Option<(PathBuf, BufWriter<File>)>,
    name_map: Option<NameMap>,
}

impl Bookkeeper {
    pub fn new(stats_path: Option<&Path>, name_map_path: Option<&Path>) -> Result<Self> {
        let stats = match stats_path {
            Some(path) => {
                let file = File::create(path).with_path("could not open for writing", path)?;
                Some((path.to_path_buf(), BufWriter::new(file)))
            }
            None => None,
        };
        let name_map = name_map_path.map(NameMap::create).transpose()?;
        Ok(Self {
            counters: RunCounters::default(),
            stats,
            name_map,
        })
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    pub fn record_seen(&mut self) {
        self.counters.total_seen += 1;
    }

    /// Count one more kept record and return its 0-based kept ordinal.
    pub fn record_kept(&mut self) -> u64 {
        let ordinal = self.counters.total_kept;
        self.counters.total_kept += 1;
        ordinal
    }

    pub fn append_name_map(&mut self, synthetic: &str, original: &[u8]) -> Result<()> {
        match self.name_map.as_mut() {
            Some(map) => map.append(synthetic, original),
            None => Ok(()),
        }
    }

    /// Write the stats report, then close the stats sink and the name map,
    /// in that order. Returns the report text.
    pub fn finalize(self) -> Result<String> {
        let text = self.counters.stats_text();
        if let Some((path, mut writer)) = self.stats {
            writer
                .write_all(text.as_bytes())
                .with_path("could not write to", &path)?;
            writer.flush().with_path("could not flush", &path)?;
        }
        if let Some(map) = self.name_map {
            map.finish()?;
        }
        Ok(text)
    }
}
