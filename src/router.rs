//! Sink Router: one optional consolidated sink plus any number of named
//! shard sets. Each routed record goes to the consolidated sink and to
//! exactly one shard of every set, picked by `kept_ordinal % shard_count`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::error::{Error, IoContext, Result};
use crate::utils::shard_path;

const WRITE_BUFFER: usize = 128 * 1024;

/// A record as it is written out: header already decided by the caller.
#[derive(Debug, Clone, Copy)]
pub struct OutRecord<'a> {
    pub header: &'a [u8],
    pub sequence: &'a [u8],
    pub quality: Option<&'a [u8]>,
}

/// FASTQ markup when a non-empty quality string is present, FASTA otherwise.
pub fn write_record<W: Write>(out: &mut W, record: &OutRecord) -> io::Result<()> {
    match record.quality {
        Some(qual) if !qual.is_empty() => {
            out.write_all(b"@")?;
            out.write_all(record.header)?;
            out.write_all(b"\n")?;
            out.write_all(record.sequence)?;
            out.write_all(b"\n+\n")?;
            out.write_all(qual)?;
            out.write_all(b"\n")
        }
        _ => {
            out.write_all(b">")?;
            out.write_all(record.header)?;
            out.write_all(b"\n")?;
            out.write_all(record.sequence)?;
            out.write_all(b"\n")
        }
    }
}

/// A buffered output file that counts the records written to it.
pub struct SinkFile {
    path: PathBuf,
    writer: BufWriter<File>,
    records: u64,
}

impl SinkFile {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_path("could not open for writing", path)?;
        debug!("opened {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::with_capacity(WRITE_BUFFER, file),
            records: 0,
        })
    }

    pub fn write_record(&mut self, record: &OutRecord) -> Result<()> {
        write_record(&mut self.writer, record).with_path("could not write to", &self.path)?;
        self.records += 1;
        Ok(())
    }

    /// Flush and close. Returns the path and the number of records written.
    pub fn finish(mut self) -> Result<(PathBuf, u64)> {
        self.writer
            .flush()
            .with_path("could not flush", &self.path)?;
        Ok((self.path, self.records))
    }
}

/// A fixed-size, ordered collection of shard files.
pub struct ShardSet {
    name: String,
    sinks: Vec<SinkFile>,
}

impl ShardSet {
    /// Open `count` files named `<stem>.split_<i>`. Fails on the first file
    /// that cannot be created.
    pub fn create(name: &str, stem: &Path, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(Error::Argument(format!(
                "shard set '{name}' needs at least 1 split"
            )));
        }
        let mut sinks = Vec::new();
        sinks
            .try_reserve_exact(count)
            .map_err(|_| Error::Allocation(format!("{count} split handles for '{name}'")))?;
        for i in 0..count {
            sinks.push(SinkFile::create(&shard_path(stem, i))?);
        }
        Ok(Self {
            name: name.to_string(),
            sinks,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    pub fn index_for(&self, kept_ordinal: u64) -> usize {
        (kept_ordinal % self.sinks.len() as u64) as usize
    }

    fn route(&mut self, kept_ordinal: u64, record: &OutRecord) -> Result<()> {
        let idx = self.index_for(kept_ordinal);
        self.sinks[idx].write_record(record)
    }

    fn finish(self) -> Result<ShardSetSummary> {
        let mut paths = Vec::with_capacity(self.sinks.len());
        let mut records_per_shard = Vec::with_capacity(self.sinks.len());
        for sink in self.sinks {
            let (path, records) = sink.finish()?;
            paths.push(path);
            records_per_shard.push(records);
        }
        Ok(ShardSetSummary {
            name: self.name,
            paths,
            records_per_shard,
        })
    }
}

/// What one shard set received, in shard index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardSetSummary {
    pub name: String,
    pub paths: Vec<PathBuf>,
    pub records_per_shard: Vec<u64>,
}

impl ShardSetSummary {
    pub fn total_records(&self) -> u64 {
        self.records_per_shard.iter().sum()
    }
}

pub struct SinkRouter {
    consolidated: Option<SinkFile>,
    shard_sets: IndexMap<String, ShardSet>,
}

impl SinkRouter {
    pub fn new(consolidated: Option<SinkFile>) -> Self {
        Self {
            consolidated,
            shard_sets: IndexMap::new(),
        }
    }

    /// Register a shard set. Sets are routed and closed in the order they
    /// were added.
    pub fn add_shard_set(&mut self, set: ShardSet) -> Result<()> {
        if self.shard_sets.contains_key(set.name()) {
            return Err(Error::Argument(format!(
                "shard set '{}' declared twice",
                set.name()
            )));
        }
        self.shard_sets.insert(set.name().to_string(), set);
        Ok(())
    }

    pub fn route(&mut self, kept_ordinal: u64, record: &OutRecord) -> Result<()> {
        if let Some(sink) = self.consolidated.as_mut() {
            sink.write_record(record)?;
        }
        for set in self.shard_sets.values_mut() {
            set.route(kept_ordinal, record)?;
        }
        Ok(())
    }

    pub fn close_consolidated(&mut self) -> Result<Option<(PathBuf, u64)>> {
        self.consolidated.take().map(SinkFile::finish).transpose()
    }

    pub fn close_shard_sets(self) -> Result<Vec<ShardSetSummary>> {
        self.shard_sets
            .into_values()
            .map(ShardSet::finish)
            .collect()
    }
}

/// Try to raise the soft open-file limit so that `required` handles fit.
/// Running out of descriptors is otherwise left to fail at open time.
#[cfg(unix)]
pub fn ensure_nofile_limit(required: u64) {
    let (soft, hard) = match rlimit::getrlimit(rlimit::Resource::NOFILE) {
        Ok(limits) => limits,
        Err(e) => {
            warn!("could not read open file limit: {e}");
            return;
        }
    };
    if soft >= required {
        return;
    }
    let new_soft = required.min(hard);
    if let Err(e) = rlimit::setrlimit(rlimit::Resource::NOFILE, new_soft, hard) {
        warn!("failed to raise file limit to {new_soft} (soft) / {hard} (hard): {e}");
        return;
    }
    if new_soft < required {
        warn!("open file limit is {new_soft}, this run needs {required} handles");
    }
}

#[cfg(not(unix))]
pub fn ensure_nofile_limit(_required: u64) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fasta(header: &str, seq: &str) -> String {
        format!(">{header}\n{seq}\n")
    }

    #[test]
    fn fasta_and_fastq_markup() {
        let mut out = Vec::new();
        write_record(
            &mut out,
            &OutRecord {
                header: b"id desc",
                sequence: b"ACGT",
                quality: Some(b"IIII"),
            },
        )
        .unwrap();
        write_record(
            &mut out,
            &OutRecord {
                header: b"id2",
                sequence: b"AC",
                quality: None,
            },
        )
        .unwrap();
        write_record(
            &mut out,
            &OutRecord {
                header: b"id3",
                sequence: b"",
                quality: Some(b""),
            },
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "@id desc\nACGT\n+\nIIII\n>id2\nAC\n>id3\n\n"
        );
    }

    #[test]
    fn shard_index_is_modulo() {
        let dir = tempfile::tempdir().unwrap();
        let set = ShardSet::create("splits", &dir.path().join("x"), 3).unwrap();
        let picked: Vec<_> = (0..7).map(|i| set.index_for(i)).collect();
        assert_eq!(picked, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn zero_shards_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ShardSet::create("splits", &dir.path().join("x"), 0).err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn routes_to_consolidated_and_every_set() {
        let dir = tempfile::tempdir().unwrap();
        let all = dir.path().join("all.fa");
        let mut router = SinkRouter::new(Some(SinkFile::create(&all).unwrap()));
        router
            .add_shard_set(ShardSet::create("a", &dir.path().join("a"), 2).unwrap())
            .unwrap();
        router
            .add_shard_set(ShardSet::create("b", &dir.path().join("b"), 3).unwrap())
            .unwrap();

        for (i, name) in ["s1", "s2", "s3", "s4"].iter().enumerate() {
            let rec = OutRecord {
                header: name.as_bytes(),
                sequence: b"MK",
                quality: None,
            };
            router.route(i as u64, &rec).unwrap();
        }

        let (path, n) = router.close_consolidated().unwrap().unwrap();
        assert_eq!(path, all);
        assert_eq!(n, 4);
        let summaries = router.close_shard_sets().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "a");
        assert_eq!(summaries[0].records_per_shard, vec![2, 2]);
        assert_eq!(summaries[1].records_per_shard, vec![2, 1, 1]);
        assert_eq!(summaries[1].total_records(), 4);

        let b0 = fs::read_to_string(dir.path().join("b.split_0")).unwrap();
        assert_eq!(b0, fasta("s1", "MK") + &fasta("s4", "MK"));
    }

    #[test]
    fn duplicate_set_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = SinkRouter::new(None);
        router
            .add_shard_set(ShardSet::create("a", &dir.path().join("a"), 1).unwrap())
            .unwrap();
        let dup = ShardSet::create("a", &dir.path().join("a2"), 1).unwrap();
        assert!(router.add_shard_set(dup).is_err());
    }
}
