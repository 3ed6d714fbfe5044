//! The orchestrator. All program variants run the same linear state machine
//! and differ only in their `PipelineOptions` and output layout.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use num_format::{Locale, ToFormattedString};

use crate::bookkeeper::{Bookkeeper, RunCounters};
use crate::config::{PipelineOptions, ShardSpec, PROGRESS_INTERVAL};
use crate::error::{Error, IoContext, Result};
use crate::filter::keep;
use crate::rewrite::{original_header, rewrite};
use crate::router::{ensure_nofile_limit, OutRecord, ShardSet, ShardSetSummary, SinkFile, SinkRouter};
use crate::source::RecordSource;
use crate::utils::{append_suffix, extract_filename, parent_dir, split_extension};

/// The program variants, with already validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
    /// Filter, rename, one shard set. `outdir` must not exist.
    ProcessInputSeqs {
        input: PathBuf,
        outdir: PathBuf,
        annotation: String,
        num_splits: usize,
        min_len: i64,
    },
    /// Filter, rename, two shard sets. `outdir` may already exist.
    ProcessInputSeqsDual {
        input: PathBuf,
        outdir: PathBuf,
        annotation: String,
        num_mmseqs_splits: usize,
        num_rpsblast_splits: usize,
        min_len: i64,
    },
    /// Rename only.
    SimpleHeaders { annotation: String, input: PathBuf },
    /// Round-robin sharding only, records kept in their native format.
    SplitSeqs { num_splits: usize, input: PathBuf },
}

/// Where a run writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputLayout {
    /// Output root, checked for freshness when the options require it.
    pub outdir: Option<PathBuf>,
    /// Directories to create, parents first.
    pub directories: Vec<PathBuf>,
    pub consolidated: Option<PathBuf>,
    pub stats: Option<PathBuf>,
    pub name_map: Option<PathBuf>,
    /// One file stem per shard set, in the order of `PipelineOptions::shard_sets`.
    pub shard_stems: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub input: PathBuf,
    pub options: PipelineOptions,
    pub layout: OutputLayout,
}

fn with_suffix(name: &OsStr, suffix: &str) -> OsString {
    let mut s = name.to_os_string();
    s.push(suffix);
    s
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::ProcessInputSeqs { .. } => "process-input-seqs",
            Variant::ProcessInputSeqsDual { .. } => "process-input-seqs-dual",
            Variant::SimpleHeaders { .. } => "simple-headers",
            Variant::SplitSeqs { .. } => "split-seqs",
        }
    }

    pub fn plan(&self) -> Result<Plan> {
        match self {
            Variant::ProcessInputSeqs {
                input,
                outdir,
                annotation,
                num_splits,
                min_len,
            } => {
                let splits_dir = outdir.join("splits");
                let mut plan = intein_finder_plan(
                    input,
                    outdir,
                    annotation,
                    *min_len,
                    vec![(ShardSpec::new("splits", *num_splits), splits_dir)],
                )?;
                plan.options.require_fresh_outdir = true;
                Ok(plan)
            }
            Variant::ProcessInputSeqsDual {
                input,
                outdir,
                annotation,
                num_mmseqs_splits,
                num_rpsblast_splits,
                min_len,
            } => intein_finder_plan(
                input,
                outdir,
                annotation,
                *min_len,
                vec![
                    (
                        ShardSpec::new("mmseqs_splits", *num_mmseqs_splits),
                        outdir.join("mmseqs_splits"),
                    ),
                    (
                        ShardSpec::new("rpsblast_splits", *num_rpsblast_splits),
                        outdir.join("rpsblast_splits"),
                    ),
                ],
            ),
            Variant::SimpleHeaders { annotation, input } => {
                let dir = parent_dir(input);
                let (stem, ext) = split_extension(input)?;
                let mut seqs = with_suffix(&stem, ".simple_headers");
                seqs.push(&ext);
                Ok(Plan {
                    input: input.clone(),
                    options: PipelineOptions {
                        annotation: Some(annotation.clone()),
                        ..PipelineOptions::default()
                    },
                    layout: OutputLayout {
                        consolidated: Some(dir.join(seqs)),
                        name_map: Some(dir.join(with_suffix(&stem, ".simple_headers.name_map.txt"))),
                        ..OutputLayout::default()
                    },
                })
            }
            Variant::SplitSeqs { num_splits, input } => Ok(Plan {
                input: input.clone(),
                options: PipelineOptions {
                    shard_sets: vec![ShardSpec::new("splits", *num_splits)],
                    preserve_native_format: true,
                    prune_unused_shards: true,
                    ..PipelineOptions::default()
                },
                layout: OutputLayout {
                    shard_stems: vec![input.clone()],
                    ..OutputLayout::default()
                },
            }),
        }
    }
}

fn intein_finder_plan(
    input: &Path,
    outdir: &Path,
    annotation: &str,
    min_len: i64,
    shard_sets: Vec<(ShardSpec, PathBuf)>,
) -> Result<Plan> {
    let out_name = with_suffix(&extract_filename(input)?, ".intein_finder");
    let consolidated = outdir.join(&out_name);
    let mut directories = vec![outdir.to_path_buf()];
    let mut specs = Vec::with_capacity(shard_sets.len());
    let mut shard_stems = Vec::with_capacity(shard_sets.len());
    for (spec, dir) in shard_sets {
        shard_stems.push(dir.join(&out_name));
        directories.push(dir);
        specs.push(spec);
    }
    Ok(Plan {
        input: input.to_path_buf(),
        options: PipelineOptions {
            min_len: Some(min_len),
            annotation: Some(annotation.to_string()),
            shard_sets: specs,
            ..PipelineOptions::default()
        },
        layout: OutputLayout {
            outdir: Some(outdir.to_path_buf()),
            directories,
            stats: Some(append_suffix(&consolidated, ".stats")),
            name_map: Some(append_suffix(&consolidated, ".name_map")),
            consolidated: Some(consolidated),
            shard_stems,
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    DirectorySetup,
    FilePreparation,
    Streaming,
    Finalize,
    Closed,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Init => Some(Stage::DirectorySetup),
            Stage::DirectorySetup => Some(Stage::FilePreparation),
            Stage::FilePreparation => Some(Stage::Streaming),
            Stage::Streaming => Some(Stage::Finalize),
            Stage::Finalize => Some(Stage::Closed),
            Stage::Closed => None,
        }
    }
}

/// What a finished run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub counters: RunCounters,
    pub consolidated: Option<PathBuf>,
    pub stats_text: String,
    /// Per shard set, restricted to the shard files left on disk.
    pub shard_sets: Vec<ShardSetSummary>,
    pub removed_shards: Vec<PathBuf>,
}

struct OpenSinks {
    source: RecordSource,
    router: SinkRouter,
    book: Bookkeeper,
}

pub struct Pipeline {
    plan: Plan,
    stage: Stage,
}

impl Pipeline {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            stage: Stage::Init,
        }
    }

    fn advance(&mut self, to: Stage) {
        debug_assert_eq!(self.stage.next(), Some(to), "stages only move forward");
        debug!("{:?} -> {:?}", self.stage, to);
        self.stage = to;
    }

    pub fn run(mut self) -> Result<RunSummary> {
        info!("Processing {}", self.plan.input.display());
        self.advance(Stage::DirectorySetup);
        self.setup_directories()?;

        self.advance(Stage::FilePreparation);
        let mut sinks = self.prepare_files()?;

        self.advance(Stage::Streaming);
        self.stream(&mut sinks)?;

        self.advance(Stage::Finalize);
        let summary = self.finalize(sinks)?;

        self.advance(Stage::Closed);
        Ok(summary)
    }

    fn setup_directories(&self) -> Result<()> {
        let layout = &self.plan.layout;
        if self.plan.options.require_fresh_outdir {
            if let Some(outdir) = &layout.outdir {
                let exists = outdir
                    .try_exists()
                    .with_path("error checking on", outdir)?;
                if exists {
                    return Err(Error::OutdirExists(outdir.clone()));
                }
            }
            for dir in &layout.directories {
                fs::create_dir(dir).with_path("could not make directory", dir)?;
                info!("Created {}", dir.display());
            }
        } else {
            for dir in &layout.directories {
                fs::create_dir_all(dir).with_path("could not make directory", dir)?;
                debug!("Using {}", dir.display());
            }
        }
        Ok(())
    }

    fn prepare_files(&self) -> Result<OpenSinks> {
        let layout = &self.plan.layout;
        let options = &self.plan.options;
        if layout.shard_stems.len() != options.shard_sets.len() {
            return Err(Error::Argument(format!(
                "{} shard sets configured but {} output stems given",
                options.shard_sets.len(),
                layout.shard_stems.len()
            )));
        }

        let source = RecordSource::open(&self.plan.input)?;

        let handles: u64 = 3 + options.shard_sets.iter().map(|s| s.count as u64).sum::<u64>();
        ensure_nofile_limit(handles + 64);

        let consolidated = layout
            .consolidated
            .as_deref()
            .map(SinkFile::create)
            .transpose()?;
        let book = Bookkeeper::new(layout.stats.as_deref(), layout.name_map.as_deref())?;
        let mut router = SinkRouter::new(consolidated);
        for (spec, stem) in options.shard_sets.iter().zip(&layout.shard_stems) {
            router.add_shard_set(ShardSet::create(&spec.name, stem, spec.count)?)?;
            debug!("Opened {} {} files", spec.count, spec.name);
        }
        Ok(OpenSinks {
            source,
            router,
            book,
        })
    }

    fn stream(&self, sinks: &mut OpenSinks) -> Result<()> {
        let options = &self.plan.options;
        let OpenSinks {
            source,
            router,
            book,
        } = sinks;

        for record in source {
            let record = record?;
            book.record_seen();
            let seen = book.counters().total_seen;
            if seen % PROGRESS_INTERVAL == 0 {
                debug!("Reading seq {}", seen.to_formatted_string(&Locale::en));
            }

            if let Some(min_len) = options.min_len {
                if !keep(&record, min_len) {
                    continue;
                }
            }
            let kept_ordinal = book.record_kept();
            let quality = if options.preserve_native_format {
                record.quality.as_deref()
            } else {
                None
            };

            match &options.annotation {
                Some(annotation) => {
                    let (synthetic, original) = rewrite(&record, annotation, kept_ordinal);
                    book.append_name_map(&synthetic, &original)?;
                    router.route(
                        kept_ordinal,
                        &OutRecord {
                            header: synthetic.as_bytes(),
                            sequence: &record.sequence,
                            quality,
                        },
                    )?;
                }
                None => {
                    let header = original_header(&record);
                    router.route(
                        kept_ordinal,
                        &OutRecord {
                            header: &header,
                            sequence: &record.sequence,
                            quality,
                        },
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Close order: consolidated, stats, name map, then each shard set in
    /// declaration order.
    fn finalize(&self, sinks: OpenSinks) -> Result<RunSummary> {
        let OpenSinks {
            source,
            mut router,
            book,
        } = sinks;
        drop(source);

        let counters = book.counters();
        let consolidated = router.close_consolidated()?.map(|(path, _)| path);
        let stats_text = book.finalize()?;
        let mut shard_sets = router.close_shard_sets()?;

        let mut removed_shards = Vec::new();
        if self.plan.options.prune_unused_shards {
            for set in &mut shard_sets {
                let keep_len = usize::try_from(counters.total_kept)
                    .unwrap_or(usize::MAX)
                    .min(set.paths.len());
                for path in set.paths.drain(keep_len..) {
                    info!("Not enough seqs, removing {}", path.display());
                    fs::remove_file(&path).with_path("could not remove", &path)?;
                    removed_shards.push(path);
                }
                set.records_per_shard.truncate(keep_len);
            }
        }

        let loc = Locale::en;
        info!(
            "Sequences read: {}, kept: {}, dropped: {}",
            counters.total_seen.to_formatted_string(&loc),
            counters.total_kept.to_formatted_string(&loc),
            counters.total_dropped().to_formatted_string(&loc)
        );
        for set in &shard_sets {
            info!("{}: {} files", set.name, set.paths.len());
        }

        Ok(RunSummary {
            counters,
            consolidated,
            stats_text,
            shard_sets,
            removed_shards,
        })
    }
}

/// Plan and run one variant.
pub fn run_variant(variant: &Variant) -> Result<RunSummary> {
    debug!("Running {}", variant.name());
    Pipeline::new(variant.plan()?).run()
}
