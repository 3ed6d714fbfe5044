use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{parse_annotation, parse_min_len, parse_split_count};
use crate::pipeline::Variant;

#[derive(Parser, Debug)]
#[command(author, version, about = "Prepare sequence files for intein searches", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drop short sequences, rename the rest and split them into <outdir>/splits
    ProcessInputSeqs {
        /// Input sequences (FASTA or FASTQ, optionally compressed)
        input_seqs: PathBuf,
        /// Output directory, must not exist yet
        outdir: PathBuf,
        /// Tag put at the start of every new header
        #[arg(value_parser = parse_annotation)]
        annotation: String,
        /// Number of split files
        #[arg(value_parser = parse_split_count)]
        num_splits: usize,
        /// Minimum sequence length to keep (<= 0 keeps everything)
        #[arg(value_parser = parse_min_len, allow_negative_numbers = true)]
        min_len: i64,
    },
    /// Like process-input-seqs, with separate MMseqs2 and RPS-BLAST split sets
    ProcessInputSeqsDual {
        input_seqs: PathBuf,
        /// Output directory, created if missing
        outdir: PathBuf,
        #[arg(value_parser = parse_annotation)]
        annotation: String,
        #[arg(value_parser = parse_split_count)]
        num_mmseqs_splits: usize,
        #[arg(value_parser = parse_split_count)]
        num_rpsblast_splits: usize,
        #[arg(value_parser = parse_min_len, allow_negative_numbers = true)]
        min_len: i64,
    },
    /// Replace every header with <annotation>___seq_<N>
    SimpleHeaders {
        #[arg(value_parser = parse_annotation)]
        annotation: String,
        seqs: PathBuf,
    },
    /// Distribute records round-robin over <seqs>.split_<i>
    SplitSeqs {
        #[arg(value_parser = parse_split_count)]
        num_splits: usize,
        seqs: PathBuf,
    },
}

impl From<Command> for Variant {
    fn from(command: Command) -> Self {
        match command {
            Command::ProcessInputSeqs {
                input_seqs,
                outdir,
                annotation,
                num_splits,
                min_len,
            } => Variant::ProcessInputSeqs {
                input: input_seqs,
                outdir,
                annotation,
                num_splits,
                min_len,
            },
            Command::ProcessInputSeqsDual {
                input_seqs,
                outdir,
                annotation,
                num_mmseqs_splits,
                num_rpsblast_splits,
                min_len,
            } => Variant::ProcessInputSeqsDual {
                input: input_seqs,
                outdir,
                annotation,
                num_mmseqs_splits,
                num_rpsblast_splits,
                min_len,
            },
            Command::SimpleHeaders { annotation, seqs } => Variant::SimpleHeaders {
                annotation,
                input: seqs,
            },
            Command::SplitSeqs { num_splits, seqs } => Variant::SplitSeqs {
                num_splits,
                input: seqs,
            },
        }
    }
}
