//! Input preparation for intein searches: stream a FASTA/FASTQ collection,
//! drop short records, give every kept record a synthetic header and fan it
//! out to a consolidated file and to fixed-size sets of split files, keeping
//! a name map and run stats alongside.

pub mod bookkeeper;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod rewrite;
pub mod router;
pub mod source;
pub mod utils;

pub use error::{Error, Result};
pub use pipeline::{run_variant, Pipeline, RunSummary, Variant};
