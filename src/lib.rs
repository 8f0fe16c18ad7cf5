// src/lib.rs
//! Collect sequencing reads that share at least one k-mer with a reference
//! signature.
//!
//! A precomputed k-mer table (one k-mer per line) defines the signature.
//! Reads come from plain FASTQ, gzip FASTQ (single- or paired-end) or BAM;
//! one reader thread feeds chunks to a fixed worker pool and collected reads
//! (or just their identifiers) land in files named from an output prefix.
//!
//! Matching is exact and strand-as-given: no reverse-complement
//! canonicalization is applied on either side, so the table must have been
//! built with the same convention. This is a crate-level invariant, not a
//! per-run option.

pub mod bam;
pub mod classify;
pub mod error;
pub mod fastq;
pub mod kmer;
pub mod kmer_table;
pub mod resource;
pub mod scheduler;
pub mod source;
pub mod types;
pub mod writer;

use std::path::Path;
use std::sync::Arc;

pub use crate::classify::Classifier;
pub use crate::error::CollectError;
pub use crate::kmer_table::KmerTable;
pub use crate::resource::{ResourceMonitor, ResourceReport};
pub use crate::source::ReadSource;
pub use crate::types::{PairPolicy, ReadRecord, RunStats, RunSummary};
pub use crate::writer::OutputSink;

/// Paired-end collection into `{out_prefix}_1.fastq` / `{out_prefix}_2.fastq`.
/// A pair is collected when either mate matches the signature.
pub fn run_collector(
    kmer_table: &Path,
    kmer_size: usize,
    out_prefix: &str,
    read_file_1: &Path,
    read_file_2: &Path,
    gz_check: bool,
    thread_count: usize,
) -> Result<RunSummary, CollectError> {
    let monitor = ResourceMonitor::start();
    let table = KmerTable::load(kmer_table, kmer_size)?;
    let source = ReadSource::open_paired(read_file_1, read_file_2, gz_check)?;
    let sink = OutputSink::open_paired_fastq(out_prefix)?;
    let stats = run_pipeline(table, source, sink, thread_count)?;
    Ok(summarize(monitor, stats))
}

/// Single-end collection into `{out_prefix}.fastq`.
pub fn run_collector_single(
    kmer_table: &Path,
    kmer_size: usize,
    out_prefix: &str,
    read_file_1: &Path,
    gz_check: bool,
    thread_count: usize,
) -> Result<RunSummary, CollectError> {
    let monitor = ResourceMonitor::start();
    let table = KmerTable::load(kmer_table, kmer_size)?;
    let source = ReadSource::open_single(read_file_1, gz_check)?;
    let sink = OutputSink::open_single_fastq(out_prefix)?;
    let stats = run_pipeline(table, source, sink, thread_count)?;
    Ok(summarize(monitor, stats))
}

/// Paired-end identifier-only collection into `{out_prefix}.ids`. The k-mer
/// width is taken from the table file itself.
pub fn run_collector_id_mode(
    kmer_table: &Path,
    out_prefix: &str,
    read_file_1: &Path,
    read_file_2: &Path,
    gz_check: bool,
    thread_count: usize,
) -> Result<RunSummary, CollectError> {
    let monitor = ResourceMonitor::start();
    let table = KmerTable::load_inferred(kmer_table)?;
    let source = ReadSource::open_paired(read_file_1, read_file_2, gz_check)?;
    let sink = OutputSink::open_id_list(out_prefix)?;
    let stats = run_pipeline(table, source, sink, thread_count)?;
    Ok(summarize(monitor, stats))
}

/// Single-end identifier-only collection into `{out_prefix}.ids`.
pub fn run_collector_id_mode_single(
    kmer_table: &Path,
    out_prefix: &str,
    read_file_1: &Path,
    gz_check: bool,
    thread_count: usize,
) -> Result<RunSummary, CollectError> {
    let monitor = ResourceMonitor::start();
    let table = KmerTable::load_inferred(kmer_table)?;
    let source = ReadSource::open_single(read_file_1, gz_check)?;
    let sink = OutputSink::open_id_list(out_prefix)?;
    let stats = run_pipeline(table, source, sink, thread_count)?;
    Ok(summarize(monitor, stats))
}

/// BAM collection into `{out_prefix}.fastq`. With `fast_bam` the source skips
/// quality decoding; primary records are never skipped in either mode.
pub fn run_collector_bam(
    kmer_table: &Path,
    kmer_size: usize,
    out_prefix: &str,
    read_file_b: &Path,
    thread_count: usize,
    fast_bam: bool,
) -> Result<RunSummary, CollectError> {
    let monitor = ResourceMonitor::start();
    let table = KmerTable::load(kmer_table, kmer_size)?;
    let source = ReadSource::open_bam(read_file_b, fast_bam)?;
    let sink = OutputSink::open_single_fastq(out_prefix)?;
    let stats = run_pipeline(table, source, sink, thread_count)?;
    Ok(summarize(monitor, stats))
}

fn run_pipeline(
    table: KmerTable,
    source: ReadSource,
    sink: OutputSink,
    thread_count: usize,
) -> Result<RunStats, CollectError> {
    let classifier = Classifier::new(Arc::new(table), PairPolicy::EitherMate);
    scheduler::run(source, classifier, sink, thread_count)
}

fn summarize(monitor: ResourceMonitor, stats: RunStats) -> RunSummary {
    let resources = monitor.finish();
    if stats.total_pairs > 0 {
        log::info!(
            "collected {} of {} pairs ({} reads)",
            stats.collected_pairs,
            stats.total_pairs,
            stats.collected_reads
        );
    } else {
        log::info!(
            "collected {} of {} reads",
            stats.collected_reads,
            stats.total_reads
        );
    }
    if stats.malformed_records > 0 {
        log::warn!("{} malformed records skipped", stats.malformed_records);
    }
    log::info!(
        "cpu {:.2}s, wall {:.2}s, peak rss {:.1} MB",
        resources.cpu_seconds,
        resources.wall_seconds,
        resources.peak_rss_mb
    );
    RunSummary { stats, resources }
}

// ---------------------------------------------------------------------------
//  Status-returning entry points
// ---------------------------------------------------------------------------

/// Paired-end, sequence output. Returns 0 on success, non-zero on any fatal
/// failure, with the diagnostic logged.
pub fn collector(
    kmer_table: &str,
    kmer_size: usize,
    out_prefix: &str,
    read_file_1: &str,
    read_file_2: &str,
    gz_check: bool,
    thread_count: usize,
) -> i32 {
    status(run_collector(
        Path::new(kmer_table),
        kmer_size,
        out_prefix,
        Path::new(read_file_1),
        Path::new(read_file_2),
        gz_check,
        thread_count,
    ))
}

/// Single-end, sequence output.
pub fn collector_single(
    kmer_table: &str,
    kmer_size: usize,
    out_prefix: &str,
    read_file_1: &str,
    gz_check: bool,
    thread_count: usize,
) -> i32 {
    status(run_collector_single(
        Path::new(kmer_table),
        kmer_size,
        out_prefix,
        Path::new(read_file_1),
        gz_check,
        thread_count,
    ))
}

/// Paired-end, identifier-only output.
pub fn collector_id_mode(
    kmer_table: &str,
    out_prefix: &str,
    read_file_1: &str,
    read_file_2: &str,
    gz_check: bool,
    thread_count: usize,
) -> i32 {
    status(run_collector_id_mode(
        Path::new(kmer_table),
        out_prefix,
        Path::new(read_file_1),
        Path::new(read_file_2),
        gz_check,
        thread_count,
    ))
}

/// Single-end, identifier-only output.
pub fn collector_id_mode_single(
    kmer_table: &str,
    out_prefix: &str,
    read_file_1: &str,
    gz_check: bool,
    thread_count: usize,
) -> i32 {
    status(run_collector_id_mode_single(
        Path::new(kmer_table),
        out_prefix,
        Path::new(read_file_1),
        gz_check,
        thread_count,
    ))
}

/// BAM input, sequence output, with the fast-mode trade-off flag.
pub fn collector_bam(
    kmer_table: &str,
    kmer_size: usize,
    out_prefix: &str,
    read_file_b: &str,
    thread_count: usize,
    fast_bam: bool,
) -> i32 {
    status(run_collector_bam(
        Path::new(kmer_table),
        kmer_size,
        out_prefix,
        Path::new(read_file_b),
        thread_count,
        fast_bam,
    ))
}

fn status(result: Result<RunSummary, CollectError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => {
            log::error!("{e}");
            1
        }
    }
}
