//src/scheduler.rs

use std::sync::Arc;
use std::thread;

use crossbeam_channel::bounded;
use parking_lot::Mutex;

use crate::classify::Classifier;
use crate::error::CollectError;
use crate::source::ReadSource;
use crate::types::{ReadUnit, RunStats};
use crate::writer::OutputSink;

/// Records (or pairs) per dispatched chunk. Large enough to amortize channel
/// overhead, small enough to load-balance across workers.
pub const CHUNK_SIZE: usize = 1024;

/// Skip-and-count stops being acceptable once at least this many records are
/// malformed and they outnumber the well-formed ones; the run then fails
/// instead of reporting a near-empty result as success.
const MALFORMED_ESCALATION_MIN: u64 = 100;

/// Fan the read stream out over a fixed worker pool and fan verdicts back in
/// through one writer thread.
///
/// Exactly one reader (the calling thread) owns the source and hands off
/// materialized chunks over a bounded channel, which keeps paired streams in
/// strict lock-step and bounds memory. Workers classify independently; the
/// single writer thread gives per-record atomic appends. The first fatal
/// error from any stage collapses the pipeline through channel disconnection
/// and is the one propagated.
pub fn run(
    mut source: ReadSource,
    classifier: Classifier,
    sink: OutputSink,
    thread_count: usize,
) -> Result<RunStats, CollectError> {
    let threads = effective_threads(thread_count);
    let queue_depth = threads * 2;
    let classifier = Arc::new(classifier);

    let (chunk_tx, chunk_rx) = bounded::<Vec<ReadUnit>>(queue_depth);
    let (out_tx, out_rx) = bounded::<Vec<ReadUnit>>(queue_depth);

    let fatal: Mutex<Option<CollectError>> = Mutex::new(None);
    let stats: Mutex<RunStats> = Mutex::new(RunStats::default());

    thread::scope(|scope| {
        let fatal = &fatal;
        let stats = &stats;

        // fan-in: one thread owns the sink
        scope.spawn(move || {
            let mut sink = sink;
            for chunk in out_rx {
                for (record, mate) in &chunk {
                    if let Err(e) = sink.write_unit(record, mate.as_ref()) {
                        store_fatal(fatal, e);
                        return;
                    }
                }
            }
            if let Err(e) = sink.finish() {
                store_fatal(fatal, e);
            }
        });

        // fixed worker pool
        for _ in 0..threads {
            let chunk_rx = chunk_rx.clone();
            let out_tx = out_tx.clone();
            let classifier = Arc::clone(&classifier);
            scope.spawn(move || {
                for chunk in chunk_rx {
                    let mut local = RunStats::default();
                    let mut collected: Vec<ReadUnit> = Vec::new();

                    for (record, mate) in chunk {
                        let verdict = match &mate {
                            Some(m) => {
                                local.total_pairs += 1;
                                local.total_reads += 2;
                                let hit = classifier.classify_pair(&record, m);
                                if hit {
                                    local.collected_pairs += 1;
                                    local.collected_reads += 2;
                                }
                                hit
                            }
                            None => {
                                local.total_reads += 1;
                                let hit = classifier.classify_read(&record);
                                if hit {
                                    local.collected_reads += 1;
                                }
                                hit
                            }
                        };
                        if verdict {
                            collected.push((record, mate));
                        }
                    }

                    stats.lock().merge(&local);
                    if !collected.is_empty() && out_tx.send(collected).is_err() {
                        // writer died; its error is already stored
                        return;
                    }
                }
            });
        }
        drop(chunk_rx);
        drop(out_tx);

        // reader: the dispatching thread owns source access
        let mut chunk: Vec<ReadUnit> = Vec::with_capacity(CHUNK_SIZE);
        let mut records_seen: u64 = 0;
        let mut malformed: u64 = 0;

        loop {
            match source.next_unit() {
                Ok(Some(unit)) => {
                    records_seen += 1;
                    chunk.push(unit);
                    if chunk.len() >= CHUNK_SIZE {
                        let full = std::mem::replace(&mut chunk, Vec::with_capacity(CHUNK_SIZE));
                        if chunk_tx.send(full).is_err() {
                            break;
                        }
                    }
                }
                Ok(None) => break,
                Err(e) if e.is_record_level() => {
                    records_seen += 1;
                    malformed += 1;
                    log::warn!("skipping malformed record: {e}");
                    if malformed >= MALFORMED_ESCALATION_MIN && malformed * 2 > records_seen {
                        let promoted = match e {
                            CollectError::MalformedRecord {
                                path,
                                record,
                                reason,
                            } => CollectError::MalformedRecord {
                                path,
                                record,
                                reason: format!(
                                    "pervasive input corruption: {malformed} of {records_seen} \
                                     records malformed (last: {reason})"
                                ),
                            },
                            other => other,
                        };
                        store_fatal(fatal, promoted);
                        break;
                    }
                }
                Err(e) => {
                    store_fatal(fatal, e);
                    break;
                }
            }
        }
        if !chunk.is_empty() {
            let _ = chunk_tx.send(chunk);
        }
        drop(chunk_tx);

        stats.lock().malformed_records += malformed;
    });

    if let Some(e) = fatal.into_inner() {
        return Err(e);
    }
    Ok(stats.into_inner())
}

fn effective_threads(thread_count: usize) -> usize {
    if thread_count > 0 {
        thread_count
    } else {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }
}

fn store_fatal(slot: &Mutex<Option<CollectError>>, err: CollectError) {
    let mut guard = slot.lock();
    if guard.is_none() {
        *guard = Some(err);
    } else {
        log::debug!("suppressing secondary error: {err}");
    }
}
