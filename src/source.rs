//src/source.rs

use std::path::Path;

use crate::bam::BamSource;
use crate::error::CollectError;
use crate::fastq::FastqReader;
use crate::types::ReadUnit;

/// Polymorphic read source: one `next_unit` over every input variant, so the
/// classifier and scheduler never branch on format or pairing.
///
/// Exactly one thread owns a source; chunks of materialized units are what
/// cross thread boundaries. The sequence is lazy and finite, not restartable
/// mid-stream.
pub enum ReadSource {
    Single(FastqReader),
    Paired {
        mate1: FastqReader,
        mate2: FastqReader,
        pairs: u64,
    },
    Bam(BamSource),
}

impl ReadSource {
    pub fn open_single(path: &Path, gzipped: bool) -> Result<Self, CollectError> {
        Ok(ReadSource::Single(FastqReader::open(path, gzipped)?))
    }

    pub fn open_paired(path1: &Path, path2: &Path, gzipped: bool) -> Result<Self, CollectError> {
        Ok(ReadSource::Paired {
            mate1: FastqReader::open(path1, gzipped)?,
            mate2: FastqReader::open(path2, gzipped)?,
            pairs: 0,
        })
    }

    pub fn open_bam(path: &Path, fast: bool) -> Result<Self, CollectError> {
        Ok(ReadSource::Bam(BamSource::open(path, fast)?))
    }

    pub fn is_paired(&self) -> bool {
        matches!(self, ReadSource::Paired { .. })
    }

    /// Next unit of work, `Ok(None)` once every stream is exhausted.
    ///
    /// Paired streams advance in lock-step: both mates are consumed before
    /// any error is reported, so a skipped record leaves the streams aligned.
    /// Mate identifiers disagreeing (modulo a "/1"–"/2" suffix) or one stream
    /// ending early is a fatal `PairDesync`.
    pub fn next_unit(&mut self) -> Result<Option<ReadUnit>, CollectError> {
        match self {
            ReadSource::Single(reader) => Ok(reader.next_record()?.map(|r| (r, None))),
            ReadSource::Bam(source) => Ok(source.next_record()?.map(|r| (r, None))),
            ReadSource::Paired {
                mate1,
                mate2,
                pairs,
            } => {
                let r1 = mate1.next_record();
                let r2 = mate2.next_record();
                *pairs += 1;
                match (r1, r2) {
                    (Ok(Some(a)), Ok(Some(b))) => {
                        if a.core_id() != b.core_id() {
                            return Err(CollectError::PairDesync {
                                pair: *pairs,
                                reason: format!(
                                    "mate identifiers disagree: {:?} vs {:?}",
                                    a.id, b.id
                                ),
                            });
                        }
                        Ok(Some((a, Some(b))))
                    }
                    (Ok(None), Ok(None)) => Ok(None),
                    (Ok(Some(_)), Ok(None)) => Err(CollectError::PairDesync {
                        pair: *pairs,
                        reason: "mate 2 stream ended before mate 1".to_string(),
                    }),
                    (Ok(None), Ok(Some(_))) => Err(CollectError::PairDesync {
                        pair: *pairs,
                        reason: "mate 1 stream ended before mate 2".to_string(),
                    }),
                    (Err(e), _) | (_, Err(e)) => Err(e),
                }
            }
        }
    }
}
