//src/types.rs

use crate::resource::ResourceReport;

/// One sequencing read as it came off the source.
///
/// `id` is the first whitespace-delimited token of the header; `header` keeps
/// the full header line (without the leading '@') so collected reads round-trip
/// byte-for-byte into the output.
#[derive(Debug, Clone)]
pub struct ReadRecord {
    pub id: String,
    pub header: String,
    pub seq: String,
    pub qual: String,
}

impl ReadRecord {
    /// Identifier with a conventional trailing mate suffix ("/1", "/2")
    /// removed, used to check that paired streams stay in lock-step.
    pub fn core_id(&self) -> &str {
        self.id
            .strip_suffix("/1")
            .or_else(|| self.id.strip_suffix("/2"))
            .unwrap_or(&self.id)
    }
}

/// Unit of classification work: a single read, or a pair read in lock-step
/// from two mate streams.
pub type ReadUnit = (ReadRecord, Option<ReadRecord>);

/// How a pair verdict is derived from its two mate verdicts.
///
/// `EitherMate` is the target-capture convention every entry point uses:
/// a pair is collected if at least one mate matches. `BothMates` is the
/// stricter named variant for callers that want it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairPolicy {
    #[default]
    EitherMate,
    BothMates,
}

/// Aggregate counts for one run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub total_reads: u64,
    pub collected_reads: u64,
    pub total_pairs: u64,
    pub collected_pairs: u64,
    /// Structurally invalid records skipped by the skip-and-count policy.
    pub malformed_records: u64,
}

impl RunStats {
    pub fn merge(&mut self, other: &RunStats) {
        self.total_reads += other.total_reads;
        self.collected_reads += other.collected_reads;
        self.total_pairs += other.total_pairs;
        self.collected_pairs += other.collected_pairs;
        self.malformed_records += other.malformed_records;
    }
}

/// What a finished run hands back: counts plus the scoped resource sample.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: RunStats,
    pub resources: ResourceReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_id_strips_mate_suffix() {
        let rec = ReadRecord {
            id: "read7/1".into(),
            header: "read7/1".into(),
            seq: "ACGT".into(),
            qual: "IIII".into(),
        };
        assert_eq!(rec.core_id(), "read7");

        let rec = ReadRecord {
            id: "read7".into(),
            header: "read7".into(),
            seq: "ACGT".into(),
            qual: "IIII".into(),
        };
        assert_eq!(rec.core_id(), "read7");
    }

    #[test]
    fn stats_merge_sums_fields() {
        let mut a = RunStats {
            total_reads: 10,
            collected_reads: 3,
            total_pairs: 5,
            collected_pairs: 2,
            malformed_records: 1,
        };
        let b = RunStats {
            total_reads: 4,
            collected_reads: 1,
            total_pairs: 2,
            collected_pairs: 0,
            malformed_records: 0,
        };
        a.merge(&b);
        assert_eq!(a.total_reads, 14);
        assert_eq!(a.collected_reads, 4);
        assert_eq!(a.total_pairs, 7);
        assert_eq!(a.collected_pairs, 2);
        assert_eq!(a.malformed_records, 1);
    }
}
