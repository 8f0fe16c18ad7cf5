//src/classify.rs

use std::sync::Arc;

use crate::kmer::{base_code, kmer_mask};
use crate::kmer_table::KmerTable;
use crate::types::{PairPolicy, ReadRecord};

/// Read-level verdict engine: slides a `kmer_size` window across a sequence
/// and reports whether any encodable window is present in the table.
///
/// Shared by value across workers; the table behind the `Arc` is immutable
/// after load, so lookups need no synchronization.
#[derive(Clone)]
pub struct Classifier {
    table: Arc<KmerTable>,
    policy: PairPolicy,
}

impl Classifier {
    pub fn new(table: Arc<KmerTable>, policy: PairPolicy) -> Self {
        Self { table, policy }
    }

    /// True if any window of the read matches the signature.
    ///
    /// The key is built incrementally: shift in one 2-bit code per base and
    /// reset on an ambiguous base, so a read of length L costs O(L) rather
    /// than O(L·k). Windows straddling an ambiguous base never complete and
    /// never match. Reads shorter than the k-mer size have no windows and are
    /// simply not collected. Short-circuits on the first hit.
    pub fn classify_read(&self, record: &ReadRecord) -> bool {
        let k = self.table.kmer_size();
        let mask = kmer_mask(k);
        let mut key = 0u64;
        let mut valid = 0usize;

        for &b in record.seq.as_bytes() {
            match base_code(b) {
                Some(code) => {
                    key = ((key << 2) | code) & mask;
                    valid += 1;
                    if valid >= k && self.table.contains(key) {
                        return true;
                    }
                }
                None => valid = 0,
            }
        }
        false
    }

    /// Pair verdict under the configured policy.
    pub fn classify_pair(&self, mate1: &ReadRecord, mate2: &ReadRecord) -> bool {
        match self.policy {
            PairPolicy::EitherMate => self.classify_read(mate1) || self.classify_read(mate2),
            PairPolicy::BothMates => self.classify_read(mate1) && self.classify_read(mate2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::encode_kmer;
    use ahash::AHashSet;

    fn record(seq: &str) -> ReadRecord {
        ReadRecord {
            id: "r".into(),
            header: "r".into(),
            seq: seq.into(),
            qual: "I".repeat(seq.len()),
        }
    }

    fn classifier(kmers: &[&str], policy: PairPolicy) -> Classifier {
        let table = KmerTable::from_kmers(kmers).unwrap();
        Classifier::new(Arc::new(table), policy)
    }

    /// Brute-force ground truth: encode every window separately.
    fn brute_force(seq: &str, kmers: &[&str]) -> bool {
        let k = kmers[0].len();
        let keys: AHashSet<u64> = kmers.iter().map(|s| encode_kmer(s.as_bytes()).unwrap()).collect();
        if seq.len() < k {
            return false;
        }
        (0..=seq.len() - k).any(|i| {
            encode_kmer(&seq.as_bytes()[i..i + k])
                .map(|key| keys.contains(&key))
                .unwrap_or(false)
        })
    }

    #[test]
    fn window_at_interior_offset_matches() {
        let c = classifier(&["ACGT"], PairPolicy::EitherMate);
        assert!(c.classify_read(&record("GGACGTTT")));
    }

    #[test]
    fn no_shared_window_means_not_collected() {
        let c = classifier(&["ACGT"], PairPolicy::EitherMate);
        assert!(!c.classify_read(&record("GGGGGGGG")));
    }

    #[test]
    fn short_read_never_matches_and_never_errors() {
        let c = classifier(&["ACGT"], PairPolicy::EitherMate);
        assert!(!c.classify_read(&record("ACG")));
        assert!(!c.classify_read(&record("")));
    }

    #[test]
    fn all_ambiguous_read_never_matches() {
        let c = classifier(&["AAAA"], PairPolicy::EitherMate);
        assert!(!c.classify_read(&record("NNNNNNNN")));
    }

    #[test]
    fn window_straddling_ambiguous_base_does_not_match() {
        // AANAA has no valid 4-window even though table holds AAAA
        let c = classifier(&["AAAA"], PairPolicy::EitherMate);
        assert!(!c.classify_read(&record("AANAA")));
        // but a run of 4 after the N does
        assert!(c.classify_read(&record("AANAAAA")));
    }

    #[test]
    fn lowercase_sequence_matches() {
        let c = classifier(&["ACGT"], PairPolicy::EitherMate);
        assert!(c.classify_read(&record("ggacgttt")));
    }

    #[test]
    fn either_mate_policy_collects_on_one_hit() {
        let c = classifier(&["TTTT"], PairPolicy::EitherMate);
        assert!(c.classify_pair(&record("AAAA"), &record("TTTT")));
        assert!(c.classify_pair(&record("TTTT"), &record("AAAA")));
        assert!(!c.classify_pair(&record("AAAA"), &record("CCCC")));
    }

    #[test]
    fn both_mates_policy_requires_two_hits() {
        let c = classifier(&["TTTT"], PairPolicy::BothMates);
        assert!(!c.classify_pair(&record("AAAA"), &record("TTTT")));
        assert!(c.classify_pair(&record("TTTT"), &record("GTTTT")));
    }

    #[test]
    fn rolling_scan_agrees_with_brute_force() {
        let kmers = ["ACGTA", "TTTTT", "GGGCC"];
        let c = classifier(&kmers, PairPolicy::EitherMate);
        for seq in [
            "ACGTA",
            "AACGTAC",
            "TTTTTTT",
            "GGGCCGGGCC",
            "ACGTNACGTA",
            "NNNNNNNN",
            "ACGT",
            "CCCCCCCCCC",
            "TANTTTTTAN",
        ] {
            assert_eq!(
                c.classify_read(&record(seq)),
                brute_force(seq, &kmers),
                "disagreement on {seq}"
            );
        }
    }
}
