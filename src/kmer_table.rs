//src/kmer_table.rs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use ahash::AHashSet;

use crate::error::CollectError;
use crate::kmer::{encode_kmer, MAX_KMER_SIZE};

/// The reference k-mer signature: an immutable set of encoded k-mer keys.
///
/// Loaded once at startup from a plain-text file with one k-mer per line,
/// then shared read-only across all worker threads for the lifetime of a run.
/// Duplicate lines merge idempotently. Every stored key encodes exactly
/// `kmer_size` bases.
#[derive(Debug)]
pub struct KmerTable {
    kmer_size: usize,
    keys: AHashSet<u64>,
}

impl KmerTable {
    /// Load a table, requiring every line to be exactly `kmer_size` bases.
    ///
    /// Lines of the wrong length fail with `MalformedTable`; lines with a
    /// base outside A/C/G/T fail with `UnencodableKmer`. Ambiguous entries
    /// are rejected outright rather than dropped, since a silently missing
    /// signature k-mer would make matching reads pass unnoticed.
    pub fn load(path: &Path, kmer_size: usize) -> Result<Self, CollectError> {
        if kmer_size == 0 || kmer_size > MAX_KMER_SIZE {
            return Err(CollectError::Config(format!(
                "k-mer size must be in 1..={MAX_KMER_SIZE}, got {kmer_size}"
            )));
        }
        Self::load_inner(path, Some(kmer_size))
    }

    /// Load a table, taking the k-mer size from its first line.
    ///
    /// The identifier-mode entry points carry no explicit k-mer size; the
    /// table's own fixed width is authoritative and every following line is
    /// still held to it.
    pub fn load_inferred(path: &Path) -> Result<Self, CollectError> {
        Self::load_inner(path, None)
    }

    fn load_inner(path: &Path, expected_size: Option<usize>) -> Result<Self, CollectError> {
        let file = File::open(path).map_err(|e| CollectError::io(path, e))?;
        let reader = BufReader::new(file);

        let mut kmer_size = expected_size;
        let mut keys = AHashSet::new();
        let mut line_no: u64 = 0;

        for line in reader.lines() {
            line_no += 1;
            let line = line.map_err(|e| CollectError::io(path, e))?;
            let entry = line.trim_end_matches('\r');
            if entry.is_empty() {
                continue;
            }

            let k = match kmer_size {
                Some(k) => k,
                None => {
                    let k = entry.len();
                    if k > MAX_KMER_SIZE {
                        return Err(malformed(
                            path,
                            line_no,
                            format!("k-mer width {k} exceeds the maximum of {MAX_KMER_SIZE}"),
                        ));
                    }
                    kmer_size = Some(k);
                    k
                }
            };

            if entry.len() != k {
                return Err(malformed(
                    path,
                    line_no,
                    format!("expected {k} bases, found {}", entry.len()),
                ));
            }

            let key = encode_kmer(entry.as_bytes()).ok_or_else(|| CollectError::UnencodableKmer {
                path: path.to_path_buf(),
                line: line_no,
                kmer: entry.to_string(),
            })?;
            keys.insert(key);
        }

        let kmer_size = kmer_size.ok_or_else(|| {
            malformed(path, line_no.max(1), "table file contains no k-mers".to_string())
        })?;

        log::info!(
            "loaded k-mer table {} with {} keys, k={}",
            path.display(),
            keys.len(),
            kmer_size
        );

        Ok(Self { kmer_size, keys })
    }

    /// Build a table directly from in-memory k-mer strings. All entries must
    /// share one width and encode cleanly; mainly useful for tests and
    /// embedding callers.
    pub fn from_kmers<S: AsRef<str>>(kmers: &[S]) -> Result<Self, CollectError> {
        let mut kmer_size: Option<usize> = None;
        let mut keys = AHashSet::new();
        for kmer in kmers {
            let entry = kmer.as_ref();
            let k = *kmer_size.get_or_insert(entry.len());
            if entry.len() != k || k == 0 || k > MAX_KMER_SIZE {
                return Err(CollectError::Config(format!(
                    "bad k-mer entry {entry:?} for width {k}"
                )));
            }
            let key = encode_kmer(entry.as_bytes()).ok_or_else(|| {
                CollectError::Config(format!("k-mer entry {entry:?} contains an ambiguous base"))
            })?;
            keys.insert(key);
        }
        let kmer_size = kmer_size
            .ok_or_else(|| CollectError::Config("no k-mers supplied".to_string()))?;
        Ok(Self { kmer_size, keys })
    }

    /// Membership test. Read-only and safe for unsynchronized concurrent use
    /// once loading has returned.
    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        self.keys.contains(&key)
    }

    pub fn kmer_size(&self) -> usize {
        self.kmer_size
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn malformed(path: &Path, line: u64, reason: String) -> CollectError {
    CollectError::MalformedTable {
        path: PathBuf::from(path),
        line,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::encode_kmer;
    use std::io::Write;

    fn write_table(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_and_queries() {
        let f = write_table("ACGT\nTTTT\n");
        let table = KmerTable::load(f.path(), 4).unwrap();
        assert_eq!(table.kmer_size(), 4);
        assert_eq!(table.len(), 2);
        assert!(table.contains(encode_kmer(b"ACGT").unwrap()));
        assert!(table.contains(encode_kmer(b"TTTT").unwrap()));
        assert!(!table.contains(encode_kmer(b"AAAA").unwrap()));
    }

    #[test]
    fn duplicates_merge_idempotently() {
        let f = write_table("ACGT\nACGT\nACGT\n");
        let table = KmerTable::load(f.path(), 4).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn wrong_length_line_is_malformed() {
        let f = write_table("ACGT\nACG\n");
        let err = KmerTable::load(f.path(), 4).unwrap_err();
        assert!(matches!(err, CollectError::MalformedTable { line: 2, .. }));
    }

    #[test]
    fn ambiguous_entry_is_rejected_not_dropped() {
        let f = write_table("ACGT\nACNT\n");
        let err = KmerTable::load(f.path(), 4).unwrap_err();
        assert!(matches!(err, CollectError::UnencodableKmer { line: 2, .. }));
    }

    #[test]
    fn kmer_size_out_of_range_is_config_error() {
        let f = write_table("ACGT\n");
        assert!(matches!(
            KmerTable::load(f.path(), 0),
            Err(CollectError::Config(_))
        ));
        assert!(matches!(
            KmerTable::load(f.path(), 32),
            Err(CollectError::Config(_))
        ));
    }

    #[test]
    fn inferred_width_comes_from_first_line() {
        let f = write_table("ACGTA\nTTTTT\n");
        let table = KmerTable::load_inferred(f.path()).unwrap();
        assert_eq!(table.kmer_size(), 5);

        let f = write_table("ACGTA\nTTTT\n");
        let err = KmerTable::load_inferred(f.path()).unwrap_err();
        assert!(matches!(err, CollectError::MalformedTable { line: 2, .. }));
    }

    #[test]
    fn empty_table_is_malformed() {
        let f = write_table("");
        assert!(matches!(
            KmerTable::load_inferred(f.path()),
            Err(CollectError::MalformedTable { .. })
        ));
    }
}
