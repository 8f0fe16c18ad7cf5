//src/fastq.rs

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::error::CollectError;
use crate::types::ReadRecord;

/// Magic bytes at the start of every gzip member.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Streaming FASTQ reader over plain or gzip-compressed text.
///
/// Whether the input is compressed comes from the caller's `gz_check` flag,
/// not from content sniffing; the constructor only peeks at the gzip magic to
/// reject a flag that contradicts the actual bytes, so a mismatch fails fast
/// instead of misparsing garbage. Downstream consumers never observe whether
/// the underlying bytes were compressed.
pub struct FastqReader {
    path: PathBuf,
    reader: Box<dyn BufRead + Send>,
    /// Records handed out so far, for error messages.
    record_no: u64,
}

impl FastqReader {
    pub fn open(path: &Path, gzipped: bool) -> Result<Self, CollectError> {
        let mut file = File::open(path).map_err(|e| CollectError::io(path, e))?;

        let mut magic = [0u8; 2];
        let n = read_prefix(&mut file, &mut magic).map_err(|e| CollectError::io(path, e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| CollectError::io(path, e))?;
        let looks_gzipped = n == 2 && magic == GZIP_MAGIC;

        if gzipped && !looks_gzipped {
            return Err(CollectError::Config(format!(
                "{} was declared gzip-compressed but does not start with the gzip magic",
                path.display()
            )));
        }
        if !gzipped && looks_gzipped {
            return Err(CollectError::Config(format!(
                "{} looks gzip-compressed but was declared plain text",
                path.display()
            )));
        }

        let reader: Box<dyn BufRead + Send> = if gzipped {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            record_no: 0,
        })
    }

    /// Next record, `Ok(None)` at end of input.
    ///
    /// A structurally invalid record (bad header, truncation mid-record,
    /// sequence/quality length mismatch) comes back as `MalformedRecord`
    /// with the stream positioned after the bad data, so the caller can
    /// skip-and-count and keep reading.
    pub fn next_record(&mut self) -> Result<Option<ReadRecord>, CollectError> {
        let mut header = String::new();
        loop {
            header.clear();
            if self.read_line(&mut header)? == 0 {
                return Ok(None);
            }
            // tolerate stray blank lines between records
            if !header.trim_end().is_empty() {
                break;
            }
        }
        let header = header.trim_end().to_string();
        self.record_no += 1;

        if !header.starts_with('@') {
            return Err(self.malformed("header does not start with '@'"));
        }
        let header = header[1..].to_string();

        let mut seq = String::new();
        if self.read_line(&mut seq)? == 0 {
            return Err(self.malformed("truncated record: missing sequence line"));
        }
        let seq = seq.trim_end().to_string();

        let mut plus = String::new();
        if self.read_line(&mut plus)? == 0 {
            return Err(self.malformed("truncated record: missing separator line"));
        }
        if !plus.starts_with('+') {
            return Err(self.malformed("separator line does not start with '+'"));
        }

        let mut qual = String::new();
        if self.read_line(&mut qual)? == 0 {
            return Err(self.malformed("truncated record: missing quality line"));
        }
        let qual = qual.trim_end().to_string();

        if seq.len() != qual.len() {
            return Err(self.malformed(&format!(
                "sequence length {} does not match quality length {}",
                seq.len(),
                qual.len()
            )));
        }

        let id = header.split_whitespace().next().unwrap_or("").to_string();
        Ok(Some(ReadRecord {
            id,
            header,
            seq,
            qual,
        }))
    }

    fn read_line(&mut self, buf: &mut String) -> Result<usize, CollectError> {
        // a truncated gzip stream surfaces here as an I/O error
        self.reader
            .read_line(buf)
            .map_err(|e| CollectError::io(&self.path, e))
    }

    fn malformed(&self, reason: &str) -> CollectError {
        CollectError::MalformedRecord {
            path: self.path.clone(),
            record: self.record_no,
            reason: reason.to_string(),
        }
    }
}

/// Read up to `buf.len()` bytes, retrying short reads, returning how many
/// bytes were actually available.
fn read_prefix(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const TWO_RECORDS: &str = "@r1 first\nACGT\n+\nIIII\n@r2\nTTTT\n+\nJJJJ\n";

    fn plain_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    fn gz_file(contents: &str) -> tempfile::NamedTempFile {
        let f = tempfile::NamedTempFile::new().unwrap();
        let mut enc = GzEncoder::new(f.reopen().unwrap(), Compression::default());
        enc.write_all(contents.as_bytes()).unwrap();
        enc.finish().unwrap();
        f
    }

    #[test]
    fn reads_plain_records() {
        let f = plain_file(TWO_RECORDS);
        let mut reader = FastqReader::open(f.path(), false).unwrap();

        let r1 = reader.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "r1");
        assert_eq!(r1.header, "r1 first");
        assert_eq!(r1.seq, "ACGT");
        assert_eq!(r1.qual, "IIII");

        let r2 = reader.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "r2");
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn reads_gzip_records_transparently() {
        let f = gz_file(TWO_RECORDS);
        let mut reader = FastqReader::open(f.path(), true).unwrap();
        assert_eq!(reader.next_record().unwrap().unwrap().id, "r1");
        assert_eq!(reader.next_record().unwrap().unwrap().id, "r2");
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn gz_flag_mismatch_fails_fast() {
        let plain = plain_file(TWO_RECORDS);
        assert!(matches!(
            FastqReader::open(plain.path(), true),
            Err(CollectError::Config(_))
        ));

        let gz = gz_file(TWO_RECORDS);
        assert!(matches!(
            FastqReader::open(gz.path(), false),
            Err(CollectError::Config(_))
        ));
    }

    #[test]
    fn length_mismatch_is_record_level() {
        let f = plain_file("@r1\nACGT\n+\nIII\n@r2\nTTTT\n+\nJJJJ\n");
        let mut reader = FastqReader::open(f.path(), false).unwrap();

        let err = reader.next_record().unwrap_err();
        assert!(err.is_record_level());

        // the stream stays usable after the bad record
        let r2 = reader.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "r2");
    }

    #[test]
    fn truncated_final_record_is_reported() {
        let f = plain_file("@r1\nACGT\n+\nIIII\n@r2\nTT");
        let mut reader = FastqReader::open(f.path(), false).unwrap();
        assert_eq!(reader.next_record().unwrap().unwrap().id, "r1");
        let err = reader.next_record().unwrap_err();
        assert!(err.is_record_level());
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn bad_header_is_record_level() {
        let f = plain_file("r1\nACGT\n+\nIIII\n");
        let mut reader = FastqReader::open(f.path(), false).unwrap();
        assert!(reader.next_record().unwrap_err().is_record_level());
    }
}
