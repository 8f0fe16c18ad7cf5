//src/writer.rs

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::error::CollectError;
use crate::types::ReadRecord;

/// Destination files for collected reads, opened once per run from an output
/// prefix and appended to by exactly one writer thread.
///
/// Each record is formatted in full before a single `write_all`, so records
/// from different pairs never interleave. Both mates of a collected pair are
/// written in mate order; ordering across pairs follows completion order, not
/// input order.
#[derive(Debug)]
pub enum OutputSink {
    /// Sequence mode, paired: `{prefix}_1.fastq` / `{prefix}_2.fastq`.
    PairedFastq {
        mate1: CountedFile,
        mate2: CountedFile,
    },
    /// Sequence mode, single-end (and BAM input): `{prefix}.fastq`.
    SingleFastq { out: CountedFile },
    /// Identifier mode: `{prefix}.ids`, one identifier per line, both mates
    /// of a collected pair.
    IdList { out: CountedFile },
}

/// A buffered output file that remembers its path for error reporting.
#[derive(Debug)]
pub struct CountedFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CountedFile {
    fn create(path: PathBuf) -> Result<Self, CollectError> {
        let file = File::create(&path).map_err(|e| CollectError::io(&path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), CollectError> {
        self.writer
            .write_all(bytes)
            .map_err(|e| CollectError::io(&self.path, e))
    }

    fn flush(&mut self) -> Result<(), CollectError> {
        self.writer
            .flush()
            .map_err(|e| CollectError::io(&self.path, e))
    }
}

impl OutputSink {
    pub fn open_paired_fastq(prefix: &str) -> Result<Self, CollectError> {
        Ok(OutputSink::PairedFastq {
            mate1: CountedFile::create(PathBuf::from(format!("{prefix}_1.fastq")))?,
            mate2: CountedFile::create(PathBuf::from(format!("{prefix}_2.fastq")))?,
        })
    }

    pub fn open_single_fastq(prefix: &str) -> Result<Self, CollectError> {
        Ok(OutputSink::SingleFastq {
            out: CountedFile::create(PathBuf::from(format!("{prefix}.fastq")))?,
        })
    }

    pub fn open_id_list(prefix: &str) -> Result<Self, CollectError> {
        Ok(OutputSink::IdList {
            out: CountedFile::create(PathBuf::from(format!("{prefix}.ids")))?,
        })
    }

    /// Append one collected unit. Any write failure is fatal for the run.
    pub fn write_unit(
        &mut self,
        record: &ReadRecord,
        mate: Option<&ReadRecord>,
    ) -> Result<(), CollectError> {
        match self {
            OutputSink::PairedFastq { mate1, mate2 } => {
                mate1.write_all(fastq_entry(record).as_bytes())?;
                if let Some(m) = mate {
                    mate2.write_all(fastq_entry(m).as_bytes())?;
                }
                Ok(())
            }
            OutputSink::SingleFastq { out } => {
                out.write_all(fastq_entry(record).as_bytes())?;
                if let Some(m) = mate {
                    out.write_all(fastq_entry(m).as_bytes())?;
                }
                Ok(())
            }
            OutputSink::IdList { out } => {
                out.write_all(format!("{}\n", record.id).as_bytes())?;
                if let Some(m) = mate {
                    out.write_all(format!("{}\n", m.id).as_bytes())?;
                }
                Ok(())
            }
        }
    }

    /// Flush every destination; called once after the last unit so a
    /// successful run never reports completion with bytes still buffered.
    pub fn finish(&mut self) -> Result<(), CollectError> {
        match self {
            OutputSink::PairedFastq { mate1, mate2 } => {
                mate1.flush()?;
                mate2.flush()
            }
            OutputSink::SingleFastq { out } => out.flush(),
            OutputSink::IdList { out } => out.flush(),
        }
    }

}

fn fastq_entry(record: &ReadRecord) -> String {
    format!("@{}\n{}\n+\n{}\n", record.header, record.seq, record.qual)
}
