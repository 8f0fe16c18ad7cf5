use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use readsieve::{
    collector, collector_bam, collector_id_mode, collector_id_mode_single, collector_single,
};

#[derive(Parser, Debug)]
#[command(
    name = "readsieve",
    version,
    about = "Collect sequencing reads sharing k-mers with a reference signature"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Paired-end FASTQ input, collected pairs written as FASTQ
    Pe {
        /// K-mer table file, one k-mer per line
        kmer_table: String,
        /// K-mer size (must match the table)
        kmer_size: usize,
        /// Prefix for {prefix}_1.fastq / {prefix}_2.fastq
        out_prefix: String,
        read_file_1: String,
        read_file_2: String,
        /// Inputs are gzip-compressed
        #[arg(long)]
        gzip: bool,
        #[arg(short = 't', long, default_value_t = 1)]
        threads: usize,
    },
    /// Single-end FASTQ input, collected reads written as FASTQ
    Se {
        kmer_table: String,
        kmer_size: usize,
        /// Prefix for {prefix}.fastq
        out_prefix: String,
        read_file_1: String,
        #[arg(long)]
        gzip: bool,
        #[arg(short = 't', long, default_value_t = 1)]
        threads: usize,
    },
    /// Paired-end FASTQ input, only identifiers of collected pairs
    PeId {
        /// K-mer table file; the k-mer size is taken from its first line
        kmer_table: String,
        /// Prefix for {prefix}.ids
        out_prefix: String,
        read_file_1: String,
        read_file_2: String,
        #[arg(long)]
        gzip: bool,
        #[arg(short = 't', long, default_value_t = 1)]
        threads: usize,
    },
    /// Single-end FASTQ input, only identifiers of collected reads
    SeId {
        kmer_table: String,
        out_prefix: String,
        read_file_1: String,
        #[arg(long)]
        gzip: bool,
        #[arg(short = 't', long, default_value_t = 1)]
        threads: usize,
    },
    /// BAM input, collected reads written as FASTQ
    Bam {
        kmer_table: String,
        kmer_size: usize,
        out_prefix: String,
        read_file_b: String,
        #[arg(short = 't', long, default_value_t = 1)]
        threads: usize,
        /// Skip quality decoding and secondary/supplementary records
        #[arg(long)]
        fast: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
            ])
            .template("{spinner:.green} {msg}")
            .expect("Invalid spinner template"),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message("Collecting reads...");

    let status = match cli.cmd {
        Cmd::Pe {
            kmer_table,
            kmer_size,
            out_prefix,
            read_file_1,
            read_file_2,
            gzip,
            threads,
        } => collector(
            &kmer_table,
            kmer_size,
            &out_prefix,
            &read_file_1,
            &read_file_2,
            gzip,
            threads,
        ),
        Cmd::Se {
            kmer_table,
            kmer_size,
            out_prefix,
            read_file_1,
            gzip,
            threads,
        } => collector_single(&kmer_table, kmer_size, &out_prefix, &read_file_1, gzip, threads),
        Cmd::PeId {
            kmer_table,
            out_prefix,
            read_file_1,
            read_file_2,
            gzip,
            threads,
        } => collector_id_mode(
            &kmer_table,
            &out_prefix,
            &read_file_1,
            &read_file_2,
            gzip,
            threads,
        ),
        Cmd::SeId {
            kmer_table,
            out_prefix,
            read_file_1,
            gzip,
            threads,
        } => collector_id_mode_single(&kmer_table, &out_prefix, &read_file_1, gzip, threads),
        Cmd::Bam {
            kmer_table,
            kmer_size,
            out_prefix,
            read_file_b,
            threads,
            fast,
        } => collector_bam(&kmer_table, kmer_size, &out_prefix, &read_file_b, threads, fast),
    };

    if status == 0 {
        spinner.finish_with_message("Collection finished.");
    } else {
        spinner.finish_with_message("Collection failed.");
    }
    ExitCode::from(status as u8)
}
