use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

use blockfind::{BlocksFinder, FinderConfig, output, trim};
use gencore::genome::Genome;
use junctions::JunctionStorage;

/// Find locally collinear blocks shared between genomic sequences.
#[derive(Debug, Parser)]
#[command(name = "blockfind", version)]
struct Args {
    /// Input FASTA file(s).
    #[arg(long = "fasta", required = true, num_args = 1..)]
    fasta: Vec<PathBuf>,

    /// K-mer size of the junction graph (odd, at most 31).
    #[arg(short, default_value_t = 25)]
    k: usize,

    /// Minimum length of a reported block.
    #[arg(short = 'm', long, default_value_t = 50)]
    min_block_size: i64,

    /// Largest bubble tolerated between equivalent junctions.
    #[arg(short = 'b', long, default_value_t = 125)]
    max_branch_size: i64,

    /// Largest unmatched flank before an instance stops extending.
    #[arg(long, default_value_t = 20)]
    max_flanking_size: i64,

    /// Step budget of the next-vertex scan.
    #[arg(long, default_value_t = 25)]
    looking_depth: i64,

    /// Accepted for compatibility; unused by the search.
    #[arg(long, default_value_t = 8)]
    sample_size: i64,

    /// Worker threads.
    #[arg(short = 't', long, default_value_t = 1)]
    threads: usize,

    /// Seed of the schedule shuffle.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Output directory.
    #[arg(short = 'o', long, default_value = "blockfind_out")]
    out_dir: PathBuf,

    /// Skip writing per-block FASTA files.
    #[arg(long)]
    no_sequences: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();
    let config = FinderConfig {
        k: args.k,
        min_block_size: args.min_block_size,
        max_branch_size: args.max_branch_size,
        max_flanking_size: args.max_flanking_size,
        looking_depth: args.looking_depth,
        sample_size: args.sample_size,
        threads: args.threads,
        seed: args.seed,
    };
    config.validate()?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("cannot create {}", args.out_dir.display()))?;

    let genome = Genome::from_fasta_files(&args.fasta).context("reading input sequences")?;
    anyhow::ensure!(!genome.is_empty(), "no input sequences");

    let storage = JunctionStorage::build(genome, config.k);
    let min_block_size = config.min_block_size;

    let finder = BlocksFinder::new(&storage, config)?;
    let blocks = finder.find_blocks()?;

    let trimmed = trim::trim_blocks(&storage, &blocks, min_block_size);
    log::info!(
        "coverage: {:.2}%",
        trim::coverage(&storage, &trimmed) * 100.0
    );

    output::write_gff(&storage, &trimmed, args.out_dir.join("blocks_coords.gff"))
        .context("writing blocks_coords.gff")?;

    if !args.no_sequences {
        let blocks_dir = args.out_dir.join("blocks");
        fs::create_dir_all(&blocks_dir)
            .with_context(|| format!("cannot create {}", blocks_dir.display()))?;
        output::write_block_sequences(&storage, &trimmed, &blocks_dir)
            .context("writing block sequences")?;
    }

    Ok(())
}
