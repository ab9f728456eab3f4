//! Reconstruct an out-of-order PDF
//!
//! Infers the reading order of the input's pages, flags duplicate and missing
//! pages, and writes `reconstructed.pdf` with a linked table of contents plus
//! the run reports.
//!
//! Usage:
//!   cargo run --release --bin reconstruct_pdf -- scan.pdf
//!   cargo run --release --bin reconstruct_pdf -- scan.pdf --output-dir out --config config.json
//!   cargo run --release --bin reconstruct_pdf -- scan.pdf --embeddings emb.json --thumbnails thumbs/
//!
//! Set `RUST_LOG=pdf_reconstruct=debug` for per-page records.

use pdf_reconstruct::{EmbeddingSet, ReconstructConfig, Reconstructor, ThumbnailDir};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

struct CliArgs {
    input: PathBuf,
    output_dir: PathBuf,
    config: Option<PathBuf>,
    embeddings: Option<PathBuf>,
    thumbnails: Option<PathBuf>,
    no_toc: bool,
    verbose: bool,
}

impl CliArgs {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut input = None;
        let mut output_dir = PathBuf::from("reconstruction");
        let mut config = None;
        let mut embeddings = None;
        let mut thumbnails = None;
        let mut no_toc = false;
        let mut verbose = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--output-dir" | "-o" => output_dir = PathBuf::from(value(&args, &mut i)?),
                "--config" => config = Some(PathBuf::from(value(&args, &mut i)?)),
                "--embeddings" => embeddings = Some(PathBuf::from(value(&args, &mut i)?)),
                "--thumbnails" => thumbnails = Some(PathBuf::from(value(&args, &mut i)?)),
                "--no-toc" => no_toc = true,
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => return Err(String::new()),
                other if other.starts_with('-') => return Err(format!("unknown option '{}'", other)),
                other => {
                    if input.is_some() {
                        return Err(format!("unexpected argument '{}'", other));
                    }
                    input = Some(PathBuf::from(other));
                },
            }
            i += 1;
        }

        Ok(Self {
            input: input.ok_or_else(|| "missing input PDF".to_string())?,
            output_dir,
            config,
            embeddings,
            thumbnails,
            no_toc,
            verbose,
        })
    }
}

fn value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} needs a value", args[*i - 1]))
}

fn usage() {
    eprintln!(
        "Usage: reconstruct_pdf <input.pdf> [--output-dir DIR] [--config config.json] \
         [--embeddings emb.json] [--thumbnails DIR] [--no-toc] [--verbose]"
    );
}

fn run(args: CliArgs) -> pdf_reconstruct::Result<()> {
    let mut config = match &args.config {
        Some(path) => ReconstructConfig::from_json_file(path)?,
        None => ReconstructConfig::default(),
    };
    if args.no_toc {
        config = config.with_embed_toc(false);
    }
    if args.verbose {
        config = config.with_debug(true);
    }

    let mut reconstructor = Reconstructor::new(config);
    if let Some(path) = &args.embeddings {
        reconstructor = reconstructor.with_embeddings(EmbeddingSet::from_json_file(path)?);
    }
    if let Some(dir) = &args.thumbnails {
        reconstructor = reconstructor.with_thumbnails(ThumbnailDir::new(dir));
    }

    let source = std::fs::read(&args.input)?;
    let start = Instant::now();
    let (outcome, path) = reconstructor.reconstruct_to_dir(&source, &args.output_dir)?;

    println!("=== PDF Reconstruction ===");
    println!("Input:      {}", args.input.display());
    println!("Output:     {}", path.display());
    println!("Pages:      {}", outcome.corpus.len());
    println!("Strategy:   {}", outcome.order.strategy.name());
    println!("Confidence: {:.0}%", outcome.order.confidence * 100.0);
    println!("Duplicates: {} groups", outcome.duplicates.len());
    println!("Missing:    {} page numbers", outcome.missing.len());
    println!("TOC:        {} entries", outcome.toc.len());
    println!("Time:       {:.2?}", start.elapsed());
    if args.verbose {
        println!("\n{}", outcome.order.reasoning);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args = match CliArgs::from_args() {
        Ok(args) => args,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("Error: {}", message);
            }
            usage();
            process::exit(2);
        },
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
