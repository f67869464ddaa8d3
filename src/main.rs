//! PDF Recompressor CLI
//!
//! Command-line interface for re-saving a PDF with compressed page content.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use pdf_recompress::{compress, CompressionMode};
use std::path::PathBuf;

/// Compression profile
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// Lossless page copy with default compression
    HighQuality,
    /// Best compression level plus object streams
    Maximum,
}

impl From<Mode> for CompressionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::HighQuality => CompressionMode::HighQuality,
            Mode::Maximum => CompressionMode::Maximum,
        }
    }
}

/// Re-save a PDF with compressed pages and report the size reduction
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PDF file path
    #[arg(short, long)]
    input: PathBuf,

    /// Output PDF file path
    #[arg(short, long)]
    output: PathBuf,

    /// Compression profile
    #[arg(short, long, value_enum, default_value = "high-quality")]
    mode: Mode,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    println!("PDF Recompressor");
    println!("================");

    compress(&args.input, &args.output, args.mode.into()).context("Compression failed")?;

    println!("Output saved to: {:?}", args.output);

    Ok(())
}
