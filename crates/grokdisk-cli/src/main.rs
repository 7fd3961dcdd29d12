//! grokdisk CLI - partition offsets for mounting disk images
//!
//! Reads the primary partition table of a raw image and prints where each
//! slot starts and how long it is, in bytes.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use grokdisk_core::{format_size, Zone, ZoneTable};
use grokdisk_zones::{ImageMetadata, TableLayout};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grokdisk")]
#[command(about = "Inspect disk image partition tables for mounting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Decode the primary partition table of an image
    Analyze {
        /// Path to the raw disk image
        image: PathBuf,

        /// Bytes per sector of the imaged device (never detected)
        #[arg(
            long,
            env = "GROKDISK_SECTOR_SIZE",
            default_value_t = TableLayout::DEFAULT_SECTOR_SIZE,
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        sector_size: u16,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One summary line per slot
    Text,
    /// Zone records as JSON
    Json,
    /// `mount` invocations for every used slot
    Mount,
}

/// Machine-readable analysis result
#[derive(Debug, Serialize)]
struct AnalysisReport<'a> {
    path: &'a str,
    table: &'a str,
    sector_size: u16,
    zones: Vec<Zone>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(cli.log_level.as_str())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Analyze {
            image,
            sector_size,
            format,
        } => {
            tracing::info!("Analyzing {}", image.display());
            let layout = TableLayout::default().with_sector_size(sector_size);
            let metadata = ImageMetadata::analyze_with(&image, &layout)
                .with_context(|| format!("failed to analyze {}", image.display()))?;

            let output = match format {
                OutputFormat::Text => render_text(&metadata),
                OutputFormat::Json => render_json(&metadata)?,
                OutputFormat::Mount => render_mount(&metadata),
            };
            print!("{}", output);
        }
    }

    Ok(())
}

fn render_text(metadata: &ImageMetadata) -> String {
    let mut out = String::new();
    out.push_str(&format!("Image:        {}\n", metadata.file_path()));
    out.push_str(&format!("Table:        {}\n", metadata.identify()));
    out.push_str(&format!("Sector size:  {} B\n", metadata.sector_size()));
    out.push('\n');

    for partition in metadata.partitions() {
        out.push_str(&format!("[{}] {}\n", partition.slot(), partition.describe()));
        if !partition.is_empty() {
            out.push_str(&format!(
                "    CHS {} - {}, {}{}\n",
                partition.start_chs(),
                partition.end_chs(),
                format_size(partition.size_bytes()),
                if partition.is_bootable() { ", bootable" } else { "" }
            ));
        }
    }
    out
}

fn render_json(metadata: &ImageMetadata) -> Result<String> {
    let report = AnalysisReport {
        path: metadata.file_path(),
        table: metadata.identify(),
        sector_size: metadata.sector_size(),
        zones: metadata.zones(),
    };
    let mut json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
    json.push('\n');
    Ok(json)
}

fn render_mount(metadata: &ImageMetadata) -> String {
    let mut out = String::new();
    for zone in metadata.zones().iter().filter(|zone| !zone.is_empty()) {
        out.push_str(&format!(
            "mount -o loop,ro,offset={},sizelimit={} {} /mnt/slot{}\n",
            zone.offset,
            zone.length,
            shell_quote(metadata.file_path()),
            zone.slot
        ));
    }
    out
}

/// Single-quote a word for POSIX shells
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}
