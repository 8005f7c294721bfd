//! Main entry point for the zipwrapped CLI application.
//!
//! A thin host around [`ArchiveReader`]: every listing and extraction goes
//! through the reader's cursor.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::Write;

use zipwrapped::{ArchiveReader, Cli, ReaderOptions, path};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let options = ReaderOptions {
        visibility: if cli.hide_hidden {
            path::is_not_hidden
        } else {
            path::always_visible
        },
        ..ReaderOptions::default()
    };

    // Declared before the reader so the borrowed buffer outlives it
    let buffer;
    let mut reader = ArchiveReader::with_options(options);

    if cli.in_memory {
        buffer = std::fs::read(&cli.file).with_context(|| format!("reading {}", cli.file))?;
        reader
            .open_buffer(&buffer)
            .with_context(|| format!("opening {} from memory", cli.file))?;
    } else {
        reader
            .open(&cli.file)
            .with_context(|| format!("opening {}", cli.file))?;
    }

    if cli.is_listing() {
        list_entries(&mut reader, cli.verbose);
    } else if let Some(ref extension) = cli.extension {
        if !reader.seek_file_entry_with_extension(extension) {
            bail!("no file with extension {extension} in {}", cli.file);
        }
        print_current(&mut reader)?;
    } else if !cli.names.is_empty() {
        for name in &cli.names {
            if !reader.seek_file_entry_with_name(name, cli.ignore_case) {
                log::warn!("{name}: not found in {}", cli.file);
                continue;
            }
            print_current(&mut reader)?;
        }
    } else if cli.pipe {
        let mut more = reader.seek_first_entry();
        while more {
            if reader.current_entry_is_file() && reader.current_entry_is_visible() {
                print_current(&mut reader)?;
            }
            more = reader.seek_next_entry();
        }
    } else {
        list_entries(&mut reader, false);
    }

    reader.close();
    Ok(())
}

/// List entries by walking the cursor.
///
/// The verbose format shows sizes, method, compression ratio and timestamps.
fn list_entries(reader: &mut ArchiveReader<'_>, verbose: bool) {
    if verbose {
        println!(
            "{:>10}  {:<6}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Method", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(78));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    let mut more = reader.seek_first_entry();
    while more {
        if !reader.current_entry_is_visible() {
            more = reader.seek_next_entry();
            continue;
        }

        match reader.current_entry() {
            Some(entry) if verbose => {
                let (year, month, day) = entry.mod_date();
                let (hour, minute, _second) = entry.mod_time();
                println!(
                    "{:>10}  {:<6}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
                    entry.uncompressed_size,
                    entry.compression_method,
                    entry.compressed_size,
                    ratio(entry.compressed_size, entry.uncompressed_size),
                    year,
                    month,
                    day,
                    hour,
                    minute,
                    entry.file_name
                );
                if !entry.is_directory {
                    total_uncompressed += entry.uncompressed_size;
                    total_compressed += entry.compressed_size;
                    file_count += 1;
                }
            }
            _ => println!("{}", reader.current_entry_path()),
        }
        more = reader.seek_next_entry();
    }

    if verbose {
        println!("{}", "-".repeat(78));
        println!(
            "{:>10}  {:<6}  {:>10}  {}  {:>21}  {} files",
            total_uncompressed,
            "",
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }
}

/// Percentage saved by compression, right aligned.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - compressed * 100 / uncompressed)
    } else {
        "  0%".to_string()
    }
}

/// Write the current entry's content to stdout.
fn print_current(reader: &mut ArchiveReader<'_>) -> Result<()> {
    let data = reader
        .read_current_entry()
        .with_context(|| format!("extracting {}", reader.current_entry_path()))?;
    log::debug!("{}: {} bytes", reader.current_entry_path(), data.len());

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}
