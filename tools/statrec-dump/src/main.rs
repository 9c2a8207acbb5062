// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! statrec-dump - Print status records from a frame stream or a raw record.
//!
//! Usage:
//!   statrec-dump capture.srs
//!   statrec-dump capture.srs --format-name storage_status --expect-revision 3
//!   statrec-dump record.bin --single --json
//!   statrec-sample --count 10 | statrec-dump -

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use colored::*;
use statrec::{
    codec, DecodeLimits, FieldValues, FormatExpectation, Record, RecordStreamReader, Verdict,
};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Print status records
#[derive(Parser, Debug)]
#[command(name = "statrec-dump")]
#[command(version)]
#[command(about = "Print status records from a frame stream or a single encoded record")]
struct Args {
    /// Input file ("-" for stdin)
    input: PathBuf,

    /// Input is one raw encoded record, not a frame stream
    #[arg(long)]
    single: bool,

    /// Output format: pretty, json, compact, hex
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Shortcut for --output json
    #[arg(long)]
    json: bool,

    /// Shortcut for --output hex
    #[arg(long)]
    raw: bool,

    /// Only show records of this format
    #[arg(short = 'f', long)]
    format_name: Option<String>,

    /// Warn when a record's revision differs
    #[arg(short = 'r', long)]
    expect_revision: Option<i32>,

    /// Maximum number of records to print (0 = unlimited)
    #[arg(short = 'n', long, default_value = "0")]
    count: u64,

    /// Longest accepted name, in bytes
    #[arg(long, default_value = "4096")]
    max_string_len: usize,

    /// Largest accepted record, in bytes
    #[arg(long, default_value = "16777216")]
    max_record_bytes: usize,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Quiet mode - only output records, no headers or summary
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Debug, PartialEq)]
enum OutputFormat {
    Pretty,
    Json,
    Compact,
    Hex,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "p" => Ok(OutputFormat::Pretty),
            "json" | "j" => Ok(OutputFormat::Json),
            "compact" | "c" => Ok(OutputFormat::Compact),
            "hex" | "raw" | "r" => Ok(OutputFormat::Hex),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[derive(Debug, Default)]
struct Summary {
    shown: u64,
    skipped: u64,
    drifted: u64,
    bad: u64,
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if args.no_color || !is_tty() {
        colored::control::set_override(false);
    }

    // Shortcuts override --output
    let format = if args.json {
        OutputFormat::Json
    } else if args.raw {
        OutputFormat::Hex
    } else {
        args.output.clone()
    };

    if let Err(e) = run(&args, &format) {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn open_input(args: &Args) -> anyhow::Result<Box<dyn Read>> {
    if args.input.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(&args.input)
        .with_context(|| format!("cannot open {}", args.input.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn run(args: &Args, format: &OutputFormat) -> anyhow::Result<()> {
    let limits = DecodeLimits::new()
        .max_string_len(args.max_string_len)
        .max_record_bytes(args.max_record_bytes);
    let mut input = open_input(args)?;
    let mut summary = Summary::default();

    if !args.quiet {
        info!(
            input = %args.input.display(),
            single = args.single,
            output = ?format,
            "statrec-dump v{}",
            env!("CARGO_PKG_VERSION")
        );
    }

    if args.single {
        let mut payload = Vec::new();
        input.read_to_end(&mut payload)?;
        let record = codec::decode_with_limits(&payload, &limits)
            .with_context(|| format!("{} is not a valid record", args.input.display()))?;
        show(args, format, &record, &payload, &mut summary);
    } else {
        let mut reader = RecordStreamReader::with_limits(input, limits);
        loop {
            if args.count > 0 && summary.shown >= args.count {
                break;
            }
            let payload = match reader.next_payload() {
                Ok(Some(payload)) => payload.to_vec(),
                Ok(None) => break,
                Err(e) if e.is_recoverable() => {
                    summary.bad += 1;
                    continue;
                }
                Err(e) => return Err(e).context("stream is unreadable"),
            };
            match codec::decode_with_limits(&payload, &limits) {
                Ok(record) => show(args, format, &record, &payload, &mut summary),
                Err(e) => {
                    summary.bad += 1;
                    warn!(error = %e, "skipping undecodable record");
                }
            }
        }
    }

    io::stdout().flush()?;
    if !args.quiet {
        eprintln!(
            "{} {} shown, {} skipped, {} drifted, {} bad",
            "---".dimmed(),
            summary.shown,
            summary.skipped,
            summary.drifted,
            summary.bad
        );
    }
    Ok(())
}

fn expectation_for(args: &Args, record: &Record) -> FormatExpectation {
    let name = args
        .format_name
        .clone()
        .unwrap_or_else(|| record.format_name().to_string());
    let expect = FormatExpectation::new(name);
    match args.expect_revision {
        Some(rev) => expect.revision(rev),
        None => expect,
    }
}

fn show(args: &Args, format: &OutputFormat, record: &Record, payload: &[u8], summary: &mut Summary) {
    match expectation_for(args, record).evaluate(record) {
        Verdict::NotMine => {
            debug!(format = record.format_name(), data = record.data_name(), "not mine");
            summary.skipped += 1;
            return;
        }
        Verdict::Drifted(drift) => {
            summary.drifted += 1;
            if let Some(change) = drift.revision {
                warn!(
                    data = record.data_name(),
                    expected = change.expected,
                    actual = change.actual,
                    "revision drift"
                );
            }
        }
        Verdict::Compatible => {}
    }

    summary.shown += 1;
    let seq = summary.shown;
    match format {
        OutputFormat::Pretty => print_pretty(record, seq),
        OutputFormat::Json => match serde_json::to_string(record) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "cannot render record as JSON"),
        },
        OutputFormat::Compact => println!("{}", compact_line(record, seq)),
        OutputFormat::Hex => {
            println!("#{} {} ({} bytes)", seq, record.data_name(), payload.len());
            print_hex_dump(payload);
            println!();
        }
    }
}

fn print_pretty(record: &Record, seq: u64) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    println!(
        "{} {} {} ({} rev {}, {} fields, {} bytes)",
        format!("[{}]", timestamp).dimmed(),
        format!("#{}", seq).yellow(),
        record.data_name().bold(),
        record.format_name().cyan(),
        record.revision(),
        record.len(),
        record.byte_size()
    );

    for field in record.fields() {
        let ty = field.scalar_type().to_string();
        if field.is_array() {
            for (i, value) in field.values().iter().enumerate() {
                println!(
                    "  {}[{}] : {}({})",
                    field.name().cyan(),
                    i,
                    ty.dimmed(),
                    value.to_string().green()
                );
            }
        } else if let Some(value) = field.values().get(0) {
            println!(
                "  {} : {}({})",
                field.name().cyan(),
                ty.dimmed(),
                value.to_string().green()
            );
        }
    }
    println!();
}

/// One line per record: `#seq data (format rev N) name=value name=[a,b,..]`.
fn compact_line(record: &Record, seq: u64) -> String {
    let mut line = format!(
        "#{} {} ({} rev {})",
        seq,
        record.data_name(),
        record.format_name(),
        record.revision()
    );
    for field in record.fields() {
        line.push(' ');
        line.push_str(field.name());
        line.push('=');
        if field.is_array() {
            let text = match field.values() {
                FieldValues::I8(_) | FieldValues::U8(_) => record.text(field.name()).ok(),
                _ => None,
            };
            match text {
                Some(text) if !text.is_empty() && text.chars().all(|c| !c.is_control()) => {
                    line.push_str(&format!("{:?}", text))
                }
                _ => {
                    let items: Vec<String> = field.values().iter().map(|v| v.to_string()).collect();
                    line.push_str(&format!("[{}]", items.join(",")));
                }
            }
        } else if let Some(value) = field.values().get(0) {
            line.push_str(&value.to_string());
        }
    }
    line
}

fn print_hex_dump(data: &[u8]) {
    for (i, chunk) in data.chunks(16).enumerate() {
        print!("  {:04x}  ", i * 16);

        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                print!(" ");
            }
            print!("{:02x} ", byte);
        }

        for j in chunk.len()..16 {
            if j == 8 {
                print!(" ");
            }
            print!("   ");
        }

        print!(" |");
        for byte in chunk {
            print!(
                "{}",
                if (0x20..0x7f).contains(byte) {
                    *byte as char
                } else {
                    '.'
                }
            );
        }
        println!("|");
    }
}

fn is_tty() -> bool {
    #[cfg(unix)]
    unsafe {
        libc::isatty(libc::STDOUT_FILENO) != 0
    }
    #[cfg(not(unix))]
    true
}
