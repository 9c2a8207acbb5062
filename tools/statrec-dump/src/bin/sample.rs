// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! statrec-sample - Write a frame stream of synthetic status records.
//!
//! Usage:
//!   statrec-sample --output capture.srs --count 100
//!   statrec-sample --count 10 --corrupt-every 3 | statrec-dump -

use anyhow::Context;
use clap::Parser;
use statrec::{Record, RecordStreamWriter, ScalarType, StoreError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Number of per-node array entries in each record.
const NODES: usize = 8;

#[derive(Parser, Debug)]
#[command(name = "statrec-sample")]
#[command(version)]
#[command(about = "Write a frame stream of synthetic status records")]
struct Args {
    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of records to write
    #[arg(short = 'n', long, default_value = "10")]
    count: u64,

    /// Instance name carried by every record
    #[arg(long, default_value = "store01")]
    data_name: String,

    /// Format name carried by every record
    #[arg(long, default_value = "storage_status")]
    format_name: String,

    /// Format revision
    #[arg(long, default_value = "1")]
    revision: i32,

    /// Damage every Nth frame after checksumming (0 = never)
    #[arg(long, default_value = "0")]
    corrupt_every: u64,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let written = write_samples(&args, out)?;
    info!(
        records = written,
        format = %args.format_name,
        data = %args.data_name,
        "sample stream written"
    );
    Ok(())
}

fn write_samples(args: &Args, mut out: Box<dyn Write>) -> anyhow::Result<u64> {
    let mut record = template(args)?;
    for seq in 0..args.count {
        update(&mut record, seq)?;

        // Frame into memory first so a byte can be damaged past the CRC.
        let mut frame = RecordStreamWriter::new(Vec::new());
        frame.write_record(&record)?;
        let mut bytes = frame.into_inner();
        if args.corrupt_every > 0 && (seq + 1) % args.corrupt_every == 0 {
            let at = 4 + (seq as usize % (bytes.len() - 8));
            bytes[at] ^= 0x5a;
            debug!(seq, at, "corrupted frame");
        }
        out.write_all(&bytes)?;
    }
    out.flush()?;
    Ok(args.count)
}

fn template(args: &Args) -> Result<Record, StoreError> {
    let mut r = Record::new(&args.format_name, &args.data_name, args.revision);
    r.add("runno", 1i32, 0)?;
    r.add("subno", 0i32, 0)?;
    r.declare("state", ScalarType::Int8, 16)?;
    r.add("nevent_in", 0u64, NODES)?;
    r.add("nqueue", 0u32, NODES)?;
    r.add("evtrate", 0f32, NODES)?;
    r.add("loadavg", 0f64, 0)?;
    r.add("disk_usage", 0u8, 0)?;
    Ok(r)
}

fn update(r: &mut Record, seq: u64) -> Result<(), StoreError> {
    r.set("subno", 0, (seq / 100) as i32)?;
    r.set_text("state", if seq % 50 == 49 { "PAUSED" } else { "RUNNING" })?;
    for node in 0..NODES {
        let phase = (seq as f64 + node as f64) / 10.0;
        r.set("nevent_in", node, seq * 1000 + node as u64 * 7)?;
        r.set("nqueue", node, ((phase.sin() + 1.0) * 50.0).round() as u32)?;
        r.set("evtrate", node, (1000.0 + 250.0 * phase.cos()).round() as f32)?;
    }
    r.set("loadavg", 0, 0.25 * (seq % 16) as f64)?;
    r.set("disk_usage", 0, (seq % 101) as u8)?;
    Ok(())
}
