//! Snapshot diff tool - compares two collected exports module by module

use anyhow::Result;
use mooncakes_stats::collect::diff;
use std::env;
use std::path::Path;
use std::process;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: snapshot-diff <old.csv> <new.csv> <out.csv>");
        process::exit(1);
    }

    let rows = diff::diff_files(
        Path::new(&args[1]),
        Path::new(&args[2]),
        Path::new(&args[3]),
    )?;
    info!("✓ Wrote {} diff rows to {}", rows, args[3]);

    Ok(())
}
