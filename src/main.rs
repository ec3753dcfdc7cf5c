use anyhow::Result;
use clap::Parser;
use pilotdiff::presentation::cli_summary::{print_perf_summary, print_summary};
use pilotdiff::presentation::writers::{all_writers, write_to_file, writer_for};
use pilotdiff::{AppConfig, LogLevel};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(
    name = "pilotdiff",
    about = "pilotdiff: compare pilot and production configuration snapshots."
)]
struct Cli {
    /// Config file; defaults to ./pilotdiff.toml, then the user config dir.
    #[arg(short, long)]
    config: Option<String>,

    /// Print the summary without writing report files.
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long, default_value = "all")]
    format: String,

    /// Print per-table diff timings.
    #[arg(long)]
    perf: bool,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else if cli.quiet {
        LogLevel::Error
    } else {
        LogLevel::Info
    };
    pilotdiff::init_tracing(level);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| AppConfig::default_path().display().to_string());
    let cfg = AppConfig::load(&config_path)?;
    let (report, perf) = pilotdiff::run_with_timing(&cfg)?;

    print_summary(&report);
    if cli.perf {
        print_perf_summary(&perf);
    }

    if cli.dry_run {
        return Ok(());
    }

    let output_dir = Path::new(&cfg.output.dir).join(&report.report_id);
    let options = cfg.report.render_options();

    let writers = match cli.format.as_str() {
        "all" => all_writers(&options),
        fmt => vec![writer_for(fmt, &options)
            .ok_or_else(|| anyhow::anyhow!("Unknown format: {}", fmt))?],
    };

    for writer in writers {
        let path = write_to_file(&*writer, &report, &output_dir)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}
