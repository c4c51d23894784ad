// Command-line entry point.
//
// - `clean` turns the raw portal export into the canonical CSV.
// - `page <name>` prints one dashboard page.
// - `export` writes every report table plus summary.json.
// - `dashboard` (the default) opens the interactive page menu.
use anyhow::{Context, Result};
use birth_report::cleaning::{self, read_canonical, CleanReport};
use birth_report::config::{AppConfig, CoercionPolicy};
use birth_report::shell::Dashboard;
use birth_report::util::format_int;
use birth_report::views::{export_reports, Page};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "birth-report", version, about = "West Java birth records dashboard")]
struct Cli {
    /// Canonical CSV read by the pages
    #[arg(long, global = true)]
    canonical: Option<PathBuf>,

    /// Number of years to forecast
    #[arg(long, global = true)]
    horizon: Option<usize>,

    /// Skip the boundary overlay download
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the raw export into the canonical CSV
    Clean {
        /// Raw CSV to clean
        #[arg(long)]
        raw: Option<PathBuf>,
        /// Drop rows with unparseable year/count cells instead of failing
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Print a single dashboard page
    Page {
        /// overview, trend, regional, heatmap, gender-status, forecast or conclusions
        name: Page,
    },
    /// Write report tables and summary.json
    Export,
    /// Interactive page menu
    Dashboard,
}

impl Cli {
    fn config(&self) -> AppConfig {
        let mut cfg = AppConfig::default();
        if let Some(path) = &self.canonical {
            cfg.canonical_path = path.clone();
        }
        if let Some(h) = self.horizon {
            cfg.horizon = h;
        }
        if self.offline {
            cfg.fetch_boundary = false;
        }
        cfg
    }
}

fn print_clean_report(report: &CleanReport, output: &Path) {
    println!(
        "Processing dataset... ({} rows read, {} written)",
        format_int(report.total_rows),
        format_int(report.written_rows)
    );
    if report.skipped_rows > 0 {
        println!("Note: {} rows skipped due to invalid values.", format_int(report.skipped_rows));
    }
    println!(
        "Duplicates removed: {} ({} births)",
        format_int(report.duplicates_removed),
        format_int(report.duplicate_birth_count)
    );
    for (column, nulls) in &report.null_counts {
        if *nulls > 0 {
            println!("Empty cells in {column}: {}", format_int(*nulls));
        }
    }
    println!("Saved to: {}\n", output.display());
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let mut cfg = cli.config();

    match cli.command.unwrap_or(Command::Dashboard) {
        Command::Clean { raw, skip_invalid } => {
            if let Some(raw) = raw {
                cfg.raw_path = raw;
            }
            if skip_invalid {
                cfg.coercion = CoercionPolicy::SkipAndWarn;
            }
            let (_, report) = cleaning::clean(&cfg.raw_path, &cfg.canonical_path, cfg.coercion)
                .with_context(|| format!("cleaning {}", cfg.raw_path.display()))?;
            print_clean_report(&report, &cfg.canonical_path);
        }
        Command::Page { name } => {
            let records = read_canonical(&cfg.canonical_path)
                .with_context(|| format!("loading {}", cfg.canonical_path.display()))?;
            let page = name.render(&records, &cfg);
            print!("{page}");
            if page.has_errors() {
                anyhow::bail!("page '{}' could not be built", name.slug());
            }
        }
        Command::Export => {
            let records = read_canonical(&cfg.canonical_path)
                .with_context(|| format!("loading {}", cfg.canonical_path.display()))?;
            let summary = export_reports(&records, &cfg)?;
            println!("Outputs saved to individual files...");
            for file in &summary.files {
                println!("- {}", file.display());
            }
            if let Some(err) = &summary.forecast_error {
                println!("Note: forecast skipped ({err}).");
            }
        }
        Command::Dashboard => {
            info!("Opening dashboard on {}", cfg.canonical_path.display());
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            Dashboard::new(cfg).run(stdin.lock(), &mut stdout)?;
            println!("Exiting the program.");
        }
    }
    Ok(())
}
