use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use hotel_rate_sheet::config::{Config, ConfigOverrides};
use hotel_rate_sheet::grid::collector::{collect_grid, CollectOptions};
use hotel_rate_sheet::grid::RateGrid;
use hotel_rate_sheet::output::csv::rates_to_csv;
use hotel_rate_sheet::output::json::render_json;
use hotel_rate_sheet::output::table::render_rates_table;
use hotel_rate_sheet::output::xlsx::SheetWriter;
use hotel_rate_sheet::rates::xotelo::XoteloFetcher;
use hotel_rate_sheet::rates::RateFetcher;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Xlsx,
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "hotel-rate-sheet",
    about = "Nightly competitor rates with baseline highlighting"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Xlsx)]
    output: OutputFormat,
    #[arg(long = "out-dir")]
    out_dir: Option<String>,
    #[arg(long = "top-k")]
    top_k: Option<usize>,
    /// Number of stay dates to fetch, starting at the configured offset
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    days: Option<u32>,
    #[arg(long = "fail-fast")]
    fail_fast: bool,
    #[arg(long)]
    concurrency: Option<usize>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        output_dir: cli.out_dir.clone(),
        top_k: cli.top_k,
        days: cli.days,
        fail_fast: cli.fail_fast,
        concurrency: cli.concurrency,
    })?;

    if let Some(command) = &cli.command {
        return handle_config_command(command, &config, &config_path);
    }

    let today = Local::now().date_naive();
    let fetcher = XoteloFetcher::new(&config.api).context("failed building HTTP client")?;
    let grid = run(&fetcher, &config, today).await?;
    emit(&grid, &config, today, cli.output)
}

async fn run(fetcher: &dyn RateFetcher, config: &Config, today: NaiveDate) -> Result<RateGrid> {
    let window = config.resolve_window(today)?;
    info!(
        hotels = config.hotels.len(),
        baseline = %config.hotels.baseline.display_name,
        from = %window.start(),
        days = window.len(),
        "pulling {} rates from {}",
        config.api.currency,
        fetcher.name()
    );
    let options = CollectOptions {
        top_k: config.highlight.top_k,
        policy: config.fetch.policy,
        concurrency: config.fetch.concurrency,
    };
    collect_grid(fetcher, &config.hotels, window, &options).await
}

fn emit(grid: &RateGrid, config: &Config, today: NaiveDate, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Xlsx => {
            let path = config.output_path(today);
            SheetWriter::new(config.output.availability_column).save(grid, &path)?;
            info!("rates saved to file: {}", path.display());
        }
        OutputFormat::Table => println!("{}", render_rates_table(grid)),
        OutputFormat::Json => println!("{}", render_json(grid)?),
        OutputFormat::Csv => print!("{}", rates_to_csv(grid)?),
    }
    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &PathBuf) -> Result<()> {
    let Commands::Config { init, show } = command;
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn bare_invocation_writes_xlsx() {
        let cli = Cli::try_parse_from(["hotel-rate-sheet"]).expect("bare invocation parses");
        assert!(matches!(cli.output, OutputFormat::Xlsx));
        assert!(cli.command.is_none());
        assert!(!cli.fail_fast);
    }

    #[test]
    fn rejects_zero_days() {
        assert!(Cli::try_parse_from(["hotel-rate-sheet", "--days", "0"]).is_err());
    }

    #[test]
    fn parses_run_flags_and_config_subcommand() {
        let cli = Cli::try_parse_from([
            "hotel-rate-sheet",
            "--output",
            "table",
            "--top-k",
            "2",
            "--days",
            "7",
            "--fail-fast",
        ])
        .expect("flags parse");
        assert!(matches!(cli.output, OutputFormat::Table));
        assert_eq!(cli.top_k, Some(2));
        assert_eq!(cli.days, Some(7));
        assert!(cli.fail_fast);

        let cli = Cli::try_parse_from(["hotel-rate-sheet", "config", "--init"])
            .expect("config subcommand parses");
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                init: true,
                show: false
            })
        ));
    }
}
