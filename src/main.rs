use anyhow::{Context, Result, bail};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use workaround_tracker::cache::ScanCache;
use workaround_tracker::check::check_paths;
use workaround_tracker::resolver::ResolutionCoordinator;
use workaround_tracker::scan::ScanCoordinator;
use workaround_tracker::{cli, config, reporter};

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();

    match cli.command {
        cli::Commands::Check(args) => check_command(args),
    }
}

fn setup_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,workaround_tracker={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn check_command(args: cli::CheckArgs) -> Result<ExitCode> {
    setup_logging(args.debug);

    if args.source_paths.is_empty() {
        tracing::debug!("no source paths given, nothing to check");
        return Ok(ExitCode::SUCCESS);
    }

    for path in &args.source_paths {
        if !path.exists() {
            bail!("Source path does not exist: {}", path.display());
        }
    }

    let cache = if args.no_cache {
        None
    } else {
        let cache = ScanCache::load_or_default(&args.cache_file)
            .context("Failed to load scan cache")?;
        tracing::debug!(
            path = %args.cache_file.display(),
            files = cache.len(),
            "loaded scan cache"
        );
        Some(cache)
    };

    let config = config::load_config(args.config_file.as_deref())
        .context("Failed to load configuration")?;

    let mut scanner = ScanCoordinator::from_kinds(&config.scanners, cache)
        .context("Failed to set up scanners")?;
    let mut resolver = ResolutionCoordinator::from_config(&config.issue_trackers)
        .context("Failed to set up issue trackers")?;

    let report = check_paths(&mut scanner, &mut resolver, &args.source_paths)
        .context("Failed to check workarounds")?;

    if !args.no_cache {
        scanner
            .into_cache()
            .write_to_json_file(&args.cache_file)
            .context("Failed to write scan cache")?;
    }

    reporter::generate_report(&report, args.format, args.output.as_deref())
        .context("Failed to generate report")?;

    Ok(ExitCode::from(report.exit_code()))
}
