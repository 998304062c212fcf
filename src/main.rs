mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use reclaim::{fold_results, summarize, Catalog, Config, Executor, Scanner, SystemRunner, TEMP_KEYS};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "reclaim=debug" } else { "reclaim=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let mut catalog = Catalog::system(&config);

    match cli.command {
        Command::List => {
            if cli.json {
                return print_json(catalog.all());
            }
            output::print_banner();
            for location in catalog.all() {
                output::print_location(location, false);
            }
        }

        Command::Scan => {
            let scanner = scanner(&config)?;
            let totals = scanner.scan(&mut catalog, |_, _| {});
            if cli.json {
                return print_json(catalog.all());
            }
            output::print_banner();
            output::print_scan_header("Scan");
            for location in catalog.all() {
                output::print_location(location, true);
            }
            println!();
            output::print_grand_total(totals.total_bytes, totals.total_files);
        }

        Command::Summary => {
            scanner(&config)?.scan(&mut catalog, |_, _| {});
            let summary = summarize(&catalog);
            if cli.json {
                return print_json(&summary);
            }
            output::print_banner();
            for category in &summary.categories {
                output::print_category(category);
            }
            output::print_grand_total(summary.total_bytes, summary.total_files);
        }

        Command::Disks => {
            let volumes = reclaim::summary::volume_report();
            if cli.json {
                return print_json(&volumes);
            }
            output::print_banner();
            for volume in &volumes {
                output::print_volume(volume);
            }
        }

        Command::Clean {
            keys,
            all,
            temp_only,
            confirm,
        } => {
            let selected: Vec<String> = if all {
                catalog.keys().map(str::to_string).collect()
            } else if temp_only {
                TEMP_KEYS.iter().map(|k| k.to_string()).collect()
            } else {
                keys
            };
            if selected.is_empty() {
                anyhow::bail!("no locations selected; pass keys, --temp-only or --all");
            }
            let selected: Vec<&str> = selected.iter().map(String::as_str).collect();

            let scanner = scanner(&config)?;
            if !confirm {
                let totals = scanner.scan_keys(&mut catalog, &selected, |_, _| {});
                if cli.json {
                    let picked: Vec<_> = selected.iter().filter_map(|k| catalog.get(k)).collect();
                    return print_json(&picked);
                }
                output::print_warning("No --confirm flag provided. Running as dry-run scan.");
                println!();
                for key in &selected {
                    match catalog.get(key) {
                        Some(location) => output::print_location(location, true),
                        None => output::print_warning(&format!("unknown location {key}")),
                    }
                }
                println!();
                output::print_grand_total(totals.total_bytes, totals.total_files);
                output::print_dry_run_footer();
                return Ok(());
            }

            let runner = SystemRunner;
            let executor = Executor::new(&runner, scanner.volume_roots().to_vec());
            let results = executor.clean(&catalog, &selected, |i, total, msg| {
                if !cli.json {
                    output::print_progress(i, total, msg);
                }
            });
            if cli.json {
                return print_json(&results);
            }
            for result in &results {
                output::print_result(result);
            }
            output::print_report(&fold_results(&results));
        }
    }

    Ok(())
}

fn scanner(config: &Config) -> Result<Scanner> {
    Scanner::new(config.scan_workers).context("starting scan workers")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
