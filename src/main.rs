use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use goldfolio::app::{run_from_config, ReportOptions};
use goldfolio::cli::formatters::{
    format_holdings_json, format_holdings_table, format_report_json, format_run_status,
};
use goldfolio::cli::{Cli, Commands};
use goldfolio::config::{offline_requested, Config};

fn main() -> Result<()> {
    // Logs go to stderr, the report owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Report {
            offline,
            no_mail,
            no_charts,
        } => {
            let options = ReportOptions {
                offline: offline || offline_requested(),
                charts: !no_charts,
                mail: !no_mail,
            };
            let run = run_from_config(&config, options, Local::now().naive_local())?;

            if cli.json {
                println!("{}", format_report_json(&run));
            } else {
                println!("{}", run.text);
                eprint!("{}", format_run_status(&run));
            }

            if !run.is_success() {
                std::process::exit(1);
            }
            info!("Report complete");
            Ok(())
        }

        Commands::Holdings => {
            let classes = config.holdings.normalized()?;
            if cli.json {
                println!("{}", format_holdings_json(&classes));
            } else {
                print!("{}", format_holdings_table(&classes));
            }
            Ok(())
        }

        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}
