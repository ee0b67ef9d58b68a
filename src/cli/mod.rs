use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "goldfolio")]
#[command(version, about = "Daily gold and equity portfolio report")]
#[command(
    long_about = "Values gold held at custodian banks and Borsa Istanbul equities at live prices, falling back to cost basis when a price is unavailable, and produces a daily report with optional charts and email delivery."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Path to a TOML configuration file
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Value the portfolio and print the daily report
    Report {
        /// Skip live price lookups and value everything at cost
        #[arg(long)]
        offline: bool,

        /// Do not send the report by email
        #[arg(long = "no-mail")]
        no_mail: bool,

        /// Do not write chart files
        #[arg(long = "no-charts")]
        no_charts: bool,
    },

    /// Show the normalized holdings
    Holdings,

    /// Print the effective configuration as TOML
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_flags() {
        let cli = Cli::parse_from(["goldfolio", "report", "--offline", "--no-mail"]);
        match cli.command {
            Commands::Report {
                offline,
                no_mail,
                no_charts,
            } => {
                assert!(offline);
                assert!(no_mail);
                assert!(!no_charts);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["goldfolio", "holdings", "--json", "--config", "my.toml"]);
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
        assert!(matches!(cli.command, Commands::Holdings));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["goldfolio"]).is_err());
    }
}
