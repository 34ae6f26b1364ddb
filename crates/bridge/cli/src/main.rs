//! `nfc-bridge`: serve a PC/SC NFC reader to local web pages

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::{Overrides, Settings};

#[derive(Parser, Debug)]
#[command(version, about = "Local HTTP bridge for an ACR122-class NFC reader")]
struct Cli {
    /// Address to listen on (loopback only)
    #[arg(long)]
    host: Option<Ipv4Addr>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Reader name fragment to accept; repeat for several
    #[arg(short, long = "reader")]
    readers: Vec<String>,

    /// How long a wait request blocks before timing out, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// PC/SC poll interval, in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Config file (default: ~/.nfc-bridge/bridge.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug level output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the bridge (default)
    Serve,

    /// List available readers
    List,

    /// Print the effective configuration
    Config,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host,
            port: self.port,
            readers: (!self.readers.is_empty()).then(|| self.readers.clone()),
            timeout_ms: self.timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let settings = Settings::load(cli.config.clone(), &cli.overrides())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => commands::serve(&settings).await,
        Command::List => commands::list_readers(&settings),
        Command::Config => commands::print_config(&settings),
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_serves() {
        let cli = Cli::try_parse_from(["nfc-bridge"]).unwrap();
        assert!(cli.command.is_none());
        let overrides = cli.overrides();
        assert!(overrides.port.is_none());
        assert!(overrides.readers.is_none());
    }

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "nfc-bridge",
            "--port",
            "4000",
            "-r",
            "ACR122",
            "-r",
            "ACR1252",
            "--timeout-ms",
            "2000",
            "list",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::List)));

        let overrides = cli.overrides();
        assert_eq!(overrides.port, Some(4000));
        assert_eq!(
            overrides.readers,
            Some(vec!["ACR122".to_string(), "ACR1252".to_string()])
        );
        assert_eq!(overrides.timeout_ms, Some(2000));
    }

    #[test]
    fn test_rejects_bad_host() {
        assert!(Cli::try_parse_from(["nfc-bridge", "--host", "localhost"]).is_err());
    }
}
