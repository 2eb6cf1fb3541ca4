mod atomic_write;
mod config;
mod http_executor;
mod logging;

use std::num::NonZeroU64;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::CommandFactory;
use clap::FromArgMatches;
use clap::Parser;
use clap::Subcommand;
use url::Url;
use webpi_tui::ExitReason;
use webpi_tui::TerminalOptions;
use webpi_tui::transcript::DEFAULT_PROMPT_LABEL;

use crate::config::ConfigStore;
use crate::config::FileConfig;
use crate::http_executor::HttpExecutor;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/execute_command";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Full-screen pseudo-terminal that runs each command on a remote executor"
)]
struct Cli {
    /// URL that receives `{"command": ...}` POSTs.
    ///
    /// Falls back to `endpoint` in ~/.webpi/config.toml, then to a local
    /// server on port 5000.
    #[arg(long, env = "WEBPI_ENDPOINT")]
    endpoint: Option<Url>,

    /// Seconds to wait for each response (must be >= 1; default 30).
    #[arg(long)]
    timeout_secs: Option<NonZeroU64>,

    /// `user@host` text shown in front of every prompt.
    #[arg(long)]
    prompt_label: Option<String>,

    /// Where to write logs (default: ~/.webpi/log/webpi.log).
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Edit ~/.webpi/config.toml.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Persist the default endpoint.
    SetEndpoint { endpoint: Url },
}

/// Effective settings after merging flags, config file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    endpoint: Url,
    timeout: Duration,
    prompt_label: String,
}

fn parse_cli() -> Cli {
    let matches = Cli::command()
        .version(webpi_tui::WEBPI_VERSION)
        .get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
}

fn resolve_settings(cli: &Cli, file: FileConfig) -> anyhow::Result<Settings> {
    let endpoint = match (&cli.endpoint, file.endpoint) {
        (Some(endpoint), _) => endpoint.clone(),
        (None, Some(endpoint)) => Url::parse(&endpoint)
            .with_context(|| format!("invalid endpoint `{endpoint}` in config.toml"))?,
        (None, None) => Url::parse(DEFAULT_ENDPOINT).context("parse default endpoint")?,
    };

    let timeout_secs = cli
        .timeout_secs
        .map(NonZeroU64::get)
        .or(file.request_timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let prompt_label = cli
        .prompt_label
        .clone()
        .or(file.prompt_label)
        .unwrap_or_else(|| DEFAULT_PROMPT_LABEL.to_string());

    Ok(Settings {
        endpoint,
        timeout: Duration::from_secs(timeout_secs),
        prompt_label,
    })
}

fn run_config_command(store: &ConfigStore, action: &ConfigCommand) -> anyhow::Result<()> {
    match action {
        ConfigCommand::SetEndpoint { endpoint } => {
            store
                .set_endpoint(endpoint.as_str())
                .with_context(|| format!("update {}", store.path().display()))?;
            println!("endpoint set to {endpoint} in {}", store.path().display());
        }
    }
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = parse_cli();
    let store = ConfigStore::new_default()?;

    if let Some(CliCommand::Config { action }) = &cli.command {
        return run_config_command(&store, action);
    }

    let log_file = match &cli.log_file {
        Some(path) => path.clone(),
        None => match dirs::home_dir() {
            Some(home) => logging::default_log_path(&home),
            None => std::env::temp_dir().join("webpi.log"),
        },
    };
    if let Err(err) = logging::init(&log_file) {
        eprintln!("warning: logging disabled: {err:#}");
    }

    let file_config = store.load().unwrap_or_else(|err| {
        eprintln!("warning: ignoring {}: {err:#}", store.path().display());
        FileConfig::default()
    });
    let settings = resolve_settings(&cli, file_config)?;
    tracing::info!(
        endpoint = %settings.endpoint,
        timeout_secs = settings.timeout.as_secs(),
        "starting webpi {}",
        webpi_tui::WEBPI_VERSION
    );

    let executor = Arc::new(HttpExecutor::new(settings.endpoint, settings.timeout)?);
    tracing::debug!(endpoint = %executor.endpoint(), "http executor ready");
    let options = TerminalOptions {
        prompt_label: settings.prompt_label,
    };

    let mut ui = webpi_tui::WebPiTui::new()?;
    let result = ui.run(executor, options).await;
    // Leave the alternate screen before anything is printed.
    drop(ui);

    let exit_info = result?;
    tracing::info!(
        commands = exit_info.commands_submitted,
        final_path = %exit_info.final_path,
        "session ended: {:?}",
        exit_info.exit_reason
    );
    if exit_info.exit_reason == ExitReason::InputClosed {
        eprintln!("webpi: terminal input closed");
    }
    Ok(())
}
