use crate::{
    config::ShellConfig,
    http_client::{ReqwestTransport, Transport},
    screen,
    shell::Shell,
};
use anyhow::{Context, Result, bail, ensure};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use semver::Version;
use softpos_demo_core::{DEVICE_ID_KEY, DeviceIdFormat, TerminalState};
use std::{cmp::Reverse, path::PathBuf, process::ExitCode};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Simulated SoftPOS terminal
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, default_value = "config.json", env = "SOFTPOS_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Boot the terminal and take keypad input from stdin
    Run,
    /// Boot the terminal and make one payment
    Pay {
        /// Amount in major units, e.g. 12.50
        #[arg(long)]
        amount: String,
    },
    /// List the kernel versions offered by the backend
    Kernels,
    /// Show client storage, device identity and effective configuration
    Diagnose,
    /// Forget the registered device identity
    ClearStorage,
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ShellConfig::load(&cli.config)?;
    let transport = ReqwestTransport::new(config.shell.request_timeout())?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => interactive(&config, transport).await,
        Command::Pay { amount } => pay(&config, transport, &amount).await,
        Command::Kernels => kernels(&config, transport).await,
        Command::Diagnose => diagnose(&config, transport).await,
        Command::ClearStorage => {
            Shell::new(&config, transport).store().clear().await?;
            info!("client storage cleared");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn interactive<T: Transport>(config: &ShellConfig, transport: T) -> Result<ExitCode> {
    let debug = config.terminal.debug;
    let mut shell = Shell::new(config, transport)
        .with_renderer(move |view| println!("{}", screen::draw(view, debug)));

    shell.boot(config.terminal.clone()).await?;
    println!("keys: digits and '.', c = clear, pay, new, kernels, load <version>, health, q = quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let input = line.trim();

        match input.split_once(' ') {
            Some(("load", version)) => {
                shell.load_kernel(version.trim().to_string()).await?;
                continue;
            }
            Some(_) => {
                warn!("unknown input: {input}");
                continue;
            }
            None => {}
        }

        match input {
            "" => {}
            "q" | "quit" => break,
            "c" | "clear" => {
                shell.clear().await?;
            }
            "pay" => {
                shell.pay().await?;
            }
            "new" => {
                shell.new_transaction().await?;
            }
            "kernels" => {
                let view = shell.list_kernels().await?;
                print_versions(&view.available_kernels);
            }
            "health" => {
                let view = shell.check_health().await?;
                println!(
                    "kernel service: {}",
                    view.kernel_service.as_deref().unwrap_or("unknown")
                );
            }
            keys if keys.chars().all(|c| c.is_ascii_digit() || c == '.') => {
                shell.enter_amount(keys).await?;
            }
            _ => warn!("unknown input: {input}"),
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn pay<T: Transport>(config: &ShellConfig, transport: T, amount: &str) -> Result<ExitCode> {
    let mut shell = Shell::new(config, transport);

    let view = shell.boot(config.terminal.clone()).await?;
    ensure!(
        view.state == TerminalState::Ready,
        "terminal did not become ready: {}",
        view.status_message
    );

    let view = shell.enter_amount(amount).await?;
    if view.amount.as_deref() != Some(amount) {
        bail!("invalid amount '{amount}'");
    }

    let view = shell.pay().await?;
    println!("{}", screen::draw(&view, config.terminal.debug));

    if view.state == TerminalState::Success {
        info!("{}", view.status_message);
        Ok(ExitCode::SUCCESS)
    } else {
        error!("transaction declined: {}", view.status_message);
        Ok(ExitCode::FAILURE)
    }
}

async fn kernels<T: Transport>(config: &ShellConfig, transport: T) -> Result<ExitCode> {
    let mut shell = Shell::new(config, transport);

    let view = shell.list_kernels().await?;
    if let Some(e) = view.error_message {
        bail!("failed to list kernels: {e}");
    }

    print_versions(&view.available_kernels);
    Ok(ExitCode::SUCCESS)
}

async fn diagnose<T: Transport>(config: &ShellConfig, transport: T) -> Result<ExitCode> {
    let mut shell = Shell::new(config, transport);
    let store = shell.store().clone();

    println!("storage: {}", store.path().display());
    let entries = store.entries().await?;
    if entries.is_empty() {
        println!("  (empty)");
    }
    for (key, value) in &entries {
        println!("  {key} = {value}");
    }

    match entries.get(DEVICE_ID_KEY) {
        Some(id) => println!("device id format: {:?}", DeviceIdFormat::classify(id)),
        None => println!("device id: not registered"),
    }

    println!(
        "configuration:\n{}",
        serde_json::to_string_pretty(&config.terminal).context("failed to serialize config")?
    );

    if config.terminal.kernel_service_url.is_some() {
        let view = shell.check_health().await?;
        println!(
            "kernel service: {}",
            view.kernel_service.as_deref().unwrap_or("unreachable")
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn print_versions(versions: &[String]) {
    if versions.is_empty() {
        println!("no kernels available");
    }
    for version in sort_versions(versions) {
        println!("{version}");
    }
}

/// Newest semantic version first; anything unparseable goes last
pub fn sort_versions(versions: &[String]) -> Vec<String> {
    let mut sorted = versions.to_vec();
    sorted.sort_by_key(|version| Reverse(Version::parse(version.trim_start_matches('v')).ok()));
    sorted
}
