use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env, Target};
use log::{error, info};
use softpos_demo::cli::{self, Cli};
use std::{io::Write, process::ExitCode};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = initialize() {
        eprintln!("failed to initialize: {e:#}");
        return ExitCode::FAILURE;
    }

    match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("application error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn initialize() -> Result<()> {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).try_init()?;

    info!("softpos-demo version: {}", env!("CARGO_PKG_VERSION"));

    Ok(())
}
