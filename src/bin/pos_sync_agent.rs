use anyhow::{Context, Result, bail};
use pos_sync::{AppConfig, AppState, DrainOutcome, init_logging};
use std::env;

const TOKEN_ENV: &str = "POS_SYNC_BEARER_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Daemon,
    DrainOnce,
    ListFailed,
}

fn usage() -> &'static str {
    "Usage: pos_sync_agent [--drain-once | --list-failed]"
}

fn parse_args() -> Result<RunMode> {
    let mut mode = RunMode::Daemon;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--drain-once" => mode = RunMode::DrainOnce,
            "--list-failed" => mode = RunMode::ListFailed,
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => bail!("unknown argument: {other}\n{}", usage()),
        }
    }
    Ok(mode)
}

#[tokio::main]
async fn main() -> Result<()> {
    let mode = parse_args()?;
    init_logging();

    let config = AppConfig::from_env();
    let state = AppState::new(config)
        .await
        .context("failed to initialise sync engine")?;

    if let Ok(token) = env::var(TOKEN_ENV) {
        state.credentials.set_token(token).await;
    }

    match mode {
        RunMode::DrainOnce => {
            let outcome = state
                .replay_engine
                .drain(pos_sync::DrainTrigger::Manual)
                .await?;
            match outcome {
                DrainOutcome::Completed(report) => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                DrainOutcome::AlreadyRunning => println!("drain already running"),
            }
        }
        RunMode::ListFailed => {
            use pos_sync::application::ports::CommandQueueStore;

            let failed = state.queue.list_failed().await?;
            println!("{}", serde_json::to_string_pretty(&failed)?);
        }
        RunMode::Daemon => {
            let scheduler = state.start_scheduler();
            if let Err(err) = scheduler.request_drain().await {
                tracing::warn!(error = %err, "startup drain failed");
            }

            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for shutdown signal")?;
            tracing::info!("shutting down");
            scheduler.shutdown().await;
        }
    }

    state.db_pool.close().await;
    Ok(())
}
