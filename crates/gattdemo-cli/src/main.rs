use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use gattdemo_core::Workflow;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod screen;
mod style;
mod util;

use cli::{Cli, Commands, RequestArgs};
use config::Config;

fn env_filter(cli: &Cli, config: &Config) -> EnvFilter {
    if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(config.log_level.as_deref().unwrap_or("info"))
                .unwrap_or_else(|_| EnvFilter::new("info"))
        })
    }
}

async fn build_workflow(config: &mut Config, request: &RequestArgs) -> Result<Workflow> {
    config.apply(request);
    let options = config.request_options()?;
    let platform = util::build_platform(config, request.mock, util::is_interactive()).await?;
    Ok(Workflow::new(platform, options))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "gattdemo", &mut io::stdout());
        return Ok(());
    }

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let mut config = Config::load_from(&config_path);

    // Logs go to stderr so they do not interleave with the screen
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&cli, &config))
        .with_writer(io::stderr)
        .init();
    tracing::debug!("Using config file {}", config_path.display());

    let no_color = cli.no_color || config.no_color;

    match cli.command {
        None => {
            let workflow = build_workflow(&mut config, &RequestArgs::default()).await?;
            let opts = commands::RunOptions {
                no_color,
                quiet: cli.quiet,
                interactive: util::is_interactive(),
                ..Default::default()
            };
            commands::cmd_run(&workflow, &opts).await?;
        }
        Some(Commands::Run {
            request,
            auto,
            log_json,
        }) => {
            let workflow = build_workflow(&mut config, &request).await?;
            let opts = commands::RunOptions {
                auto,
                log_json,
                no_color,
                quiet: cli.quiet,
                interactive: util::is_interactive(),
            };
            commands::cmd_run(&workflow, &opts).await?;
        }
        Some(Commands::Known { request, json }) => {
            let workflow = build_workflow(&mut config, &request).await?;
            commands::cmd_known(&workflow, json, no_color).await?;
        }
        Some(Commands::Config { action }) => {
            commands::cmd_config(action, &config_path, &config)?;
        }
        Some(Commands::Completions { .. }) => {
            // Already handled above
            unreachable!()
        }
    }

    Ok(())
}
