mod cli;
mod commands;
mod config;
mod error;
mod output;

use crate::{
    cli::{Args, Commands},
    commands::CommandExecutor,
    config::AppConfig,
    error::Result,
};
use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use std::process;
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let output_format = args.output;

    if let Err(e) = run(args).await {
        if output_format.is_json() {
            let error_json = serde_json::json!({
                "status": "error",
                "message": e.to_string(),
            });
            println!("{error_json}");
        } else {
            error!("Application error: {}", e);
            #[cfg(feature = "colored-output")]
            {
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
            #[cfg(not(feature = "colored-output"))]
            {
                eprintln!("Error: {}", e);
            }
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    let config = AppConfig::load(args.config.as_deref())?;
    let executor = CommandExecutor::new(config, args.timeout, args.output);

    match args.command {
        Commands::Search { query, mal_id } => {
            executor.search(&query, mal_id.as_deref()).await?;
        }

        Commands::GetEpisodes { anime_url } => {
            executor.episodes(&anime_url).await?;
        }

        Commands::GetStream { episode_url } => {
            executor.stream(&episode_url).await?;
        }

        #[cfg(feature = "regex-filters")]
        Commands::GetAllStreams {
            episode_url,
            probe,
            server_filter,
        } => {
            executor
                .all_streams(&episode_url, probe, server_filter.as_deref())
                .await?;
        }
        #[cfg(not(feature = "regex-filters"))]
        Commands::GetAllStreams { episode_url, probe } => {
            executor.all_streams(&episode_url, probe, None).await?;
        }

        #[cfg(feature = "regex-filters")]
        Commands::Resolve {
            url,
            probe,
            server_filter,
        } => {
            executor
                .resolve(&url, probe, server_filter.as_deref())
                .await?;
        }
        #[cfg(not(feature = "regex-filters"))]
        Commands::Resolve { url, probe } => {
            executor.resolve(&url, probe, None).await?;
        }

        Commands::Channel { id } => {
            executor.channel(&id).await?;
        }

        Commands::Download {
            episode_url,
            output_path,
        } => {
            executor
                .download(&episode_url, output_path.as_deref())
                .await?;
        }

        #[cfg(feature = "interactive")]
        Commands::Interactive => {
            executor.interactive().await?;
        }

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Args::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }

        Commands::Config { show, reset } => {
            if reset {
                AppConfig::reset(args.config.as_deref())?;
                eprintln!("Configuration reset to defaults");
            } else if show {
                let config = AppConfig::load(args.config.as_deref())?;
                print!("{}", config.show()?);
            } else {
                eprintln!(
                    "Use --show to display current configuration or --reset to reset to defaults"
                );
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout only ever carries command output.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
