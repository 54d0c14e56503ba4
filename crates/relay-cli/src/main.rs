use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use relay_core::load_account_config;
use relay_media::FfmpegTranscoder;
use relay_reddit::RedditClient;
use relay_twitter::TwitterClient;
use tracing_subscriber::EnvFilter;

mod fetch;
mod pipeline;

use fetch::HttpFetcher;
use pipeline::PublishPipeline;

#[derive(Debug, Parser)]
#[command(name = "relaybot")]
#[command(about = "Relay the top media post of a subreddit to Twitter", version)]
struct Cli {
    /// Account name, a top-level key of the config file.
    account: String,

    /// Path to the JSON account configuration.
    config: PathBuf,

    /// Select, download, shrink and compose, but do not upload or post.
    #[arg(long)]
    dry_run: bool,

    /// Append log output to this file instead of writing to stderr.
    #[arg(long, env = "RELAYBOT_ERROR_LOG")]
    error_log: Option<PathBuf>,
}

fn init_tracing(error_log: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    match error_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.error_log.as_deref())?;

    let config = load_account_config(&cli.config, &cli.account).with_context(|| {
        format!(
            "failed to load account '{}' from {}",
            cli.account,
            cli.config.display()
        )
    })?;
    tracing::debug!(?config, "loaded account config");

    let timeout_secs = config.request_timeout_secs;
    let feed = RedditClient::new(config.reddit.clone(), timeout_secs)?;
    let fetcher = HttpFetcher::new(timeout_secs)?;
    let publisher = TwitterClient::new(config.twitter.clone(), timeout_secs)?;
    let pipeline = PublishPipeline::new(
        &config,
        feed,
        fetcher,
        publisher,
        FfmpegTranscoder::default(),
    )?
    .with_dry_run(cli.dry_run);

    tracing::info!(
        account = %config.account,
        subreddit = %config.subreddit,
        dry_run = cli.dry_run,
        "starting run"
    );

    let run_timeout = Duration::from_secs(config.run_timeout_secs);
    let result = tokio::time::timeout(run_timeout, pipeline.run())
        .await
        .map_err(|_| {
            tracing::error!(timeout_secs = config.run_timeout_secs, "run timed out");
            anyhow::anyhow!("run exceeded {}s", config.run_timeout_secs)
        })??;

    match result.post_id {
        Some(post_id) => {
            tracing::info!(post_id = %post_id, bytes = result.media_bytes, "run complete");
            println!("{post_id}");
        }
        None => println!("{}", result.message),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
