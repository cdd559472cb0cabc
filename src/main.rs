//! limnopapers binary entrypoint.
//! Parses flags, loads `.env` and configuration, and runs one curation pass.

use clap::Parser;
use limnopapers::app::{run, RunOptions};
use limnopapers::config::AppConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Curate limnology papers from journal feeds
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Post novel papers without asking (capped per run)
    #[arg(long)]
    tweet: bool,

    /// Ask before posting each paper
    #[arg(long)]
    interactive: bool,

    /// Open every novel paper in the browser
    #[arg(long)]
    browser: bool,

    /// Also write intermediate candidate sets to CSV
    #[arg(long)]
    debug: bool,

    /// Log every novel paper as ignored without posting (history backfill)
    #[arg(long = "ignore-all")]
    ignore_all: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("limnopapers=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env when present; credentials may live there.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();
    let cfg = AppConfig::load_default()?;
    let opts = RunOptions {
        tweet: args.tweet,
        interactive: args.interactive,
        browser: args.browser,
        debug: args.debug,
        ignore_all: args.ignore_all,
    };

    if let Some(report) = run(opts, &cfg).await? {
        if report.disabled {
            tracing::warn!("no posting credentials found, nothing was posted");
        }
    }
    Ok(())
}
