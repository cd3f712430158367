//! # Paypers Walker
//!
//! Runs the listing walker once against the live site and writes every
//! extracted document as a JSON line.
//!
//! ## Usage
//!
//! ```sh
//! RUST_LOG=paypers_walker=debug paypers_walker --from-date 2024-08-01 -o ./out/thepaypers.jsonl
//! ```
//!
//! Scheduling, deduplication and storage are left to whoever runs the binary.

use std::error::Error;

use clap::Parser;
use paypers_walker::cli::Cli;
use paypers_walker::logging::init_logging;
use paypers_walker::{
    HttpSession, JsonLinesSink, ListingWalker, ReqwestFetcher, Restrictions, Termination,
    WalkerConfig,
};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr; stdout carries documents) ---
    init_logging();

    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => WalkerConfig::load(path)?,
        None => WalkerConfig::default(),
    };
    args.apply(&mut config);
    info!(
        reference = %config.reference,
        listing = %config.listing_url,
        from_date = ?config.restrictions.from_date,
        "paypers_walker starting up"
    );

    let settings = config.walker_settings()?;
    let fetcher = ReqwestFetcher::new(&config.user_agent, config.wait_timeout())?;
    let session = HttpSession::new(fetcher).with_poll_interval(config.poll_interval());
    let restrictions = Restrictions::new(config.restrictions.clone());
    let sink = match &args.output {
        Some(path) => JsonLinesSink::create(path).await?,
        None => JsonLinesSink::stdout(),
    };

    let mut walker = ListingWalker::new(session, restrictions, sink, settings);
    let summary = match walker.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, written = walker.sink().written(), "Run aborted");
            return Err(e.into());
        }
    };

    match &summary.termination {
        Termination::Exhausted => info!("No further listing pages"),
        Termination::DateBoundReached { link, published } => {
            info!(%link, %published, "Stopped at the lower date bound")
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        emitted = summary.emitted,
        pages = summary.pages,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
