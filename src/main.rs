use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use transcript_grabber::host::{self, SnapshotSource};
use transcript_grabber::{
    dispatch, Config, ExtractionContext, HtmlDocument, Outcome, ReqwestFetcher, TokioClock,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = Command::new("Transcript Grabber")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Extract clean lesson transcripts from video pages")
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("Page the transcript belongs to")
                .required(true)
        )
        .arg(
            Arg::new("html")
                .long("html")
                .value_name("FILE")
                .help("Saved page snapshot to use instead of downloading the URL")
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the transcript to a file instead of stdout")
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the outcome as JSON")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let config_path = matches.get_one::<String>("config").map(PathBuf::from);

    // Load configuration before logging so the log filter can come from it
    let config_result = Config::load(config_path.as_deref());
    let config = match &config_result {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };

    // Initialize logging
    let filter = if verbose {
        EnvFilter::new("transcript_grabber=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.output.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = &config_result {
        warn!("Failed to load config, using defaults: {:#}", e);
    }
    config.validate()?;
    debug!("{}", config.summary());

    let url = matches
        .get_one::<String>("url")
        .ok_or_else(|| anyhow!("--url is required"))?;
    let page_url = host::parse_page_url(url)?;
    let json = matches.get_flag("json") || config.output.json;

    info!("🚀 Transcript Grabber starting...");
    info!("🔗 Page: {}", page_url);

    let fetcher = ReqwestFetcher::new(config.http.timeout, &config.http.user_agent);
    let snapshot_path = matches.get_one::<String>("html").map(PathBuf::from);
    let source = match &snapshot_path {
        Some(path) => SnapshotSource::File(path),
        None => SnapshotSource::Remote(&page_url),
    };
    let html = host::load_snapshot(source, &fetcher).await?;

    let document = HtmlDocument::parse(&html).with_viewport(config.viewport());
    let clock = TokioClock;
    let (status_tx, mut status_rx) = mpsc::unbounded_channel();
    let ctx = ExtractionContext::new(page_url, &document, &fetcher, &clock).with_status(status_tx);

    let start_time = std::time::Instant::now();
    let extraction = async move {
        let outcome = dispatch::extract(&ctx).await;
        // Dropping the context closes the status channel
        drop(ctx);
        outcome
    };
    let progress = async {
        while let Some(event) = status_rx.recv().await {
            info!("⏳ {}", event.message);
        }
    };
    let (outcome, ()) = tokio::join!(extraction, progress);
    info!("🎉 Finished in {:.2}s", start_time.elapsed().as_secs_f64());

    let rendered = if json {
        serde_json::to_string_pretty(&outcome)?
    } else {
        match &outcome {
            Outcome::Transcript(text) => text.clone(),
            Outcome::Error(failure) => format!("{} ({})", outcome.user_message(), failure.detail),
        }
    };

    match matches.get_one::<String>("output") {
        Some(path) if outcome.is_transcript() || json => {
            tokio::fs::write(path, format!("{}\n", rendered)).await?;
            info!("💾 Saved to {}", path);
        }
        _ if outcome.is_transcript() || json => println!("{}", rendered),
        _ => eprintln!("{}", rendered),
    }

    match &outcome {
        Outcome::Transcript(_) => {
            info!("✅ {}", outcome.user_message());
            Ok(())
        }
        Outcome::Error(failure) => Err(anyhow!("{}", failure)),
    }
}
