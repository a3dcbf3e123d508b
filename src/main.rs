use clap::Parser;
use std::sync::Arc;

mod archive;
mod config;
mod handler;
mod http;
mod logger;
mod server;

/// Serve byte ranges of one archive file over HTTP
#[derive(Parser, Debug)]
#[command(name = "archive-range-server", version, long_about = None)]
#[command(after_help = "Environment variables prefixed with SERVER_ override the file, \
e.g. SERVER_ARCHIVE__PATH=/data/wikipedia.zim")]
struct Args {
    /// Configuration file without extension
    #[arg(short, long, default_value = "config")]
    config: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let cfg = config::Config::load_from(&args.config)?;
    cfg.validate()?;
    logger::init(&cfg)?;

    // The archive must be readable before any request is served
    let source = archive::ArchiveSource::open(&cfg.archive.path).map_err(|e| {
        let msg = format!("Failed to open archive '{}': {e}", cfg.archive.path);
        logger::log_error(&msg);
        msg
    })?;

    // Create Tokio runtime, honoring the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, source))
}

async fn async_main(
    cfg: config::Config,
    source: archive::ArchiveSource,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr, cfg.server.backlog)?;

    logger::log_server_start(&addr, &cfg, source.size());

    let signals = server::SignalHandler::new();
    server::start_signal_handler(&signals);

    let state = Arc::new(config::AppState::new(cfg, source));
    server::start_server_loop(listener, state, Arc::clone(&signals.shutdown)).await;

    Ok(())
}
