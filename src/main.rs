use clap::Parser;
use pingora_core::server::configuration::Opt;
use pingora_core::server::Server;
use shashin::config::Config;
use shashin::metrics::Metrics;
use shashin::server::{RequestHandler, ShashinService};
use std::path::PathBuf;
use std::sync::Arc;

/// Shashin - on-the-fly image transformation service built with Cloudflare's Pingora
#[derive(Parser, Debug)]
#[command(name = "shashin")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Daemon mode
    #[arg(short = 'd', long)]
    daemon: bool,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Upgrade workers gracefully
    #[arg(long)]
    upgrade: bool,
}

fn exit_with(message: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", message, err);
    std::process::exit(1);
}

fn main() {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .unwrap_or_else(|e| exit_with("Failed to load configuration", e));
    if let Err(e) = config.validate() {
        exit_with("Invalid configuration", e);
    }

    if let Err(e) = shashin::logging::init_subscriber(&config.logging) {
        exit_with("Failed to initialize logging subsystem", e);
    }

    tracing::info!(
        config_file = %args.config.display(),
        server_address = %config.server.address,
        server_port = config.server.port,
        presets = config.presets.len(),
        cache_enabled = config.cache.enabled,
        auto_webp = config.image.auto_webp,
        "Configuration loaded successfully"
    );

    // The S3 client is built once, outside pingora's runtimes
    let metrics = Arc::new(Metrics::new());
    let runtime = tokio::runtime::Runtime::new()
        .unwrap_or_else(|e| exit_with("Failed to start setup runtime", e));
    let handler = runtime
        .block_on(RequestHandler::from_config(&config, Arc::clone(&metrics)))
        .unwrap_or_else(|e| exit_with("Failed to build request handler", e));
    drop(runtime);

    let opt = Opt {
        daemon: args.daemon,
        test: args.test,
        upgrade: args.upgrade,
        ..Default::default()
    };

    let mut server =
        Server::new(Some(opt)).unwrap_or_else(|e| exit_with("Failed to create Pingora server", e));
    server.bootstrap();

    let service = ShashinService::new(Arc::new(handler));
    let mut http_service = pingora_proxy::http_proxy_service(&server.configuration, service);
    http_service.threads = Some(config.server.threads);

    let listen_addr = config.server.listen_addr();
    http_service.add_tcp(&listen_addr);

    tracing::info!(
        address = %listen_addr,
        threads = config.server.threads,
        "Starting Shashin image service"
    );

    server.add_service(http_service);
    server.run_forever();
}
