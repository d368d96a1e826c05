use cafelog::{BrokerConfig, BrokerServer, HttpOpsServer, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "cafelog")]
#[command(about = "A lightweight, in-memory, Kafka-inspired message broker")]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// TCP port for the framed broker protocol.
    #[arg(short, long, default_value = "7070")]
    port: u16,

    /// HTTP port for the liveness and metrics endpoint.
    #[arg(long, default_value = "8080")]
    http_port: u16,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(parse_log_level(&args.log_level))
        .init();

    info!("Starting cafelog broker on {}:{}", args.host, args.port);
    info!("Ops endpoint on {}:{}", args.host, args.http_port);

    let config = BrokerConfig {
        host: args.host,
        port: args.port,
        http_port: args.http_port,
        ..Default::default()
    };

    let server = BrokerServer::new(config.clone())?;
    let shutdown = server.shutdown_handle();

    // Ops endpoint runs beside the broker and stops with it.
    let ops = HttpOpsServer::new(server.metrics(), &config.host, config.http_port);
    let mut ops_shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            result = ops.run() => {
                if let Err(e) = result {
                    error!("ops endpoint error: {}", e);
                }
            }
            _ = ops_shutdown_rx.recv() => {
                info!("shutting down ops endpoint");
            }
        }
    });

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received, stopping broker");
        let _ = shutdown.send(());
    });

    // A bind failure propagates out of run() and exits non-zero.
    server.run().await?;

    info!("cafelog shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => {
            warn!("Invalid log level '{}', defaulting to 'info'", level);
            tracing::Level::INFO
        }
    }
}
