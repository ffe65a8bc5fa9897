//! `md2pdf-server` binary.
//!
//! ```text
//! md2pdf-server --port 3000 --chrome-path /usr/bin/chromium
//! curl --data-binary @README.md localhost:3000/utils/convert-pdf -o output.pdf
//! ```

use std::sync::Arc;

use clap::Parser;
use md2pdf_server::integrations::axum::router;
use md2pdf_server::{HealthMonitor, init_browser_pool};
use tokio::signal;

/// Markdown to PDF HTTP service.
#[derive(Debug, Parser)]
#[command(name = "md2pdf-server", version, about)]
struct Cli {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Chrome/Chromium binary. Auto-detected when not set.
    #[arg(long, env = "CHROME_PATH")]
    chrome_path: Option<String>,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!(" Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!(" Starting md2pdf-server on port {}", cli.port);

    // Never fails on an unavailable browser, only on bad configuration
    let pool = init_browser_pool(cli.chrome_path).await?;

    let mut monitor = HealthMonitor::start(Arc::clone(&pool));

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", cli.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("❌ Failed to bind port {}: {}", cli.port, e);
            monitor.stop_async().await;
            pool.shutdown();
            return Err(e.into());
        }
    };
    log::info!("✅ Listening on http://{}", listener.local_addr()?);

    let served = axum::serve(listener, router(Arc::clone(&pool)))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    monitor.stop_async().await;
    pool.shutdown();

    served?;
    log::info!("✅ Server stopped");
    Ok(())
}
