use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use melody_api::uploads::UploadDir;
use melody_api::{AppState, AppStateInner};
use melody_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "melody_server=debug,melody_api=debug,melody_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let host = std::env::var("MELODY_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port: u16 = std::env::var("MELODY_PORT")
        .unwrap_or_else(|_| "5000".into())
        .parse()?;
    let db_path: PathBuf = std::env::var("MELODY_DB_PATH")
        .unwrap_or_else(|_| "melody.db".into())
        .into();
    let upload_dir: PathBuf = std::env::var("MELODY_UPLOAD_DIR")
        .unwrap_or_else(|_| "uploads".into())
        .into();
    let index_path: PathBuf = std::env::var("MELODY_INDEX_PATH")
        .unwrap_or_else(|_| "Melody.html".into())
        .into();

    // Init database and upload storage
    let db = Database::open(&db_path)?;
    let uploads = UploadDir::new(upload_dir).await?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        uploads,
        index_path,
    });

    let app = melody_api::router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Backend running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("SIGTERM handler unavailable: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
