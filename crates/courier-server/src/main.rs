use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use courier_api::auth::{AppState, AppStateInner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("COURIER_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("COURIER_DB_PATH").unwrap_or_else(|_| "courier.db".into());
    let host = std::env::var("COURIER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("COURIER_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let upload_dir: PathBuf = std::env::var("COURIER_UPLOAD_DIR")
        .unwrap_or_else(|_| "./uploads".into())
        .into();
    let profile_pic_dir: PathBuf = std::env::var("COURIER_PROFILE_PIC_DIR")
        .unwrap_or_else(|_| "./profile_pics".into())
        .into();

    // Init database and storage directories
    let db = courier_db::Database::open(&PathBuf::from(&db_path))?;
    tokio::fs::create_dir_all(&upload_dir).await?;
    tokio::fs::create_dir_all(&profile_pic_dir).await?;

    // Optional admin bootstrap: promote an already-registered username
    if let Ok(admin_username) = std::env::var("COURIER_ADMIN_USERNAME") {
        match db.get_user_by_username(&admin_username)? {
            Some(user) => {
                db.set_admin(user.id, true)?;
                info!("Granted admin to '{}'", admin_username);
            }
            None => info!(
                "COURIER_ADMIN_USERNAME '{}' is not registered yet, skipping",
                admin_username
            ),
        }
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        upload_dir,
        profile_pic_dir,
    });

    let app = courier_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Courier server listening on {}", addr);

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
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
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
