use lookbook::blob::{BlobStore, FsBlobStore};
use lookbook::config::Config;
use lookbook::db::{DbActorHandle, SqliteStore};
use lookbook::utils::logging::with_pretty_json_debug;
use lookbook::{EngineContext, LookbookError, Operation};
use mimalloc::MiMalloc;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        blob_root = %cfg.blob.root.display(),
        public_base_url = %cfg.blob.public_base_url,
        exclusive_voting = cfg.engine.exclusive_voting
    );

    let store = SqliteStore::connect(&cfg.basic.database_url).await?;
    let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::from_config(&cfg.blob));
    let ctx = EngineContext::new(store.clone(), blobs, cfg.engine.clone());
    let handle = lookbook::db::spawn(ctx).await?;

    info!("Reading operations from stdin, one JSON object per line");
    tokio::select! {
        res = serve_lines(&handle) => res?,
        () = shutdown_signal() => info!("Shutdown signal received"),
    }

    handle.stop();
    store.close().await;
    info!("Engine has shut down gracefully.");
    Ok(())
}

/// Answers each input line with `{"ok": outcome}` or an error body.
async fn serve_lines(handle: &DbActorHandle) -> Result<(), LookbookError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<Operation>(&line) {
            Ok(op) => {
                with_pretty_json_debug(&op, |json| debug!(operation = json, "Decoded operation"));
                match handle.execute(op).await {
                    Ok(outcome) => json!({ "ok": outcome }),
                    Err(e) => error_reply(&e)?,
                }
            }
            Err(e) => error_reply(&LookbookError::InvalidRequest(format!(
                "unreadable operation: {e}"
            )))?,
        };

        let mut out = serde_json::to_vec(&reply)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }
    info!("stdin closed");
    Ok(())
}

fn error_reply(e: &LookbookError) -> Result<Value, LookbookError> {
    warn!(code = e.code(), error = %e, "Operation failed");
    Ok(serde_json::to_value(e.to_error_body())?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
