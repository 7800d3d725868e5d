//! Wiring & DI. Entry point: bootstrap adapters, inject into the cleanup service, run once.
//! No business logic here.
//!
//! Usage: `user-cleanup <user-id>`

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use user_cleanup::adapters::logging::TracingSink;
use user_cleanup::adapters::persistence::{SqliteStore, UploadDir};
use user_cleanup::ports::{CleanupSink, MediaFiles};
use user_cleanup::shared::config::AppConfig;
use user_cleanup::usecases::{CleanupStores, UserCleanupService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let Some(user_id) = std::env::args().nth(1) else {
        anyhow::bail!("usage: user-cleanup <user-id>");
    };

    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("config: {}", e))?;
    let options = cfg.reconcile_options();
    info!(
        remove_empty_conversations = options.remove_empty_conversations,
        new_creator_selection = ?options.new_creator_selection,
        "reconciliation policy"
    );

    let store = Arc::new(
        SqliteStore::connect(cfg.data_dir_or_default())
            .await
            .map_err(|e| anyhow::anyhow!("store connect failed: {}", e))?,
    );
    let files: Arc<dyn MediaFiles> = Arc::new(UploadDir::new(cfg.uploads_dir_or_default()));
    let sink: Arc<dyn CleanupSink> = Arc::new(TracingSink);

    let service = UserCleanupService::new(CleanupStores::from_shared(store), files, sink, options);

    let report = service
        .cleanup_user(&user_id)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    for outcome in &report.outcomes {
        info!(task = %outcome.task, status = ?outcome.status, "task settled");
    }
    if !report.all_completed() {
        warn!(user_id = %report.user_id, "cleanup finished with failures; see log above");
    }

    Ok(())
}
