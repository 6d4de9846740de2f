//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use studyforge::adapters::ai::{MockAiAdapter, OpenAiAdapter};
use studyforge::adapters::persistence::{MemoryRepo, SqliteRepo};
use studyforge::adapters::ui::tui::TuiInputPort;
use studyforge::ports::{AiPort, InputPort, StudyRepoPort};
use studyforge::shared::config::AppConfig;
use studyforge::usecases::{GenerationLimits, GenerationService, LibraryService};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

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

    studyforge::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config could not be loaded, using defaults");
        AppConfig::default()
    });

    let data_path = PathBuf::from(cfg.data_dir_or_default());
    tokio::fs::create_dir_all(&data_path)
        .await
        .map_err(|e| anyhow::anyhow!("create data dir {}: {}", data_path.display(), e))?;
    let data_dir_abs = data_path
        .canonicalize()
        .unwrap_or_else(|_| data_path.clone());
    info!(path = %data_dir_abs.display(), "data directory");

    // --- AI provider ---
    let ai: Arc<dyn AiPort> = if cfg.is_ai_configured() {
        info!(
            model = %cfg.ai_model_or_default(),
            url = %cfg.ai_api_url_or_default(),
            "AI generation enabled with OpenAI adapter"
        );
        Arc::new(OpenAiAdapter::new(
            cfg.ai_api_url_or_default(),
            cfg.ai_api_key().unwrap_or_default(),
            cfg.ai_model_or_default(),
            Duration::from_secs(cfg.ai_timeout_secs_or_default()),
        ))
    } else {
        warn!("STUDYFORGE_AI_API_KEY not set, using mock AI adapter");
        Arc::new(MockAiAdapter::new())
    };

    // --- Storage: SQLite, or in-memory when the database cannot be opened ---
    let repo: Arc<dyn StudyRepoPort> = match SqliteRepo::connect(&data_path).await {
        Ok(sqlite) => {
            info!(path = %sqlite.path().display(), "study sets stored in SQLite");
            Arc::new(sqlite)
        }
        Err(e) => {
            warn!(error = %e, "SQLite unavailable, study sets will not persist after exit");
            Arc::new(MemoryRepo::new())
        }
    };

    // --- Services ---
    let limits = GenerationLimits::from(&cfg);
    info!(
        max_items = limits.max_items,
        min_content_chars = limits.min_content_chars,
        temperature = limits.temperature,
        "generation limits"
    );
    let generation = Arc::new(GenerationService::new(
        Arc::clone(&ai),
        Arc::clone(&repo),
        limits,
    ));
    let library = Arc::new(LibraryService::new(
        Arc::clone(&repo),
        data_path.join("exports"),
    ));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(generation, library));

    // --- Run (main menu) ---
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
