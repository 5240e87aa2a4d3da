use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use medscribe::application::services::{
    IngestionService, ModelCache, SummaryConfig, SummaryService, TranscriptionService,
};
use medscribe::infrastructure::audio::CandleWhisperLoader;
use medscribe::infrastructure::emr::EmrProxy;
use medscribe::infrastructure::llm::OpenAiCompatibleClient;
use medscribe::infrastructure::observability::{TracingConfig, init_tracing};
use medscribe::infrastructure::storage::LocalStagingStore;
use medscribe::presentation::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (settings, environment) = Settings::load().context("Failed to load settings")?;

    let tracing_config = TracingConfig::new(
        environment.as_str(),
        settings.logging.enable_json,
        settings.logging.level.clone(),
    );
    init_tracing(&tracing_config, settings.server.port);

    let staging_store = Arc::new(
        LocalStagingStore::new(PathBuf::from(&settings.upload.upload_dir))
            .context("Failed to prepare upload directory")?,
    );
    tracing::info!(upload_dir = %staging_store.base_path().display(), "Staging store ready");

    let model_cache = Arc::new(ModelCache::new(Arc::new(CandleWhisperLoader::new())));
    let transcription_service = Arc::new(TranscriptionService::new(model_cache));

    let llm_client = Arc::new(
        OpenAiCompatibleClient::new(Duration::from_secs(settings.llm.request_timeout_secs))
            .context("Failed to build LLM client")?,
    );
    let summary_service = Arc::new(SummaryService::new(
        llm_client,
        SummaryConfig {
            provider: settings.llm.provider.clone(),
            openai_api_key: settings.llm.openai_api_key.clone(),
            ollama_base_url: settings.llm.ollama_base_url.clone(),
            prompt_path: PathBuf::from(&settings.llm.prompt_path),
        },
    ));
    tracing::info!(provider = %settings.llm.provider, "Summary service ready");

    let ingestion_service = Arc::new(IngestionService::new(
        staging_store,
        transcription_service,
        Arc::clone(&summary_service),
    ));

    let emr_proxy = match settings.emr.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => {
            let timeout = Duration::from_secs(settings.emr.request_timeout_secs);
            let proxy = EmrProxy::new(url, timeout).context("Failed to build EMR proxy")?;
            tracing::info!(emr_api_url = %proxy.base_url(), "EMR proxy enabled");
            Some(Arc::new(proxy))
        }
        None => {
            tracing::warn!("EMR_API_URL not set; /emr requests will fail");
            None
        }
    };

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        ingestion_service,
        summary_service,
        emr_proxy,
        settings: Arc::new(settings),
    };

    let router = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
