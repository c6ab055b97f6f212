use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use docpipe::application::ports::{ArtifactStore, JobRepository, TranscriptIndex};
use docpipe::application::services::stages::{
    ExportStage, GenerateStage, IndexStage, TranscribeStage, ValidateStage,
};
use docpipe::application::services::{
    JobQueue, PipelineScheduler, PipelineService, PipelineStages, StageHarness,
};
use docpipe::infrastructure::audio::OpenAiWhisperTranscriber;
use docpipe::infrastructure::documents::{
    LocalExporter, PdfFont, PdfRenderer, TranscriptDocumentGenerator,
};
use docpipe::infrastructure::llm::EmbedderFactory;
use docpipe::infrastructure::media::MediaValidator;
use docpipe::infrastructure::observability::{TracingConfig, init_tracing};
use docpipe::infrastructure::persistence::{
    InMemoryJobRepository, InMemoryTranscriptIndex, PgJobRepository, PgTranscriptIndex,
    create_pool, run_migrations,
};
use docpipe::infrastructure::storage::ObjectArtifactStore;
use docpipe::presentation::config::{PersistenceMode, StorageProviderSetting};
use docpipe::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(&TracingConfig::new(environment));

    let config = Arc::new(settings.pipeline_configuration()?);
    tracing::info!(
        workers = config.worker_count,
        embedding_dimension = config.embedding_dimension,
        "Pipeline configuration loaded"
    );

    let store: Arc<dyn ArtifactStore> = match settings.storage.provider {
        StorageProviderSetting::Local => Arc::new(ObjectArtifactStore::local(
            settings.storage.local_path.clone().into(),
        )?),
        StorageProviderSetting::Memory => Arc::new(ObjectArtifactStore::in_memory()),
    };

    let (repository, index): (Arc<dyn JobRepository>, Arc<dyn TranscriptIndex>) =
        match settings.database.persistence {
            PersistenceMode::Memory => {
                tracing::warn!("Using in-memory persistence; jobs do not survive a restart");
                (
                    Arc::new(InMemoryJobRepository::new()),
                    Arc::new(InMemoryTranscriptIndex::new(
                        config.embedding_dimension,
                        config.distance_metric,
                    )),
                )
            }
            PersistenceMode::Postgres => {
                let url = settings
                    .database
                    .url
                    .as_deref()
                    .context("APP_DATABASE__URL is required for postgres persistence")?;
                let pool = create_pool(url, settings.database.max_connections).await?;
                if settings.database.run_migrations {
                    run_migrations(&pool).await?;
                }
                (
                    Arc::new(PgJobRepository::new(pool.clone())),
                    Arc::new(PgTranscriptIndex::new(
                        pool,
                        config.embedding_dimension,
                        config.distance_metric,
                    )),
                )
            }
        };

    let embedder = EmbedderFactory::create(&settings.embeddings, &settings.openai)?;
    let api_key = settings
        .openai
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .context("APP_OPENAI__API_KEY is required for transcription")?;
    let transcriber = Arc::new(OpenAiWhisperTranscriber::new(
        Arc::clone(&store),
        api_key,
        settings.openai.base_url.clone(),
        Some(settings.openai.transcription_model.clone()),
    ));

    let mut pdf = PdfRenderer::bundled();
    if let Some(path) = &settings.documents.pdf_fallback_font {
        pdf = pdf.with_fallback(PdfFont::load(path)?);
        tracing::info!(font = %path, "PDF fallback font loaded");
    }

    let stages = PipelineStages {
        validating: Arc::new(ValidateStage::new(Arc::new(MediaValidator::new(
            Arc::clone(&store),
            settings.media.max_file_size_bytes(),
        )))),
        transcribing: Arc::new(TranscribeStage::new(transcriber, Arc::clone(&store))),
        indexing: Arc::new(IndexStage::new(
            Arc::clone(&store),
            Arc::clone(&embedder),
            Arc::clone(&index),
        )),
        generating: Arc::new(GenerateStage::new(
            Arc::clone(&embedder),
            Arc::clone(&index),
            Arc::new(TranscriptDocumentGenerator::new(Arc::clone(&store))),
            config.retrieval_top_k,
        )),
        exporting: Arc::new(ExportStage::new(Arc::new(
            LocalExporter::new(Arc::clone(&store)).with_pdf_renderer(pdf),
        ))),
    };

    let queue = Arc::new(JobQueue::new());
    let scheduler = Arc::new(PipelineScheduler::new(
        Arc::clone(&repository),
        StageHarness::new(stages, Arc::clone(&config)),
        Arc::clone(&queue),
        Arc::clone(&config),
    ));
    scheduler.recover().await?;

    let shutdown = CancellationToken::new();
    let workers = Arc::clone(&scheduler).spawn(shutdown.clone());

    let state = AppState {
        pipeline: Arc::new(PipelineService::new(repository, index, queue)),
        store,
        max_upload_bytes: settings.media.max_file_size_bytes(),
    };
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = %environment, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "Pipeline task ended abnormally");
        }
    }
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        }
        _ = shutdown.cancelled() => {}
    }
}
