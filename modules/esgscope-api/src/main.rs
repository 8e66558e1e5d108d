use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::{AzureOpenAi, Gemini, GenerationProvider, OpenRouter};
use esgscope_common::Config;
use esgscope_pipeline::extract::PlainTextExtractor;
use esgscope_pipeline::filter::KeywordSets;
use esgscope_pipeline::orchestrator::PipelineDeps;

mod job_store;
mod rest;

use job_store::{InMemoryJobStore, JobStore};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn JobStore>,
    pub deps: PipelineDeps,
}

fn provider_from_config(config: &Config) -> Result<Arc<dyn GenerationProvider>> {
    match config.llm_provider.to_lowercase().as_str() {
        "openrouter" => Ok(Arc::new(
            OpenRouter::new(
                config.openrouter_api_key.clone(),
                config.openrouter_model.clone(),
            )
            .with_app_name("ESGScope"),
        )),
        "azure_openai" => Ok(Arc::new(
            AzureOpenAi::new(
                config.azure_openai_endpoint.clone(),
                config.azure_openai_api_key.clone(),
                config.azure_openai_deployment.clone(),
            )
            .with_api_version(config.azure_openai_api_version.clone()),
        )),
        "gemini" => Ok(Arc::new(Gemini::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        ))),
        other => Err(anyhow::anyhow!("Unsupported LLM_PROVIDER: {other}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("esgscope=info".parse()?))
        .init();

    let config = Config::from_env();
    let provider = provider_from_config(&config)?;

    let deps = PipelineDeps {
        extractor: Arc::new(PlainTextExtractor),
        provider,
        keywords: KeywordSets::from_config(&config),
    };

    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new(Duration::from_secs(
        config.job_ttl_seconds,
    )));

    let body_limit = config.max_total_bytes() as usize;
    let addr = format!("{}:{}", config.host, config.port);

    let cors_origins: Vec<HeaderValue> = config
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let state = Arc::new(AppState {
        config,
        store,
        deps,
    });

    let app = Router::new()
        .route("/", get(rest::health))
        .route("/api/extract", post(rest::extract))
        .route("/api/extract_sync", post(rest::extract_sync))
        .route("/api/jobs/{job_id}", get(rest::job_status))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(cors_origins)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    info!("ESGScope API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
