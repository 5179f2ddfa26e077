use anyhow::Result;
use clap::Parser;
use persona_engine::cli::{Args, Command};
use persona_engine::config::{runtime_parts, ConfigDiscovery, EngineFileConfig};
use persona_engine::engine::{
    CircuitState, GenerationRequest, MemoryResponseCache, ResponseOrchestrator,
};
use persona_engine::providers::build_providers;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("persona_engine=info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Generate {
            prompt,
            persona,
            context,
            system,
            temperature,
            max_tokens,
            config,
        } => {
            run_generate(
                prompt, persona, context, system, temperature, max_tokens, config,
            )
            .await
        }
        Command::Providers { config } => run_providers(config).await,
        Command::ShowConfig => {
            ConfigDiscovery::show_discovery_info();
            Ok(())
        }
    }
}

fn load_config(override_path: Option<PathBuf>) -> Result<EngineFileConfig> {
    match override_path {
        Some(path) => {
            info!("Loading configuration override from: {:?}", path);
            Ok(EngineFileConfig::from_toml_file(path)?)
        }
        None => Ok(ConfigDiscovery::discover()?),
    }
}

fn build_orchestrator(file_config: EngineFileConfig) -> Result<ResponseOrchestrator> {
    let (engine_config, provider_settings) = runtime_parts(file_config);

    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(5))
        .build()?;

    let providers = build_providers(provider_settings, client);
    if providers.is_empty() {
        warn!("No providers are usable; every request will be served by the demo responder");
    }

    Ok(ResponseOrchestrator::new(
        providers,
        Arc::new(MemoryResponseCache::new()),
        engine_config,
    ))
}

#[allow(clippy::too_many_arguments)]
async fn run_generate(
    prompt: String,
    persona: String,
    context: Option<String>,
    system: Option<String>,
    temperature: f32,
    max_tokens: u32,
    config: Option<PathBuf>,
) -> Result<()> {
    let orchestrator = build_orchestrator(load_config(config)?)?;

    let request = GenerationRequest {
        id: Uuid::new_v4(),
        persona_id: persona,
        prompt,
        context,
        system_prompt: system,
        temperature,
        max_tokens,
    };

    let result = orchestrator.generate(request).await?;

    println!("{}", result.content);
    println!();
    println!(
        "provider: {} | model: {} | finish: {}",
        result.provider_name, result.model_name, result.finish_reason
    );
    println!(
        "tokens: {} prompt + {} completion = {} total",
        result.usage.prompt_tokens, result.usage.completion_tokens, result.usage.total_tokens
    );

    let metrics = orchestrator.metrics().snapshot().await;
    println!(
        "requests: {} ({} cached, {} demo), average latency {:?}",
        metrics.total_requests, metrics.cache_hits, metrics.demo_responses, metrics.average_latency
    );

    Ok(())
}

async fn run_providers(config: Option<PathBuf>) -> Result<()> {
    let orchestrator = build_orchestrator(load_config(config)?)?;

    let names = orchestrator.provider_names();
    if names.is_empty() {
        println!("No providers configured with usable credentials.");
        println!("Requests will be served by the demo responder.");
        return Ok(());
    }

    let statuses = orchestrator.health().status().await;

    println!("Provider rotation (attempt order):");
    for name in &names {
        let Some(status) = statuses.iter().find(|s| s.name == *name) else {
            continue;
        };
        let state = match &status.state {
            CircuitState::Closed => "closed".to_string(),
            CircuitState::Open { until } => format!("open until {}", until),
            CircuitState::RateLimited { reset_at } => {
                format!("rate limited until {}", reset_at)
            }
        };
        let quota = status
            .remaining_quota
            .map(|q| q.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  {} - {} (consecutive failures: {}, remaining quota: {})",
            status.name, state, status.consecutive_failures, quota
        );
    }

    Ok(())
}
