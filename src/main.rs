use std::sync::Arc;

use anyhow::Context;

use mailsift::api::{self, AppState};
use mailsift::compression::ThreadCompressor;
use mailsift::config::{RemoteConfig, ServerConfig, TriageConfig};
use mailsift::ingestion::{self, MockGenerator};
use mailsift::pipeline::{TriagePipeline, spawn_inbox_processor};
use mailsift::remote::{DigestBackend, HybridCompressor, RemoteCompressor};
use mailsift::store::MailStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let triage_config = TriageConfig::from_env().context("invalid triage configuration")?;
    let server_config = ServerConfig::from_env();

    // ── Compression backend ─────────────────────────────────────────────
    let remote: Option<Arc<dyn DigestBackend>> = RemoteConfig::from_env().map(|config| {
        tracing::info!(base_url = %config.base_url, "Remote digest backend configured");
        Arc::new(RemoteCompressor::new(config)) as Arc<dyn DigestBackend>
    });
    let compressor =
        HybridCompressor::new(remote, ThreadCompressor::new(triage_config.dedup)).await;
    let status = compressor.status();
    tracing::info!(
        configured = status.configured,
        healthy = status.healthy,
        "Compression backend ready"
    );

    let pipeline = Arc::new(TriagePipeline::from_config(&triage_config, compressor));
    let store = MailStore::new();
    let mut generator = MockGenerator::new(server_config.mock_seed);

    // ── Seed data ───────────────────────────────────────────────────────
    if let Some(dir) = &server_config.eml_dir {
        let messages = ingestion::load_dir(dir)
            .with_context(|| format!("failed to load messages from {}", dir.display()))?;
        store
            .add_threads(ingestion::group_threads(messages))
            .await;
    }
    if server_config.mock_count > 0 {
        let inbox = generator.generate_inbox(server_config.mock_count);
        tracing::info!(
            emails = inbox.emails.len(),
            threads = inbox.threads.len(),
            thread_messages = inbox.total_thread_messages(),
            "Seeding synthetic inbox"
        );
        store.add_messages(inbox.emails).await;
        store.add_threads(inbox.threads).await;
    }

    // ── Background processing ───────────────────────────────────────────
    let processor = server_config.process_interval.map(|interval| {
        spawn_inbox_processor(Arc::clone(&store), Arc::clone(&pipeline), interval)
    });

    // ── HTTP server ─────────────────────────────────────────────────────
    let app = api::router(AppState::new(store, pipeline, generator));
    let addr = format!("0.0.0.0:{}", server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(port = server_config.port, "Mailsift API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("server error")?;

    if let Some((handle, shutdown)) = processor {
        shutdown.store(true, std::sync::atomic::Ordering::Relaxed);
        handle.abort();
    }
    tracing::info!("Shut down");
    Ok(())
}
