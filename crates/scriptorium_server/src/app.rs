//! Assembly of the pipeline from configuration, and the serve loop.

use crate::{ApiState, ScriptoriumConfig, create_router};
use scriptorium_error::{BackendError, ConfigError, ScriptoriumResult};
use scriptorium_generation::create_builder;
use scriptorium_interface::ProjectDirectory;
use scriptorium_pipeline::{
    OpenProjectDirectory, Pipeline, StaticProjectDirectory, TracingObserver,
};
use scriptorium_storage::create_store;
use std::sync::Arc;
use tracing::info;

/// Build the pipeline described by `config`.
///
/// # Errors
///
/// Returns a configuration error for an invalid builder configuration, or a
/// backend error if the store fails to start.
pub async fn build_pipeline(config: &ScriptoriumConfig) -> ScriptoriumResult<Pipeline> {
    let builder = create_builder(config.generation(), *config.pipeline().max_variant_count())?;
    let store = create_store(config.storage()).await?;

    let known = config.projects().known();
    let projects: Arc<dyn ProjectDirectory> = if known.is_empty() {
        Arc::new(OpenProjectDirectory)
    } else {
        info!(count = known.len(), "Restricting generation to known projects");
        Arc::new(StaticProjectDirectory::new(known.iter().cloned()))
    };

    Ok(Pipeline::new(builder, store)
        .with_projects(projects)
        .with_observer(Arc::new(TracingObserver))
        .with_config(config.pipeline().clone()))
}

/// Serve the API until Ctrl-C.
///
/// # Errors
///
/// Returns a configuration error if the listener cannot bind, and a backend
/// error if the server stops abnormally.
pub async fn serve(config: &ScriptoriumConfig) -> ScriptoriumResult<()> {
    let addr = config.server().socket_addr()?;
    let pipeline = build_pipeline(config).await?;
    let generator = pipeline.generator();
    let app = create_router(ApiState::new(pipeline));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ConfigError::new(format!("Failed to bind {}: {}", addr, e)))?;
    info!(
        %addr,
        generator = %generator.name(),
        stub = generator.stub(),
        "Scriptorium server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| BackendError::new(format!("HTTP server failed: {}", e)))?;

    info!("Scriptorium server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
