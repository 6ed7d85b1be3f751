use anyhow::Context;
use bookshelf_app::modules::{self, books::store};
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        "bookshelf-app bootstrap starting"
    );

    let book_store = store::open(&settings.database)
        .await
        .context("failed to open book store")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, book_store);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("bookshelf-app bootstrap complete");

    let served = bookshelf_http::start_server(&registry, &settings, shutdown_signal()).await;
    registry.stop_all().await?;
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
