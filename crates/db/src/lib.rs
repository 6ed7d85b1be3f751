//! MongoDB client factory for the bookshelf service.

use anyhow::Context;
use bookshelf_kernel::settings::DatabaseSettings;
use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Database,
};

/// Connect to the configured deployment and confirm it answers a ping.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Database> {
    let client = Client::with_options(client_options(settings).await?)
        .context("failed to create MongoDB client")?;
    let database = client.database(&settings.name);

    ping(&client).await?;

    tracing::info!(
        target: "bookshelf-db",
        database = %settings.name,
        "connected to MongoDB"
    );
    Ok(database)
}

/// Parse the connection string and pin the strict Stable API v1.
pub async fn client_options(settings: &DatabaseSettings) -> anyhow::Result<ClientOptions> {
    let mut options = ClientOptions::parse(&settings.url)
        .await
        .context("failed to parse MongoDB connection string")?;
    options.server_api = Some(
        ServerApi::builder()
            .version(ServerApiVersion::V1)
            .strict(true)
            .deprecation_errors(true)
            .build(),
    );
    Ok(options)
}

/// Round-trip a `ping` command against the admin database.
pub async fn ping(client: &Client) -> anyhow::Result<()> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .context("MongoDB did not answer ping")?;
    Ok(())
}
