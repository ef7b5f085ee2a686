use anyhow::Context;
use classroom_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    init_tracing(&config)?;
    config.validate().context("validating configuration")?;

    let pool = database::connect(&config.database)
        .await
        .context("connecting to the database")?;
    let state = AppState::builder(config.clone(), pool)
        .build()
        .await
        .context("building application state")?;

    Server::new(config).serve(router(state)).await?;
    Ok(())
}
