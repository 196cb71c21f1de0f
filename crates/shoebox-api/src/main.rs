use shoebox_core::CoordinatorConfig;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration; any problem here is fatal before the server binds
    let config = CoordinatorConfig::from_env()?;

    let (_state, router) = shoebox_api::setup::initialize_app(config.clone()).await?;

    shoebox_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
