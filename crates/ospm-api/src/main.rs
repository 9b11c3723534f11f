use ospm_api::setup;
use ospm_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (store, services, routes)
    let router = setup::initialize_app(&config).await?;

    // Start the server
    setup::server::start_server(&config, router).await?;

    Ok(())
}
