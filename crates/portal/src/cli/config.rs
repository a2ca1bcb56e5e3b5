use dotenvy::dotenv;
use eyre::Result;
use portal_core::ClientConfig;

pub fn load_env() -> Result<()> {
    dotenv().ok();
    Ok(())
}

/// Layered client configuration with the command-line override applied last.
pub fn client_config(api_url: Option<&str>) -> Result<ClientConfig> {
    let mut config = ClientConfig::load()?;
    if let Some(url) = api_url {
        config.api_base_url = ClientConfig::with_base_url(url)?.api_base_url;
    }
    Ok(config)
}
