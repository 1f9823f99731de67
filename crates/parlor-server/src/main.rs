use anyhow::Result;
use parlor_server::config::Config;
use parlor_server::service::ChatService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    ChatService::new(config).run().await
}
