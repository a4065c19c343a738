use genedit::logger::{self, LoggerConfig};
use genedit::ProxyConfig;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();

    let log_config = LoggerConfig::from_env(LoggerConfig::default()).with_prefix("proxy");
    logger::init_with_config(log_config)?;

    if env_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = ProxyConfig::from_env();

    if let Err(e) = genedit::proxy::server::run(config).await {
        log::error!("❌ Edit proxy stopped: {}", e);
        return Err(e.into());
    }

    Ok(())
}
