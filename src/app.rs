use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::ConfigService;

pub async fn run() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = ConfigService::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    crate::interfaces::http::start_server(config)?.await
}
