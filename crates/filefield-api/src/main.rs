use std::sync::Arc;

use filefield_api::handlers::UploadPhoto;
use filefield_api::{setup, telemetry};
use filefield_core::DecoderConfig;
use filefield_decoder::MultipartDecoder;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = DecoderConfig::from_env()?;

    telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let decoder = Arc::new(MultipartDecoder::new(config.clone()));

    // Build the upload schema up front.
    decoder.registry().resolve::<UploadPhoto>()?;

    let router = setup::setup_routes(decoder);
    setup::start_server(&config, router).await?;

    Ok(())
}
