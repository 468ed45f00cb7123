//! Configuration module
//!
//! Runtime knobs of the decoder, loaded from the environment. Hard ceilings on part
//! counts and field lengths are not configuration; see [`crate::limits`].

use std::env;

const CHUNK_CHANNEL_CAPACITY: usize = 16;
const MAX_CHUNK_CHANNEL_CAPACITY: usize = 4096;
const SERVER_PORT: u16 = 4000;

/// Decoder configuration
#[derive(Clone, Debug)]
pub struct DecoderConfig {
    /// Depth of the bounded channel between the tokenizer and each file accumulation.
    pub chunk_channel_capacity: usize,
    /// Leave the body untouched when the target schema declares no file fields.
    pub skip_without_file_fields: bool,
    /// Read and discard the rest of the body after a fatal error.
    pub drain_on_error: bool,
    pub server_port: u16,
    pub environment: String,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            chunk_channel_capacity: CHUNK_CHANNEL_CAPACITY,
            skip_without_file_fields: true,
            drain_on_error: true,
            server_port: SERVER_PORT,
            environment: "development".to_string(),
        }
    }
}

impl DecoderConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let config = DecoderConfig {
            chunk_channel_capacity: env::var("FILEFIELD_CHUNK_CHANNEL_CAPACITY")
                .unwrap_or_else(|_| CHUNK_CHANNEL_CAPACITY.to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("FILEFIELD_CHUNK_CHANNEL_CAPACITY must be a valid number")
                })?,
            skip_without_file_fields: env::var("FILEFIELD_SKIP_WITHOUT_FILE_FIELDS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            drain_on_error: env::var("FILEFIELD_DRAIN_ON_ERROR")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.chunk_channel_capacity == 0 {
            return Err(anyhow::anyhow!(
                "FILEFIELD_CHUNK_CHANNEL_CAPACITY must be at least 1"
            ));
        }

        if self.chunk_channel_capacity > MAX_CHUNK_CHANNEL_CAPACITY {
            return Err(anyhow::anyhow!(
                "FILEFIELD_CHUNK_CHANNEL_CAPACITY must not exceed {}",
                MAX_CHUNK_CHANNEL_CAPACITY
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }
}
