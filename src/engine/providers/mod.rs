// Mdm Teo — Generation Providers
// Only Gemini is wired up; anything else implements `Generator` the same way.

pub mod google;

pub use google::GoogleProvider;

use crate::atoms::traits::Generator;
use crate::engine::config::AppConfig;
use std::sync::Arc;

/// Build the configured generation backend.
pub fn from_config(config: &AppConfig) -> Arc<dyn Generator> {
    Arc::new(GoogleProvider::new(
        &config.gemini_api_key,
        &config.model,
        config.gemini_base_url.as_deref(),
    ))
}
