// Mdm Teo — Configuration
//
// Sources, lowest to highest precedence:
//   1. built-in defaults
//   2. TOML file (explicit --config path, else <config_dir>/mdmteo/config.toml)
//   3. environment (a local `.env` is loaded first if present)
//
// Missing credentials are fatal: the process never starts serving without them.

use crate::atoms::constants::{
    DEFAULT_ALIASES, DEFAULT_BIND_ADDRESS, DEFAULT_MODEL, DEFAULT_PORT,
};
use crate::atoms::error::{EngineError, EngineResult};
use log::{info, warn};
use mdmteo_core::Mood;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub telegram_token: String,
    pub gemini_api_key: String,
    pub model: String,
    /// Override for the Gemini REST base URL.
    pub gemini_base_url: Option<String>,
    /// Usernames allowed to run admin commands (with or without `@`).
    pub admin_users: Vec<String>,
    /// Extra names that count as addressing the bot directly.
    pub aliases: Vec<String>,
    pub bind_address: String,
    pub port: u16,
    pub default_mood: Mood,
    pub persona_prompt: Option<String>,
    pub fallback_reply: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            telegram_token: String::new(),
            gemini_api_key: String::new(),
            model: DEFAULT_MODEL.into(),
            gemini_base_url: None,
            admin_users: vec![],
            aliases: DEFAULT_ALIASES.iter().map(|a| a.to_string()).collect(),
            bind_address: DEFAULT_BIND_ADDRESS.into(),
            port: DEFAULT_PORT,
            default_mood: Mood::default(),
            persona_prompt: None,
            fallback_reply: None,
        }
    }
}

// Credentials stay out of logs and panics.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &str| if s.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("AppConfig")
            .field("telegram_token", &redact(&self.telegram_token))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("model", &self.model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("admin_users", &self.admin_users)
            .field("aliases", &self.aliases)
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("default_mood", &self.default_mood)
            .finish_non_exhaustive()
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mdmteo").join("config.toml"))
}

impl AppConfig {
    /// Full startup load: `.env`, file, environment, validation.
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        if dotenv::dotenv().is_ok() {
            info!("[config] Loaded .env");
        }
        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(toml_str: &str) -> EngineResult<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    fn from_file(path: Option<&Path>) -> EngineResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            EngineError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        info!("[config] Using {}", path.display());
        Self::parse(&raw)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> EngineResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(token) = get("TELEGRAM_TOKEN") {
            self.telegram_token = token;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini_api_key = key;
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.model = model;
        }
        if let Some(port) = get("PORT") {
            self.port = port
                .parse()
                .map_err(|_| EngineError::Config(format!("PORT is not a valid port: {port}")))?;
        }
        if let Some(admins) = get("MDMTEO_ADMINS") {
            self.admin_users = admins
                .split(',')
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();
        }
        Ok(())
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.telegram_token.trim().is_empty() {
            return Err(EngineError::Config("TELEGRAM_TOKEN is missing".into()));
        }
        if self.gemini_api_key.trim().is_empty() {
            return Err(EngineError::Config("GEMINI_API_KEY is missing".into()));
        }
        if self.model.trim().is_empty() {
            return Err(EngineError::Config("model must not be empty".into()));
        }
        if self.admin_users.is_empty() {
            warn!("[config] No admin_users configured, admin commands are disabled");
        }
        Ok(())
    }
}
