use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ai_gateway: AiGatewayConfig,
    #[serde(default)]
    pub trial: TrialConfig,
    #[serde(default)]
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Upper bound on one ledger round trip once a connection is held.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_query_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiGatewayConfig {
    /// Missing or blank key means the gateway is not configured.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_gateway_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gateway_base_url() -> String {
    "https://ai-gateway.vercel.sh/v1".to_string()
}

fn default_chat_model() -> String {
    "openai/gpt-4o".to_string()
}

fn default_image_model() -> String {
    "google/gemini-2.0-flash-exp".to_string()
}

fn default_gateway_timeout_secs() -> u64 {
    60
}

impl Default for AiGatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gateway_base_url(),
            chat_model: default_chat_model(),
            image_model: default_image_model(),
            timeout_secs: default_gateway_timeout_secs(),
        }
    }
}

/// Quotas granted to a freshly created trial record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialConfig {
    #[serde(default = "default_trial_days")]
    pub duration_days: i64,
    #[serde(default = "default_message_limit")]
    pub message_limit: i32,
    #[serde(default = "default_image_limit")]
    pub image_limit: i32,
}

fn default_trial_days() -> i64 {
    7
}

fn default_message_limit() -> i32 {
    100
}

fn default_image_limit() -> i32 {
    10
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            duration_days: default_trial_days(),
            message_limit: default_message_limit(),
            image_limit: default_image_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Stripe payment link returned with every denial.
    #[serde(default = "default_upgrade_url")]
    pub upgrade_url: String,
}

fn default_upgrade_url() -> String {
    "https://buy.stripe.com/test_6oU4gAfx18Ye11Xapw1kA00".to_string()
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            upgrade_url: default_upgrade_url(),
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::from_toml_str(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env()?,
            Err(e) => {
                return Err(format!("Unable to read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(s).map_err(|e| format!("Failed to parse config file: {e}").into())
    }

    /// Builds a config from environment variables and defaults only.
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let database_url = get_env("DATABASE_URL")
            .or_else(|| get_env("SUPABASE_DB_URL"))
            .ok_or("DATABASE_URL is not set and config.toml was not found")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                connect_timeout_secs: get_env_parse(
                    "DB_CONNECT_TIMEOUT_SECS",
                    default_connect_timeout_secs(),
                ),
                acquire_timeout_secs: get_env_parse(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    default_acquire_timeout_secs(),
                ),
                query_timeout_secs: get_env_parse(
                    "DB_QUERY_TIMEOUT_SECS",
                    default_query_timeout_secs(),
                ),
            },
            ai_gateway: AiGatewayConfig::default(),
            trial: TrialConfig::default(),
            billing: BillingConfig::default(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("DB_QUERY_TIMEOUT_SECS")
            && let Ok(t) = v.parse()
        {
            self.database.query_timeout_secs = t;
        }
        if let Ok(v) = env::var("AI_GATEWAY_API_KEY") {
            self.ai_gateway.api_key = Some(v);
        }
        if let Ok(v) = env::var("AI_GATEWAY_BASE_URL") {
            self.ai_gateway.base_url = v;
        }
        if let Ok(v) = env::var("AI_GATEWAY_CHAT_MODEL") {
            self.ai_gateway.chat_model = v;
        }
        if let Ok(v) = env::var("AI_GATEWAY_IMAGE_MODEL") {
            self.ai_gateway.image_model = v;
        }
        if let Ok(v) = env::var("STRIPE_UPGRADE_URL") {
            self.billing.upgrade_url = v;
        }
    }
}
