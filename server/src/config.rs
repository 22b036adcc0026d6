use iso_currency::Currency;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("only one of CONFIG and CONFIG_PATH environment variables should be specified")]
    AmbiguousSource,

    #[error("either CONFIG or CONFIG_PATH environment variables should be specified")]
    MissingSource,

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("fundraising target must be positive, got {0}")]
    InvalidTarget(Decimal),

    #[error("unknown currency code: {0:?}")]
    UnknownCurrency(String),

    #[error("progress bar length must be positive")]
    InvalidBarLength,

    #[error("webhook mode requires a [webhook] section")]
    MissingWebhook,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    #[serde(default)]
    pub mode: Mode,
    pub postgres: PostgresConfig,
    pub telegram: TelegramConfig,
    pub campaign: CampaignConfig,
    pub webhook: Option<WebhookConfig>,
}

/// How updates reach the bot.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Polling,
    Webhook,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PostgresConfig {
    pub uri: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub token: String,
    pub admin_id: i64,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// How long a "donate" press waits for the amount before it is dropped.
    #[serde(default = "default_amount_timeout_secs")]
    pub amount_timeout_secs: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WebhookConfig {
    pub port: u16,
    /// Public base URL Telegram posts updates to; `/webhook` is appended.
    pub public_url: String,
    pub secret_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CampaignConfig {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub target: Decimal,
    /// ISO 4217 code, e.g. "GEL".
    pub currency: String,
    /// Shown instead of the currency code when set, e.g. "₾".
    pub symbol: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub accounts: Vec<BankAccountConfig>,
    #[serde(default = "default_bar_length")]
    pub bar_length: usize,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct BankAccountConfig {
    pub bank: String,
    pub iban: String,
    pub holder: Option<String>,
}

fn default_max_connections() -> u32 {
    5
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_amount_timeout_secs() -> u64 {
    crate::session::DEFAULT_AMOUNT_TIMEOUT.as_secs()
}

fn default_bar_length() -> usize {
    crate::progress::DEFAULT_BAR_LENGTH
}

impl CampaignConfig {
    pub fn currency(&self) -> Result<Currency, Error> {
        Currency::from_code(&self.currency.to_uppercase())
            .ok_or_else(|| Error::UnknownCurrency(self.currency.clone()))
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.campaign.target <= Decimal::ZERO {
            return Err(Error::InvalidTarget(self.campaign.target));
        }
        if self.campaign.bar_length == 0 {
            return Err(Error::InvalidBarLength);
        }
        self.campaign.currency()?;
        if self.mode == Mode::Webhook && self.webhook.is_none() {
            return Err(Error::MissingWebhook);
        }
        Ok(())
    }
}

/// Parses and validates a TOML config document.
pub fn parse_config(config_str: &str) -> Result<ServerConfig, Error> {
    let config = toml::from_str::<ServerConfig>(config_str)?;
    config.validate()?;
    Ok(config)
}

/// Loads the config from the `CONFIG` (inline TOML) or `CONFIG_PATH`
/// environment variable. Exactly one of them must be set.
pub fn load_config() -> Result<ServerConfig, Error> {
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = std::env::var("CONFIG").ok();

    let config_str = match (config_path, config) {
        (None, Some(config)) => config,
        (Some(config_path), None) => std::fs::read_to_string(config_path)?,
        (Some(_), Some(_)) => return Err(Error::AmbiguousSource),
        (None, None) => return Err(Error::MissingSource),
    };

    parse_config(&config_str)
}
