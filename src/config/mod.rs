use serde::Deserialize;

/// Runtime configuration, loaded from environment (optionally via a `.env`
/// file in development). Mirrors the shape of the config the HTTP layer and
/// engine both need; nothing here is read more than once per process.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiry_seconds: i64,
    pub environment: String,
    /// Ticker used for the single cash ledger (deposits/withdrawals/admin
    /// adjustments and order reservation all move balances of this asset).
    pub base_currency_ticker: String,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("jwt_expiry_seconds", 86_400)?
            .set_default("environment", "development")?
            .set_default("base_currency_ticker", "USD")?
            .add_source(config::Environment::default())
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        if cfg.database_url.is_empty() {
            anyhow::bail!("DATABASE_URL must be set");
        }
        if cfg.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must be set");
        }
        Ok(cfg)
    }
}
