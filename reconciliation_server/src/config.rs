use std::{env, fmt::Display, str::FromStr};

use log::*;
use recon_common::{
    helpers::{parse_boolean_flag, parse_key_value_list},
    SecretUrl,
    DEFAULT_SETTLEMENT_CURRENCY,
};
use reconciliation_engine::{
    currency::{CurrencyNormalizer, ExchangeRateTable},
    recon_api::options::{
        ProjectDirectory,
        ReconciliationOptions,
        DEFAULT_INSERT_CHUNK_SIZE,
        DEFAULT_RECOVERY_BATCH_SIZE,
        DEFAULT_REPLAY_WINDOW_DAYS,
    },
};

const DEFAULT_RECON_HOST: &str = "127.0.0.1";
const DEFAULT_RECON_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/reconciliation.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: SecretUrl,
    pub max_connections: u32,
    /// If true, the embedded migrations are applied before the server starts listening.
    pub run_migrations: bool,
    pub settlement_currency: String,
    /// The built-in rates, with any configured overrides applied
    pub exchange_rates: ExchangeRateTable,
    /// Project codes that are resolved without a database lookup
    pub project_codes: ProjectDirectory,
    pub options: ReconciliationOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RECON_HOST.to_string(),
            port: DEFAULT_RECON_PORT,
            database_url: SecretUrl::new(DEFAULT_DATABASE_URL),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            settlement_currency: DEFAULT_SETTLEMENT_CURRENCY.to_string(),
            exchange_rates: ExchangeRateTable::default(),
            project_codes: ProjectDirectory::default(),
            options: ReconciliationOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup. Invalid values are logged and replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let host = lookup("RECON_HOST").unwrap_or_else(|| DEFAULT_RECON_HOST.into());
        let port = parse_or_default(&lookup, "RECON_PORT", DEFAULT_RECON_PORT);
        let database_url = lookup("RECON_DATABASE_URL").unwrap_or_else(|| {
            warn!("🪛️ RECON_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_or_default(&lookup, "RECON_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS).max(1);
        let run_migrations = parse_boolean_flag(lookup("RECON_RUN_MIGRATIONS"), true);
        let settlement_currency = lookup("RECON_SETTLEMENT_CURRENCY")
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SETTLEMENT_CURRENCY.to_string());
        let exchange_rates = configure_exchange_rates(lookup("RECON_EXCHANGE_RATES"));
        let project_codes = lookup("RECON_PROJECT_CODES")
            .map(|s| ProjectDirectory::from_pairs(parse_key_value_list(&s)))
            .unwrap_or_default();
        if !project_codes.is_empty() {
            info!("🪛️ {} fallback project codes configured", project_codes.len());
        }
        let options = ReconciliationOptions::default()
            .with_replay_window_days(parse_or_default(&lookup, "RECON_REPLAY_WINDOW_DAYS", DEFAULT_REPLAY_WINDOW_DAYS))
            .with_insert_chunk_size(parse_or_default(&lookup, "RECON_INSERT_CHUNK_SIZE", DEFAULT_INSERT_CHUNK_SIZE))
            .with_recovery_batch_size(parse_or_default(
                &lookup,
                "RECON_RECOVERY_BATCH_SIZE",
                DEFAULT_RECOVERY_BATCH_SIZE,
            ));
        Self {
            host,
            port,
            database_url: SecretUrl::new(database_url),
            max_connections,
            run_migrations,
            settlement_currency,
            exchange_rates,
            project_codes,
            options,
        }
    }

    pub fn normalizer(&self) -> CurrencyNormalizer {
        CurrencyNormalizer::new(&self.settlement_currency, self.exchange_rates.clone())
    }
}

fn parse_or_default<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(name) {
        None => default,
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
    }
}

fn configure_exchange_rates(overrides: Option<String>) -> ExchangeRateTable {
    let defaults = ExchangeRateTable::default();
    let Some(overrides) = overrides else {
        return defaults;
    };
    let pairs = parse_key_value_list(&overrides).into_iter().filter_map(|(code, rate)| match rate.parse::<f64>() {
        Ok(rate) => Some((code, rate)),
        Err(e) => {
            warn!("🪛️ Ignoring invalid exchange rate ({rate}) for {code} in RECON_EXCHANGE_RATES: {e}");
            None
        },
    });
    let overrides = ExchangeRateTable::from_pairs(pairs);
    info!("🪛️ {} exchange rate overrides configured", overrides.len());
    defaults.with_overrides(&overrides)
}
