use std::{env, fmt::Display, str::FromStr, time::Duration as StdDuration};

use checkout_common::{helpers::parse_boolean_flag, Secret, DEFAULT_CURRENCY_SCALE};
use checkout_engine::{
    checkout_api::maintenance_api::DEFAULT_RESTOCK_BATCH_SIZE,
    provider::{offset_from_hours, CheckoutConfig, ProviderConfig},
};
use chrono::Duration;
use log::*;
use url::Url;

const DEFAULT_CKO_HOST: &str = "127.0.0.1";
const DEFAULT_CKO_PORT: u16 = 8360;
const DEFAULT_USER_ID_HEADER: &str = "x-user-id";
const DEFAULT_RESERVATION_WINDOW_MINS: i64 = 15;
const DEFAULT_RESTOCK_INTERVAL: StdDuration = StdDuration::from_secs(60);
const DEFAULT_PAYMENT_EXPIRY_INTERVAL: StdDuration = StdDuration::from_secs(60);
const DEFAULT_VNP_UTC_OFFSET_HOURS: i32 = 7;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The header an upstream authentication proxy uses to pass on the id of the signed-in user.
    pub user_id_header: String,
    pub checkout: CheckoutConfig,
    pub provider: ProviderConfig,
    pub workers: WorkerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CKO_HOST.to_string(),
            port: DEFAULT_CKO_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            user_id_header: DEFAULT_USER_ID_HEADER.to_string(),
            checkout: CheckoutConfig::default(),
            provider: ProviderConfig::default(),
            workers: WorkerConfig::default(),
        }
    }
}

/// How often the maintenance jobs run.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub restock_interval: StdDuration,
    pub restock_batch_size: i64,
    pub payment_expiry_interval: StdDuration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            restock_interval: DEFAULT_RESTOCK_INTERVAL,
            restock_batch_size: DEFAULT_RESTOCK_BATCH_SIZE,
            payment_expiry_interval: DEFAULT_PAYMENT_EXPIRY_INTERVAL,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CKO_HOST").ok().unwrap_or_else(|| DEFAULT_CKO_HOST.into());
        let port = parse_or_default("CKO_PORT", env::var("CKO_PORT").ok(), DEFAULT_CKO_PORT);
        let database_url = env::var("CKO_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ CKO_DATABASE_URL is not set. Please set it to the URL for the checkout database.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("CKO_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("CKO_USE_FORWARDED").ok(), false);
        let user_id_header = env::var("CKO_USER_ID_HEADER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_ID_HEADER.to_string());
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            user_id_header,
            checkout: checkout_config_from_env(),
            provider: provider_config_from_env(),
            workers: worker_config_from_env(),
        }
    }
}

fn checkout_config_from_env() -> CheckoutConfig {
    let currency = env::var("CKO_CURRENCY").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
        info!("🪛️ CKO_CURRENCY is not set. Orders will be priced in VND.");
        "VND".to_string()
    });
    let currency_scale = parse_or_default("CKO_CURRENCY_SCALE", env::var("CKO_CURRENCY_SCALE").ok(), DEFAULT_CURRENCY_SCALE);
    let window_mins = parse_or_default(
        "CKO_RESERVATION_WINDOW_MINS",
        env::var("CKO_RESERVATION_WINDOW_MINS").ok(),
        DEFAULT_RESERVATION_WINDOW_MINS,
    );
    let window_mins = if window_mins > 0 {
        window_mins
    } else {
        warn!("🪛️ CKO_RESERVATION_WINDOW_MINS must be positive. Using {DEFAULT_RESERVATION_WINDOW_MINS} minutes.");
        DEFAULT_RESERVATION_WINDOW_MINS
    };
    CheckoutConfig { currency, currency_scale, reservation_window: Duration::minutes(window_mins) }
}

fn provider_config_from_env() -> ProviderConfig {
    let defaults = ProviderConfig::default();
    let tmn_code = env::var("CKO_VNP_TMN_CODE").ok().unwrap_or_else(|| {
        error!("🪛️ CKO_VNP_TMN_CODE is not set. Every payment callback will be rejected until it is.");
        String::default()
    });
    let hash_secret = env::var("CKO_VNP_HASH_SECRET").ok().unwrap_or_else(|| {
        error!("🪛️ CKO_VNP_HASH_SECRET is not set. Payment requests and callbacks cannot be signed or verified.");
        String::default()
    });
    let pay_url = url_or_default("CKO_VNP_PAY_URL", env::var("CKO_VNP_PAY_URL").ok(), defaults.pay_url);
    let return_url = url_or_default("CKO_VNP_RETURN_URL", env::var("CKO_VNP_RETURN_URL").ok(), defaults.return_url);
    let utc_offset = offset_from_hours(parse_or_default(
        "CKO_VNP_UTC_OFFSET_HOURS",
        env::var("CKO_VNP_UTC_OFFSET_HOURS").ok(),
        DEFAULT_VNP_UTC_OFFSET_HOURS,
    ));
    let currency = env::var("CKO_CURRENCY").ok().filter(|s| !s.trim().is_empty()).unwrap_or(defaults.currency);
    ProviderConfig {
        name: defaults.name,
        tmn_code,
        hash_secret: Secret::new(hash_secret),
        pay_url,
        return_url,
        version: env::var("CKO_VNP_VERSION").unwrap_or(defaults.version),
        currency,
        locale: env::var("CKO_VNP_LOCALE").unwrap_or(defaults.locale),
        order_type: env::var("CKO_VNP_ORDER_TYPE").unwrap_or(defaults.order_type),
        bank_code: env::var("CKO_VNP_BANK_CODE").ok().filter(|s| !s.trim().is_empty()),
        utc_offset,
    }
}

fn worker_config_from_env() -> WorkerConfig {
    let restock_secs = parse_or_default(
        "CKO_RESTOCK_INTERVAL_SECS",
        env::var("CKO_RESTOCK_INTERVAL_SECS").ok(),
        DEFAULT_RESTOCK_INTERVAL.as_secs(),
    );
    let expiry_secs = parse_or_default(
        "CKO_PAYMENT_EXPIRY_INTERVAL_SECS",
        env::var("CKO_PAYMENT_EXPIRY_INTERVAL_SECS").ok(),
        DEFAULT_PAYMENT_EXPIRY_INTERVAL.as_secs(),
    );
    let restock_batch_size =
        parse_or_default("CKO_RESTOCK_BATCH_SIZE", env::var("CKO_RESTOCK_BATCH_SIZE").ok(), DEFAULT_RESTOCK_BATCH_SIZE);
    WorkerConfig {
        restock_interval: StdDuration::from_secs(restock_secs.max(1)),
        restock_batch_size: restock_batch_size.max(1),
        payment_expiry_interval: StdDuration::from_secs(expiry_secs.max(1)),
    }
}

/// Parses an optional environment value, falling back to `default` (with a warning) if it is present but invalid.
fn parse_or_default<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value {
        None => default,
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
    }
}

fn url_or_default(name: &str, value: Option<String>, default: String) -> String {
    match value {
        None => default,
        Some(s) => match Url::parse(&s) {
            Ok(_) => s,
            Err(e) => {
                warn!("🪛️ {s} is not a valid URL for {name}. {e} Using {default} instead.");
                default
            },
        },
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub user_id_header: String,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            user_id_header: config.user_id_header.clone(),
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}
