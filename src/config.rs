use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

/// Upper bounds for the two suspending steps of a lookup.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Deadlines {
    pub fetch: Duration,
    pub store: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            fetch: Duration::from_millis(5000),
            store: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenFoodFactsConfig {
    pub base_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub off: OpenFoodFactsConfig,
    pub deadlines: Deadlines,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let database_url = std::env::var("DATABASE_URL")?;
        let off = OpenFoodFactsConfig {
            base_url: std::env::var("OFF_BASE_URL")
                .unwrap_or_else(|_| "https://world.openfoodfacts.org".into()),
            user_agent: std::env::var("OFF_USER_AGENT").unwrap_or_else(|_| "NutriScan/1.0".into()),
        };
        let defaults = Deadlines::default();
        let deadlines = Deadlines {
            fetch: millis_var("FETCH_TIMEOUT_MS").unwrap_or(defaults.fetch),
            store: millis_var("STORE_TIMEOUT_MS").unwrap_or(defaults.store),
        };
        Ok(Self {
            host,
            port,
            database_url,
            off,
            deadlines,
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

fn millis_var(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}
