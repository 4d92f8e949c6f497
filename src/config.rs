use std::str::FromStr;

/// Which store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in_memory" | "inmemory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("STORAGE must be 'postgres' or 'memory', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    /// Required when `storage` is `Postgres`.
    pub database_url: Option<String>,
    pub port: u16,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    /// Milliseconds to replenish one request slot per client IP.
    pub rate_limit_replenish_ms: u64,
    pub rate_limit_burst: u32,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            database_url: None,
            port: 3000,
            db_max_connections: 10,
            run_migrations: true,
            rate_limit_replenish_ms: 100,
            rate_limit_burst: 20,
            max_body_bytes: 1024 * 1024,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: '{}'", name, raw)),
        _ => Ok(default),
    }
}

fn parse_bool(name: &str, default: bool) -> anyhow::Result<bool> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => anyhow::bail!("{} must be a boolean, got '{}'", name, raw),
        },
        _ => Ok(default),
    }
}

/// Checks a PostgreSQL connection string.
pub fn validate_database_url(url: &str) -> anyhow::Result<()> {
    if url.trim().is_empty() {
        anyhow::bail!("DATABASE_URL cannot be empty");
    }
    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
    }
    Ok(())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let storage = parse_var("STORAGE", StorageBackend::Postgres)?;

        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("DB_URL"))
            .ok()
            .filter(|s| !s.trim().is_empty());

        if storage == StorageBackend::Postgres {
            let url = database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("DATABASE_URL or DB_URL environment variable required")
            })?;
            validate_database_url(url)?;
        }

        let config = Self {
            storage,
            database_url,
            port: parse_var("PORT", 3000u16)
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 10u32)?,
            run_migrations: parse_bool("RUN_MIGRATIONS", true)?,
            rate_limit_replenish_ms: parse_var("RATE_LIMIT_REPLENISH_MS", 100u64)?,
            rate_limit_burst: parse_var("RATE_LIMIT_BURST", 20u32)?,
            max_body_bytes: parse_var("MAX_BODY_BYTES", 1024 * 1024usize)?,
        };

        if config.rate_limit_replenish_ms == 0 || config.rate_limit_burst == 0 {
            anyhow::bail!("RATE_LIMIT_REPLENISH_MS and RATE_LIMIT_BURST must be positive");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Storage backend: {:?}", config.storage);
        if let Some(ref url) = config.database_url {
            let prefix: String = url.chars().take(20).collect();
            tracing::debug!("Database URL: {}...", prefix);
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
