use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Identity directory cache
    pub directory_cache_ttl: Duration,
    pub directory_cache_capacity: u64,
    pub directory_warmup_batch: usize,
}

fn var_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a valid number, got {:?}", key, raw)),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", 1000),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            // 1h
            directory_cache_ttl: Duration::from_secs(var_or("DIRECTORY_CACHE_TTL_SECS", 3600)),
            directory_cache_capacity: var_or("DIRECTORY_CACHE_CAPACITY", 50_000),
            directory_warmup_batch: var_or("DIRECTORY_WARMUP_BATCH", 250),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: crate::auth::jwt::testing::SECRET.to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        rate_protected_per_min: 1000,
        api_prefix: "/api".to_string(),
        directory_cache_ttl: Duration::from_secs(60),
        directory_cache_capacity: 100,
        directory_warmup_batch: 10,
    }
}
