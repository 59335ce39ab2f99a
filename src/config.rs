use std::env;
use std::str::FromStr;

use crate::constants::{DEFAULT_COMPLETION_BASE_URL, DEFAULT_COMPLETION_MODEL};

/// Which backend holds users and posts for the CRUD endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("Invalid STORE_BACKEND: {}", other)),
        }
    }
}

/// How strictly generated SQL is screened before execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlGuard {
    /// Substring denylist only
    Denylist,
    /// Denylist plus a leading SELECT/WITH requirement
    SelectOnly,
}

impl FromStr for SqlGuard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "denylist" => Ok(SqlGuard::Denylist),
            "select-only" => Ok(SqlGuard::SelectOnly),
            other => Err(format!("Invalid SQL_GUARD: {}", other)),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub posts_database_url: String,
    pub api_key_pepper: String,
    pub default_usage_limit: i32,
    pub completion_api_key: String,
    pub completion_base_url: String,
    pub completion_model: String,
    pub publish_endpoint: String,
    pub publish_api_key: String,
    pub publish_username: String,
    pub sql_guard: SqlGuard,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let store_backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
        let posts_database_url =
            env::var("POSTS_DATABASE_URL").unwrap_or_else(|_| database_url.clone());

        let api_key_pepper = env::var("API_KEY_PEPPER")
            .map_err(|_| "API_KEY_PEPPER must be set for API key fingerprinting")?;

        let default_usage_limit: i32 = env::var("DEFAULT_USAGE_LIMIT")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .map_err(|_| "Invalid DEFAULT_USAGE_LIMIT")?;
        if default_usage_limit <= 0 {
            return Err("DEFAULT_USAGE_LIMIT must be positive".to_string());
        }

        let completion_api_key = env::var("COMPLETION_API_KEY")
            .map_err(|_| "COMPLETION_API_KEY must be set")?;
        let completion_base_url = env::var("COMPLETION_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_COMPLETION_BASE_URL.to_string());
        let completion_model =
            env::var("COMPLETION_MODEL").unwrap_or_else(|_| DEFAULT_COMPLETION_MODEL.to_string());

        let publish_endpoint = env::var("PUBLISH_ENDPOINT")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{}/post_tweet", server_port));
        let publish_api_key = env::var("PUBLISH_API_KEY")
            .map_err(|_| "PUBLISH_API_KEY must be set for downstream posting")?;
        let publish_username =
            env::var("PUBLISH_USERNAME").unwrap_or_else(|_| "john".to_string());

        let sql_guard: SqlGuard = env::var("SQL_GUARD")
            .unwrap_or_else(|_| "select-only".to_string())
            .parse()?;

        Ok(Config {
            server_host,
            server_port,
            allowed_origins,
            environment,
            store_backend,
            database_url,
            posts_database_url,
            api_key_pepper,
            default_usage_limit,
            completion_api_key,
            completion_base_url,
            completion_model,
            publish_endpoint,
            publish_api_key,
            publish_username,
            sql_guard,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!("postgres".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!(" Memory ".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_sql_guard_parsing() {
        assert_eq!("denylist".parse::<SqlGuard>(), Ok(SqlGuard::Denylist));
        assert_eq!("SELECT-ONLY".parse::<SqlGuard>(), Ok(SqlGuard::SelectOnly));
        assert!("allow-all".parse::<SqlGuard>().is_err());
    }
}
