use std::{env, path::PathBuf, str::FromStr, time::Duration};

use url::Url;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://192.168.15.10:8082/api";
const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File(PathBuf),
    Sqlite(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub storage: StorageBackend,
    pub mock_delay: Duration,
    pub connect_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let api_url = env::var("API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Url::parse(&api_url)
            .map_err(|err| AppError::Config(format!("invalid API_URL: {err}")))?;

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "sqlite".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            "file" => {
                let data_dir = env::var("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("data"));
                StorageBackend::File(data_dir.join(STORAGE_FILE))
            }
            "sqlite" => StorageBackend::Sqlite(
                env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://roteiro.db".to_string()),
            ),
            other => {
                return Err(AppError::Config(format!(
                    "unknown STORAGE_BACKEND: {other}"
                )))
            }
        };

        let mock_delay = Duration::from_millis(parse_var("MOCK_API_DELAY_MS", 800)?);
        let connect_timeout = Duration::from_secs(parse_var("HTTP_CONNECT_TIMEOUT_SECS", 10)?);

        Ok(Self {
            api_url,
            storage,
            mock_delay,
            connect_timeout,
        })
    }

    /// In-memory store, no artificial latency.
    pub fn for_tests(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            storage: StorageBackend::Memory,
            mock_delay: Duration::ZERO,
            connect_timeout: Duration::from_secs(2),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|err| AppError::Config(format!("invalid {name}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_falls_back_to_default() {
        let value: u64 = parse_var("ROTEIRO_TEST_UNSET_VALUE", 800).unwrap();
        assert_eq!(value, 800);
    }

    #[test]
    fn malformed_variable_is_a_config_error() {
        env::set_var("ROTEIRO_TEST_BAD_DELAY", "soon");
        let err = parse_var::<u64>("ROTEIRO_TEST_BAD_DELAY", 800).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("ROTEIRO_TEST_BAD_DELAY")));

        env::set_var("ROTEIRO_TEST_GOOD_DELAY", " 250 ");
        assert_eq!(parse_var::<u64>("ROTEIRO_TEST_GOOD_DELAY", 800).unwrap(), 250);
    }

    #[test]
    fn test_config_has_no_latency() {
        let config = AppConfig::for_tests("http://localhost:8082/api");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.mock_delay.is_zero());
    }
}
