use std::env;
use std::path::PathBuf;

/// 既定のログフィルタ（RUST_LOGが未設定の場合に使用）
pub const DEFAULT_LOG_FILTER: &str = "borrowing_service=debug,tower_http=debug,axum=trace";

/// エンティティストアのバックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid {
                key: "STORE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// アプリケーション設定
///
/// 環境変数から読み込む。`.env`ファイルがあれば先に読み込まれる。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub port: u16,
    pub store_backend: StoreBackend,
    /// memoryバックエンドの初期データ（JSON）
    pub memory_seed_file: Option<PathBuf>,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// - DATABASE_URL（既定: postgres://localhost/library）
    /// - DATABASE_MAX_CONNECTIONS（既定: 5）
    /// - PORT（既定: 3000）
    /// - STORE_BACKEND: postgres | memory（既定: postgres）
    /// - MEMORY_SEED_FILE: memoryバックエンドに登録する書籍・利用者のJSON（任意）
    pub fn from_env() -> Result<Self, ConfigError> {
        // .envが無いのは正常
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を組み立てる
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/library".into());

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;
        let port = parse_or(&lookup, "PORT", 3000)?;

        let store_backend = match lookup("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Postgres,
        };

        let memory_seed_file = lookup("MEMORY_SEED_FILE")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            database_url,
            max_connections,
            port,
            store_backend,
            memory_seed_file,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.database_url, "postgres://localhost/library");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.port, 3000);
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert!(config.memory_seed_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/test"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("PORT", "8080"),
            ("STORE_BACKEND", "Memory"),
            ("MEMORY_SEED_FILE", "/etc/library/seed.json"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://db/test");
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.port, 8080);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(
            config.memory_seed_file,
            Some(PathBuf::from("/etc/library/seed.json"))
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[("PORT", "not-a-port")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "mongo")]));
        assert!(result.is_err());
    }
}
