use std::env;
use std::str::FromStr;

use quicklink_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Backend the CLI runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    /// Process-local store; nothing outlives the command.
    Memory,
}

impl FromStr for StoreKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::Validation(format!(
                "QUICKLINK_STORE must be 'postgres' or 'memory', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCliConfig {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl AdminCliConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let store = lookup("QUICKLINK_STORE")
            .filter(|value| !value.trim().is_empty())
            .map(|value| StoreKind::from_str(value.as_str()))
            .transpose()?
            .unwrap_or(StoreKind::Postgres);

        let database_url = match store {
            StoreKind::Postgres => Some(
                lookup("DATABASE_URL")
                    .filter(|value| !value.trim().is_empty())
                    .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?,
            ),
            StoreKind::Memory => None,
        };

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "DATABASE_MAX_CONNECTIONS must be a positive integer, got '{value}'"
                    ))
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            store,
            database_url,
            max_connections,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use quicklink_core::AppError;

    use super::{AdminCliConfig, StoreKind};

    fn load(values: &[(&str, &str)]) -> Result<AdminCliConfig, AppError> {
        let values: HashMap<String, String> = values
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        AdminCliConfig::from_lookup(|name| values.get(name).cloned())
    }

    #[test]
    fn postgres_store_requires_database_url() {
        assert!(matches!(load(&[]), Err(AppError::Validation(_))));

        let config = load(&[("DATABASE_URL", "postgres://localhost/quicklink")]);
        assert!(matches!(
            config,
            Ok(AdminCliConfig {
                store: StoreKind::Postgres,
                max_connections: 5,
                ..
            })
        ));
    }

    #[test]
    fn memory_store_needs_no_database() {
        let config = load(&[("QUICKLINK_STORE", "Memory")]);
        assert!(matches!(
            config,
            Ok(AdminCliConfig {
                store: StoreKind::Memory,
                database_url: None,
                ..
            })
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_store = load(&[("QUICKLINK_STORE", "mongo")]);
        let bad_pool = load(&[
            ("DATABASE_URL", "postgres://localhost/quicklink"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ]);

        assert!(matches!(bad_store, Err(AppError::Validation(_))));
        assert!(matches!(bad_pool, Err(AppError::Validation(_))));
    }
}
