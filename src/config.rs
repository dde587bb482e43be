use std::path::PathBuf;
use std::str::FromStr;

use crate::models::MAX_HORIZON;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub reference_data_path: PathBuf,
    /// Reference column the scaler is fitted on; first numeric column if unset.
    pub reference_value_column: Option<String>,
    /// Reference column summarized and served as the historical price series.
    pub reference_price_column: String,
    pub default_horizon: usize,
    pub forecast_cache_ttl_secs: i64,
    pub cors_allow_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            model_path: PathBuf::from("model.json"),
            scaler_path: PathBuf::from("scaler.json"),
            reference_data_path: PathBuf::from("gld_price_data.csv"),
            reference_value_column: None,
            reference_price_column: "GLD".to_string(),
            default_horizon: 30,
            forecast_cache_ttl_secs: 600,
            cors_allow_origin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            model_path: std::env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            scaler_path: std::env::var("SCALER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.scaler_path),
            reference_data_path: std::env::var("REFERENCE_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.reference_data_path),
            reference_value_column: std::env::var("REFERENCE_VALUE_COLUMN")
                .ok()
                .filter(|c| !c.trim().is_empty()),
            reference_price_column: std::env::var("REFERENCE_PRICE_COLUMN")
                .ok()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(defaults.reference_price_column),
            default_horizon: parse_env("DEFAULT_HORIZON", defaults.default_horizon),
            forecast_cache_ttl_secs: parse_env(
                "FORECAST_CACHE_TTL_SECS",
                defaults.forecast_cache_ttl_secs,
            ),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.default_horizon == 0 || self.default_horizon > MAX_HORIZON {
            return Err(format!(
                "DEFAULT_HORIZON must be between 1 and {}, got {}",
                MAX_HORIZON, self.default_horizon
            ));
        }
        if self.forecast_cache_ttl_secs < 0 {
            return Err("FORECAST_CACHE_TTL_SECS must not be negative".to_string());
        }
        Ok(())
    }
}

fn parse_env<T: FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}='{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_horizon, 30);
        assert_eq!(config.reference_price_column, "GLD");
    }

    #[test]
    fn test_horizon_out_of_range_rejected() {
        let config = AppConfig {
            default_horizon: 91,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_falls_back_on_garbage() {
        std::env::set_var("GOLD_FORECAST_TEST_HORIZON", "lots");
        assert_eq!(parse_env("GOLD_FORECAST_TEST_HORIZON", 30usize), 30);
        std::env::set_var("GOLD_FORECAST_TEST_HORIZON", " 45 ");
        assert_eq!(parse_env("GOLD_FORECAST_TEST_HORIZON", 30usize), 45);
        std::env::remove_var("GOLD_FORECAST_TEST_HORIZON");
    }
}
