use anyhow::{Context, Result};
use fundamental_analysis::{IpValuationParams, ValuationParams};
use peer_comparison::resolver::DEFAULT_PEER_LIMIT;
use peer_comparison::AggregatorConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Tunables for the three pipelines.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub peer_limit: usize,
    pub aggregator: AggregatorConfig,
    pub valuation: ValuationParams,
    pub ip: IpValuationParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            peer_limit: DEFAULT_PEER_LIMIT,
            aggregator: AggregatorConfig::default(),
            valuation: ValuationParams::default(),
            ip: IpValuationParams::default(),
        }
    }
}

impl EngineConfig {
    /// Load from environment variables, falling back to defaults for
    /// anything unset. A set but unparsable value is an error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            peer_limit: env_or("PEER_LIMIT", defaults.peer_limit)?,
            aggregator: AggregatorConfig {
                max_concurrency: env_or("PEER_FETCH_CONCURRENCY", defaults.aggregator.max_concurrency)?,
                fetch_timeout: Duration::from_millis(env_or(
                    "PEER_FETCH_TIMEOUT_MS",
                    defaults.aggregator.fetch_timeout.as_millis() as u64,
                )?),
            },
            valuation: ValuationParams {
                avg_pe: env_or("VALUATION_AVG_PE", defaults.valuation.avg_pe)?,
                avg_pb: env_or("VALUATION_AVG_PB", defaults.valuation.avg_pb)?,
                avg_ps: env_or("VALUATION_AVG_PS", defaults.valuation.avg_ps)?,
                ..defaults.valuation
            },
            ip: IpValuationParams {
                tax_rate: env_or("IP_TAX_RATE", defaults.ip.tax_rate)?,
                discount_rate: env_or("IP_DISCOUNT_RATE", defaults.ip.discount_rate)?,
                protection_years: env_or("IP_PROTECTION_YEARS", defaults.ip.protection_years)?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.aggregator.max_concurrency == 0 {
            anyhow::bail!("PEER_FETCH_CONCURRENCY must be at least 1");
        }
        if self.aggregator.fetch_timeout.is_zero() {
            anyhow::bail!("PEER_FETCH_TIMEOUT_MS must be greater than 0");
        }
        if !(0.0..1.0).contains(&self.ip.tax_rate) {
            anyhow::bail!("IP_TAX_RATE must be in [0, 1), got {}", self.ip.tax_rate);
        }
        if self.ip.discount_rate <= -1.0 {
            anyhow::bail!("IP_DISCOUNT_RATE must be greater than -1, got {}", self.ip.discount_rate);
        }
        for (name, value) in [
            ("VALUATION_AVG_PE", self.valuation.avg_pe),
            ("VALUATION_AVG_PB", self.valuation.avg_pb),
            ("VALUATION_AVG_PS", self.valuation.avg_ps),
        ] {
            if value <= 0.0 {
                anyhow::bail!("{} must be positive, got {}", name, value);
            }
        }
        Ok(())
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.peer_limit, 5);
        assert_eq!(config.aggregator.max_concurrency, 5);
        assert_eq!(config.valuation.avg_pe, 25.0);
        assert_eq!(config.ip.protection_years, 15);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.aggregator.max_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.ip.tax_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.valuation.avg_pb = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_or_parses_and_reports_errors() {
        env::set_var("ENGINE_CONFIG_TEST_OK", " 42 ");
        env::set_var("ENGINE_CONFIG_TEST_BAD", "forty-two");

        assert_eq!(env_or::<usize>("ENGINE_CONFIG_TEST_OK", 1).unwrap(), 42);
        assert!(env_or::<usize>("ENGINE_CONFIG_TEST_BAD", 1).is_err());
        assert_eq!(env_or::<usize>("ENGINE_CONFIG_TEST_UNSET", 7).unwrap(), 7);
    }
}
