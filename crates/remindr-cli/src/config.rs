use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use remindr_core::{CompilerConfig, SimulatorConfig};
use serde::Deserialize;

use crate::timezone::detect_system_timezone;

/// CLI settings, read from `config.toml` and then `REMINDR_*` environment
/// variables.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Timezone used when a command has no --timezone (IANA format)
    pub default_timezone: String,
    /// Reminder time used when a command has no --time
    pub default_time: String,
    /// Occurrences shown by `next` and `list`
    pub occurrence_count: usize,
    /// Emit `rate(n weeks)` instead of converting weeks to days
    pub native_week_unit: bool,
    /// How far a cron search may look ahead
    pub lookahead_years: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timezone: detect_system_timezone(),
            default_time: remindr_core::extract::DEFAULT_TIME.to_string(),
            occurrence_count: 3,
            native_week_unit: false,
            lookahead_years: SimulatorConfig::default().lookahead_years,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), figment::Error> {
        if self.lookahead_years == 0 {
            return Err(figment::Error::from(
                "lookahead_years must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("REMINDR_"))
    }

    pub fn compiler_config(&self) -> CompilerConfig {
        CompilerConfig {
            native_week_unit: self.native_week_unit,
        }
    }

    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            lookahead_years: self.lookahead_years,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_layers() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_timezone = "Asia/Kolkata"
                occurrence_count = 5
                "#,
            )?;
            jail.set_env("REMINDR_OCCURRENCE_COUNT", "7");
            jail.set_env("REMINDR_NATIVE_WEEK_UNIT", "true");

            let config = Config::new()?;
            assert_eq!(config.default_timezone, "Asia/Kolkata");
            assert_eq!(config.occurrence_count, 7);
            assert!(config.compiler_config().native_week_unit);
            assert_eq!(config.default_time, "11:00 AM");
            assert_eq!(config.simulator_config().lookahead_years, 10);
            Ok(())
        });
    }

    #[test]
    fn test_zero_lookahead_is_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("REMINDR_LOOKAHEAD_YEARS", "0");
            let err = Config::new().unwrap_err();
            assert!(err.to_string().contains("lookahead_years"));

            jail.set_env("REMINDR_LOOKAHEAD_YEARS", "1");
            assert_eq!(Config::new()?.simulator_config().lookahead_years, 1);
            Ok(())
        });
    }
}
