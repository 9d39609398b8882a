use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, rename = "node_env")]
    pub environment: RuntimeEnvironment,
}

fn default_port() -> u16 {
    3000
}

/// Deployment flavour, read from `NODE_ENV`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Production,
}

impl From<String> for RuntimeEnvironment {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            RuntimeEnvironment::Production
        } else {
            RuntimeEnvironment::Development
        }
    }
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeEnvironment::Production)
    }

    /// Whether error responses may carry internal details.
    pub fn exposes_error_details(&self) -> bool {
        !self.is_production()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            environment: RuntimeEnvironment::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_env_production_is_case_insensitive() {
        assert_eq!(
            RuntimeEnvironment::from("Production".to_string()),
            RuntimeEnvironment::Production
        );
        assert!(!RuntimeEnvironment::Production.exposes_error_details());
    }

    #[test]
    fn unknown_node_env_falls_back_to_development() {
        let env = RuntimeEnvironment::from("staging".to_string());
        assert_eq!(env, RuntimeEnvironment::Development);
        assert!(env.exposes_error_details());
    }
}
