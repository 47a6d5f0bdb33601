use std::collections::HashMap;
use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("Environment validation failed:\n{}", .problems.join("\n"))]
pub struct ConfigError {
    pub problems: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub stripe_secret_key: String,
    pub stripe_publishable_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_api_base: String,
    pub site_url: String,
    pub upload_dir: String,
    pub run_mode: RunMode,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_map(&vars)
    }

    /// Validates every recognized variable and reports all problems at once
    /// instead of failing on the first missing one.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut problems = Vec::new();

        let mut required = |key: &str| -> String {
            match vars.get(key).filter(|v| !v.is_empty()) {
                Some(v) => v.clone(),
                None => {
                    problems.push(format!("{key}: required but not set"));
                    String::new()
                }
            }
        };

        let database_url = required("DATABASE_URL");
        let jwt_secret = required("JWT_SECRET");
        let stripe_secret_key = required("STRIPE_SECRET_KEY");
        let stripe_publishable_key = required("STRIPE_PUBLISHABLE_KEY");
        let stripe_webhook_secret = required("STRIPE_WEBHOOK_SECRET");
        let site_url = required("SITE_URL");

        if !site_url.is_empty() && !site_url.starts_with("http") {
            problems.push("SITE_URL: must be a valid URL".to_string());
        }

        let host = vars
            .get("APP_HOST")
            .cloned()
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match vars.get("APP_PORT") {
            Some(p) => match p.parse::<u16>() {
                Ok(p) => p,
                Err(_) => {
                    problems.push(format!("APP_PORT: not a valid port number: {p}"));
                    0
                }
            },
            None => 3000,
        };

        let stripe_api_base = vars
            .get("STRIPE_API_BASE")
            .cloned()
            .unwrap_or_else(|| "https://api.stripe.com".to_string());
        let upload_dir = vars
            .get("UPLOAD_DIR")
            .cloned()
            .unwrap_or_else(|| "./uploads".to_string());

        let run_mode = match vars.get("RUN_MODE").map(String::as_str) {
            None | Some("development") => RunMode::Development,
            Some("production") => RunMode::Production,
            Some("test") => RunMode::Test,
            Some(other) => {
                problems.push(format!(
                    "RUN_MODE: must be one of development, production, test (got {other})"
                ));
                RunMode::Development
            }
        };

        if !problems.is_empty() {
            return Err(ConfigError { problems });
        }

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            stripe_secret_key,
            stripe_publishable_key,
            stripe_webhook_secret,
            stripe_api_base,
            site_url,
            upload_dir,
            run_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_env() -> HashMap<String, String> {
        [
            ("DATABASE_URL", "postgres://localhost/bakehouse"),
            ("JWT_SECRET", "secret"),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("STRIPE_PUBLISHABLE_KEY", "pk_test_123"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_123"),
            ("SITE_URL", "http://localhost:3000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn valid_environment_parses_with_defaults() {
        let config = AppConfig::from_map(&full_env()).expect("config");
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.run_mode, RunMode::Development);
        assert_eq!(config.upload_dir, "./uploads");
    }

    #[test]
    fn missing_variables_are_enumerated_together() {
        let mut vars = full_env();
        vars.remove("DATABASE_URL");
        vars.remove("STRIPE_WEBHOOK_SECRET");

        let err = AppConfig::from_map(&vars).unwrap_err();
        assert_eq!(err.problems.len(), 2);
        assert!(err.problems.iter().any(|p| p.starts_with("DATABASE_URL")));
        assert!(
            err.problems
                .iter()
                .any(|p| p.starts_with("STRIPE_WEBHOOK_SECRET"))
        );
    }

    #[test]
    fn invalid_site_url_and_run_mode_are_rejected() {
        let mut vars = full_env();
        vars.insert("SITE_URL".into(), "not-a-url".into());
        vars.insert("RUN_MODE".into(), "staging".into());

        let err = AppConfig::from_map(&vars).unwrap_err();
        assert!(err.problems.iter().any(|p| p.starts_with("SITE_URL")));
        assert!(err.problems.iter().any(|p| p.starts_with("RUN_MODE")));
    }
}
