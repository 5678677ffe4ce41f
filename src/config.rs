use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;
use crate::router::RoutingPolicy;

const DEFAULT_PORT: u16 = 8080;

/// How updates reach the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Polling,
    Webhook,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Polling => write!(f, "long polling"),
            TransportMode::Webhook => write!(f, "webhook"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    /// Public base URL the platform can reach, without trailing slash
    pub public_url: String,
    /// Opaque path segment of the webhook route
    pub secret: String,
}

impl WebhookConfig {
    pub fn path(&self) -> String {
        format!("/webhook/{}", self.secret)
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.public_url, self.path())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// Lowercase, without the leading `@`
    pub admin_handle: String,
    pub port: u16,
    pub mode: TransportMode,
    /// Present exactly when `mode` is `Webhook`
    pub webhook: Option<WebhookConfig>,
    pub policy: RoutingPolicy,
}

/// Optional `config.toml`; every value can be overridden from the environment.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    bot_token: Option<String>,
    admin_handle: Option<String>,
    port: Option<u16>,
    environment_mode: Option<String>,
    webhook_url: Option<String>,
    webhook_secret: Option<String>,
    #[serde(default)]
    routing: RoutingPolicy,
}

pub fn normalize_handle(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

fn parse_mode(raw: &str) -> TransportMode {
    match raw.trim().to_lowercase().as_str() {
        "production" | "webhook" => TransportMode::Webhook,
        _ => TransportMode::Polling,
    }
}

/// The secret becomes a literal route segment, so it must not contain
/// path or capture syntax.
fn is_valid_secret(secret: &str) -> bool {
    !secret.is_empty()
        && secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

impl Config {
    /// Load from `path` (skipped when the file does not exist) and the
    /// process environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))?;
            toml::from_str(&content)
                .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))?
        } else {
            FileConfig::default()
        };

        Self::resolve(file, |key| std::env::var(key).ok())
    }

    fn resolve<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty environment values count as unset.
        let lookup = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| env(key))
                .find(|value| !value.trim().is_empty())
        };

        let bot_token = lookup(&["BOT_TOKEN", "TELEGRAM_BOT_TOKEN"])
            .or(file.bot_token)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let admin_handle = lookup(&["ADMIN_HANDLE", "ADMIN_USERNAME"])
            .or(file.admin_handle)
            .map(|handle| normalize_handle(&handle))
            .filter(|handle| !handle.is_empty())
            .ok_or(ConfigError::Missing("ADMIN_HANDLE"))?;

        let port = match lookup(&["PORT"]) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw.clone(),
                reason: "expected a port number".to_string(),
            })?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let mode = lookup(&["ENVIRONMENT_MODE"])
            .or(file.environment_mode)
            .map(|raw| parse_mode(&raw))
            .unwrap_or(TransportMode::Polling);

        let webhook = match mode {
            TransportMode::Polling => None,
            TransportMode::Webhook => {
                let public_url = lookup(&["WEBHOOK_URL", "RENDER_EXTERNAL_URL"])
                    .or(file.webhook_url)
                    .map(|url| url.trim().trim_end_matches('/').to_string())
                    .filter(|url| !url.is_empty())
                    .ok_or(ConfigError::Missing("WEBHOOK_URL"))?;
                let secret = lookup(&["WEBHOOK_SECRET"])
                    .or(file.webhook_secret)
                    .map(|secret| secret.trim().to_string())
                    .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
                if !is_valid_secret(&secret) {
                    return Err(ConfigError::Invalid {
                        key: "WEBHOOK_SECRET",
                        value: secret,
                        reason: "only letters, digits, '_' and '-' are allowed".to_string(),
                    });
                }
                Some(WebhookConfig { public_url, secret })
            }
        };

        let mut policy = file.routing;
        if let Some(raw) = lookup(&["VERIFY_CONTACT_OWNER"]) {
            policy.verify_ownership = parse_bool("VERIFY_CONTACT_OWNER", &raw)?;
        }
        if let Some(raw) = lookup(&["SHARE_PHONE_BUTTON"]) {
            policy.share_phone_button = parse_bool("SHARE_PHONE_BUTTON", &raw)?;
        }

        Ok(Config {
            bot_token,
            admin_handle,
            port,
            mode,
            webhook,
            policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        resolve_with_file(FileConfig::default(), vars)
    }

    fn resolve_with_file(file: FileConfig, vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::resolve(file, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_minimal_environment() {
        let config = resolve(&[("BOT_TOKEN", "123:abc"), ("ADMIN_HANDLE", "@Ops_Admin")]).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.admin_handle, "ops_admin");
        assert_eq!(config.port, 8080);
        assert_eq!(config.mode, TransportMode::Polling);
        assert!(config.webhook.is_none());
        assert_eq!(config.policy, RoutingPolicy::default());
    }

    #[test]
    fn test_missing_token_is_reported() {
        let err = resolve(&[("ADMIN_HANDLE", "ops_admin")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("BOT_TOKEN"));
    }

    #[test]
    fn test_blank_admin_counts_as_missing() {
        let err = resolve(&[("BOT_TOKEN", "t"), ("ADMIN_HANDLE", "  ")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("ADMIN_HANDLE"));
        let err = resolve(&[("BOT_TOKEN", "t"), ("ADMIN_HANDLE", "@")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("ADMIN_HANDLE"));
    }

    #[test]
    fn test_legacy_variable_names() {
        let config = resolve(&[("TELEGRAM_BOT_TOKEN", "t"), ("ADMIN_USERNAME", "Boss")]).unwrap();
        assert_eq!(config.bot_token, "t");
        assert_eq!(config.admin_handle, "boss");
    }

    #[test]
    fn test_invalid_port() {
        let err = resolve(&[("BOT_TOKEN", "t"), ("ADMIN_HANDLE", "a"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn test_webhook_mode_requires_url() {
        let err = resolve(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_HANDLE", "a"),
            ("ENVIRONMENT_MODE", "production"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("WEBHOOK_URL"));
    }

    #[test]
    fn test_webhook_mode_builds_route() {
        let config = resolve(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_HANDLE", "a"),
            ("ENVIRONMENT_MODE", "Production"),
            ("RENDER_EXTERNAL_URL", "https://bot.example.com/"),
            ("WEBHOOK_SECRET", "s3cret"),
            ("PORT", "10000"),
        ])
        .unwrap();
        assert_eq!(config.mode, TransportMode::Webhook);
        assert_eq!(config.port, 10000);
        let webhook = config.webhook.unwrap();
        assert_eq!(webhook.path(), "/webhook/s3cret");
        assert_eq!(webhook.url(), "https://bot.example.com/webhook/s3cret");
    }

    #[test]
    fn test_webhook_secret_generated_when_absent() {
        let config = resolve(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_HANDLE", "a"),
            ("ENVIRONMENT_MODE", "webhook"),
            ("WEBHOOK_URL", "https://bot.example.com"),
        ])
        .unwrap();
        let secret = config.webhook.unwrap().secret;
        assert_eq!(secret.len(), 32);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_webhook_secret_rejects_route_syntax() {
        for secret in [":abc", "{abc}", "a/b", "a b", "*rest"] {
            let err = resolve(&[
                ("BOT_TOKEN", "t"),
                ("ADMIN_HANDLE", "a"),
                ("ENVIRONMENT_MODE", "webhook"),
                ("WEBHOOK_URL", "https://bot.example.com"),
                ("WEBHOOK_SECRET", secret),
            ])
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: "WEBHOOK_SECRET", .. }),
                "secret {:?} was accepted",
                secret
            );
        }

        let config = resolve(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_HANDLE", "a"),
            ("ENVIRONMENT_MODE", "webhook"),
            ("WEBHOOK_URL", "https://bot.example.com"),
            ("WEBHOOK_SECRET", "Abc_123-xyz"),
        ])
        .unwrap();
        assert_eq!(config.webhook.unwrap().path(), "/webhook/Abc_123-xyz");
    }

    #[test]
    fn test_policy_flags_from_environment() {
        let config = resolve(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_HANDLE", "a"),
            ("VERIFY_CONTACT_OWNER", "false"),
            ("SHARE_PHONE_BUTTON", "0"),
        ])
        .unwrap();
        assert!(!config.policy.verify_ownership);
        assert!(!config.policy.share_phone_button);

        let err = resolve(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_HANDLE", "a"),
            ("SHARE_PHONE_BUTTON", "maybe"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SHARE_PHONE_BUTTON", .. }));
    }

    #[test]
    fn test_environment_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
bot_token = "file-token"
admin_handle = "file_admin"
port = 9000

[routing]
verify_ownership = false
"#,
        )
        .unwrap();
        let config = resolve_with_file(file, &[("ADMIN_HANDLE", "env_admin")]).unwrap();
        assert_eq!(config.bot_token, "file-token");
        assert_eq!(config.admin_handle, "env_admin");
        assert_eq!(config.port, 9000);
        assert!(!config.policy.verify_ownership);
        assert!(config.policy.share_phone_button);
    }

    #[test]
    fn test_load_without_file_uses_environment_only() {
        let path = Path::new("/nonexistent/contact-router/config.toml");
        if let Err(ConfigError::File(e)) = Config::load(path) {
            panic!("absent config file must be skipped, got: {}", e);
        }
    }
}
