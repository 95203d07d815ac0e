use crate::auth::{cookies_from_str, Credentials};
use crate::error::{ZephyrError, ZephyrResult};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "ZEPHYR_BASE_URL";
pub const ENV_TOKEN: &str = "ZEPHYR_TOKEN";
pub const ENV_USERNAME: &str = "ZEPHYR_USERNAME";
pub const ENV_PASSWORD: &str = "ZEPHYR_PASSWORD";
pub const ENV_COOKIES: &str = "ZEPHYR_COOKIES";
pub const ENV_INSECURE: &str = "ZEPHYR_INSECURE";
pub const ENV_MAX_REDIRECTS: &str = "ZEPHYR_MAX_REDIRECTS";
pub const ENV_TIMEOUT_SECS: &str = "ZEPHYR_TIMEOUT_SECS";

/// Overrides applied once to the underlying transport when a session is built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    /// Skip TLS certificate verification (self-signed Jira servers)
    pub accept_invalid_certs: bool,
    /// Maximum number of redirects to follow
    pub max_redirects: Option<usize>,
    /// Whole-request timeout; the transport default applies when unset
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl TransportOptions {
    /// True when nothing differs from the transport defaults
    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }
}

/// Everything needed to open a session
#[derive(Clone, Default)]
pub struct SessionConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub cookies: Option<BTreeMap<String, String>>,
    pub transport: TransportOptions,
}

impl SessionConfig {
    /// Create a config for the given base URL with no credential yet
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_cookies(mut self, cookies: BTreeMap<String, String>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    /// Resolve the credential carried by this config
    pub fn credentials(&self) -> ZephyrResult<Credentials> {
        Credentials::from_fields(
            self.token.as_deref(),
            self.username.as_deref(),
            self.password.as_deref(),
            self.cookies.as_ref(),
        )
    }

    /// Load a config from `ZEPHYR_*` environment variables
    pub fn from_env() -> ZephyrResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load a config through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> ZephyrResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ZephyrError::config(format!("{} is not set", ENV_BASE_URL)))?;

        let cookies = lookup(ENV_COOKIES)
            .filter(|v| !v.trim().is_empty())
            .map(|v| cookies_from_str(&v))
            .transpose()?;

        let accept_invalid_certs = lookup(ENV_INSECURE)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let max_redirects = lookup(ENV_MAX_REDIRECTS)
            .map(|v| parse_number(ENV_MAX_REDIRECTS, &v))
            .transpose()?
            .map(|n| n as usize);

        let timeout = lookup(ENV_TIMEOUT_SECS)
            .map(|v| parse_number(ENV_TIMEOUT_SECS, &v))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            base_url,
            token: lookup(ENV_TOKEN),
            username: lookup(ENV_USERNAME),
            password: lookup(ENV_PASSWORD),
            cookies,
            transport: TransportOptions {
                accept_invalid_certs,
                max_redirects,
                timeout,
                user_agent: None,
            },
        })
    }
}

// Secrets never reach Debug output or logs.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hidden = |secret: &Option<String>| secret.as_ref().map(|_| "***");
        f.debug_struct("SessionConfig")
            .field("base_url", &self.base_url)
            .field("token", &hidden(&self.token))
            .field("username", &self.username)
            .field("password", &hidden(&self.password))
            .field("cookies", &self.cookies.as_ref().map(|c| c.keys().collect::<Vec<_>>()))
            .field("transport", &self.transport)
            .finish()
    }
}

fn parse_number(key: &str, value: &str) -> ZephyrResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| ZephyrError::config(format!("{} must be a number, got {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_reads_everything() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            (ENV_BASE_URL, "https://jira.example.com/"),
            (ENV_COOKIES, "JSESSIONID=abc; other=1"),
            (ENV_INSECURE, "TRUE"),
            (ENV_MAX_REDIRECTS, "333"),
            (ENV_TIMEOUT_SECS, "30"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://jira.example.com/");
        assert!(config.transport.accept_invalid_certs);
        assert_eq!(config.transport.max_redirects, Some(333));
        assert_eq!(config.transport.timeout, Some(Duration::from_secs(30)));
        assert!(matches!(config.credentials().unwrap(), Credentials::Cookies(c) if c.len() == 2));
    }

    #[test]
    fn test_from_lookup_requires_base_url() {
        let err = SessionConfig::from_lookup(lookup_from(&[(ENV_TOKEN, "t")])).unwrap_err();
        assert!(err.to_string().contains(ENV_BASE_URL));
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers() {
        let err = SessionConfig::from_lookup(lookup_from(&[
            (ENV_BASE_URL, "https://jira.example.com/"),
            (ENV_MAX_REDIRECTS, "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ZephyrError::Configuration(_)));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut cookies = BTreeMap::new();
        cookies.insert("JSESSIONID".to_string(), "cookie-secret".to_string());
        let config = SessionConfig::new("https://jira.example.com/")
            .with_token("secret-token")
            .with_basic_auth("user", "hunter2")
            .with_cookies(cookies);

        let rendered = format!("{:?}", config);
        assert!(rendered.contains("https://jira.example.com/"));
        assert!(rendered.contains("user"));
        assert!(rendered.contains("JSESSIONID"));
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("cookie-secret"));
    }

    #[test]
    fn test_transport_defaults() {
        assert!(TransportOptions::default().is_default());
        let config = SessionConfig::new("https://api.example.com/").with_token("t");
        assert!(config.transport.is_default());
        assert_eq!(config.credentials().unwrap(), Credentials::token("t"));
    }
}
