use crate::error::{ZephyrError, ZephyrResult};
use base64::{engine::general_purpose, Engine};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};
use std::collections::BTreeMap;
use std::fmt;

/// Credential attached to every request of a session.
///
/// Exactly one mode is carried. Loose credential fields are resolved with
/// [`Credentials::from_fields`].
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`
    Token(String),
    /// `Authorization: Basic base64(username:password)`
    Basic { username: String, password: String },
    /// `Cookie: name=value; ...`
    Cookies(BTreeMap<String, String>),
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn cookies<K, V>(cookies: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Cookies(
            cookies
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Pick a credential out of optional fields.
    ///
    /// Priority is token, then username with password, then cookies. Empty
    /// values count as missing. Lower-priority fields are ignored once a mode
    /// matches.
    pub fn from_fields(
        token: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        cookies: Option<&BTreeMap<String, String>>,
    ) -> ZephyrResult<Self> {
        if let Some(token) = present(token) {
            return Ok(Self::token(token));
        }
        if let (Some(username), Some(password)) = (present(username), present(password)) {
            return Ok(Self::basic(username, password));
        }
        match cookies {
            Some(cookies) if !cookies.is_empty() => Ok(Self::Cookies(cookies.clone())),
            _ => Err(ZephyrError::config("Insufficient auth data")),
        }
    }

    /// Human readable name of the mode, used in session logs
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::Basic { .. } => "username and password",
            Self::Cookies(_) => "cookies",
        }
    }

    /// Write this credential into the default headers of a transport
    pub fn apply_auth(&self, headers: &mut HeaderMap) -> ZephyrResult<()> {
        match self {
            Self::Token(token) => {
                headers.insert(AUTHORIZATION, sensitive(format!("Bearer {}", token))?);
            }
            Self::Basic { username, password } => {
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                headers.insert(AUTHORIZATION, sensitive(format!("Basic {}", encoded))?);
            }
            Self::Cookies(cookies) => {
                let cookie = cookies
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect::<Vec<_>>()
                    .join("; ");
                headers.insert(COOKIE, sensitive(cookie)?);
            }
        }
        Ok(())
    }
}

// Keep secrets out of Debug output and logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(***)"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::Cookies(cookies) => f
                .debug_tuple("Cookies")
                .field(&cookies.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn sensitive(value: String) -> ZephyrResult<HeaderValue> {
    let mut value = HeaderValue::from_str(&value)
        .map_err(|e| ZephyrError::config(format!("Invalid auth header: {}", e)))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Convert a cookie string copied from a browser Jira session into a cookie map.
///
/// `"JSESSIONID=abc; atlassian.xsrf.token=x=y"` splits on `;`, then on the first `=`.
pub fn cookies_from_str(cookie_str: &str) -> ZephyrResult<BTreeMap<String, String>> {
    cookie_str
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| ZephyrError::config(format!("Malformed cookie pair: {}", part)))
        })
        .collect()
}
