//! Client configuration.
//!
//! # Design
//! `ClientConfig` is validated once, at construction, so the executor only
//! has to join a resolved path onto an already-checked base URL. Defaults
//! match what Kibana expects from API clients: a `kbn-xsrf` header on every
//! request and a descriptive user agent.

use std::env;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::{HeaderName, HeaderValue};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5601";
pub const USER_AGENT: &str = concat!("fleet-core/", env!("CARGO_PKG_VERSION"));

const ENV_URL: &str = "FLEET_API_URL";
const ENV_API_KEY: &str = "FLEET_API_KEY";
const ENV_USERNAME: &str = "FLEET_USERNAME";
const ENV_PASSWORD: &str = "FLEET_PASSWORD";

/// Settings shared by every call made through a client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    default_headers: Vec<(String, String)>,
}

impl ClientConfig {
    /// Validate `base_url`. Trailing slashes are stripped so that resolved
    /// paths (which start with `/`) join cleanly, including behind a path
    /// prefix such as `https://example.com/kibana`.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.to_string()));
        }
        Ok(Self {
            base_url: trimmed.to_string(),
            default_headers: vec![
                ("kbn-xsrf".to_string(), "true".to_string()),
                ("user-agent".to_string(), USER_AGENT.to_string()),
            ],
        })
    }

    /// Build from `FLEET_API_URL`, `FLEET_API_KEY`, `FLEET_USERNAME` and
    /// `FLEET_PASSWORD`. An API key wins over basic credentials.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var(ENV_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let config = Self::new(&base_url)?;

        if let Some(key) = non_empty_env(ENV_API_KEY) {
            return config.api_key(&key);
        }
        match (non_empty_env(ENV_USERNAME), non_empty_env(ENV_PASSWORD)) {
            (Some(username), Some(password)) => config.basic_auth(&username, &password),
            (Some(_), None) => Err(ConfigError::InvalidEnv {
                name: ENV_PASSWORD,
                reason: format!("missing while {ENV_USERNAME} is set"),
            }),
            (None, Some(_)) => Err(ConfigError::InvalidEnv {
                name: ENV_USERNAME,
                reason: format!("missing while {ENV_PASSWORD} is set"),
            }),
            (None, None) => Ok(config),
        }
    }

    /// Set a header sent with every request, replacing any previous value.
    pub fn default_header(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConfigError::InvalidHeader {
            name: name.to_string(),
        })?;
        HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader {
            name: name.to_string(),
        })?;
        self.default_headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.default_headers.push((name.to_string(), value.to_string()));
        Ok(self)
    }

    pub fn api_key(self, key: &str) -> Result<Self, ConfigError> {
        self.default_header("authorization", &format!("ApiKey {key}"))
    }

    pub fn basic_auth(self, username: &str, password: &str) -> Result<Self, ConfigError> {
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        self.default_header("authorization", &format!("Basic {credentials}"))
    }

    pub fn user_agent(self, user_agent: &str) -> Result<Self, ConfigError> {
        self.default_header("user-agent", user_agent)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    /// Join a resolved, `/`-prefixed path onto the base URL.
    pub(crate) fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}{}", self.base_url, path))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new("http://localhost:5601/").unwrap();
        assert_eq!(config.base_url(), "http://localhost:5601");
        assert_eq!(
            config.url_for("/api/fleet/agents").unwrap().as_str(),
            "http://localhost:5601/api/fleet/agents"
        );
    }

    #[test]
    fn path_prefix_is_kept() {
        let config = ClientConfig::new("https://example.com/kibana/").unwrap();
        assert_eq!(
            config.url_for("/api/fleet/outputs").unwrap().as_str(),
            "https://example.com/kibana/api/fleet/outputs"
        );
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        assert!(matches!(
            ClientConfig::new("ftp://example.com"),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn defaults_include_xsrf_and_user_agent() {
        let config = ClientConfig::new(DEFAULT_BASE_URL).unwrap();
        let names: Vec<&str> = config
            .default_headers()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, ["kbn-xsrf", "user-agent"]);
    }

    #[test]
    fn default_header_replaces_case_insensitively() {
        let config = ClientConfig::new(DEFAULT_BASE_URL)
            .unwrap()
            .default_header("KBN-XSRF", "reporting")
            .unwrap();
        let xsrf: Vec<&(String, String)> = config
            .default_headers()
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("kbn-xsrf"))
            .collect();
        assert_eq!(xsrf.len(), 1);
        assert_eq!(xsrf[0].1, "reporting");
    }

    #[test]
    fn invalid_header_is_rejected() {
        let err = ClientConfig::new(DEFAULT_BASE_URL)
            .unwrap()
            .default_header("bad header", "x")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeader { .. }));
    }

    #[test]
    fn api_key_sets_authorization() {
        let config = ClientConfig::new(DEFAULT_BASE_URL)
            .unwrap()
            .api_key("c2VjcmV0")
            .unwrap();
        assert!(config
            .default_headers()
            .contains(&("authorization".to_string(), "ApiKey c2VjcmV0".to_string())));
    }
}
