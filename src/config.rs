//! Configuration management

use std::{env, path::Path, path::PathBuf, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::auth::claims::DEFAULT_ISSUER;
use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Credential issuance and key configuration
    pub auth: AuthConfig,
    /// Revocation store configuration
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!("Config file not found: {}", p.display())));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // CREDENTIAL_GATE_AUTH__TOKEN_TTL=15m -> auth.token_ttl
        figment = figment.merge(Env::prefixed("CREDENTIAL_GATE_").split("__"));

        let config: Self = figment.extract().map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.auth.token_ttl.as_secs() == 0 || self.auth.token_ttl.subsec_nanos() != 0 {
            return Err(Error::Config(
                "auth.token_ttl must be a positive whole number of seconds".to_string(),
            ));
        }
        if self.auth.issuer.is_empty() {
            return Err(Error::Config("auth.issuer must not be empty".to_string()));
        }
        for user in &self.auth.users {
            user.resolve_password()?;
        }
        if self.store.backend == StoreBackend::Redis && self.store.redis_url.is_empty() {
            return Err(Error::Config("store.redis_url is required for the redis backend".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Credential issuance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// `iss` claim stamped into and required of every credential
    pub issuer: String,
    /// Credential validity window, also the revocation entry TTL
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,
    /// RSA private key (PEM)
    pub private_key_path: PathBuf,
    /// RSA public key (PEM)
    pub public_key_path: PathBuf,
    /// Users accepted by `/login`
    pub users: Vec<UserConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            token_ttl: Duration::from_secs(30 * 60),
            private_key_path: PathBuf::from("cert/secret.pem"),
            public_key_path: PathBuf::from("cert/public.pem"),
            users: Vec::new(),
        }
    }
}

/// A user accepted by the static user directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// User ID, stored as the revocation entry value
    pub id: i64,
    /// Login name
    pub name: String,
    /// Password (supports `env:VAR_NAME`)
    pub password: String,
    /// Role granted to this user
    #[serde(default)]
    pub role: Role,
}

impl UserConfig {
    /// Resolve the password, expanding `env:VAR_NAME`.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the variable is unset or empty. The literal
    /// `env:` string is never used as a password.
    pub fn resolve_password(&self) -> Result<String> {
        match self.password.strip_prefix("env:") {
            Some(var_name) => env::var(var_name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    Error::Config(format!(
                        "password for user {:?} references unset variable {var_name}",
                        self.name
                    ))
                }),
            None => Ok(self.password.clone()),
        }
    }
}

/// Revocation store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map; entries vanish on restart
    #[default]
    Memory,
    /// Shared Redis server
    Redis,
}

/// Revocation store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which backend to use
    pub backend: StoreBackend,
    /// Redis URL (redis backend only)
    pub redis_url: String,
    /// How often the in-memory backend drops expired entries
    #[serde(with = "humantime_serde")]
    pub reap_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:36379".to_string(),
            reap_interval: Duration::from_secs(60),
        }
    }
}

/// Custom humantime serde module for Duration
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize Duration to human-readable string (e.g., "30s")
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the serializer fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    /// Deserialize human-readable duration string (e.g., "30s", "5m", "100ms", "1h")
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the string cannot be parsed as a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub(crate) fn parse(s: &str) -> Result<Duration, std::num::ParseIntError> {
        let s = s.trim();
        // "ms" before "m" and "s"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>().map(Duration::from_millis)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>().map(Duration::from_secs)
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.parse::<u64>().map(|m| Duration::from_secs(m * 60))
        } else if let Some(hours) = s.strip_suffix('h') {
            hours.parse::<u64>().map(|h| Duration::from_secs(h * 3600))
        } else {
            // Assume seconds
            s.parse::<u64>().map(Duration::from_secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_policy() {
        let config = Config::default();
        assert_eq!(config.auth.token_ttl, Duration::from_secs(1800));
        assert_eq!(config.auth.issuer, DEFAULT_ISSUER);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn duration_strings_parse() {
        assert_eq!(humantime_serde::parse("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(humantime_serde::parse("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(humantime_serde::parse("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(humantime_serde::parse("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(humantime_serde::parse("45").unwrap(), Duration::from_secs(45));
        assert!(humantime_serde::parse("soon").is_err());
    }

    #[test]
    fn yaml_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
server:
  port: 39500
auth:
  token_ttl: 15m
  users:
    - id: 7
      name: alice
      password: wonderland
      role: admin
    - id: 8
      name: bob
      password: builder
store:
  backend: redis
  redis_url: redis://cache:6379
"#
        )
        .unwrap();
        drop(f);

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 39500);
        assert_eq!(config.auth.token_ttl, Duration::from_secs(900));
        assert_eq!(config.auth.users.len(), 2);
        assert_eq!(config.auth.users[0].role, Role::Admin);
        assert_eq!(config.auth.users[1].role, Role::Standard);
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert_eq!(config.store.redis_url, "redis://cache:6379");
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = Config::load(Some(Path::new("/nonexistent/gate.yaml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.yaml");
        std::fs::write(&path, "auth:\n  token_ttl: 0s\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("token_ttl"));
    }

    #[test]
    fn unset_env_password_is_config_error() {
        // GIVEN: a user whose password points at a variable nobody set
        let user = UserConfig {
            id: 1,
            name: "carol".to_string(),
            password: "env:CREDENTIAL_GATE_TEST_UNSET_PASSWORD".to_string(),
            role: Role::Admin,
        };

        // THEN: resolution fails instead of falling back to the literal
        let err = user.resolve_password().unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("CREDENTIAL_GATE_TEST_UNSET_PASSWORD")));

        let literal = UserConfig {
            password: "plain".to_string(),
            ..user
        };
        assert_eq!(literal.resolve_password().unwrap(), "plain");
    }

    #[test]
    fn config_with_unset_env_password_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.yaml");
        std::fs::write(
            &path,
            "auth:\n  users:\n    - id: 1\n      name: carol\n      password: env:CREDENTIAL_GATE_TEST_UNSET_PASSWORD\n",
        )
        .unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn sub_second_ttl_is_rejected() {
        for ttl in ["500ms", "1500ms"] {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("gate.yaml");
            std::fs::write(&path, format!("auth:\n  token_ttl: {ttl}\n")).unwrap();

            let err = Config::load(Some(&path)).unwrap_err();
            assert!(err.to_string().contains("whole number of seconds"), "{ttl}");
        }
    }
}
