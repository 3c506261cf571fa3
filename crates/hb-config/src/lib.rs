//! # hb-config
//!
//! Layered runtime configuration: built-in defaults, then an optional
//! `hushbox.toml`, then `HUSHBOX__SECTION__KEY` environment variables.
//! A `.env` file is loaded into the environment first when present.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use hb_core::SubmissionPolicy;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

const ENV_PREFIX: &str = "HUSHBOX";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Peers whose `X-Forwarded-For` / `X-Real-IP` headers are believed.
    /// Every other client is identified by its socket address.
    pub trusted_proxies: Vec<IpAddr>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection string, e.g. `sqlite:hushbox.db?mode=rwc`
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for admin session tokens.
    pub jwt_secret: SecretString,
    pub admin_username: String,
    /// Argon2 PHC string; produce one with the `hash-admin-password` binary.
    pub admin_password_hash: SecretString,
    pub token_ttl_hours: i64,
    /// Also demand the external identity provider's `confess` role.
    pub require_external_role: bool,
    /// Adds `Secure` to the session cookie. Enable behind HTTPS.
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub json: bool,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub submission: SubmissionPolicy,
    pub logging: LoggingConfig,
    /// The `.env` file that was loaded, if any.
    #[serde(skip)]
    pub env_file: Option<PathBuf>,
}

impl AppConfig {
    /// Loads `.env`, `hushbox.toml` (optional) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let env_file = dotenvy::dotenv().ok();
        Self::from_environment(env_file)
    }

    /// Like [`AppConfig::load`], with an explicit `.env` file.
    pub fn load_with_env_file(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::from_path(path)
            .map_err(|e| ConfigError::Invalid(format!("cannot read {}: {e}", path.display())))?;
        Self::from_environment(Some(path.to_path_buf()))
    }

    fn from_environment(env_file: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut cfg = Self::from_builder(
            Config::builder()
                .add_source(File::with_name("hushbox").required(false))
                .add_source(env_source()),
        )?;
        cfg.env_file = env_file;
        Ok(cfg)
    }

    fn from_builder(
        builder: config::builder::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let cfg: AppConfig = with_defaults(builder)?.build()?.try_deserialize()?;
        cfg.check()?;
        Ok(cfg)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_hours must be positive".into(),
            ));
        }
        if self.submission.max_length == 0 {
            return Err(ConfigError::Invalid(
                "submission.max_length must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("submission.forbidden_terms")
        .with_list_parse_key("server.trusted_proxies")
}

fn with_defaults(
    builder: config::builder::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.trusted_proxies", Vec::<String>::new())?
        .set_default("database.url", "sqlite:hushbox.db?mode=rwc")?
        .set_default("auth.admin_username", "admin")?
        .set_default("auth.token_ttl_hours", 24)?
        .set_default("auth.require_external_role", false)?
        .set_default("auth.cookie_secure", false)?
        .set_default(
            "submission.max_length",
            hb_core::DEFAULT_MAX_LENGTH as i64,
        )?
        .set_default("submission.forbidden_terms", Vec::<String>::new())?
        .set_default("logging.json", false)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use secrecy::ExposeSecret;

    fn from_toml(toml: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::from_builder(
            Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    const SECRETS: &str = r#"
        [auth]
        jwt_secret = "s3cret"
        admin_password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
    "#;

    #[test]
    fn defaults_fill_everything_but_secrets() {
        let cfg = from_toml(SECRETS).unwrap();
        assert_eq!(cfg.bind_address(), "127.0.0.1:8080");
        assert_eq!(cfg.submission.max_length, 1500);
        assert!(cfg.submission.forbidden_terms.is_empty());
        assert_eq!(cfg.auth.admin_username, "admin");
        assert_eq!(cfg.auth.token_ttl_hours, 24);
        assert!(!cfg.auth.require_external_role);
        assert_eq!(cfg.auth.jwt_secret.expose_secret(), "s3cret");
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(matches!(from_toml(""), Err(ConfigError::Load(_))));
    }

    #[test]
    fn file_values_override_defaults() {
        let toml = format!(
            "{SECRETS}\n[submission]\nmax_length = 2000\nforbidden_terms = [\"spoiler\"]\n[server]\nport = 9000\n"
        );
        let cfg = from_toml(&toml).unwrap();
        assert_eq!(cfg.submission.max_length, 2000);
        assert_eq!(cfg.submission.forbidden_terms, vec!["spoiler".to_string()]);
        assert_eq!(cfg.server.port, 9000);
    }

    #[test]
    fn trusted_proxies_parse_as_addresses() {
        let cfg = from_toml(SECRETS).unwrap();
        assert!(cfg.server.trusted_proxies.is_empty());

        let toml = format!("[server]\ntrusted_proxies = [\"10.0.0.1\", \"::1\"]\n{SECRETS}");
        let cfg = from_toml(&toml).unwrap();
        assert_eq!(
            cfg.server.trusted_proxies,
            vec!["10.0.0.1".parse::<IpAddr>().unwrap(), "::1".parse().unwrap()]
        );

        let toml = format!("[server]\ntrusted_proxies = [\"not-an-ip\"]\n{SECRETS}");
        assert!(matches!(from_toml(&toml), Err(ConfigError::Load(_))));
    }

    #[test]
    fn env_file_is_recorded() {
        let path = std::env::temp_dir().join(format!("hushbox-test-{}.env", std::process::id()));
        std::fs::write(
            &path,
            "HUSHBOX__AUTH__JWT_SECRET=from-dotenv\nHUSHBOX__AUTH__ADMIN_PASSWORD_HASH=hash\n",
        )
        .unwrap();

        let cfg = AppConfig::load_with_env_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.env_file.as_deref(), Some(path.as_path()));
        assert_eq!(cfg.auth.jwt_secret.expose_secret(), "from-dotenv");
    }

    #[test]
    fn toml_builds_carry_no_env_file() {
        assert!(from_toml(SECRETS).unwrap().env_file.is_none());
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let toml = format!("{SECRETS}\ntoken_ttl_hours = 0\n");
        assert!(matches!(from_toml(&toml), Err(ConfigError::Invalid(_))));
    }
}
