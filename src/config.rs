use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Main configuration structure that can be loaded from CLI, config file, or environment
///
/// Example configuration file content
/// # Video Proxy Configuration
///
/// # Server configuration
/// listen_on_port = 8888
///
/// # Upstream configuration
/// supabase_url = "https://xxxxx.supabase.co"
/// supabase_service_role_key = "service-role-key"
///
/// # CORS configuration (optional, defaults to "*")
/// allowed_origin = "https://example.com"
#[derive(Clone, Serialize, Deserialize, Parser)]
#[serde(default)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8888)]
    #[serde(default = "default_port")]
    pub listen_on_port: u16,

    /// Configuration file path (values given on the command line win)
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Base URL of the upstream REST API, e.g. https://xxxxx.supabase.co
    #[arg(long, env = "SUPABASE_URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,

    /// Service role key sent with every upstream request
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supabase_service_role_key: Option<String>,

    /// Value of Access-Control-Allow-Origin on every response
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = "*")]
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_on_port: default_port(),
            config: None,
            supabase_url: None,
            supabase_service_role_key: None,
            allowed_origin: default_allowed_origin(),
        }
    }
}

// Hand-written so the service key never ends up in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen_on_port", &self.listen_on_port)
            .field("config", &self.config)
            .field("supabase_url", &self.supabase_url)
            .field(
                "supabase_service_role_key",
                &self.supabase_service_role_key.as_ref().map(|_| "<redacted>"),
            )
            .field("allowed_origin", &self.allowed_origin)
            .finish()
    }
}

impl Config {
    /// Load configuration from CLI args, optionally merging with a config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Config::parse();

        if let Some(config_path) = &config.config {
            let file_config = Self::from_file(Path::new(config_path))?;
            config = config.merge_with_file(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge with file config, CLI args take precedence
    fn merge_with_file(mut self, file_config: Config) -> Self {
        if self.listen_on_port == default_port() {
            self.listen_on_port = file_config.listen_on_port;
        }
        if self.allowed_origin == default_allowed_origin() {
            self.allowed_origin = file_config.allowed_origin;
        }

        if self.supabase_url.is_none() {
            self.supabase_url = file_config.supabase_url;
        }
        if self.supabase_service_role_key.is_none() {
            self.supabase_service_role_key = file_config.supabase_service_role_key;
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let Some(url) = self.supabase_url.as_deref().filter(|s| !s.is_empty()) else {
            return Err(anyhow::anyhow!(
                "Supabase URL is required (--supabase-url or SUPABASE_URL)"
            ));
        };
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "Supabase URL must start with http:// or https://"
            ));
        }

        if self
            .supabase_service_role_key
            .as_ref()
            .map(|s| s.is_empty())
            .unwrap_or(true)
        {
            return Err(anyhow::anyhow!(
                "Supabase service role key is required (--supabase-service-role-key or SUPABASE_SERVICE_ROLE_KEY)"
            ));
        }

        if self.allowed_origin.is_empty() {
            return Err(anyhow::anyhow!("Allowed origin cannot be empty"));
        }

        Ok(())
    }

    /// Convert to the upstream subset, `None` until both required fields are set
    pub fn to_upstream_config(&self) -> Option<UpstreamConfig> {
        Some(UpstreamConfig {
            base_url: self.supabase_url.clone()?,
            service_key: self.supabase_service_role_key.clone()?,
        })
    }
}

// Upstream configuration subset
#[derive(Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub service_key: String,
}

// Default value functions
fn default_port() -> u16 {
    8888
}

fn default_allowed_origin() -> String {
    "*".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_from_cli() {
        let cli_content = [
            "CLI",
            "--listen-on-port",
            "8080",
            "--supabase-url",
            "https://abc.supabase.co",
            "--supabase-service-role-key",
            "secret",
            "--allowed-origin",
            "https://example.com",
        ];

        let config = Config::try_parse_from(cli_content).unwrap();

        assert_eq!(config.listen_on_port, 8080);
        assert_eq!(
            config.supabase_url.as_deref(),
            Some("https://abc.supabase.co")
        );
        assert_eq!(config.allowed_origin, "https://example.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
            listen_on_port = 9000
            supabase_url = "https://abc.supabase.co"
            supabase_service_role_key = "secret"
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();

        assert_eq!(config.listen_on_port, 9000);
        assert_eq!(config.allowed_origin, "*");
        assert_eq!(
            config.supabase_service_role_key.as_deref(),
            Some("secret")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_merge_prefers_cli() {
        let file_config = Config {
            listen_on_port: 7000,
            supabase_url: Some("https://file.supabase.co".to_string()),
            supabase_service_role_key: Some("file-key".to_string()),
            allowed_origin: "https://file.example.com".to_string(),
            ..Default::default()
        };

        let cli_config = Config {
            supabase_url: Some("https://cli.supabase.co".to_string()),
            ..Default::default()
        };

        let merged = cli_config.merge_with_file(file_config);

        assert_eq!(merged.listen_on_port, 7000);
        assert_eq!(merged.supabase_url.as_deref(), Some("https://cli.supabase.co"));
        assert_eq!(merged.supabase_service_role_key.as_deref(), Some("file-key"));
        assert_eq!(merged.allowed_origin, "https://file.example.com");
    }

    #[test]
    fn test_validate_requires_upstream() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Supabase URL is required"));

        let config = Config {
            supabase_url: Some("https://abc.supabase.co".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("service role key is required"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = Config {
            supabase_url: Some("abc.supabase.co".to_string()),
            supabase_service_role_key: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config {
            supabase_service_role_key: Some("top-secret".to_string()),
            ..Default::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("top-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_to_upstream_config() {
        assert!(Config::default().to_upstream_config().is_none());

        let config = Config {
            supabase_url: Some("https://abc.supabase.co".to_string()),
            supabase_service_role_key: Some("secret".to_string()),
            ..Default::default()
        };
        let upstream = config.to_upstream_config().unwrap();
        assert_eq!(upstream.base_url, "https://abc.supabase.co");
        assert_eq!(upstream.service_key, "secret");
    }
}
