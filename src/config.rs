use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Valid LoRaWAN application ports (0 is reserved for MAC commands)
pub const F_PORT_RANGE: std::ops::RangeInclusive<u32> = 1..=223;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub chirpstack: ChirpstackConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChirpstackConfig {
    /// Network server gRPC address, e.g. "localhost:8080" or "https://ns.example.com"
    pub server: String,
    /// API token sent as a bearer credential
    pub api_token: String,
    /// FPort used for every enqueued downlink
    pub f_port: u32,
    /// Upper bound for connect + enqueue, in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Check the settings the bridge cannot run without
    pub fn validate(&self) -> anyhow::Result<()> {
        let cs = &self.chirpstack;
        if cs.server.trim().is_empty() {
            anyhow::bail!("chirpstack.server is not set (use --server or CHIRPSTACK_SERVER)");
        }
        if cs.api_token.trim().is_empty() {
            anyhow::bail!(
                "chirpstack.api_token is not set (use --api-token or CHIRPSTACK_API_TOKEN)"
            );
        }
        if !F_PORT_RANGE.contains(&cs.f_port) {
            anyhow::bail!(
                "chirpstack.f_port {} is outside the application range {}-{}",
                cs.f_port,
                F_PORT_RANGE.start(),
                F_PORT_RANGE.end()
            );
        }
        if cs.timeout_secs == 0 {
            anyhow::bail!("chirpstack.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

impl ChirpstackConfig {
    /// Server address as a URI; bare `host:port` gets a plaintext scheme
    pub fn endpoint_uri(&self) -> String {
        let server = self.server.trim().trim_end_matches('/');
        if server.starts_with("http://") || server.starts_with("https://") {
            server.to_string()
        } else {
            format!("http://{}", server)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:10000".to_string(),
        }
    }
}

impl Default for ChirpstackConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            api_token: String::new(),
            f_port: 10,
            timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.chirpstack.server = "localhost:8080".to_string();
        config.chirpstack.api_token = "secret".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http.bind, "0.0.0.0:10000");
        assert_eq!(config.chirpstack.f_port, 10);
        assert_eq!(config.chirpstack.timeout(), Duration::from_secs(10));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[chirpstack]
server = "chirpstack:8080"
api_token = "abc"
f_port = 1
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.chirpstack.server, "chirpstack:8080");
        assert_eq!(config.chirpstack.f_port, 1);
        // Unset sections and fields keep their defaults
        assert_eq!(config.chirpstack.timeout_secs, 10);
        assert_eq!(config.http.bind, "0.0.0.0:10000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Config::load(Path::new("/nonexistent/bridge.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_requires_server_and_token() {
        assert!(Config::default().validate().is_err());

        let mut config = valid_config();
        config.chirpstack.api_token = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_f_port_range() {
        let mut config = valid_config();
        config.chirpstack.f_port = 0;
        assert!(config.validate().is_err());
        config.chirpstack.f_port = 224;
        assert!(config.validate().is_err());
        config.chirpstack.f_port = 223;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = valid_config();
        config.chirpstack.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoint_uri_adds_scheme() {
        let mut cs = ChirpstackConfig::default();
        cs.server = "localhost:8080".to_string();
        assert_eq!(cs.endpoint_uri(), "http://localhost:8080");

        cs.server = "https://ns.example.com/".to_string();
        assert_eq!(cs.endpoint_uri(), "https://ns.example.com");
    }
}
