// Configuration module entry point
// Loads and validates application configuration and holds runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::logger::Level;

// Re-export public types
pub use state::AppState;
pub use types::Config;

/// Default ceiling for one range request: 10 MiB
pub const DEFAULT_MAX_RANGE_LENGTH: u64 = 10 * 1024 * 1024;

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.backlog", 128)?
            .set_default("archive.path", "archive.zim")?
            .set_default("archive.endpoint", "/zim")?
            .set_default("archive.max_range_length", DEFAULT_MAX_RANGE_LENGTH)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    /// Check the values that deserialization alone cannot
    pub fn validate(&self) -> Result<(), String> {
        self.get_socket_addr()?;

        if !self.archive.endpoint.starts_with('/') {
            return Err(format!(
                "archive.endpoint must start with '/': '{}'",
                self.archive.endpoint
            ));
        }

        if self.archive.max_range_length == 0 {
            return Err("archive.max_range_length must be greater than zero".to_string());
        }

        if self.performance.connection_timeout == 0 {
            return Err("performance.connection_timeout must be at least one second".to_string());
        }

        if Level::parse(&self.logging.level).is_none() {
            return Err(format!(
                "Invalid logging.level '{}' (expected error, warn, info or debug)",
                self.logging.level
            ));
        }

        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::types::{
        ArchiveConfig, LoggingConfig, PerformanceConfig, ServerConfig, StaticFilesConfig,
    };
    use super::*;

    /// Configuration with every default applied, as loaded without a file
    pub fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
                backlog: 128,
            },
            archive: ArchiveConfig {
                path: "archive.zim".to_string(),
                endpoint: "/zim".to_string(),
                max_range_length: DEFAULT_MAX_RANGE_LENGTH,
            },
            static_files: StaticFilesConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive: true,
                connection_timeout: 30,
                max_connections: None,
            },
        }
    }

    #[test]
    fn test_load_defaults() {
        let cfg = Config::load_from("does-not-exist").unwrap();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.archive.endpoint, "/zim");
        assert_eq!(cfg.archive.max_range_length, 10_485_760);
        assert_eq!(cfg.static_files.root, "www");
        assert_eq!(cfg.static_files.index_files, vec!["index.html", "index.htm"]);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.performance.max_connections.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8081

[archive]
path = "/data/wikipedia.zim"
max_range_length = 4096

[static_files]
root = "public"
"#,
        )
        .unwrap();

        let base = path.with_extension("");
        let cfg = Config::load_from(base.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.archive.path, "/data/wikipedia.zim");
        assert_eq!(cfg.archive.max_range_length, 4096);
        assert_eq!(cfg.static_files.root, "public");
        assert_eq!(cfg.static_files.index_files.len(), 2);
    }

    #[test]
    fn test_validate_rejects_zero_ceiling() {
        let mut cfg = test_config();
        cfg.archive.max_range_length = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_endpoint() {
        let mut cfg = test_config();
        cfg.archive.endpoint = "zim".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut cfg = test_config();
        cfg.performance.connection_timeout = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let mut cfg = test_config();
        cfg.logging.level = "verbose".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = test_config();
        cfg.server.port = 3000;
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "127.0.0.1:3000");
        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
