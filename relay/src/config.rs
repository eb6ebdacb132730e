//! Command-line and environment configuration for the relay

use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "flyt-relay")]
#[command(author = "Flyt Team")]
#[command(version = "0.1.0")]
#[command(about = "Forward GET/POST requests to a target URL with an injected API key", long_about = None)]
pub struct RelayConfig {
    /// Port to listen on (all interfaces)
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds to wait for the target's response headers
    #[arg(long, env = "FLYT_UPSTREAM_TIMEOUT", default_value_t = 30)]
    pub upstream_timeout_secs: u64,

    /// Seconds to wait for the TCP/TLS connection to the target
    #[arg(long, env = "FLYT_CONNECT_TIMEOUT", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Largest inbound form body accepted, in bytes
    #[arg(long, env = "FLYT_MAX_BODY_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl RelayConfig {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = RelayConfig::parse_from([
            "flyt-relay",
            "--port",
            "9090",
            "--upstream-timeout-secs",
            "5",
            "--max-body-bytes",
            "1024",
            "-v",
        ]);
        assert_eq!(config.port, 9090);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_body_bytes, 1024);
        assert!(config.verbose);
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(RelayConfig::try_parse_from(["flyt-relay", "--port", "http"]).is_err());
    }
}
