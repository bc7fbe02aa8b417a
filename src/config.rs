//! Configuration for the Eye Tribe client
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Default tracker server port
pub const DEFAULT_PORT: &str = "6555";

/// Main configuration for a client connection
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Address Configuration
    // -------------------------------------------------------------------------
    /// Tracker server host name or IP
    pub host: String,

    /// Tracker server port (kept as text, parsed on connect)
    pub port: String,

    // -------------------------------------------------------------------------
    // Keep-alive Configuration
    // -------------------------------------------------------------------------
    /// Interval between heartbeat messages (milliseconds, 0 disables)
    ///
    /// The server drops clients that stay silent for too long.
    pub heartbeat_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Transport Configuration
    // -------------------------------------------------------------------------
    /// Max wait for a matching frame (milliseconds, 0 waits forever)
    pub match_timeout_ms: u64,

    /// Socket write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    /// Largest accepted inbound frame (in bytes)
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT.to_string(),
            heartbeat_interval_ms: 250,
            match_timeout_ms: 0,
            write_timeout_ms: 5000,
            max_frame_size: 1024 * 1024, // 1 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Bounded wait for the match primitive, if any
    pub fn match_timeout(&self) -> Option<Duration> {
        (self.match_timeout_ms > 0).then(|| Duration::from_millis(self.match_timeout_ms))
    }

    /// Heartbeat period, if keep-alive is enabled
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat_interval_ms > 0).then(|| Duration::from_millis(self.heartbeat_interval_ms))
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.config.port = port.into();
        self
    }

    /// Set the heartbeat interval (in milliseconds, 0 disables)
    pub fn heartbeat_interval_ms(mut self, ms: u64) -> Self {
        self.config.heartbeat_interval_ms = ms;
        self
    }

    /// Set the match timeout (in milliseconds, 0 waits forever)
    pub fn match_timeout_ms(mut self, ms: u64) -> Self {
        self.config.match_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the maximum inbound frame size (in bytes)
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
