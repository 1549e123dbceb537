use novastream_core::RemoteConfig;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub remote_url: String,
    pub remote_key: String,
    pub request_timeout_secs: u64, // 30 default
    pub log_level: String, // "info" default, RUST_LOG wins
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: String::new(),
            remote_key: String::new(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    pub fn remote(&self) -> RemoteConfig {
        RemoteConfig::new(self.remote_url.trim(), self.remote_key.trim())
    }
}
